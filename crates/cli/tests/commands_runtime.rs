use std::env;
use std::sync::{Mutex, OnceLock};

use querylane_cli::commands::{config, doctor, route};
use serde_json::{json, Value};

const SERVICE_ACCOUNT_PEM: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/service_account_key.pem"));

#[test]
fn route_reports_keyword_match() {
    let result = route::run("Show crawl pages with a 404 status");
    assert_eq!(result.exit_code, 0, "expected routing success");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "route");
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["details"]["route"], "seo");
    assert_eq!(payload["details"]["matched_keyword"], "crawl");
    assert_eq!(payload["details"]["default"], false);
}

#[test]
fn route_falls_back_to_analytics() {
    let result = route::run("How many users visited yesterday?");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["details"]["route"], "analytics");
    assert_eq!(payload["details"]["matched_keyword"], Value::Null);
    assert_eq!(payload["details"]["default"], true);
}

#[test]
fn route_rejects_blank_query() {
    let result = route::run("   ");
    assert_eq!(result.exit_code, 2, "expected invalid query exit code");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "invalid_query");
}

#[test]
fn doctor_skips_integration_checks_when_config_invalid() {
    with_env(&[("QUERYLANE_SEO_MAX_ROWS", "0")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1, "expected doctor failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["name"], "config_validation");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
        assert_eq!(payload["checks"][2]["status"], "skipped");
    });
}

#[test]
fn doctor_reports_credentials_and_unreachable_sheet() {
    let dir = tempfile::tempdir().expect("tempdir");
    let credentials_path = write_credentials(dir.path(), SERVICE_ACCOUNT_PEM);

    with_env(
        &[
            ("QUERYLANE_GA4_CREDENTIALS_PATH", credentials_path.as_str()),
            ("QUERYLANE_SEO_SHEET_URL", "http://127.0.0.1:9/export.csv"),
            ("QUERYLANE_SEO_TIMEOUT_SECS", "2"),
        ],
        || {
            let result = doctor::run(true);
            assert_eq!(result.exit_code, 1, "unreachable sheet should fail doctor");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["checks"][0]["status"], "pass");
            assert_eq!(payload["checks"][1]["name"], "ga4_credentials");
            assert_eq!(payload["checks"][1]["status"], "pass");
            assert_eq!(payload["checks"][2]["name"], "crawl_sheet");
            assert_eq!(payload["checks"][2]["status"], "fail");
        },
    );
}

#[test]
fn doctor_fails_when_credentials_file_is_missing() {
    with_env(
        &[
            ("QUERYLANE_GA4_CREDENTIALS_PATH", "/nonexistent/querylane/credentials.json"),
            ("QUERYLANE_SEO_SHEET_URL", "http://127.0.0.1:9/export.csv"),
        ],
        || {
            let output = doctor::run(false).output;

            assert!(output.starts_with("doctor: one or more readiness checks failed"));
            assert!(output.contains("- [fail] ga4_credentials:"));
            assert!(output.contains("/nonexistent/querylane/credentials.json"));
        },
    );
}

#[test]
fn doctor_fails_when_private_key_cannot_sign() {
    let dir = tempfile::tempdir().expect("tempdir");
    let credentials_path = write_credentials(dir.path(), "not a pem block");

    with_env(
        &[
            ("QUERYLANE_GA4_CREDENTIALS_PATH", credentials_path.as_str()),
            ("QUERYLANE_SEO_SHEET_URL", "http://127.0.0.1:9/export.csv"),
        ],
        || {
            let payload = parse_payload(&doctor::run(true).output);

            assert_eq!(payload["checks"][1]["name"], "ga4_credentials");
            assert_eq!(payload["checks"][1]["status"], "fail");
            assert!(payload["checks"][1]["details"]
                .as_str()
                .is_some_and(|details| details.contains("not valid RSA PEM")));
        },
    );
}

#[test]
fn config_redacts_api_key_and_attributes_sources() {
    with_env(
        &[("LLM_API_KEY", "sk-live-very-secret"), ("QUERYLANE_SERVER_ROLE", "seo")],
        || {
            let output = config::run();

            assert!(output.contains("- llm.api_key = sk-*** (source: env (LLM_API_KEY))"));
            assert!(!output.contains("very-secret"));
            assert!(output.contains("- server.role = Seo (source: env (QUERYLANE_SERVER_ROLE))"));
            assert!(output.contains("- server.port = 8002 (role default)"));
        },
    );
}

fn write_credentials(dir: &std::path::Path, private_key: &str) -> String {
    let path = dir.join("credentials.json");
    let key = json!({
        "client_email": "reporter@demo.iam.gserviceaccount.com",
        "private_key": private_key,
    });
    std::fs::write(&path, key.to_string()).expect("write credentials");
    path.display().to_string()
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "LLM_BASE_URL",
        "LLM_API_KEY",
        "LLM_MODEL",
        "QUERYLANE_LLM_BASE_URL",
        "QUERYLANE_LLM_API_KEY",
        "QUERYLANE_LLM_MODEL",
        "QUERYLANE_LLM_TEMPERATURE",
        "QUERYLANE_LLM_TIMEOUT_SECS",
        "QUERYLANE_GA4_CREDENTIALS_PATH",
        "QUERYLANE_GA4_API_BASE_URL",
        "QUERYLANE_GA4_TIMEOUT_SECS",
        "QUERYLANE_SEO_SHEET_URL",
        "QUERYLANE_SEO_TIMEOUT_SECS",
        "QUERYLANE_SEO_MAX_ROWS",
        "QUERYLANE_SEO_SAMPLE_ROWS",
        "QUERYLANE_ROUTING_ANALYTICS_URL",
        "QUERYLANE_ROUTING_SEO_URL",
        "QUERYLANE_ROUTING_TIMEOUT_SECS",
        "QUERYLANE_SERVER_ROLE",
        "QUERYLANE_SERVER_BIND_ADDRESS",
        "QUERYLANE_SERVER_PORT",
        "QUERYLANE_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "QUERYLANE_LOGGING_LEVEL",
        "QUERYLANE_LOGGING_FORMAT",
        "QUERYLANE_LOG_LEVEL",
        "QUERYLANE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
