use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use querylane_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let llm_api_key = match &config.llm.api_key {
        Some(secret) => redact_secret(secret.expose_secret()),
        None => "<unset>".to_string(),
    };
    let port = match config.server.port {
        Some(port) => port.to_string(),
        None => format!("{} (role default)", config.server.effective_port()),
    };

    let entries = vec![
        entry("llm.base_url", config.llm.base_url.clone(), &["QUERYLANE_LLM_BASE_URL", "LLM_BASE_URL"]),
        entry("llm.api_key", llm_api_key, &["QUERYLANE_LLM_API_KEY", "LLM_API_KEY"]),
        entry("llm.model", config.llm.model.clone(), &["QUERYLANE_LLM_MODEL", "LLM_MODEL"]),
        entry("llm.temperature", config.llm.temperature.to_string(), &["QUERYLANE_LLM_TEMPERATURE"]),
        entry("llm.timeout_secs", config.llm.timeout_secs.to_string(), &["QUERYLANE_LLM_TIMEOUT_SECS"]),
        entry(
            "ga4.credentials_path",
            config.ga4.credentials_path.display().to_string(),
            &["QUERYLANE_GA4_CREDENTIALS_PATH"],
        ),
        entry("ga4.api_base_url", config.ga4.api_base_url.clone(), &["QUERYLANE_GA4_API_BASE_URL"]),
        entry("ga4.timeout_secs", config.ga4.timeout_secs.to_string(), &["QUERYLANE_GA4_TIMEOUT_SECS"]),
        entry("seo.sheet_url", config.seo.sheet_url.clone(), &["QUERYLANE_SEO_SHEET_URL"]),
        entry("seo.timeout_secs", config.seo.timeout_secs.to_string(), &["QUERYLANE_SEO_TIMEOUT_SECS"]),
        entry("seo.max_rows", config.seo.max_rows.to_string(), &["QUERYLANE_SEO_MAX_ROWS"]),
        entry("seo.sample_rows", config.seo.sample_rows.to_string(), &["QUERYLANE_SEO_SAMPLE_ROWS"]),
        entry(
            "routing.analytics_url",
            config.routing.analytics_url.clone(),
            &["QUERYLANE_ROUTING_ANALYTICS_URL"],
        ),
        entry("routing.seo_url", config.routing.seo_url.clone(), &["QUERYLANE_ROUTING_SEO_URL"]),
        entry(
            "routing.timeout_secs",
            config.routing.timeout_secs.to_string(),
            &["QUERYLANE_ROUTING_TIMEOUT_SECS"],
        ),
        entry("server.role", format!("{:?}", config.server.role), &["QUERYLANE_SERVER_ROLE"]),
        entry(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["QUERYLANE_SERVER_BIND_ADDRESS"],
        ),
        entry("server.port", port, &["QUERYLANE_SERVER_PORT"]),
        entry(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["QUERYLANE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        entry(
            "logging.level",
            config.logging.level.clone(),
            &["QUERYLANE_LOGGING_LEVEL", "QUERYLANE_LOG_LEVEL"],
        ),
        entry(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["QUERYLANE_LOGGING_FORMAT", "QUERYLANE_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in entries {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

fn entry(
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
) -> (&'static str, String, &'static [&'static str]) {
    (key, value, env_keys)
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("querylane.toml"), PathBuf::from("config/querylane.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps a recognizable key prefix such as `sk-` and hides the rest.
fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
