use querylane_agent::ga4::ServiceAccountKey;
use querylane_agent::sheets::{DatasetSource, SheetCsvSource};
use querylane_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

use super::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => {
                    checks.push(runtime.block_on(check_ga4_credentials(&config)));
                    checks.push(runtime.block_on(check_crawl_sheet(&config)));
                }
                Err(error) => {
                    for name in ["ga4_credentials", "crawl_sheet"] {
                        checks.push(DoctorCheck {
                            name,
                            status: CheckStatus::Fail,
                            details: format!("failed to initialize async runtime: {error}"),
                        });
                    }
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["ga4_credentials", "crawl_sheet"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Loads the key file and signs a throwaway assertion, so a key that
/// parses but cannot sign is caught here rather than on the first query.
async fn check_ga4_credentials(config: &AppConfig) -> DoctorCheck {
    let path = &config.ga4.credentials_path;
    let result = match ServiceAccountKey::from_file(path).await {
        Ok(key) => key.signed_assertion(0).map(|_| key),
        Err(error) => Err(error),
    };

    match result {
        Ok(key) => DoctorCheck {
            name: "ga4_credentials",
            status: CheckStatus::Pass,
            details: format!("service account `{}` loaded from `{}`", key.client_email, path.display()),
        },
        Err(error) => DoctorCheck {
            name: "ga4_credentials",
            status: CheckStatus::Fail,
            details: format!("`{}`: {error}", path.display()),
        },
    }
}

async fn check_crawl_sheet(config: &AppConfig) -> DoctorCheck {
    let result = match SheetCsvSource::from_config(&config.seo) {
        Ok(source) => source.load().await.map_err(|error| format!("failed to load crawl sheet: {error:#}")),
        Err(error) => Err(format!("{error:#}")),
    };

    match result {
        Ok(dataset) => DoctorCheck {
            name: "crawl_sheet",
            status: CheckStatus::Pass,
            details: format!("{} rows across {} columns", dataset.len(), dataset.columns().len()),
        },
        Err(error) => DoctorCheck { name: "crawl_sheet", status: CheckStatus::Fail, details: error },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
