use roombot_calendar::ReservationService;
use roombot_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;

use super::{block_on, escape_json, CommandResult};

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

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\
                 \"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
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
            checks.push(check_slack_tokens(&config));
            checks.push(check_calendar_reachability(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("slack_token_readiness"));
            checks.push(skipped("calendar_reachability"));
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

fn skipped(name: &'static str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: "skipped because configuration did not load".to_string(),
    }
}

fn check_slack_tokens(config: &AppConfig) -> DoctorCheck {
    let token = config.slack.bot_token.expose_secret();
    if !token.starts_with("xoxb-") || token.len() <= "xoxb-".len() {
        return DoctorCheck {
            name: "slack_token_readiness",
            status: CheckStatus::Fail,
            details: "slack.bot_token is not a bot token (expected xoxb-...)".to_string(),
        };
    }

    let details = if config.slack.signing_secret.is_some() {
        "bot token present, request signatures will be verified"
    } else {
        "bot token present, signing_secret unset so request signatures are not verified"
    };
    DoctorCheck {
        name: "slack_token_readiness",
        status: CheckStatus::Pass,
        details: details.to_string(),
    }
}

fn check_calendar_reachability(config: &AppConfig) -> DoctorCheck {
    let service = match ReservationService::from_config(&config.calendar) {
        Ok(service) => service,
        Err(error) => {
            return DoctorCheck {
                name: "calendar_reachability",
                status: CheckStatus::Fail,
                details: format!("failed to build calendar client: {error}"),
            };
        }
    };

    match block_on(service.probe()) {
        Ok(Ok(count)) => DoctorCheck {
            name: "calendar_reachability",
            status: CheckStatus::Pass,
            details: format!(
                "{:?} calendar answered ({count} events today)",
                config.calendar.backend
            ),
        },
        Ok(Err(error)) => DoctorCheck {
            name: "calendar_reachability",
            status: CheckStatus::Fail,
            details: format!("calendar query failed: {error}"),
        },
        Err(error) => {
            DoctorCheck { name: "calendar_reachability", status: CheckStatus::Fail, details: error }
        }
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
