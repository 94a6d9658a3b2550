use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use roombot_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

struct Sources {
    path: Option<PathBuf>,
    doc: Option<Value>,
}

impl Sources {
    fn detect() -> Self {
        let path = detect_config_path();
        let doc = load_config_file_doc(path.as_deref());
        Self { path, doc }
    }

    /// `env_keys` are checked in order, first match wins. Blank values are
    /// ignored by config loading, so they do not count here either.
    fn line(&self, key_path: &str, value: &str, env_keys: &[&str]) -> String {
        format!("- {key_path} = {value} (source: {})", self.source(key_path, env_keys))
    }

    fn source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| is_set(key)) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .as_deref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };
    let sources = Sources::detect();

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(sources.line(
        "slack.bot_token",
        &redact_token(config.slack.bot_token.expose_secret()),
        &["ROOMBOT_SLACK_BOT_TOKEN"],
    ));
    lines.push(sources.line(
        "slack.signing_secret",
        redact_optional(config.slack.signing_secret.as_ref()),
        &["ROOMBOT_SLACK_SIGNING_SECRET"],
    ));
    lines.push(sources.line(
        "slack.api_base_url",
        &config.slack.api_base_url,
        &["ROOMBOT_SLACK_API_BASE_URL"],
    ));

    lines.push(sources.line(
        "calendar.backend",
        &format!("{:?}", config.calendar.backend),
        &["ROOMBOT_CALENDAR_BACKEND"],
    ));
    lines.push(sources.line(
        "calendar.calendar_id",
        or_unset(&config.calendar.calendar_id),
        &["ROOMBOT_CALENDAR_ID", "CALENDAR_ID"],
    ));
    lines.push(sources.line(
        "calendar.access_token",
        redact_optional(config.calendar.access_token.as_ref()),
        &["ROOMBOT_CALENDAR_ACCESS_TOKEN"],
    ));
    lines.push(sources.line(
        "calendar.api_base_url",
        &config.calendar.api_base_url,
        &["ROOMBOT_CALENDAR_API_BASE_URL"],
    ));
    lines.push(sources.line(
        "calendar.utc_offset",
        &config.calendar.utc_offset,
        &["ROOMBOT_CALENDAR_UTC_OFFSET"],
    ));
    lines.push(sources.line(
        "calendar.summary_delimiter",
        &config.calendar.summary_delimiter,
        &["ROOMBOT_CALENDAR_SUMMARY_DELIMITER"],
    ));

    lines.push(sources.line(
        "server.bind_address",
        &config.server.bind_address,
        &["ROOMBOT_SERVER_BIND_ADDRESS"],
    ));
    lines.push(sources.line(
        "server.port",
        &config.server.port.to_string(),
        &["ROOMBOT_SERVER_PORT"],
    ));

    lines.push(sources.line(
        "logging.level",
        &config.logging.level,
        &["ROOMBOT_LOGGING_LEVEL", "ROOMBOT_LOG_LEVEL"],
    ));
    lines.push(sources.line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        &["ROOMBOT_LOGGING_FORMAT", "ROOMBOT_LOG_FORMAT"],
    ));

    lines.join("\n")
}

fn is_set(key: &str) -> bool {
    env::var(key).is_ok_and(|value| !value.trim().is_empty())
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("roombot.toml"), PathBuf::from("config/roombot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
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

fn or_unset(value: &str) -> &str {
    if value.trim().is_empty() {
        "<unset>"
    } else {
        value
    }
}

fn redact_optional(secret: Option<&SecretString>) -> &'static str {
    if secret.is_some() {
        "<redacted>"
    } else {
        "<unset>"
    }
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
