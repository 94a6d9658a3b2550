use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub slack: SlackConfig,
    pub calendar: CalendarConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub bot_token: SecretString,
    pub signing_secret: Option<SecretString>,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CalendarConfig {
    pub backend: CalendarBackendKind,
    pub calendar_id: String,
    pub access_token: Option<SecretString>,
    pub api_base_url: String,
    pub utc_offset: String,
    pub summary_delimiter: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarBackendKind {
    Google,
    Memory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub slack_bot_token: Option<String>,
    pub slack_signing_secret: Option<String>,
    pub slack_api_base_url: Option<String>,
    pub calendar_backend: Option<CalendarBackendKind>,
    pub calendar_id: Option<String>,
    pub calendar_access_token: Option<String>,
    pub calendar_api_base_url: Option<String>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            slack: SlackConfig {
                bot_token: String::new().into(),
                signing_secret: None,
                api_base_url: "https://slack.com/api".to_string(),
                timeout_secs: 10,
            },
            calendar: CalendarConfig {
                backend: CalendarBackendKind::Google,
                calendar_id: String::new(),
                access_token: None,
                api_base_url: "https://www.googleapis.com/calendar/v3".to_string(),
                utc_offset: "+09:00".to_string(),
                summary_delimiter: "/".to_string(),
                timeout_secs: 10,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for CalendarBackendKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Validation(format!(
                "unsupported calendar backend `{other}` (expected google|memory)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl CalendarConfig {
    /// Offset used to turn calendar timestamps into local dates and `HH:MM` times.
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        parse_utc_offset(&self.utc_offset).ok_or_else(|| {
            ConfigError::Validation(format!(
                "calendar.utc_offset `{}` must look like +09:00 or -05:30",
                self.utc_offset
            ))
        })
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("roombot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(slack) = patch.slack {
            if let Some(bot_token) = slack.bot_token {
                self.slack.bot_token = secret_value(bot_token);
            }
            if let Some(signing_secret) = slack.signing_secret {
                self.slack.signing_secret = Some(secret_value(signing_secret));
            }
            if let Some(api_base_url) = slack.api_base_url {
                self.slack.api_base_url = api_base_url;
            }
            if let Some(timeout_secs) = slack.timeout_secs {
                self.slack.timeout_secs = timeout_secs;
            }
        }

        if let Some(calendar) = patch.calendar {
            if let Some(backend) = calendar.backend {
                self.calendar.backend = backend;
            }
            if let Some(calendar_id) = calendar.calendar_id {
                self.calendar.calendar_id = calendar_id;
            }
            if let Some(access_token) = calendar.access_token {
                self.calendar.access_token = Some(secret_value(access_token));
            }
            if let Some(api_base_url) = calendar.api_base_url {
                self.calendar.api_base_url = api_base_url;
            }
            if let Some(utc_offset) = calendar.utc_offset {
                self.calendar.utc_offset = utc_offset;
            }
            if let Some(summary_delimiter) = calendar.summary_delimiter {
                self.calendar.summary_delimiter = summary_delimiter;
            }
            if let Some(timeout_secs) = calendar.timeout_secs {
                self.calendar.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ROOMBOT_SLACK_BOT_TOKEN") {
            self.slack.bot_token = secret_value(value);
        }
        if let Some(value) = read_env("ROOMBOT_SLACK_SIGNING_SECRET") {
            self.slack.signing_secret = Some(secret_value(value));
        }
        if let Some(value) = read_env("ROOMBOT_SLACK_API_BASE_URL") {
            self.slack.api_base_url = value;
        }
        if let Some(value) = read_env("ROOMBOT_SLACK_TIMEOUT_SECS") {
            self.slack.timeout_secs = parse_u64("ROOMBOT_SLACK_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ROOMBOT_CALENDAR_BACKEND") {
            self.calendar.backend = value.parse()?;
        }
        let calendar_id = read_env("ROOMBOT_CALENDAR_ID").or_else(|| read_env("CALENDAR_ID"));
        if let Some(value) = calendar_id {
            self.calendar.calendar_id = value;
        }
        if let Some(value) = read_env("ROOMBOT_CALENDAR_ACCESS_TOKEN") {
            self.calendar.access_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("ROOMBOT_CALENDAR_API_BASE_URL") {
            self.calendar.api_base_url = value;
        }
        if let Some(value) = read_env("ROOMBOT_CALENDAR_UTC_OFFSET") {
            self.calendar.utc_offset = value;
        }
        if let Some(value) = read_env("ROOMBOT_CALENDAR_SUMMARY_DELIMITER") {
            self.calendar.summary_delimiter = value;
        }
        if let Some(value) = read_env("ROOMBOT_CALENDAR_TIMEOUT_SECS") {
            self.calendar.timeout_secs = parse_u64("ROOMBOT_CALENDAR_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ROOMBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("ROOMBOT_SERVER_PORT") {
            self.server.port = parse_u16("ROOMBOT_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("ROOMBOT_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("ROOMBOT_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("ROOMBOT_LOGGING_LEVEL").or_else(|| read_env("ROOMBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ROOMBOT_LOGGING_FORMAT").or_else(|| read_env("ROOMBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(bot_token) = overrides.slack_bot_token {
            self.slack.bot_token = secret_value(bot_token);
        }
        if let Some(signing_secret) = overrides.slack_signing_secret {
            self.slack.signing_secret = Some(secret_value(signing_secret));
        }
        if let Some(api_base_url) = overrides.slack_api_base_url {
            self.slack.api_base_url = api_base_url;
        }
        if let Some(backend) = overrides.calendar_backend {
            self.calendar.backend = backend;
        }
        if let Some(calendar_id) = overrides.calendar_id {
            self.calendar.calendar_id = calendar_id;
        }
        if let Some(access_token) = overrides.calendar_access_token {
            self.calendar.access_token = Some(secret_value(access_token));
        }
        if let Some(api_base_url) = overrides.calendar_api_base_url {
            self.calendar.api_base_url = api_base_url;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_slack(&self.slack)?;
        validate_calendar(&self.calendar)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("roombot.toml"), PathBuf::from("config/roombot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    let bot_token = slack.bot_token.expose_secret();
    if bot_token.is_empty() {
        return Err(ConfigError::Validation(
            "slack.bot_token is required. Get it from https://api.slack.com/apps > Your App > OAuth & Permissions > Bot User OAuth Token".to_string()
        ));
    }
    if !bot_token.starts_with("xoxb-") {
        let hint = if bot_token.starts_with("xapp-") {
            " (hint: you may have used the app-level token instead of the bot token)"
        } else {
            ""
        };
        return Err(ConfigError::Validation(format!(
            "slack.bot_token must start with `xoxb-`{hint}. Get it from https://api.slack.com/apps"
        )));
    }

    if let Some(secret) = &slack.signing_secret {
        if secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "slack.signing_secret must not be blank when set".to_string(),
            ));
        }
    }

    validate_http_url("slack.api_base_url", &slack.api_base_url)?;
    validate_timeout("slack.timeout_secs", slack.timeout_secs)?;

    Ok(())
}

fn validate_calendar(calendar: &CalendarConfig) -> Result<(), ConfigError> {
    if calendar.backend == CalendarBackendKind::Google {
        if calendar.calendar_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "calendar.calendar_id is required for the google backend".to_string(),
            ));
        }

        let missing_token = calendar
            .access_token
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing_token {
            return Err(ConfigError::Validation(
                "calendar.access_token is required for the google backend".to_string(),
            ));
        }
    }

    validate_http_url("calendar.api_base_url", &calendar.api_base_url)?;
    calendar.offset()?;

    if calendar.summary_delimiter.trim().is_empty() {
        return Err(ConfigError::Validation(
            "calendar.summary_delimiter must not be blank".to_string(),
        ));
    }

    validate_timeout("calendar.timeout_secs", calendar.timeout_secs)?;

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn validate_timeout(key: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 300 {
        return Err(ConfigError::Validation(format!("{key} must be in range 1..=300")));
    }
    Ok(())
}

fn parse_utc_offset(value: &str) -> Option<FixedOffset> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    trimmed.parse::<FixedOffset>().ok()
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    slack: Option<SlackPatch>,
    calendar: Option<CalendarPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    bot_token: Option<String>,
    signing_secret: Option<String>,
    api_base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CalendarPatch {
    backend: Option<CalendarBackendKind>,
    calendar_id: Option<String>,
    access_token: Option<String>,
    api_base_url: Option<String>,
    utc_offset: Option<String>,
    summary_delimiter: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
