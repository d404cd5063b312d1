use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub runtime: RuntimeConfig,
    pub approval: ApprovalConfig,
    pub notification: NotificationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

/// Where the external agent runtime accepts resumption calls.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub base_url: String,
    pub app_name: String,
    pub function_name: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ApprovalConfig {
    pub public_base_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NotificationConfig {
    pub sender_email: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
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
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub runtime_base_url: Option<String>,
    pub runtime_timeout_secs: Option<u64>,
    pub public_base_url: Option<String>,
    pub sender_email: Option<String>,
    pub log_level: Option<String>,
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
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8085,
                graceful_shutdown_secs: 15,
            },
            runtime: RuntimeConfig {
                base_url: "http://localhost:8000".to_string(),
                app_name: "insurance_notification".to_string(),
                function_name: "request_claim_approval".to_string(),
                timeout_secs: 30,
            },
            approval: ApprovalConfig { public_base_url: None },
            notification: NotificationConfig { sender_email: "noreply@insurance.com".to_string() },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
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

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("claimcheck.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Base URL embedded in approve/reject links sent to customers.
    pub fn public_base_url(&self) -> String {
        match &self.approval.public_base_url {
            Some(url) => url.trim().trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.server.bind_address, self.server.port),
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
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

        if let Some(runtime) = patch.runtime {
            if let Some(base_url) = runtime.base_url {
                self.runtime.base_url = base_url;
            }
            if let Some(app_name) = runtime.app_name {
                self.runtime.app_name = app_name;
            }
            if let Some(function_name) = runtime.function_name {
                self.runtime.function_name = function_name;
            }
            if let Some(timeout_secs) = runtime.timeout_secs {
                self.runtime.timeout_secs = timeout_secs;
            }
        }

        if let Some(approval) = patch.approval {
            if let Some(public_base_url) = approval.public_base_url {
                self.approval.public_base_url = Some(public_base_url);
            }
        }

        if let Some(notification) = patch.notification {
            if let Some(sender_email) = notification.sender_email {
                self.notification.sender_email = sender_email;
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
        if let Some(value) = read_env("CLAIMCHECK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("CLAIMCHECK_SERVER_PORT") {
            self.server.port = parse_u16("CLAIMCHECK_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("CLAIMCHECK_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("CLAIMCHECK_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("CLAIMCHECK_RUNTIME_BASE_URL") {
            self.runtime.base_url = value;
        }
        if let Some(value) = read_env("CLAIMCHECK_RUNTIME_APP_NAME") {
            self.runtime.app_name = value;
        }
        if let Some(value) = read_env("CLAIMCHECK_RUNTIME_FUNCTION_NAME") {
            self.runtime.function_name = value;
        }
        if let Some(value) = read_env("CLAIMCHECK_RUNTIME_TIMEOUT_SECS") {
            self.runtime.timeout_secs = parse_u64("CLAIMCHECK_RUNTIME_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CLAIMCHECK_APPROVAL_PUBLIC_BASE_URL") {
            self.approval.public_base_url = Some(value);
        }

        if let Some(value) = read_env("CLAIMCHECK_NOTIFICATION_SENDER_EMAIL") {
            self.notification.sender_email = value;
        }

        let log_level =
            read_env("CLAIMCHECK_LOGGING_LEVEL").or_else(|| read_env("CLAIMCHECK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CLAIMCHECK_LOGGING_FORMAT").or_else(|| read_env("CLAIMCHECK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(runtime_base_url) = overrides.runtime_base_url {
            self.runtime.base_url = runtime_base_url;
        }
        if let Some(runtime_timeout_secs) = overrides.runtime_timeout_secs {
            self.runtime.timeout_secs = runtime_timeout_secs;
        }
        if let Some(public_base_url) = overrides.public_base_url {
            self.approval.public_base_url = Some(public_base_url);
        }
        if let Some(sender_email) = overrides.sender_email {
            self.notification.sender_email = sender_email;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_runtime(&self.runtime)?;
        validate_approval(&self.approval)?;
        validate_notification(&self.notification)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("claimcheck.toml"), PathBuf::from("config/claimcheck.toml")]
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

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

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

fn validate_runtime(runtime: &RuntimeConfig) -> Result<(), ConfigError> {
    if !is_http_url(&runtime.base_url) {
        return Err(ConfigError::Validation(
            "runtime.base_url must start with http:// or https://".to_string(),
        ));
    }

    if runtime.app_name.trim().is_empty() {
        return Err(ConfigError::Validation("runtime.app_name must not be empty".to_string()));
    }

    if runtime.function_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "runtime.function_name must not be empty".to_string(),
        ));
    }

    if runtime.timeout_secs == 0 || runtime.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "runtime.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_approval(approval: &ApprovalConfig) -> Result<(), ConfigError> {
    if let Some(base_url) = &approval.public_base_url {
        if !is_http_url(base_url) {
            return Err(ConfigError::Validation(
                "approval.public_base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_notification(notification: &NotificationConfig) -> Result<(), ConfigError> {
    let sender = notification.sender_email.trim();
    let valid = sender
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && !domain.is_empty())
        .unwrap_or(false);
    if !valid {
        return Err(ConfigError::Validation(
            "notification.sender_email must be an email address (`name@domain`)".to_string(),
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

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
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
    server: Option<ServerPatch>,
    runtime: Option<RuntimePatch>,
    approval: Option<ApprovalPatch>,
    notification: Option<NotificationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RuntimePatch {
    base_url: Option<String>,
    app_name: Option<String>,
    function_name: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ApprovalPatch {
    public_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationPatch {
    sender_email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
