use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use claimcheck_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let sources = FieldSources::detect();
    let public_base_url = match &config.approval.public_base_url {
        Some(_) => config.public_base_url(),
        None => format!("<unset> (links use {})", config.public_base_url()),
    };

    let lines = vec![
        "effective config (source precedence: env > file > default):".to_string(),
        sources.line(
            "server.bind_address",
            &["CLAIMCHECK_SERVER_BIND_ADDRESS"],
            &config.server.bind_address,
        ),
        sources.line("server.port", &["CLAIMCHECK_SERVER_PORT"], &config.server.port.to_string()),
        sources.line(
            "server.graceful_shutdown_secs",
            &["CLAIMCHECK_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            &config.server.graceful_shutdown_secs.to_string(),
        ),
        sources.line(
            "runtime.base_url",
            &["CLAIMCHECK_RUNTIME_BASE_URL"],
            &config.runtime.base_url,
        ),
        sources.line(
            "runtime.app_name",
            &["CLAIMCHECK_RUNTIME_APP_NAME"],
            &config.runtime.app_name,
        ),
        sources.line(
            "runtime.function_name",
            &["CLAIMCHECK_RUNTIME_FUNCTION_NAME"],
            &config.runtime.function_name,
        ),
        sources.line(
            "runtime.timeout_secs",
            &["CLAIMCHECK_RUNTIME_TIMEOUT_SECS"],
            &config.runtime.timeout_secs.to_string(),
        ),
        sources.line(
            "approval.public_base_url",
            &["CLAIMCHECK_APPROVAL_PUBLIC_BASE_URL"],
            &public_base_url,
        ),
        sources.line(
            "notification.sender_email",
            &["CLAIMCHECK_NOTIFICATION_SENDER_EMAIL"],
            &config.notification.sender_email,
        ),
        sources.line(
            "logging.level",
            &["CLAIMCHECK_LOGGING_LEVEL", "CLAIMCHECK_LOG_LEVEL"],
            &config.logging.level,
        ),
        sources.line(
            "logging.format",
            &["CLAIMCHECK_LOGGING_FORMAT", "CLAIMCHECK_LOG_FORMAT"],
            &format!("{:?}", config.logging.format).to_ascii_lowercase(),
        ),
    ];

    lines.join("\n")
}

struct FieldSources {
    path: Option<PathBuf>,
    doc: Option<Value>,
}

impl FieldSources {
    fn detect() -> Self {
        let path = resolve_config_path(None);
        let doc = load_config_file_doc(path.as_deref());
        Self { path, doc }
    }

    fn line(&self, key_path: &str, env_keys: &[&str], value: &str) -> String {
        render_line(key_path, value, self.source(key_path, env_keys))
    }

    fn source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
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

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
