use std::env;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Mutex, OnceLock};
use std::thread;

use claimcheck_cli::commands::{config, doctor, test_email};
use serde_json::Value;

#[test]
fn config_attributes_env_overrides() {
    with_env(&[("CLAIMCHECK_SERVER_PORT", "9090"), ("CLAIMCHECK_LOG_LEVEL", "debug")], || {
        let output = config::run();

        assert!(output.starts_with("effective config"));
        assert!(output.contains("- server.port = 9090 (source: env (CLAIMCHECK_SERVER_PORT))"));
        assert!(output.contains("- logging.level = debug (source: env (CLAIMCHECK_LOG_LEVEL))"));
        assert!(output.contains("- runtime.base_url = http://localhost:8000 (source: default)"));
        assert!(output
            .contains("- approval.public_base_url = <unset> (links use http://127.0.0.1:9090)"));
    });
}

#[test]
fn config_reports_validation_failure() {
    with_env(&[("CLAIMCHECK_RUNTIME_TIMEOUT_SECS", "0")], || {
        let output = config::run();
        assert!(output.starts_with("config validation failed"));
    });
}

#[test]
fn doctor_skips_checks_when_config_invalid() {
    with_env(&[("CLAIMCHECK_RUNTIME_BASE_URL", "ftp://agents.internal")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["name"], "config_validation");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
        assert_eq!(payload["checks"][2]["status"], "skipped");
    });
}

#[test]
fn doctor_fails_when_runtime_unreachable() {
    let address = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("local addr")
    };
    let base_url = format!("http://{address}");

    with_env(
        &[
            ("CLAIMCHECK_RUNTIME_BASE_URL", base_url.as_str()),
            ("CLAIMCHECK_RUNTIME_TIMEOUT_SECS", "2"),
        ],
        || {
            let result = doctor::run(true);
            assert_eq!(result.exit_code, 1);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["overall_status"], "fail");
            assert_eq!(payload["checks"][1]["name"], "agent_runtime_reachability");
            assert_eq!(payload["checks"][1]["status"], "fail");
        },
    );
}

#[test]
fn doctor_passes_with_reachable_runtime_and_public_url() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut buffer = [0_u8; 1024];
        let _ = stream.read(&mut buffer);
        stream
            .write_all(b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
            .expect("write response");
    });

    with_env(
        &[
            ("CLAIMCHECK_RUNTIME_BASE_URL", base_url.as_str()),
            ("CLAIMCHECK_APPROVAL_PUBLIC_BASE_URL", "https://claims.example.com"),
        ],
        || {
            let result = doctor::run(false);
            assert_eq!(result.exit_code, 0, "unexpected report:\n{}", result.output);
            assert!(result.output.starts_with("doctor: all readiness checks passed"));
            assert!(result.output.contains("- [ok] agent_runtime_reachability"));
            assert!(result.output.contains("approval links use `https://claims.example.com`"));
        },
    );

    server.join().expect("fake runtime thread");
}

#[test]
fn test_email_records_message_in_demo_mode() {
    with_env(&[], || {
        let result = test_email::run("holder@example.com");
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "test-email");
        assert_eq!(payload["status"], "ok");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("holder@example.com"));
        assert!(message.contains("demo mode"));
    });
}

#[test]
fn test_email_rejects_malformed_recipient() {
    with_env(&[], || {
        let result = test_email::run("holder.example.com");
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_recipient");
    });
}

#[test]
fn test_email_reports_config_failure() {
    with_env(&[("CLAIMCHECK_NOTIFICATION_SENDER_EMAIL", "not-an-address")], || {
        let result = test_email::run("holder@example.com");
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "CLAIMCHECK_SERVER_BIND_ADDRESS",
        "CLAIMCHECK_SERVER_PORT",
        "CLAIMCHECK_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "CLAIMCHECK_RUNTIME_BASE_URL",
        "CLAIMCHECK_RUNTIME_APP_NAME",
        "CLAIMCHECK_RUNTIME_FUNCTION_NAME",
        "CLAIMCHECK_RUNTIME_TIMEOUT_SECS",
        "CLAIMCHECK_APPROVAL_PUBLIC_BASE_URL",
        "CLAIMCHECK_NOTIFICATION_SENDER_EMAIL",
        "CLAIMCHECK_LOGGING_LEVEL",
        "CLAIMCHECK_LOGGING_FORMAT",
        "CLAIMCHECK_LOG_LEVEL",
        "CLAIMCHECK_LOG_FORMAT",
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
