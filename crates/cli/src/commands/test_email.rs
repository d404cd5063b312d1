use claimcheck_core::config::{AppConfig, LoadOptions};
use claimcheck_core::{
    DemoNotificationSender, EmailTemplates, NotificationError, NotificationKind, NotificationSender,
};

use super::CommandResult;

const COMMAND: &str = "test-email";
const SUBJECT: &str = "Test Email from Insurance Notification Agent";

pub fn run(recipient: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2)
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                5,
            )
        }
    };

    let sender = DemoNotificationSender::new(config.notification.sender_email.clone());
    let outcome = runtime.block_on(async {
        let templates = EmailTemplates::embedded()?;
        let message = templates.test_message(sender.sender_email(), sender.is_demo())?;
        let notification =
            templates.compose(recipient, SUBJECT, &message, NotificationKind::General)?;
        sender.send(&notification).await
    });

    match outcome {
        Ok(receipt) => {
            let mode =
                if receipt.demo_mode { "recorded (demo mode, not actually sent)" } else { "sent" };
            CommandResult::success(
                COMMAND,
                format!("test email to {} {mode}; subject: {}", receipt.recipient, receipt.subject),
            )
        }
        Err(error) => {
            let (error_class, exit_code) = match &error {
                NotificationError::InvalidRecipient(_)
                | NotificationError::EmptySubject
                | NotificationError::UnknownKind(_) => ("invalid_recipient", 3),
                NotificationError::Template(_) => ("template", 4),
                NotificationError::Delivery(_) => ("delivery", 5),
            };
            CommandResult::failure(COMMAND, error_class, error.to_string(), exit_code)
        }
    }
}
