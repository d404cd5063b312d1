//! Customer email notifications.
//!
//! Message bodies are rendered from embedded Tera templates and wrapped in the
//! branded envelope before they reach a [`NotificationSender`]. The shipped
//! sender is [`DemoNotificationSender`], which records and logs each message
//! instead of handing it to a mail transport.

use std::collections::VecDeque;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::claims::{format_money, title_case};
use crate::domain::approval::TicketId;
use crate::domain::claim::Claim;
use crate::errors::{ApplicationError, DomainError};

const ENVELOPE_TEMPLATE: &str = "email/notification.html";
const CLAIM_VERIFICATION_TEMPLATE: &str = "email/claim_verification.html";
const TEST_MESSAGE_TEMPLATE: &str = "email/test_message.html";

/// Most recent messages a [`DemoNotificationSender`] keeps for inspection.
pub const DEMO_OUTBOX_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ClaimUpdate,
    PolicyRenewal,
    PaymentReminder,
    ClaimVerification,
    General,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClaimUpdate => "claim_update",
            Self::PolicyRenewal => "policy_renewal",
            Self::PaymentReminder => "payment_reminder",
            Self::ClaimVerification => "claim_verification",
            Self::General => "general",
        }
    }

    pub fn label(&self) -> String {
        title_case(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = NotificationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "claim_update" => Ok(Self::ClaimUpdate),
            "policy_renewal" => Ok(Self::PolicyRenewal),
            "payment_reminder" => Ok(Self::PaymentReminder),
            "claim_verification" => Ok(Self::ClaimVerification),
            "general" => Ok(Self::General),
            other => Err(NotificationError::UnknownKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("invalid recipient address `{0}`")]
    InvalidRecipient(String),
    #[error("notification subject must not be empty")]
    EmptySubject,
    #[error(
        "unsupported notification type `{0}` (expected claim_update|policy_renewal|\
         payment_reminder|claim_verification|general)"
    )]
    UnknownKind(String),
    #[error("template rendering failed: {0}")]
    Template(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl From<tera::Error> for NotificationError {
    fn from(error: tera::Error) -> Self {
        Self::Template(error.to_string())
    }
}

impl From<NotificationError> for ApplicationError {
    fn from(value: NotificationError) -> Self {
        match value {
            NotificationError::InvalidRecipient(_)
            | NotificationError::EmptySubject
            | NotificationError::UnknownKind(_) => {
                DomainError::InvariantViolation(value.to_string()).into()
            }
            NotificationError::Template(message) => Self::Configuration(message),
            NotificationError::Delivery(message) => Self::Integration(message),
        }
    }
}

/// A fully rendered message ready for delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub kind: NotificationKind,
    pub message: String,
    pub body_html: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    pub recipient: String,
    pub subject: String,
    pub notification_type: NotificationKind,
    pub demo_mode: bool,
    pub sent_at: DateTime<Utc>,
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<DeliveryReceipt, NotificationError>;

    /// `true` when messages are recorded instead of delivered.
    fn is_demo(&self) -> bool;
}

pub struct EmailTemplates {
    tera: Tera,
}

impl EmailTemplates {
    pub fn embedded() -> Result<Self, NotificationError> {
        Self::from_sources(
            include_str!("../../../../templates/email/notification.html"),
            include_str!("../../../../templates/email/claim_verification.html"),
            include_str!("../../../../templates/email/test_message.html"),
        )
    }

    /// Builds the template set from raw Tera sources, e.g. for rebranded mail.
    pub fn from_sources(
        envelope: &str,
        claim_verification: &str,
        test_message: &str,
    ) -> Result<Self, NotificationError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (ENVELOPE_TEMPLATE, envelope),
            (CLAIM_VERIFICATION_TEMPLATE, claim_verification),
            (TEST_MESSAGE_TEMPLATE, test_message),
        ])?;
        Ok(Self { tera })
    }

    /// Validates the addressing fields and wraps `message` in the envelope.
    pub fn compose(
        &self,
        recipient: &str,
        subject: &str,
        message: &str,
        kind: NotificationKind,
    ) -> Result<Notification, NotificationError> {
        let recipient = recipient.trim();
        validate_recipient(recipient)?;
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(NotificationError::EmptySubject);
        }

        let mut context = Context::new();
        context.insert("kind_label", &kind.label());
        context.insert("message", message);
        let body_html = self.tera.render(ENVELOPE_TEMPLATE, &context)?;

        Ok(Notification {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            kind,
            message: message.to_string(),
            body_html,
        })
    }

    pub fn claim_verification_message(
        &self,
        ticket_id: &TicketId,
        claim: &Claim,
        approve_url: &str,
        reject_url: &str,
    ) -> Result<String, NotificationError> {
        let mut context = Context::new();
        context.insert("ticket_id", ticket_id.as_str());
        context.insert("claim_id", &claim.claim_id.0);
        context.insert("claim_type", &title_case(&claim.claim_type));
        context.insert("claim_amount", &format_money(claim.claim_amount));
        context.insert("claim_status", &title_case(claim.status.as_str()));
        context.insert("filed_date", &claim.filed_date.to_string());
        context.insert("approve_url", approve_url);
        context.insert("reject_url", reject_url);
        Ok(self.tera.render(CLAIM_VERIFICATION_TEMPLATE, &context)?)
    }

    pub fn test_message(
        &self,
        sender_email: &str,
        demo_mode: bool,
    ) -> Result<String, NotificationError> {
        let mut context = Context::new();
        context.insert("sender_email", sender_email);
        let delivery_mode = if demo_mode { "demo (logged, not sent)" } else { "live" };
        context.insert("delivery_mode", delivery_mode);
        Ok(self.tera.render(TEST_MESSAGE_TEMPLATE, &context)?)
    }
}

/// Logs messages and keeps the most recent ones in a bounded outbox; nothing
/// leaves the process.
pub struct DemoNotificationSender {
    sender_email: String,
    capacity: usize,
    outbox: Mutex<VecDeque<Notification>>,
}

impl DemoNotificationSender {
    pub fn new(sender_email: impl Into<String>) -> Self {
        Self::with_outbox_capacity(sender_email, DEMO_OUTBOX_CAPACITY)
    }

    /// A capacity of zero disables recording; messages are only logged.
    pub fn with_outbox_capacity(sender_email: impl Into<String>, capacity: usize) -> Self {
        Self {
            sender_email: sender_email.into(),
            capacity,
            outbox: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn sender_email(&self) -> &str {
        &self.sender_email
    }

    /// Recorded messages, oldest first.
    pub async fn outbox(&self) -> Vec<Notification> {
        self.outbox.lock().await.iter().cloned().collect()
    }
}

#[async_trait]
impl NotificationSender for DemoNotificationSender {
    async fn send(
        &self,
        notification: &Notification,
    ) -> Result<DeliveryReceipt, NotificationError> {
        info!(
            event_name = "notify.demo.sent",
            correlation_id = "notification",
            sender = %self.sender_email,
            recipient = %notification.recipient,
            subject = %notification.subject,
            notification_type = %notification.kind,
            message = %notification.message,
            "email notification recorded (demo mode, not actually sent)"
        );

        if self.capacity > 0 {
            let mut outbox = self.outbox.lock().await;
            while outbox.len() >= self.capacity {
                outbox.pop_front();
            }
            outbox.push_back(notification.clone());
        }

        Ok(DeliveryReceipt {
            recipient: notification.recipient.clone(),
            subject: notification.subject.clone(),
            notification_type: notification.kind,
            demo_mode: true,
            sent_at: Utc::now(),
        })
    }

    fn is_demo(&self) -> bool {
        true
    }
}

/// Cheap shape check for `local@domain`; deliverability is the transport's problem.
pub fn validate_recipient(value: &str) -> Result<(), NotificationError> {
    let plausible = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if plausible {
        Ok(())
    } else {
        Err(NotificationError::InvalidRecipient(value.to_string()))
    }
}
