//! Approval ticket tracking for claim-verification requests raised by the
//! insurance notification agent.
//!
//! - `tickets` - ticket store with at-most-once terminal transitions
//! - `claims` - claim and policy records served to the agent's tools
//! - `notify` - email composition and the demo notification sender
//! - `config` - layered configuration (defaults, file, env, overrides)

pub mod claims;
pub mod config;
pub mod domain;
pub mod errors;
pub mod notify;
pub mod tickets;

pub use claims::ClaimDirectory;
pub use domain::approval::{
    ApprovalTicket, NewTicket, SessionInfo, TicketId, TicketMetadata, TicketStatus,
};
pub use domain::claim::{Claim, ClaimId, ClaimStatus};
pub use domain::policy::{Policy, PolicyNumber, PolicyStatus};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use notify::{
    DeliveryReceipt, DemoNotificationSender, EmailTemplates, Notification, NotificationError,
    NotificationKind, NotificationSender,
};
pub use tickets::{InMemoryTicketStore, TicketError, TicketStore};
