//! Collaborator interfaces consumed by the invitation workflow.
//!
//! The hosting platform owns users, groups, preferences, mail delivery and
//! link generation. The workflow only talks to them through these traits.

use std::collections::BTreeMap;
use thiserror::Error;

/// Errors reported by user, group and preference stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Backend(String),
}

/// Errors reported by a mail transport.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail transport not configured")]
    NotConfigured,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to send mail: {0}")]
    SendFailed(String),
}

/// Errors reported by a template renderer.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Unknown template: {0}")]
    NotFound(String),

    #[error("Missing template variable: {0}")]
    MissingVariable(String),
}

/// Template variables keyed by placeholder name.
pub type TemplateVars = BTreeMap<String, String>;

/// A message handed to the mail transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub body: String,
    pub from: String,
    pub from_name: String,
}

/// User accounts.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns true if an account with this name exists.
    async fn exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Creates an account. Returns false if the store refused, e.g. on a duplicate.
    async fn create(&self, name: &str, password: &str) -> Result<bool, StoreError>;

    /// Human readable name of a user, falling back to the id.
    async fn display_name(&self, id: &str) -> Result<String, StoreError>;

    /// Replaces the password of an existing account. Returns false if the user is unknown.
    async fn set_password(&self, name: &str, password: &str) -> Result<bool, StoreError>;
}

/// Groups and memberships.
#[async_trait::async_trait]
pub trait GroupDirectory: Send + Sync {
    async fn exists(&self, name: &str) -> Result<bool, StoreError>;

    async fn add_member(&self, user: &str, group: &str) -> Result<(), StoreError>;

    async fn is_member(&self, user: &str, group: &str) -> Result<bool, StoreError>;
}

/// Per-user key/value preferences grouped by namespace.
#[async_trait::async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, user: &str, namespace: &str, key: &str)
        -> Result<Option<String>, StoreError>;

    async fn set(&self, user: &str, namespace: &str, key: &str, value: &str)
        -> Result<(), StoreError>;

    async fn delete(&self, user: &str, namespace: &str, key: &str) -> Result<(), StoreError>;
}

/// Builds links to named routes.
pub trait LinkGenerator: Send + Sync {
    /// Relative URL of `route` with the given query parameters.
    fn link_for(&self, route: &str, params: &[(&str, &str)]) -> String;

    /// Turns a relative URL into an absolute one.
    fn to_absolute(&self, url: &str) -> String;
}

/// Renders named templates.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, vars: &TemplateVars) -> Result<String, TemplateError>;
}

/// Outgoing mail transport.
#[async_trait::async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// System-wide settings.
pub trait ConfigStore: Send + Sync {
    fn system_value(&self, key: &str, default: &str) -> String;

    /// Default sender address for automated mail, e.g. `no-reply@host`.
    fn default_email_address(&self, local_part: &str) -> String;
}

/// Message localization.
pub trait Translator: Send + Sync {
    fn t(&self, message: &str, args: &[&str]) -> String;
}
