//! Invite domain models.

use serde::{Deserialize, Serialize};

/// Preference namespace holding user settings such as the email address.
pub const SETTINGS_NAMESPACE: &str = "settings";
/// Preference key of the user's email address.
pub const EMAIL_KEY: &str = "email";
/// Preference namespace holding the pending invite token hash.
pub const INVITE_NAMESPACE: &str = "invite";
/// Preference key of the pending invite token hash.
pub const TOKEN_KEY: &str = "token";

/// Request to invite a new user.
///
/// Missing fields deserialize as empty so that they fail validation
/// rather than being rejected by the JSON layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InviteRequest {
    pub username: String,
    pub email: String,
    /// Accepted for compatibility and ignored; invitees pick their own password.
    pub password: Option<String>,
    /// Groups to add the new account to, in order.
    pub groups: Vec<String>,
}

/// Outcome of validating a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: String,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }

    /// Marks the result invalid, replacing any earlier message.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.message = message.into();
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// Combined result of the three invite validators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub username: ValidationResult,
    pub email: ValidationResult,
    /// Group validation only yields a flag.
    pub groups: bool,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.username.valid && self.email.valid && self.groups
    }

    /// Failure messages of the fields that carry one, in field order.
    pub fn messages(&self) -> Vec<&str> {
        [&self.username, &self.email]
            .into_iter()
            .filter(|r| !r.valid && !r.message.is_empty())
            .map(|r| r.message.as_str())
            .collect()
    }
}

/// JSON body returned by the invite endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_user: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_email: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_groups: Option<bool>,
    pub msg: String,
}

impl InviteResponse {
    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            valid_user: None,
            valid_email: None,
            valid_groups: None,
            msg: msg.into(),
        }
    }
}

/// Lifecycle of a single invitation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteState {
    Received,
    Validating,
    Rejected,
    Provisioning,
    Provisioned,
    Emailing,
    Completed,
    Failed,
}

impl InviteState {
    /// Returns true if this state ends the request.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Completed | Self::Failed)
    }

    /// Returns true if moving from `self` to `next` is a legal step.
    pub fn can_transition_to(&self, next: InviteState) -> bool {
        use InviteState::*;
        matches!(
            (*self, next),
            (Received, Validating)
                | (Validating, Rejected)
                | (Validating, Provisioning)
                | (Validating, Failed)
                | (Provisioning, Provisioned)
                | (Provisioning, Failed)
                | (Provisioned, Emailing)
                | (Provisioned, Failed)
                | (Emailing, Completed)
                | (Emailing, Failed)
        )
    }
}

impl std::fmt::Display for InviteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InviteState::Received => "received",
            InviteState::Validating => "validating",
            InviteState::Rejected => "rejected",
            InviteState::Provisioning => "provisioning",
            InviteState::Provisioned => "provisioned",
            InviteState::Emailing => "emailing",
            InviteState::Completed => "completed",
            InviteState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of running the invite workflow: an HTTP-style status and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteOutcome {
    pub status: u16,
    pub state: InviteState,
    pub body: InviteResponse,
}

impl InviteOutcome {
    pub const OK: u16 = 200;
    pub const BAD_REQUEST: u16 = 400;
    pub const INTERNAL_ERROR: u16 = 500;

    pub fn completed(msg: impl Into<String>) -> Self {
        Self {
            status: Self::OK,
            state: InviteState::Completed,
            body: InviteResponse::message(msg),
        }
    }

    pub fn rejected(report: &ValidationReport, msg: impl Into<String>) -> Self {
        Self {
            status: Self::BAD_REQUEST,
            state: InviteState::Rejected,
            body: InviteResponse {
                valid_user: Some(report.username.valid),
                valid_email: Some(report.email.valid),
                valid_groups: Some(report.groups),
                msg: msg.into(),
            },
        }
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self {
            status: Self::INTERNAL_ERROR,
            state: InviteState::Failed,
            body: InviteResponse::message(msg),
        }
    }
}
