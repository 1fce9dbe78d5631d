//! Models for accepting an invitation.

use serde::{Deserialize, Serialize};

/// Request sent by the invitee after following the emailed link.
///
/// Missing fields deserialize as empty; an empty token is refused by the
/// workflow like any other invalid token.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JoinRequest {
    pub username: String,
    pub token: String,
    /// The password the invitee wants to use from now on.
    pub password: String,
}

/// Query parameters of the join link.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenCheckQuery {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub token: String,
}

/// Whether a join link is still usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCheckResponse {
    pub valid: bool,
}

/// JSON body returned by the join endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_password: Option<bool>,
    pub msg: String,
}

/// Result of accepting an invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub status: u16,
    pub body: JoinResponse,
}

impl JoinOutcome {
    pub fn joined(msg: impl Into<String>) -> Self {
        Self::with_status(200, None, msg)
    }

    pub fn weak_password(msg: impl Into<String>) -> Self {
        Self::with_status(400, Some(false), msg)
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_status(403, None, msg)
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self::with_status(500, None, msg)
    }

    fn with_status(status: u16, valid_password: Option<bool>, msg: impl Into<String>) -> Self {
        Self {
            status,
            body: JoinResponse {
                valid_password,
                msg: msg.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_request_missing_fields_default_empty() {
        let request: JoinRequest = serde_json::from_str(r#"{"username":"bob"}"#).unwrap();
        assert_eq!(request.username, "bob");
        assert!(request.token.is_empty());
        assert!(request.password.is_empty());
    }

    #[test]
    fn test_weak_password_body() {
        let outcome = JoinOutcome::weak_password("too weak");
        assert_eq!(outcome.status, 400);
        let json = serde_json::to_value(&outcome.body).unwrap();
        assert_eq!(json, serde_json::json!({"validPassword": false, "msg": "too weak"}));
    }

    #[test]
    fn test_joined_body_has_only_msg() {
        let json = serde_json::to_value(JoinOutcome::joined("OK").body).unwrap();
        assert_eq!(json, serde_json::json!({"msg": "OK"}));
    }
}
