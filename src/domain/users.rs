//! User entity and mutation payload shapes.

use serde::{Deserialize, Serialize};

/// An account, as exposed to the feed client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// A field-level validation failure carried inside a mutation payload.
///
/// Validation failures are data, not errors: they travel in the payload and
/// must never be surfaced as an operation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Payload of the `login` and `register` mutations.
///
/// Exactly one of `errors` and `user` is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl UserResponse {
    pub fn ok(user: User) -> Self {
        Self {
            errors: None,
            user: Some(user),
        }
    }

    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: Some(vec![FieldError {
                field: field.into(),
                message: message.into(),
            }]),
            user: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.errors.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_payload_has_no_user() {
        let response = UserResponse::error("username", "length must be greater than 2");
        assert!(response.is_error());
        assert!(response.user.is_none());
    }

    #[test]
    fn ok_payload_round_trips() {
        let response = UserResponse::ok(User {
            id: 3,
            username: "ada".to_string(),
        });
        let json = serde_json::to_string(&response).expect("payload serializes");
        assert!(!json.contains("errors"));
        let back: UserResponse = serde_json::from_str(&json).expect("payload deserializes");
        assert_eq!(back, response);
    }
}
