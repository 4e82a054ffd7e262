//! Identity and authentication payloads.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Role that confers admin capability.
pub const ADMIN_ROLE: &str = "ADMIN";

/// The authenticated user as returned by sign-in/sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl UserSummary {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// Request body for `POST /api/auth/sign-in`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Request body for `POST /api/auth/sign-up`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Successful sign-in/sign-up response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

/// Authenticated identity held by the client.
///
/// `token` and `user` are installed and cleared together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user: Option<UserSummary>,
}

impl Session {
    pub fn new(token: String, user: UserSummary) -> Self {
        Self {
            token: Some(token),
            user: Some(user),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserSummary> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserSummary::is_admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_roles_default_to_empty() {
        let user: UserSummary = serde_json::from_str(r#"{"id": 3, "username": "ann"}"#).unwrap();
        assert!(user.roles.is_empty());
        assert!(!user.is_admin());
    }

    #[test]
    fn test_session_admin_requires_role() {
        let user: UserSummary =
            serde_json::from_str(r#"{"id": 1, "username": "root", "roles": ["USER", "ADMIN"]}"#)
                .unwrap();
        let session = Session::new("t".to_string(), user);
        assert!(session.is_authenticated());
        assert!(session.is_admin());
        assert!(!Session::default().is_admin());
    }
}
