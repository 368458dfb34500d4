//! Types for authentication and user management

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// User data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user ID
    pub id: i64,

    /// The user's email address
    pub email: String,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    /// Whether the user may use the admin back-office
    #[serde(default)]
    pub is_admin: bool,

    /// The creation time
    #[serde(default, with = "crate::timestamp::option", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// First and last name joined, falling back to the email address
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            self.email.clone()
        } else {
            parts.join(" ")
        }
    }
}

/// Login credentials
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(Error::validation("Password is required"));
        }
        Ok(())
    }
}

/// Registration form
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl Registration {
    pub(crate) fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        if self.password.chars().count() < 6 {
            return Err(Error::validation("Password must be at least 6 characters"));
        }
        for (label, value) in [("First name", &self.first_name), ("Last name", &self.last_name)] {
            let len = value.trim().chars().count();
            if len == 0 || len > 50 {
                return Err(Error::validation(format!("{label} must be between 1 and 50 characters")));
            }
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(Error::validation("A valid email address is required")),
    }
}

/// Response to login and registration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,

    /// The access token
    pub access_token: String,

    /// The user data
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeResponse {
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_validation() {
        let mut reg = Registration {
            email: "ada@example.com".to_string(),
            password: "secret1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        };
        assert!(reg.validate().is_ok());

        reg.password = "short".to_string();
        assert!(matches!(reg.validate(), Err(Error::Validation(_))));

        reg.password = "secret1".to_string();
        reg.email = "not-an-email".to_string();
        assert!(matches!(reg.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_display_name() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": 7,
            "email": "grace@example.com",
            "first_name": "Grace",
            "last_name": "Hopper",
            "is_admin": true,
            "created_at": "2024-01-05T09:00:00"
        }))
        .unwrap();
        assert_eq!(user.display_name(), "Grace Hopper");
        assert!(user.is_admin);
        assert!(user.created_at.is_some());

        let bare: User = serde_json::from_value(serde_json::json!({
            "id": 8,
            "email": "anon@example.com"
        }))
        .unwrap();
        assert_eq!(bare.display_name(), "anon@example.com");
        assert!(!bare.is_admin);
    }
}
