use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::validation::{ValidationErrors, REQUIRED};

pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 64;
pub const EMAIL_MAX: usize = 254;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
}

/// Account data ready to be stored; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub is_staff: bool,
}

/// Changes to an existing account. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_staff: Option<bool>,
}

/// Trims the address and lower-cases its domain part.
pub fn normalize_email(email: &str) -> Result<String, ValidationErrors> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationErrors::single("email", REQUIRED));
    }
    let invalid = || ValidationErrors::single("email", "Enter a valid email address.");
    if email.chars().count() > EMAIL_MAX || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(format!("{}@{}", local, domain.to_lowercase()))
}

pub fn validate_password(password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let length = password.chars().count();
    if length < PASSWORD_MIN {
        errors.add(
            "password",
            format!("Ensure this field has at least {} characters.", PASSWORD_MIN),
        );
    }
    if length > PASSWORD_MAX {
        errors.add(
            "password",
            format!("Ensure this field has no more than {} characters.", PASSWORD_MAX),
        );
    }
    if length > 0 && password.chars().all(|c| c.is_ascii_digit()) {
        errors.add("password", "This password is entirely numeric.");
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_domain_is_lowercased() {
        assert_eq!(normalize_email(" Test@Example.COM ").unwrap(), "Test@example.com");
    }

    #[test]
    fn test_invalid_emails() {
        for email in ["plain", "@example.com", "a@b", "a@@b.com", "a b@c.com", "a@.com"] {
            assert!(normalize_email(email).is_err(), "{} should be rejected", email);
        }
        assert_eq!(normalize_email("").unwrap_err().messages("email"), [REQUIRED]);
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("testpassword").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(65)).is_err());
        assert_eq!(
            validate_password("1234567890").unwrap_err().messages("password"),
            ["This password is entirely numeric."]
        );
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            is_staff: false,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
