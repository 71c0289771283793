use lazy_static::lazy_static;
use regex::Regex;

use crate::{auth::messages, error::AppError};

pub const EMAIL_MAX_LENGTH: usize = 100;
pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 128;
pub const NAME_MIN_LENGTH: usize = 2;
pub const NAME_MAX_LENGTH: usize = 50;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref NAME_LETTER_RE: Regex = Regex::new(r"[a-zA-ZÀ-ÿ]").unwrap();
    static ref NAME_RE: Regex = Regex::new(r"^[a-zA-ZÀ-ÿ0-9\s\-._&()]+$").unwrap();
}

/// Lookup key for a user: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    if email.trim().is_empty() {
        return Err(AppError::validation("email", messages::EMAIL_REQUIRED));
    }
    if email.chars().count() > EMAIL_MAX_LENGTH {
        return Err(AppError::validation(
            "email",
            format!("Email não pode ter mais de {EMAIL_MAX_LENGTH} caracteres"),
        ));
    }
    if !is_valid_email(email) {
        return Err(AppError::validation("email", messages::EMAIL_INVALID));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.trim().is_empty() {
        return Err(AppError::validation("password", messages::PASSWORD_REQUIRED));
    }
    let len = password.chars().count();
    if len < PASSWORD_MIN_LENGTH {
        return Err(AppError::validation("password", messages::PASSWORD_MIN_LENGTH));
    }
    if len > PASSWORD_MAX_LENGTH {
        return Err(AppError::validation(
            "password",
            format!("Senha não pode ter mais de {PASSWORD_MAX_LENGTH} caracteres"),
        ));
    }
    let lower = password.chars().any(|c| c.is_ascii_lowercase());
    let upper = password.chars().any(|c| c.is_ascii_uppercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    if !(lower && upper && digit) {
        return Err(AppError::validation("password", messages::PASSWORD_WEAK));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name", messages::NAME_REQUIRED));
    }
    let len = name.chars().count();
    if len < NAME_MIN_LENGTH {
        return Err(AppError::validation("name", messages::NAME_MIN_LENGTH));
    }
    if len > NAME_MAX_LENGTH {
        return Err(AppError::validation(
            "name",
            format!("Nome não pode ter mais de {NAME_MAX_LENGTH} caracteres"),
        ));
    }
    if !NAME_LETTER_RE.is_match(name) {
        return Err(AppError::validation("name", messages::NAME_NEEDS_LETTER));
    }
    if !NAME_RE.is_match(name) {
        return Err(AppError::validation("name", messages::NAME_INVALID));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: AppError) -> String {
        match err {
            AppError::Validation { message, .. } => message,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("a@example.com").is_ok());
        assert_eq!(message(validate_email("  ").unwrap_err()), messages::EMAIL_REQUIRED);
        assert_eq!(message(validate_email("no-at.example").unwrap_err()), messages::EMAIL_INVALID);
        assert_eq!(message(validate_email("a@b").unwrap_err()), messages::EMAIL_INVALID);
        let long = format!("{}@example.com", "a".repeat(100));
        assert!(message(validate_email(&long).unwrap_err()).contains("100"));
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("Secret123").is_ok());
        assert_eq!(message(validate_password("Ab1").unwrap_err()), messages::PASSWORD_MIN_LENGTH);
        assert_eq!(message(validate_password("secret123").unwrap_err()), messages::PASSWORD_WEAK);
        assert_eq!(message(validate_password("SECRETabc").unwrap_err()), messages::PASSWORD_WEAK);
        assert!(validate_password(&format!("Aa1{}", "x".repeat(200))).is_err());
    }

    #[test]
    fn name_rules() {
        assert!(validate_name("João da Silva").is_ok());
        assert!(validate_name("Ana & Filhos (ME)").is_ok());
        assert_eq!(message(validate_name("").unwrap_err()), messages::NAME_REQUIRED);
        assert_eq!(message(validate_name("A").unwrap_err()), messages::NAME_MIN_LENGTH);
        assert_eq!(message(validate_name("12345").unwrap_err()), messages::NAME_NEEDS_LETTER);
        assert_eq!(message(validate_name("Ana <script>").unwrap_err()), messages::NAME_INVALID);
    }

    #[test]
    fn normalizes_lookup_key() {
        assert_eq!(normalize_email("  A@Example.COM "), "a@example.com");
    }
}
