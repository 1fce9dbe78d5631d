//! Common validation utilities.
//!
//! These are purely syntactic checks; rules that need a user or group store
//! live in the domain crate.

use validator::{ValidateEmail, ValidationError};

/// Minimum username length in characters.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

lazy_static::lazy_static! {
    static ref USERNAME_CHARS_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-zA-Z0-9 _.@\-]+$").unwrap();
    // Digit or non-word character, with word characters fixed to ASCII.
    static ref DIGIT_OR_SYMBOL_REGEX: regex::Regex = regex::Regex::new(r"[^A-Za-z_]").unwrap();
    static ref UPPERCASE_REGEX: regex::Regex = regex::Regex::new(r"[A-Z]").unwrap();
    static ref LOWERCASE_REGEX: regex::Regex = regex::Regex::new(r"[a-z]").unwrap();
}

/// Returns true if `name` is non-empty and only uses `[A-Za-z0-9 _.@-]`.
pub fn has_valid_username_chars(name: &str) -> bool {
    USERNAME_CHARS_REGEX.is_match(name)
}

/// Returns true if `name` is shorter than [`MIN_USERNAME_LENGTH`].
pub fn is_username_too_short(name: &str) -> bool {
    name.chars().count() < MIN_USERNAME_LENGTH
}

/// Returns true for a non-blank, syntactically valid email address.
pub fn is_valid_email(address: &str) -> bool {
    !address.trim().is_empty() && address.validate_email()
}

/// Validates password strength.
///
/// A password must be at least six characters long, contain a digit or a
/// non-word character, and mix upper and lower case letters. Word characters
/// are ASCII only, so accented letters count as symbols.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        let mut err = ValidationError::new("password_length");
        err.message = Some("Password must be at least 6 characters long".into());
        return Err(err);
    }

    if !DIGIT_OR_SYMBOL_REGEX.is_match(password) {
        let mut err = ValidationError::new("password_digit_or_symbol");
        err.message = Some("Password must contain a digit or a special character".into());
        return Err(err);
    }

    if !UPPERCASE_REGEX.is_match(password) || !LOWERCASE_REGEX.is_match(password) {
        let mut err = ValidationError::new("password_case");
        err.message = Some("Password must contain upper and lower case letters".into());
        return Err(err);
    }

    Ok(())
}
