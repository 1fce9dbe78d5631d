//! Field validators for invite and join requests.
//!
//! Username rules run in a fixed order and each failing rule overwrites the
//! message of the previous one, so callers see only the last failure.

use shared::validation::{
    has_valid_username_chars, is_username_too_short, is_valid_email, validate_password_strength,
};

use super::ports::{GroupDirectory, StoreError, Translator, UserDirectory};
use crate::models::ValidationResult;

pub const USERNAME_EMPTY: &str = "Please provide a username";
pub const USERNAME_ILLEGAL_CHARS: &str =
    "Username contains illegal characters, only a-z, A-Z, 0-9, spaces and _.@- are allowed";
pub const USERNAME_TOO_SHORT: &str = "Username must be at least 3 characters long";
pub const USERNAME_EXISTS: &str = "Username already exists";
pub const EMAIL_INVALID: &str = "Invalid email address";
pub const PASSWORD_TOO_WEAK: &str =
    "Password must be at least 6 characters and mix upper case, lower case and a digit or symbol";

/// Checks a proposed username against syntax rules and the user store.
pub async fn validate_username(
    name: &str,
    users: &dyn UserDirectory,
    translator: &dyn Translator,
) -> Result<ValidationResult, StoreError> {
    let mut result = ValidationResult::ok();

    if name.trim().is_empty() {
        result.fail(translator.t(USERNAME_EMPTY, &[]));
    }
    if !has_valid_username_chars(name) {
        result.fail(translator.t(USERNAME_ILLEGAL_CHARS, &[]));
    }
    if is_username_too_short(name) {
        result.fail(translator.t(USERNAME_TOO_SHORT, &[]));
    }
    if users.exists(name).await? {
        result.fail(translator.t(USERNAME_EXISTS, &[]));
    }

    Ok(result)
}

pub fn validate_email(address: &str, translator: &dyn Translator) -> ValidationResult {
    if is_valid_email(address) {
        ValidationResult::ok()
    } else {
        ValidationResult::invalid(translator.t(EMAIL_INVALID, &[]))
    }
}

/// Admins may invite without groups; everyone else must name existing groups.
pub async fn validate_groups(
    groups: &[String],
    is_admin: bool,
    directory: &dyn GroupDirectory,
) -> Result<bool, StoreError> {
    if groups.is_empty() {
        return Ok(is_admin);
    }

    for group in groups {
        if !directory.exists(group).await? {
            return Ok(false);
        }
    }

    Ok(true)
}

pub fn validate_password(password: &str, translator: &dyn Translator) -> ValidationResult {
    match validate_password_strength(password) {
        Ok(()) => ValidationResult::ok(),
        Err(_) => ValidationResult::invalid(translator.t(PASSWORD_TOO_WEAK, &[])),
    }
}
