//! Input validation shared by registration, profile edits and password resets

use crate::error::GreenLeafError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MAX_NAME_LEN: usize = 100;

pub fn validate_name(name: &str) -> Result<(), GreenLeafError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GreenLeafError::validation("Name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(GreenLeafError::validation(format!(
            "Name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

/// Structural check only: one `@`, non-empty local part, dotted domain
pub fn validate_email(email: &str) -> Result<(), GreenLeafError> {
    let email = email.trim();
    let invalid = || GreenLeafError::validation("A valid email address is required");

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), GreenLeafError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(GreenLeafError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(GreenLeafError::validation(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}
