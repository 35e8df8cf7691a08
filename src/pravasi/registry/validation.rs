use url::Url;

use crate::pravasi::registry::error::{RegistryError, Result};

/// Working-age bounds for a registered worker, inclusive.
pub const WORKER_AGE_RANGE: std::ops::RangeInclusive<u8> = 18..=75;
/// Upper bound accepted for a family member's age.
pub const MAX_FAMILY_MEMBER_AGE: u8 = 120;
/// Number of digits in an Aadhaar number.
pub const AADHAAR_LEN: usize = 12;

/// Boundary validation implemented by every command and configuration type.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RegistryError::validation(field, "must not be empty"));
    }
    Ok(())
}

pub fn validate_worker_age(age: u8) -> Result<()> {
    if !WORKER_AGE_RANGE.contains(&age) {
        return Err(RegistryError::validation(
            "age",
            format!(
                "{age} is outside the working-age range {}-{}",
                WORKER_AGE_RANGE.start(),
                WORKER_AGE_RANGE.end()
            ),
        ));
    }
    Ok(())
}

pub fn validate_aadhaar(value: &str) -> Result<()> {
    if value.len() != AADHAAR_LEN || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RegistryError::validation(
            "aadhaarNumber",
            format!("expected {AADHAAR_LEN} digits, got '{value}'"),
        ));
    }
    Ok(())
}

/// Accepts absolute `http` or `https` URLs only.
pub fn validate_url(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RegistryError::validation(field, "URL cannot be empty"));
    }

    match Url::parse(value) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(RegistryError::validation(
                field,
                format!("unsupported URL scheme: {scheme}"),
            )),
        },
        Err(e) => Err(RegistryError::validation(
            field,
            format!("invalid URL format: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aadhaar_requires_twelve_digits() {
        assert!(validate_aadhaar("111122223333").is_ok());
        assert!(validate_aadhaar("11112222333").is_err());
        assert!(validate_aadhaar("1111-2222-333").is_err());
        assert!(validate_aadhaar("11112222333a").is_err());
    }

    #[test]
    fn worker_age_bounds_are_inclusive() {
        assert!(validate_worker_age(18).is_ok());
        assert!(validate_worker_age(75).is_ok());
        assert!(validate_worker_age(17).is_err());
        assert!(validate_worker_age(76).is_err());
    }

    #[test]
    fn url_must_be_http() {
        assert!(validate_url("endpoint", "https://script.google.com/macros/s/x/exec").is_ok());
        assert!(validate_url("endpoint", "ftp://example.com").is_err());
        assert!(validate_url("endpoint", "not a url").is_err());
        assert!(validate_url("endpoint", "  ").is_err());
    }
}
