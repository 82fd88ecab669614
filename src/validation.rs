//! Input validation utilities.

use crate::types::{Error, Result};

/// Validate that a string is not empty.
pub fn validate_non_empty(s: &str, field: &str) -> Result<()> {
    if s.is_empty() {
        return Err(Error::validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Validate a tool name: non-empty and free of the bucket key separator.
pub fn validate_tool_name(s: &str, field: &str) -> Result<()> {
    validate_non_empty(s, field)?;
    if s.contains(crate::types::KEY_SEPARATOR) {
        return Err(Error::validation(format!(
            "{} cannot contain '{}': {}",
            field,
            crate::types::KEY_SEPARATOR,
            s
        )));
    }
    Ok(())
}

/// Validate that a bucket capacity is positive.
pub fn validate_capacity(n: u32) -> Result<()> {
    if n == 0 {
        return Err(Error::config("capacity must be positive"));
    }
    Ok(())
}

/// Validate that a refill rate is a finite, non-negative number.
pub fn validate_refill_rate(rate: f64) -> Result<()> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(Error::config(format!(
            "refill_rate must be a non-negative number, got {}",
            rate
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert!(validate_non_empty("x", "field").is_ok());
        let err = validate_non_empty("", "UserId").unwrap_err();
        assert_eq!(err.to_string(), "validation error: UserId cannot be empty");
    }

    #[test]
    fn test_capacity() {
        assert!(validate_capacity(1).is_ok());
        assert!(matches!(validate_capacity(0), Err(Error::Config(_))));
    }

    #[test]
    fn test_refill_rate() {
        assert!(validate_refill_rate(0.0).is_ok());
        assert!(validate_refill_rate(2.5).is_ok());
        assert!(validate_refill_rate(-0.1).is_err());
        assert!(validate_refill_rate(f64::NAN).is_err());
        assert!(validate_refill_rate(f64::INFINITY).is_err());
    }
}
