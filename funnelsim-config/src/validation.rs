//! Custom validation functions shared across configuration sections.

use validator::ValidationError;

/// Experiment ids are lowercase snake-case identifiers.
pub fn validate_identifier(id: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^[a-z0-9_]+$").map_err(|_| ValidationError::new("invalid_regex"))?;
    if re.is_match(id) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_identifier"))
    }
}

/// Catalog entries must not be blank.
pub fn validate_catalog(entries: &[String]) -> Result<(), ValidationError> {
    if entries.iter().any(|e| e.trim().is_empty()) {
        return Err(ValidationError::new("blank_catalog_entry"));
    }
    Ok(())
}

/// Validate a tracing level name.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error"]
        .contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}
