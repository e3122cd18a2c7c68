//! Configuration validation

use crate::schema::RawConfig;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Missing required setting: {0}")]
    MissingField(&'static str),

    #[error("Invalid server URL '{0}': expected http:// or https://")]
    InvalidServerUrl(String),

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("Exempt item type at position {0} is empty")]
    EmptyExemptType(usize),

    #[error("Global config error: {0}")]
    GlobalError(String),
}

/// Validate a raw configuration
///
/// `quota.reset_time` is not checked here: a malformed value falls back to
/// midnight at load time instead of refusing to start.
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match config.server.url.as_deref().map(str::trim) {
        None | Some("") => errors.push(ValidationError::MissingField("server.url")),
        Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
            errors.push(ValidationError::InvalidServerUrl(url.to_string()));
        }
        Some(_) => {}
    }

    if config
        .server
        .api_key
        .as_deref()
        .is_none_or(|k| k.trim().is_empty())
    {
        errors.push(ValidationError::MissingField("server.api_key"));
    }

    if config.server.request_timeout_seconds == Some(0) {
        errors.push(ValidationError::ZeroDuration {
            field: "server.request_timeout_seconds",
        });
    }

    if config.service.check_interval_seconds == Some(0) {
        errors.push(ValidationError::ZeroDuration {
            field: "service.check_interval_seconds",
        });
    }

    if let Some(types) = &config.quota.exempt_item_types {
        for (i, item_type) in types.iter().enumerate() {
            if item_type.trim().is_empty() {
                errors.push(ValidationError::EmptyExemptType(i));
            }
        }
    }

    if let Some(item) = &config.enforcement.replacement_item_id
        && item.trim().is_empty()
    {
        errors.push(ValidationError::GlobalError(
            "enforcement.replacement_item_id cannot be empty; omit it instead".into(),
        ));
    }

    errors
}
