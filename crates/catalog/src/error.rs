//! Validation error types.

use thiserror::Error;

/// The first rule a payload violated.
///
/// Validation stops at the first failing rule; the message is meant to be
/// shown to the person filling in the service form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The payload was not a JSON object.
    #[error("{payload} details must be provided as an object")]
    NotAnObject { payload: &'static str },

    /// A single field failed a schema rule.
    #[error("{message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    /// Provisioning needs a category even though the schema allows none.
    #[error("A category is required to create a service")]
    CategoryRequired,
}

impl ValidationError {
    pub(crate) fn field(field: &'static str, message: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// Returns the offending field name, if the error is tied to one.
    pub fn field_name(&self) -> Option<&'static str> {
        match self {
            ValidationError::InvalidField { field, .. } => Some(field),
            ValidationError::CategoryRequired => Some("category_id"),
            ValidationError::NotAnObject { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_field_displays_bare_message() {
        let err = ValidationError::field("name", "Service name is required");
        assert_eq!(err.to_string(), "Service name is required");
        assert_eq!(err.field_name(), Some("name"));
    }

    #[test]
    fn category_required_points_at_category() {
        assert_eq!(
            ValidationError::CategoryRequired.field_name(),
            Some("category_id")
        );
    }
}
