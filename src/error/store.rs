use simplified_schema::SchemaError;
use thiserror::Error as ThisError;

/// Every fallible core operation returns `Result<_, StoreError>`.
///
/// Validation variants are produced before any SQL is sent. Backend failures are
/// wrapped at the statement boundary and never retried.
#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Table does not exist: {0}")]
    TableNotFound(String),

    #[error("No row found in {0}")]
    RowNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Hook {hook} failed: {message}")]
    Hook { hook: &'static str, message: String },
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    /// Message surfaced to the calling business layer.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// True when the failure was detected before any statement was issued.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_) | StoreError::Schema(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::TableNotFound(_) | StoreError::RowNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_the_bare_text() {
        let err = StoreError::validation("age is required");
        assert_eq!(err.message(), "age is required");
        assert!(err.is_validation());
    }

    #[test]
    fn schema_errors_count_as_validation() {
        let err: StoreError = SchemaError::MalformedCondition("bad".into()).into();
        assert!(err.is_validation());
        assert_eq!(err.message(), "Malformed condition: bad");
    }

    #[test]
    fn backend_errors_are_not_validation() {
        let err: StoreError = sqlx::Error::Protocol("gone".into()).into();
        assert!(!err.is_validation());
        assert!(!err.is_not_found());
    }
}
