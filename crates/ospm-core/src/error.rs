//! Error types module
//!
//! Every failure that leaves the lifecycle engine is an [`AppError`]. Store
//! errors are converted at the service boundary, so callers only ever see the
//! five domain kinds (validation, not found, conflict, transaction, policy
//! denied) plus `InvalidInput` for malformed HTTP requests.

use serde::Serialize;
use utoipa::ToSchema;

use crate::policy::OperationKind;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for denied or conflicting requests
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "TRANSACTION_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// One failed creation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn first_violation(violations: &[FieldViolation]) -> &str {
    violations
        .first()
        .map(|v| v.message.as_str())
        .unwrap_or("no violations recorded")
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Carries every violated rule in evaluation order; the first one is surfaced.
    #[error("Validation failed: {}", first_violation(.violations))]
    Validation { violations: Vec<FieldViolation> },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Transaction failed: {message}")]
    Transaction {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Client {client_ip} is not allowed to perform {operation}")]
    PolicyDenied {
        operation: OperationKind,
        client_ip: String,
    },
}

impl AppError {
    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        AppError::Validation { violations }
    }

    pub fn transaction(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        AppError::Transaction {
            message: message.into(),
            source: source.into(),
        }
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut violations: Vec<FieldViolation> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                let field = field.to_string();
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid ({})", field, e.code));
                    FieldViolation::new(field.clone(), message)
                })
            })
            .collect();
        violations.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation { violations }
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Validation { .. } => (
            400,
            "VALIDATION_FAILED",
            false,
            Some("Fix the listed fields and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID or name exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Conflict(_) => (
            409,
            "CONFLICT",
            false,
            Some("Choose a different unique value"),
            false,
            LogLevel::Warn,
        ),
        AppError::Transaction { .. } => (
            500,
            "TRANSACTION_FAILED",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::PolicyDenied { .. } => (
            403,
            "POLICY_DENIED",
            false,
            Some("Ask an operator to whitelist the client address"),
            false,
            LogLevel::Warn,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Validation { .. } => "Validation",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::Conflict(_) => "Conflict",
            AppError::Transaction { .. } => "Transaction",
            AppError::PolicyDenied { .. } => "PolicyDenied",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        if let AppError::Validation { violations } = self {
            for violation in violations.iter().skip(1) {
                details.push_str(&format!("\n  Also: {}", violation.message));
            }
        }

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation { violations } => first_violation(violations).to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Conflict(ref msg) => msg.clone(),
            AppError::Transaction { .. } => "Failed to complete the operation".to_string(),
            AppError::PolicyDenied { operation, .. } => {
                format!("Client is not allowed to perform {}", operation)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_transaction() {
        let err = AppError::transaction(
            "soft delete of organization acme",
            anyhow::anyhow!("connection reset"),
        );
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "TRANSACTION_FAILED");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Failed to complete the operation");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
        assert!(err.detailed_message().contains("Caused by: connection reset"));
    }

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("organization acme".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "organization acme");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_validation_surfaces_first_violation() {
        let err = AppError::validation(vec![
            FieldViolation::new("balance", "balance must be 0"),
            FieldViolation::new("details.name", "name can not be empty"),
        ]);
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.client_message(), "balance must be 0");
        assert_eq!(err.to_string(), "Validation failed: balance must be 0");
        assert!(err.detailed_message().contains("Also: name can not be empty"));
    }

    #[test]
    fn test_error_metadata_policy_denied() {
        let err = AppError::PolicyDenied {
            operation: OperationKind::HardDelete,
            client_ip: "10.1.2.3".to_string(),
        };
        assert_eq!(err.http_status_code(), 403);
        assert_eq!(err.error_code(), "POLICY_DENIED");
        assert_eq!(err.log_level(), LogLevel::Warn);
        assert!(!err.client_message().contains("10.1.2.3"));
        assert!(err.to_string().contains("10.1.2.3"));
    }

    #[test]
    fn test_error_metadata_conflict() {
        let err = AppError::Conflict("subscriber group name already taken".to_string());
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.suggested_action(), Some("Choose a different unique value"));
    }
}
