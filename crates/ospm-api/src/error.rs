//! HTTP rendering of `AppError`
//!
//! Handlers return `Result<_, HttpAppError>` and use `?` on service calls.
//! Body and query parsing failures go through the same path, so every
//! non-2xx response has the [`ErrorResponse`] shape.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use ospm_core::{AppError, ErrorMetadata, LogLevel};
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// `AppError` lives in ospm-core, so the axum response impl goes on this wrapper
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        let body_text = rejection.body_text();
        let message = if body_text.contains("expected a formatted UUID") {
            "Invalid request body: identifiers must be UUID strings".to_string()
        } else {
            format!("failed to parse the provided information: {}", body_text)
        };
        HttpAppError(AppError::InvalidInput(message))
    }
}

impl From<QueryRejection> for HttpAppError {
    fn from(rejection: QueryRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid query string: {}",
            rejection.body_text()
        )))
    }
}

/// `Json<T>` whose rejection is an `InvalidInput` error
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

/// `Query<T>` whose rejection is an `InvalidInput` error
#[derive(Debug, Clone, Copy)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(inner) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedQuery(inner))
    }
}

/// Log a failed request at the level its error kind asks for.
/// Policy denials are logged with the refused client address.
fn log_error(error: &AppError) {
    let error_type = error.error_type();
    if let AppError::PolicyDenied {
        operation,
        client_ip,
    } = error
    {
        tracing::warn!(%operation, client_ip = %client_ip, "Request refused by IP policy");
        return;
    }

    match error.log_level() {
        LogLevel::Debug => tracing::debug!(error = %error, error_type, "Request failed"),
        LogLevel::Warn => tracing::warn!(error = %error, error_type, "Request failed"),
        LogLevel::Error => tracing::error!(error = %error, error_type, "Request failed"),
    }
}

fn is_production_env() -> bool {
    let environment = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_default()
        .to_lowercase();
    matches!(environment.as_str(), "production" | "prod")
}

impl ErrorResponse {
    /// Render `error` for a client. Internal detail is only attached when
    /// `expose_details` is set and the error is not sensitive.
    fn from_app_error(error: &AppError, expose_details: bool) -> Self {
        let expose = expose_details && !error.is_sensitive();
        Self {
            error: error.client_message(),
            details: expose.then(|| error.detailed_message()),
            error_type: expose.then(|| error.error_type().to_string()),
            code: error.error_code().to_string(),
            recoverable: error.is_recoverable(),
            suggested_action: error.suggested_action().map(String::from),
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let error = self.0;
        log_error(&error);

        let status = StatusCode::from_u16(error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse::from_app_error(&error, !is_production_env());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ospm_core::{FieldViolation, OperationKind};

    #[test]
    fn test_status_codes_follow_error_kind() {
        let cases = [
            (
                AppError::validation(vec![FieldViolation::new("details.name", "empty")]),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::InvalidInput("bad mode".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::PolicyDenied {
                    operation: OperationKind::HardDelete,
                    client_ip: "10.0.0.1".to_string(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                AppError::NotFound("organization not found".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::Conflict("name taken".to_string()),
                StatusCode::CONFLICT,
            ),
        ];

        for (error, expected) in cases {
            let response = HttpAppError(error).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_transaction_error_is_500() {
        let error = AppError::transaction(
            "soft delete organization",
            anyhow::anyhow!("connection reset"),
        );
        let response = HttpAppError(error).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_response_hides_details_when_asked() {
        let error = AppError::NotFound("organization not found: acme".to_string());

        let hidden = serde_json::to_value(ErrorResponse::from_app_error(&error, false))
            .expect("serialize");
        assert_eq!(hidden["error"], "organization not found: acme");
        assert_eq!(hidden["code"], "NOT_FOUND");
        assert_eq!(hidden["recoverable"], false);
        assert!(hidden.get("details").is_none());
        assert!(hidden.get("error_type").is_none());

        let shown = serde_json::to_value(ErrorResponse::from_app_error(&error, true))
            .expect("serialize");
        assert_eq!(shown["error_type"], "NotFound");
        assert!(shown["details"].is_string());
    }

    #[test]
    fn test_sensitive_error_never_exposes_details() {
        let error = AppError::transaction("recover organization", anyhow::anyhow!("db password"));
        let body = ErrorResponse::from_app_error(&error, true);
        assert!(body.details.is_none());
        assert_eq!(body.error, "Failed to complete the operation");
    }
}
