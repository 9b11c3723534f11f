//! Health check handler

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use ospm_db::{IsolationLevel, Store, StoreError, StoreTransaction};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

use crate::constants::API_VERSION;
use crate::state::AppState;

const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthCheckResponse {
    pub status: String,
    pub store: String,
    pub api_version: String,
}

/// Report whether the store can open a transaction
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthCheckResponse),
        (status = 503, description = "Store unavailable", body = HealthCheckResponse)
    ),
    tag = "health"
)]
pub async fn health_check<S: Store>(State(state): State<Arc<AppState<S>>>) -> impl IntoResponse {
    let probe = async {
        let tx = state.store.begin(IsolationLevel::Default).await?;
        tx.rollback().await?;
        Ok::<_, StoreError>(())
    };

    let store = match tokio::time::timeout(TIMEOUT, probe).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Store health check failed");
            format!("unhealthy: {}", e)
        }
        Err(_) => {
            tracing::error!("Store health check timed out");
            "timeout".to_string()
        }
    };

    let healthy = store == "healthy";
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthCheckResponse {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            store,
            api_version: API_VERSION.to_string(),
        }),
    )
}
