//! Thin HTTP surface over the inventory core: extract, call the service,
//! let `ServiceError`'s `IntoResponse` shape the failure.

pub mod adjustments;
pub mod inventory;
pub mod locations;

use axum::http::HeaderMap;
use axum::Router;

use crate::errors::ServiceError;
use crate::tenant::TenantId;
use crate::AppState;

pub(crate) const TENANT_HEADER: &str = "x-tenant-id";

/// Every request must carry its tenant explicitly; nothing is inferred.
pub(crate) fn tenant_from_headers(headers: &HeaderMap) -> Result<TenantId, ServiceError> {
    headers
        .get(TENANT_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map(TenantId::from)
        .ok_or_else(|| {
            ServiceError::ValidationError(format!("missing {} header", TENANT_HEADER))
        })
}

/// Assembles the versioned API router.
pub fn router(state: AppState) -> Router {
    let v1 = inventory::router()
        .nest("/adjustments", adjustments::router())
        .nest("/locations", locations::router());
    Router::new().nest("/api/v1", v1).with_state(state)
}
