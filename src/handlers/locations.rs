use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::inventory_location::LocationType;
use crate::errors::ServiceError;
use crate::handlers::tenant_from_headers;
use crate::services::locations::NewLocation;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLocationRequest {
    pub name: String,
    pub location_type: LocationType,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LocationListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_location).get(list_locations))
        .route("/:id", get(get_location).delete(delete_location))
        .route("/:id/set-default", post(set_default))
        .route("/:id/deactivate", post(deactivate))
}

async fn create_location(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateLocationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    let location = state
        .locations
        .create(
            &tenant,
            NewLocation {
                name: req.name,
                location_type: req.location_type,
                is_default: req.is_default,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(location)))
}

async fn list_locations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LocationListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    Ok(Json(
        state.locations.list(&tenant, query.include_inactive).await?,
    ))
}

async fn get_location(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    Ok(Json(state.locations.get(&tenant, id).await?))
}

async fn set_default(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    Ok(Json(state.locations.set_default(&tenant, id).await?))
}

async fn deactivate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    Ok(Json(state.locations.deactivate(&tenant, id).await?))
}

async fn delete_location(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    state.locations.delete(&tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
