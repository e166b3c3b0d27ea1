use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::stock_adjustment::{AdjustmentReason, AdjustmentStatus, AdjustmentType};
use crate::errors::ServiceError;
use crate::handlers::inventory::PagedResponse;
use crate::handlers::tenant_from_headers;
use crate::services::adjustments::{NewAdjustment, NewAdjustmentItem};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustmentItemRequest {
    pub product_id: Uuid,
    pub actual_quantity: i32,
    pub unit_cost: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAdjustmentRequest {
    pub location_id: Uuid,
    pub adjustment_type: AdjustmentType,
    pub reason: AdjustmentReason,
    pub notes: Option<String>,
    pub items: Vec<AdjustmentItemRequest>,
    pub created_by: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAdjustmentRequest {
    pub items: Option<Vec<AdjustmentItemRequest>>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveRequest {
    pub approved_by: Uuid,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AdjustmentListQuery {
    pub status: Option<String>,
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_adjustment).get(list_adjustments))
        .route(
            "/:id",
            get(get_adjustment)
                .put(update_adjustment)
                .delete(delete_adjustment),
        )
        .route("/:id/submit", post(submit_adjustment))
        .route("/:id/approve", post(approve_adjustment))
        .route("/:id/reject", post(reject_adjustment))
}

fn to_items(items: Vec<AdjustmentItemRequest>) -> Vec<NewAdjustmentItem> {
    items
        .into_iter()
        .map(|item| NewAdjustmentItem {
            product_id: item.product_id,
            actual_quantity: item.actual_quantity,
            unit_cost: item.unit_cost,
        })
        .collect()
}

async fn create_adjustment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateAdjustmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    let header = NewAdjustment {
        location_id: req.location_id,
        adjustment_type: req.adjustment_type,
        reason: req.reason,
        notes: req.notes,
    };
    let detail = state
        .adjustments
        .create(&tenant, header, to_items(req.items), req.created_by)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn list_adjustments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdjustmentListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    let status = query
        .status
        .as_deref()
        .map(|raw| {
            raw.parse::<AdjustmentStatus>().map_err(|_| {
                ServiceError::ValidationError(format!("unknown adjustment status '{}'", raw))
            })
        })
        .transpose()?;
    let (items, total) = state
        .adjustments
        .list(&tenant, status, query.page, query.limit)
        .await?;
    Ok(Json(PagedResponse {
        items,
        total,
        page: query.page,
        limit: query.limit,
    }))
}

async fn get_adjustment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    Ok(Json(state.adjustments.get(&tenant, id).await?))
}

async fn update_adjustment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAdjustmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    let detail = state
        .adjustments
        .update_draft(&tenant, id, req.items.map(to_items), req.notes)
        .await?;
    Ok(Json(detail))
}

async fn delete_adjustment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    state.adjustments.delete_draft(&tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn submit_adjustment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    Ok(Json(state.adjustments.submit_for_approval(&tenant, id).await?))
}

async fn approve_adjustment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<ApproveRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    let (adjustment, movements) = state
        .adjustments
        .approve(&tenant, id, req.approved_by)
        .await?;
    Ok(Json(serde_json::json!({
        "adjustment": adjustment,
        "movements": movements,
    })))
}

async fn reject_adjustment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    Ok(Json(state.adjustments.reject(&tenant, id).await?))
}
