use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::inventory_movement::{MovementReference, MovementType};
use crate::errors::ServiceError;
use crate::handlers::tenant_from_headers;
use crate::services::movements::{MovementHistoryFilter, RecordMovementInput};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordMovementRequest {
    pub product_id: Uuid,
    pub location_id: Uuid,
    /// One of: sale, purchase, adjustment, transfer_in, transfer_out,
    /// return, damage, theft, expired, promotion
    pub movement_type: String,
    pub quantity_change: i32,
    pub unit_cost: Option<Decimal>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub user_id: Uuid,
    pub notes: Option<String>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MovementHistoryQuery {
    pub product_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub movement_type: Option<String>,
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReservationRequest {
    pub product_id: Uuid,
    pub location_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferRequest {
    pub product_id: Uuid,
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    pub quantity: i32,
    pub user_id: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProcessRecommendationRequest {
    pub movement_id: Uuid,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/movements", post(record_movement).get(list_movements))
        .route("/positions/:product_id/:location_id", get(get_position))
        .route("/positions/reserve", post(reserve))
        .route("/positions/release", post(release_reserved))
        .route("/transfers", post(transfer))
        .route("/reports/low-stock", get(low_stock))
        .route("/reports/out-of-stock", get(out_of_stock))
        .route("/reports/valuation", get(valuation))
        .route("/recommendations/generate", post(generate_recommendations))
        .route("/recommendations/:id/approve", post(approve_recommendation))
        .route("/recommendations/:id/dismiss", post(dismiss_recommendation))
        .route("/recommendations/:id/process", post(process_recommendation))
}

fn parse_movement_type(raw: &str) -> Result<MovementType, ServiceError> {
    raw.parse()
        .map_err(|_| ServiceError::ValidationError(format!("unknown movement type '{}'", raw)))
}

async fn record_movement(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RecordMovementRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    let input = RecordMovementInput {
        product_id: req.product_id,
        location_id: req.location_id,
        movement_type: parse_movement_type(&req.movement_type)?,
        quantity_change: req.quantity_change,
        unit_cost: req.unit_cost,
        reference: MovementReference::from_columns(
            req.reference_type.as_deref(),
            req.reference_id,
        ),
        user_id: req.user_id,
        notes: req.notes,
        batch_number: req.batch_number,
        expiry_date: req.expiry_date,
    };
    let movement = state.movements.record_movement(&tenant, input).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

async fn list_movements(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MovementHistoryQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    let filter = MovementHistoryFilter {
        product_id: query.product_id,
        location_id: query.location_id,
        movement_type: query
            .movement_type
            .as_deref()
            .map(parse_movement_type)
            .transpose()?,
        ..Default::default()
    };
    let (items, total) = state
        .movements
        .list_movements(&tenant, &filter, query.page, query.limit)
        .await?;
    Ok(Json(PagedResponse {
        items,
        total,
        page: query.page,
        limit: query.limit,
    }))
}

async fn get_position(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((product_id, location_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    let position = state
        .positions
        .get(&tenant, product_id, location_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "no stock position for product {} at location {}",
                product_id, location_id
            ))
        })?;
    Ok(Json(position))
}

async fn reserve(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ReservationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    let position = state
        .positions
        .reserve(&tenant, req.product_id, req.location_id, req.quantity)
        .await?;
    Ok(Json(position))
}

async fn release_reserved(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ReservationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    let position = state
        .positions
        .release_reserved(&tenant, req.product_id, req.location_id, req.quantity)
        .await?;
    Ok(Json(position))
}

async fn transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<TransferRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    let result = state
        .transfers
        .transfer(
            &tenant,
            req.product_id,
            req.from_location_id,
            req.to_location_id,
            req.quantity,
            req.user_id,
            req.notes,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn low_stock(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    Ok(Json(state.reports.low_stock(&tenant).await?))
}

async fn out_of_stock(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    Ok(Json(state.reports.out_of_stock(&tenant).await?))
}

async fn valuation(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    Ok(Json(state.reports.valuation(&tenant).await?))
}

async fn generate_recommendations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    let created = state
        .reports
        .generate_transfer_recommendations(&tenant)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn approve_recommendation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    Ok(Json(state.reports.approve_recommendation(&tenant, id).await?))
}

async fn dismiss_recommendation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    Ok(Json(state.reports.dismiss_recommendation(&tenant, id).await?))
}

async fn process_recommendation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<ProcessRecommendationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = tenant_from_headers(&headers)?;
    Ok(Json(
        state
            .reports
            .mark_processed(&tenant, id, req.movement_id)
            .await?,
    ))
}
