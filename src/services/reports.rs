//! Reporting/Analytics Aggregator.
//!
//! Read-only rollups over positions and the movement log. The only thing
//! this module ever writes is the advisory transfer-recommendation rows,
//! which are not authoritative: approving one does not move stock.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    product::{self, Entity as Product},
    stock_position::{self, Entity as StockPosition},
    transfer_recommendation::{
        self, Entity as TransferRecommendation, RecommendationPriority, RecommendationStatus,
    },
};
use crate::errors::ServiceError;
use crate::tenant::TenantId;

/// How long a generated recommendation stays actionable.
const RECOMMENDATION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockRow {
    pub product_id: Uuid,
    pub sku: String,
    pub location_id: Uuid,
    pub quantity_available: i32,
    pub effective_reorder_level: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationValuation {
    pub location_id: Uuid,
    pub total_value: Decimal,
    pub position_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductValuation {
    pub product_id: Uuid,
    pub sku: String,
    pub quantity_on_hand: i64,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationReport {
    pub total_value: Decimal,
    pub by_location: Vec<LocationValuation>,
    pub by_product: Vec<ProductValuation>,
}

#[derive(Clone)]
pub struct InventoryReportService {
    db: Arc<DbPool>,
}

impl InventoryReportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Positions at or below their effective reorder level. The effective
    /// level is the position's override when set, else the product default.
    #[instrument(skip(self))]
    pub async fn low_stock(&self, tenant: &TenantId) -> Result<Vec<LowStockRow>, ServiceError> {
        let products = self.tracked_products(tenant).await?;
        let positions = self.positions(tenant).await?;

        let mut rows = Vec::new();
        for position in positions {
            let Some(product) = products.get(&position.product_id) else {
                continue;
            };
            let effective = position.reorder_level.unwrap_or(product.reorder_level);
            if position.quantity_available <= effective {
                rows.push(LowStockRow {
                    product_id: position.product_id,
                    sku: product.sku.clone(),
                    location_id: position.location_id,
                    quantity_available: position.quantity_available,
                    effective_reorder_level: effective,
                });
            }
        }
        rows.sort_by_key(|r| r.quantity_available);
        Ok(rows)
    }

    /// Positions with no available stock at all.
    #[instrument(skip(self))]
    pub async fn out_of_stock(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<stock_position::Model>, ServiceError> {
        StockPosition::find()
            .filter(stock_position::Column::Domain.eq(tenant.as_str()))
            .filter(stock_position::Column::QuantityAvailable.lte(0))
            .order_by_asc(stock_position::Column::ProductId)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Stock valuation rolled up by location and by product, highest value
    /// first.
    #[instrument(skip(self))]
    pub async fn valuation(&self, tenant: &TenantId) -> Result<ValuationReport, ServiceError> {
        let products = self.tracked_products(tenant).await?;
        let positions = self.positions(tenant).await?;

        let mut total_value = Decimal::ZERO;
        let mut by_location: HashMap<Uuid, LocationValuation> = HashMap::new();
        let mut by_product: HashMap<Uuid, ProductValuation> = HashMap::new();

        for position in &positions {
            total_value += position.total_value;

            let loc = by_location
                .entry(position.location_id)
                .or_insert_with(|| LocationValuation {
                    location_id: position.location_id,
                    total_value: Decimal::ZERO,
                    position_count: 0,
                });
            loc.total_value += position.total_value;
            loc.position_count += 1;

            let sku = products
                .get(&position.product_id)
                .map(|p| p.sku.clone())
                .unwrap_or_default();
            let prod = by_product
                .entry(position.product_id)
                .or_insert_with(|| ProductValuation {
                    product_id: position.product_id,
                    sku,
                    quantity_on_hand: 0,
                    total_value: Decimal::ZERO,
                });
            prod.quantity_on_hand += position.quantity_on_hand as i64;
            prod.total_value += position.total_value;
        }

        let mut by_location: Vec<_> = by_location.into_values().collect();
        by_location.sort_by(|a, b| b.total_value.cmp(&a.total_value));
        let mut by_product: Vec<_> = by_product.into_values().collect();
        by_product.sort_by(|a, b| b.total_value.cmp(&a.total_value));

        Ok(ValuationReport {
            total_value,
            by_location,
            by_product,
        })
    }

    /// Pairs under-reorder locations with surplus locations (stock above
    /// twice their reorder level) for the same product and persists advisory
    /// rows: up to half the source surplus, capped at the destination's
    /// headroom to max stock. A source's surplus is drawn down as it is
    /// allocated, and existing pending rows for a pair are not duplicated.
    #[instrument(skip(self))]
    pub async fn generate_transfer_recommendations(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<transfer_recommendation::Model>, ServiceError> {
        let products = self.tracked_products(tenant).await?;
        let positions = self.positions(tenant).await?;

        let pending: Vec<transfer_recommendation::Model> = TransferRecommendation::find()
            .filter(transfer_recommendation::Column::Domain.eq(tenant.as_str()))
            .filter(
                transfer_recommendation::Column::Status
                    .eq(RecommendationStatus::Pending.as_ref()),
            )
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        let mut by_product: HashMap<Uuid, Vec<&stock_position::Model>> = HashMap::new();
        for position in &positions {
            by_product.entry(position.product_id).or_default().push(position);
        }

        let now = Utc::now();
        let mut created = Vec::new();

        for (product_id, group) in by_product {
            let Some(product) = products.get(&product_id) else {
                continue;
            };

            let effective_reorder =
                |p: &stock_position::Model| p.reorder_level.unwrap_or(product.reorder_level);

            let mut destinations: Vec<_> = group
                .iter()
                .filter(|p| p.quantity_available <= effective_reorder(p))
                .collect();
            destinations.sort_by_key(|p| p.quantity_available);

            // Each source carries its uncommitted availability so one pass
            // never recommends the same surplus units to two destinations.
            let mut sources: Vec<(&stock_position::Model, i32)> = group
                .iter()
                .filter(|p| p.quantity_available > 2 * effective_reorder(p))
                .map(|p| (*p, p.quantity_available))
                .collect();
            sources.sort_by_key(|(_, available)| std::cmp::Reverse(*available));

            for dest in destinations {
                let Some(slot) = sources.iter_mut().find(|(s, remaining)| {
                    s.location_id != dest.location_id && *remaining > 2 * effective_reorder(s)
                }) else {
                    continue;
                };
                let source = slot.0;

                let surplus = slot.1 - effective_reorder(source);
                let mut quantity = surplus / 2;
                let max_stock = dest.max_stock_level.or(product.max_stock_level);
                if let Some(max_stock) = max_stock {
                    quantity = quantity.min(max_stock - dest.quantity_on_hand);
                }
                if quantity <= 0 {
                    continue;
                }

                let duplicate = pending.iter().any(|r| {
                    r.product_id == product_id
                        && r.from_location_id == source.location_id
                        && r.to_location_id == dest.location_id
                });
                if duplicate {
                    continue;
                }
                slot.1 -= quantity;

                let reorder = effective_reorder(dest);
                let priority = if dest.quantity_available <= 0 {
                    RecommendationPriority::Urgent
                } else if dest.quantity_available <= reorder / 2 {
                    RecommendationPriority::High
                } else {
                    RecommendationPriority::Medium
                };

                let model = transfer_recommendation::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    domain: Set(tenant.as_str().to_string()),
                    product_id: Set(product_id),
                    from_location_id: Set(source.location_id),
                    to_location_id: Set(dest.location_id),
                    priority: Set(priority.as_ref().to_string()),
                    reason: Set(format!(
                        "{} available at destination (reorder level {}), {} surplus at source",
                        dest.quantity_available, reorder, surplus
                    )),
                    recommended_quantity: Set(quantity),
                    status: Set(RecommendationStatus::Pending.as_ref().to_string()),
                    expires_at: Set(Some(now + Duration::days(RECOMMENDATION_TTL_DAYS))),
                    processed_movement_id: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                created.push(
                    model
                        .insert(self.db.as_ref())
                        .await
                        .map_err(ServiceError::db_error)?,
                );
            }
        }

        info!(tenant = %tenant, count = created.len(), "Transfer recommendations generated");
        Ok(created)
    }

    /// pending → approved. Advisory only; the stock does not move until a
    /// real transfer is executed and `mark_processed` links it.
    #[instrument(skip(self))]
    pub async fn approve_recommendation(
        &self,
        tenant: &TenantId,
        recommendation_id: Uuid,
    ) -> Result<transfer_recommendation::Model, ServiceError> {
        self.transition(
            tenant,
            recommendation_id,
            RecommendationStatus::Pending,
            RecommendationStatus::Approved,
            None,
        )
        .await
    }

    /// pending → dismissed.
    #[instrument(skip(self))]
    pub async fn dismiss_recommendation(
        &self,
        tenant: &TenantId,
        recommendation_id: Uuid,
    ) -> Result<transfer_recommendation::Model, ServiceError> {
        self.transition(
            tenant,
            recommendation_id,
            RecommendationStatus::Pending,
            RecommendationStatus::Dismissed,
            None,
        )
        .await
    }

    /// approved → processed, linking the outbound movement of the transfer
    /// that actually satisfied the recommendation.
    #[instrument(skip(self))]
    pub async fn mark_processed(
        &self,
        tenant: &TenantId,
        recommendation_id: Uuid,
        movement_id: Uuid,
    ) -> Result<transfer_recommendation::Model, ServiceError> {
        self.transition(
            tenant,
            recommendation_id,
            RecommendationStatus::Approved,
            RecommendationStatus::Processed,
            Some(movement_id),
        )
        .await
    }

    async fn transition(
        &self,
        tenant: &TenantId,
        recommendation_id: Uuid,
        expected: RecommendationStatus,
        next: RecommendationStatus,
        movement_id: Option<Uuid>,
    ) -> Result<transfer_recommendation::Model, ServiceError> {
        let recommendation = TransferRecommendation::find()
            .filter(transfer_recommendation::Column::Domain.eq(tenant.as_str()))
            .filter(transfer_recommendation::Column::Id.eq(recommendation_id))
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("recommendation {}", recommendation_id))
            })?;

        if recommendation.status() != Some(expected) {
            return Err(ServiceError::InvalidState(format!(
                "cannot move recommendation {} from status {} to {}",
                recommendation_id, recommendation.status, next
            )));
        }

        let mut active: transfer_recommendation::ActiveModel = recommendation.into();
        active.status = Set(next.as_ref().to_string());
        if let Some(movement_id) = movement_id {
            active.processed_movement_id = Set(Some(movement_id));
        }
        active.updated_at = Set(Utc::now());
        active
            .update(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    async fn tracked_products(
        &self,
        tenant: &TenantId,
    ) -> Result<HashMap<Uuid, product::Model>, ServiceError> {
        Ok(Product::find()
            .filter(product::Column::Domain.eq(tenant.as_str()))
            .filter(product::Column::TrackInventory.eq(true))
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect())
    }

    async fn positions(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<stock_position::Model>, ServiceError> {
        StockPosition::find()
            .filter(stock_position::Column::Domain.eq(tenant.as_str()))
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}
