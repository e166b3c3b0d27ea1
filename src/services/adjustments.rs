//! Stock Adjustment Workflow.
//!
//! Manual corrections go through a state machine before they touch the
//! ledger: draft → pending_approval → {approved | rejected}. Only approval
//! materializes ledger entries, one per counted item; rejected and deleted
//! drafts never move stock.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::NegativeStockPolicy;
use crate::db::DbPool;
use crate::entities::{
    inventory_location::{self, Entity as InventoryLocation},
    inventory_movement::{self, MovementReference, MovementType},
    product::{self, Entity as Product},
    stock_adjustment::{self, AdjustmentReason, AdjustmentStatus, AdjustmentType,
        Entity as StockAdjustment},
    stock_adjustment_item::{self, Entity as StockAdjustmentItem},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::movements::{apply_movement, MovementService, RecordMovementInput};
use crate::services::positions::find_position;
use crate::tenant::TenantId;

/// Header fields for a new adjustment draft.
#[derive(Debug, Clone)]
pub struct NewAdjustment {
    pub location_id: Uuid,
    pub adjustment_type: AdjustmentType,
    pub reason: AdjustmentReason,
    pub notes: Option<String>,
}

/// One counted line. `unit_cost` falls back to the position's average cost,
/// then the product's cost.
#[derive(Debug, Clone)]
pub struct NewAdjustmentItem {
    pub product_id: Uuid,
    pub actual_quantity: i32,
    pub unit_cost: Option<Decimal>,
}

/// A loaded adjustment with its items.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AdjustmentDetail {
    pub adjustment: stock_adjustment::Model,
    pub items: Vec<stock_adjustment_item::Model>,
}

#[derive(Clone)]
pub struct StockAdjustmentService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    movements: MovementService,
    policy: NegativeStockPolicy,
    allow_self_approval: bool,
}

impl StockAdjustmentService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        policy: NegativeStockPolicy,
        allow_self_approval: bool,
    ) -> Self {
        let movements = MovementService::new(db.clone(), event_sender.clone(), policy);
        Self {
            db,
            event_sender,
            movements,
            policy,
            allow_self_approval,
        }
    }

    /// Creates a draft, snapshotting each item's system quantity from the
    /// current position. Nothing reaches the ledger here.
    #[instrument(skip(self, header, items))]
    pub async fn create(
        &self,
        tenant: &TenantId,
        header: NewAdjustment,
        items: Vec<NewAdjustmentItem>,
        created_by: Uuid,
    ) -> Result<AdjustmentDetail, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::ValidationError(
                "adjustment requires at least one item".to_string(),
            ));
        }

        let tenant_key = tenant.clone();
        let detail = self
            .db
            .transaction::<_, AdjustmentDetail, ServiceError>(move |txn| {
                Box::pin(async move {
                    InventoryLocation::find()
                        .filter(inventory_location::Column::Domain.eq(tenant_key.as_str()))
                        .filter(inventory_location::Column::Id.eq(header.location_id))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("location {}", header.location_id))
                        })?;

                    let now = Utc::now();
                    let adjustment_id = Uuid::new_v4();
                    let mut item_models = Vec::with_capacity(items.len());
                    let mut total_value_change = Decimal::ZERO;

                    for item in &items {
                        let (system_quantity, unit_cost) = snapshot_item(
                            txn,
                            &tenant_key,
                            item,
                            header.location_id,
                        )
                        .await?;
                        let adjustment_quantity = item.actual_quantity - system_quantity;
                        let total_cost_change =
                            unit_cost * Decimal::from(adjustment_quantity);
                        total_value_change += total_cost_change;

                        let model = stock_adjustment_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            adjustment_id: Set(adjustment_id),
                            product_id: Set(item.product_id),
                            system_quantity: Set(system_quantity),
                            actual_quantity: Set(item.actual_quantity),
                            adjustment_quantity: Set(adjustment_quantity),
                            unit_cost: Set(unit_cost),
                            total_cost_change: Set(total_cost_change),
                        };
                        item_models
                            .push(model.insert(txn).await.map_err(ServiceError::db_error)?);
                    }

                    let adjustment = stock_adjustment::ActiveModel {
                        id: Set(adjustment_id),
                        domain: Set(tenant_key.as_str().to_string()),
                        adjustment_number: Set(generate_adjustment_number()),
                        location_id: Set(header.location_id),
                        adjustment_type: Set(header.adjustment_type.as_ref().to_string()),
                        reason: Set(header.reason.as_ref().to_string()),
                        status: Set(AdjustmentStatus::Draft.as_ref().to_string()),
                        total_value_change: Set(total_value_change),
                        notes: Set(header.notes.clone()),
                        created_by: Set(created_by),
                        approved_by: Set(None),
                        approved_at: Set(None),
                        created_at: Set(now),
                        updated_at: Set(now),
                    };
                    let adjustment = adjustment
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    Ok(AdjustmentDetail {
                        adjustment,
                        items: item_models,
                    })
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(
            tenant = %tenant,
            adjustment_id = %detail.adjustment.id,
            adjustment_number = %detail.adjustment.adjustment_number,
            items = detail.items.len(),
            "Adjustment draft created"
        );
        Ok(detail)
    }

    /// Replaces a draft's items (re-snapshotting system quantities) and/or
    /// notes. Any non-draft status fails with InvalidState.
    #[instrument(skip(self, items, notes))]
    pub async fn update_draft(
        &self,
        tenant: &TenantId,
        adjustment_id: Uuid,
        items: Option<Vec<NewAdjustmentItem>>,
        notes: Option<String>,
    ) -> Result<AdjustmentDetail, ServiceError> {
        if let Some(items) = &items {
            if items.is_empty() {
                return Err(ServiceError::ValidationError(
                    "adjustment requires at least one item".to_string(),
                ));
            }
        }

        let tenant_key = tenant.clone();
        self.db
            .transaction::<_, AdjustmentDetail, ServiceError>(move |txn| {
                Box::pin(async move {
                    let adjustment =
                        load_adjustment(txn, &tenant_key, adjustment_id).await?;
                    require_status(&adjustment, AdjustmentStatus::Draft, "update")?;

                    let mut total_value_change = adjustment.total_value_change;
                    let item_models = if let Some(items) = items {
                        StockAdjustmentItem::delete_many()
                            .filter(
                                stock_adjustment_item::Column::AdjustmentId.eq(adjustment_id),
                            )
                            .exec(txn)
                            .await
                            .map_err(ServiceError::db_error)?;

                        total_value_change = Decimal::ZERO;
                        let mut models = Vec::with_capacity(items.len());
                        for item in &items {
                            let (system_quantity, unit_cost) = snapshot_item(
                                txn,
                                &tenant_key,
                                item,
                                adjustment.location_id,
                            )
                            .await?;
                            let adjustment_quantity = item.actual_quantity - system_quantity;
                            let total_cost_change =
                                unit_cost * Decimal::from(adjustment_quantity);
                            total_value_change += total_cost_change;

                            let model = stock_adjustment_item::ActiveModel {
                                id: Set(Uuid::new_v4()),
                                adjustment_id: Set(adjustment_id),
                                product_id: Set(item.product_id),
                                system_quantity: Set(system_quantity),
                                actual_quantity: Set(item.actual_quantity),
                                adjustment_quantity: Set(adjustment_quantity),
                                unit_cost: Set(unit_cost),
                                total_cost_change: Set(total_cost_change),
                            };
                            models.push(
                                model.insert(txn).await.map_err(ServiceError::db_error)?,
                            );
                        }
                        models
                    } else {
                        adjustment
                            .find_related(StockAdjustmentItem)
                            .all(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                    };

                    let mut active: stock_adjustment::ActiveModel = adjustment.into();
                    if let Some(notes) = notes {
                        active.notes = Set(Some(notes));
                    }
                    active.total_value_change = Set(total_value_change);
                    active.updated_at = Set(Utc::now());
                    let adjustment =
                        active.update(txn).await.map_err(ServiceError::db_error)?;

                    Ok(AdjustmentDetail {
                        adjustment,
                        items: item_models,
                    })
                })
            })
            .await
            .map_err(ServiceError::from)
    }

    /// draft → pending_approval. No ledger effect.
    #[instrument(skip(self))]
    pub async fn submit_for_approval(
        &self,
        tenant: &TenantId,
        adjustment_id: Uuid,
    ) -> Result<stock_adjustment::Model, ServiceError> {
        let tenant_key = tenant.clone();
        let adjustment = self
            .db
            .transaction::<_, stock_adjustment::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let adjustment =
                        load_adjustment(txn, &tenant_key, adjustment_id).await?;
                    require_status(&adjustment, AdjustmentStatus::Draft, "submit")?;

                    let mut active: stock_adjustment::ActiveModel = adjustment.into();
                    active.status =
                        Set(AdjustmentStatus::PendingApproval.as_ref().to_string());
                    active.updated_at = Set(Utc::now());
                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        self.event_sender
            .emit(Event::AdjustmentSubmitted {
                adjustment_id: adjustment.id,
                adjustment_number: adjustment.adjustment_number.clone(),
            })
            .await;

        Ok(adjustment)
    }

    /// pending_approval → approved. The only point where a draft's numbers
    /// become real stock movements: one ledger entry per item whose
    /// adjustment_quantity is non-zero, all in one transaction.
    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        tenant: &TenantId,
        adjustment_id: Uuid,
        approved_by: Uuid,
    ) -> Result<(stock_adjustment::Model, Vec<inventory_movement::Model>), ServiceError> {
        let tenant_key = tenant.clone();
        let policy = self.policy;
        let allow_self_approval = self.allow_self_approval;
        let (adjustment, movements) = self
            .db
            .transaction::<_, (stock_adjustment::Model, Vec<inventory_movement::Model>), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let adjustment =
                            load_adjustment(txn, &tenant_key, adjustment_id).await?;
                        require_status(
                            &adjustment,
                            AdjustmentStatus::PendingApproval,
                            "approve",
                        )?;

                        if !allow_self_approval && adjustment.created_by == approved_by {
                            return Err(ServiceError::ValidationError(
                                "adjustment approver must differ from its creator"
                                    .to_string(),
                            ));
                        }

                        let items = adjustment
                            .find_related(StockAdjustmentItem)
                            .all(txn)
                            .await
                            .map_err(ServiceError::db_error)?;

                        let mut movements = Vec::new();
                        for item in &items {
                            // A counted quantity matching the snapshot is a
                            // no-op line; it stays on the adjustment for
                            // audit but produces no ledger entry.
                            if item.adjustment_quantity == 0 {
                                continue;
                            }
                            let input = RecordMovementInput {
                                unit_cost: Some(item.unit_cost),
                                reference: MovementReference::StockAdjustment(adjustment.id),
                                ..RecordMovementInput::new(
                                    item.product_id,
                                    adjustment.location_id,
                                    MovementType::Adjustment,
                                    item.adjustment_quantity,
                                    approved_by,
                                )
                            };
                            movements
                                .push(apply_movement(txn, &tenant_key, &input, policy).await?);
                        }

                        let mut active: stock_adjustment::ActiveModel = adjustment.into();
                        active.status = Set(AdjustmentStatus::Approved.as_ref().to_string());
                        active.approved_by = Set(Some(approved_by));
                        active.approved_at = Set(Some(Utc::now()));
                        active.updated_at = Set(Utc::now());
                        let adjustment =
                            active.update(txn).await.map_err(ServiceError::db_error)?;

                        Ok((adjustment, movements))
                    })
                },
            )
            .await
            .map_err(ServiceError::from)?;

        info!(
            tenant = %tenant,
            adjustment_id = %adjustment.id,
            adjustment_number = %adjustment.adjustment_number,
            movements = movements.len(),
            "Adjustment approved"
        );
        self.event_sender
            .emit(Event::AdjustmentApproved {
                adjustment_id: adjustment.id,
                adjustment_number: adjustment.adjustment_number.clone(),
                movement_count: movements.len(),
                approved_by,
            })
            .await;

        for product_id in distinct_products(&movements) {
            self.movements.refresh_stock_status(tenant, product_id).await?;
        }

        Ok((adjustment, movements))
    }

    /// pending_approval → rejected. Quantities are never applied; the rows
    /// remain for audit.
    #[instrument(skip(self))]
    pub async fn reject(
        &self,
        tenant: &TenantId,
        adjustment_id: Uuid,
    ) -> Result<stock_adjustment::Model, ServiceError> {
        let tenant_key = tenant.clone();
        let adjustment = self
            .db
            .transaction::<_, stock_adjustment::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let adjustment =
                        load_adjustment(txn, &tenant_key, adjustment_id).await?;
                    require_status(
                        &adjustment,
                        AdjustmentStatus::PendingApproval,
                        "reject",
                    )?;

                    let mut active: stock_adjustment::ActiveModel = adjustment.into();
                    active.status = Set(AdjustmentStatus::Rejected.as_ref().to_string());
                    active.updated_at = Set(Utc::now());
                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        self.event_sender
            .emit(Event::AdjustmentRejected {
                adjustment_id: adjustment.id,
                adjustment_number: adjustment.adjustment_number.clone(),
            })
            .await;

        Ok(adjustment)
    }

    /// Deletes a draft and its items. Any other status fails InvalidState.
    #[instrument(skip(self))]
    pub async fn delete_draft(
        &self,
        tenant: &TenantId,
        adjustment_id: Uuid,
    ) -> Result<(), ServiceError> {
        let tenant_key = tenant.clone();
        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let adjustment =
                        load_adjustment(txn, &tenant_key, adjustment_id).await?;
                    require_status(&adjustment, AdjustmentStatus::Draft, "delete")?;

                    StockAdjustmentItem::delete_many()
                        .filter(stock_adjustment_item::Column::AdjustmentId.eq(adjustment_id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    StockAdjustment::delete_by_id(adjustment_id)
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    Ok(())
                })
            })
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        tenant: &TenantId,
        adjustment_id: Uuid,
    ) -> Result<AdjustmentDetail, ServiceError> {
        let adjustment = load_adjustment(self.db.as_ref(), tenant, adjustment_id).await?;
        let items = adjustment
            .find_related(StockAdjustmentItem)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(AdjustmentDetail { adjustment, items })
    }

    /// Paginated adjustment list, newest first, optionally filtered by
    /// status. Page numbers are 1-based.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        tenant: &TenantId,
        status: Option<AdjustmentStatus>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_adjustment::Model>, u64), ServiceError> {
        if page == 0 || limit == 0 {
            return Err(ServiceError::ValidationError(
                "page and limit must be positive".to_string(),
            ));
        }

        let mut query = StockAdjustment::find()
            .filter(stock_adjustment::Column::Domain.eq(tenant.as_str()));
        if let Some(status) = status {
            query = query.filter(stock_adjustment::Column::Status.eq(status.as_ref()));
        }

        let paginator = query
            .order_by_desc(stock_adjustment::Column::CreatedAt)
            .paginate(self.db.as_ref(), limit);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let adjustments = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((adjustments, total))
    }
}

async fn load_adjustment<C: ConnectionTrait>(
    conn: &C,
    tenant: &TenantId,
    adjustment_id: Uuid,
) -> Result<stock_adjustment::Model, ServiceError> {
    StockAdjustment::find()
        .filter(stock_adjustment::Column::Domain.eq(tenant.as_str()))
        .filter(stock_adjustment::Column::Id.eq(adjustment_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("adjustment {}", adjustment_id)))
}

fn require_status(
    adjustment: &stock_adjustment::Model,
    expected: AdjustmentStatus,
    action: &str,
) -> Result<(), ServiceError> {
    match adjustment.status() {
        Some(status) if status == expected => Ok(()),
        _ => Err(ServiceError::InvalidState(format!(
            "cannot {} adjustment {} in status {}",
            action, adjustment.adjustment_number, adjustment.status
        ))),
    }
}

/// Snapshots the system quantity and resolves the unit cost for one item.
async fn snapshot_item<C: ConnectionTrait>(
    conn: &C,
    tenant: &TenantId,
    item: &NewAdjustmentItem,
    location_id: Uuid,
) -> Result<(i32, Decimal), ServiceError> {
    let product = Product::find()
        .filter(product::Column::Domain.eq(tenant.as_str()))
        .filter(product::Column::Id.eq(item.product_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("product {}", item.product_id)))?;

    let position = find_position(conn, tenant, item.product_id, location_id).await?;
    let system_quantity = position.as_ref().map(|p| p.quantity_on_hand).unwrap_or(0);
    let unit_cost = item
        .unit_cost
        .or_else(|| position.map(|p| p.average_cost))
        .unwrap_or(product.cost);

    Ok((system_quantity, unit_cost))
}

/// Unique, never-reused adjustment number assigned at creation.
fn generate_adjustment_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "ADJ-{}-{}",
        Utc::now().format("%Y%m%d"),
        suffix[..8].to_uppercase()
    )
}

fn distinct_products(movements: &[inventory_movement::Model]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = movements.iter().map(|m| m.product_id).collect();
    ids.sort();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjustment_numbers_are_unique() {
        let a = generate_adjustment_number();
        let b = generate_adjustment_number();
        assert!(a.starts_with("ADJ-"));
        assert_ne!(a, b);
    }
}
