//! Ledger Entry Recorder.
//!
//! Every stock change flows through [`MovementService::record_movement`]:
//! one immutable ledger row plus the matching position update, committed as
//! a single transaction. Consecutive entries for a (product, location) pair
//! form a serial history: each row's quantity_before equals the previous
//! row's quantity_after.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::NegativeStockPolicy;
use crate::db::DbPool;
use crate::entities::{
    inventory_location::{self, Entity as InventoryLocation},
    inventory_movement::{self, Entity as InventoryMovement, MovementReference, MovementType},
    product::{self, Entity as Product, StockStatus},
    stock_position::{self, Entity as StockPosition},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::positions::get_or_create_position;
use crate::tenant::TenantId;

/// Parameters for one ledger entry.
#[derive(Debug, Clone)]
pub struct RecordMovementInput {
    pub product_id: Uuid,
    pub location_id: Uuid,
    pub movement_type: MovementType,
    /// Signed: positive for incoming stock, negative for outgoing.
    pub quantity_change: i32,
    /// Cost per unit for incoming stock; outgoing entries fall back to the
    /// position's current average cost.
    pub unit_cost: Option<Decimal>,
    pub reference: MovementReference,
    pub user_id: Uuid,
    pub notes: Option<String>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

impl RecordMovementInput {
    pub fn new(
        product_id: Uuid,
        location_id: Uuid,
        movement_type: MovementType,
        quantity_change: i32,
        user_id: Uuid,
    ) -> Self {
        Self {
            product_id,
            location_id,
            movement_type,
            quantity_change,
            unit_cost: None,
            reference: MovementReference::None,
            user_id,
            notes: None,
            batch_number: None,
            expiry_date: None,
        }
    }

    pub fn with_unit_cost(mut self, unit_cost: Decimal) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    pub fn with_reference(mut self, reference: MovementReference) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Filters for the movement history read path.
#[derive(Debug, Clone, Default)]
pub struct MovementHistoryFilter {
    pub product_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Writes one ledger entry and its position update inside a caller-provided
/// transaction. Shared by the recorder, the transfer coordinator, and the
/// adjustment approval path so all three produce identical ledger shapes.
/// The position read takes a row lock, so concurrent writers to the same
/// (product, location) pair serialize here rather than losing an update.
pub(crate) async fn apply_movement<C: ConnectionTrait>(
    conn: &C,
    tenant: &TenantId,
    input: &RecordMovementInput,
    policy: NegativeStockPolicy,
) -> Result<inventory_movement::Model, ServiceError> {
    let position =
        get_or_create_position(conn, tenant, input.product_id, input.location_id).await?;

    let quantity_before = position.quantity_on_hand;
    let target = quantity_before + input.quantity_change;
    let quantity_after = if target < 0 {
        match policy {
            NegativeStockPolicy::Reject => {
                return Err(ServiceError::ValidationError(format!(
                    "movement would drive stock negative: on hand {}, change {}",
                    quantity_before, input.quantity_change
                )));
            }
            NegativeStockPolicy::ClampToZero => {
                warn!(
                    tenant = %tenant,
                    product_id = %input.product_id,
                    location_id = %input.location_id,
                    on_hand = quantity_before,
                    requested_change = input.quantity_change,
                    overdraw = -target,
                    "Stock clamped at zero; decrease exceeded on-hand quantity"
                );
                0
            }
        }
    } else {
        target
    };
    // The ledger records the change that was actually applied, so the
    // before/after chain stays continuous even when a decrease was clamped.
    let effective_change = quantity_after - quantity_before;

    let mut average_cost = position.average_cost;
    let mut last_cost = position.last_cost;
    if effective_change > 0 {
        if let Some(incoming_cost) = input.unit_cost {
            let old_qty = Decimal::from(quantity_before);
            let incoming_qty = Decimal::from(effective_change);
            average_cost = (((old_qty * position.average_cost) + (incoming_qty * incoming_cost))
                / Decimal::from(quantity_after))
            .round_dp(4);
            last_cost = incoming_cost;
        }
    }

    let recorded_unit_cost = input.unit_cost.unwrap_or(position.average_cost);
    let total_cost = recorded_unit_cost * Decimal::from(effective_change.abs());
    let now = Utc::now();

    let movement = inventory_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        domain: Set(tenant.as_str().to_string()),
        product_id: Set(input.product_id),
        location_id: Set(input.location_id),
        movement_type: Set(input.movement_type.as_ref().to_string()),
        quantity_before: Set(quantity_before),
        quantity_change: Set(effective_change),
        quantity_after: Set(quantity_after),
        unit_cost: Set(Some(recorded_unit_cost)),
        total_cost: Set(Some(total_cost)),
        reference_type: Set(input.reference.reference_type().map(str::to_string)),
        reference_id: Set(input.reference.reference_id()),
        batch_number: Set(input.batch_number.clone()),
        expiry_date: Set(input.expiry_date),
        user_id: Set(input.user_id),
        notes: Set(input.notes.clone()),
        created_at: Set(now),
    };
    let movement = movement.insert(conn).await.map_err(ServiceError::db_error)?;

    let mut active: stock_position::ActiveModel = position.clone().into();
    active.quantity_on_hand = Set(quantity_after);
    active.quantity_available = Set(quantity_after - position.quantity_reserved);
    active.average_cost = Set(average_cost);
    active.last_cost = Set(last_cost);
    active.total_value = Set(Decimal::from(quantity_after) * average_cost);
    active.last_movement_at = Set(Some(now));
    if input.movement_type == MovementType::Purchase {
        active.last_restock_at = Set(Some(now));
    }
    if input.movement_type == MovementType::Sale {
        active.last_sale_at = Set(Some(now));
    }
    active.updated_at = Set(now);
    active.update(conn).await.map_err(ServiceError::db_error)?;

    Ok(movement)
}

/// Service recording stock movements and serving the movement history.
#[derive(Clone)]
pub struct MovementService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    policy: NegativeStockPolicy,
}

impl MovementService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, policy: NegativeStockPolicy) -> Self {
        Self {
            db,
            event_sender,
            policy,
        }
    }

    /// Records one stock movement atomically: position read, ledger insert,
    /// position write all commit or all roll back. After commit, the owning
    /// product's cached stock status is refreshed and events are emitted.
    #[instrument(skip(self, input), fields(product_id = %input.product_id, location_id = %input.location_id, movement_type = %input.movement_type))]
    pub async fn record_movement(
        &self,
        tenant: &TenantId,
        input: RecordMovementInput,
    ) -> Result<inventory_movement::Model, ServiceError> {
        if input.quantity_change == 0 {
            return Err(ServiceError::ValidationError(
                "quantity_change must be non-zero".to_string(),
            ));
        }

        let product_id = input.product_id;
        let tenant_key = tenant.clone();
        let policy = self.policy;
        let movement = self
            .db
            .transaction::<_, inventory_movement::Model, ServiceError>(move |txn| {
                Box::pin(async move { apply_movement(txn, &tenant_key, &input, policy).await })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(
            tenant = %tenant,
            movement_id = %movement.id,
            quantity_change = movement.quantity_change,
            quantity_after = movement.quantity_after,
            "Movement recorded"
        );

        self.event_sender
            .emit(Event::MovementRecorded {
                movement_id: movement.id,
                tenant: tenant.to_string(),
                product_id: movement.product_id,
                location_id: movement.location_id,
                movement_type: movement.movement_type.clone(),
                quantity_change: movement.quantity_change,
                quantity_after: movement.quantity_after,
            })
            .await;

        self.refresh_stock_status(tenant, product_id).await?;

        Ok(movement)
    }

    /// Recomputes the product's cached stock badge from the tenant-wide sum
    /// of available quantity across active locations.
    pub(crate) async fn refresh_stock_status(
        &self,
        tenant: &TenantId,
        product_id: Uuid,
    ) -> Result<Option<StockStatus>, ServiceError> {
        let db = self.db.as_ref();

        let product = Product::find()
            .filter(product::Column::Domain.eq(tenant.as_str()))
            .filter(product::Column::Id.eq(product_id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("product {}", product_id)))?;

        if !product.track_inventory {
            return Ok(None);
        }

        let active_locations: Vec<Uuid> = InventoryLocation::find()
            .filter(inventory_location::Column::Domain.eq(tenant.as_str()))
            .filter(inventory_location::Column::IsActive.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|l| l.id)
            .collect();

        let positions = StockPosition::find()
            .filter(stock_position::Column::Domain.eq(tenant.as_str()))
            .filter(stock_position::Column::ProductId.eq(product_id))
            .filter(stock_position::Column::LocationId.is_in(active_locations))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let total_available: i64 = positions
            .iter()
            .map(|p| p.quantity_available as i64)
            .sum();

        let new_status = if total_available <= 0 {
            StockStatus::OutOfStock
        } else if total_available <= product.reorder_level as i64 {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        };

        let old_status = product.stock_status.clone();
        if old_status != new_status.as_ref() {
            let mut active: product::ActiveModel = product.clone().into();
            active.stock_status = Set(new_status.as_ref().to_string());
            active.updated_at = Set(Utc::now());
            active.update(db).await.map_err(ServiceError::db_error)?;

            self.event_sender
                .emit(Event::ProductStockStatusChanged {
                    tenant: tenant.to_string(),
                    product_id,
                    old_status,
                    new_status: new_status.as_ref().to_string(),
                })
                .await;

            if matches!(new_status, StockStatus::LowStock | StockStatus::OutOfStock) {
                self.event_sender
                    .emit(Event::LowStockDetected {
                        tenant: tenant.to_string(),
                        product_id,
                        quantity_available: total_available as i32,
                        reorder_level: product.reorder_level,
                        detected_at: Utc::now(),
                    })
                    .await;
            }
        }

        Ok(Some(new_status))
    }

    /// Paginated movement history, newest first. The audit read path over
    /// the append-only log; page numbers are 1-based.
    #[instrument(skip(self, filter))]
    pub async fn list_movements(
        &self,
        tenant: &TenantId,
        filter: &MovementHistoryFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<inventory_movement::Model>, u64), ServiceError> {
        if page == 0 || limit == 0 {
            return Err(ServiceError::ValidationError(
                "page and limit must be positive".to_string(),
            ));
        }

        let mut query = InventoryMovement::find()
            .filter(inventory_movement::Column::Domain.eq(tenant.as_str()));

        if let Some(product_id) = filter.product_id {
            query = query.filter(inventory_movement::Column::ProductId.eq(product_id));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(inventory_movement::Column::LocationId.eq(location_id));
        }
        if let Some(movement_type) = filter.movement_type {
            query = query
                .filter(inventory_movement::Column::MovementType.eq(movement_type.as_ref()));
        }
        if let Some(from) = filter.from {
            query = query.filter(inventory_movement::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(inventory_movement::Column::CreatedAt.lte(to));
        }

        let paginator = query
            .order_by_desc(inventory_movement::Column::CreatedAt)
            .paginate(self.db.as_ref(), limit);

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let movements = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((movements, total))
    }
}
