//! Stock Position Store and Reservation Manager.
//!
//! A position is the current aggregate state for one (product, location)
//! pair, created lazily on first use. Reservations are transient holds on
//! available quantity; they never produce ledger entries.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    inventory_location::{self, Entity as InventoryLocation},
    product::{self, Entity as Product},
    stock_position::{self, Entity as StockPosition},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::tenant::TenantId;

/// Looks up the position for a (product, location) pair within one tenant.
pub(crate) async fn find_position<C: ConnectionTrait>(
    conn: &C,
    tenant: &TenantId,
    product_id: Uuid,
    location_id: Uuid,
) -> Result<Option<stock_position::Model>, ServiceError> {
    StockPosition::find()
        .filter(stock_position::Column::Domain.eq(tenant.as_str()))
        .filter(stock_position::Column::ProductId.eq(product_id))
        .filter(stock_position::Column::LocationId.eq(location_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// Same lookup with `SELECT ... FOR UPDATE`, for use inside mutating
/// transactions. Concurrent writers block on the row lock and re-read the
/// committed state instead of both computing from the same stale snapshot,
/// which would lose one update and fork the ledger's before/after chain.
/// Backends without row locks serialize writers at the database level.
pub(crate) async fn find_position_for_update<C: ConnectionTrait>(
    conn: &C,
    tenant: &TenantId,
    product_id: Uuid,
    location_id: Uuid,
) -> Result<Option<stock_position::Model>, ServiceError> {
    StockPosition::find()
        .filter(stock_position::Column::Domain.eq(tenant.as_str()))
        .filter(stock_position::Column::ProductId.eq(product_id))
        .filter(stock_position::Column::LocationId.eq(location_id))
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// Resolves or lazily creates the position row for a pair, locking an
/// existing row for the rest of the transaction.
///
/// Fails NotFound when the product or location does not exist under the
/// tenant. A fresh position starts at zero quantities with the product's
/// cost as its initial cost basis.
pub(crate) async fn get_or_create_position<C: ConnectionTrait>(
    conn: &C,
    tenant: &TenantId,
    product_id: Uuid,
    location_id: Uuid,
) -> Result<stock_position::Model, ServiceError> {
    if let Some(position) = find_position_for_update(conn, tenant, product_id, location_id).await? {
        return Ok(position);
    }

    let product = Product::find()
        .filter(product::Column::Domain.eq(tenant.as_str()))
        .filter(product::Column::Id.eq(product_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("product {}", product_id)))?;

    InventoryLocation::find()
        .filter(inventory_location::Column::Domain.eq(tenant.as_str()))
        .filter(inventory_location::Column::Id.eq(location_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("location {}", location_id)))?;

    let now = Utc::now();
    let position = stock_position::ActiveModel {
        id: Set(Uuid::new_v4()),
        domain: Set(tenant.as_str().to_string()),
        product_id: Set(product_id),
        location_id: Set(location_id),
        quantity_on_hand: Set(0),
        quantity_reserved: Set(0),
        quantity_available: Set(0),
        average_cost: Set(product.cost),
        last_cost: Set(product.cost),
        total_value: Set(Decimal::ZERO),
        reorder_level: Set(None),
        max_stock_level: Set(None),
        markup: Set(None),
        last_movement_at: Set(None),
        last_restock_at: Set(None),
        last_sale_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    position.insert(conn).await.map_err(ServiceError::db_error)
}

/// Service over stock positions and reservation holds.
#[derive(Clone)]
pub struct StockPositionService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl StockPositionService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Returns the position for a pair, creating a zeroed row if absent.
    /// Idempotent: calling twice without an intervening movement returns the
    /// same unchanged position.
    #[instrument(skip(self))]
    pub async fn get_or_create(
        &self,
        tenant: &TenantId,
        product_id: Uuid,
        location_id: Uuid,
    ) -> Result<stock_position::Model, ServiceError> {
        let tenant = tenant.clone();
        self.db
            .transaction::<_, stock_position::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    get_or_create_position(txn, &tenant, product_id, location_id).await
                })
            })
            .await
            .map_err(ServiceError::from)
    }

    /// Read accessor; `None` when no movement has touched the pair yet.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        tenant: &TenantId,
        product_id: Uuid,
        location_id: Uuid,
    ) -> Result<Option<stock_position::Model>, ServiceError> {
        find_position(self.db.as_ref(), tenant, product_id, location_id).await
    }

    /// True iff quantity_available covers the requested quantity.
    #[instrument(skip(self))]
    pub async fn is_in_stock(
        &self,
        tenant: &TenantId,
        product_id: Uuid,
        location_id: Uuid,
        requested: i32,
    ) -> Result<bool, ServiceError> {
        let position = self.get(tenant, product_id, location_id).await?;
        Ok(position
            .map(|p| p.quantity_available >= requested)
            .unwrap_or(false))
    }

    /// Places a hold on available quantity for a pending order.
    ///
    /// Fails with InsufficientStock (carrying the shortfall) when available
    /// quantity cannot cover the request. No ledger entry is written.
    #[instrument(skip(self))]
    pub async fn reserve(
        &self,
        tenant: &TenantId,
        product_id: Uuid,
        location_id: Uuid,
        quantity: i32,
    ) -> Result<stock_position::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "reservation quantity must be positive".to_string(),
            ));
        }

        let tenant_key = tenant.clone();
        let updated = self
            .db
            .transaction::<_, stock_position::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let position =
                        get_or_create_position(txn, &tenant_key, product_id, location_id).await?;

                    if position.quantity_available < quantity {
                        return Err(ServiceError::insufficient_stock(
                            position.quantity_available,
                            quantity,
                        ));
                    }

                    let reserved = position.quantity_reserved + quantity;
                    let mut active: stock_position::ActiveModel = position.clone().into();
                    active.quantity_reserved = Set(reserved);
                    active.quantity_available = Set(position.quantity_on_hand - reserved);
                    active.updated_at = Set(Utc::now());
                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(
            tenant = %tenant,
            product_id = %product_id,
            location_id = %location_id,
            quantity,
            "Reserved stock"
        );
        self.event_sender
            .emit(Event::StockReserved {
                tenant: tenant.to_string(),
                product_id,
                location_id,
                quantity,
            })
            .await;

        Ok(updated)
    }

    /// Releases a hold. The reserved quantity floors at zero; releasing more
    /// than is held is not an error.
    #[instrument(skip(self))]
    pub async fn release_reserved(
        &self,
        tenant: &TenantId,
        product_id: Uuid,
        location_id: Uuid,
        quantity: i32,
    ) -> Result<stock_position::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "release quantity must be positive".to_string(),
            ));
        }

        let tenant_key = tenant.clone();
        let (updated, released) = self
            .db
            .transaction::<_, (stock_position::Model, i32), ServiceError>(move |txn| {
                Box::pin(async move {
                    let position =
                        get_or_create_position(txn, &tenant_key, product_id, location_id).await?;

                    let released = quantity.min(position.quantity_reserved);
                    let reserved = position.quantity_reserved - released;
                    let mut active: stock_position::ActiveModel = position.clone().into();
                    active.quantity_reserved = Set(reserved);
                    active.quantity_available = Set(position.quantity_on_hand - reserved);
                    active.updated_at = Set(Utc::now());
                    let updated = active.update(txn).await.map_err(ServiceError::db_error)?;
                    Ok((updated, released))
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(
            tenant = %tenant,
            product_id = %product_id,
            location_id = %location_id,
            released,
            "Released reserved stock"
        );
        self.event_sender
            .emit(Event::StockReservationReleased {
                tenant: tenant.to_string(),
                product_id,
                location_id,
                quantity: released,
            })
            .await;

        Ok(updated)
    }
}
