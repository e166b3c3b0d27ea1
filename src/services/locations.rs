//! Inventory location administration.
//!
//! Locations are created administratively. At most one default location per
//! tenant, enforced here rather than by a database constraint; the default
//! location and any location still holding stock positions cannot be
//! deleted.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    inventory_location::{self, Entity as InventoryLocation, LocationType},
    stock_position::{self, Entity as StockPosition},
};
use crate::errors::ServiceError;
use crate::tenant::TenantId;

#[derive(Debug, Clone)]
pub struct NewLocation {
    pub name: String,
    pub location_type: LocationType,
    pub is_default: bool,
}

#[derive(Clone)]
pub struct InventoryLocationService {
    db: Arc<DbPool>,
}

impl InventoryLocationService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, location))]
    pub async fn create(
        &self,
        tenant: &TenantId,
        location: NewLocation,
    ) -> Result<inventory_location::Model, ServiceError> {
        if location.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "location name must not be empty".to_string(),
            ));
        }

        let tenant_key = tenant.clone();
        let created = self
            .db
            .transaction::<_, inventory_location::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    if location.is_default {
                        clear_default(txn, &tenant_key).await?;
                    }

                    let now = Utc::now();
                    let model = inventory_location::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        domain: Set(tenant_key.as_str().to_string()),
                        name: Set(location.name.trim().to_string()),
                        location_type: Set(location.location_type.as_ref().to_string()),
                        is_active: Set(true),
                        is_default: Set(location.is_default),
                        created_at: Set(now),
                        updated_at: Set(now),
                    };
                    model.insert(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(tenant = %tenant, location_id = %created.id, name = %created.name, "Location created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        tenant: &TenantId,
        location_id: Uuid,
    ) -> Result<inventory_location::Model, ServiceError> {
        find_location(self.db.as_ref(), tenant, location_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("location {}", location_id)))
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        tenant: &TenantId,
        include_inactive: bool,
    ) -> Result<Vec<inventory_location::Model>, ServiceError> {
        let mut query = InventoryLocation::find()
            .filter(inventory_location::Column::Domain.eq(tenant.as_str()));
        if !include_inactive {
            query = query.filter(inventory_location::Column::IsActive.eq(true));
        }
        query
            .order_by_asc(inventory_location::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Fallback lookup used by callers that were not given an explicit
    /// location. The core never infers a "current" location on its own.
    #[instrument(skip(self))]
    pub async fn default_location(
        &self,
        tenant: &TenantId,
    ) -> Result<Option<inventory_location::Model>, ServiceError> {
        InventoryLocation::find()
            .filter(inventory_location::Column::Domain.eq(tenant.as_str()))
            .filter(inventory_location::Column::IsDefault.eq(true))
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Makes one location the tenant's default, clearing any previous one.
    #[instrument(skip(self))]
    pub async fn set_default(
        &self,
        tenant: &TenantId,
        location_id: Uuid,
    ) -> Result<inventory_location::Model, ServiceError> {
        let tenant_key = tenant.clone();
        self.db
            .transaction::<_, inventory_location::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let location = find_location(txn, &tenant_key, location_id)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("location {}", location_id))
                        })?;

                    clear_default(txn, &tenant_key).await?;

                    let mut active: inventory_location::ActiveModel = location.into();
                    active.is_default = Set(true);
                    active.updated_at = Set(Utc::now());
                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn deactivate(
        &self,
        tenant: &TenantId,
        location_id: Uuid,
    ) -> Result<inventory_location::Model, ServiceError> {
        let location = self.get(tenant, location_id).await?;
        let mut active: inventory_location::ActiveModel = location.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        active
            .update(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Deletes a location. Refused for the default location and for any
    /// location that still holds stock positions.
    #[instrument(skip(self))]
    pub async fn delete(&self, tenant: &TenantId, location_id: Uuid) -> Result<(), ServiceError> {
        let tenant_key = tenant.clone();
        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let location = find_location(txn, &tenant_key, location_id)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("location {}", location_id))
                        })?;

                    if location.is_default {
                        return Err(ServiceError::ValidationError(
                            "cannot delete the default location".to_string(),
                        ));
                    }

                    let positions = StockPosition::find()
                        .filter(stock_position::Column::Domain.eq(tenant_key.as_str()))
                        .filter(stock_position::Column::LocationId.eq(location_id))
                        .count(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    if positions > 0 {
                        return Err(ServiceError::ValidationError(format!(
                            "location {} still holds {} stock positions",
                            location.name, positions
                        )));
                    }

                    InventoryLocation::delete_by_id(location_id)
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    Ok(())
                })
            })
            .await
            .map_err(ServiceError::from)
    }
}

async fn find_location<C: ConnectionTrait>(
    conn: &C,
    tenant: &TenantId,
    location_id: Uuid,
) -> Result<Option<inventory_location::Model>, ServiceError> {
    InventoryLocation::find()
        .filter(inventory_location::Column::Domain.eq(tenant.as_str()))
        .filter(inventory_location::Column::Id.eq(location_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)
}

async fn clear_default<C: ConnectionTrait>(
    conn: &C,
    tenant: &TenantId,
) -> Result<(), ServiceError> {
    InventoryLocation::update_many()
        .col_expr(
            inventory_location::Column::IsDefault,
            sea_orm::sea_query::Expr::value(false),
        )
        .filter(inventory_location::Column::Domain.eq(tenant.as_str()))
        .filter(inventory_location::Column::IsDefault.eq(true))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(())
}
