//! Transfer Coordinator.
//!
//! A transfer is two paired ledger entries in one transaction: transfer_out
//! at the source and transfer_in at the destination, both valued at the
//! source's average cost so the cost basis survives the move. Either both
//! commit or neither does.

use sea_orm::TransactionTrait;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::NegativeStockPolicy;
use crate::db::DbPool;
use crate::entities::inventory_movement::{self, MovementType};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::movements::{apply_movement, RecordMovementInput};
use crate::services::positions::find_position_for_update;
use crate::tenant::TenantId;

/// Both legs of a completed transfer.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TransferResult {
    pub outbound: inventory_movement::Model,
    pub inbound: inventory_movement::Model,
}

#[derive(Clone)]
pub struct TransferService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    policy: NegativeStockPolicy,
}

impl TransferService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, policy: NegativeStockPolicy) -> Self {
        Self {
            db,
            event_sender,
            policy,
        }
    }

    /// Moves quantity between two locations of the same tenant.
    ///
    /// Fails with InsufficientStock (carrying the source's available
    /// quantity) before anything is written when the source cannot cover
    /// the request.
    #[instrument(skip(self, notes))]
    pub async fn transfer(
        &self,
        tenant: &TenantId,
        product_id: Uuid,
        from_location_id: Uuid,
        to_location_id: Uuid,
        quantity: i32,
        user_id: Uuid,
        notes: Option<String>,
    ) -> Result<TransferResult, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "transfer quantity must be positive".to_string(),
            ));
        }
        if from_location_id == to_location_id {
            return Err(ServiceError::ValidationError(
                "source and destination locations must differ".to_string(),
            ));
        }

        let tenant_key = tenant.clone();
        let policy = self.policy;
        let result = self
            .db
            .transaction::<_, TransferResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    // Locked read: the availability check and the outbound
                    // leg must see the same committed source row.
                    let source =
                        find_position_for_update(txn, &tenant_key, product_id, from_location_id)
                            .await?;
                    let available = source.as_ref().map(|p| p.quantity_available).unwrap_or(0);
                    if available < quantity {
                        return Err(ServiceError::insufficient_stock(available, quantity));
                    }

                    // available >= quantity > 0, so the source position exists.
                    let unit_cost = source.map(|p| p.average_cost).unwrap_or_default();

                    let outbound = apply_movement(
                        txn,
                        &tenant_key,
                        &RecordMovementInput {
                            unit_cost: Some(unit_cost),
                            notes: notes.clone(),
                            ..RecordMovementInput::new(
                                product_id,
                                from_location_id,
                                MovementType::TransferOut,
                                -quantity,
                                user_id,
                            )
                        },
                        policy,
                    )
                    .await?;

                    let inbound = apply_movement(
                        txn,
                        &tenant_key,
                        &RecordMovementInput {
                            unit_cost: Some(unit_cost),
                            notes,
                            ..RecordMovementInput::new(
                                product_id,
                                to_location_id,
                                MovementType::TransferIn,
                                quantity,
                                user_id,
                            )
                        },
                        policy,
                    )
                    .await?;

                    Ok(TransferResult { outbound, inbound })
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(
            tenant = %tenant,
            product_id = %product_id,
            from_location_id = %from_location_id,
            to_location_id = %to_location_id,
            quantity,
            "Transfer completed"
        );
        self.event_sender
            .emit(Event::StockTransferred {
                tenant: tenant.to_string(),
                product_id,
                from_location_id,
                to_location_id,
                quantity,
            })
            .await;

        Ok(result)
    }
}
