use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events emitted by the inventory core after a transaction commits.
///
/// Consumers (sync workers, notification fan-out) subscribe via the mpsc
/// receiver handed to [`process_events`]. Events are advisory; the ledger is
/// the source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    MovementRecorded {
        movement_id: Uuid,
        tenant: String,
        product_id: Uuid,
        location_id: Uuid,
        movement_type: String,
        quantity_change: i32,
        quantity_after: i32,
    },
    StockTransferred {
        tenant: String,
        product_id: Uuid,
        from_location_id: Uuid,
        to_location_id: Uuid,
        quantity: i32,
    },
    StockReserved {
        tenant: String,
        product_id: Uuid,
        location_id: Uuid,
        quantity: i32,
    },
    StockReservationReleased {
        tenant: String,
        product_id: Uuid,
        location_id: Uuid,
        quantity: i32,
    },
    AdjustmentSubmitted {
        adjustment_id: Uuid,
        adjustment_number: String,
    },
    AdjustmentApproved {
        adjustment_id: Uuid,
        adjustment_number: String,
        movement_count: usize,
        approved_by: Uuid,
    },
    AdjustmentRejected {
        adjustment_id: Uuid,
        adjustment_number: String,
    },
    ProductStockStatusChanged {
        tenant: String,
        product_id: Uuid,
        old_status: String,
        new_status: String,
    },
    LowStockDetected {
        tenant: String,
        product_id: Uuid,
        quantity_available: i32,
        reorder_level: i32,
        detected_at: DateTime<Utc>,
    },
}

/// Cloneable handle for publishing events.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Publishes an event after a commit. Delivery is best-effort: the
    /// database already holds the committed state, so a closed channel
    /// (receiver dropped during shutdown) is logged and swallowed rather
    /// than surfacing an error for work that succeeded.
    pub async fn emit(&self, event: Event) {
        if let Err(error) = self.sender.send(event).await {
            warn!(%error, "Event dropped; no receiver attached");
        }
    }
}

/// Creates a bounded event channel.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. Spawned once at startup.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::LowStockDetected {
                tenant,
                product_id,
                quantity_available,
                reorder_level,
                ..
            } => {
                warn!(
                    tenant = %tenant,
                    product_id = %product_id,
                    available = quantity_available,
                    reorder_level = reorder_level,
                    "Low stock detected"
                );
            }
            other => debug!(event = ?other, "Event processed"),
        }
    }
    info!("Event processor stopped");
}
