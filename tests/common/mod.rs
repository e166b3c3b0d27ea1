//! Shared harness for the integration tests: an in-memory sqlite database
//! per test plus seed helpers for products and locations.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::mpsc;
use uuid::Uuid;

use retailpos_api::config::NegativeStockPolicy;
use retailpos_api::db::{self, DbPool};
use retailpos_api::entities::inventory_location::{self, LocationType};
use retailpos_api::entities::product::{self, StockStatus};
use retailpos_api::events::{Event, EventSender};
use retailpos_api::services::adjustments::StockAdjustmentService;
use retailpos_api::services::locations::InventoryLocationService;
use retailpos_api::services::movements::MovementService;
use retailpos_api::services::positions::StockPositionService;
use retailpos_api::services::reports::InventoryReportService;
use retailpos_api::services::transfers::TransferService;
use retailpos_api::tenant::TenantId;

static DB_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct TestContext {
    pub db: Arc<DbPool>,
    pub movements: MovementService,
    pub positions: StockPositionService,
    pub transfers: TransferService,
    pub adjustments: StockAdjustmentService,
    pub locations: InventoryLocationService,
    pub reports: InventoryReportService,
    pub event_sender: EventSender,
    // Held so emitted events land in a live channel during the test;
    // dropping it exercises the best-effort path instead.
    pub event_rx: mpsc::Receiver<Event>,
}

pub async fn setup() -> TestContext {
    setup_with(NegativeStockPolicy::ClampToZero, true).await
}

pub async fn setup_with(policy: NegativeStockPolicy, allow_self_approval: bool) -> TestContext {
    let seq = DB_SEQ.fetch_add(1, Ordering::Relaxed);
    let url = format!("sqlite:file:testdb{}?mode=memory&cache=shared", seq);
    let db = Arc::new(db::connect(&url).await.expect("failed to open sqlite"));
    db::run_migrations(db.as_ref())
        .await
        .expect("failed to run migrations");

    let (tx, rx) = mpsc::channel(256);
    let event_sender = EventSender::new(tx);

    TestContext {
        movements: MovementService::new(db.clone(), event_sender.clone(), policy),
        positions: StockPositionService::new(db.clone(), event_sender.clone()),
        transfers: TransferService::new(db.clone(), event_sender.clone(), policy),
        adjustments: StockAdjustmentService::new(
            db.clone(),
            event_sender.clone(),
            policy,
            allow_self_approval,
        ),
        locations: InventoryLocationService::new(db.clone()),
        reports: InventoryReportService::new(db.clone()),
        db,
        event_sender,
        event_rx: rx,
    }
}

pub fn tenant(name: &str) -> TenantId {
    TenantId::from(name)
}

pub fn dec(value: &str) -> Decimal {
    value.parse().expect("bad decimal literal")
}

pub async fn seed_product(
    ctx: &TestContext,
    tenant: &TenantId,
    sku: &str,
    cost: Decimal,
    reorder_level: i32,
) -> product::Model {
    let now = Utc::now();
    product::ActiveModel {
        id: Set(Uuid::new_v4()),
        domain: Set(tenant.as_str().to_string()),
        sku: Set(sku.to_string()),
        name: Set(format!("Product {}", sku)),
        cost: Set(cost),
        reorder_level: Set(reorder_level),
        max_stock_level: Set(None),
        track_inventory: Set(true),
        stock_status: Set(StockStatus::OutOfStock.as_ref().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(ctx.db.as_ref())
    .await
    .expect("failed to seed product")
}

pub async fn seed_location(
    ctx: &TestContext,
    tenant: &TenantId,
    name: &str,
) -> inventory_location::Model {
    let now = Utc::now();
    inventory_location::ActiveModel {
        id: Set(Uuid::new_v4()),
        domain: Set(tenant.as_str().to_string()),
        name: Set(name.to_string()),
        location_type: Set(LocationType::Store.as_ref().to_string()),
        is_active: Set(true),
        is_default: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(ctx.db.as_ref())
    .await
    .expect("failed to seed location")
}
