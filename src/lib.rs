//! Retail POS inventory API library
//!
//! Multi-location stock positions, an append-only movement ledger, and the
//! stock adjustment approval workflow behind a small HTTP surface.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;
pub mod tenant;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use services::adjustments::StockAdjustmentService;
use services::locations::InventoryLocationService;
use services::movements::MovementService;
use services::positions::StockPositionService;
use services::reports::InventoryReportService;
use services::transfers::TransferService;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub movements: MovementService,
    pub positions: StockPositionService,
    pub transfers: TransferService,
    pub adjustments: StockAdjustmentService,
    pub locations: InventoryLocationService,
    pub reports: InventoryReportService,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let policy = config.negative_stock_policy;
        let movements = MovementService::new(db.clone(), event_sender.clone(), policy);
        Self {
            positions: StockPositionService::new(db.clone(), event_sender.clone()),
            transfers: TransferService::new(db.clone(), event_sender.clone(), policy),
            adjustments: StockAdjustmentService::new(
                db.clone(),
                event_sender.clone(),
                policy,
                config.allow_self_approval,
            ),
            locations: InventoryLocationService::new(db.clone()),
            reports: InventoryReportService::new(db.clone()),
            movements,
            db,
            config,
            event_sender,
        }
    }
}

pub(crate) fn default_page() -> u64 {
    1
}

pub(crate) fn default_limit() -> u64 {
    20
}
