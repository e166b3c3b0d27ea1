//! Persisted entities for the inventory core.

pub mod inventory_location;
pub mod inventory_movement;
pub mod product;
pub mod stock_adjustment;
pub mod stock_adjustment_item;
pub mod stock_position;
pub mod transfer_recommendation;
