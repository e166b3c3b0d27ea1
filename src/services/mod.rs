// Inventory core services
pub mod adjustments;
pub mod locations;
pub mod movements;
pub mod positions;
pub mod reports;
pub mod transfers;
