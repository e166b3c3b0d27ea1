use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// What kind of stock change a ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Sale,
    Purchase,
    Adjustment,
    TransferIn,
    TransferOut,
    Return,
    Damage,
    Theft,
    Expired,
    Promotion,
}

/// Typed link from a movement to the record that caused it.
///
/// Persisted as the `reference_type` / `reference_id` column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum MovementReference {
    Sale(Uuid),
    StockAdjustment(Uuid),
    PurchaseOrder(Uuid),
    None,
}

impl MovementReference {
    pub fn reference_type(&self) -> Option<&'static str> {
        match self {
            Self::Sale(_) => Some("sale"),
            Self::StockAdjustment(_) => Some("stock_adjustment"),
            Self::PurchaseOrder(_) => Some("purchase_order"),
            Self::None => None,
        }
    }

    pub fn reference_id(&self) -> Option<Uuid> {
        match self {
            Self::Sale(id) | Self::StockAdjustment(id) | Self::PurchaseOrder(id) => Some(*id),
            Self::None => None,
        }
    }

    pub fn from_columns(reference_type: Option<&str>, reference_id: Option<Uuid>) -> Self {
        match (reference_type, reference_id) {
            (Some("sale"), Some(id)) => Self::Sale(id),
            (Some("stock_adjustment"), Some(id)) => Self::StockAdjustment(id),
            (Some("purchase_order"), Some(id)) => Self::PurchaseOrder(id),
            _ => Self::None,
        }
    }
}

/// Append-only ledger entry. Rows are never updated or deleted; the
/// before/after pair of consecutive rows for one (product, location) forms a
/// single serial history.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub domain: String,
    pub product_id: Uuid,
    pub location_id: Uuid,
    pub movement_type: String,
    pub quantity_before: i32,
    pub quantity_change: i32,
    pub quantity_after: i32,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_cost: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_cost: Option<Decimal>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub user_id: Uuid,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn movement_type(&self) -> Option<MovementType> {
        self.movement_type.parse().ok()
    }

    pub fn reference(&self) -> MovementReference {
        MovementReference::from_columns(self.reference_type.as_deref(), self.reference_id)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr> {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
