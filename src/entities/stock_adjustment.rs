use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentType {
    Increase,
    Decrease,
    Recount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    PhysicalCount,
    DamagedGoods,
    ExpiredGoods,
    TheftLoss,
    SupplierError,
    SystemError,
    Promotion,
    Sample,
    Other,
}

/// Workflow state: draft → pending_approval → {approved | rejected}.
/// Terminal states absorb; no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentStatus {
    Draft,
    PendingApproval,
    Approved,
    Rejected,
}

impl AdjustmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

/// A manual stock correction gated by approval. Quantities only reach the
/// ledger when the adjustment is approved.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_adjustments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub domain: String,
    #[sea_orm(unique)]
    pub adjustment_number: String,
    pub location_id: Uuid,
    pub adjustment_type: String,
    pub reason: String,
    pub status: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_value_change: Decimal,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn status(&self) -> Option<AdjustmentStatus> {
        self.status.parse().ok()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_adjustment_item::Entity")]
    Items,
}

impl Related<super::stock_adjustment_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(AdjustmentStatus::Approved.is_terminal());
        assert!(AdjustmentStatus::Rejected.is_terminal());
        assert!(!AdjustmentStatus::Draft.is_terminal());
        assert!(!AdjustmentStatus::PendingApproval.is_terminal());
    }

    #[test]
    fn reason_storage_form() {
        assert_eq!(AdjustmentReason::TheftLoss.as_ref(), "theft_loss");
        assert_eq!(
            "physical_count".parse::<AdjustmentReason>().ok(),
            Some(AdjustmentReason::PhysicalCount)
        );
    }
}
