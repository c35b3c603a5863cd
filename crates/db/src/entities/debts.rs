//! `SeaORM` Entity for debts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{DebtStatus, DebtType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "debts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub debt_type: DebtType,
    pub status: DebtStatus,
    pub counterparty_id: Uuid,
    pub original_amount_minor: i64,
    pub outstanding_amount_minor: i64,
    pub currency: String,
    pub description: String,
    pub due_date: Option<Date>,
    pub settlement_transaction_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::SettlementTransactionId",
        to = "super::transactions::Column::Id",
        on_delete = "SetNull"
    )]
    SettlementTransaction,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SettlementTransaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
