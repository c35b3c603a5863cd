//! `SeaORM` Entity for transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::TransactionKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub currency: String,
    pub origin_account_id: Option<Uuid>,
    pub destination_account_id: Option<Uuid>,
    /// Decimal rendered as text.
    pub exchange_rate: Option<String>,
    pub destination_amount_minor: Option<i64>,
    pub destination_currency: Option<String>,
    pub transaction_date: Date,
    pub accounting_period: Date,
    pub comment: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::money_accounts::Entity",
        from = "Column::OriginAccountId",
        to = "super::money_accounts::Column::Id"
    )]
    OriginAccount,
    #[sea_orm(
        belongs_to = "super::money_accounts::Entity",
        from = "Column::DestinationAccountId",
        to = "super::money_accounts::Column::Id"
    )]
    DestinationAccount,
    #[sea_orm(has_one = "super::payments::Entity")]
    Payments,
    #[sea_orm(has_one = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
