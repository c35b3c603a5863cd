//! Settlement links between debts and the transactions applied to them.
//!
//! A transaction settles at most one debt, once. The applied amount is kept
//! so the history of a debt can be audited after its link is replaced.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DebtSettlements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DebtSettlements::TransactionId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DebtSettlements::DebtId).uuid().not_null())
                    .col(ColumnDef::new(DebtSettlements::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(DebtSettlements::AppliedAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DebtSettlements::Currency)
                            .string_len(3)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DebtSettlements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debt_settlements_transaction")
                            .from(DebtSettlements::Table, DebtSettlements::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debt_settlements_debt")
                            .from(DebtSettlements::Table, DebtSettlements::DebtId)
                            .to(Debts::Table, Debts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_debt_settlements_debt")
                    .table(DebtSettlements::Table)
                    .col(DebtSettlements::DebtId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DebtSettlements::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DebtSettlements {
    Table,
    TransactionId,
    DebtId,
    TenantId,
    AppliedAmountMinor,
    Currency,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Debts {
    Table,
    Id,
}
