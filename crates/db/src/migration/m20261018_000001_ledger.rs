//! Ledger schema: accounts, transactions, debts, payments, expenses, and
//! attachment links.
//!
//! Written with the schema builder so the same migration runs on PostgreSQL
//! and SQLite.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MoneyAccounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MoneyAccounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(MoneyAccounts::TenantId).uuid().not_null())
                    .col(ColumnDef::new(MoneyAccounts::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(MoneyAccounts::AccountNumber)
                            .string_len(64)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(MoneyAccounts::Description).text().not_null().default(""))
                    .col(
                        ColumnDef::new(MoneyAccounts::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(MoneyAccounts::Currency).string_len(3).not_null())
                    .col(
                        ColumnDef::new(MoneyAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MoneyAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_money_accounts_tenant")
                    .table(MoneyAccounts::Table)
                    .col(MoneyAccounts::TenantId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Transactions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Transactions::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(Transactions::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Transactions::OriginAccountId).uuid().null())
                    .col(ColumnDef::new(Transactions::DestinationAccountId).uuid().null())
                    .col(ColumnDef::new(Transactions::ExchangeRate).string_len(64).null())
                    .col(ColumnDef::new(Transactions::DestinationAmountMinor).big_integer().null())
                    .col(ColumnDef::new(Transactions::DestinationCurrency).string_len(3).null())
                    .col(ColumnDef::new(Transactions::TransactionDate).date().not_null())
                    .col(ColumnDef::new(Transactions::AccountingPeriod).date().not_null())
                    .col(ColumnDef::new(Transactions::Comment).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_origin_account")
                            .from(Transactions::Table, Transactions::OriginAccountId)
                            .to(MoneyAccounts::Table, MoneyAccounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_destination_account")
                            .from(Transactions::Table, Transactions::DestinationAccountId)
                            .to(MoneyAccounts::Table, MoneyAccounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_tenant_date")
                    .table(Transactions::Table)
                    .col(Transactions::TenantId)
                    .col(Transactions::TransactionDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_origin")
                    .table(Transactions::Table)
                    .col(Transactions::OriginAccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_destination")
                    .table(Transactions::Table)
                    .col(Transactions::DestinationAccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Debts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Debts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Debts::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Debts::DebtType).string_len(16).not_null())
                    .col(ColumnDef::new(Debts::Status).string_len(24).not_null())
                    .col(ColumnDef::new(Debts::CounterpartyId).uuid().not_null())
                    .col(ColumnDef::new(Debts::OriginalAmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Debts::OutstandingAmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Debts::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Debts::Description).text().not_null().default(""))
                    .col(ColumnDef::new(Debts::DueDate).date().null())
                    .col(ColumnDef::new(Debts::SettlementTransactionId).uuid().null())
                    .col(
                        ColumnDef::new(Debts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Debts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debts_settlement_transaction")
                            .from(Debts::Table, Debts::SettlementTransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_debts_tenant_counterparty")
                    .table(Debts::Table)
                    .col(Debts::TenantId)
                    .col(Debts::CounterpartyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Payments::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(Payments::TransactionId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Payments::CounterpartyId).uuid().not_null())
                    .col(ColumnDef::new(Payments::CategoryId).uuid().null())
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Payments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_transaction")
                            .from(Payments::Table, Payments::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Expenses::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(Expenses::TransactionId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Expenses::CategoryId).uuid().not_null())
                    .col(
                        ColumnDef::new(Expenses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Expenses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_transaction")
                            .from(Expenses::Table, Expenses::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PaymentAttachments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PaymentAttachments::PaymentId).uuid().not_null())
                    .col(ColumnDef::new(PaymentAttachments::FileId).uuid().not_null())
                    .col(ColumnDef::new(PaymentAttachments::TenantId).uuid().not_null())
                    .col(ColumnDef::new(PaymentAttachments::Position).integer().not_null())
                    .col(
                        ColumnDef::new(PaymentAttachments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(PaymentAttachments::PaymentId)
                            .col(PaymentAttachments::FileId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_attachments_payment")
                            .from(PaymentAttachments::Table, PaymentAttachments::PaymentId)
                            .to(Payments::Table, Payments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExpenseAttachments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ExpenseAttachments::ExpenseId).uuid().not_null())
                    .col(ColumnDef::new(ExpenseAttachments::FileId).uuid().not_null())
                    .col(ColumnDef::new(ExpenseAttachments::TenantId).uuid().not_null())
                    .col(ColumnDef::new(ExpenseAttachments::Position).integer().not_null())
                    .col(
                        ColumnDef::new(ExpenseAttachments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(ExpenseAttachments::ExpenseId)
                            .col(ExpenseAttachments::FileId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_attachments_expense")
                            .from(ExpenseAttachments::Table, ExpenseAttachments::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExpenseAttachments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentAttachments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Debts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MoneyAccounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MoneyAccounts {
    Table,
    Id,
    TenantId,
    Name,
    AccountNumber,
    Description,
    BalanceMinor,
    Currency,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    TenantId,
    Kind,
    AmountMinor,
    Currency,
    OriginAccountId,
    DestinationAccountId,
    ExchangeRate,
    DestinationAmountMinor,
    DestinationCurrency,
    TransactionDate,
    AccountingPeriod,
    Comment,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Debts {
    Table,
    Id,
    TenantId,
    DebtType,
    Status,
    CounterpartyId,
    OriginalAmountMinor,
    OutstandingAmountMinor,
    Currency,
    Description,
    DueDate,
    SettlementTransactionId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    TenantId,
    TransactionId,
    CounterpartyId,
    CategoryId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
    TenantId,
    TransactionId,
    CategoryId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PaymentAttachments {
    Table,
    PaymentId,
    FileId,
    TenantId,
    Position,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ExpenseAttachments {
    Table,
    ExpenseId,
    FileId,
    TenantId,
    Position,
    CreatedAt,
}
