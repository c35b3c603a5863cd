//! Small conversions shared by the repositories.

use chrono::{DateTime, Utc};
use moneta_core::{LedgerError, LedgerResult};
use moneta_shared::types::{PageRequest, PageResponse, SortDirection};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{ColumnTrait, DbErr, Order};

/// Maps `DbErr` into the ledger error taxonomy.
pub(crate) trait DbResultExt<T> {
    fn map_db_err(self) -> LedgerResult<T>;
}

impl<T> DbResultExt<T> for Result<T, DbErr> {
    fn map_db_err(self) -> LedgerResult<T> {
        self.map_err(|err| LedgerError::Storage(err.to_string()))
    }
}

pub(crate) fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

pub(crate) fn to_utc(ts: DateTimeWithTimeZone) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

pub(crate) const fn order(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

/// Non-empty, trimmed search term.
pub(crate) fn search_term(term: Option<&str>) -> Option<&str> {
    term.map(str::trim).filter(|term| !term.is_empty())
}

/// Case-insensitive substring match on a text column.
pub(crate) fn contains_ci(column: impl ColumnTrait, term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column.as_column_ref())))
        .like(format!("%{}%", term.to_lowercase()))
}

/// Converts loaded models and wraps them with page metadata.
pub(crate) fn page_of<M, T>(
    models: Vec<M>,
    page: PageRequest,
    total: u64,
    to_domain: impl FnMut(M) -> LedgerResult<T>,
) -> LedgerResult<PageResponse<T>> {
    let data = models
        .into_iter()
        .map(to_domain)
        .collect::<LedgerResult<Vec<_>>>()?;
    Ok(PageResponse::new(data, page.page, page.per_page, total))
}

/// Position column value for the `index`-th attachment.
pub(crate) fn position(index: usize) -> LedgerResult<i32> {
    i32::try_from(index).map_err(|_| LedgerError::Storage("too many attachments".to_string()))
}
