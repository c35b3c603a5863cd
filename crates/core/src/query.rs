//! Filter, sort, and page parameters shared by every list operation.

use moneta_shared::types::{PageRequest, SortBy};

/// Parameters for `find_paginated` style queries.
///
/// `F` is the entity's filter type and `S` its sort-field enum. When `sort`
/// is `None` the store applies its default ordering (newest first).
#[derive(Debug, Clone)]
pub struct FindParams<F, S> {
    /// Entity-specific filter.
    pub filter: F,
    /// Optional explicit ordering.
    pub sort: Option<SortBy<S>>,
    /// Requested page.
    pub page: PageRequest,
}

impl<F: Default, S> Default for FindParams<F, S> {
    fn default() -> Self {
        Self {
            filter: F::default(),
            sort: None,
            page: PageRequest::default(),
        }
    }
}

impl<F, S> FindParams<F, S> {
    /// Creates parameters for the first page with the given filter.
    pub fn new(filter: F) -> Self {
        Self {
            filter,
            sort: None,
            page: PageRequest::default(),
        }
    }

    /// Sets the ordering.
    #[must_use]
    pub fn sorted(mut self, sort: SortBy<S>) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sets the page.
    #[must_use]
    pub fn page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }
}
