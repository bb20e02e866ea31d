//! Remote table store client.
//!
//! Every collection exposes the same five single round-trip operations.
//! Nothing is cached; callers re-fetch to observe the effect of a write.

/// In-process store used by tests.
pub mod memory;
/// PostgREST client for the hosted backend.
pub mod rest;

use std::fmt;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use rest::RestStore;

/// A row type living in one remote collection.
pub trait Record: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Name of the backing collection.
    const COLLECTION: &'static str;
    /// Identifier type.
    type Id: fmt::Display + Clone + Send + Sync + 'static;
    /// Fields supplied on insert; excludes identity and creation time.
    type Insert: Serialize + Send + Sync;
    /// Fields supplied on update.
    type Update: Serialize + Send + Sync;

    /// Identifier of this row.
    fn id(&self) -> &Self::Id;
}

/// Equality filter on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Column compared.
    pub column: &'static str,
    /// Value the column must equal, in its text form.
    pub value: String,
}

/// Sort key for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    /// Column sorted on.
    pub column: &'static str,
    /// Ascending when true.
    pub ascending: bool,
}

/// Optional filter and order applied to a `list` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Row filter.
    pub filter: Option<Filter>,
    /// Result ordering.
    pub order: Option<Order>,
}

impl ListQuery {
    /// Every row, in backend order.
    pub fn all() -> Self {
        Self::default()
    }

    /// Keep rows whose `column` equals `value`.
    pub fn eq(mut self, column: &'static str, value: impl fmt::Display) -> Self {
        self.filter = Some(Filter {
            column,
            value: value.to_string(),
        });
        self
    }

    /// Sort ascending by `column`.
    pub fn ascending(mut self, column: &'static str) -> Self {
        self.order = Some(Order {
            column,
            ascending: true,
        });
        self
    }

    /// Sort descending by `column`.
    pub fn descending(mut self, column: &'static str) -> Self {
        self.order = Some(Order {
            column,
            ascending: false,
        });
        self
    }
}

/// Capability over a remote relational table service.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All rows matching `query`.
    async fn list<R: Record>(&self, query: &ListQuery) -> Result<Vec<R>, StoreError>;

    /// The row identified by `id`, or [`StoreError::NotFound`].
    async fn get_by_id<R: Record>(&self, id: &R::Id) -> Result<R, StoreError>;

    /// Insert a row and return it with its store-assigned fields.
    async fn insert<R: Record>(&self, fields: &R::Insert) -> Result<R, StoreError>;

    /// Replace the supplied fields of the row identified by `id`.
    async fn update<R: Record>(&self, id: &R::Id, changes: &R::Update) -> Result<(), StoreError>;

    /// Remove the row identified by `id`. Nothing cascades.
    async fn delete<R: Record>(&self, id: &R::Id) -> Result<(), StoreError>;
}
