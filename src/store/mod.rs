// ============================================================================
// Storage Layer - persistence seams for orders and the read-only catalog
// ============================================================================
//
// `OrderStore` owns orders and their line items. `CatalogService` is the
// narrow view of the catalog (menu items, caterer accounts) that this
// service only ever reads.
//
// Both have a PostgreSQL implementation; tests run against the in-memory one.
//
// ============================================================================

mod postgres;
#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::access::Scope;
use crate::domain::order::{NewOrder, Order, OrderKind, OrderLineItem, OrderStatus};
use crate::utils::IsTransient;

pub use postgres::{PgCatalog, PgOrderStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Duplicate value for unique key: {0}")]
    Duplicate(String),

    #[error("Concurrent modification of order {order_id}: expected version {expected}")]
    VersionConflict { order_id: i64, expected: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored row is invalid: {0}")]
    Corrupt(String),
}

impl IsTransient for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, StoreError::Duplicate(_) | StoreError::VersionConflict { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub id: i64,
    pub caterer_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatererAccount {
    pub id: i64,
    pub business_name: Option<String>,
}

/// Scope plus optional filters and a page window.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFilter {
    pub scope: Scope,
    pub status: Option<OrderStatus>,
    pub kind: Option<OrderKind>,
    pub page: u32,
    pub per_page: u32,
}

impl OrderFilter {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn pages(&self) -> i64 {
        if self.per_page == 0 {
            return 0;
        }
        let per_page = i64::from(self.per_page);
        (self.total + per_page - 1) / per_page
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Write the order and all of its line items atomically.
    async fn insert_order(&self, order: &NewOrder) -> Result<(Order, Vec<OrderLineItem>), StoreError>;

    /// Fetch one order, but only if it lies inside `scope`.
    async fn find_order(&self, id: i64, scope: Scope) -> Result<Option<Order>, StoreError>;

    /// Newest first.
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Page<Order>, StoreError>;

    async fn line_items(&self, order_id: i64) -> Result<Vec<OrderLineItem>, StoreError>;

    /// Persist the mutable fields of `order` if the stored version still
    /// equals `order.version`. Returns the order with its new version.
    async fn save_order(&self, order: &Order) -> Result<Order, StoreError>;
}

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Menu item lookup restricted to one caterer's catalog.
    async fn find_item(&self, caterer_id: i64, item_id: i64) -> Result<Option<MenuItem>, StoreError>;

    async fn find_item_by_id(&self, item_id: i64) -> Result<Option<MenuItem>, StoreError>;

    async fn find_caterer(&self, caterer_id: i64) -> Result<Option<CatererAccount>, StoreError>;
}
