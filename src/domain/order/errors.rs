use super::value_objects::OrderStatus;
use crate::domain::access::OrderField;
use crate::store::StoreError;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Missing required fields: caterer_id and order_items")]
    MissingCartFields,

    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Each order item must have menu_item_id and quantity")]
    IncompleteLine,

    #[error("Invalid item quantity: {0}")]
    InvalidQuantity(i32),

    #[error("Invalid servings per unit: {0}")]
    InvalidServings(i32),

    #[error("Menu item not found for this caterer: {0}")]
    ItemNotFound(i64),

    #[error("Menu item not available: {0}")]
    ItemUnavailable(String),

    #[error("Caterer not found")]
    CatererNotFound,

    #[error("Invalid status value: {0}")]
    InvalidStatus(String),

    #[error("Invalid order type: {0}")]
    InvalidOrderType(String),

    #[error("Invalid date or time format")]
    InvalidDateFormat,

    #[error("Catering orders require {0}")]
    MissingEventField(&'static str),

    #[error("Guest count must be at least 1")]
    InvalidGuestCount,

    #[error("{0} cannot be negative")]
    NegativeAmount(&'static str),

    #[error("{0} exceeds the maximum of 99999999.99")]
    AmountOutOfRange(&'static str),

    #[error("{0} cannot have more than two decimal places")]
    AmountTooPrecise(&'static str),

    #[error("Not permitted to update {0}")]
    FieldNotWritable(OrderField),

    #[error("No data provided")]
    NoChanges,

    #[error("Cannot move order from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
}

/// Failure of a domain operation that also reads the catalog or the store.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error(transparent)]
    Rule(#[from] OrderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
