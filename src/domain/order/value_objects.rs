use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Draft,
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Completed,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Draft,
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Completed,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Completed => "completed",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::InvalidStatus(s.to_string()))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Regular delivery order or multi-guest catering event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Regular,
    Catering,
}

impl OrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Regular => "regular",
            OrderKind::Catering => "catering",
        }
    }

    pub fn order_number_prefix(&self) -> &'static str {
        match self {
            OrderKind::Regular => "ORD",
            OrderKind::Catering => "CAT",
        }
    }
}

impl FromStr for OrderKind {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(OrderKind::Regular),
            "catering" => Ok(OrderKind::Catering),
            other => Err(OrderError::InvalidOrderType(other.to_string())),
        }
    }
}

/// Largest amount a `NUMERIC(10,2)` money column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Reject amounts that are negative, too large, or finer than a cent.
pub fn check_amount(field: &'static str, amount: Decimal) -> Result<(), OrderError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(OrderError::NegativeAmount(field));
    }
    if amount > MAX_AMOUNT {
        return Err(OrderError::AmountOutOfRange(field));
    }
    if amount.normalize().scale() > 2 {
        return Err(OrderError::AmountTooPrecise(field));
    }
    Ok(())
}

/// A persisted line of an order. The unit price is the catalog price at the
/// moment the order was created and is never refreshed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub customization: String,
    pub servings_per_unit: i32,
    pub special_instructions: String,
}

impl OrderLineItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub fn total_servings(&self) -> i64 {
        i64::from(self.quantity) * i64::from(self.servings_per_unit)
    }
}

/// A line item that has been priced but not yet written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLineItem {
    pub menu_item_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub customization: String,
    pub servings_per_unit: i32,
    pub special_instructions: String,
}

// ============================================================================
// Unit Tests
// ============================================================================
