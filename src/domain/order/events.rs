use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::value_objects::OrderStatus;

// ============================================================================
// Order Events - what an accepted command changed
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    StatusChanged(OrderStatusChanged),
    Confirmed(OrderConfirmed),
    DispatchedForDelivery(OrderDispatched),
    FinalTotalSet(OrderFinalTotalSet),
    DepositRecorded(OrderDepositRecorded),
    DeliveryInstructionsSet(OrderDeliveryInstructionsSet),
}

impl OrderEvent {
    /// Name of the order field the event wrote, as reported to callers.
    pub fn field_name(&self) -> &'static str {
        match self {
            OrderEvent::StatusChanged(_) => "status",
            OrderEvent::Confirmed(_) => "confirmed_at",
            OrderEvent::DispatchedForDelivery(_) => "delivery_date",
            OrderEvent::FinalTotalSet(_) => "final_total",
            OrderEvent::DepositRecorded(_) => "deposit_paid",
            OrderEvent::DeliveryInstructionsSet(_) => "delivery_instructions",
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::StatusChanged(_) => "OrderStatusChanged",
            OrderEvent::Confirmed(_) => "OrderConfirmed",
            OrderEvent::DispatchedForDelivery(_) => "OrderDispatched",
            OrderEvent::FinalTotalSet(_) => "OrderFinalTotalSet",
            OrderEvent::DepositRecorded(_) => "OrderDepositRecorded",
            OrderEvent::DeliveryInstructionsSet(_) => "OrderDeliveryInstructionsSet",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderStatusChanged {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub changed_at: DateTime<Utc>,
}

/// First entry into `confirmed`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderConfirmed {
    pub confirmed_at: DateTime<Utc>,
}

/// First entry into `out_for_delivery`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderDispatched {
    pub delivery_date: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderFinalTotalSet {
    pub amount: Decimal,
    pub set_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderDepositRecorded {
    pub amount: Decimal,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderDeliveryInstructionsSet {
    pub instructions: String,
    pub set_at: DateTime<Utc>,
}
