use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::access::{can_write, OrderField, Role};
use super::commands::{DetailsUpdate, OrderCommand};
use super::errors::OrderError;
use super::events::*;
use super::metadata::OrderMetadata;
use super::value_objects::{check_amount, OrderKind, OrderStatus};

// ============================================================================
// Order Aggregate - current state plus the status state machine
// ============================================================================
//
// Commands are validated in full before any event is emitted, so a rejected
// command never leaves a half-applied order behind. Accepted commands yield
// events; applying them is infallible and stamps `updated_at`.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    // Identity
    pub id: i64,
    pub order_number: String,
    pub version: i64,

    // Parties, fixed at creation
    pub client_id: i64,
    pub caterer_id: i64,

    // Money
    pub total_amount: Decimal,
    pub estimated_total: Decimal,
    pub final_total: Option<Decimal>,
    pub deposit_paid: Decimal,

    // Event attributes (catering only)
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<NaiveTime>,
    pub guest_count: Option<i32>,
    pub special_requirements: Vec<String>,
    pub delivery_address: Option<String>,
    pub delivery_instructions: Option<String>,

    pub status: OrderStatus,
    pub notes: Option<String>,
    pub metadata: Option<OrderMetadata>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
}

/// Allowed status moves. Every move is currently permitted; tightening an
/// edge only means editing its row here.
const TRANSITIONS: &[(OrderStatus, &[OrderStatus])] = &[
    (OrderStatus::Draft, &OrderStatus::ALL),
    (OrderStatus::Pending, &OrderStatus::ALL),
    (OrderStatus::Confirmed, &OrderStatus::ALL),
    (OrderStatus::Preparing, &OrderStatus::ALL),
    (OrderStatus::OutForDelivery, &OrderStatus::ALL),
    (OrderStatus::Completed, &OrderStatus::ALL),
    (OrderStatus::Delivered, &OrderStatus::ALL),
    (OrderStatus::Cancelled, &OrderStatus::ALL),
];

pub fn transition_allowed(from: OrderStatus, to: OrderStatus) -> bool {
    TRANSITIONS
        .iter()
        .find(|(source, _)| *source == from)
        .is_some_and(|(_, targets)| targets.contains(&to))
}

impl Order {
    /// Catering is derived from the event fields, never stored.
    pub fn is_catering(&self) -> bool {
        self.event_name.is_some() && self.event_date.is_some() && self.guest_count.is_some()
    }

    pub fn kind(&self) -> OrderKind {
        if self.is_catering() {
            OrderKind::Catering
        } else {
            OrderKind::Regular
        }
    }

    /// Structured metadata, falling back to decoding the notes annotation
    /// for orders stored without it.
    pub fn resolved_metadata(&self) -> OrderMetadata {
        match (&self.metadata, &self.notes) {
            (Some(metadata), _) => metadata.clone(),
            (None, Some(notes)) => OrderMetadata::decode(notes),
            (None, None) => OrderMetadata::default(),
        }
    }

    /// Validate a command against the current state and describe its effects.
    pub fn handle_command(
        &self,
        command: &OrderCommand,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        match command {
            OrderCommand::UpdateDetails { role, update } => self.handle_update(*role, update, now),
        }
    }

    fn handle_update(
        &self,
        role: Role,
        update: &DetailsUpdate,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if update.is_empty() {
            return Err(OrderError::NoChanges);
        }

        let requested = [
            (OrderField::Status, update.status.is_some()),
            (OrderField::FinalTotal, update.final_total.is_some()),
            (OrderField::DepositPaid, update.deposit_paid.is_some()),
            (OrderField::DeliveryInstructions, update.delivery_instructions.is_some()),
        ];
        for (field, present) in requested {
            if present && !can_write(role, field) {
                return Err(OrderError::FieldNotWritable(field));
            }
        }

        let new_status = update
            .status
            .as_deref()
            .map(str::parse::<OrderStatus>)
            .transpose()?;
        if let Some(to) = new_status {
            if !transition_allowed(self.status, to) {
                return Err(OrderError::IllegalTransition { from: self.status, to });
            }
        }
        if let Some(amount) = update.final_total {
            check_amount("final_total", amount)?;
        }
        if let Some(amount) = update.deposit_paid {
            check_amount("deposit_paid", amount)?;
        }

        let mut events = Vec::new();

        if let Some(to) = new_status {
            events.push(OrderEvent::StatusChanged(OrderStatusChanged {
                from: self.status,
                to,
                changed_at: now,
            }));

            if to == OrderStatus::Confirmed
                && self.status != OrderStatus::Confirmed
                && self.confirmed_at.is_none()
            {
                events.push(OrderEvent::Confirmed(OrderConfirmed { confirmed_at: now }));
            }

            if to == OrderStatus::OutForDelivery && self.delivery_date.is_none() {
                events.push(OrderEvent::DispatchedForDelivery(OrderDispatched {
                    delivery_date: now,
                }));
            }
        }

        if let Some(amount) = update.final_total {
            events.push(OrderEvent::FinalTotalSet(OrderFinalTotalSet { amount, set_at: now }));
        }

        if let Some(amount) = update.deposit_paid {
            events.push(OrderEvent::DepositRecorded(OrderDepositRecorded {
                amount,
                recorded_at: now,
            }));
        }

        // Delivery instructions only exist on catering orders
        if let Some(instructions) = &update.delivery_instructions {
            if self.is_catering() {
                events.push(OrderEvent::DeliveryInstructionsSet(OrderDeliveryInstructionsSet {
                    instructions: instructions.clone(),
                    set_at: now,
                }));
            }
        }

        Ok(events)
    }

    pub fn apply_event(&mut self, event: &OrderEvent) {
        match event {
            OrderEvent::StatusChanged(e) => {
                self.status = e.to;
                self.updated_at = e.changed_at;
            }
            OrderEvent::Confirmed(e) => {
                self.confirmed_at = Some(e.confirmed_at);
                self.updated_at = e.confirmed_at;
            }
            OrderEvent::DispatchedForDelivery(e) => {
                self.delivery_date = Some(e.delivery_date);
                self.updated_at = e.delivery_date;
            }
            OrderEvent::FinalTotalSet(e) => {
                self.final_total = Some(e.amount);
                self.updated_at = e.set_at;
            }
            OrderEvent::DepositRecorded(e) => {
                self.deposit_paid = e.amount;
                self.updated_at = e.recorded_at;
            }
            OrderEvent::DeliveryInstructionsSet(e) => {
                self.delivery_instructions = Some(e.instructions.clone());
                self.updated_at = e.set_at;
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
