// ============================================================================
// Order Domain - Business Logic for the Order Aggregate
// ============================================================================
//
// - Value objects (OrderStatus, OrderKind, OrderLineItem)
// - Metadata annotation (encode/decode of client and event details)
// - Pricing (cart validation and totals against the live catalog)
// - Factory (validated NewOrder from a creation request)
// - Aggregate (status state machine and details revisions)
// - Command Handler (orchestration with the store)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod metadata;
pub mod pricing;
pub mod factory;
pub mod aggregate;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::{OrderKind, OrderLineItem, OrderStatus};
pub use commands::DetailsUpdate;
pub use errors::{DomainError, OrderError};
pub use metadata::{ClientInfo, OrderMetadata};
pub use pricing::{CartLine, PricingCalculator};
pub use factory::{CreateOrderRequest, NewOrder};
pub use aggregate::Order;
pub use command_handler::OrderCommandHandler;
