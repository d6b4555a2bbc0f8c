use std::sync::Arc;

use chrono::Utc;

use crate::domain::access::{Principal, Scope};
use crate::error::AppError;
use crate::metrics::Metrics;
use crate::query::scope_for;
use crate::store::{CatalogService, CatererAccount, OrderStore};
use crate::utils::{retry_on_transient, IsTransient, RetryConfig};

use super::aggregate::Order;
use super::commands::{DetailsUpdate, OrderCommand};
use super::events::OrderEvent;
use super::factory::{CreateOrderRequest, OrderFactory};

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Request → Factory / Aggregate → Store
//
// Creation retries on order number collisions, regenerating the number each
// time. Updates retry on version conflicts, reloading the order and
// re-running the command against the fresh state.
//
// ============================================================================

impl IsTransient for AppError {
    fn is_transient(&self) -> bool {
        matches!(self, AppError::Conflict(_))
    }
}

#[derive(Debug)]
pub struct CreatedOrder {
    pub order: Order,
    pub caterer: CatererAccount,
}

#[derive(Debug)]
pub struct UpdatedOrder {
    pub order: Order,
    pub events: Vec<OrderEvent>,
}

impl UpdatedOrder {
    pub fn updated_fields(&self) -> Vec<&'static str> {
        self.events.iter().map(OrderEvent::field_name).collect()
    }
}

pub struct OrderCommandHandler {
    store: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogService>,
    metrics: Arc<Metrics>,
    retry: RetryConfig,
}

impl OrderCommandHandler {
    pub fn new(
        store: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogService>,
        metrics: Arc<Metrics>,
        retry: RetryConfig,
    ) -> Self {
        Self { store, catalog, metrics, retry }
    }

    /// Validate, price and persist a new order owned by `principal`.
    /// Only successful creations are timed.
    pub async fn create_order(
        &self,
        principal: &Principal,
        request: &CreateOrderRequest,
    ) -> Result<CreatedOrder, AppError> {
        let timer = self.metrics.order_creation_duration.start_timer();

        let result = self.build_and_insert(principal, request).await;
        match &result {
            Ok(created) => {
                timer.observe_duration();
                self.metrics
                    .orders_created
                    .with_label_values(&[created.order.kind().as_str()])
                    .inc();
            }
            Err(_) => {
                let _ = timer.stop_and_discard();
            }
        }

        result
    }

    async fn build_and_insert(
        &self,
        principal: &Principal,
        request: &CreateOrderRequest,
    ) -> Result<CreatedOrder, AppError> {
        let (new_order, caterer) = OrderFactory::new(self.catalog.as_ref())
            .build(principal.id, request)
            .await?;

        tracing::info!(
            client_id = principal.id,
            caterer_id = new_order.caterer_id,
            kind = new_order.kind.as_str(),
            item_count = new_order.items.len(),
            total = %new_order.total_amount,
            "Creating new order"
        );

        let (order, items) = retry_on_transient(self.retry.clone(), |attempt| {
            let store = self.store.clone();
            let mut candidate = new_order.clone();
            if attempt > 1 {
                candidate.renumber();
            }
            async move {
                store
                    .insert_order(&candidate)
                    .await
                    .map_err(AppError::from)
            }
        })
        .await
        .into_result()?;

        tracing::info!(
            order_id = order.id,
            order_number = %order.order_number,
            item_count = items.len(),
            "✅ Order created"
        );

        Ok(CreatedOrder { order, caterer })
    }

    /// Apply a caterer/admin revision to an order visible to `principal`.
    /// Either every requested change is persisted or none is.
    pub async fn update_details(
        &self,
        principal: &Principal,
        order_id: i64,
        update: DetailsUpdate,
    ) -> Result<UpdatedOrder, AppError> {
        let scope = scope_for(principal)?;
        let command = OrderCommand::UpdateDetails { role: principal.role, update };

        let (order, events) = retry_on_transient(self.retry.clone(), |_attempt| {
            apply_update(self.store.clone(), order_id, scope, command.clone())
        })
        .await
        .into_result()?;

        for event in &events {
            if let OrderEvent::StatusChanged(change) = event {
                self.metrics
                    .status_transitions
                    .with_label_values(&[change.to.as_str()])
                    .inc();
            }
        }

        tracing::info!(
            order_id = order.id,
            principal_id = principal.id,
            status = %order.status,
            changes = ?events.iter().map(OrderEvent::event_type).collect::<Vec<_>>(),
            "Order details updated"
        );

        Ok(UpdatedOrder { order, events })
    }
}

/// One load → decide → save round against the current stored state.
async fn apply_update(
    store: Arc<dyn OrderStore>,
    order_id: i64,
    scope: Scope,
    command: OrderCommand,
) -> Result<(Order, Vec<OrderEvent>), AppError> {
    let mut order = store
        .find_order(order_id, scope)
        .await?
        .ok_or_else(AppError::order_not_found)?;

    let events = order.handle_command(&command, Utc::now())?;
    if events.is_empty() {
        return Ok((order, events));
    }

    for event in &events {
        order.apply_event(event);
    }
    let saved = store.save_order(&order).await?;

    Ok((saved, events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::factory::tests::{catering_request, regular_request, seeded_catalog};
    use crate::domain::order::OrderStatus;
    use crate::store::memory::InMemoryStore;
    use rust_decimal::Decimal;

    fn handler(store: &Arc<InMemoryStore>) -> OrderCommandHandler {
        handler_with_metrics(store, Arc::new(Metrics::new().unwrap()))
    }

    fn handler_with_metrics(store: &Arc<InMemoryStore>, metrics: Arc<Metrics>) -> OrderCommandHandler {
        OrderCommandHandler::new(store.clone(), store.clone(), metrics, RetryConfig::for_conflicts(3))
    }

    fn status(value: &str) -> DetailsUpdate {
        DetailsUpdate { status: Some(value.to_string()), ..Default::default() }
    }

    #[tokio::test]
    async fn test_create_persists_order_and_items() {
        let store = Arc::new(seeded_catalog());
        let created = handler(&store)
            .create_order(&Principal::customer(10), &regular_request())
            .await
            .unwrap();

        assert_eq!(created.order.client_id, 10);
        assert_eq!(created.order.total_amount, Decimal::new(2000, 2));
        assert_eq!(created.order.status, OrderStatus::Pending);
        assert_eq!(store.order_count(), 1);
        assert_eq!(store.line_item_count(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_price_survives_catalog_change() {
        let store = Arc::new(seeded_catalog());
        let created = handler(&store)
            .create_order(&Principal::customer(10), &regular_request())
            .await
            .unwrap();

        store.set_price(5, Decimal::new(9900, 2));

        let items = store.line_items(created.order.id).await.unwrap();
        assert_eq!(items[0].unit_price, Decimal::new(1000, 2));
        let order = store
            .find_order(created.order.id, Scope::All)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.total_amount, Decimal::new(2000, 2));
    }

    #[tokio::test]
    async fn test_failed_creation_writes_nothing() {
        let store = Arc::new(seeded_catalog());
        let mut request = catering_request();
        request.event_date = Some("2025-13-45".to_string());

        let result = handler(&store).create_order(&Principal::customer(10), &request).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(store.order_count(), 0);
        assert_eq!(store.line_item_count(), 0);
    }

    #[tokio::test]
    async fn test_only_successful_creations_are_timed() {
        let store = Arc::new(seeded_catalog());
        let metrics = Arc::new(Metrics::new().unwrap());
        let handler = handler_with_metrics(&store, metrics.clone());

        let mut invalid = catering_request();
        invalid.guest_count = None;
        assert!(handler.create_order(&Principal::customer(10), &invalid).await.is_err());
        assert_eq!(metrics.order_creation_duration.get_sample_count(), 0);

        handler
            .create_order(&Principal::customer(10), &catering_request())
            .await
            .unwrap();
        assert_eq!(metrics.order_creation_duration.get_sample_count(), 1);
        assert_eq!(metrics.orders_created.with_label_values(&["catering"]).get(), 1);
    }

    #[tokio::test]
    async fn test_order_number_collision_is_retried() {
        let store = Arc::new(seeded_catalog());
        store.fail_next_inserts_with_duplicate(2);

        let created = handler(&store)
            .create_order(&Principal::customer(10), &regular_request())
            .await
            .unwrap();

        assert!(created.order.order_number.starts_with("ORD-"));
        assert_eq!(store.order_count(), 1);
    }

    #[tokio::test]
    async fn test_collisions_exhausting_retries_surface_as_conflict() {
        let store = Arc::new(seeded_catalog());
        store.fail_next_inserts_with_duplicate(3);

        let result = handler(&store)
            .create_order(&Principal::customer(10), &regular_request())
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn test_owning_caterer_confirms_order() {
        let store = Arc::new(seeded_catalog());
        let handler = handler(&store);
        let created = handler
            .create_order(&Principal::customer(10), &regular_request())
            .await
            .unwrap();

        let updated = handler
            .update_details(&Principal::caterer(20, 1), created.order.id, status("confirmed"))
            .await
            .unwrap();

        assert_eq!(updated.updated_fields(), vec!["status", "confirmed_at"]);
        assert_eq!(updated.order.status, OrderStatus::Confirmed);
        assert!(updated.order.confirmed_at.is_some());
        assert_eq!(updated.order.version, created.order.version + 1);
    }

    #[tokio::test]
    async fn test_client_cannot_confirm_own_order() {
        let store = Arc::new(seeded_catalog());
        let handler = handler(&store);
        let created = handler
            .create_order(&Principal::customer(10), &regular_request())
            .await
            .unwrap();

        let result = handler
            .update_details(&Principal::customer(10), created.order.id, status("confirmed"))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_other_caterer_sees_not_found() {
        let store = Arc::new(seeded_catalog());
        let handler = handler(&store);
        let created = handler
            .create_order(&Principal::customer(10), &regular_request())
            .await
            .unwrap();

        let result = handler
            .update_details(&Principal::caterer(30, 2), created.order.id, status("confirmed"))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_status_leaves_order_untouched() {
        let store = Arc::new(seeded_catalog());
        let handler = handler(&store);
        let created = handler
            .create_order(&Principal::customer(10), &regular_request())
            .await
            .unwrap();

        let update = DetailsUpdate {
            final_total: Some(Decimal::new(5000, 2)),
            status: Some("teleported".to_string()),
            ..Default::default()
        };
        let result = handler.update_details(&Principal::admin(1), created.order.id, update).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let stored = store
            .find_order(created.order.id, Scope::All)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.final_total, None);
        assert_eq!(stored.version, created.order.version);
    }

    #[tokio::test]
    async fn test_version_conflict_reloads_and_retries() {
        let store = Arc::new(seeded_catalog());
        let handler = handler(&store);
        let created = handler
            .create_order(&Principal::customer(10), &regular_request())
            .await
            .unwrap();

        store.fail_next_saves_with_conflict(1);
        let updated = handler
            .update_details(&Principal::admin(1), created.order.id, status("preparing"))
            .await
            .unwrap();

        assert_eq!(updated.order.status, OrderStatus::Preparing);
    }
}
