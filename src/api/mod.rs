mod handlers;
mod principal;

use std::sync::Arc;

use actix_web::web;

use crate::domain::order::OrderCommandHandler;
use crate::error::AppError;
use crate::metrics::{health_handler, metrics_handler, Metrics};
use crate::store::{CatalogService, OrderStore};
use crate::utils::RetryConfig;

// ============================================================================
// HTTP API - order lifecycle endpoints
// ============================================================================
//
//   GET   /orders                   scoped, filtered, paginated list
//   POST  /orders                   create an order for the caller
//   POST  /orders/calculate-total   pricing preview, no principal needed
//   GET   /orders/{id}/details      full projection
//   PATCH /orders/{id}/details      caterer/admin revision
//
// ============================================================================

/// Shared per-process state handed to every worker.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OrderStore>,
    pub catalog: Arc<dyn CatalogService>,
    pub commands: Arc<OrderCommandHandler>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogService>,
        metrics: Arc<Metrics>,
        retry: RetryConfig,
    ) -> Self {
        let commands = Arc::new(OrderCommandHandler::new(
            store.clone(),
            catalog.clone(),
            metrics.clone(),
            retry,
        ));
        Self { store, catalog, commands, metrics }
    }
}

/// Mount the order API together with /metrics and /health.
pub fn configure(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        let metrics = state.metrics.clone();

        cfg.app_data(web::Data::new(state))
            .app_data(web::Data::new(metrics))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::Validation(format!("Invalid request body: {err}")).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                AppError::Validation(format!("Invalid query string: {err}")).into()
            }))
            .service(
                web::scope("/orders")
                    .route("", web::get().to(handlers::list_orders))
                    .route("", web::post().to(handlers::create_order))
                    .route("/calculate-total", web::post().to(handlers::calculate_total))
                    .route("/{order_id}/details", web::get().to(handlers::order_details))
                    .route("/{order_id}/details", web::patch().to(handlers::update_order_details)),
            )
            .route("/metrics", web::get().to(metrics_handler))
            .route("/health", web::get().to(health_handler));
    }
}
