use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::domain::access::Principal;
use crate::domain::order::{CartLine, CreateOrderRequest, DetailsUpdate, OrderError, PricingCalculator};
use crate::error::AppError;
use crate::metrics::Metrics;
use crate::projection::{CreatedOrderView, OrderProjector, UpdatedOrderView};
use crate::query::{find_visible, list_visible, ListParams};

use super::AppState;

/// Count the failure under `operation` before it is rendered.
fn observe<T>(metrics: &Metrics, operation: &str, result: Result<T, AppError>) -> Result<T, AppError> {
    if let Err(error) = &result {
        metrics.record_failure(operation, error.kind());
        tracing::warn!(operation, kind = error.kind(), error = %error, "Order request failed");
    }
    result
}

pub async fn list_orders(
    state: web::Data<AppState>,
    principal: Principal,
    params: web::Query<ListParams>,
) -> Result<HttpResponse, AppError> {
    let result = list_page(&state, &principal, params.into_inner()).await;
    observe(&state.metrics, "list_orders", result)
}

async fn list_page(
    state: &AppState,
    principal: &Principal,
    params: ListParams,
) -> Result<HttpResponse, AppError> {
    let page = list_visible(state.store.as_ref(), principal, params).await?;
    let orders = OrderProjector::new(state.catalog.as_ref())
        .summaries(&page.items)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "orders": orders,
        "total": page.total,
        "pages": page.pages(),
        "current_page": page.page,
    })))
}

pub async fn create_order(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let result = state.commands.create_order(&principal, &body).await.map(|created| {
        HttpResponse::Created().json(serde_json::json!({
            "message": "Order created successfully",
            "order": CreatedOrderView::new(&created.order, &created.caterer),
        }))
    });

    observe(&state.metrics, "create_order", result)
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub caterer_id: Option<i64>,
    #[serde(default)]
    pub order_items: Option<Vec<CartLine>>,
}

pub async fn calculate_total(
    state: web::Data<AppState>,
    body: web::Json<PreviewRequest>,
) -> Result<HttpResponse, AppError> {
    let result = preview(&state, &body).await;
    observe(&state.metrics, "calculate_total", result)
}

async fn preview(state: &AppState, request: &PreviewRequest) -> Result<HttpResponse, AppError> {
    let (Some(caterer_id), Some(lines)) = (request.caterer_id, request.order_items.as_deref()) else {
        return Err(OrderError::MissingCartFields.into());
    };

    let preview = PricingCalculator::new(state.catalog.as_ref())
        .preview(caterer_id, lines)
        .await?;
    if !preview.skipped_items.is_empty() {
        tracing::debug!(caterer_id, skipped = ?preview.skipped_items, "Preview skipped unsellable items");
    }

    Ok(HttpResponse::Ok().json(preview))
}

pub async fn order_details(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let result = detail(&state, &principal, path.into_inner()).await;
    observe(&state.metrics, "order_details", result)
}

async fn detail(state: &AppState, principal: &Principal, order_id: i64) -> Result<HttpResponse, AppError> {
    let order = find_visible(state.store.as_ref(), principal, order_id).await?;
    let items = state.store.line_items(order.id).await?;
    let view = OrderProjector::new(state.catalog.as_ref())
        .detail(principal.role, &order, &items)
        .await?;

    Ok(HttpResponse::Ok().json(view))
}

pub async fn update_order_details(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    body: web::Json<DetailsUpdate>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let result = state
        .commands
        .update_details(&principal, order_id, body.into_inner())
        .await
        .map(|updated| {
            HttpResponse::Ok().json(serde_json::json!({
                "message": "Order updated successfully",
                "updated_fields": updated.updated_fields(),
                "order": UpdatedOrderView::from(&updated.order),
            }))
        });

    observe(&state.metrics, "update_details", result)
}
