use serde::Deserialize;

use crate::domain::access::{Principal, Scope};
use crate::domain::order::{Order, OrderKind, OrderStatus};
use crate::error::AppError;
use crate::store::{OrderFilter, OrderStore, Page};

// ============================================================================
// Access-Scoped Queries
// ============================================================================
//
// Every read goes through the principal's scope first; filters only narrow
// that scope further, so no filter combination can reach outside it.
//
// ============================================================================

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub order_type: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

pub fn scope_for(principal: &Principal) -> Result<Scope, AppError> {
    principal
        .scope()
        .ok_or_else(|| AppError::Forbidden("Caterer account required".to_string()))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl ListParams {
    pub fn into_filter(self, principal: &Principal) -> Result<OrderFilter, AppError> {
        let scope = scope_for(principal)?;

        let status = non_empty(self.status.as_deref())
            .map(str::parse::<OrderStatus>)
            .transpose()?;
        let kind = non_empty(self.order_type.as_deref())
            .map(str::parse::<OrderKind>)
            .transpose()?;

        let page = self.page.unwrap_or(DEFAULT_PAGE);
        if page < 1 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(AppError::Validation(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}"
            )));
        }

        Ok(OrderFilter { scope, status, kind, page, per_page })
    }
}

pub async fn list_visible(
    store: &dyn OrderStore,
    principal: &Principal,
    params: ListParams,
) -> Result<Page<Order>, AppError> {
    let filter = params.into_filter(principal)?;

    tracing::debug!(
        principal_id = principal.id,
        scope = ?filter.scope,
        status = ?filter.status,
        kind = ?filter.kind,
        page = filter.page,
        "Listing orders"
    );

    Ok(store.list_orders(&filter).await?)
}

/// Resolve one order inside the principal's scope. Orders outside it are
/// reported as missing, never as forbidden.
pub async fn find_visible(
    store: &dyn OrderStore,
    principal: &Principal,
    order_id: i64,
) -> Result<Order, AppError> {
    let scope = scope_for(principal)?;
    store
        .find_order(order_id, scope)
        .await?
        .ok_or_else(AppError::order_not_found)
}
