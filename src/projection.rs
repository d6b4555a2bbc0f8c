use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use futures_util::future::try_join_all;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::access::{can_read, OrderField, Role};
use crate::domain::order::{ClientInfo, Order, OrderLineItem, OrderStatus};
use crate::error::AppError;
use crate::store::{CatalogService, CatererAccount};

// ============================================================================
// Order Read Projector
// ============================================================================
//
// Renders orders for callers. The catering blocks are only attached when the
// order qualifies as catering; for regular orders they are absent from the
// output entirely, not null.
//
// ============================================================================

pub const UNKNOWN_ITEM_NAME: &str = "Unknown Item";

fn format_time(time: Option<NaiveTime>) -> Option<String> {
    time.map(|t| t.format("%H:%M").to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSummary {
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<String>,
    pub guest_count: Option<i32>,
}

impl EventSummary {
    fn of(order: &Order) -> Option<Self> {
        order.is_catering().then(|| EventSummary {
            event_name: order.event_name.clone(),
            event_date: order.event_date,
            event_time: format_time(order.event_time),
            guest_count: order.guest_count,
        })
    }
}

/// One row of the order list.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummaryView {
    pub id: i64,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub estimated_total: Decimal,
    pub created_at: DateTime<Utc>,
    pub is_catering: bool,
    pub caterer_business_name: Option<String>,
    pub client_email: Option<String>,
    #[serde(flatten)]
    pub event: Option<EventSummary>,
}

/// Body of a successful creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedOrderView {
    pub id: i64,
    pub order_number: String,
    pub order_type: &'static str,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub caterer_business_name: Option<String>,
    #[serde(flatten)]
    pub event: Option<EventSummary>,
}

impl CreatedOrderView {
    pub fn new(order: &Order, caterer: &CatererAccount) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            order_type: order.kind().as_str(),
            total_amount: order.total_amount,
            status: order.status,
            caterer_business_name: caterer.business_name.clone(),
            event: EventSummary::of(order),
        }
    }
}

/// Body of a successful details update.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatedOrderView {
    pub id: i64,
    pub order_number: String,
    pub status: OrderStatus,
    pub final_total: Option<Decimal>,
    pub deposit_paid: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for UpdatedOrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            status: order.status,
            final_total: order.final_total,
            deposit_paid: order.deposit_paid,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LineServings {
    pub servings_per_unit: i32,
    pub special_instructions: String,
    pub total_servings: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineItemView {
    pub id: i64,
    pub menu_item_id: i64,
    pub menu_item_name: String,
    pub menu_item_description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub customization: String,
    pub item_total: Decimal,
    #[serde(flatten)]
    pub servings: Option<LineServings>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CateringDetails {
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<String>,
    pub delivery_address: Option<String>,
    pub delivery_instructions: Option<String>,
    pub guest_count: Option<i32>,
    pub special_requirements: Vec<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
}

/// Full view of one order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetailView {
    pub id: i64,
    pub order_number: String,
    pub order_type: &'static str,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub estimated_total: Decimal,
    pub final_total: Option<Decimal>,
    pub deposit_paid: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub caterer_business_name: Option<String>,
    pub client_info: ClientInfo,
    pub delivery_location: Option<String>,
    pub dietary_requirements: Vec<String>,
    pub order_items: Vec<LineItemView>,
    #[serde(flatten)]
    pub catering: Option<CateringDetails>,
}

pub struct OrderProjector<'a> {
    catalog: &'a dyn CatalogService,
}

impl<'a> OrderProjector<'a> {
    pub fn new(catalog: &'a dyn CatalogService) -> Self {
        Self { catalog }
    }

    async fn caterer_name(&self, caterer_id: i64) -> Result<Option<String>, AppError> {
        Ok(self
            .catalog
            .find_caterer(caterer_id)
            .await?
            .and_then(|caterer| caterer.business_name))
    }

    pub async fn summaries(&self, orders: &[Order]) -> Result<Vec<OrderSummaryView>, AppError> {
        let mut names: HashMap<i64, Option<String>> = HashMap::new();
        let mut views = Vec::with_capacity(orders.len());

        for order in orders {
            if !names.contains_key(&order.caterer_id) {
                let name = self.caterer_name(order.caterer_id).await?;
                names.insert(order.caterer_id, name);
            }

            views.push(OrderSummaryView {
                id: order.id,
                order_number: order.order_number.clone(),
                status: order.status,
                total_amount: order.total_amount,
                estimated_total: order.estimated_total,
                created_at: order.created_at,
                is_catering: order.is_catering(),
                caterer_business_name: names.get(&order.caterer_id).cloned().flatten(),
                client_email: order.resolved_metadata().client.email,
                event: EventSummary::of(order),
            });
        }

        Ok(views)
    }

    pub async fn detail(
        &self,
        role: Role,
        order: &Order,
        items: &[OrderLineItem],
    ) -> Result<OrderDetailView, AppError> {
        let catering = order.is_catering();
        let metadata = order.resolved_metadata();

        let menu_items = try_join_all(
            items.iter().map(|item| self.catalog.find_item_by_id(item.menu_item_id)),
        )
        .await?;

        let order_items = items
            .iter()
            .zip(menu_items)
            .map(|(item, menu_item)| LineItemView {
                id: item.id,
                menu_item_id: item.menu_item_id,
                menu_item_name: menu_item
                    .as_ref()
                    .map(|m| m.name.clone())
                    .unwrap_or_else(|| UNKNOWN_ITEM_NAME.to_string()),
                menu_item_description: menu_item
                    .and_then(|m| m.description)
                    .unwrap_or_default(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                customization: item.customization.clone(),
                item_total: item.line_total(),
                servings: catering.then(|| LineServings {
                    servings_per_unit: item.servings_per_unit,
                    special_instructions: item.special_instructions.clone(),
                    total_servings: item.total_servings(),
                }),
            })
            .collect();

        let catering_details = catering.then(|| CateringDetails {
            event_name: order.event_name.clone(),
            event_date: order.event_date,
            event_time: format_time(order.event_time),
            delivery_address: order.delivery_address.clone(),
            delivery_instructions: order
                .delivery_instructions
                .clone()
                .filter(|_| can_read(role, OrderField::DeliveryInstructions)),
            guest_count: order.guest_count,
            special_requirements: order.special_requirements.clone(),
            confirmed_at: order.confirmed_at,
            delivery_date: order.delivery_date,
        });

        Ok(OrderDetailView {
            id: order.id,
            order_number: order.order_number.clone(),
            order_type: order.kind().as_str(),
            status: order.status,
            total_amount: order.total_amount,
            estimated_total: order.estimated_total,
            final_total: order.final_total.filter(|_| can_read(role, OrderField::FinalTotal)),
            deposit_paid: Some(order.deposit_paid).filter(|_| can_read(role, OrderField::DepositPaid)),
            created_at: order.created_at,
            updated_at: order.updated_at,
            caterer_business_name: self.caterer_name(order.caterer_id).await?,
            client_info: metadata.client,
            delivery_location: metadata.delivery_location,
            dietary_requirements: metadata.dietary_requirements,
            order_items,
            catering: catering_details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::aggregate::tests::{catering_order, regular_order};
    use crate::domain::order::factory::tests::seeded_catalog;

    fn line(id: i64, menu_item_id: i64, quantity: i32, servings: i32) -> OrderLineItem {
        OrderLineItem {
            id,
            order_id: 1,
            menu_item_id,
            quantity,
            unit_price: Decimal::new(1000, 2),
            customization: String::new(),
            servings_per_unit: servings,
            special_instructions: String::new(),
        }
    }

    #[tokio::test]
    async fn test_regular_projection_omits_catering_block() {
        let store = seeded_catalog();
        let mut order = regular_order();
        order.notes = Some("CLIENT: John Doe\nDELIVERY: 123 Main St\nDIETARY: vegan".to_string());

        let view = OrderProjector::new(&store)
            .detail(Role::Customer, &order, &[line(1, 5, 2, 1)])
            .await
            .unwrap();
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["order_type"], "regular");
        assert_eq!(json["total_amount"], "20.00");
        assert_eq!(json["client_info"]["full_name"], "John Doe");
        assert_eq!(json["delivery_location"], "123 Main St");
        assert_eq!(json["dietary_requirements"][0], "vegan");
        assert_eq!(json["caterer_business_name"], "Casa Catering");
        assert!(json.get("event_name").is_none());
        assert!(json.get("guest_count").is_none());
        assert!(json["order_items"][0].get("total_servings").is_none());
        assert_eq!(json["order_items"][0]["item_total"], "20.00");
    }

    #[tokio::test]
    async fn test_catering_projection_includes_event_block() {
        let store = seeded_catalog();
        let order = catering_order();

        let view = OrderProjector::new(&store)
            .detail(Role::Caterer, &order, &[line(1, 6, 5, 10)])
            .await
            .unwrap();
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["order_type"], "catering");
        assert_eq!(json["guest_count"], 50);
        assert_eq!(json["event_date"], "2025-11-15");
        assert_eq!(json["event_time"], "12:00");
        assert_eq!(json["order_items"][0]["total_servings"], 50);
        assert_eq!(json["order_items"][0]["menu_item_name"], "Veggie Platter");
    }

    #[tokio::test]
    async fn test_deleted_menu_item_renders_placeholder() {
        let store = seeded_catalog();
        store.remove_menu_item(5);

        let view = OrderProjector::new(&store)
            .detail(Role::Admin, &regular_order(), &[line(1, 5, 1, 1)])
            .await
            .unwrap();

        assert_eq!(view.order_items[0].menu_item_name, UNKNOWN_ITEM_NAME);
        assert_eq!(view.order_items[0].menu_item_description, "");
    }

    #[tokio::test]
    async fn test_summaries_share_caterer_lookups() {
        let store = seeded_catalog();
        let mut first = regular_order();
        first.metadata = Some(crate::domain::order::OrderMetadata {
            client: ClientInfo {
                email: Some("john@example.com".to_string()),
                ..Default::default()
            },
            ..Default::default()
        });
        let second = catering_order();

        let views = OrderProjector::new(&store)
            .summaries(&[first, second])
            .await
            .unwrap();

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].client_email.as_deref(), Some("john@example.com"));
        assert!(views[0].event.is_none());
        assert!(views[1].is_catering);
        assert_eq!(views[1].caterer_business_name.as_deref(), Some("Casa Catering"));
    }
}
