use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::store::{CatalogService, CatererAccount};
use super::errors::{DomainError, OrderError};
use super::metadata::{ClientInfo, OrderMetadata};
use super::pricing::{CartLine, PricingCalculator};
use super::value_objects::{check_amount, NewLineItem, OrderKind, OrderStatus};

// ============================================================================
// Order Factory
// ============================================================================
//
// Turns a submitted cart into a fully validated, priced order ready to be
// written. Every check that can fail runs here, before the store is touched.
//
// ============================================================================

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub caterer_id: Option<i64>,
    #[serde(default)]
    pub order_type: Option<String>,
    #[serde(default)]
    pub client_info: ClientInfo,
    #[serde(default)]
    pub order_items: Option<Vec<CartLine>>,
    #[serde(default)]
    pub delivery_location: Option<String>,
    #[serde(default)]
    pub dietary_requirements: Vec<String>,
    #[serde(default)]
    pub special_requirements: Vec<String>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub guest_count: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Event attributes, present only on catering orders.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDetails {
    pub name: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub guest_count: i32,
    pub special_requirements: Vec<String>,
    pub delivery_address: Option<String>,
}

/// A validated order that has not been written yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_number: String,
    pub kind: OrderKind,
    pub client_id: i64,
    pub caterer_id: i64,
    pub total_amount: Decimal,
    pub estimated_total: Decimal,
    pub status: OrderStatus,
    pub event: Option<EventDetails>,
    pub notes: Option<String>,
    pub metadata: OrderMetadata,
    pub items: Vec<NewLineItem>,
}

impl NewOrder {
    /// Give the order a fresh number, e.g. after a uniqueness collision.
    pub fn renumber(&mut self) {
        self.order_number = generate_order_number(self.kind);
    }
}

/// `ORD-` or `CAT-` followed by eight upper-case hex digits.
pub fn generate_order_number(kind: OrderKind) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}-{}", kind.order_number_prefix(), hex[..8].to_uppercase())
}

pub struct OrderFactory<'a> {
    catalog: &'a dyn CatalogService,
}

impl<'a> OrderFactory<'a> {
    pub fn new(catalog: &'a dyn CatalogService) -> Self {
        Self { catalog }
    }

    pub async fn build(
        &self,
        client_id: i64,
        request: &CreateOrderRequest,
    ) -> Result<(NewOrder, CatererAccount), DomainError> {
        let (Some(caterer_id), Some(lines)) = (request.caterer_id, request.order_items.as_deref())
        else {
            return Err(OrderError::MissingCartFields.into());
        };
        if lines.is_empty() {
            return Err(OrderError::EmptyItems.into());
        }

        let kind = match request.order_type.as_deref() {
            Some(value) => value.parse::<OrderKind>()?,
            None => OrderKind::Regular,
        };

        let caterer = self
            .catalog
            .find_caterer(caterer_id)
            .await?
            .ok_or(OrderError::CatererNotFound)?;

        let cart = PricingCalculator::new(self.catalog).price(caterer_id, lines).await?;
        for line in &cart.lines {
            check_amount("item_total", line.item_total)?;
        }
        check_amount("total_amount", cart.total)?;

        let event = match kind {
            OrderKind::Catering => Some(event_details(request)?),
            OrderKind::Regular => None,
        };

        let mut items = Vec::with_capacity(lines.len());
        for (line, priced) in lines.iter().zip(&cart.lines) {
            let servings_per_unit = line.servings_per_unit.unwrap_or(1);
            if servings_per_unit < 1 {
                return Err(OrderError::InvalidServings(servings_per_unit).into());
            }

            items.push(NewLineItem {
                menu_item_id: priced.menu_item_id,
                quantity: priced.quantity,
                unit_price: priced.unit_price,
                customization: line.customization.clone().unwrap_or_default(),
                servings_per_unit,
                special_instructions: line.special_instructions.clone().unwrap_or_default(),
            });
        }

        let metadata = metadata_for(request, kind);
        let notes = Some(metadata.encode(kind)).filter(|text| !text.is_empty());

        let order = NewOrder {
            order_number: generate_order_number(kind),
            kind,
            client_id,
            caterer_id,
            total_amount: cart.total,
            estimated_total: cart.total,
            status: OrderStatus::Pending,
            event,
            notes,
            metadata,
            items,
        };

        Ok((order, caterer))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn event_details(request: &CreateOrderRequest) -> Result<EventDetails, OrderError> {
    let name = non_blank(request.event_name.as_deref())
        .ok_or(OrderError::MissingEventField("event_name"))?;
    let date = non_blank(request.event_date.as_deref())
        .ok_or(OrderError::MissingEventField("event_date"))?;
    let guest_count = request
        .guest_count
        .ok_or(OrderError::MissingEventField("guest_count"))?;
    if guest_count < 1 {
        return Err(OrderError::InvalidGuestCount);
    }

    let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
        .map_err(|_| OrderError::InvalidDateFormat)?;
    let time = non_blank(request.event_time.as_deref())
        .map(|time| NaiveTime::parse_from_str(&time, TIME_FORMAT))
        .transpose()
        .map_err(|_| OrderError::InvalidDateFormat)?;

    Ok(EventDetails {
        name,
        date,
        time,
        guest_count,
        special_requirements: request.special_requirements.clone(),
        delivery_address: non_blank(request.delivery_location.as_deref()),
    })
}

fn metadata_for(request: &CreateOrderRequest, kind: OrderKind) -> OrderMetadata {
    let client = ClientInfo {
        full_name: non_blank(request.client_info.full_name.as_deref()),
        email: non_blank(request.client_info.email.as_deref()),
        phone_number: non_blank(request.client_info.phone_number.as_deref()),
    };

    let mut metadata = OrderMetadata {
        client,
        delivery_location: non_blank(request.delivery_location.as_deref()),
        notes: non_blank(request.notes.as_deref()),
        ..Default::default()
    };

    match kind {
        OrderKind::Regular => {
            metadata.dietary_requirements = request.dietary_requirements.clone();
        }
        OrderKind::Catering => {
            metadata.special_requirements = request.special_requirements.clone();
            metadata.event_name = non_blank(request.event_name.as_deref());
            metadata.event_type = non_blank(request.event_type.as_deref());
            metadata.event_date = non_blank(request.event_date.as_deref());
            metadata.event_time = non_blank(request.event_time.as_deref());
            metadata.guest_count = request.guest_count;
        }
    }

    metadata
}
