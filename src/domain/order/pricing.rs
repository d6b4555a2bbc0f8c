use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::store::{CatalogService, MenuItem};
use super::errors::{DomainError, OrderError};

// ============================================================================
// Pricing Calculator
// ============================================================================
//
// Prices a cart from the caterer's catalog as it is right now. Nothing is
// written; the same cart against the same catalog always prices the same.
//
// ============================================================================

/// One requested line as submitted by the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartLine {
    #[serde(default)]
    pub menu_item_id: Option<i64>,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub customization: Option<String>,
    #[serde(default)]
    pub servings_per_unit: Option<i32>,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

#[cfg(test)]
impl CartLine {
    pub fn new(menu_item_id: i64, quantity: i32) -> Self {
        Self {
            menu_item_id: Some(menu_item_id),
            quantity: Some(quantity),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedLine {
    pub menu_item_id: i64,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub item_total: Decimal,
}

impl PricedLine {
    fn new(item: &MenuItem, quantity: i32) -> Self {
        Self {
            menu_item_id: item.id,
            name: item.name.clone(),
            quantity,
            unit_price: item.price,
            item_total: item.price * Decimal::from(quantity),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub total: Decimal,
}

/// Lenient pricing result for the unauthenticated preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePreview {
    pub estimated_total: Decimal,
    pub items_breakdown: Vec<PricedLine>,
    pub item_count: usize,
    pub skipped_items: Vec<i64>,
}

pub struct PricingCalculator<'a> {
    catalog: &'a dyn CatalogService,
}

impl<'a> PricingCalculator<'a> {
    pub fn new(catalog: &'a dyn CatalogService) -> Self {
        Self { catalog }
    }

    /// Price every line or fail on the first line that cannot be sold.
    pub async fn price(&self, caterer_id: i64, lines: &[CartLine]) -> Result<PricedCart, DomainError> {
        let mut priced = Vec::with_capacity(lines.len());
        let mut total = Decimal::ZERO;

        for line in lines {
            let (Some(item_id), Some(quantity)) = (line.menu_item_id, line.quantity) else {
                return Err(OrderError::IncompleteLine.into());
            };
            if quantity < 1 {
                return Err(OrderError::InvalidQuantity(quantity).into());
            }

            let item = self
                .catalog
                .find_item(caterer_id, item_id)
                .await?
                .ok_or(OrderError::ItemNotFound(item_id))?;
            if !item.is_active {
                return Err(OrderError::ItemUnavailable(item.name).into());
            }

            let line = PricedLine::new(&item, quantity);
            total += line.item_total;
            priced.push(line);
        }

        Ok(PricedCart { lines: priced, total })
    }

    /// Price what can be priced. Incomplete, unknown or inactive lines are
    /// left out of the total instead of failing the preview.
    pub async fn preview(&self, caterer_id: i64, lines: &[CartLine]) -> Result<PricePreview, DomainError> {
        let mut breakdown = Vec::new();
        let mut skipped = Vec::new();
        let mut total = Decimal::ZERO;

        for line in lines {
            let (Some(item_id), Some(quantity)) = (line.menu_item_id, line.quantity) else {
                continue;
            };

            match self.catalog.find_item(caterer_id, item_id).await? {
                Some(item) if item.is_active && quantity >= 1 => {
                    let line = PricedLine::new(&item, quantity);
                    total += line.item_total;
                    breakdown.push(line);
                }
                _ => skipped.push(item_id),
            }
        }

        Ok(PricePreview {
            estimated_total: total,
            item_count: breakdown.len(),
            items_breakdown: breakdown,
            skipped_items: skipped,
        })
    }
}
