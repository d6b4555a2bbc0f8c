use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::domain::access::Scope;
use crate::domain::order::aggregate::tests as aggregate_tests;
use crate::domain::order::{NewOrder, Order, OrderKind, OrderLineItem};
use super::{CatalogService, CatererAccount, MenuItem, OrderFilter, OrderStore, Page, StoreError};

// ============================================================================
// In-Memory Store - test double for both storage seams
// ============================================================================
//
// One mutex guards all state, so every trait call is atomic. Failure
// injection counters let tests drive the retry paths.
//
// ============================================================================

#[derive(Default)]
struct State {
    caterers: BTreeMap<i64, CatererAccount>,
    menu_items: BTreeMap<i64, MenuItem>,
    orders: BTreeMap<i64, Order>,
    line_items: Vec<OrderLineItem>,
    order_numbers: HashSet<String>,
    next_order_id: i64,
    next_item_id: i64,
    duplicate_inserts: u32,
    conflicting_saves: u32,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("in-memory store lock poisoned")
    }

    pub fn add_caterer(&self, id: i64, business_name: &str) {
        self.state().caterers.insert(
            id,
            CatererAccount { id, business_name: Some(business_name.to_string()) },
        );
    }

    pub fn add_menu_item(&self, id: i64, caterer_id: i64, name: &str, price: Decimal, is_active: bool) {
        self.state().menu_items.insert(
            id,
            MenuItem {
                id,
                caterer_id,
                name: name.to_string(),
                description: Some(format!("{name} from the house menu")),
                price,
                is_active,
            },
        );
    }

    pub fn set_price(&self, item_id: i64, price: Decimal) {
        if let Some(item) = self.state().menu_items.get_mut(&item_id) {
            item.price = price;
        }
    }

    pub fn remove_menu_item(&self, item_id: i64) {
        self.state().menu_items.remove(&item_id);
    }

    pub fn order_count(&self) -> usize {
        self.state().orders.len()
    }

    pub fn line_item_count(&self) -> usize {
        self.state().line_items.len()
    }

    /// Make the next `count` inserts fail as if the order number was taken.
    pub fn fail_next_inserts_with_duplicate(&self, count: u32) {
        self.state().duplicate_inserts = count;
    }

    /// Make the next `count` saves fail as if another writer got there first.
    pub fn fail_next_saves_with_conflict(&self, count: u32) {
        self.state().conflicting_saves = count;
    }
}

fn matches_filter(order: &Order, filter: &OrderFilter) -> bool {
    filter.scope.permits(order.client_id, order.caterer_id)
        && filter.status.map_or(true, |status| order.status == status)
        && filter.kind.map_or(true, |kind| order.kind() == kind)
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, new: &NewOrder) -> Result<(Order, Vec<OrderLineItem>), StoreError> {
        let mut state = self.state();

        if state.duplicate_inserts > 0 {
            state.duplicate_inserts -= 1;
            return Err(StoreError::Duplicate("orders_order_number_key".to_string()));
        }
        if state.order_numbers.contains(&new.order_number) {
            return Err(StoreError::Duplicate("orders_order_number_key".to_string()));
        }

        state.next_order_id += 1;
        let id = state.next_order_id;
        let now = Utc::now();
        let event = new.event.as_ref();

        let order = Order {
            id,
            order_number: new.order_number.clone(),
            version: 1,
            client_id: new.client_id,
            caterer_id: new.caterer_id,
            total_amount: new.total_amount,
            estimated_total: new.estimated_total,
            final_total: None,
            deposit_paid: Decimal::ZERO,
            event_name: event.map(|e| e.name.clone()),
            event_date: event.map(|e| e.date),
            event_time: event.and_then(|e| e.time),
            guest_count: event.map(|e| e.guest_count),
            special_requirements: event.map(|e| e.special_requirements.clone()).unwrap_or_default(),
            delivery_address: event.and_then(|e| e.delivery_address.clone()),
            delivery_instructions: None,
            status: new.status,
            notes: new.notes.clone(),
            metadata: Some(new.metadata.clone()),
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            delivery_date: None,
        };

        let mut items = Vec::with_capacity(new.items.len());
        for item in &new.items {
            state.next_item_id += 1;
            items.push(OrderLineItem {
                id: state.next_item_id,
                order_id: id,
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                customization: item.customization.clone(),
                servings_per_unit: item.servings_per_unit,
                special_instructions: item.special_instructions.clone(),
            });
        }

        state.order_numbers.insert(order.order_number.clone());
        state.orders.insert(id, order.clone());
        state.line_items.extend(items.iter().cloned());

        Ok((order, items))
    }

    async fn find_order(&self, id: i64, scope: Scope) -> Result<Option<Order>, StoreError> {
        Ok(self
            .state()
            .orders
            .get(&id)
            .filter(|order| scope.permits(order.client_id, order.caterer_id))
            .cloned())
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Page<Order>, StoreError> {
        let state = self.state();

        let mut matching: Vec<&Order> = state
            .orders
            .values()
            .filter(|order| matches_filter(order, filter))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.per_page as usize)
            .cloned()
            .collect();

        Ok(Page { items, total, page: filter.page, per_page: filter.per_page })
    }

    async fn line_items(&self, order_id: i64) -> Result<Vec<OrderLineItem>, StoreError> {
        Ok(self
            .state()
            .line_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn save_order(&self, order: &Order) -> Result<Order, StoreError> {
        let mut state = self.state();

        let conflict = StoreError::VersionConflict { order_id: order.id, expected: order.version };
        if state.conflicting_saves > 0 {
            state.conflicting_saves -= 1;
            return Err(conflict);
        }

        let stored = state.orders.get_mut(&order.id).ok_or(conflict)?;
        if stored.version != order.version {
            return Err(StoreError::VersionConflict { order_id: order.id, expected: order.version });
        }

        stored.status = order.status;
        stored.final_total = order.final_total;
        stored.deposit_paid = order.deposit_paid;
        stored.delivery_instructions = order.delivery_instructions.clone();
        stored.confirmed_at = order.confirmed_at;
        stored.delivery_date = order.delivery_date;
        stored.updated_at = order.updated_at;
        stored.version += 1;

        Ok(stored.clone())
    }
}

#[async_trait]
impl CatalogService for InMemoryStore {
    async fn find_item(&self, caterer_id: i64, item_id: i64) -> Result<Option<MenuItem>, StoreError> {
        Ok(self
            .state()
            .menu_items
            .get(&item_id)
            .filter(|item| item.caterer_id == caterer_id)
            .cloned())
    }

    async fn find_item_by_id(&self, item_id: i64) -> Result<Option<MenuItem>, StoreError> {
        Ok(self.state().menu_items.get(&item_id).cloned())
    }

    async fn find_caterer(&self, caterer_id: i64) -> Result<Option<CatererAccount>, StoreError> {
        Ok(self.state().caterers.get(&caterer_id).cloned())
    }
}

/// Seed an order directly, bypassing the factory. Used to place orders with
/// chosen owners and kinds in scope tests.
pub fn seed_order(store: &InMemoryStore, client_id: i64, caterer_id: i64, kind: OrderKind) -> Order {
    let mut state = store.state();
    state.next_order_id += 1;
    let id = state.next_order_id;

    let mut order = match kind {
        OrderKind::Regular => aggregate_tests::regular_order(),
        OrderKind::Catering => aggregate_tests::catering_order(),
    };
    order.id = id;
    order.order_number = format!("{}-{:08X}", kind.order_number_prefix(), id);
    order.client_id = client_id;
    order.caterer_id = caterer_id;
    order.created_at = Utc::now() + chrono::Duration::seconds(id);
    order.updated_at = order.created_at;

    state.orders.insert(id, order.clone());
    order
}
