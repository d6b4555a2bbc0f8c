use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, QueryBuilder};

use crate::domain::access::Scope;
use crate::domain::order::{NewOrder, Order, OrderKind, OrderLineItem, OrderMetadata, OrderStatus};
use super::{CatalogService, CatererAccount, MenuItem, OrderFilter, OrderStore, Page, StoreError};

// ============================================================================
// PostgreSQL Order Store
// ============================================================================
//
// Responsibilities:
// 1. Insert an order and its line items in one transaction
// 2. Scope every read by the caller's visibility
// 3. Optimistic concurrency on updates via the `version` column
//
// ============================================================================

const ORDER_COLUMNS: &str = "id, order_number, version, client_id, caterer_id, \
     total_amount, estimated_total, final_total, deposit_paid, \
     event_name, event_date, event_time, guest_count, special_requirements, \
     delivery_address, delivery_instructions, status, notes, metadata, \
     created_at, updated_at, confirmed_at, delivery_date";

const LINE_ITEM_COLUMNS: &str = "id, order_id, menu_item_id, quantity, unit_price, \
     customization, servings_per_unit, special_instructions";

const CATERING_PREDICATE: &str =
    "(event_name IS NOT NULL AND event_date IS NOT NULL AND guest_count IS NOT NULL)";

#[derive(FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    version: i64,
    client_id: i64,
    caterer_id: i64,
    total_amount: Decimal,
    estimated_total: Decimal,
    final_total: Option<Decimal>,
    deposit_paid: Decimal,
    event_name: Option<String>,
    event_date: Option<NaiveDate>,
    event_time: Option<NaiveTime>,
    guest_count: Option<i32>,
    special_requirements: Json<Vec<String>>,
    delivery_address: Option<String>,
    delivery_instructions: Option<String>,
    status: String,
    notes: Option<String>,
    metadata: Option<Json<OrderMetadata>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
    delivery_date: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|_| StoreError::Corrupt(format!("order {} has status '{}'", row.id, row.status)))?;

        Ok(Order {
            id: row.id,
            order_number: row.order_number,
            version: row.version,
            client_id: row.client_id,
            caterer_id: row.caterer_id,
            total_amount: row.total_amount,
            estimated_total: row.estimated_total,
            final_total: row.final_total,
            deposit_paid: row.deposit_paid,
            event_name: row.event_name,
            event_date: row.event_date,
            event_time: row.event_time,
            guest_count: row.guest_count,
            special_requirements: row.special_requirements.0,
            delivery_address: row.delivery_address,
            delivery_instructions: row.delivery_instructions,
            status,
            notes: row.notes,
            metadata: row.metadata.map(|json| json.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
            confirmed_at: row.confirmed_at,
            delivery_date: row.delivery_date,
        })
    }
}

#[derive(FromRow)]
struct LineItemRow {
    id: i64,
    order_id: i64,
    menu_item_id: i64,
    quantity: i32,
    unit_price: Decimal,
    customization: String,
    servings_per_unit: i32,
    special_instructions: String,
}

impl From<LineItemRow> for OrderLineItem {
    fn from(row: LineItemRow) -> Self {
        OrderLineItem {
            id: row.id,
            order_id: row.order_id,
            menu_item_id: row.menu_item_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            customization: row.customization,
            servings_per_unit: row.servings_per_unit,
            special_instructions: row.special_instructions,
        }
    }
}

/// Unique violations become `Duplicate` so the caller can retry.
fn classify(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            let constraint = db_error.constraint().unwrap_or("unknown").to_string();
            return StoreError::Duplicate(constraint);
        }
    }
    StoreError::Database(error)
}

fn push_conditions(builder: &mut QueryBuilder<'_, Postgres>, scope: Scope, filter: Option<&OrderFilter>) {
    builder.push(" WHERE TRUE");

    match scope {
        Scope::Client(client_id) => {
            builder.push(" AND client_id = ").push_bind(client_id);
        }
        Scope::Caterer(caterer_id) => {
            builder.push(" AND caterer_id = ").push_bind(caterer_id);
        }
        Scope::All => {}
    }

    let Some(filter) = filter else {
        return;
    };

    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }

    match filter.kind {
        Some(OrderKind::Catering) => {
            builder.push(" AND ").push(CATERING_PREDICATE);
        }
        Some(OrderKind::Regular) => {
            builder.push(" AND NOT ").push(CATERING_PREDICATE);
        }
        None => {}
    }
}

#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert_order(&self, new: &NewOrder) -> Result<(Order, Vec<OrderLineItem>), StoreError> {
        let event = new.event.as_ref();
        let special_requirements = event
            .map(|e| e.special_requirements.clone())
            .unwrap_or_default();

        // Dropping the transaction on any early return rolls back every insert
        let mut tx = self.pool.begin().await?;

        let insert_order = format!(
            "INSERT INTO orders (
                order_number, client_id, caterer_id, total_amount, estimated_total,
                deposit_paid, event_name, event_date, event_time, guest_count,
                special_requirements, delivery_address, status, notes, metadata
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {ORDER_COLUMNS}"
        );

        let row: OrderRow = sqlx::query_as(&insert_order)
            .bind(&new.order_number)
            .bind(new.client_id)
            .bind(new.caterer_id)
            .bind(new.total_amount)
            .bind(new.estimated_total)
            .bind(Decimal::ZERO)
            .bind(event.map(|e| e.name.as_str()))
            .bind(event.map(|e| e.date))
            .bind(event.and_then(|e| e.time))
            .bind(event.map(|e| e.guest_count))
            .bind(Json(&special_requirements))
            .bind(event.and_then(|e| e.delivery_address.as_deref()))
            .bind(new.status.as_str())
            .bind(new.notes.as_deref())
            .bind(Json(&new.metadata))
            .fetch_one(&mut *tx)
            .await
            .map_err(classify)?;
        let order = Order::try_from(row)?;

        let insert_item = format!(
            "INSERT INTO order_items (
                order_id, menu_item_id, quantity, unit_price,
                customization, servings_per_unit, special_instructions
             ) VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {LINE_ITEM_COLUMNS}"
        );

        let mut items = Vec::with_capacity(new.items.len());
        for item in &new.items {
            let row: LineItemRow = sqlx::query_as(&insert_item)
                .bind(order.id)
                .bind(item.menu_item_id)
                .bind(item.quantity)
                .bind(item.unit_price)
                .bind(&item.customization)
                .bind(item.servings_per_unit)
                .bind(&item.special_instructions)
                .fetch_one(&mut *tx)
                .await
                .map_err(classify)?;
            items.push(OrderLineItem::from(row));
        }

        tx.commit().await?;

        tracing::debug!(
            order_id = order.id,
            order_number = %order.order_number,
            item_count = items.len(),
            "Inserted order with line items"
        );

        Ok((order, items))
    }

    async fn find_order(&self, id: i64, scope: Scope) -> Result<Option<Order>, StoreError> {
        let mut builder = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
        push_conditions(&mut builder, scope, None);
        builder.push(" AND id = ").push_bind(id);

        let row: Option<OrderRow> = builder.build_query_as().fetch_optional(&self.pool).await?;
        row.map(Order::try_from).transpose()
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Page<Order>, StoreError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM orders");
        push_conditions(&mut count, filter.scope, Some(filter));
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
        push_conditions(&mut select, filter.scope, Some(filter));
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(filter.per_page))
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let rows: Vec<OrderRow> = select.build_query_as().fetch_all(&self.pool).await?;
        let items = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page { items, total, page: filter.page, per_page: filter.per_page })
    }

    async fn line_items(&self, order_id: i64) -> Result<Vec<OrderLineItem>, StoreError> {
        let query = format!(
            "SELECT {LINE_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id ASC"
        );
        let rows: Vec<LineItemRow> = sqlx::query_as(&query)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(OrderLineItem::from).collect())
    }

    async fn save_order(&self, order: &Order) -> Result<Order, StoreError> {
        let query = format!(
            "UPDATE orders SET
                status = $1, final_total = $2, deposit_paid = $3,
                delivery_instructions = $4, confirmed_at = $5, delivery_date = $6,
                updated_at = $7, version = version + 1
             WHERE id = $8 AND version = $9
             RETURNING {ORDER_COLUMNS}"
        );

        let row: Option<OrderRow> = sqlx::query_as(&query)
            .bind(order.status.as_str())
            .bind(order.final_total)
            .bind(order.deposit_paid)
            .bind(order.delivery_instructions.as_deref())
            .bind(order.confirmed_at)
            .bind(order.delivery_date)
            .bind(order.updated_at)
            .bind(order.id)
            .bind(order.version)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Order::try_from(row),
            None => Err(StoreError::VersionConflict { order_id: order.id, expected: order.version }),
        }
    }
}

// ============================================================================
// PostgreSQL Catalog (read-only)
// ============================================================================

#[derive(FromRow)]
struct MenuItemRow {
    id: i64,
    caterer_id: i64,
    name: String,
    description: Option<String>,
    price: Decimal,
    is_active: Option<bool>,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        MenuItem {
            id: row.id,
            caterer_id: row.caterer_id,
            name: row.name,
            description: row.description,
            price: row.price,
            is_active: row.is_active.unwrap_or(true),
        }
    }
}

const MENU_ITEM_COLUMNS: &str = "id::BIGINT AS id, caterer_id::BIGINT AS caterer_id, name, \
     description, price::NUMERIC AS price, is_active";

#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogService for PgCatalog {
    async fn find_item(&self, caterer_id: i64, item_id: i64) -> Result<Option<MenuItem>, StoreError> {
        let query = format!("SELECT {MENU_ITEM_COLUMNS} FROM menu_items WHERE id = $1 AND caterer_id = $2");
        let row: Option<MenuItemRow> = sqlx::query_as(&query)
            .bind(item_id)
            .bind(caterer_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(MenuItem::from))
    }

    async fn find_item_by_id(&self, item_id: i64) -> Result<Option<MenuItem>, StoreError> {
        let query = format!("SELECT {MENU_ITEM_COLUMNS} FROM menu_items WHERE id = $1");
        let row: Option<MenuItemRow> = sqlx::query_as(&query)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(MenuItem::from))
    }

    async fn find_caterer(&self, caterer_id: i64) -> Result<Option<CatererAccount>, StoreError> {
        let row: Option<(i64, Option<String>)> = sqlx::query_as(
            "SELECT id::BIGINT, business_name FROM caterer_profiles WHERE id = $1",
        )
        .bind(caterer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, business_name)| CatererAccount { id, business_name }))
    }
}
