//! Order records and the order-store collaborator.
//!
//! The engine owns only the branching policy for resolution; lookups live
//! behind [`OrderStore`] so the storage backend can be swapped without
//! touching the steps.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OrderStoreError;

/// A line item in an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub sku: String,
    pub name: String,
    pub quantity: u32,
}

/// An order record as stored in the orders table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub customer_name: String,
    pub email: String,
    pub items: Vec<OrderItem>,
    pub order_date: String,
    pub status: String,
    #[serde(default)]
    pub delivery_date: Option<String>,
    pub total_amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Lookup interface the resolution step calls.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch a single order by its id. `None` when no such order exists.
    async fn fetch_by_id(&self, order_id: &str) -> Result<Option<Order>, OrderStoreError>;

    /// All orders whose email matches, case-insensitively and exactly.
    async fn search_by_email(&self, email: &str) -> Result<Vec<Order>, OrderStoreError>;
}

/// In-memory order table, loaded from `orders.json`.
pub struct InMemoryOrderStore {
    orders: Vec<Order>,
}

impl InMemoryOrderStore {
    pub fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn fetch_by_id(&self, order_id: &str) -> Result<Option<Order>, OrderStoreError> {
        Ok(self
            .orders
            .iter()
            .find(|o| o.order_id == order_id)
            .cloned())
    }

    async fn search_by_email(&self, email: &str) -> Result<Vec<Order>, OrderStoreError> {
        Ok(self
            .orders
            .iter()
            .filter(|o| o.email.eq_ignore_ascii_case(email))
            .cloned()
            .collect())
    }
}
