//! Shared fixtures: a small order table, classification rules, action
//! templates, and collaborator fakes with call counters.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use triagent::classify::{ClassificationRule, Classifier};
use triagent::config::EngineConfig;
use triagent::engine::Engine;
use triagent::error::{LlmError, OrderStoreError};
use triagent::llm::{DisabledGenerator, TextGenerator};
use triagent::orders::{InMemoryOrderStore, Order, OrderItem, OrderStore};
use triagent::policy::TermOverlapPolicyIndex;
use triagent::store::InMemoryThreadStore;
use triagent::templates::{ReplyTemplate, TemplateTable};

pub fn order(id: &str, name: &str, email: &str, status: &str, item: &str) -> Order {
    Order {
        order_id: id.to_string(),
        customer_name: name.to_string(),
        email: email.to_string(),
        items: vec![OrderItem {
            sku: format!("SKU-{id}"),
            name: item.to_string(),
            quantity: 1,
        }],
        order_date: "2026-06-01".to_string(),
        status: status.to_string(),
        delivery_date: None,
        total_amount: 99.0,
        currency: "USD".to_string(),
    }
}

pub fn sample_orders() -> Vec<Order> {
    vec![
        order(
            "ORD1001",
            "Dana Reyes",
            "dana.reyes@example.com",
            "delivered",
            "Desk Lamp",
        ),
        order(
            "ORD1002",
            "Miguel Santos",
            "m.santos@example.com",
            "in_transit",
            "Office Chair",
        ),
        order(
            "ORD1003",
            "Priya Natarajan",
            "priya.n@example.com",
            "processing",
            "Mechanical Keyboard",
        ),
        order(
            "ORD1004",
            "Priya Natarajan",
            "priya.n@example.com",
            "delivered",
            "Monitor",
        ),
    ]
}

pub fn rules() -> Vec<ClassificationRule> {
    let rule = |keyword: &str, issue_type: &str, priority: u32| ClassificationRule {
        keyword: keyword.to_string(),
        issue_type: issue_type.to_string(),
        priority,
    };
    vec![
        rule("refund", "refund_request", 1),
        rule("duplicate charge", "duplicate_charge", 2),
        rule("charge", "billing_question", 2),
        rule("broken", "damaged_item", 3),
        rule("late", "delayed_delivery", 4),
    ]
}

pub fn templates() -> Vec<ReplyTemplate> {
    let template = |issue_type: &str, template: &str| ReplyTemplate {
        issue_type: issue_type.to_string(),
        template: template.to_string(),
    };
    vec![
        template(
            "refund_request",
            "Issue a refund for order {{order_id}} to {{customer_name}}'s original payment method.",
        ),
        template(
            "duplicate_charge",
            "Reverse the duplicate charge on order {{order_id}} for {{customer_name}}.",
        ),
        template(
            "damaged_item",
            "Ship a free replacement for order {{order_id}} to {{customer_name}}.",
        ),
    ]
}

/// Order store that counts lookups, for asserting work is not repeated.
pub struct CountingOrderStore {
    inner: InMemoryOrderStore,
    pub fetches: AtomicUsize,
    pub searches: AtomicUsize,
}

impl CountingOrderStore {
    pub fn new(orders: Vec<Order>) -> Self {
        Self {
            inner: InMemoryOrderStore::new(orders),
            fetches: AtomicUsize::new(0),
            searches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderStore for CountingOrderStore {
    async fn fetch_by_id(&self, order_id: &str) -> Result<Option<Order>, OrderStoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_by_id(order_id).await
    }

    async fn search_by_email(&self, email: &str) -> Result<Vec<Order>, OrderStoreError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.inner.search_by_email(email).await
    }
}

/// Order store that is always down.
pub struct FailingOrderStore;

#[async_trait]
impl OrderStore for FailingOrderStore {
    async fn fetch_by_id(&self, _order_id: &str) -> Result<Option<Order>, OrderStoreError> {
        Err(OrderStoreError::Unavailable {
            reason: "order service offline".to_string(),
        })
    }

    async fn search_by_email(&self, _email: &str) -> Result<Vec<Order>, OrderStoreError> {
        Err(OrderStoreError::Unavailable {
            reason: "order service offline".to_string(),
        })
    }
}

/// Generator that always returns the same text.
pub struct CannedGenerator(pub String);

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(
        &self,
        _system_context: &str,
        _user_context: &str,
    ) -> Result<String, LlmError> {
        Ok(self.0.clone())
    }
}

pub struct TestHarness {
    pub engine: Arc<Engine>,
    pub thread_store: Arc<InMemoryThreadStore>,
    pub orders: Arc<CountingOrderStore>,
}

pub fn harness() -> TestHarness {
    harness_with_generator(Arc::new(DisabledGenerator))
}

pub fn harness_with_generator(generator: Arc<dyn TextGenerator>) -> TestHarness {
    let thread_store = Arc::new(InMemoryThreadStore::new());
    let orders = Arc::new(CountingOrderStore::new(sample_orders()));
    let engine = Engine::new(
        thread_store.clone(),
        orders.clone(),
        generator,
        Arc::new(TermOverlapPolicyIndex::new(Vec::new())),
        Classifier::new(rules()),
        TemplateTable::new(templates()),
        EngineConfig::default(),
    );
    TestHarness {
        engine: Arc::new(engine),
        thread_store,
        orders,
    }
}

/// Harness whose order store always fails, sharing the given thread store.
pub fn failing_orders_harness(thread_store: Arc<InMemoryThreadStore>) -> Engine {
    Engine::new(
        thread_store,
        Arc::new(FailingOrderStore),
        Arc::new(DisabledGenerator),
        Arc::new(TermOverlapPolicyIndex::new(Vec::new())),
        Classifier::new(rules()),
        TemplateTable::new(templates()),
        EngineConfig::default(),
    )
}

pub fn turn(thread_id: Option<&str>, text: &str) -> triagent::engine::TurnRequest {
    triagent::engine::TurnRequest {
        thread_id: thread_id.map(str::to_string),
        ticket_text: text.to_string(),
        order_id: None,
    }
}
