//! In-memory collaborators used by the test suites.

use async_trait::async_trait;
use shared::*;
use std::collections::HashMap;
use std::sync::Mutex;
use crate::notifier::*;
use crate::repository::*;
use crate::uri::UriComposer;

#[derive(Default)]
struct StoreState {
    baskets: HashMap<i32, Basket>,
    catalog: HashMap<i32, CatalogItem>,
    orders: Vec<Order>,
    next_item_id: i32,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn insert_basket(&self, basket: Basket) {
        self.state.lock().unwrap().baskets.insert(basket.id, basket);
    }

    pub fn insert_catalog_item(&self, item: CatalogItem) {
        self.state.lock().unwrap().catalog.insert(item.id, item);
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state.lock().unwrap().orders.clone()
    }
}

#[async_trait]
impl BasketRepository for InMemoryStore {
    async fn first_or_default(
        &self,
        spec: &BasketWithItemsSpecification,
    ) -> Result<Option<Basket>, RepositoryError> {
        Ok(self.state.lock().unwrap().baskets.get(&spec.basket_id).cloned())
    }
}

#[async_trait]
impl CatalogItemRepository for InMemoryStore {
    async fn list(&self, spec: &CatalogItemsSpecification) -> Result<Vec<CatalogItem>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(spec
            .ids
            .iter()
            .filter_map(|id| state.catalog.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn add(&self, order: Order) -> Result<Order, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let order_id = state.orders.len() as i32 + 1;
        let item_ids: Vec<i32> = order
            .order_items()
            .iter()
            .map(|_| {
                state.next_item_id += 1;
                state.next_item_id
            })
            .collect();

        let order = order.persisted(order_id, &item_ids);
        state.orders.push(order.clone());
        Ok(order)
    }
}

pub struct PrefixUriComposer(pub &'static str);

impl UriComposer for PrefixUriComposer {
    fn compose_pic_uri(&self, picture_uri: &str) -> String {
        format!("{}{}", self.0, picture_uri)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Reserved(ReservationMessage),
    Dispatched(DeliveryMessage),
}

/// Records successful notifications in the order they were sent.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Notification>>,
    fail_reservations: bool,
    deliveries_before_failure: Option<usize>,
}

impl RecordingNotifier {
    pub fn failing_reservations() -> Self {
        Self {
            fail_reservations: true,
            ..Self::default()
        }
    }

    pub fn failing_delivery_after(successes: usize) -> Self {
        Self {
            deliveries_before_failure: Some(successes),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReservationPublisher for RecordingNotifier {
    async fn reserve(&self, message: &ReservationMessage) -> Result<(), NotifyError> {
        if self.fail_reservations {
            return Err(NotifyError::Publish(rdkafka::error::KafkaError::Canceled));
        }
        self.events
            .lock()
            .unwrap()
            .push(Notification::Reserved(message.clone()));
        Ok(())
    }
}

#[async_trait]
impl DeliveryDispatcher for RecordingNotifier {
    async fn dispatch(&self, message: &DeliveryMessage) -> Result<(), NotifyError> {
        let mut events = self.events.lock().unwrap();
        if let Some(limit) = self.deliveries_before_failure {
            let dispatched = events
                .iter()
                .filter(|event| matches!(event, Notification::Dispatched(_)))
                .count();
            if dispatched >= limit {
                return Err(NotifyError::Rejected { status: 500 });
            }
        }
        events.push(Notification::Dispatched(message.clone()));
        Ok(())
    }
}
