use std::collections::HashMap;
use std::sync::Arc;
use shared::*;
use tracing::{error, info};
use crate::notifier::*;
use crate::repository::*;
use crate::uri::UriComposer;

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Basket {basket_id} not found")]
    NotFound { basket_id: i32 },

    #[error("Basket {basket_id} has no items to check out")]
    EmptyBasket { basket_id: i32 },

    #[error("Catalog item {catalog_item_id} referenced by the basket does not exist")]
    CatalogItemMissing { catalog_item_id: i32 },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Order {order_id} was stored but reservation failed: {source}")]
    Reservation { order_id: i32, source: NotifyError },

    #[error("Order {order_id} was stored but delivery dispatch failed: {source}")]
    Delivery { order_id: i32, source: NotifyError },
}

impl CheckoutError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Repository(_) | Self::Reservation { .. } | Self::Delivery { .. }
        )
    }
}

/// Turns a basket into a persisted order and notifies inventory and delivery.
pub struct OrderService {
    basket_repository: Arc<dyn BasketRepository>,
    item_repository: Arc<dyn CatalogItemRepository>,
    order_repository: Arc<dyn OrderRepository>,
    uri_composer: Arc<dyn UriComposer>,
    reservations: Arc<dyn ReservationPublisher>,
    deliveries: Arc<dyn DeliveryDispatcher>,
}

impl OrderService {
    pub fn new(
        basket_repository: Arc<dyn BasketRepository>,
        item_repository: Arc<dyn CatalogItemRepository>,
        order_repository: Arc<dyn OrderRepository>,
        uri_composer: Arc<dyn UriComposer>,
        reservations: Arc<dyn ReservationPublisher>,
        deliveries: Arc<dyn DeliveryDispatcher>,
    ) -> Self {
        Self {
            basket_repository,
            item_repository,
            order_repository,
            uri_composer,
            reservations,
            deliveries,
        }
    }

    pub async fn create_order(&self, basket_id: i32, shipping_address: Address) -> Result<Order, CheckoutError> {
        let basket = self
            .basket_repository
            .first_or_default(&BasketWithItemsSpecification { basket_id })
            .await?
            .ok_or(CheckoutError::NotFound { basket_id })?;

        if basket.items.is_empty() {
            return Err(CheckoutError::EmptyBasket { basket_id });
        }

        let catalog_items = self
            .item_repository
            .list(&CatalogItemsSpecification { ids: basket.catalog_item_ids() })
            .await?;

        let items = self.assemble_lines(&basket, catalog_items)?;
        let order = Order::new(basket.buyer_id.clone(), shipping_address, items)?;

        let order = self.order_repository.add(order).await?;
        // Ids come from the store; zero only appears with a store that assigns none.
        let order_id = order.id().unwrap_or_default();
        info!(
            "Created order {} from basket {} with {} items",
            order_id,
            basket_id,
            order.order_items().len()
        );

        self.process_order(order_id, &order).await?;

        Ok(order)
    }

    fn assemble_lines(
        &self,
        basket: &Basket,
        catalog_items: Vec<CatalogItem>,
    ) -> Result<Vec<OrderLineItem>, CheckoutError> {
        let catalog: HashMap<i32, CatalogItem> = catalog_items
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        basket
            .items
            .iter()
            .map(|basket_item| {
                let catalog_item = catalog.get(&basket_item.catalog_item_id).ok_or(
                    CheckoutError::CatalogItemMissing {
                        catalog_item_id: basket_item.catalog_item_id,
                    },
                )?;

                let item_ordered = CatalogItemOrdered {
                    catalog_item_id: catalog_item.id,
                    product_name: catalog_item.name.clone(),
                    picture_uri: self.uri_composer.compose_pic_uri(&catalog_item.picture_uri),
                };

                Ok(OrderLineItem::new(
                    item_ordered,
                    basket_item.unit_price.clone(),
                    basket_item.quantity,
                )?)
            })
            .collect()
    }

    async fn process_order(&self, order_id: i32, order: &Order) -> Result<(), CheckoutError> {
        for item in order.order_items() {
            let reservation = ReservationMessage::from(item);
            if let Err(source) = self.reservations.reserve(&reservation).await {
                error!("Failed to reserve item {} for order {}: {}", reservation.item_id, order_id, source);
                return Err(CheckoutError::Reservation { order_id, source });
            }

            let delivery = DeliveryMessage::from(item);
            if let Err(source) = self.deliveries.dispatch(&delivery).await {
                error!("Failed to dispatch item {} for order {}: {}", delivery.item_id, order_id, source);
                return Err(CheckoutError::Delivery { order_id, source });
            }
        }

        Ok(())
    }
}
