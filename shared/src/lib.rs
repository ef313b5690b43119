use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_traits::Zero;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DomainError {
    #[error("Order must contain at least one line item")]
    EmptyOrder,

    #[error("Invalid quantity {quantity} for catalog item {catalog_item_id}")]
    InvalidQuantity { catalog_item_id: i32, quantity: i32 },

    #[error("Negative unit price {unit_price} for catalog item {catalog_item_id}")]
    NegativeUnitPrice { catalog_item_id: i32, unit_price: BigDecimal },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketLine {
    pub catalog_item_id: i32,
    pub unit_price: BigDecimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basket {
    pub id: i32,
    pub buyer_id: String,
    pub items: Vec<BasketLine>,
}

impl Basket {
    pub fn catalog_item_ids(&self) -> Vec<i32> {
        self.items.iter().map(|item| item.catalog_item_id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i32,
    pub name: String,
    pub picture_uri: String,
}

/// Snapshot of the catalog entry as it looked when the order was placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItemOrdered {
    pub catalog_item_id: i32,
    pub product_name: String,
    pub picture_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OrderLineItemRecord")]
pub struct OrderLineItem {
    id: Option<i32>,
    item_ordered: CatalogItemOrdered,
    unit_price: BigDecimal,
    units: i32,
}

impl OrderLineItem {
    pub fn new(
        item_ordered: CatalogItemOrdered,
        unit_price: BigDecimal,
        units: i32,
    ) -> Result<Self, DomainError> {
        if units <= 0 {
            return Err(DomainError::InvalidQuantity {
                catalog_item_id: item_ordered.catalog_item_id,
                quantity: units,
            });
        }
        if unit_price < BigDecimal::zero() {
            return Err(DomainError::NegativeUnitPrice {
                catalog_item_id: item_ordered.catalog_item_id,
                unit_price,
            });
        }

        Ok(Self {
            id: None,
            item_ordered,
            unit_price,
            units,
        })
    }

    /// Attaches the identifier assigned by the order store.
    pub fn persisted(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub fn item_ordered(&self) -> &CatalogItemOrdered {
        &self.item_ordered
    }

    pub fn unit_price(&self) -> &BigDecimal {
        &self.unit_price
    }

    pub fn units(&self) -> i32 {
        self.units
    }
}

#[derive(Deserialize)]
struct OrderLineItemRecord {
    id: Option<i32>,
    item_ordered: CatalogItemOrdered,
    unit_price: BigDecimal,
    units: i32,
}

impl TryFrom<OrderLineItemRecord> for OrderLineItem {
    type Error = DomainError;

    fn try_from(record: OrderLineItemRecord) -> Result<Self, Self::Error> {
        let item = Self::new(record.item_ordered, record.unit_price, record.units)?;
        Ok(match record.id {
            Some(id) => item.persisted(id),
            None => item,
        })
    }
}

/// An order aggregate. Lines are fixed at construction; the only later
/// change is the store attaching identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OrderRecord")]
pub struct Order {
    id: Option<i32>,
    buyer_id: String,
    order_date: DateTime<Utc>,
    ship_to_address: Address,
    order_items: Vec<OrderLineItem>,
}

impl Order {
    pub fn new(
        buyer_id: String,
        ship_to_address: Address,
        order_items: Vec<OrderLineItem>,
    ) -> Result<Self, DomainError> {
        Self::from_parts(None, buyer_id, Utc::now(), ship_to_address, order_items)
    }

    fn from_parts(
        id: Option<i32>,
        buyer_id: String,
        order_date: DateTime<Utc>,
        ship_to_address: Address,
        order_items: Vec<OrderLineItem>,
    ) -> Result<Self, DomainError> {
        if order_items.is_empty() {
            return Err(DomainError::EmptyOrder);
        }

        Ok(Self {
            id,
            buyer_id,
            order_date,
            ship_to_address,
            order_items,
        })
    }

    /// Attaches the identifiers assigned by the order store. `item_ids` must
    /// follow the order of `order_items`.
    pub fn persisted(mut self, id: i32, item_ids: &[i32]) -> Self {
        self.id = Some(id);
        self.order_items = self
            .order_items
            .into_iter()
            .zip(item_ids.iter().copied().map(Some).chain(std::iter::repeat(None)))
            .map(|(item, item_id)| match item_id {
                Some(item_id) => item.persisted(item_id),
                None => item,
            })
            .collect();
        self
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub fn buyer_id(&self) -> &str {
        &self.buyer_id
    }

    pub fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }

    pub fn ship_to_address(&self) -> &Address {
        &self.ship_to_address
    }

    pub fn order_items(&self) -> &[OrderLineItem] {
        &self.order_items
    }

    pub fn total(&self) -> BigDecimal {
        self.order_items
            .iter()
            .map(|item| item.unit_price() * BigDecimal::from(item.units()))
            .fold(BigDecimal::zero(), |total, line| total + line)
    }
}

#[derive(Deserialize)]
struct OrderRecord {
    id: Option<i32>,
    buyer_id: String,
    order_date: DateTime<Utc>,
    ship_to_address: Address,
    order_items: Vec<OrderLineItem>,
}

impl TryFrom<OrderRecord> for Order {
    type Error = DomainError;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        Order::from_parts(
            record.id,
            record.buyer_id,
            record.order_date,
            record.ship_to_address,
            record.order_items,
        )
    }
}

/// Payload published to the inventory reservation queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReservationMessage {
    pub item_id: i32,
    pub quantity: i32,
}

/// Payload posted to the delivery dispatch endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeliveryMessage {
    pub item_id: i32,
    pub quantity: i32,
}

impl From<&OrderLineItem> for ReservationMessage {
    fn from(item: &OrderLineItem) -> Self {
        Self {
            item_id: item.item_ordered().catalog_item_id,
            quantity: item.units(),
        }
    }
}

impl From<&OrderLineItem> for DeliveryMessage {
    fn from(item: &OrderLineItem) -> Self {
        Self {
            item_id: item.item_ordered().catalog_item_id,
            quantity: item.units(),
        }
    }
}
