use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use shared::*;

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = crate::schema::baskets)]
pub struct DbBasket {
    pub id: i32,
    pub buyer_id: String,
}

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = crate::schema::basket_items)]
pub struct DbBasketItem {
    pub id: i32,
    pub basket_id: i32,
    pub catalog_item_id: i32,
    pub unit_price: BigDecimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = crate::schema::catalog_items)]
pub struct DbCatalogItem {
    pub id: i32,
    pub name: String,
    pub picture_uri: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::orders)]
pub struct NewOrder {
    pub buyer_id: String,
    pub order_date: DateTime<Utc>,
    pub ship_to_street: String,
    pub ship_to_city: String,
    pub ship_to_state: String,
    pub ship_to_country: String,
    pub ship_to_zip_code: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::order_items)]
pub struct NewOrderItem {
    pub order_id: i32,
    pub catalog_item_id: i32,
    pub product_name: String,
    pub picture_uri: String,
    pub unit_price: BigDecimal,
    pub units: i32,
}

impl DbBasket {
    pub fn into_basket(self, items: Vec<DbBasketItem>) -> Basket {
        Basket {
            id: self.id,
            buyer_id: self.buyer_id,
            items: items.into_iter().map(BasketLine::from).collect(),
        }
    }
}

impl From<DbBasketItem> for BasketLine {
    fn from(item: DbBasketItem) -> Self {
        Self {
            catalog_item_id: item.catalog_item_id,
            unit_price: item.unit_price,
            quantity: item.quantity,
        }
    }
}

impl From<DbCatalogItem> for CatalogItem {
    fn from(item: DbCatalogItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            picture_uri: item.picture_uri,
        }
    }
}

impl From<&Order> for NewOrder {
    fn from(order: &Order) -> Self {
        let address = order.ship_to_address();
        Self {
            buyer_id: order.buyer_id().to_string(),
            order_date: order.order_date(),
            ship_to_street: address.street.clone(),
            ship_to_city: address.city.clone(),
            ship_to_state: address.state.clone(),
            ship_to_country: address.country.clone(),
            ship_to_zip_code: address.zip_code.clone(),
        }
    }
}

impl NewOrderItem {
    pub fn for_order(order_id: i32, item: &OrderLineItem) -> Self {
        let ordered = item.item_ordered();
        Self {
            order_id,
            catalog_item_id: ordered.catalog_item_id,
            product_name: ordered.product_name.clone(),
            picture_uri: ordered.picture_uri.clone(),
            unit_price: item.unit_price().clone(),
            units: item.units(),
        }
    }
}
