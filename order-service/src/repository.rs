use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::pooled_connection::{bb8::Pool, PoolError};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use shared::*;
use crate::models::*;
use crate::schema::*;

pub type DbPool = Pool<AsyncPgConnection>;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(#[from] diesel::result::Error),
}

impl From<bb8::RunError<PoolError>> for RepositoryError {
    fn from(error: bb8::RunError<PoolError>) -> Self {
        Self::Pool(error.to_string())
    }
}

/// Selects one basket together with its lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasketWithItemsSpecification {
    pub basket_id: i32,
}

/// Selects every catalog item whose id is in the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItemsSpecification {
    pub ids: Vec<i32>,
}

#[async_trait]
pub trait BasketRepository: Send + Sync {
    async fn first_or_default(
        &self,
        spec: &BasketWithItemsSpecification,
    ) -> Result<Option<Basket>, RepositoryError>;
}

#[async_trait]
pub trait CatalogItemRepository: Send + Sync {
    async fn list(&self, spec: &CatalogItemsSpecification) -> Result<Vec<CatalogItem>, RepositoryError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores the order and returns it with its assigned identifiers.
    async fn add(&self, order: Order) -> Result<Order, RepositoryError>;
}

/// PostgreSQL backend for all three repositories.
#[derive(Clone)]
pub struct PgRepository {
    pool: DbPool,
}

impl PgRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BasketRepository for PgRepository {
    async fn first_or_default(
        &self,
        spec: &BasketWithItemsSpecification,
    ) -> Result<Option<Basket>, RepositoryError> {
        let mut conn = self.pool.get().await?;

        let basket = baskets::table
            .filter(baskets::id.eq(spec.basket_id))
            .first::<DbBasket>(&mut conn)
            .await
            .optional()?;

        let Some(basket) = basket else {
            return Ok(None);
        };

        let items = basket_items::table
            .filter(basket_items::basket_id.eq(basket.id))
            .order(basket_items::id.asc())
            .load::<DbBasketItem>(&mut conn)
            .await?;

        Ok(Some(basket.into_basket(items)))
    }
}

#[async_trait]
impl CatalogItemRepository for PgRepository {
    async fn list(&self, spec: &CatalogItemsSpecification) -> Result<Vec<CatalogItem>, RepositoryError> {
        let mut conn = self.pool.get().await?;

        let items = catalog_items::table
            .filter(catalog_items::id.eq_any(&spec.ids))
            .load::<DbCatalogItem>(&mut conn)
            .await?;

        Ok(items.into_iter().map(CatalogItem::from).collect())
    }
}

#[async_trait]
impl OrderRepository for PgRepository {
    async fn add(&self, order: Order) -> Result<Order, RepositoryError> {
        let mut conn = self.pool.get().await?;

        let new_order = NewOrder::from(&order);
        let lines = order.order_items().to_vec();

        let (order_id, item_ids) = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                Box::pin(async move {
                    let order_id = diesel::insert_into(orders::table)
                        .values(&new_order)
                        .returning(orders::id)
                        .get_result::<i32>(conn)
                        .await?;

                    let new_items: Vec<NewOrderItem> = lines
                        .iter()
                        .map(|line| NewOrderItem::for_order(order_id, line))
                        .collect();

                    // A multi-row INSERT .. RETURNING yields ids in VALUES order, which
                    // `Order::persisted` relies on to pair ids with lines.
                    let item_ids = diesel::insert_into(order_items::table)
                        .values(&new_items)
                        .returning(order_items::id)
                        .get_results::<i32>(conn)
                        .await?;

                    Ok((order_id, item_ids))
                })
            })
            .await?;

        Ok(order.persisted(order_id, &item_ids))
    }
}
