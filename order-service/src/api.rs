use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use shared::*;
use std::sync::Arc;
use crate::handlers::{CheckoutError, OrderService};

#[derive(Clone)]
pub struct AppState {
    pub order_service: Arc<OrderService>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub basket_id: i32,
    pub shipping_address: Address,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order_id: Option<i32>,
    pub buyer_id: String,
    pub item_count: usize,
    pub total: BigDecimal,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/orders", post(create_order))
        .route("/health", axum::routing::get(health_check))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

fn status_for(error: &CheckoutError) -> StatusCode {
    match error {
        CheckoutError::NotFound { .. } => StatusCode::NOT_FOUND,
        CheckoutError::EmptyBasket { .. } | CheckoutError::Domain(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CheckoutError::CatalogItemMissing { .. } => StatusCode::CONFLICT,
        CheckoutError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        CheckoutError::Reservation { .. } | CheckoutError::Delivery { .. } => StatusCode::BAD_GATEWAY,
    }
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), (StatusCode, Json<ErrorResponse>)> {
    match state
        .order_service
        .create_order(request.basket_id, request.shipping_address)
        .await
    {
        Ok(order) => {
            tracing::info!("Checked out basket {} as order {:?}", request.basket_id, order.id());
            Ok((
                StatusCode::CREATED,
                Json(CreateOrderResponse {
                    order_id: order.id(),
                    buyer_id: order.buyer_id().to_string(),
                    item_count: order.order_items().len(),
                    total: order.total(),
                }),
            ))
        }
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                tracing::error!("Checkout of basket {} failed: {}", request.basket_id, e);
            } else {
                tracing::warn!("Checkout of basket {} rejected: {}", request.basket_id, e);
            }
            Err((status, Json(ErrorResponse { error: e.to_string() })))
        }
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}
