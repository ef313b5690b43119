use async_trait::async_trait;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use shared::*;
use tracing::{info, warn};

pub const DELIVERY_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to publish reservation: {0}")]
    Publish(#[from] KafkaError),

    #[error("Delivery request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Delivery endpoint responded with HTTP {status}")]
    Rejected { status: u16 },
}

/// Sink for inventory reservation requests.
#[async_trait]
pub trait ReservationPublisher: Send + Sync {
    async fn reserve(&self, message: &ReservationMessage) -> Result<(), NotifyError>;
}

/// Sink for delivery dispatch requests.
#[async_trait]
pub trait DeliveryDispatcher: Send + Sync {
    async fn dispatch(&self, message: &DeliveryMessage) -> Result<(), NotifyError>;
}

pub struct KafkaReservationPublisher {
    producer: FutureProducer,
    topic: String,
}

impl KafkaReservationPublisher {
    pub fn new(producer: FutureProducer, topic: String) -> Self {
        Self { producer, topic }
    }
}

/// Builds an unkeyed record so the queue applies no ordering or dedup key.
fn reservation_record<'a>(topic: &'a str, payload: &'a str) -> FutureRecord<'a, (), str> {
    FutureRecord::to(topic).payload(payload)
}

#[async_trait]
impl ReservationPublisher for KafkaReservationPublisher {
    async fn reserve(&self, message: &ReservationMessage) -> Result<(), NotifyError> {
        let json = serde_json::to_string(message)?;
        let record = reservation_record(&self.topic, &json);

        let (partition, offset) = self
            .producer
            .send(record, Timeout::Never)
            .await
            .map_err(|(e, _)| NotifyError::Publish(e))?;

        info!(
            "Published reservation for item {} to {} [{}@{}]",
            message.item_id, self.topic, partition, offset
        );
        Ok(())
    }
}

pub struct HttpDeliveryDispatcher {
    client: reqwest::Client,
    url: Url,
}

impl HttpDeliveryDispatcher {
    /// The access key, when present, is sent as the `code` query parameter.
    pub fn new(client: reqwest::Client, delivery_url: &str, access_key: Option<&str>) -> anyhow::Result<Self> {
        let mut url = Url::parse(delivery_url)?;
        if let Some(key) = access_key {
            url.query_pairs_mut().append_pair("code", key);
        }
        Ok(Self { client, url })
    }
}

#[async_trait]
impl DeliveryDispatcher for HttpDeliveryDispatcher {
    async fn dispatch(&self, message: &DeliveryMessage) -> Result<(), NotifyError> {
        let body = serde_json::to_string(message)?;

        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, DELIVERY_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        // Drain the body so the connection can be reused.
        response.text().await?;

        if !status.is_success() {
            warn!("Delivery endpoint rejected item {}: HTTP {}", message.item_id, status);
            return Err(NotifyError::Rejected { status: status.as_u16() });
        }

        info!("Dispatched delivery for item {}", message.item_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{RawQuery, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    struct ReceivedRequest {
        content_type: Option<String>,
        query: Option<String>,
        body: String,
    }

    type Received = Arc<Mutex<Vec<ReceivedRequest>>>;

    async fn record_request(
        State((received, status)): State<(Received, StatusCode)>,
        RawQuery(query): RawQuery,
        headers: HeaderMap,
        body: String,
    ) -> (StatusCode, &'static str) {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        received.lock().unwrap().push(ReceivedRequest { content_type, query, body });
        (status, "processed")
    }

    async fn spawn_delivery_endpoint(status: StatusCode) -> (String, Received) {
        let received: Received = Arc::default();
        let app = Router::new()
            .route("/api/DeliveryOrderProcessor", post(record_request))
            .with_state((received.clone(), status));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/api/DeliveryOrderProcessor", addr), received)
    }

    #[tokio::test]
    async fn test_dispatch_posts_json_body_with_charset() {
        let (url, received) = spawn_delivery_endpoint(StatusCode::OK).await;
        let dispatcher = HttpDeliveryDispatcher::new(reqwest::Client::new(), &url, None).unwrap();

        dispatcher
            .dispatch(&DeliveryMessage { item_id: 10, quantity: 2 })
            .await
            .unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].content_type.as_deref(), Some(DELIVERY_CONTENT_TYPE));
        assert_eq!(received[0].body, r#"{"ItemId":10,"Quantity":2}"#);
        assert_eq!(received[0].query, None);
    }

    #[tokio::test]
    async fn test_dispatch_appends_access_key() {
        let (url, received) = spawn_delivery_endpoint(StatusCode::OK).await;
        let dispatcher =
            HttpDeliveryDispatcher::new(reqwest::Client::new(), &url, Some("secret-key")).unwrap();

        dispatcher
            .dispatch(&DeliveryMessage { item_id: 1, quantity: 1 })
            .await
            .unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received[0].query.as_deref(), Some("code=secret-key"));
    }

    #[tokio::test]
    async fn test_dispatch_surfaces_non_success_status() {
        let (url, received) = spawn_delivery_endpoint(StatusCode::SERVICE_UNAVAILABLE).await;
        let dispatcher = HttpDeliveryDispatcher::new(reqwest::Client::new(), &url, None).unwrap();

        let result = dispatcher
            .dispatch(&DeliveryMessage { item_id: 10, quantity: 2 })
            .await;

        assert!(matches!(result, Err(NotifyError::Rejected { status: 503 })));
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_reservation_record_targets_topic_without_key() {
        let json = serde_json::to_string(&ReservationMessage { item_id: 10, quantity: 2 }).unwrap();

        let record = reservation_record("orders", &json);

        assert_eq!(record.topic, "orders");
        assert_eq!(record.payload, Some(r#"{"ItemId":10,"Quantity":2}"#));
        assert!(record.key.is_none());
        assert!(record.partition.is_none());
    }

    #[test]
    fn test_rejects_invalid_delivery_url() {
        assert!(HttpDeliveryDispatcher::new(reqwest::Client::new(), "not a url", None).is_err());
    }
}
