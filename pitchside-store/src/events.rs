use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

use pitchside_core::sinks::AnalyticsSink;
use pitchside_core::BookingResult;

use crate::store_err;

#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }

    pub async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                info!(topic, key, partition = delivery.partition, offset = delivery.offset, "event published");
                Ok(())
            }
            Err((e, _msg)) => {
                error!(topic, error = %e, "event publish failed");
                Err(e)
            }
        }
    }
}

/// Analytics sink that writes each record to the Kafka topic named after
/// the event, keyed by reservation id so per-booking records stay ordered.
pub struct KafkaAnalyticsSink {
    producer: EventProducer,
}

impl KafkaAnalyticsSink {
    pub fn new(producer: EventProducer) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl AnalyticsSink for KafkaAnalyticsSink {
    async fn record(&self, event: &str, payload: Value) -> BookingResult<()> {
        let key = payload
            .get("reservation_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| event.to_string());
        self.producer.publish(event, &key, &payload.to_string()).await.map_err(store_err)
    }
}
