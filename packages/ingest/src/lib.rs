// ABOUTME: Kafka job source: consumer-group subscription yielding submissions
// ABOUTME: Malformed payloads are skipped with a warning; transport errors halt ingestion

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::Message;
use tracing::{info, warn};

use grader_core::{IngestError, JobSource, Submission};

/// Job source backed by a Kafka consumer group.
///
/// Delivery is at-least-once: offsets are committed by the group after
/// messages are read, so a submission abandoned during shutdown is
/// redelivered to the next consumer.
pub struct KafkaJobSource {
    consumer: StreamConsumer,
}

impl KafkaJobSource {
    pub fn new(brokers: &[String], topic: &str, group_id: &str) -> Result<Self, IngestError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("group.id", group_id)
            .set("bootstrap.servers", brokers.join(","))
            .set("enable.partition.eof", "false")
            .set("session.timeout.ms", "6000")
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .create()
            .map_err(|e| IngestError::Unavailable(e.to_string()))?;

        consumer
            .subscribe(&[topic])
            .map_err(|e| IngestError::Unavailable(e.to_string()))?;

        info!(topic, group_id, "subscribed to job source");
        Ok(Self { consumer })
    }
}

#[async_trait]
impl JobSource for KafkaJobSource {
    async fn next(&self) -> Result<Submission, IngestError> {
        loop {
            let message = self
                .consumer
                .recv()
                .await
                .map_err(|e| IngestError::Unavailable(e.to_string()))?;

            let Some(payload) = message.payload() else {
                warn!(
                    offset = message.offset(),
                    partition = message.partition(),
                    "empty payload, skipping"
                );
                continue;
            };

            match decode_submission(payload) {
                Ok(submission) => return Ok(submission),
                Err(e) => {
                    warn!(
                        offset = message.offset(),
                        partition = message.partition(),
                        error = %e,
                        "malformed submission payload, skipping"
                    );
                }
            }
        }
    }
}

/// Decodes one wire payload into a submission.
pub fn decode_submission(payload: &[u8]) -> serde_json::Result<Submission> {
    serde_json::from_slice(payload)
}
