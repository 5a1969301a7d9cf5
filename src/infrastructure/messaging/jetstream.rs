use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_nats::jetstream::{
    self, AckKind,
    consumer::{AckPolicy, PullConsumer, pull},
};
use async_trait::async_trait;
use tokio_stream::StreamExt;
use tracing::{error, warn};

use crate::{
    application::services::{delivery_queue::DeliveryQueue, health::HealthProbe},
    domain::{
        events::MessageQueuedEvent,
        models::{AckHandle, MessageId, QueueEntry},
    },
};

#[derive(Debug, Clone)]
pub struct JetstreamConfig {
    pub url: String,
    pub stream: String,
    pub subject: String,
    pub durable: String,
    pub pull_batch: usize,
    pub ack_wait_seconds: u64,
}

/// Delivery queue backed by a JetStream stream and a durable pull consumer.
///
/// The ack handle of a received entry is the reply subject of its JetStream
/// message; publishing an ack to it removes the entry. Unacknowledged entries
/// come back after `ack_wait_seconds`.
pub struct JetstreamQueue {
    client: async_nats::Client,
    context: jetstream::Context,
    consumer: PullConsumer,
    stream: String,
    subject: String,
    pull_batch: usize,
}

impl JetstreamQueue {
    pub async fn connect(config: &JetstreamConfig) -> anyhow::Result<Arc<Self>> {
        let client = async_nats::connect(&config.url)
            .await
            .context("failed to connect to nats")?;
        let context = jetstream::new(client.clone());

        let stream = context
            .get_or_create_stream(jetstream::stream::Config {
                name: config.stream.clone(),
                subjects: vec![config.subject.clone()],
                ..Default::default()
            })
            .await
            .context("failed to open jetstream stream")?;

        let consumer = stream
            .get_or_create_consumer(
                &config.durable,
                pull::Config {
                    durable_name: Some(config.durable.clone()),
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: Duration::from_secs(config.ack_wait_seconds),
                    ..Default::default()
                },
            )
            .await
            .context("failed to open jetstream consumer")?;

        Ok(Arc::new(Self {
            client,
            context,
            consumer,
            stream: config.stream.clone(),
            subject: config.subject.clone(),
            pull_batch: config.pull_batch,
        }))
    }

    async fn collect(mut batch: pull::Batch) -> anyhow::Result<Vec<QueueEntry>> {
        let mut entries = Vec::new();
        while let Some(message) = batch.next().await {
            let message =
                message.map_err(|err| anyhow::anyhow!("jetstream batch error: {err}"))?;
            if let Some(entry) = Self::decode(message).await? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    async fn decode(message: jetstream::Message) -> anyhow::Result<Option<QueueEntry>> {
        let Some(reply) = message.reply.as_ref().map(|subject| subject.to_string()) else {
            warn!("received jetstream message without a reply subject, ignoring");
            return Ok(None);
        };

        match serde_json::from_slice::<MessageQueuedEvent>(&message.payload) {
            Ok(event) => Ok(Some(QueueEntry {
                handle: AckHandle::new(reply),
                message_id: event.message_id,
            })),
            Err(err) => {
                error!(error = %err, "queue entry payload is not a message pointer, terminating it");
                message
                    .ack_with(AckKind::Term)
                    .await
                    .map_err(|err| anyhow::anyhow!("failed to terminate queue entry: {err}"))?;
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl DeliveryQueue for JetstreamQueue {
    async fn send(&self, message_id: MessageId) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(&MessageQueuedEvent { message_id })?;
        self.context
            .publish(self.subject.clone(), payload.into())
            .await
            .context("failed to publish queue entry")?
            .await
            .context("jetstream did not acknowledge queue entry")?;
        Ok(())
    }

    async fn receive(&self, max_wait_seconds: u32) -> anyhow::Result<Vec<QueueEntry>> {
        // Take whatever is ready first; only long-poll when nothing is.
        let ready = self
            .consumer
            .fetch()
            .max_messages(self.pull_batch)
            .messages()
            .await
            .context("failed to fetch from jetstream consumer")?;
        let entries = Self::collect(ready).await?;
        if !entries.is_empty() || max_wait_seconds == 0 {
            return Ok(entries);
        }

        let waited = self
            .consumer
            .batch()
            .max_messages(self.pull_batch)
            .expires(Duration::from_secs(max_wait_seconds.into()))
            .messages()
            .await
            .context("failed to long-poll jetstream consumer")?;
        Self::collect(waited).await
    }

    async fn delete(&self, handle: &AckHandle) -> anyhow::Result<()> {
        self.client
            .publish(handle.as_str().to_string(), "+ACK".into())
            .await
            .context("failed to acknowledge queue entry")?;
        self.client
            .flush()
            .await
            .context("failed to flush queue acknowledgment")?;
        Ok(())
    }
}

#[async_trait]
impl HealthProbe for JetstreamQueue {
    async fn is_healthy(&self) -> bool {
        self.context.get_stream(&self.stream).await.is_ok()
    }
}
