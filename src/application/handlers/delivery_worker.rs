use std::{future, sync::Arc, time::Duration};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    application::{
        errors::WorkerError,
        services::{delivery_queue::DeliveryQueue, dispatch::DeliveryDispatcher},
    },
    domain::{
        models::{MessageStatus, QueueEntry},
        repositories::{DestinationRepository, MessageRepository},
    },
};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Long-poll budget handed to the queue on every batch.
    pub wait_seconds: u32,
    /// Pause after a failed batch before polling again.
    pub cooldown: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            wait_seconds: 20,
            cooldown: Duration::from_secs(5),
        }
    }
}

/// Moves queued messages from `PENDING` to a terminal status.
///
/// The status write always happens before the queue entry is deleted. A crash
/// between the two leaves the entry to be redelivered, and the `PENDING` check
/// turns that second pass into a plain acknowledgment.
pub struct DeliveryWorker {
    message_repo: Arc<dyn MessageRepository>,
    destination_repo: Arc<dyn DestinationRepository>,
    queue: Arc<dyn DeliveryQueue>,
    dispatcher: DeliveryDispatcher,
}

impl DeliveryWorker {
    pub fn new(
        message_repo: Arc<dyn MessageRepository>,
        destination_repo: Arc<dyn DestinationRepository>,
        queue: Arc<dyn DeliveryQueue>,
        dispatcher: DeliveryDispatcher,
    ) -> Self {
        Self {
            message_repo,
            destination_repo,
            queue,
            dispatcher,
        }
    }

    /// Receives one batch from the queue and processes every entry in it.
    ///
    /// Entries that cannot be accounted for are logged and left on the queue;
    /// the rest of the batch still runs and the first such error is returned.
    pub async fn process_batch(&self, max_wait_seconds: u32) -> Result<(), WorkerError> {
        self.batch_until(max_wait_seconds, future::pending())
            .await
            .unwrap_or(Ok(()))
    }

    /// Runs batches until `shutdown` is cancelled.
    ///
    /// Cancellation is honoured while waiting on the queue and during the
    /// cooldown, never while a received batch is being worked through.
    pub async fn run(&self, config: &WorkerConfig, shutdown: CancellationToken) {
        info!(
            wait_seconds = config.wait_seconds,
            cooldown_seconds = config.cooldown.as_secs(),
            "delivery worker started"
        );

        while !shutdown.is_cancelled() {
            let Some(result) = self
                .batch_until(config.wait_seconds, shutdown.cancelled())
                .await
            else {
                break;
            };

            if let Err(err) = result {
                error!(
                    error = %err,
                    cooldown_seconds = config.cooldown.as_secs(),
                    "delivery batch failed, pausing before the next poll"
                );
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    () = tokio::time::sleep(config.cooldown) => {}
                }
            }
        }

        info!("delivery worker stopped");
    }

    /// Returns `None` when `interrupt` completes before the queue hands over a
    /// batch. Once entries are received they are always processed.
    async fn batch_until(
        &self,
        max_wait_seconds: u32,
        interrupt: impl Future<Output = ()>,
    ) -> Option<Result<(), WorkerError>> {
        let received = tokio::select! {
            biased;
            () = interrupt => return None,
            received = self.queue.receive(max_wait_seconds) => received,
        };

        Some(match received {
            Ok(entries) => self.process_entries(entries).await,
            Err(err) => Err(WorkerError::Receive(err)),
        })
    }

    async fn process_entries(&self, entries: Vec<QueueEntry>) -> Result<(), WorkerError> {
        if entries.is_empty() {
            debug!("no messages received from queue");
            return Ok(());
        }

        let mut first_error = None;
        for entry in entries {
            if let Err(err) = self.process_entry(&entry).await {
                error!(
                    message_id = entry.message_id,
                    error = %err,
                    "queue entry left for redelivery"
                );
                first_error.get_or_insert(err);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    async fn process_entry(&self, entry: &QueueEntry) -> Result<(), WorkerError> {
        let message_id = entry.message_id;
        let message = self
            .message_repo
            .get(message_id)
            .await
            .map_err(|source| WorkerError::MessageLookup { message_id, source })?
            .ok_or(WorkerError::MessageNotFound { message_id })?;

        if !message.is_pending() {
            warn!(
                message_id,
                status = %message.status,
                "message was already processed, dropping duplicate queue entry"
            );
            return self.acknowledge(entry).await;
        }

        let destination = self
            .destination_repo
            .get_for_user(message.destination_id, message.user_id)
            .await
            .map_err(|source| WorkerError::DestinationLookup {
                message_id,
                destination_id: message.destination_id,
                source,
            })?;

        let status = match destination {
            Some(destination) => self.dispatcher.dispatch(&destination, &message).await.status(),
            None => {
                error!(
                    message_id,
                    destination_id = message.destination_id,
                    user_id = message.user_id,
                    "destination for message does not exist"
                );
                MessageStatus::Failed
            }
        };

        let updated = message
            .complete(status, Utc::now())
            .map_err(|err| WorkerError::StatusWrite {
                message_id,
                source: err.into(),
            })?;
        let written = self
            .message_repo
            .update(updated)
            .await
            .map_err(|source| WorkerError::StatusWrite { message_id, source })?;
        if written.is_none() {
            warn!(
                message_id,
                %status,
                "message was completed by another worker, keeping the stored status"
            );
        }

        self.acknowledge(entry).await
    }

    async fn acknowledge(&self, entry: &QueueEntry) -> Result<(), WorkerError> {
        self.queue
            .delete(&entry.handle)
            .await
            .map_err(|source| WorkerError::Acknowledge {
                message_id: entry.message_id,
                source,
            })
    }
}
