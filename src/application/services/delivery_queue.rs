use async_trait::async_trait;

use crate::domain::models::{AckHandle, MessageId, QueueEntry};

/// At-least-once work queue carrying message identifiers.
///
/// Entries returned by `receive` stay invisible to other consumers until they
/// are deleted or the queue's visibility window elapses, after which the queue
/// hands them out again.
#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    /// Producer side. Enqueues a pointer to a message that is already stored.
    async fn send(&self, message_id: MessageId) -> anyhow::Result<()>;

    /// Long-polls for up to `max_wait_seconds`. May return no entries.
    async fn receive(&self, max_wait_seconds: u32) -> anyhow::Result<Vec<QueueEntry>>;

    async fn delete(&self, handle: &AckHandle) -> anyhow::Result<()>;
}
