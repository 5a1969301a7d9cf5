use thiserror::Error;

use crate::domain::models::{DestinationId, MessageId};

/// Reasons a batch, or one entry of it, could not be accounted for durably.
/// Every variant leaves the affected queue entry in place for redelivery.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to receive entries from the delivery queue: {0}")]
    Receive(#[source] anyhow::Error),
    #[error("message {message_id} does not exist")]
    MessageNotFound { message_id: MessageId },
    #[error("failed to load message {message_id}: {source}")]
    MessageLookup {
        message_id: MessageId,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to load destination {destination_id} for message {message_id}: {source}")]
    DestinationLookup {
        message_id: MessageId,
        destination_id: DestinationId,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to record delivery status for message {message_id}: {source}")]
    StatusWrite {
        message_id: MessageId,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to remove queue entry for message {message_id}: {source}")]
    Acknowledge {
        message_id: MessageId,
        #[source]
        source: anyhow::Error,
    },
}
