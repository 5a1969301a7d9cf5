use serde::{Deserialize, Serialize};

use crate::domain::models::MessageId;

/// Body of a delivery queue entry. Only the pointer travels through the
/// queue; title, body and destination are read from the store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageQueuedEvent {
    #[serde(rename = "notifiMessageId")]
    pub message_id: MessageId,
}
