use async_trait::async_trait;

use crate::domain::models::{Destination, DestinationId, Message, MessageId, UserId};

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn get(&self, id: MessageId) -> anyhow::Result<Option<Message>>;
    /// Persists a completed message, provided the stored row is still
    /// `PENDING`. Returns `None` when no pending row matched, leaving an
    /// already terminal status untouched.
    async fn update(&self, message: Message) -> anyhow::Result<Option<Message>>;
}

#[async_trait]
pub trait DestinationRepository: Send + Sync {
    /// Looks a destination up on behalf of its owner. A destination owned by
    /// another user is reported exactly like a missing one.
    async fn get_for_user(
        &self,
        destination_id: DestinationId,
        user_id: UserId,
    ) -> anyhow::Result<Option<Destination>>;
}
