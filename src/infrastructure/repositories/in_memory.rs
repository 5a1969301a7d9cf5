use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    models::{Destination, DestinationId, Message, MessageId, UserId},
    repositories::{DestinationRepository, MessageRepository},
};

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Arc<RwLock<HashMap<MessageId, Message>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a message as the producer would, replacing any previous row.
    pub async fn insert(&self, message: Message) {
        let mut messages = self.messages.write().await;
        messages.insert(message.id, message);
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn get(&self, id: MessageId) -> anyhow::Result<Option<Message>> {
        let messages = self.messages.read().await;
        Ok(messages.get(&id).cloned())
    }

    async fn update(&self, message: Message) -> anyhow::Result<Option<Message>> {
        let mut messages = self.messages.write().await;
        let entry = messages
            .get_mut(&message.id)
            .ok_or_else(|| anyhow::anyhow!("message {} does not exist", message.id))?;
        if !entry.is_pending() {
            return Ok(None);
        }
        *entry = message.clone();
        Ok(Some(message))
    }
}

#[derive(Default)]
pub struct InMemoryDestinationRepository {
    destinations: Arc<RwLock<HashMap<DestinationId, Destination>>>,
}

impl InMemoryDestinationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, destination: Destination) {
        let mut destinations = self.destinations.write().await;
        destinations.insert(destination.id, destination);
    }
}

#[async_trait]
impl DestinationRepository for InMemoryDestinationRepository {
    async fn get_for_user(
        &self,
        destination_id: DestinationId,
        user_id: UserId,
    ) -> anyhow::Result<Option<Destination>> {
        let destinations = self.destinations.read().await;
        Ok(destinations
            .get(&destination_id)
            .filter(|d| d.user_id == user_id)
            .cloned())
    }
}
