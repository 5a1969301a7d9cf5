#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use notifi::{
    application::{
        handlers::delivery_worker::DeliveryWorker,
        services::{
            delivery_queue::DeliveryQueue, dispatch::DeliveryDispatcher, webhook::WebhookClient,
        },
    },
    domain::{
        models::{
            AckHandle, DeliveryFailure, Destination, DestinationId, DestinationType, Message,
            MessageId, MessageStatus, QueueEntry, UserId,
        },
        repositories::{DestinationRepository, MessageRepository},
    },
    infrastructure::{
        messaging::in_memory::InMemoryDeliveryQueue,
        repositories::in_memory::{InMemoryDestinationRepository, InMemoryMessageRepository},
    },
};

pub const WEBHOOK_URL: &str = "https://discord.com/api/webhooks/5/secret";

pub fn created_at() -> DateTime<Utc> {
    Utc::now() - Duration::hours(1)
}

pub fn pending_message(id: MessageId, user_id: UserId, destination_id: DestinationId) -> Message {
    Message {
        id,
        user_id,
        destination_id,
        title: format!("Alert {id}"),
        body: format!("Body of message {id}"),
        status: MessageStatus::Pending,
        datetime_created: created_at(),
        datetime_send_attempt: created_at(),
    }
}

pub fn destination(
    id: DestinationId,
    user_id: UserId,
    destination_type: DestinationType,
) -> Destination {
    Destination {
        id,
        user_id,
        destination_type,
        identifier: WEBHOOK_URL.to_string(),
        datetime_created: created_at(),
        datetime_updated: created_at(),
    }
}

/// Message store that counts writes and can be told to fail.
#[derive(Default)]
pub struct RecordingMessageRepository {
    pub inner: InMemoryMessageRepository,
    pub updates: AtomicUsize,
    pub fail_gets: AtomicBool,
    pub fail_updates: AtomicBool,
    /// Marks every message SENT in the store right after it is read, as a
    /// second worker finishing the same message would.
    pub completed_elsewhere: AtomicBool,
}

impl RecordingMessageRepository {
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub async fn status_of(&self, id: MessageId) -> Option<MessageStatus> {
        self.inner.get(id).await.unwrap().map(|m| m.status)
    }
}

#[async_trait]
impl MessageRepository for RecordingMessageRepository {
    async fn get(&self, id: MessageId) -> anyhow::Result<Option<Message>> {
        if self.fail_gets.load(Ordering::SeqCst) {
            anyhow::bail!("connection to message store lost");
        }
        let message = self.inner.get(id).await?;
        let completed_elsewhere = self.completed_elsewhere.load(Ordering::SeqCst);
        if let Some(message) = message.as_ref().filter(|_| completed_elsewhere) {
            self.inner
                .insert(Message {
                    status: MessageStatus::Sent,
                    ..message.clone()
                })
                .await;
        }
        Ok(message)
    }

    async fn update(&self, message: Message) -> anyhow::Result<Option<Message>> {
        if self.fail_updates.load(Ordering::SeqCst) {
            anyhow::bail!("could not serialize access due to concurrent update");
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(message).await
    }
}

#[derive(Default)]
pub struct FlakyDestinationRepository {
    pub inner: InMemoryDestinationRepository,
    pub fail_lookups: AtomicBool,
}

#[async_trait]
impl DestinationRepository for FlakyDestinationRepository {
    async fn get_for_user(
        &self,
        destination_id: DestinationId,
        user_id: UserId,
    ) -> anyhow::Result<Option<Destination>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            anyhow::bail!("connection to destination store lost");
        }
        self.inner.get_for_user(destination_id, user_id).await
    }
}

/// In-memory queue whose receive and delete calls can be made to fail.
#[derive(Default)]
pub struct FlakyQueue {
    pub inner: InMemoryDeliveryQueue,
    pub receives: AtomicUsize,
    pub fail_receives: AtomicBool,
    pub failing_deletes: AtomicUsize,
}

impl FlakyQueue {
    pub fn receive_count(&self) -> usize {
        self.receives.load(Ordering::SeqCst)
    }

    /// Number of entries neither deleted nor waiting to be received.
    pub async fn unacknowledged(&self) -> usize {
        self.inner.in_flight_len().await
    }
}

#[async_trait]
impl DeliveryQueue for FlakyQueue {
    async fn send(&self, message_id: MessageId) -> anyhow::Result<()> {
        self.inner.send(message_id).await
    }

    async fn receive(&self, max_wait_seconds: u32) -> anyhow::Result<Vec<QueueEntry>> {
        self.receives.fetch_add(1, Ordering::SeqCst);
        if self.fail_receives.load(Ordering::SeqCst) {
            anyhow::bail!("queue endpoint unreachable");
        }
        self.inner.receive(max_wait_seconds).await
    }

    async fn delete(&self, handle: &AckHandle) -> anyhow::Result<()> {
        let remaining = self.failing_deletes.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_deletes.store(remaining - 1, Ordering::SeqCst);
            anyhow::bail!("delete request timed out");
        }
        self.inner.delete(handle).await
    }
}

pub struct RecordingWebhook {
    result: Mutex<Result<(), DeliveryFailure>>,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl Default for RecordingWebhook {
    fn default() -> Self {
        Self {
            result: Mutex::new(Ok(())),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingWebhook {
    pub fn respond_with(&self, result: Result<(), DeliveryFailure>) {
        *self.result.lock().unwrap() = result;
    }

    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookClient for RecordingWebhook {
    async fn deliver(&self, address: &str, title: &str, body: &str) -> Result<(), DeliveryFailure> {
        self.calls
            .lock()
            .unwrap()
            .push((address.to_string(), title.to_string(), body.to_string()));
        self.result.lock().unwrap().clone()
    }
}

pub struct Harness {
    pub messages: Arc<RecordingMessageRepository>,
    pub destinations: Arc<FlakyDestinationRepository>,
    pub queue: Arc<FlakyQueue>,
    pub webhook: Arc<RecordingWebhook>,
    pub worker: Arc<DeliveryWorker>,
}

impl Harness {
    pub fn new() -> Self {
        let messages = Arc::new(RecordingMessageRepository::default());
        let destinations = Arc::new(FlakyDestinationRepository::default());
        let queue = Arc::new(FlakyQueue::default());
        let webhook = Arc::new(RecordingWebhook::default());
        let worker = Arc::new(DeliveryWorker::new(
            messages.clone(),
            destinations.clone(),
            queue.clone(),
            DeliveryDispatcher::new(webhook.clone()),
        ));

        Self {
            messages,
            destinations,
            queue,
            webhook,
            worker,
        }
    }

    /// Stores a pending message and enqueues it, as the producer does.
    pub async fn submit(&self, message: Message) {
        let id = message.id;
        self.messages.inner.insert(message).await;
        self.queue.send(id).await.unwrap();
    }

    pub async fn add_destination(&self, destination: Destination) {
        self.destinations.inner.insert(destination).await;
    }
}
