use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::{
    application::services::{delivery_queue::DeliveryQueue, health::HealthProbe},
    domain::models::{AckHandle, MessageId, QueueEntry},
};

const DEFAULT_RECEIVE_BATCH: usize = 3;

#[derive(Default)]
struct QueueState {
    next_handle: u64,
    ready: VecDeque<MessageId>,
    in_flight: HashMap<AckHandle, MessageId>,
}

/// Process-local delivery queue with the same visibility rules as the real
/// one: received entries stay in flight until deleted, and
/// `redeliver_in_flight` plays the part of an expired visibility window.
pub struct InMemoryDeliveryQueue {
    state: Arc<Mutex<QueueState>>,
    arrivals: Notify,
    receive_batch: usize,
    healthy: AtomicBool,
}

impl Default for InMemoryDeliveryQueue {
    fn default() -> Self {
        Self::with_receive_batch(DEFAULT_RECEIVE_BATCH)
    }
}

impl InMemoryDeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_receive_batch(receive_batch: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            arrivals: Notify::new(),
            receive_batch: receive_batch.max(1),
            healthy: AtomicBool::new(true),
        }
    }

    /// Makes every received but undeleted entry visible again.
    pub async fn redeliver_in_flight(&self) -> usize {
        let mut state = self.state.lock().await;
        let expired: Vec<MessageId> = state.in_flight.drain().map(|(_, id)| id).collect();
        let count = expired.len();
        state.ready.extend(expired);
        drop(state);
        if count > 0 {
            self.arrivals.notify_waiters();
        }
        count
    }

    pub async fn ready_len(&self) -> usize {
        self.state.lock().await.ready.len()
    }

    pub async fn in_flight_len(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    async fn take_ready(&self) -> Vec<QueueEntry> {
        let mut state = self.state.lock().await;
        let count = state.ready.len().min(self.receive_batch);
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let Some(message_id) = state.ready.pop_front() else {
                break;
            };
            state.next_handle += 1;
            let handle = AckHandle::new(format!("in-memory-{}", state.next_handle));
            state.in_flight.insert(handle.clone(), message_id);
            entries.push(QueueEntry { handle, message_id });
        }
        entries
    }
}

#[async_trait]
impl DeliveryQueue for InMemoryDeliveryQueue {
    async fn send(&self, message_id: MessageId) -> anyhow::Result<()> {
        self.state.lock().await.ready.push_back(message_id);
        self.arrivals.notify_waiters();
        Ok(())
    }

    async fn receive(&self, max_wait_seconds: u32) -> anyhow::Result<Vec<QueueEntry>> {
        let deadline = Instant::now() + Duration::from_secs(max_wait_seconds.into());
        loop {
            // Registered before the ready check so a send in between still wakes us.
            let notified = self.arrivals.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let entries = self.take_ready().await;
            if !entries.is_empty() || max_wait_seconds == 0 {
                return Ok(entries);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }

    async fn delete(&self, handle: &AckHandle) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        state
            .in_flight
            .remove(handle)
            .map(|_| ())
            .ok_or_else(|| anyhow::anyhow!("unknown ack handle {handle}"))
    }
}

#[async_trait]
impl HealthProbe for InMemoryDeliveryQueue {
    async fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}
