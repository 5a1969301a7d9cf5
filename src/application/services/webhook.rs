use async_trait::async_trait;

use crate::domain::models::DeliveryFailure;

/// Performs one outbound call to a webhook address.
#[async_trait]
pub trait WebhookClient: Send + Sync {
    async fn deliver(&self, address: &str, title: &str, body: &str) -> Result<(), DeliveryFailure>;
}
