use std::sync::Arc;

use tracing::{error, info};

use crate::{
    application::services::webhook::WebhookClient,
    domain::models::{DeliveryFailure, DeliveryOutcome, Destination, DestinationType, Message},
};

/// Routes a message to the delivery channel matching its destination type.
#[derive(Clone)]
pub struct DeliveryDispatcher {
    webhook: Arc<dyn WebhookClient>,
}

impl DeliveryDispatcher {
    pub fn new(webhook: Arc<dyn WebhookClient>) -> Self {
        Self { webhook }
    }

    pub async fn dispatch(&self, destination: &Destination, message: &Message) -> DeliveryOutcome {
        let result = match &destination.destination_type {
            DestinationType::Discord => {
                self.webhook
                    .deliver(&destination.identifier, &message.title, &message.body)
                    .await
            }
            DestinationType::MobileAndroid
            | DestinationType::MobileIos
            | DestinationType::Unrecognised(_) => Err(DeliveryFailure::UnsupportedDestination(
                destination.destination_type.to_string(),
            )),
        };

        match &result {
            Ok(()) => info!(
                message_id = message.id,
                destination_id = destination.id,
                "message delivered successfully"
            ),
            Err(failure) => error!(
                message_id = message.id,
                destination_id = destination.id,
                destination_type = %destination.destination_type,
                reason = %failure,
                "message delivery failed"
            ),
        }

        result.into()
    }
}
