use thiserror::Error;

use super::message::MessageStatus;

/// Why a single delivery attempt did not reach its destination.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryFailure {
    #[error("format of message was not valid")]
    MessageDataRejected,
    #[error("message could not be delivered: HTTP {status}")]
    Undelivered { status: u16, body: String },
    #[error("message could not be delivered: {0}")]
    Transport(String),
    #[error("unsupported destination type {0}")]
    UnsupportedDestination(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(DeliveryFailure),
}

impl DeliveryOutcome {
    pub fn status(&self) -> MessageStatus {
        match self {
            DeliveryOutcome::Delivered => MessageStatus::Sent,
            DeliveryOutcome::Failed(_) => MessageStatus::Failed,
        }
    }
}

impl From<Result<(), DeliveryFailure>> for DeliveryOutcome {
    fn from(value: Result<(), DeliveryFailure>) -> Self {
        match value {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(failure) => DeliveryOutcome::Failed(failure),
        }
    }
}
