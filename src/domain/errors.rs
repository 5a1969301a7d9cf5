use thiserror::Error;

use crate::domain::models::MessageStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Message status cannot change from {from} to {to}")]
    InvalidTransition {
        from: MessageStatus,
        to: MessageStatus,
    },
}
