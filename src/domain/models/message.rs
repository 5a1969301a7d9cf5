use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::destination::DestinationId;
use crate::domain::errors::DomainError;

pub type MessageId = i64;
pub type UserId = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "PENDING",
            MessageStatus::Sent => "SENT",
            MessageStatus::Failed => "FAILED",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(MessageStatus::Pending),
            "SENT" => Some(MessageStatus::Sent),
            "FAILED" => Some(MessageStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, MessageStatus::Pending)
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub user_id: UserId,
    pub destination_id: DestinationId,
    pub title: String,
    pub body: String,
    pub status: MessageStatus,
    pub datetime_created: DateTime<Utc>,
    pub datetime_send_attempt: DateTime<Utc>,
}

impl Message {
    pub fn is_pending(&self) -> bool {
        self.status == MessageStatus::Pending
    }

    /// Returns a copy of the message carrying the outcome of a send attempt.
    ///
    /// A message leaves `PENDING` exactly once, so completing a message that
    /// is already terminal, or completing it back to `PENDING`, is rejected.
    pub fn complete(
        &self,
        status: MessageStatus,
        attempted_at: DateTime<Utc>,
    ) -> Result<Message, DomainError> {
        if !self.is_pending() || !status.is_terminal() {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: status,
            });
        }

        Ok(Message {
            status,
            datetime_send_attempt: attempted_at,
            ..self.clone()
        })
    }
}
