use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::UserId;

pub type DestinationId = i64;

/// Kind of endpoint a destination points at.
///
/// Types the delivery worker has never heard of are kept as `Unrecognised` so
/// that a stray row fails its message instead of failing to decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DestinationType {
    Discord,
    MobileAndroid,
    MobileIos,
    Unrecognised(String),
}

impl DestinationType {
    pub fn as_str(&self) -> &str {
        match self {
            DestinationType::Discord => "DISCORD",
            DestinationType::MobileAndroid => "MOBILE_ANDROID",
            DestinationType::MobileIos => "MOBILE_IOS",
            DestinationType::Unrecognised(value) => value,
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "DISCORD" => DestinationType::Discord,
            "MOBILE_ANDROID" => DestinationType::MobileAndroid,
            "MOBILE_IOS" => DestinationType::MobileIos,
            other => DestinationType::Unrecognised(other.to_string()),
        }
    }
}

impl fmt::Display for DestinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for DestinationType {
    fn from(value: String) -> Self {
        DestinationType::parse(&value)
    }
}

impl From<DestinationType> for String {
    fn from(value: DestinationType) -> Self {
        match value {
            DestinationType::Unrecognised(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub id: DestinationId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub destination_type: DestinationType,
    /// Delivery address, a webhook URL for Discord destinations.
    pub identifier: String,
    pub datetime_created: DateTime<Utc>,
    pub datetime_updated: DateTime<Utc>,
}
