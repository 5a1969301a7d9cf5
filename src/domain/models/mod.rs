pub mod delivery;
pub mod destination;
pub mod message;
pub mod queue;

pub use delivery::{DeliveryFailure, DeliveryOutcome};
pub use destination::{Destination, DestinationId, DestinationType};
pub use message::{Message, MessageId, MessageStatus, UserId};
pub use queue::{AckHandle, QueueEntry};
