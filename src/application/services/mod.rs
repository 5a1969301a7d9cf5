pub mod delivery_queue;
pub mod dispatch;
pub mod health;
pub mod webhook;
