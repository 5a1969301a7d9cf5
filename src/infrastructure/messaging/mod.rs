pub mod discord;
pub mod in_memory;
pub mod jetstream;
