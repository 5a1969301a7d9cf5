pub mod endpoints;
pub mod responses;
