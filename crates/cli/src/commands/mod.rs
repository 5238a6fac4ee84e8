pub mod message;
pub mod plan;
pub mod send;
