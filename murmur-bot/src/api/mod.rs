//! HTTP ingress for the chat transport adapter

pub mod events;
pub mod health;

pub use events::handle_event;
pub use health::health_check;
