//! # Ongi Chat Hub
//!
//! Room-keyed publish/subscribe for real-time chat: a single coordinator
//! task owns the room membership map and fans serialized events out to
//! per-client bounded queues. Slow consumers are disconnected, never
//! waited on.

pub mod client;
pub mod hub;

pub use client::{serve_connection, MessageSink, MessageStream};
pub use hub::{BroadcastHub, HubHandle, Registration};
