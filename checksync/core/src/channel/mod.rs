//! Channel Adapter
//!
//! Typed access to the best-effort message link with the companion:
//! dictionary encoding, inbound field decoding and the outbound toggle
//! primitive with its error mapping.

mod dictionary;
mod inbound;
mod outbox;

pub use dictionary::{Dictionary, MessageKey, Value};
pub use inbound::InboundFields;
pub use outbox::{ChannelAdapter, Outbox, OutboxCode};
