//! Checksync Core - Device-Side List Synchronization
//!
//! This crate is the device half of checksync: a companion on the phone owns
//! a checklist document and streams it to a small display device, one item
//! per message, over a best-effort link. The core reassembles the list,
//! sends toggles back and keeps a status bar telling the user what the
//! link is doing.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Host Loop                            │
//! │   inbound message · row selected · animation stopped ·       │
//! │   outbox failed · inbox dropped                              │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┼───────────────────────────────┐
//! │                          Checklist                           │
//! │  ┌──────────────┐  ┌──────────┐  ┌─────────────────────────┐ │
//! │  │   Channel    │  │ ListSync │  │ PresentationController  │ │
//! │  │   Adapter    │  │          │  │  StatusLine · Sweep     │ │
//! │  └──────┬───────┘  └──────────┘  └────────────┬────────────┘ │
//! └─────────┼─────────────────────────────────────┼──────────────┘
//!           │ Outbox                              │ ListRenderer + AnimationHost
//!           ▼                                     ▼
//!      host transport                        host screen
//! ```
//!
//! # Key Types
//!
//! - [`Checklist`]: the context object owning all device state
//! - [`ListSync`]: item storage and transfer reassembly
//! - [`PresentationController`]: status slide and progress sweep
//! - [`Outbox`], [`ListRenderer`], [`AnimationHost`]: host capabilities
//!
//! # Module Overview
//!
//! - [`binder`]: host event handlers
//! - [`channel`]: message keys, dictionaries, inbound decoding, toggles
//! - [`config`]: TOML/env/CLI configuration
//! - [`error`]: error taxonomy and status wording
//! - [`list`]: the synchronization state machine
//! - [`presentation`]: animated status bar
//! - [`render`]: list widget collaborator
//!
//! # No I/O
//!
//! Nothing here touches a clock, a socket or a terminal. Hosts supply
//! those through the traits above, which keeps every handler synchronous
//! and testable with recording mocks.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod binder;
pub mod channel;
pub mod config;
pub mod error;
pub mod list;
pub mod presentation;
pub mod render;

mod text;

// Re-exports for convenience
pub use binder::Checklist;
pub use channel::{ChannelAdapter, Dictionary, InboundFields, MessageKey, Outbox, OutboxCode, Value};
pub use error::{SendError, SyncError, BUSY_STATUS, UNREACHABLE_STATUS};
pub use list::{Item, ListLimits, ListSync, SyncPhase, SyncUpdate};
pub use presentation::{
    AnimationHandle, AnimationHost, AnimationSpec, EasingFunction, Element, Frame,
    PresentationConfig, PresentationController, PresentationTiming, StatusBarLayout,
};
pub use render::{ItemIcon, ItemRecord, ListRenderer};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, DeviceConfig, DeviceToml,
};
