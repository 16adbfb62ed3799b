//! Checksync Terminal Device
//!
//! Runs the device core against a terminal instead of a watch face. The
//! phone is simulated in-process by a [`checksync_companion::Companion`]
//! connected through a lossy [`link::Link`].
//!
//! ```text
//!   ┌────────────┐  DeviceEvent   ┌──────────────────────────────┐
//!   │ run_peer   │ ─────────────► │ App                          │
//!   │ (Companion)│                │  Checklist<DeviceOutbox,     │
//!   │            │ ◄───────────── │            TerminalScreen>   │
//!   └────────────┘   Dictionary   └──────────────────────────────┘
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod link;
pub mod peer;
pub mod screen;
pub mod view;

pub use app::App;
pub use link::{CompanionLink, DeviceEvent, DeviceOutbox, Link, LinkFaults};
pub use peer::{run_peer, PeerRequest};
pub use screen::TerminalScreen;
