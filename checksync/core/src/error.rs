//! Error Taxonomy
//!
//! Nothing in the core is fatal. Every error is converted at the point of
//! detection into either a silent no-op or a status line message.

use thiserror::Error;

use crate::channel::{MessageKey, OutboxCode};

/// Status text shown when the outbound slot is busy
pub const BUSY_STATUS: &str = "Busy, try again";

/// Status text shown when the companion cannot be reached
pub const UNREACHABLE_STATUS: &str = "Cannot reach device!";

/// Failure to enqueue an outbound message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SendError {
    /// The local outbound slot is unavailable
    #[error("outbound slot busy")]
    ChannelBusy,

    /// The message could not be queued or was lost after queuing
    #[error("transport rejected message: {code}")]
    TransportRejected {
        /// Host code that caused the rejection
        code: OutboxCode,
    },
}

impl SendError {
    /// Map a host result code onto the taxonomy
    #[must_use]
    pub const fn from_code(code: OutboxCode) -> Self {
        match code {
            OutboxCode::Busy => Self::ChannelBusy,
            code => Self::TransportRejected { code },
        }
    }

    /// Human-readable status line text for this failure
    #[must_use]
    pub const fn status_text(&self) -> &'static str {
        match self {
            Self::ChannelBusy => BUSY_STATUS,
            Self::TransportRejected { .. } => UNREACHABLE_STATUS,
        }
    }
}

/// Errors detected by the list synchronization machine and the decoder
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SyncError {
    /// A recognized field carried the wrong value type
    #[error("ignored {key}: unexpected {found} value")]
    DecodeIgnored {
        /// The offending key
        key: MessageKey,
        /// Type name of the value that was found
        found: &'static str,
    },

    /// Item or toggle index outside the current list
    #[error("index {index} out of range for {count} items")]
    IndexOutOfRange {
        /// Requested index
        index: i64,
        /// Current item count
        count: usize,
    },

    /// Toggle requested while a list transfer is still being received
    #[error("list transfer in progress ({received} of {expected} items)")]
    TransferInProgress {
        /// Items received so far (highest index + 1)
        received: usize,
        /// Announced count
        expected: usize,
    },

    /// Sending the toggle failed
    #[error(transparent)]
    Send(#[from] SendError),

    /// The item store could not be resized
    #[error("cannot allocate storage for {requested} items")]
    AllocationFailure {
        /// Requested item count
        requested: usize,
    },
}
