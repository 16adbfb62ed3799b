//! Outbound Channel
//!
//! The host exposes a single outbound slot: a message is first reserved
//! with [`Outbox::begin`] and then handed over with [`Outbox::send`].
//! Success only means the message was enqueued locally; the peer never
//! acknowledges delivery.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SendError;

use super::dictionary::{Dictionary, MessageKey};

/// Low-level result codes reported by the host's send primitive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutboxCode {
    /// The outbound slot is holding another message
    Busy,
    /// No connection to the companion
    NotConnected,
    /// The companion did not answer in time
    SendTimeout,
    /// The companion refused the message
    SendRejected,
    /// The message does not fit the outbound buffer
    BufferOverflow,
    /// The host ran out of memory
    OutOfMemory,
    /// The channel has been closed
    Closed,
    /// Malformed arguments to the send primitive
    InvalidArgs,
}

impl fmt::Display for OutboxCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Busy => "busy",
            Self::NotConnected => "not connected",
            Self::SendTimeout => "send timeout",
            Self::SendRejected => "send rejected",
            Self::BufferOverflow => "buffer overflow",
            Self::OutOfMemory => "out of memory",
            Self::Closed => "closed",
            Self::InvalidArgs => "invalid arguments",
        };
        f.write_str(name)
    }
}

/// Host send primitive
pub trait Outbox {
    /// Reserve the outbound slot
    ///
    /// # Errors
    ///
    /// Returns the host's failure code, typically [`OutboxCode::Busy`].
    fn begin(&mut self) -> Result<(), OutboxCode>;

    /// Enqueue the message in the reserved slot
    ///
    /// # Errors
    ///
    /// Returns the host's failure code if the message could not be queued.
    fn send(&mut self, message: Dictionary) -> Result<(), OutboxCode>;
}

/// Typed wrapper around the host's send primitive
#[derive(Debug)]
pub struct ChannelAdapter<O> {
    outbox: O,
}

impl<O: Outbox> ChannelAdapter<O> {
    /// Wrap a host outbox
    pub fn new(outbox: O) -> Self {
        Self { outbox }
    }

    /// Report a toggle of the item at `index` to the companion
    ///
    /// Writes exactly one of `ITEM_CHECKED` / `ITEM_UNCHECKED`.
    ///
    /// # Errors
    ///
    /// [`SendError::ChannelBusy`] when the slot is taken,
    /// [`SendError::TransportRejected`] for every other failure.
    pub fn send_toggle(&mut self, index: usize, checked: bool) -> Result<(), SendError> {
        let key = if checked {
            MessageKey::ItemChecked
        } else {
            MessageKey::ItemUnchecked
        };
        let index = i32::try_from(index).map_err(|_| SendError::TransportRejected {
            code: OutboxCode::InvalidArgs,
        })?;

        self.outbox.begin().map_err(|code| {
            tracing::warn!(code = %code, "Failed to begin outbox");
            SendError::from_code(code)
        })?;

        self.outbox
            .send(Dictionary::new().with(key, index))
            .map_err(|code| {
                tracing::warn!(code = %code, key = %key, index, "Failed to send toggle");
                SendError::from_code(code)
            })
    }

    /// Borrow the underlying outbox
    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    /// Mutably borrow the underlying outbox
    pub fn outbox_mut(&mut self) -> &mut O {
        &mut self.outbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct ScriptedOutbox {
        begin_result: Option<OutboxCode>,
        send_result: Option<OutboxCode>,
        sent: Vec<Dictionary>,
    }

    impl Outbox for ScriptedOutbox {
        fn begin(&mut self) -> Result<(), OutboxCode> {
            self.begin_result.map_or(Ok(()), Err)
        }

        fn send(&mut self, message: Dictionary) -> Result<(), OutboxCode> {
            if let Some(code) = self.send_result {
                return Err(code);
            }
            self.sent.push(message);
            Ok(())
        }
    }

    #[test]
    fn test_send_toggle_writes_one_key() {
        let mut channel = ChannelAdapter::new(ScriptedOutbox::default());

        channel.send_toggle(2, true).unwrap();
        channel.send_toggle(0, false).unwrap();

        let sent = &channel.outbox().sent;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].len(), 1);
        assert_eq!(sent[0].get_int(MessageKey::ItemChecked), Some(2));
        assert_eq!(sent[1].len(), 1);
        assert_eq!(sent[1].get_int(MessageKey::ItemUnchecked), Some(0));
    }

    #[test]
    fn test_busy_slot_maps_to_channel_busy() {
        let mut channel = ChannelAdapter::new(ScriptedOutbox {
            begin_result: Some(OutboxCode::Busy),
            ..Default::default()
        });

        assert_eq!(channel.send_toggle(1, true), Err(SendError::ChannelBusy));
        assert!(channel.outbox().sent.is_empty());
    }

    #[test]
    fn test_send_failure_maps_to_transport_rejected() {
        let mut channel = ChannelAdapter::new(ScriptedOutbox {
            send_result: Some(OutboxCode::NotConnected),
            ..Default::default()
        });

        assert_eq!(
            channel.send_toggle(1, false),
            Err(SendError::TransportRejected {
                code: OutboxCode::NotConnected
            })
        );
    }
}
