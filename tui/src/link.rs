//! Simulated Device Link
//!
//! An in-process stand-in for the radio link between the companion and
//! the device. Both directions are tokio channels; a [`LinkFaults`]
//! setting makes the link drop or refuse messages at random so the
//! device's error paths can be watched in the terminal.
//!
//! # Semantics
//!
//! - Device to companion: the outbox has a single slot. While the
//!   companion has not picked up the previous message, `begin` reports
//!   `Busy`. A message the slot accepted may still fail afterwards; the
//!   device hears about it through [`DeviceEvent::OutboxFailed`].
//! - Companion to device: a refused message is an error the companion
//!   sees and retries. A dropped message looks delivered to the
//!   companion; the device only gets [`DeviceEvent::InboxDropped`].

use async_trait::async_trait;
use checksync_companion::{LinkError, PeerLink};
use checksync_core::{Dictionary, Outbox, OutboxCode};
use rand::Rng;
use tokio::sync::mpsc;

/// Capacity of the companion to device queue
const DEVICE_QUEUE: usize = 64;

/// Random failure rates, each between 0.0 and 1.0
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LinkFaults {
    /// Chance that a message to the device is lost on arrival
    pub drop_rate: f64,
    /// Chance that a send in either direction fails
    pub fail_rate: f64,
}

impl LinkFaults {
    fn roll(rate: f64) -> bool {
        rate > 0.0 && rand::thread_rng().gen_bool(rate.min(1.0))
    }

    fn drops(&self) -> bool {
        Self::roll(self.drop_rate)
    }

    fn fails(&self) -> bool {
        Self::roll(self.fail_rate)
    }
}

/// What the device's event loop receives from the link
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceEvent {
    /// A message from the companion
    Message(Dictionary),
    /// A message from the companion was lost
    InboxDropped(OutboxCode),
    /// A message the device had queued did not make it
    OutboxFailed(OutboxCode),
}

/// Both ends of a freshly created link
#[derive(Debug)]
pub struct Link {
    /// Device send primitive
    pub device_outbox: DeviceOutbox,
    /// Device event stream
    pub device_events: mpsc::Receiver<DeviceEvent>,
    /// Companion send primitive
    pub companion: CompanionLink,
    /// Messages the device sent, as seen by the companion
    pub from_device: mpsc::Receiver<Dictionary>,
}

impl Link {
    /// Create a link with message size limits in bytes
    #[must_use]
    pub fn new(faults: LinkFaults, inbox_size: usize, outbox_size: usize) -> Self {
        let (event_tx, device_events) = mpsc::channel(DEVICE_QUEUE);
        let (slot_tx, from_device) = mpsc::channel(1);

        Self {
            device_outbox: DeviceOutbox {
                slot: slot_tx,
                events: event_tx.clone(),
                faults,
                max_size: outbox_size,
            },
            device_events,
            companion: CompanionLink {
                events: event_tx,
                faults,
                max_size: inbox_size,
            },
            from_device,
        }
    }
}

fn encoded_len(message: &Dictionary) -> usize {
    message.encode().map_or(usize::MAX, |bytes| bytes.len())
}

// ============================================================================
// Device end
// ============================================================================

/// The device's outbound slot
#[derive(Debug)]
pub struct DeviceOutbox {
    slot: mpsc::Sender<Dictionary>,
    events: mpsc::Sender<DeviceEvent>,
    faults: LinkFaults,
    max_size: usize,
}

impl Outbox for DeviceOutbox {
    fn begin(&mut self) -> Result<(), OutboxCode> {
        if self.slot.is_closed() {
            return Err(OutboxCode::Closed);
        }
        if self.slot.capacity() == 0 {
            return Err(OutboxCode::Busy);
        }
        Ok(())
    }

    fn send(&mut self, message: Dictionary) -> Result<(), OutboxCode> {
        if encoded_len(&message) > self.max_size {
            return Err(OutboxCode::BufferOverflow);
        }

        if self.faults.fails() {
            tracing::debug!("Simulating lost outbound message");
            // Reported on the next turn of the event loop, like a late nack
            if self
                .events
                .try_send(DeviceEvent::OutboxFailed(OutboxCode::SendTimeout))
                .is_err()
            {
                tracing::warn!("Device event queue full, failure not reported");
            }
            return Ok(());
        }

        self.slot.try_send(message).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => OutboxCode::Busy,
            mpsc::error::TrySendError::Closed(_) => OutboxCode::Closed,
        })
    }
}

// ============================================================================
// Companion end
// ============================================================================

/// The companion's sending side
#[derive(Clone, Debug)]
pub struct CompanionLink {
    events: mpsc::Sender<DeviceEvent>,
    faults: LinkFaults,
    max_size: usize,
}

#[async_trait]
impl PeerLink for CompanionLink {
    async fn send(&mut self, message: Dictionary) -> Result<(), LinkError> {
        if self.faults.fails() {
            return Err(LinkError::Rejected(OutboxCode::SendTimeout));
        }

        let event = if encoded_len(&message) > self.max_size || self.faults.drops() {
            DeviceEvent::InboxDropped(OutboxCode::BufferOverflow)
        } else {
            DeviceEvent::Message(message)
        };

        self.events.send(event).await.map_err(|_| LinkError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checksync_core::MessageKey;
    use pretty_assertions::assert_eq;

    fn reliable() -> Link {
        Link::new(LinkFaults::default(), 1024, 64)
    }

    fn toggle(index: i32) -> Dictionary {
        Dictionary::new().with(MessageKey::ItemChecked, index)
    }

    #[tokio::test]
    async fn test_companion_message_reaches_device() {
        let mut link = reliable();
        let message = Dictionary::new().with(MessageKey::ItemsCount, 2);

        link.companion.send(message.clone()).await.unwrap();

        assert_eq!(
            link.device_events.recv().await,
            Some(DeviceEvent::Message(message))
        );
    }

    #[tokio::test]
    async fn test_outbox_is_busy_until_companion_reads() {
        let mut link = reliable();
        let outbox = &mut link.device_outbox;

        outbox.begin().unwrap();
        outbox.send(toggle(0)).unwrap();
        assert_eq!(outbox.begin(), Err(OutboxCode::Busy));

        assert_eq!(link.from_device.recv().await, Some(toggle(0)));
        assert_eq!(link.device_outbox.begin(), Ok(()));
    }

    #[tokio::test]
    async fn test_oversized_outbound_message_overflows() {
        let mut link = Link::new(LinkFaults::default(), 1024, 8);

        assert_eq!(
            link.device_outbox.send(toggle(3)),
            Err(OutboxCode::BufferOverflow)
        );
    }

    #[tokio::test]
    async fn test_failed_outbound_message_is_reported_later() {
        let mut link = Link::new(
            LinkFaults {
                drop_rate: 0.0,
                fail_rate: 1.0,
            },
            1024,
            64,
        );

        assert_eq!(link.device_outbox.send(toggle(1)), Ok(()));
        assert_eq!(
            link.device_events.recv().await,
            Some(DeviceEvent::OutboxFailed(OutboxCode::SendTimeout))
        );
        assert!(link.from_device.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_companion_sees_refusals_but_not_drops() {
        let mut failing = Link::new(
            LinkFaults {
                drop_rate: 0.0,
                fail_rate: 1.0,
            },
            1024,
            64,
        );
        assert_eq!(
            failing.companion.send(toggle(0)).await,
            Err(LinkError::Rejected(OutboxCode::SendTimeout))
        );

        let mut dropping = Link::new(
            LinkFaults {
                drop_rate: 1.0,
                fail_rate: 0.0,
            },
            1024,
            64,
        );
        assert_eq!(dropping.companion.send(toggle(0)).await, Ok(()));
        assert_eq!(
            dropping.device_events.recv().await,
            Some(DeviceEvent::InboxDropped(OutboxCode::BufferOverflow))
        );
    }

    #[tokio::test]
    async fn test_closed_device_end() {
        let Link {
            mut companion,
            device_events,
            ..
        } = reliable();
        drop(device_events);

        assert_eq!(
            companion.send(toggle(0)).await,
            Err(LinkError::Closed)
        );
    }
}
