//! List Synchronization
//!
//! Reassembles a list transfer spread over many inbound messages and runs
//! the item toggle protocol.
//!
//! # Transfer
//!
//! ```text
//! count(n) ──► Receiving(n, none) ──item(i)──► ... ──► Complete
//!    ▲                                                    │
//!    └──────────────── count(m) (discards everything) ────┘
//! ```
//!
//! The companion streams items in increasing index order, so the transfer
//! is complete once the highest index seen reaches `expected_count - 1`.
//! The highest index only advances across indices that actually arrived:
//! if a message in the middle is dropped the list never completes, and the
//! view keeps showing the previous list instead of one with holes.
//!
//! # Toggle
//!
//! A toggle is only applied after the channel accepted the message, so the
//! check marks on screen always match what was last enqueued.

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelAdapter, Outbox};
use crate::error::SyncError;
use crate::text::truncate_utf8;

/// Title shown before the companion sends one
pub const DEFAULT_TITLE: &str = "Checklist";

/// Maximum title length in bytes
pub const TITLE_MAX: usize = 63;

/// Default upper bound on the item count
pub const DEFAULT_MAX_ITEMS: usize = 256;

/// One checkable entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Position in the list
    pub index: usize,
    /// Display label
    pub label: String,
    /// Whether the item is checked on the device
    pub checked: bool,
}

impl Item {
    fn placeholder(index: usize) -> Self {
        Self {
            index,
            label: String::new(),
            checked: false,
        }
    }
}

/// Transfer phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncPhase {
    /// Nothing received since start
    Empty,
    /// Waiting for items of an announced transfer
    Receiving {
        /// Count announced by the last count message
        expected: usize,
        /// Highest index received with every lower index present
        highest_seen: Option<usize>,
    },
    /// Every announced item has arrived
    Complete,
}

/// What a successful update means for the view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncUpdate {
    /// Still receiving; the view must not change
    Pending,
    /// The list just became complete; rebuild the whole view
    Completed,
    /// One item of an already complete list changed in place
    ItemChanged(usize),
}

/// Size bounds for the list store
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListLimits {
    /// Largest accepted item count
    pub max_items: usize,
    /// Maximum title length in bytes
    pub title_max: usize,
}

impl Default for ListLimits {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            title_max: TITLE_MAX,
        }
    }
}

/// The list synchronization state machine
///
/// Sole owner and writer of item storage.
#[derive(Debug)]
pub struct ListSync {
    title: String,
    items: Vec<Item>,
    delivered: Vec<bool>,
    phase: SyncPhase,
    limits: ListLimits,
}

impl ListSync {
    /// Create an empty, untitled-by-companion list
    #[must_use]
    pub fn new(limits: ListLimits) -> Self {
        Self {
            title: truncate_utf8(DEFAULT_TITLE, limits.title_max).to_string(),
            items: Vec::new(),
            delivered: Vec::new(),
            phase: SyncPhase::Empty,
            limits,
        }
    }

    /// Current title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Items in index order
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Number of items in the store
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Current transfer phase
    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Count announced by the most recent count message
    #[must_use]
    pub fn expected_count(&self) -> usize {
        match self.phase {
            SyncPhase::Receiving { expected, .. } => expected,
            SyncPhase::Empty | SyncPhase::Complete => self.items.len(),
        }
    }

    /// Highest contiguously received index of the running transfer
    #[must_use]
    pub fn highest_index_seen(&self) -> Option<usize> {
        match self.phase {
            SyncPhase::Receiving { highest_seen, .. } => highest_seen,
            SyncPhase::Complete => self.items.len().checked_sub(1),
            SyncPhase::Empty => None,
        }
    }

    /// Whether the list is complete and safe to show
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SyncPhase::Complete
    }

    /// Replace the title, truncated to the configured bound
    pub fn set_title(&mut self, title: &str) {
        self.title = truncate_utf8(title, self.limits.title_max).to_string();
        tracing::debug!(title = %self.title, "Title updated");
    }

    /// Start a new transfer of `count` items
    ///
    /// All stored items are dropped first. A count of zero completes
    /// immediately with an empty list.
    ///
    /// # Errors
    ///
    /// [`SyncError::AllocationFailure`] if the store cannot hold `count`
    /// items. The list is then left empty and complete.
    pub fn set_count(&mut self, count: i32) -> Result<SyncUpdate, SyncError> {
        let count = usize::try_from(count).unwrap_or(0);

        self.items = Vec::new();
        self.delivered = Vec::new();

        if let Err(err) = self.allocate(count) {
            self.phase = SyncPhase::Complete;
            return Err(err);
        }

        tracing::info!(count, "Received count");

        if count == 0 {
            self.phase = SyncPhase::Complete;
            return Ok(SyncUpdate::Completed);
        }

        self.phase = SyncPhase::Receiving {
            expected: count,
            highest_seen: None,
        };
        Ok(SyncUpdate::Pending)
    }

    fn allocate(&mut self, count: usize) -> Result<(), SyncError> {
        let failure = SyncError::AllocationFailure { requested: count };
        if count > self.limits.max_items {
            return Err(failure);
        }

        let mut items = Vec::new();
        let mut delivered = Vec::new();
        items
            .try_reserve_exact(count)
            .map_err(|_| failure.clone())?;
        delivered.try_reserve_exact(count).map_err(|_| failure)?;

        items.extend((0..count).map(Item::placeholder));
        delivered.resize(count, false);

        self.items = items;
        self.delivered = delivered;
        Ok(())
    }

    /// Store the label for the item at `index`
    ///
    /// The check mark is cleared; the companion only sends unchecked items.
    ///
    /// # Errors
    ///
    /// [`SyncError::IndexOutOfRange`] if `index` is outside the announced
    /// count. Nothing changes in that case.
    pub fn apply_item(&mut self, index: i32, text: &str) -> Result<SyncUpdate, SyncError> {
        let slot = usize::try_from(index)
            .ok()
            .filter(|&i| i < self.items.len())
            .ok_or(SyncError::IndexOutOfRange {
                index: i64::from(index),
                count: self.items.len(),
            })?;

        let item = &mut self.items[slot];
        item.label = text.to_string();
        item.checked = false;
        self.delivered[slot] = true;

        tracing::debug!(index = slot, label = %text, "Received item");

        match self.phase {
            SyncPhase::Receiving {
                expected,
                highest_seen,
            } => {
                let mut next = highest_seen.map_or(0, |h| h + 1);
                while next < expected && self.delivered[next] {
                    next += 1;
                }
                let highest_seen = next.checked_sub(1);

                if highest_seen == Some(expected - 1) {
                    self.phase = SyncPhase::Complete;
                    self.delivered = Vec::new();
                    tracing::info!(count = expected, "Completed list update");
                    Ok(SyncUpdate::Completed)
                } else {
                    self.phase = SyncPhase::Receiving {
                        expected,
                        highest_seen,
                    };
                    Ok(SyncUpdate::Pending)
                }
            }
            SyncPhase::Complete if slot + 1 == self.items.len() => {
                tracing::info!(count = self.items.len(), "Completed list update");
                Ok(SyncUpdate::Completed)
            }
            SyncPhase::Complete | SyncPhase::Empty => Ok(SyncUpdate::ItemChanged(slot)),
        }
    }

    /// Toggle the item at `index`, reporting the change to the companion
    ///
    /// The stored check mark only flips after the channel accepted the
    /// message. Returns the new checked state.
    ///
    /// # Errors
    ///
    /// - [`SyncError::TransferInProgress`] while a transfer is running
    /// - [`SyncError::IndexOutOfRange`] for an index outside the list
    /// - [`SyncError::Send`] if the channel refused the message
    pub fn request_toggle<O: Outbox>(
        &mut self,
        index: usize,
        channel: &mut ChannelAdapter<O>,
    ) -> Result<bool, SyncError> {
        if let SyncPhase::Receiving {
            expected,
            highest_seen,
        } = self.phase
        {
            return Err(SyncError::TransferInProgress {
                received: highest_seen.map_or(0, |h| h + 1),
                expected,
            });
        }

        let count = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or(SyncError::IndexOutOfRange {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                count,
            })?;

        let checked = !item.checked;
        channel.send_toggle(index, checked)?;
        item.checked = checked;

        tracing::info!(index, checked, "Item toggled");
        Ok(checked)
    }
}

impl Default for ListSync {
    fn default() -> Self {
        Self::new(ListLimits::default())
    }
}
