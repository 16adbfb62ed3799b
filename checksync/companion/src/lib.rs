//! Checksync Companion - Phone-Side Peer
//!
//! The companion owns the checklist. It reads a markdown document from a
//! [`DocumentStore`], streams its open tasks to the device as a
//! [`TransferPlan`], and writes the document back whenever the device
//! reports a toggle.
//!
//! # Flow
//!
//! ```text
//!   DocumentStore ──load──► ChecklistDocument ──► TransferPlan ──► device
//!         ▲                        │
//!         └──────store─────────────┘◄── ItemChecked / ItemUnchecked
//! ```
//!
//! While a save is running the device is told so through the status line
//! and the progress sweep.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod document;
pub mod store;
pub mod transfer;

use checksync_core::{Dictionary, MessageKey};
use thiserror::Error;

pub use document::{ChecklistDocument, DocumentError, DocumentItem};
pub use store::{DocumentStore, FileStore, StoreError, StoreSettings, WebDavStore};
pub use transfer::{LinkError, PeerLink, TransferPlan, RETRY_DELAY};

/// Status shown on the device while the document is written back
pub const SAVING_STATUS: &str = "Saving…";

/// Status shown on the device when writing back failed
pub const SAVE_FAILED_STATUS: &str = "Save failed!";

/// Status shown on the device when the document cannot be read
pub const LOAD_FAILED_STATUS: &str = "Cannot load list!";

/// Companion errors
#[derive(Debug, Error)]
pub enum CompanionError {
    /// The device referred to a missing item
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Reading or writing the document failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The device link went away
    #[error(transparent)]
    Link(#[from] LinkError),
}

/// A toggle reported by the device
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Toggle {
    /// Item index
    pub index: i32,
    /// New state
    pub checked: bool,
}

impl Toggle {
    /// Read a toggle out of a device message
    ///
    /// A message carrying both keys counts as a check.
    #[must_use]
    pub fn decode(message: &Dictionary) -> Option<Self> {
        if let Some(index) = message.get_int(MessageKey::ItemChecked) {
            return Some(Self {
                index,
                checked: true,
            });
        }
        message
            .get_int(MessageKey::ItemUnchecked)
            .map(|index| Self {
                index,
                checked: false,
            })
    }
}

/// The phone-side peer
pub struct Companion {
    store: Box<dyn DocumentStore>,
    document: ChecklistDocument,
}

impl std::fmt::Debug for Companion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Companion")
            .field("store", &self.store.describe())
            .field("items", &self.document.items().len())
            .finish()
    }
}

impl Companion {
    /// Companion over `store`, with an empty document until [`Self::load`]
    #[must_use]
    pub fn new(store: Box<dyn DocumentStore>) -> Self {
        Self {
            store,
            document: ChecklistDocument::default(),
        }
    }

    /// Fetch and parse the document, returning the transfer to send
    ///
    /// # Errors
    ///
    /// [`CompanionError::Store`] if the document cannot be read. The
    /// previously loaded document is kept.
    pub async fn load(&mut self) -> Result<TransferPlan, CompanionError> {
        let text = self.store.load().await?;
        self.document = ChecklistDocument::parse(&text);

        tracing::info!(
            store = %self.store.describe(),
            items = self.document.items().len(),
            "Loaded checklist"
        );
        Ok(self.plan())
    }

    /// Transfer of the current document
    #[must_use]
    pub fn plan(&self) -> TransferPlan {
        TransferPlan::for_document(&self.document)
    }

    /// Current document
    #[must_use]
    pub fn document(&self) -> &ChecklistDocument {
        &self.document
    }

    /// Apply a message from the device
    ///
    /// Toggles update the document and store it, with the device's status
    /// line and progress sweep showing the save. Other payloads are logged
    /// and ignored.
    ///
    /// # Errors
    ///
    /// - [`CompanionError::Document`] for an unknown item index
    /// - [`CompanionError::Store`] if saving failed (the device is told)
    /// - [`CompanionError::Link`] if the link closed
    pub async fn handle_device_message<L>(
        &mut self,
        message: &Dictionary,
        link: &mut L,
    ) -> Result<(), CompanionError>
    where
        L: PeerLink + ?Sized,
    {
        let Some(toggle) = Toggle::decode(message) else {
            tracing::warn!(keys = message.len(), "Received unknown device message");
            return Ok(());
        };

        tracing::info!(index = toggle.index, checked = toggle.checked, "Device toggled item");
        self.document
            .set_checked(i64::from(toggle.index), toggle.checked)?;

        notify(link, SAVING_STATUS, true).await?;
        match self.store.store(&self.document.render()).await {
            Ok(()) => {
                tracing::info!(store = %self.store.describe(), "Document saved");
                notify(link, "", false).await?;
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to save document");
                notify(link, SAVE_FAILED_STATUS, false).await?;
                Err(err.into())
            }
        }
    }
}

/// Best-effort status update: a refused message is dropped, not retried
async fn notify<L>(link: &mut L, status: &str, progressing: bool) -> Result<(), LinkError>
where
    L: PeerLink + ?Sized,
{
    let message = Dictionary::new()
        .with(MessageKey::SetStatus, status)
        .with(MessageKey::SetProgressing, progressing);

    match link.send(message).await {
        Err(LinkError::Rejected(code)) => {
            tracing::debug!(code = %code, "Status update dropped");
            Ok(())
        }
        other => other,
    }
}
