//! List Transfer
//!
//! A list reaches the device as a count message followed by one message
//! per item, in increasing index order. The link only carries small
//! messages and gives no delivery guarantee, so the companion waits for
//! each send to succeed before moving on and retries the same message
//! after a short pause when it fails.

use std::time::Duration;

use async_trait::async_trait;
use checksync_core::{Dictionary, MessageKey, OutboxCode};
use thiserror::Error;

use crate::document::ChecklistDocument;

/// Pause before resending a message the link refused
pub const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Failure reported by the link for one message
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    /// The message was refused; trying again later may work
    #[error("device link refused message: {0}")]
    Rejected(OutboxCode),

    /// The link is gone
    #[error("device link closed")]
    Closed,
}

/// The companion's side of the message link
#[async_trait]
pub trait PeerLink: Send {
    /// Send one message to the device
    async fn send(&mut self, message: Dictionary) -> Result<(), LinkError>;
}

/// The ordered messages of one list transfer and how far it got
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferPlan {
    messages: Vec<Dictionary>,
    next: usize,
}

impl TransferPlan {
    /// Plan a transfer of `labels`, announcing `title` with the count
    pub fn new<'a, I>(title: Option<&str>, labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let labels: Vec<&str> = labels.into_iter().collect();

        let mut header = Dictionary::new().with(
            MessageKey::ItemsCount,
            i32::try_from(labels.len()).unwrap_or(i32::MAX),
        );
        if let Some(title) = title {
            header.insert(MessageKey::ListTitle, title);
        }

        let mut messages = Vec::with_capacity(labels.len() + 1);
        messages.push(header);
        messages.extend(labels.into_iter().enumerate().map_while(|(i, label)| {
            let index = i32::try_from(i).ok()?;
            Some(
                Dictionary::new()
                    .with(MessageKey::ItemsIndex, index)
                    .with(MessageKey::ItemsItem, label),
            )
        }));

        Self { messages, next: 0 }
    }

    /// Plan a transfer of every open task in `document`
    #[must_use]
    pub fn for_document(document: &ChecklistDocument) -> Self {
        Self::new(
            document.title(),
            document.items().iter().map(|item| item.label.as_str()),
        )
    }

    /// Every message of the transfer, in sending order
    #[must_use]
    pub fn messages(&self) -> &[Dictionary] {
        &self.messages
    }

    /// The message to send next
    #[must_use]
    pub fn current(&self) -> Option<&Dictionary> {
        self.messages.get(self.next)
    }

    /// Record that the current message was sent
    pub fn advance(&mut self) {
        self.next = (self.next + 1).min(self.messages.len());
    }

    /// Messages not yet sent
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.messages.len() - self.next
    }

    /// Whether every message was sent
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.next >= self.messages.len()
    }

    /// Send the rest of the transfer over `link`
    ///
    /// Refused messages are retried after `retry_delay` until they go
    /// through. Returns the number of retries that were needed.
    ///
    /// # Errors
    ///
    /// [`LinkError::Closed`] if the link goes away; the plan keeps its
    /// position so the caller may resume it on a new link.
    pub async fn run<L>(&mut self, link: &mut L, retry_delay: Duration) -> Result<usize, LinkError>
    where
        L: PeerLink + ?Sized,
    {
        let mut retries = 0;

        while let Some(message) = self.current() {
            match link.send(message.clone()).await {
                Ok(()) => {
                    tracing::trace!(position = self.next, "Transfer message sent");
                    self.advance();
                }
                Err(LinkError::Rejected(code)) => {
                    retries += 1;
                    tracing::warn!(
                        position = self.next,
                        code = %code,
                        "Send failed, retrying"
                    );
                    tokio::time::sleep(retry_delay).await;
                }
                Err(LinkError::Closed) => return Err(LinkError::Closed),
            }
        }

        tracing::info!(
            items = self.messages.len() - 1,
            retries,
            "List transfer finished"
        );
        Ok(retries)
    }
}
