//! Inbound Decoding
//!
//! Extracts the recognized fields from an inbound dictionary. Fields are
//! independent: any subset may arrive in one message.

use crate::error::SyncError;

use super::dictionary::{Dictionary, MessageKey, Value};

/// Recognized fields present in one inbound message
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InboundFields {
    /// New list title
    pub title: Option<String>,
    /// Announced item count for a new transfer
    pub count: Option<i32>,
    /// Index of the carried item
    pub item_index: Option<i32>,
    /// Label of the carried item
    pub item_text: Option<String>,
    /// Status line text
    pub status_text: Option<String>,
    /// Progress indicator intent
    pub progressing: Option<bool>,
}

impl InboundFields {
    /// Decode an inbound dictionary
    ///
    /// Unknown keys and outbound-only keys are skipped. A recognized key
    /// carrying the wrong value type is dropped and logged.
    #[must_use]
    pub fn decode(message: &Dictionary) -> Self {
        let mut fields = Self::default();

        for (id, value) in message.iter() {
            let Some(key) = MessageKey::from_raw(id) else {
                tracing::trace!(key = id, "Skipping unknown message key");
                continue;
            };

            match (key, value) {
                (MessageKey::ListTitle, Value::Text(text)) => fields.title = Some(text.clone()),
                (MessageKey::ItemsCount, Value::Int(n)) => fields.count = Some(*n),
                (MessageKey::ItemsIndex, Value::Int(i)) => fields.item_index = Some(*i),
                (MessageKey::ItemsItem, Value::Text(text)) => fields.item_text = Some(text.clone()),
                (MessageKey::SetStatus, Value::Text(text)) => {
                    fields.status_text = Some(text.clone());
                }
                (MessageKey::SetProgressing, Value::Int(flag)) => {
                    fields.progressing = Some(*flag != 0);
                }
                (MessageKey::ItemChecked | MessageKey::ItemUnchecked, _) => {
                    tracing::trace!(key = %key, "Skipping outbound-only key");
                }
                (key, value) => {
                    let err = SyncError::DecodeIgnored {
                        key,
                        found: value.kind(),
                    };
                    tracing::debug!(error = %err, "Ignoring inbound field");
                }
            }
        }

        fields
    }

    /// The carried item, if both index and text are present
    #[must_use]
    pub fn item(&self) -> Option<(i32, &str)> {
        match (self.item_index, self.item_text.as_deref()) {
            (Some(index), Some(text)) => Some((index, text)),
            _ => None,
        }
    }

    /// Whether no recognized field was present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
