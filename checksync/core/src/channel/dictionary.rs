//! Message Dictionaries
//!
//! Every message exchanged with the companion is a flat dictionary of
//! numeric keys to typed values. Keys are stable ids shared by both
//! endpoints; values are either 32-bit integers or text.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Recognized message keys and their wire ids
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u32)]
pub enum MessageKey {
    /// Number of items in the upcoming list transfer (inbound)
    ItemsCount = 10_000,
    /// Index of the item carried by the same message (inbound)
    ItemsIndex = 10_001,
    /// Label of the item carried by the same message (inbound)
    ItemsItem = 10_002,
    /// Item at this index was checked on the device (outbound)
    ItemChecked = 10_003,
    /// Item at this index was unchecked on the device (outbound)
    ItemUnchecked = 10_004,
    /// List title (inbound)
    ListTitle = 10_005,
    /// Status line text, empty hides the line (inbound)
    SetStatus = 10_006,
    /// Progress indicator on/off as 0/1 (inbound)
    SetProgressing = 10_007,
}

impl MessageKey {
    /// All known keys in id order
    pub const ALL: [Self; 8] = [
        Self::ItemsCount,
        Self::ItemsIndex,
        Self::ItemsItem,
        Self::ItemChecked,
        Self::ItemUnchecked,
        Self::ListTitle,
        Self::SetStatus,
        Self::SetProgressing,
    ];

    /// Wire id of this key
    #[must_use]
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Look up a key by wire id
    #[must_use]
    pub fn from_raw(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.id() == id)
    }

    /// Name used in logs and by the companion's payload lookup
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ItemsCount => "ITEMS_COUNT",
            Self::ItemsIndex => "ITEMS_INDEX",
            Self::ItemsItem => "ITEMS_ITEM",
            Self::ItemChecked => "ITEM_CHECKED",
            Self::ItemUnchecked => "ITEM_UNCHECKED",
            Self::ListTitle => "LIST_TITLE",
            Self::SetStatus => "SET_STATUS",
            Self::SetProgressing => "SET_PROGRESSING",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single dictionary value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Signed 32-bit integer
    Int(i32),
    /// UTF-8 text
    Text(String),
}

impl Value {
    /// Short type name for diagnostics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Text(_) => "text",
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Int(i32::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A message: raw key ids mapped to values
///
/// Raw ids are kept so that messages carrying keys this build does not know
/// about still round-trip through the link; decoding simply skips them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dictionary(BTreeMap<u32, Value>);

impl Dictionary {
    /// Create an empty dictionary
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a known key
    #[must_use]
    pub fn with(mut self, key: MessageKey, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a known key, replacing any previous value
    pub fn insert(&mut self, key: MessageKey, value: impl Into<Value>) {
        self.0.insert(key.id(), value.into());
    }

    /// Insert a raw key id
    pub fn insert_raw(&mut self, id: u32, value: impl Into<Value>) {
        self.0.insert(id, value.into());
    }

    /// Value stored under a known key
    #[must_use]
    pub fn get(&self, key: MessageKey) -> Option<&Value> {
        self.0.get(&key.id())
    }

    /// Integer stored under a key, if present and an integer
    #[must_use]
    pub fn get_int(&self, key: MessageKey) -> Option<i32> {
        match self.get(key)? {
            Value::Int(value) => Some(*value),
            Value::Text(_) => None,
        }
    }

    /// Text stored under a key, if present and text
    #[must_use]
    pub fn get_text(&self, key: MessageKey) -> Option<&str> {
        match self.get(key)? {
            Value::Text(value) => Some(value),
            Value::Int(_) => None,
        }
    }

    /// Iterate raw entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Value)> {
        self.0.iter().map(|(id, value)| (*id, value))
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the dictionary has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize for the wire
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from the wire
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a valid encoded dictionary.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
