//! Rendering Collaborator
//!
//! The core never draws. It hands display records to a renderer that owns
//! the actual list widget.

use serde::{Deserialize, Serialize};

use crate::list::Item;

/// Icon shown next to an item
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemIcon {
    /// No icon (unchecked)
    #[default]
    None,
    /// Check mark (checked)
    CheckMark,
}

/// What the list widget shows for one item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Row label
    pub label: String,
    /// Row icon
    pub icon: ItemIcon,
}

impl From<&Item> for ItemRecord {
    fn from(item: &Item) -> Self {
        Self {
            label: item.label.clone(),
            icon: if item.checked {
                ItemIcon::CheckMark
            } else {
                ItemIcon::None
            },
        }
    }
}

/// External list widget
pub trait ListRenderer {
    /// Replace the whole list: title and every record, in index order
    fn rebuild_list(&mut self, title: &str, items: &[ItemRecord]);

    /// Replace one record in place
    fn update_item(&mut self, index: usize, item: &ItemRecord);

    /// Request a redraw
    fn mark_dirty(&mut self);
}
