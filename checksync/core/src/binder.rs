//! Presentation Binder
//!
//! [`Checklist`] is the one context object the host creates at startup. It
//! owns every piece of device state and turns host events into calls on
//! the list machine, the presentation controller and the screen.
//!
//! # Design
//!
//! All handlers run to completion on the host's event loop and never
//! block. Errors stop here: each one either becomes a status line message
//! or is logged and dropped.

use crate::channel::{ChannelAdapter, Dictionary, InboundFields, Outbox, OutboxCode};
use crate::config::DeviceConfig;
use crate::error::{SyncError, UNREACHABLE_STATUS};
use crate::list::{ListSync, SyncUpdate};
use crate::presentation::{AnimationHandle, AnimationHost, PresentationController};
use crate::render::{ItemRecord, ListRenderer};

/// Pending view work collected while applying one message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Redraw {
    Nothing,
    Item(usize),
    Full,
}

impl Redraw {
    fn merge(self, update: SyncUpdate) -> Self {
        match (self, update) {
            (Self::Full, _) | (_, SyncUpdate::Completed) => Self::Full,
            (_, SyncUpdate::ItemChanged(index)) => Self::Item(index),
            (current, SyncUpdate::Pending) => current,
        }
    }
}

/// Device-side context: channel, list, presentation and screen
#[derive(Debug)]
pub struct Checklist<O, S> {
    channel: ChannelAdapter<O>,
    list: ListSync,
    presentation: PresentationController,
    screen: S,
}

impl<O, S> Checklist<O, S>
where
    O: Outbox,
    S: ListRenderer + AnimationHost,
{
    /// Build the context around a host outbox and screen
    pub fn new(outbox: O, screen: S, config: &DeviceConfig) -> Self {
        Self {
            channel: ChannelAdapter::new(outbox),
            list: ListSync::new(config.list),
            presentation: PresentationController::new(&config.presentation),
            screen,
        }
    }

    /// Apply one inbound message
    ///
    /// Fields are applied in the order title, count, item, status,
    /// progressing, so a title sent alongside the final item is part of
    /// the rebuild it triggers. A title on its own rebuilds a complete
    /// list; sent with a count that starts a transfer it waits for the
    /// transfer's single rebuild.
    pub fn handle_inbound(&mut self, message: &Dictionary) {
        let fields = InboundFields::decode(message);
        if fields.is_empty() {
            tracing::trace!(keys = message.len(), "Inbound message carried no known fields");
            return;
        }

        let mut redraw = Redraw::Nothing;

        let retitled = fields.title.is_some();
        if let Some(title) = fields.title.as_deref() {
            self.list.set_title(title);
        }

        // A count drops every stored item, so only its own result counts
        if let Some(count) = fields.count {
            let result = self.list.set_count(count);
            redraw = Self::absorb(Redraw::Nothing, result);
        }

        match fields.item() {
            Some((index, text)) => {
                let result = self.list.apply_item(index, text);
                redraw = Self::absorb(redraw, result);
            }
            None if fields.item_index.is_some() || fields.item_text.is_some() => {
                tracing::debug!("Ignoring item without both index and text");
            }
            None => {}
        }

        // Decided last: a count in the same message may have started a transfer
        if retitled && self.list.is_complete() {
            redraw = Redraw::Full;
        }

        match redraw {
            Redraw::Full => self.rebuild(),
            Redraw::Item(index) => self.refresh_item(index),
            Redraw::Nothing => {}
        }

        if let Some(text) = fields.status_text.as_deref() {
            self.presentation.set_status(text, &mut self.screen);
        }

        if let Some(active) = fields.progressing {
            self.presentation.set_progressing(active, &mut self.screen);
        }
    }

    fn absorb(redraw: Redraw, result: Result<SyncUpdate, SyncError>) -> Redraw {
        match result {
            Ok(update) => redraw.merge(update),
            Err(err @ SyncError::AllocationFailure { .. }) => {
                tracing::error!(error = %err, "Falling back to an empty list");
                Redraw::Full
            }
            Err(err) => {
                tracing::debug!(error = %err, "Ignoring inbound item");
                redraw
            }
        }
    }

    fn rebuild(&mut self) {
        let records: Vec<ItemRecord> = self.list.items().iter().map(ItemRecord::from).collect();
        self.screen.rebuild_list(self.list.title(), &records);
    }

    fn refresh_item(&mut self, index: usize) {
        if let Some(item) = self.list.items().get(index) {
            self.screen.update_item(index, &ItemRecord::from(item));
            self.screen.mark_dirty();
        }
    }

    /// The user selected the row at `index`
    ///
    /// The check mark flips only if the toggle was handed to the channel.
    /// A send failure shows one status message and changes nothing else.
    pub fn on_item_selected(&mut self, index: usize) {
        match self.list.request_toggle(index, &mut self.channel) {
            Ok(_) => self.refresh_item(index),
            Err(SyncError::Send(err)) => {
                tracing::warn!(index, error = %err, "Toggle not sent");
                self.presentation
                    .set_status(err.status_text(), &mut self.screen);
            }
            Err(err) => {
                tracing::debug!(index, error = %err, "Toggle refused");
            }
        }
    }

    /// The host reports that an animation stopped
    pub fn on_animation_stopped(&mut self, handle: AnimationHandle, finished: bool) {
        self.presentation
            .on_animation_stopped(handle, finished, &mut self.screen);
    }

    /// A message the channel had accepted was lost on the way out
    pub fn on_outbox_failed(&mut self, code: OutboxCode) {
        tracing::warn!(code = %code, "Outbound message failed");
        self.presentation
            .set_status(UNREACHABLE_STATUS, &mut self.screen);
    }

    /// An inbound message was dropped before it reached the device
    pub fn on_inbox_dropped(&mut self, code: OutboxCode) {
        tracing::warn!(code = %code, "Inbound message dropped");
    }

    /// List state
    pub fn list(&self) -> &ListSync {
        &self.list
    }

    /// Presentation state
    pub fn presentation(&self) -> &PresentationController {
        &self.presentation
    }

    /// The host screen
    pub fn screen(&self) -> &S {
        &self.screen
    }

    /// The host screen, mutably
    pub fn screen_mut(&mut self) -> &mut S {
        &mut self.screen
    }

    /// The host outbox
    pub fn outbox(&self) -> &O {
        self.channel.outbox()
    }

    /// The host outbox, mutably
    pub fn outbox_mut(&mut self) -> &mut O {
        self.channel.outbox_mut()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::channel::MessageKey;
    use crate::presentation::test_host::RecordingHost;
    use crate::presentation::{AnimationSpec, Element, StatusPhase};
    use crate::render::ItemIcon;

    #[derive(Debug, Default)]
    struct QueueOutbox {
        results: VecDeque<Result<(), OutboxCode>>,
        sent: Vec<Dictionary>,
    }

    impl Outbox for QueueOutbox {
        fn begin(&mut self) -> Result<(), OutboxCode> {
            self.results.pop_front().unwrap_or(Ok(()))
        }

        fn send(&mut self, message: Dictionary) -> Result<(), OutboxCode> {
            self.sent.push(message);
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct TestScreen {
        host: RecordingHost,
        rebuilds: Vec<(String, Vec<ItemRecord>)>,
        updates: Vec<(usize, ItemRecord)>,
        dirty: usize,
    }

    impl ListRenderer for TestScreen {
        fn rebuild_list(&mut self, title: &str, items: &[ItemRecord]) {
            self.rebuilds.push((title.to_string(), items.to_vec()));
        }

        fn update_item(&mut self, index: usize, item: &ItemRecord) {
            self.updates.push((index, item.clone()));
        }

        fn mark_dirty(&mut self) {
            self.dirty += 1;
        }
    }

    impl AnimationHost for TestScreen {
        fn schedule(&mut self, animation: AnimationSpec) -> AnimationHandle {
            self.host.schedule(animation)
        }

        fn cancel(&mut self, handle: AnimationHandle) {
            self.host.cancel(handle);
        }

        fn set_status_text(&mut self, text: &str) {
            self.host.set_status_text(text);
        }
    }

    fn checklist() -> Checklist<QueueOutbox, TestScreen> {
        Checklist::new(
            QueueOutbox::default(),
            TestScreen::default(),
            &DeviceConfig::default(),
        )
    }

    fn deliver(list: &mut Checklist<QueueOutbox, TestScreen>, labels: &[&str]) {
        let count = i32::try_from(labels.len()).unwrap();
        list.handle_inbound(&Dictionary::new().with(MessageKey::ItemsCount, count));
        for (i, label) in labels.iter().enumerate() {
            list.handle_inbound(
                &Dictionary::new()
                    .with(MessageKey::ItemsIndex, i32::try_from(i).unwrap())
                    .with(MessageKey::ItemsItem, *label),
            );
        }
    }

    #[test]
    fn test_title_with_final_item_is_in_rebuild() {
        let mut list = checklist();
        list.handle_inbound(&Dictionary::new().with(MessageKey::ItemsCount, 1));
        list.handle_inbound(
            &Dictionary::new()
                .with(MessageKey::ListTitle, "Groceries")
                .with(MessageKey::ItemsIndex, 0)
                .with(MessageKey::ItemsItem, "Milk"),
        );

        let rebuilds = &list.screen().rebuilds;
        assert_eq!(rebuilds.len(), 1);
        assert_eq!(rebuilds[0].0, "Groceries");
    }

    #[test]
    fn test_title_alone_while_receiving_does_not_rebuild() {
        let mut list = checklist();
        list.handle_inbound(&Dictionary::new().with(MessageKey::ItemsCount, 2));
        list.handle_inbound(&Dictionary::new().with(MessageKey::ListTitle, "Later"));

        assert!(list.screen().rebuilds.is_empty());
        assert_eq!(list.list().title(), "Later");
    }

    #[test]
    fn test_title_alone_on_complete_list_rebuilds() {
        let mut list = checklist();
        deliver(&mut list, &["a"]);

        list.handle_inbound(&Dictionary::new().with(MessageKey::ListTitle, "Renamed"));

        let rebuilds = &list.screen().rebuilds;
        assert_eq!(rebuilds.len(), 2);
        assert_eq!(rebuilds[1].0, "Renamed");
        assert_eq!(rebuilds[1].1[0].label, "a");
    }

    #[test]
    fn test_titled_count_after_complete_list_waits_for_items() {
        let mut list = checklist();
        list.handle_inbound(
            &Dictionary::new()
                .with(MessageKey::ItemsCount, 1)
                .with(MessageKey::ListTitle, "Shop"),
        );
        list.handle_inbound(
            &Dictionary::new()
                .with(MessageKey::ItemsIndex, 0)
                .with(MessageKey::ItemsItem, "old"),
        );
        assert_eq!(list.screen().rebuilds.len(), 1);

        list.handle_inbound(
            &Dictionary::new()
                .with(MessageKey::ItemsCount, 3)
                .with(MessageKey::ListTitle, "Shop"),
        );
        assert_eq!(list.screen().rebuilds.len(), 1);

        for (i, label) in ["a", "b", "c"].into_iter().enumerate() {
            list.handle_inbound(
                &Dictionary::new()
                    .with(MessageKey::ItemsIndex, i32::try_from(i).unwrap())
                    .with(MessageKey::ItemsItem, label),
            );
        }

        let rebuilds = &list.screen().rebuilds;
        assert_eq!(rebuilds.len(), 2);
        assert_eq!(rebuilds[1].0, "Shop");
        let labels: Vec<&str> = rebuilds[1].1.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_titled_count_zero_rebuilds_once() {
        let mut list = checklist();
        deliver(&mut list, &["a"]);

        list.handle_inbound(
            &Dictionary::new()
                .with(MessageKey::ItemsCount, 0)
                .with(MessageKey::ListTitle, "Done"),
        );

        let rebuilds = &list.screen().rebuilds;
        assert_eq!(rebuilds.len(), 2);
        assert_eq!(rebuilds[1], ("Done".to_string(), Vec::new()));
    }

    #[test]
    fn test_count_zero_rebuilds_empty() {
        let mut list = checklist();
        list.handle_inbound(&Dictionary::new().with(MessageKey::ItemsCount, 0));

        assert_eq!(
            list.screen().rebuilds,
            vec![("Checklist".to_string(), Vec::new())]
        );
    }

    #[test]
    fn test_allocation_failure_rebuilds_empty() {
        let mut list = checklist();
        deliver(&mut list, &["a"]);

        list.handle_inbound(&Dictionary::new().with(MessageKey::ItemsCount, 100_000));

        assert_eq!(list.screen().rebuilds.len(), 2);
        assert!(list.screen().rebuilds[1].1.is_empty());
        assert!(list.list().is_complete());
    }

    #[test]
    fn test_toggle_updates_one_record() {
        let mut list = checklist();
        deliver(&mut list, &["a", "b"]);

        list.on_item_selected(1);

        assert_eq!(
            list.screen().updates,
            vec![(
                1,
                ItemRecord {
                    label: "b".to_string(),
                    icon: ItemIcon::CheckMark,
                }
            )]
        );
        assert_eq!(list.screen().dirty, 1);
        assert_eq!(
            list.outbox().sent[0].get_int(MessageKey::ItemChecked),
            Some(1)
        );
    }

    #[test]
    fn test_busy_toggle_shows_busy_status() {
        let mut list = checklist();
        deliver(&mut list, &["a"]);
        list.outbox_mut().results.push_back(Err(OutboxCode::Busy));

        list.on_item_selected(0);

        assert_eq!(list.screen().host.status_texts, vec!["Busy, try again".to_string()]);
        assert!(!list.list().items()[0].checked);
        assert!(list.screen().updates.is_empty());
    }

    #[test]
    fn test_toggle_during_transfer_is_silent() {
        let mut list = checklist();
        deliver(&mut list, &["a"]);
        list.handle_inbound(&Dictionary::new().with(MessageKey::ItemsCount, 2));

        list.on_item_selected(0);

        assert!(list.outbox().sent.is_empty());
        assert!(list.screen().host.status_texts.is_empty());
    }

    #[test]
    fn test_redelivered_item_updates_in_place() {
        let mut list = checklist();
        deliver(&mut list, &["a", "b", "c"]);

        list.handle_inbound(
            &Dictionary::new()
                .with(MessageKey::ItemsIndex, 0)
                .with(MessageKey::ItemsItem, "A"),
        );

        assert_eq!(list.screen().rebuilds.len(), 1);
        assert_eq!(list.screen().updates[0].1.label, "A");
        assert_eq!(list.screen().dirty, 1);
    }

    #[test]
    fn test_outbox_failure_shows_unreachable() {
        let mut list = checklist();
        list.on_outbox_failed(OutboxCode::NotConnected);

        assert_eq!(
            list.screen().host.status_texts,
            vec![UNREACHABLE_STATUS.to_string()]
        );
        assert_eq!(list.presentation().status().phase(), StatusPhase::Revealing);
    }

    #[test]
    fn test_inbox_drop_changes_nothing() {
        let mut list = checklist();
        list.on_inbox_dropped(OutboxCode::BufferOverflow);

        assert!(list.screen().host.scheduled.is_empty());
        assert!(list.screen().host.status_texts.is_empty());
    }

    #[test]
    fn test_status_and_progress_are_forwarded() {
        let mut list = checklist();
        list.handle_inbound(
            &Dictionary::new()
                .with(MessageKey::SetStatus, "Saving")
                .with(MessageKey::SetProgressing, true),
        );

        let host = &list.screen().host;
        assert_eq!(host.status_texts, vec!["Saving".to_string()]);
        assert_eq!(host.live_for(Element::StatusLine).len(), 1);
        assert_eq!(host.live_for(Element::ProgressBar).len(), 1);
    }

    #[test]
    fn test_animation_callback_reaches_sweep() {
        let mut list = checklist();
        list.handle_inbound(&Dictionary::new().with(MessageKey::SetProgressing, 1));
        let handle = list.presentation().progress().cycle().unwrap();

        list.screen_mut().host.finish(handle);
        list.on_animation_stopped(handle, true);

        assert_eq!(list.screen().host.scheduled_for(Element::ProgressBar), 2);
    }

    #[test]
    fn test_unknown_message_is_ignored() {
        let mut list = checklist();
        let mut message = Dictionary::new();
        message.insert_raw(42, "noise");

        list.handle_inbound(&message);

        assert!(list.screen().rebuilds.is_empty());
        assert!(list.screen().host.scheduled.is_empty());
    }
}
