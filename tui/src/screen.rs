//! Terminal Screen
//!
//! The host side of the device core: keeps what the list widget shows and
//! runs the status bar animations against the wall clock.
//!
//! # Design
//!
//! Animations are plain data. Every frame tick [`TerminalScreen::advance`]
//! moves each running animation to where it should be at `now` and hands
//! back the ones that reached their end, so the caller can report them to
//! the core. Cancelled animations are removed and never reported.

use std::time::Instant;

use checksync_core::{
    AnimationHandle, AnimationHost, AnimationSpec, Element, Frame, ItemRecord, ListRenderer,
    StatusBarLayout,
};

#[derive(Debug)]
struct Running {
    handle: AnimationHandle,
    spec: AnimationSpec,
    start: Frame,
    started_at: Instant,
}

/// List and status bar state drawn by the view
#[derive(Debug)]
pub struct TerminalScreen {
    title: String,
    records: Vec<ItemRecord>,
    dirty: bool,
    status_text: String,
    layout: StatusBarLayout,
    status_frame: Frame,
    progress_frame: Frame,
    running: Vec<Running>,
    next_handle: u64,
    clock: fn() -> Instant,
}

impl TerminalScreen {
    /// Empty screen with both status bar elements off screen
    #[must_use]
    pub fn new(title: &str, layout: StatusBarLayout) -> Self {
        Self::with_clock(title, layout, Instant::now)
    }

    fn with_clock(title: &str, layout: StatusBarLayout, clock: fn() -> Instant) -> Self {
        Self {
            title: title.to_string(),
            records: Vec::new(),
            dirty: true,
            status_text: String::new(),
            layout,
            status_frame: layout.status_off_screen(),
            progress_frame: layout.sweep_start(),
            running: Vec::new(),
            next_handle: 0,
            clock,
        }
    }

    fn frame_mut(&mut self, element: Element) -> &mut Frame {
        match element {
            Element::StatusLine => &mut self.status_frame,
            Element::ProgressBar => &mut self.progress_frame,
        }
    }

    /// Move every running animation to `now`
    ///
    /// Returns the handles of animations that finished, in scheduling
    /// order.
    pub fn advance(&mut self, now: Instant) -> Vec<AnimationHandle> {
        if self.running.is_empty() {
            return Vec::new();
        }

        let mut finished = Vec::new();
        let mut still_running = Vec::with_capacity(self.running.len());

        for animation in std::mem::take(&mut self.running) {
            let elapsed = now.saturating_duration_since(animation.started_at);
            let frame = animation.spec.frame_at(animation.start, elapsed);
            *self.frame_mut(animation.spec.element) = frame;

            if animation.spec.is_finished(elapsed) {
                finished.push(animation.handle);
            } else {
                still_running.push(animation);
            }
        }

        self.running = still_running;
        self.dirty = true;
        finished
    }

    /// Whether any animation is still running
    #[must_use]
    pub fn is_animating(&self) -> bool {
        !self.running.is_empty()
    }

    /// Whether something changed since the last call; clears the flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// List title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Rows of the list
    #[must_use]
    pub fn records(&self) -> &[ItemRecord] {
        &self.records
    }

    /// Text of the status line
    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Status bar geometry in device pixels
    #[must_use]
    pub fn layout(&self) -> StatusBarLayout {
        self.layout
    }

    /// Current status line frame
    #[must_use]
    pub fn status_frame(&self) -> Frame {
        self.status_frame
    }

    /// Current progress bar frame
    #[must_use]
    pub fn progress_frame(&self) -> Frame {
        self.progress_frame
    }
}

impl ListRenderer for TerminalScreen {
    fn rebuild_list(&mut self, title: &str, items: &[ItemRecord]) {
        title.clone_into(&mut self.title);
        self.records = items.to_vec();
        self.dirty = true;
    }

    fn update_item(&mut self, index: usize, item: &ItemRecord) {
        if let Some(record) = self.records.get_mut(index) {
            record.clone_from(item);
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

impl AnimationHost for TerminalScreen {
    fn schedule(&mut self, animation: AnimationSpec) -> AnimationHandle {
        self.next_handle += 1;
        let handle = AnimationHandle(self.next_handle);

        let start = match animation.element {
            Element::StatusLine => self.status_frame,
            Element::ProgressBar => self.progress_frame,
        };
        self.running.push(Running {
            handle,
            spec: animation,
            start,
            started_at: (self.clock)(),
        });
        tracing::trace!(handle = %handle, element = ?animation.element, "Animation scheduled");
        handle
    }

    fn cancel(&mut self, handle: AnimationHandle) {
        self.running.retain(|a| a.handle != handle);
    }

    fn set_status_text(&mut self, text: &str) {
        text.clone_into(&mut self.status_text);
        self.dirty = true;
    }
}
