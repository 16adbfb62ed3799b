//! Status Line
//!
//! `Hidden ⇄ Showing`. A non-empty message slides the line in at once; an
//! empty message slides it out after a grace delay so the last message
//! stays readable. The last non-empty text is kept while hidden.

use crate::text::truncate_utf8;

use super::{
    AnimationHandle, AnimationHost, AnimationSpec, Element, Frame, PresentationTiming,
    StatusBarLayout, STATUS_TEXT_MAX,
};

/// Direction of a status slide
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlideDirection {
    /// Slide into view
    In,
    /// Slide out of view
    Out,
}

/// Observable phase of the status line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusPhase {
    /// Off screen, no transition pending
    Hidden,
    /// Sliding in
    Revealing,
    /// On screen, no transition pending
    Shown,
    /// Waiting out the grace delay or sliding out
    Hiding,
}

#[derive(Clone, Copy, Debug)]
struct Transition {
    direction: SlideDirection,
    handle: AnimationHandle,
}

/// The status line sub-machine
#[derive(Debug)]
pub struct StatusLine {
    text: String,
    visible: bool,
    transition: Option<Transition>,
    on_screen: Frame,
    off_screen: Frame,
    timing: PresentationTiming,
}

impl StatusLine {
    pub(super) fn new(layout: StatusBarLayout, timing: PresentationTiming) -> Self {
        Self {
            text: String::new(),
            visible: false,
            transition: None,
            on_screen: layout.status_on_screen(),
            off_screen: layout.status_off_screen(),
            timing,
        }
    }

    /// Show, update or hide the line
    ///
    /// - empty while hidden: no-op, the stored text is kept
    /// - empty while shown: slide out after the grace delay
    /// - non-empty: store it; slide in if hidden, otherwise just update
    pub fn set_status<H: AnimationHost>(&mut self, text: &str, host: &mut H) {
        if text.is_empty() {
            if self.visible {
                self.visible = false;
                self.start(SlideDirection::Out, host);
            }
            return;
        }

        self.text = truncate_utf8(text, STATUS_TEXT_MAX).to_string();
        host.set_status_text(&self.text);

        if !self.visible {
            self.visible = true;
            self.start(SlideDirection::In, host);
        }
    }

    fn start<H: AnimationHost>(&mut self, direction: SlideDirection, host: &mut H) {
        if let Some(previous) = self.transition.take() {
            host.cancel(previous.handle);
        }

        let spec = match direction {
            SlideDirection::In => AnimationSpec {
                element: Element::StatusLine,
                from: None,
                to: self.on_screen,
                delay: std::time::Duration::ZERO,
                duration: self.timing.status_transition,
                easing: self.timing.easing,
            },
            SlideDirection::Out => AnimationSpec {
                element: Element::StatusLine,
                from: Some(self.on_screen),
                to: self.off_screen,
                delay: self.timing.hide_delay,
                duration: self.timing.status_transition,
                easing: self.timing.easing,
            },
        };

        let handle = host.schedule(spec);
        tracing::trace!(handle = %handle, ?direction, "Status transition scheduled");
        self.transition = Some(Transition { direction, handle });
    }

    /// Release the transition if `handle` is the current one
    pub(super) fn on_stopped(&mut self, handle: AnimationHandle) -> bool {
        match self.transition {
            Some(t) if t.handle == handle => {
                self.transition = None;
                true
            }
            _ => false,
        }
    }

    /// Last non-empty text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the line is (or is becoming) visible
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Direction of the in-flight transition, if any
    #[must_use]
    pub fn pending_transition(&self) -> Option<SlideDirection> {
        self.transition.map(|t| t.direction)
    }

    /// Combined phase
    #[must_use]
    pub fn phase(&self) -> StatusPhase {
        match (self.visible, self.pending_transition()) {
            (true, Some(_)) => StatusPhase::Revealing,
            (true, None) => StatusPhase::Shown,
            (false, Some(_)) => StatusPhase::Hiding,
            (false, None) => StatusPhase::Hidden,
        }
    }
}
