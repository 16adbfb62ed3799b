//! Animated Presentation
//!
//! Drives the two animated elements of the status bar:
//!
//! - **Status line**: slides in when a message arrives and slides out a
//!   short while after it is cleared
//! - **Progress bar**: a thin bar sweeping across the bottom edge of the
//!   status bar for as long as the companion reports work in progress
//!
//! The host owns the actual timers. The controller asks it to schedule an
//! [`AnimationSpec`] and gets an [`AnimationHandle`] back; when the
//! animation stops the host reports it through
//! [`PresentationController::on_animation_stopped`]. Each element holds at
//! most one live handle: starting a new animation cancels the previous one
//! first, and callbacks for handles that are no longer current are ignored.

mod progress;
mod status;
mod timing;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use progress::{ProgressSweep, SweepEvent, SweepState};
pub use status::{SlideDirection, StatusLine, StatusPhase};
pub use timing::{EasingFunction, Frame};

/// Maximum status text length in bytes
pub const STATUS_TEXT_MAX: usize = 31;

/// Default duration of a status slide
pub const STATUS_TRANSITION: Duration = Duration::from_millis(200);

/// Default duration of one progress sweep
pub const SWEEP_DURATION: Duration = Duration::from_millis(1000);

/// Identifies one scheduled animation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimationHandle(pub u64);

impl fmt::Display for AnimationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anim#{}", self.0)
    }
}

/// Visual elements the controller animates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    /// The status text line
    StatusLine,
    /// The progress sweep bar
    ProgressBar,
}

/// One property animation of an element's frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    /// Element to move
    pub element: Element,
    /// Start frame; `None` starts from wherever the element currently is
    pub from: Option<Frame>,
    /// End frame
    pub to: Frame,
    /// Wait before the animation starts moving
    pub delay: Duration,
    /// Time from start to end frame
    pub duration: Duration,
    /// Easing curve
    pub easing: EasingFunction,
}

impl AnimationSpec {
    /// Eased progress after `elapsed` since scheduling (0.0 to 1.0)
    #[must_use]
    pub fn progress(&self, elapsed: Duration) -> f32 {
        let Some(running) = elapsed.checked_sub(self.delay) else {
            return 0.0;
        };
        if self.duration.is_zero() {
            return 1.0;
        }
        let t = running.as_secs_f32() / self.duration.as_secs_f32();
        self.easing.apply(t)
    }

    /// Whether the animation has reached its end frame after `elapsed`
    #[must_use]
    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.delay + self.duration
    }

    /// Frame of the element after `elapsed`, starting from `start` when
    /// the animation has no explicit start frame
    #[must_use]
    pub fn frame_at(&self, start: Frame, elapsed: Duration) -> Frame {
        self.from.unwrap_or(start).lerp(self.to, self.progress(elapsed))
    }
}

/// Host capability to run timed transitions
pub trait AnimationHost {
    /// Schedule an animation and return its handle
    fn schedule(&mut self, animation: AnimationSpec) -> AnimationHandle;

    /// Unschedule an animation; it must not be reported as finished
    fn cancel(&mut self, handle: AnimationHandle);

    /// Replace the text shown by the status line
    fn set_status_text(&mut self, text: &str);
}

/// Size of the status bar the elements live in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBarLayout {
    /// Bar width in pixels
    pub width: i32,
    /// Bar height in pixels
    pub height: i32,
}

impl StatusBarLayout {
    /// Status line frame when shown (leaves room for the separator line)
    #[must_use]
    pub const fn status_on_screen(&self) -> Frame {
        Frame::new(0, 0, self.width, self.height - 1)
    }

    /// Status line frame when hidden above the bar
    #[must_use]
    pub const fn status_off_screen(&self) -> Frame {
        Frame::new(0, -self.height, self.width, self.height - 1)
    }

    /// Progress bar frame at the start of a sweep (left of the bar)
    #[must_use]
    pub const fn sweep_start(&self) -> Frame {
        Frame::new(-self.width / 3, self.height - 2, self.width / 3, 2)
    }

    /// Progress bar frame at the end of a sweep (right of the bar)
    #[must_use]
    pub const fn sweep_end(&self) -> Frame {
        Frame::new(self.width, self.height - 2, self.width / 4, 2)
    }
}

impl Default for StatusBarLayout {
    fn default() -> Self {
        Self {
            width: 144,
            height: 16,
        }
    }
}

/// Durations and curves of the animations
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresentationTiming {
    /// Duration of a status slide in or out
    pub status_transition: Duration,
    /// Grace period before a cleared status slides out
    pub hide_delay: Duration,
    /// Duration of one progress sweep
    pub sweep: Duration,
    /// Curve used by both elements
    pub easing: EasingFunction,
}

impl Default for PresentationTiming {
    fn default() -> Self {
        Self {
            status_transition: STATUS_TRANSITION,
            hide_delay: STATUS_TRANSITION * 2,
            sweep: SWEEP_DURATION,
            easing: EasingFunction::EaseInOut,
        }
    }
}

/// Everything the presentation controller needs to know up front
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PresentationConfig {
    /// Status bar geometry
    pub layout: StatusBarLayout,
    /// Animation timing
    pub timing: PresentationTiming,
}

/// Owns the animated elements and every animation handle
#[derive(Debug)]
pub struct PresentationController {
    status: StatusLine,
    progress: ProgressSweep,
}

impl PresentationController {
    /// Create a controller with both elements idle and hidden
    #[must_use]
    pub fn new(config: &PresentationConfig) -> Self {
        Self {
            status: StatusLine::new(config.layout, config.timing),
            progress: ProgressSweep::new(config.layout, config.timing),
        }
    }

    /// Show, update or hide the status line
    pub fn set_status<H: AnimationHost>(&mut self, text: &str, host: &mut H) {
        self.status.set_status(text, host);
    }

    /// Declare whether work is in progress
    pub fn set_progressing<H: AnimationHost>(&mut self, active: bool, host: &mut H) {
        self.progress.set_progressing(active, host);
    }

    /// Route an animation-stopped callback to the element that owns it
    pub fn on_animation_stopped<H: AnimationHost>(
        &mut self,
        handle: AnimationHandle,
        finished: bool,
        host: &mut H,
    ) {
        if self.status.on_stopped(handle) {
            return;
        }
        if self.progress.on_stopped(handle, finished, host) {
            return;
        }
        tracing::trace!(handle = %handle, "Ignoring stale animation callback");
    }

    /// Status line state
    #[must_use]
    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Progress sweep state
    #[must_use]
    pub fn progress(&self) -> &ProgressSweep {
        &self.progress
    }
}
