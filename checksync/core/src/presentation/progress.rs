//! Progress Sweep
//!
//! A bar that sweeps left to right across the status bar, one cycle at a
//! time. The end of each cycle is the only scheduling point: if progress
//! is still wanted the next cycle starts, otherwise the bar is released.
//! Turning progress off never cuts a sweep short.

use super::{
    AnimationHandle, AnimationHost, AnimationSpec, Element, Frame, PresentationTiming,
    StatusBarLayout,
};

/// Inputs of the sweep machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SweepEvent {
    /// The caller declared whether work is in progress
    Requested {
        /// New intent
        active: bool,
    },
    /// The running cycle stopped
    CycleFinished {
        /// Whether another cycle should follow
        still_wanted: bool,
    },
}

/// Observable state of the sweep
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SweepState {
    /// No cycle scheduled
    Idle,
    /// A cycle is running and will be followed by another
    Sweeping,
    /// A cycle is running and will be the last one
    Finishing,
}

/// The progress sweep sub-machine
#[derive(Debug)]
pub struct ProgressSweep {
    active: bool,
    cycle: Option<AnimationHandle>,
    from: Frame,
    to: Frame,
    timing: PresentationTiming,
}

impl ProgressSweep {
    pub(super) fn new(layout: StatusBarLayout, timing: PresentationTiming) -> Self {
        Self {
            active: false,
            cycle: None,
            from: layout.sweep_start(),
            to: layout.sweep_end(),
            timing,
        }
    }

    /// Declare whether work is in progress
    pub fn set_progressing<H: AnimationHost>(&mut self, active: bool, host: &mut H) {
        self.handle(SweepEvent::Requested { active }, host);
    }

    /// Release the cycle if `handle` is the current one, re-arming if wanted
    pub(super) fn on_stopped<H: AnimationHost>(
        &mut self,
        handle: AnimationHandle,
        finished: bool,
        host: &mut H,
    ) -> bool {
        if self.cycle != Some(handle) {
            return false;
        }
        self.cycle = None;
        self.handle(
            SweepEvent::CycleFinished {
                still_wanted: finished && self.active,
            },
            host,
        );
        true
    }

    /// Advance the machine
    pub fn handle<H: AnimationHost>(&mut self, event: SweepEvent, host: &mut H) {
        match event {
            SweepEvent::Requested { active } => {
                if active && self.cycle.is_none() {
                    self.start_cycle(host);
                }
                self.active = active;
            }
            SweepEvent::CycleFinished { still_wanted: true } => self.start_cycle(host),
            SweepEvent::CycleFinished {
                still_wanted: false,
            } => {
                tracing::trace!("Progress sweep released");
            }
        }
    }

    fn start_cycle<H: AnimationHost>(&mut self, host: &mut H) {
        if let Some(previous) = self.cycle.take() {
            host.cancel(previous);
        }

        let handle = host.schedule(AnimationSpec {
            element: Element::ProgressBar,
            from: Some(self.from),
            to: self.to,
            delay: std::time::Duration::ZERO,
            duration: self.timing.sweep,
            easing: self.timing.easing,
        });
        self.cycle = Some(handle);
    }

    /// Caller's declared intent
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Handle of the running cycle
    #[must_use]
    pub fn cycle(&self) -> Option<AnimationHandle> {
        self.cycle
    }

    /// Combined state
    #[must_use]
    pub fn state(&self) -> SweepState {
        match (self.cycle, self.active) {
            (None, _) => SweepState::Idle,
            (Some(_), true) => SweepState::Sweeping,
            (Some(_), false) => SweepState::Finishing,
        }
    }
}
