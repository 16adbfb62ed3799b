//! Main Application
//!
//! The App drives the device core from the terminal:
//! - Event loop (keyboard, link events, frame tick)
//! - Key bindings for moving the selection and toggling items
//! - Advancing status bar animations and reporting the finished ones
//!
//! Rendering only happens when the screen reports a change.

use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use checksync_core::list::DEFAULT_TITLE;
use checksync_core::{Checklist, DeviceConfig, ListRenderer};

use crate::link::{DeviceEvent, DeviceOutbox};
use crate::peer::PeerRequest;
use crate::screen::TerminalScreen;
use crate::view;

/// Frame tick while animations run (~16 FPS)
const FRAME_INTERVAL: Duration = Duration::from_millis(60);

/// Terminal device application
pub struct App {
    checklist: Checklist<DeviceOutbox, TerminalScreen>,
    device_events: mpsc::Receiver<DeviceEvent>,
    requests: mpsc::Sender<PeerRequest>,
    selected: usize,
    running: bool,
}

impl App {
    /// Wire the device core to the link
    #[must_use]
    pub fn new(
        config: &DeviceConfig,
        outbox: DeviceOutbox,
        device_events: mpsc::Receiver<DeviceEvent>,
        requests: mpsc::Sender<PeerRequest>,
    ) -> Self {
        let screen = TerminalScreen::new(DEFAULT_TITLE, config.presentation.layout);

        Self {
            checklist: Checklist::new(outbox, screen, config),
            device_events,
            requests,
            selected: 0,
            running: true,
        }
    }

    /// Main event loop
    ///
    /// # Errors
    ///
    /// Returns an error if drawing to the terminal fails.
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();
        let mut frames = tokio::time::interval(FRAME_INTERVAL);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.render(terminal)?;

        while self.running {
            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key);
                        }
                        Some(Ok(Event::Resize(..))) => self.checklist.screen_mut().mark_dirty(),
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            tracing::error!(error = %err, "Terminal event stream failed");
                            self.running = false;
                        }
                        None => self.running = false,
                    }
                }

                event = self.device_events.recv() => {
                    match event {
                        Some(event) => self.handle_device_event(event),
                        None => {
                            tracing::warn!("Link closed");
                            self.running = false;
                        }
                    }
                }

                _ = frames.tick() => {
                    self.advance_animations(Instant::now());
                }
            }

            self.render(terminal)?;
        }

        Ok(())
    }

    fn render<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        if !self.checklist.screen_mut().take_dirty() {
            return Ok(());
        }

        let screen = self.checklist.screen();
        let selected = self.selected;
        terminal.draw(|frame| view::draw(frame, screen, selected))?;
        Ok(())
    }

    /// Feed one link event to the device core
    pub fn handle_device_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::Message(message) => {
                self.checklist.handle_inbound(&message);
                self.clamp_selection();
            }
            DeviceEvent::InboxDropped(code) => self.checklist.on_inbox_dropped(code),
            DeviceEvent::OutboxFailed(code) => self.checklist.on_outbox_failed(code),
        }
    }

    /// Move animations to `now` and report the finished ones
    pub fn advance_animations(&mut self, now: Instant) {
        if !self.checklist.screen().is_animating() {
            return;
        }

        for handle in self.checklist.screen_mut().advance(now) {
            self.checklist.on_animation_stopped(handle, true);
        }
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.running = false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                self.checklist.screen_mut().mark_dirty();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = self.selected.saturating_add(1);
                self.clamp_selection();
                self.checklist.screen_mut().mark_dirty();
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.selected < self.checklist.screen().records().len() {
                    self.checklist.on_item_selected(self.selected);
                }
            }
            KeyCode::Char('r') => {
                if let Err(err) = self.requests.try_send(PeerRequest::Resend) {
                    tracing::debug!(error = %err, "Resend request not queued");
                }
            }
            _ => {}
        }
    }

    /// Keep the cursor on a drawn row
    fn clamp_selection(&mut self) {
        let len = self.checklist.screen().records().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    /// Row under the cursor
    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Whether the loop should keep going
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The device core
    #[must_use]
    pub fn checklist(&self) -> &Checklist<DeviceOutbox, TerminalScreen> {
        &self.checklist
    }
}
