//! Simulator Flow Tests
//!
//! Runs the in-process phone against a device core over a reliable link
//! and a markdown file on disk:
//!
//! 1. **Startup transfer**: the document's open tasks show up on the device
//! 2. **Toggle round trip**: a check on the device is written to the file,
//!    with the save shown on the status line
//! 3. **Resend**: a resend request delivers the reloaded document, keeping
//!    the old rows on screen until it is complete

use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use checksync_companion::{Companion, StoreSettings, SAVING_STATUS};
use checksync_core::list::DEFAULT_TITLE;
use checksync_core::{Checklist, DeviceConfig, MessageKey, SyncPhase};
use checksync_tui::{run_peer, DeviceEvent, DeviceOutbox, Link, LinkFaults, PeerRequest, TerminalScreen};

const WAIT: Duration = Duration::from_secs(5);

struct Device {
    checklist: Checklist<DeviceOutbox, TerminalScreen>,
    events: mpsc::Receiver<DeviceEvent>,
    requests: mpsc::Sender<PeerRequest>,
}

impl Device {
    /// Apply the next link event, returning its status text if it had one
    async fn step(&mut self) -> Option<String> {
        let event = timeout(WAIT, self.events.recv())
            .await
            .expect("link went quiet")
            .expect("link closed");

        match event {
            DeviceEvent::Message(message) => {
                let status = message
                    .get_text(MessageKey::SetStatus)
                    .map(str::to_string);
                self.checklist.handle_inbound(&message);
                status
            }
            other => panic!("unexpected event on a reliable link: {other:?}"),
        }
    }

    async fn wait_for_list(&mut self) {
        while self.checklist.list().phase() != SyncPhase::Complete {
            self.step().await;
        }
    }

    fn labels(&self) -> Vec<String> {
        self.checklist
            .list()
            .items()
            .iter()
            .map(|item| item.label.clone())
            .collect()
    }

    fn screen_labels(&self) -> Vec<String> {
        self.checklist
            .screen()
            .records()
            .iter()
            .map(|record| record.label.clone())
            .collect()
    }
}

fn start(path: &Path) -> Device {
    let config = DeviceConfig::default();
    let Link {
        device_outbox,
        device_events,
        companion,
        from_device,
    } = Link::new(LinkFaults::default(), config.inbox_size, config.outbox_size);
    let (requests, request_rx) = mpsc::channel(1);

    let store = StoreSettings::File(path.to_path_buf()).open().unwrap();
    tokio::spawn(run_peer(
        Companion::new(store),
        companion,
        from_device,
        request_rx,
    ));

    let screen = TerminalScreen::new(DEFAULT_TITLE, config.presentation.layout);
    Device {
        checklist: Checklist::new(device_outbox, screen, &config),
        events: device_events,
        requests,
    }
}

#[tokio::test]
async fn test_startup_transfer_fills_the_list() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todo.md");
    tokio::fs::write(&path, "# Groceries\n- [ ] Milk\n- [x] Bread\n- [ ] Eggs\n")
        .await
        .unwrap();

    let mut device = start(&path);
    device.wait_for_list().await;

    assert_eq!(device.checklist.list().title(), "Groceries");
    assert_eq!(device.labels(), vec!["Milk".to_string(), "Eggs".to_string()]);
    assert_eq!(device.checklist.screen().records().len(), 2);
}

#[tokio::test]
async fn test_toggle_is_saved_to_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todo.md");
    tokio::fs::write(&path, "- [ ] Milk\n- [ ] Eggs\n").await.unwrap();

    let mut device = start(&path);
    device.wait_for_list().await;

    device.checklist.on_item_selected(1);
    assert!(device.checklist.list().items()[1].checked);

    // Saving…, then the empty status once the file is written
    assert_eq!(device.step().await.as_deref(), Some(SAVING_STATUS));
    assert_eq!(device.step().await.as_deref(), Some(""));

    let saved = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(saved, "- [ ] Milk\n- [x] Eggs\n");
}

#[tokio::test]
async fn test_resend_delivers_reloaded_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todo.md");
    tokio::fs::write(&path, "# Pantry\n- [ ] Milk\n").await.unwrap();

    let mut device = start(&path);
    device.wait_for_list().await;

    tokio::fs::write(&path, "# Pantry\n- [ ] Milk\n- [ ] Tea\n")
        .await
        .unwrap();
    device.requests.send(PeerRequest::Resend).await.unwrap();

    // The titled count starts a new transfer; the old rows stay on screen
    device.step().await;
    assert!(!device.checklist.list().is_complete());
    assert_eq!(device.screen_labels(), vec!["Milk".to_string()]);

    device.wait_for_list().await;

    assert_eq!(device.checklist.screen().title(), "Pantry");
    assert_eq!(device.labels(), vec!["Milk".to_string(), "Tea".to_string()]);
    assert_eq!(device.screen_labels(), device.labels());
}
