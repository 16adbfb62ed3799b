//! Simulated Phone
//!
//! Runs a [`Companion`] as a background task next to the terminal device:
//! loads the document once at startup, streams it, applies toggles coming
//! back from the device and restarts the transfer on request.

use checksync_companion::{
    Companion, CompanionError, LinkError, PeerLink, LOAD_FAILED_STATUS, RETRY_DELAY,
};
use checksync_core::{Dictionary, MessageKey};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::link::CompanionLink;

/// Requests from the terminal user to the phone
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerRequest {
    /// Reload the document and send the whole list again
    Resend,
}

/// Serve the device until either channel closes
pub async fn run_peer(
    mut companion: Companion,
    mut link: CompanionLink,
    mut from_device: mpsc::Receiver<Dictionary>,
    mut requests: mpsc::Receiver<PeerRequest>,
) {
    let mut transfer = start_transfer(&mut companion, &link).await;

    loop {
        tokio::select! {
            message = from_device.recv() => {
                let Some(message) = message else { break };
                match companion.handle_device_message(&message, &mut link).await {
                    Ok(()) => {}
                    Err(CompanionError::Link(LinkError::Closed)) => break,
                    Err(err) => tracing::warn!(error = %err, "Device message not applied"),
                }
            }
            request = requests.recv() => {
                let Some(PeerRequest::Resend) = request else { break };
                if let Some(previous) = transfer.take() {
                    previous.abort();
                }
                tracing::info!("Resending list");
                transfer = start_transfer(&mut companion, &link).await;
            }
        }
    }

    if let Some(running) = transfer {
        running.abort();
    }
    tracing::debug!("Phone stopped");
}

async fn start_transfer(companion: &mut Companion, link: &CompanionLink) -> Option<JoinHandle<()>> {
    let mut link = link.clone();

    match companion.load().await {
        Ok(mut plan) => Some(tokio::spawn(async move {
            match plan.run(&mut link, RETRY_DELAY).await {
                Ok(retries) => tracing::debug!(retries, "List delivered"),
                Err(err) => tracing::warn!(error = %err, "List transfer abandoned"),
            }
        })),
        Err(err) => {
            tracing::error!(error = %err, "Cannot load checklist");
            let status = Dictionary::new().with(MessageKey::SetStatus, LOAD_FAILED_STATUS);
            if let Err(err) = link.send(status).await {
                tracing::debug!(error = %err, "Load failure not shown on device");
            }
            None
        }
    }
}
