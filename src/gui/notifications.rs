//! Notification entries shown in the overlay and history popup.

use crate::format;
use crate::session::SessionEvent;

/// A notification entry with message and timestamp
#[derive(Clone)]
pub struct NotificationEntry {
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

impl NotificationEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: chrono::Local::now(),
        }
    }

    pub fn time_ago(&self) -> String {
        let now = chrono::Local::now();
        let duration = now.signed_duration_since(self.timestamp);
        if duration.num_seconds() < 60 {
            "just now".to_string()
        } else if duration.num_minutes() < 60 {
            format!("{}m ago", duration.num_minutes())
        } else if duration.num_hours() < 24 {
            format!("{}h ago", duration.num_hours())
        } else {
            self.timestamp.format("%m/%d %H:%M").to_string()
        }
    }
}

impl From<&SessionEvent> for NotificationEntry {
    fn from(event: &SessionEvent) -> Self {
        NotificationEntry::new(session_event_message(event))
    }
}

pub fn session_event_message(event: &SessionEvent) -> String {
    match event {
        SessionEvent::DropSent {
            cluster,
            hashes,
            recipients,
            ..
        } => format!(
            "[OK] Drop sent on {}: {} transaction(s) to {} recipient(s)",
            cluster,
            hashes.len(),
            recipients
        ),
        SessionEvent::DropPartiallySent {
            cluster,
            hashes,
            recipients,
            error,
        } => format!(
            "[!!] Drop on {} stopped after {} of {} recipient(s): {}. Check the After column before sending again",
            cluster,
            hashes.len(),
            recipients,
            error
        ),
        SessionEvent::DropFailed(reason) => format!("[XX] Drop failed: {}", reason),
        SessionEvent::DevFunded { cluster, amount } => format!(
            "[OK] Funded signing account with {} {} on {}",
            format::format_native(*amount),
            cluster.native_token(),
            cluster
        ),
        SessionEvent::DevFundingFailed(reason) => format!("[XX] Dev funding failed: {}", reason),
        SessionEvent::DevMinted { cluster, amount } => {
            format!("[OK] Minted {} token units to signing account on {}", amount, cluster)
        }
        SessionEvent::DevMintFailed(reason) => format!("[XX] Dev minting failed: {}", reason),
    }
}
