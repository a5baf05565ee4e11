//! Toast notifications and their history.

use crate::error::{FetchError, WalletError};
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Oldest entries are dropped beyond this
const MAX_HISTORY: usize = 50;

const TOAST_DURATION: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

impl NotificationKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            NotificationKind::Info => "[i]",
            NotificationKind::Success => "[OK]",
            NotificationKind::Error => "[!!]",
        }
    }
}

#[derive(Clone, Debug)]
pub struct NotificationEntry {
    pub kind: NotificationKind,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl NotificationEntry {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: Local::now(),
        }
    }

    pub fn time_ago(&self) -> String {
        self.time_ago_at(Local::now())
    }

    fn time_ago_at(&self, now: DateTime<Local>) -> String {
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

/// Notification history plus the state of the transient toast.
#[derive(Default)]
pub struct Notifications {
    entries: VecDeque<NotificationEntry>,
    toast_until: Option<Instant>,
}

impl Notifications {
    pub fn push(&mut self, kind: NotificationKind, message: impl Into<String>) {
        let entry = NotificationEntry::new(kind, message);
        match kind {
            NotificationKind::Error => tracing::warn!("{}", entry.message),
            _ => tracing::info!("{}", entry.message),
        }
        self.entries.push_back(entry);
        while self.entries.len() > MAX_HISTORY {
            self.entries.pop_front();
        }
        self.toast_until = Some(Instant::now() + TOAST_DURATION);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NotificationKind::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(NotificationKind::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NotificationKind::Error, message);
    }

    pub fn latest(&self) -> Option<&NotificationEntry> {
        self.entries.back()
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &NotificationEntry> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.toast_until = None;
    }

    pub fn toast_visible(&self) -> bool {
        self.toast_until.is_some_and(|until| Instant::now() < until)
    }
}

/// User-facing text for a failed feed fetch.
pub fn fetch_error_message(err: &FetchError) -> String {
    match err {
        FetchError::Timeout(_) => format!("Failed to fetch transactions: {}. Showing last known data.", err),
        FetchError::Validation(msg) => msg.clone(),
        _ => format!("Failed to fetch transactions: {}", err),
    }
}

/// User-facing text for a failed wallet call, with Ledger hints where useful.
pub fn wallet_error_message(err: &WalletError) -> String {
    match err {
        WalletError::UserRejected => "Request was rejected in the wallet.".to_string(),
        WalletError::Unavailable(msg) => format!(
            "Wallet unavailable: {}\n\nConnect and unlock your Ledger and open the Ethereum app, or set ETH_PRIVATE_KEY.",
            msg
        ),
        WalletError::Network(msg) if msg.contains("6a80") || msg.contains("INVALID_DATA") => format!(
            "Wallet error: {}\n\nMake sure \"Blind Signing\" is enabled in your Ledger Ethereum app settings.",
            msg
        ),
        other => other.to_string(),
    }
}
