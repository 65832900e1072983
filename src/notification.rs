//! Notification System
//!
//! Toasts and history for lifecycle commands sent from the UI.

use crate::resource::{Action, DispatchReceipt};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Status of a dispatched command as seen by the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationStatus {
    /// Sent, waiting for the provider to accept it
    Pending,
    /// Accepted by the provider
    Requested,
    /// Rejected or failed, with a user-facing message
    Error(String),
}

impl NotificationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Pending => "◯",
            Self::Requested => "✓",
            Self::Error(_) => "✗",
        }
    }
}

/// A single notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub action: Action,
    pub resource_name: String,
    pub status: NotificationStatus,
    /// Command id assigned by the dispatcher once accepted
    pub command_id: Option<Uuid>,
    pub created_at: Instant,
    pub completed_at: Option<Instant>,
}

impl Notification {
    pub fn new(action: Action, resource_name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            resource_name: resource_name.to_string(),
            status: NotificationStatus::Pending,
            command_id: None,
            created_at: Instant::now(),
            completed_at: None,
        }
    }

    pub fn set_requested(&mut self, receipt: &DispatchReceipt) {
        self.status = NotificationStatus::Requested;
        self.command_id = Some(receipt.command_id);
        self.completed_at = Some(Instant::now());
    }

    pub fn set_error(&mut self, error: String) {
        self.status = NotificationStatus::Error(error);
        self.completed_at = Some(Instant::now());
    }

    /// Time until the provider answered (or elapsed time while pending)
    pub fn duration(&self) -> Duration {
        self.completed_at
            .unwrap_or_else(Instant::now)
            .duration_since(self.created_at)
    }

    pub fn duration_display(&self) -> String {
        let d = self.duration();
        if d.as_secs() < 1 {
            format!("{}ms", d.as_millis())
        } else if d.as_secs() < 60 {
            format!("{}s", d.as_secs())
        } else {
            format!("{}m{}s", d.as_secs() / 60, d.as_secs() % 60)
        }
    }

    /// Short form for the toast line
    pub fn toast_message(&self) -> String {
        let icon = self.status.icon();
        let action = self.action.display_name();
        match &self.status {
            NotificationStatus::Pending => {
                format!("{} Sending {} for {}...", icon, action.to_lowercase(), self.resource_name)
            }
            NotificationStatus::Requested => {
                format!("{} {} requested for {}", icon, action, self.resource_name)
            }
            NotificationStatus::Error(err) => {
                format!("{} {} failed for {} - {}", icon, action, self.resource_name, err)
            }
        }
    }
}

/// Notification manager
pub struct NotificationManager {
    /// All notifications (recent first)
    pub notifications: VecDeque<Notification>,
    /// Maximum notifications to keep in history
    pub max_history: usize,
    /// Toast display duration
    pub toast_duration: Duration,
    last_toast_time: Option<Instant>,
    /// One-off status text not tied to a command, e.g. a clipboard copy
    flash: Option<(String, Instant)>,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationManager {
    pub fn new() -> Self {
        Self {
            notifications: VecDeque::new(),
            max_history: 50,
            toast_duration: Duration::from_secs(5),
            last_toast_time: None,
            flash: None,
        }
    }

    /// Record a command that is about to be sent
    pub fn create_notification(&mut self, action: Action, resource_name: &str) -> Uuid {
        let notification = Notification::new(action, resource_name);
        let id = notification.id;
        self.notifications.push_front(notification);
        self.flash = None;
        self.last_toast_time = Some(Instant::now());
        self.trim_history();
        id
    }

    pub fn mark_requested(&mut self, id: Uuid, receipt: &DispatchReceipt) {
        if let Some(notif) = self.notifications.iter_mut().find(|n| n.id == id) {
            notif.set_requested(receipt);
            self.last_toast_time = Some(Instant::now());
        }
    }

    pub fn mark_error(&mut self, id: Uuid, error: String) {
        if let Some(notif) = self.notifications.iter_mut().find(|n| n.id == id) {
            notif.set_error(error);
            self.last_toast_time = Some(Instant::now());
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    /// Most recent notification while its toast is still visible
    pub fn current_toast(&self) -> Option<&Notification> {
        let last_time = self.last_toast_time?;
        if last_time.elapsed() > self.toast_duration {
            return None;
        }
        self.notifications.front()
    }

    pub fn flash(&mut self, message: impl Into<String>) {
        self.flash = Some((message.into(), Instant::now()));
    }

    /// Flash text while it is still visible
    pub fn current_flash(&self) -> Option<&str> {
        self.flash
            .as_ref()
            .filter(|(_, at)| at.elapsed() <= self.toast_duration)
            .map(|(message, _)| message.as_str())
    }

    /// Commands still waiting for the provider
    pub fn in_progress_count(&self) -> usize {
        self.notifications
            .iter()
            .filter(|n| n.status == NotificationStatus::Pending)
            .count()
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
        self.last_toast_time = None;
        self.flash = None;
    }

    fn trim_history(&mut self) {
        while self.notifications.len() > self.max_history {
            // Oldest finished entry goes first
            if let Some(pos) = self.notifications.iter().rposition(|n| n.status.is_terminal()) {
                self.notifications.remove(pos);
            } else {
                self.notifications.pop_back();
            }
        }
    }

    pub fn has_notifications(&self) -> bool {
        !self.notifications.is_empty()
    }
}
