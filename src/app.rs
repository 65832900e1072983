//! Application State
//!
//! Central application state management for tazvm.

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use tazvm::azure::format_azure_error;
use tazvm::config::Config;
use tazvm::notification::NotificationManager;
use tazvm::resource::{
    Action, DirectoryEvent, DispatchReceipt, Fleet, FleetError, Resource, Scope, Subscription,
    Summary,
};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

/// Default viewport height (updated during render based on terminal size)
const DEFAULT_VIEWPORT_HEIGHT: usize = 20;

/// Application modes
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,        // Viewing the VM table
    Help,          // ? help popup
    Confirm,       // Confirmation dialog
    Warning,       // Warning/info dialog (OK only)
    Subscriptions, // Scope selection
    Notifications, // Notifications history panel
}

/// Lifecycle action waiting for confirmation
#[derive(Debug, Clone)]
pub struct PendingAction {
    pub action: Action,
    pub resource_id: String,
    pub resource_name: String,
    pub message: String,
    pub destructive: bool,
    pub selected_yes: bool,
}

/// Entry of the scope selector
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeOption {
    pub label: String,
    /// `None` for the "all subscriptions" entry
    pub subscription_id: Option<String>,
    pub scope: Scope,
}

impl ScopeOption {
    fn matches_filter(&self, filter: &str) -> bool {
        self.label.to_lowercase().contains(filter)
            || self
                .subscription_id
                .as_deref()
                .is_some_and(|id| id.to_lowercase().contains(filter))
    }
}

/// Result of a background dispatch, delivered back to the UI loop
struct DispatchOutcome {
    notification_id: Uuid,
    result: Result<DispatchReceipt, String>,
}

pub struct App {
    pub fleet: Arc<Fleet>,
    events: broadcast::Receiver<DirectoryEvent>,

    // Snapshot of the directory
    pub resources: Vec<Resource>,
    pub summary: Summary,
    pub selected: usize,
    pub mode: Mode,

    // Scope
    pub scope: Scope,
    pub subscriptions: Vec<Subscription>,
    pub scope_options: Vec<ScopeOption>,
    pub scope_filtered: Vec<ScopeOption>,
    pub scope_search_text: String,
    pub scope_selected: usize,

    // Confirmation
    pub pending_action: Option<PendingAction>,

    // UI state
    pub loading: bool,
    pub error_message: Option<String>,
    pub warning_message: Option<String>,
    pub config: Config,
    pub readonly: bool,

    // Auto-poll
    pub poll_interval: Duration,
    pub auto_polling: bool,

    // Notifications
    pub notification_manager: NotificationManager,
    pub notifications_selected: usize,
    outcome_tx: mpsc::UnboundedSender<DispatchOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<DispatchOutcome>,

    // Opened on first copy; kept so the selection outlives the call
    clipboard: Option<arboard::Clipboard>,

    // Virtual scrolling
    pub viewport_height: usize,
    pub scroll_offset: usize,
}

/// User-facing text for a core error
pub fn describe_error(error: &FleetError) -> String {
    match error {
        FleetError::Provider(e) => format_azure_error(e),
        FleetError::Enumeration { scope, source } => {
            format!("Failed to load VMs for {}: {}", scope, format_azure_error(source))
        },
        other => other.to_string(),
    }
}

impl App {
    /// Create App from pre-initialized components
    pub fn from_initialized(
        fleet: Arc<Fleet>,
        scope: Scope,
        subscriptions: Vec<Subscription>,
        config: Config,
        poll_interval: Duration,
        readonly: bool,
    ) -> Self {
        let events = fleet.subscribe();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let scope_options = build_scope_options(&subscriptions);

        Self {
            fleet,
            events,
            resources: Vec::new(),
            summary: Summary::default(),
            selected: 0,
            mode: Mode::Normal,
            scope,
            subscriptions,
            scope_filtered: scope_options.clone(),
            scope_options,
            scope_search_text: String::new(),
            scope_selected: 0,
            pending_action: None,
            loading: false,
            error_message: None,
            warning_message: None,
            config,
            readonly,
            poll_interval,
            auto_polling: false,
            notification_manager: NotificationManager::new(),
            notifications_selected: 0,
            outcome_tx,
            outcome_rx,
            clipboard: None,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            scroll_offset: 0,
        }
    }

    // =========================================================================
    // Directory Snapshot
    // =========================================================================

    /// Re-read the directory into the table state
    pub async fn reload_snapshot(&mut self) {
        let snapshot = self.fleet.all().await;
        self.summary = Summary::from_snapshot(&snapshot);
        self.resources = snapshot.into_vec();

        if self.selected >= self.resources.len() {
            self.selected = self.resources.len().saturating_sub(1);
        }
        self.ensure_visible();
    }

    /// Apply pending core events and dispatch outcomes.
    /// Returns true when the screen needs a redraw.
    pub async fn process_background(&mut self) -> bool {
        let mut dirty = false;
        loop {
            match self.events.try_recv() {
                Ok(_) => dirty = true,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::debug!("Skipped {} directory events", skipped);
                    dirty = true;
                },
                Err(_) => break,
            }
        }
        if dirty {
            self.reload_snapshot().await;
        }

        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.apply_outcome(outcome);
            dirty = true;
        }

        dirty
    }

    fn apply_outcome(&mut self, outcome: DispatchOutcome) {
        match outcome.result {
            Ok(receipt) => {
                self.notification_manager
                    .mark_requested(outcome.notification_id, &receipt);
            },
            Err(message) => {
                self.notification_manager
                    .mark_error(outcome.notification_id, message.clone());
                self.error_message = Some(message);
            },
        }
    }

    /// Re-enumerate the current scope
    pub async fn refresh(&mut self) {
        self.loading = true;
        match self.fleet.refresh(&self.scope).await {
            Ok(count) => {
                tracing::info!("Loaded {} VMs for scope {}", count, self.scope.label());
                self.error_message = None;
                if self.scope == Scope::All {
                    self.set_subscriptions(self.fleet.subscriptions().await);
                }
            },
            Err(e) => {
                tracing::warn!("Refresh failed: {}", e);
                self.error_message = Some(describe_error(&e));
            },
        }
        self.loading = false;
        self.reload_snapshot().await;
    }

    pub fn selected_resource(&self) -> Option<&Resource> {
        self.resources.get(self.selected)
    }

    /// Display name of the active scope
    pub fn scope_display(&self) -> String {
        match &self.scope {
            Scope::All => "All subscriptions".to_string(),
            Scope::Subscription(key) => self
                .subscriptions
                .iter()
                .find(|s| s.matches(key))
                .map(|s| s.display_name.clone())
                .unwrap_or_else(|| key.clone()),
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn next(&mut self) {
        if self.resources.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.resources.len() - 1);
        self.ensure_visible();
    }

    pub fn previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.ensure_visible();
    }

    pub fn go_to_top(&mut self) {
        self.selected = 0;
        self.ensure_visible();
    }

    pub fn go_to_bottom(&mut self) {
        self.selected = self.resources.len().saturating_sub(1);
        self.ensure_visible();
    }

    pub fn page_down(&mut self, page_size: usize) {
        if self.resources.is_empty() {
            return;
        }
        self.selected = (self.selected + page_size).min(self.resources.len() - 1);
        self.ensure_visible();
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.selected = self.selected.saturating_sub(page_size);
        self.ensure_visible();
    }

    // =========================================================================
    // Modes
    // =========================================================================

    pub fn enter_help_mode(&mut self) {
        self.mode = Mode::Help;
    }

    pub fn enter_notifications_mode(&mut self) {
        self.notifications_selected = 0;
        self.mode = Mode::Notifications;
    }

    pub fn show_warning(&mut self, message: &str) {
        self.warning_message = Some(message.to_string());
        self.mode = Mode::Warning;
    }

    pub fn exit_mode(&mut self) {
        self.mode = Mode::Normal;
        self.pending_action = None;
        self.warning_message = None;
    }

    // =========================================================================
    // Lifecycle Actions
    // =========================================================================

    /// Start right away; stop and restart ask first
    pub fn request_action(&mut self, action: Action) {
        if self.readonly {
            self.show_warning("Read-only mode: lifecycle actions are disabled");
            return;
        }
        let Some(resource) = self.selected_resource() else {
            return;
        };
        let resource_id = resource.id.clone();
        let resource_name = resource.name.clone();

        match action {
            Action::Start => self.dispatch(action, &resource_id, &resource_name),
            Action::Stop | Action::Restart => {
                self.pending_action = Some(PendingAction {
                    action,
                    message: format!("{} '{}'?", action.display_name(), resource_name),
                    resource_id,
                    resource_name,
                    destructive: action == Action::Stop,
                    selected_yes: false,
                });
                self.mode = Mode::Confirm;
            },
        }
    }

    /// Run the confirmed action, if the dialog ended on "Yes"
    pub fn confirm_action(&mut self) {
        if let Some(pending) = self.pending_action.take() {
            if pending.selected_yes {
                self.dispatch(pending.action, &pending.resource_id, &pending.resource_name);
            }
        }
        self.mode = Mode::Normal;
    }

    /// Send the command in the background; the outcome arrives via
    /// [`App::process_background`]
    fn dispatch(&mut self, action: Action, resource_id: &str, resource_name: &str) {
        let notification_id = self
            .notification_manager
            .create_notification(action, resource_name);

        let fleet = Arc::clone(&self.fleet);
        let tx = self.outcome_tx.clone();
        let resource_id = resource_id.to_string();

        tokio::spawn(async move {
            let result = fleet
                .dispatch(action, &resource_id)
                .await
                .map_err(|e| describe_error(&e));
            let _ = tx.send(DispatchOutcome {
                notification_id,
                result,
            });
        });
    }

    // =========================================================================
    // Clipboard
    // =========================================================================

    /// Copy the selected VM's public IP to the system clipboard
    pub fn copy_public_address(&mut self) {
        let Some(resource) = self.selected_resource() else {
            return;
        };
        let name = resource.name.clone();
        let Some(address) = resource.public_address.clone() else {
            self.show_warning(&format!("'{}' has no public IP address", name));
            return;
        };

        match self.write_clipboard(&address) {
            Ok(()) => {
                tracing::debug!("Copied public IP of {} to clipboard", name);
                self.notification_manager
                    .flash(format!("Copied {} ({})", address, name));
            },
            Err(e) => {
                tracing::warn!("Clipboard copy failed: {}", e);
                self.error_message = Some(format!("Clipboard unavailable: {}", e));
            },
        }
    }

    fn write_clipboard(&mut self, text: &str) -> Result<(), arboard::Error> {
        if self.clipboard.is_none() {
            self.clipboard = Some(arboard::Clipboard::new()?);
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            clipboard.set_text(text)?;
        }
        Ok(())
    }

    // =========================================================================
    // Auto-poll
    // =========================================================================

    pub async fn toggle_auto_poll(&mut self) {
        if self.fleet.is_auto_polling().await {
            self.fleet.stop_auto_poll().await;
            tracing::info!("Auto-poll stopped");
        } else {
            self.fleet.start_auto_poll(self.poll_interval).await;
            tracing::info!("Auto-poll started every {:?}", self.poll_interval);
        }
        self.auto_polling = self.fleet.is_auto_polling().await;
    }

    // =========================================================================
    // Scope Selection
    // =========================================================================

    pub fn set_subscriptions(&mut self, subscriptions: Vec<Subscription>) {
        self.scope_options = build_scope_options(&subscriptions);
        self.subscriptions = subscriptions;
        self.apply_scope_filter();
    }

    pub fn enter_subscriptions_mode(&mut self) {
        self.scope_search_text.clear();
        self.scope_filtered = self.scope_options.clone();
        self.scope_selected = self
            .scope_filtered
            .iter()
            .position(|o| self.is_current_scope(o))
            .unwrap_or(0);
        self.mode = Mode::Subscriptions;
    }

    pub fn is_current_scope(&self, option: &ScopeOption) -> bool {
        scope_option_matches(option, &self.scope, &self.subscriptions)
    }

    pub fn apply_scope_filter(&mut self) {
        let filter = self.scope_search_text.to_lowercase();
        self.scope_filtered = if filter.is_empty() {
            self.scope_options.clone()
        } else {
            self.scope_options
                .iter()
                .filter(|o| o.matches_filter(&filter))
                .cloned()
                .collect()
        };
        if self.scope_selected >= self.scope_filtered.len() {
            self.scope_selected = 0;
        }
    }

    /// Switch to the highlighted scope, persist it and reload
    pub async fn select_scope(&mut self) {
        if let Some(option) = self.scope_filtered.get(self.scope_selected).cloned() {
            self.scope = option.scope;
            if let Err(e) = self.config.set_scope(&self.scope) {
                tracing::warn!("Failed to save scope to config: {}", e);
            }
            self.selected = 0;
            self.scroll_offset = 0;
            self.exit_mode();
            self.refresh().await;
        } else {
            self.exit_mode();
        }
    }

    // =========================================================================
    // Virtual Scrolling
    // =========================================================================

    /// Update the viewport height (called from UI during render)
    pub fn update_viewport(&mut self, height: usize) {
        self.viewport_height = height.max(1);
    }

    /// Ensure the selected item is visible in the viewport
    pub fn ensure_visible(&mut self) {
        if self.resources.is_empty() {
            self.scroll_offset = 0;
            return;
        }

        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + self.viewport_height {
            self.scroll_offset = self.selected + 1 - self.viewport_height;
        }

        let max_offset = self.resources.len().saturating_sub(self.viewport_height);
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }

    /// Range of rows currently on screen
    pub fn visible_range(&self) -> Range<usize> {
        let start = self.scroll_offset.min(self.resources.len());
        let end = (self.scroll_offset + self.viewport_height).min(self.resources.len());
        start..end
    }
}

fn build_scope_options(subscriptions: &[Subscription]) -> Vec<ScopeOption> {
    let mut options = vec![ScopeOption {
        label: "All subscriptions".to_string(),
        subscription_id: None,
        scope: Scope::All,
    }];
    options.extend(subscriptions.iter().map(|s| ScopeOption {
        label: s.display_name.clone(),
        subscription_id: Some(s.id.clone()),
        scope: Scope::Subscription(s.id.clone()),
    }));
    options
}

fn scope_option_matches(option: &ScopeOption, scope: &Scope, subscriptions: &[Subscription]) -> bool {
    match (&option.scope, scope) {
        (Scope::All, Scope::All) => true,
        (Scope::Subscription(id), Scope::Subscription(key)) => {
            id == key
                || subscriptions
                    .iter()
                    .any(|s| &s.id == id && s.matches(key))
        },
        _ => false,
    }
}
