//! Event Handling
//!
//! Keyboard handling for tazvm.

use crate::app::{App, Mode};
use anyhow::Result;
use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use std::time::Duration;
use tazvm::resource::Action;

/// Handle events, returns true if app should quit
pub async fn handle_events(app: &mut App) -> Result<bool> {
    if poll(Duration::from_millis(100))? {
        if let Event::Key(key) = read()? {
            return handle_key_event(app, key.code, key.modifiers).await;
        }
    }
    Ok(false)
}

async fn handle_key_event(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    // Global quit shortcut
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    match app.mode {
        Mode::Normal => handle_normal_mode(app, code, modifiers).await,
        Mode::Help => handle_help_mode(app, code),
        Mode::Confirm => handle_confirm_mode(app, code),
        Mode::Warning => handle_warning_mode(app, code),
        Mode::Subscriptions => handle_subscriptions_mode(app, code, modifiers).await,
        Mode::Notifications => handle_notifications_mode(app, code),
    }
}

async fn handle_normal_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    match code {
        KeyCode::Char('q') => return Ok(true),

        // Navigation - vim style + accessible alternatives
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.previous(),
        KeyCode::Home | KeyCode::Char('g') => app.go_to_top(),
        KeyCode::End | KeyCode::Char('G') => app.go_to_bottom(),
        KeyCode::PageDown => app.page_down(10),
        KeyCode::PageUp => app.page_up(10),
        KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.page_down(10);
        },
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.page_up(10);
        },

        // Lifecycle actions
        KeyCode::Char('s') => app.request_action(Action::Start),
        KeyCode::Char('x') => app.request_action(Action::Stop),
        KeyCode::Char('r') => app.request_action(Action::Restart),
        KeyCode::Char('c') => app.copy_public_address(),

        KeyCode::Char('R') => {
            app.refresh().await;
        },
        KeyCode::Char('a') => {
            app.toggle_auto_poll().await;
        },
        KeyCode::Char('p') => {
            app.enter_subscriptions_mode();
        },
        KeyCode::Char('n') => {
            app.enter_notifications_mode();
        },
        KeyCode::Char('?') => {
            app.enter_help_mode();
        },
        KeyCode::Esc => {
            app.error_message = None;
        },
        _ => {},
    }
    Ok(false)
}

fn handle_help_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Enter => {
            app.exit_mode();
        },
        _ => {},
    }
    Ok(false)
}

fn handle_confirm_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
            app.exit_mode();
        },
        KeyCode::Left | KeyCode::Char('h') => {
            if let Some(ref mut pending) = app.pending_action {
                pending.selected_yes = true;
            }
        },
        KeyCode::Right | KeyCode::Char('l') => {
            if let Some(ref mut pending) = app.pending_action {
                pending.selected_yes = false;
            }
        },
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Some(ref mut pending) = app.pending_action {
                pending.selected_yes = true;
            }
            app.confirm_action();
        },
        KeyCode::Enter => {
            app.confirm_action();
        },
        _ => {},
    }
    Ok(false)
}

fn handle_warning_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    if matches!(code, KeyCode::Esc | KeyCode::Enter) {
        app.exit_mode();
    }
    Ok(false)
}

async fn handle_subscriptions_mode(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<bool> {
    match code {
        KeyCode::Esc => {
            app.exit_mode();
        },
        KeyCode::Enter => {
            app.select_scope().await;
        },
        KeyCode::Down => {
            if !app.scope_filtered.is_empty() {
                app.scope_selected = (app.scope_selected + 1).min(app.scope_filtered.len() - 1);
            }
        },
        KeyCode::Up => {
            app.scope_selected = app.scope_selected.saturating_sub(1);
        },
        KeyCode::Backspace => {
            app.scope_search_text.pop();
            app.apply_scope_filter();
        },
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            app.scope_search_text.push(c);
            app.apply_scope_filter();
        },
        _ => {},
    }
    Ok(false)
}

fn handle_notifications_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    let count = app.notification_manager.notifications.len();
    match code {
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('q') => {
            app.exit_mode();
        },
        KeyCode::Char('j') | KeyCode::Down => {
            if count > 0 {
                app.notifications_selected = (app.notifications_selected + 1).min(count - 1);
            }
        },
        KeyCode::Char('k') | KeyCode::Up => {
            app.notifications_selected = app.notifications_selected.saturating_sub(1);
        },
        KeyCode::Char('c') => {
            app.notification_manager.clear();
            app.notifications_selected = 0;
        },
        _ => {},
    }
    Ok(false)
}
