//! Terminal User Interface rendering module
//!
//! Renders the VM table, stats footer and overlays using ratatui.
//!
//! # Architecture
//!
//! - [`splash`] - Startup splash screen
//! - `header` - Header bar with scope and auto-poll state
//! - `help` - Help overlay showing keybindings
//! - `dialog` - Confirmation and warning dialogs
//! - `subscriptions` - Scope selector
//! - `notifications` - Dispatch history panel
//!
//! Only visible rows are rendered, with a scrollbar indicating position.

mod dialog;
mod header;
mod help;
mod notifications;
pub mod splash;
mod subscriptions;

use crate::app::{App, Mode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState,
        Table, TableState,
    },
    Frame,
};
use tazvm::notification::NotificationStatus;
use tazvm::resource::{PowerState, Resource};

pub fn render(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Header
            Constraint::Min(1),    // VM table
            Constraint::Length(1), // Stats footer
            Constraint::Length(1), // Status line
        ])
        .split(f.area());

    header::render(f, app, chunks[0]);

    match app.mode {
        Mode::Subscriptions => subscriptions::render(f, app, chunks[1]),
        _ => render_table(f, app, chunks[1]),
    }

    render_stats(f, app, chunks[2]);
    render_status_line(f, app, chunks[3]);

    // Overlays
    match app.mode {
        Mode::Help => help::render(f),
        Mode::Confirm | Mode::Warning => dialog::render(f, app),
        Mode::Notifications => notifications::render(f, app),
        _ => {},
    }
}

/// Status dot color per power state
pub fn state_color(state: PowerState) -> Color {
    match state {
        PowerState::Running => Color::Green,
        PowerState::Stopped => Color::Red,
        PowerState::Transitioning => Color::Yellow,
        PowerState::Unknown => Color::Gray,
    }
}

fn render_table(f: &mut Frame, app: &mut App, area: Rect) {
    let title = if app.loading {
        " Virtual Machines (loading...) ".to_string()
    } else {
        format!(" Virtual Machines [{}] ", app.resources.len())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    if app.resources.is_empty() {
        let msg = Paragraph::new("No virtual machines in this scope (R to refresh, p to switch)")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(msg, inner_area);
        return;
    }

    // Account for header row
    let visible_height = (inner_area.height as usize).saturating_sub(1);
    app.update_viewport(visible_height);
    app.ensure_visible();

    let total_items = app.resources.len();
    let needs_scrollbar = total_items > visible_height;
    let table_area = if needs_scrollbar {
        Rect {
            width: inner_area.width.saturating_sub(1),
            ..inner_area
        }
    } else {
        inner_area
    };

    let header_cells = ["", " NAME", " STATE", " SUBSCRIPTION", " RESOURCE GROUP", " PUBLIC IP"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });
    let header = Row::new(header_cells).height(1);

    let range = app.visible_range();
    let rows: Vec<Row> = app.resources[range.clone()].iter().map(resource_row).collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Percentage(25),
        Constraint::Length(15),
        Constraint::Percentage(22),
        Constraint::Percentage(22),
        Constraint::Length(17),
    ];

    let table = Table::new(rows, widths).header(header).row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = TableState::default();
    if app.selected >= range.start && app.selected < range.end {
        state.select(Some(app.selected - range.start));
    }

    f.render_stateful_widget(table, table_area, &mut state);

    if needs_scrollbar {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .symbols(symbols::scrollbar::VERTICAL)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));

        let mut scrollbar_state = ScrollbarState::new(total_items.saturating_sub(visible_height))
            .position(app.scroll_offset);

        f.render_stateful_widget(scrollbar, inner_area, &mut scrollbar_state);
    }
}

fn resource_row(resource: &Resource) -> Row<'static> {
    let color = state_color(resource.power_state);
    let state_text = if resource.power_state == PowerState::Transitioning {
        format!(" {} ↻", resource.power_state)
    } else {
        format!(" {}", resource.power_state)
    };

    Row::new(vec![
        Cell::from(" ●").style(Style::default().fg(color)),
        Cell::from(format!(" {}", truncate_string(&resource.name, 38))),
        Cell::from(state_text).style(Style::default().fg(color)),
        Cell::from(format!(" {}", truncate_string(&resource.subscription_name, 30))),
        Cell::from(format!(
            " {}",
            resource.resource_group.as_deref().unwrap_or("-")
        )),
        Cell::from(format!(
            " {}",
            resource.public_address.as_deref().unwrap_or("-")
        )),
    ])
}

fn render_stats(f: &mut Frame, app: &App, area: Rect) {
    let summary = &app.summary;
    let mut spans = vec![
        Span::styled(" Machines: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            summary.total.to_string(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
    ];

    for state in PowerState::ALL {
        let count = summary.count(state);
        if count == 0 {
            continue;
        }
        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled("● ", Style::default().fg(state_color(state))));
        spans.push(Span::raw(format!("{}: {}", state, count)));
    }

    if summary.by_subscription.len() > 1 {
        let per_sub: Vec<String> = summary
            .by_subscription
            .iter()
            .map(|s| format!("{} {}", s.subscription_name, s.count))
            .collect();
        spans.push(Span::styled(
            format!("  ({})", per_sub.join(", ")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_status_line(f: &mut Frame, app: &App, area: Rect) {
    let toast = app.notification_manager.current_toast();

    let notification_indicator = {
        let in_progress = app.notification_manager.in_progress_count();
        if in_progress > 0 {
            format!(" [↻{}]", in_progress)
        } else if app.notification_manager.has_notifications() {
            " [n]".to_string()
        } else {
            String::new()
        }
    };

    let flash = app.notification_manager.current_flash();

    let status_text = if let Some(err) = &app.error_message {
        format!("Error: {}", err)
    } else if let Some(message) = flash {
        format!("✓ {}", message)
    } else if let Some(notif) = toast {
        notif.toast_message()
    } else if app.loading {
        "Loading...".to_string()
    } else if let Some(resource) = app.selected_resource() {
        format!(
            "Sub: {} | RG: {}",
            resource.subscription_name,
            resource.resource_group.as_deref().unwrap_or("-")
        )
    } else {
        String::new()
    };

    let style = if app.error_message.is_some() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else if flash.is_some() {
        Style::default().fg(Color::Green)
    } else if let Some(notif) = toast {
        match notif.status {
            NotificationStatus::Requested => Style::default().fg(Color::Green),
            NotificationStatus::Error(_) => Style::default().fg(Color::Red),
            NotificationStatus::Pending => Style::default().fg(Color::Yellow),
        }
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let line = Line::from(vec![
        Span::styled(format!(" {}", status_text), style),
        Span::styled(notification_indicator, Style::default().fg(Color::Cyan)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

/// Truncate string for display (Unicode-safe)
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

/// Rect centered in `r`, sized in percent of it
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
