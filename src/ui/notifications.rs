//! Notifications Panel UI
//!
//! Renders the command history panel overlay.

use super::centered_rect;
use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};
use tazvm::notification::NotificationStatus;

pub fn render(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(80, 70, f.area());
    f.render_widget(Clear, popup_area);

    let in_progress = app.notification_manager.in_progress_count();
    let title = if in_progress > 0 {
        format!(" Command History [{} pending] ", in_progress)
    } else {
        " Command History ".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner_area = block.inner(popup_area);
    f.render_widget(block, popup_area);

    if !app.notification_manager.has_notifications() {
        let msg = Paragraph::new("No commands sent yet")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(msg, inner_area);
        return;
    }

    let header_cells = [" STATUS", " ACTION", " VM", " RESULT", " TIME AGO"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });
    let header = Row::new(header_cells).height(1);

    let rows = app.notification_manager.notifications.iter().map(|notif| {
        let (status_color, result) = match &notif.status {
            NotificationStatus::Pending => (Color::DarkGray, "sending...".to_string()),
            NotificationStatus::Requested => {
                (Color::Green, format!("requested ({})", notif.duration_display()))
            }
            NotificationStatus::Error(err) => (Color::Red, err.clone()),
        };

        Row::new(vec![
            Cell::from(format!(" {}", notif.status.icon())).style(Style::default().fg(status_color)),
            Cell::from(format!(" {}", notif.action)),
            Cell::from(format!(" {}", notif.resource_name)),
            Cell::from(format!(" {}", result)),
            Cell::from(format!(" {}", format_time_ago(notif.created_at.elapsed()))),
        ])
    });

    let widths = [
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Percentage(30),
        Constraint::Min(20),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths).header(header).row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = TableState::default();
    state.select(Some(app.notifications_selected));
    f.render_stateful_widget(table, inner_area, &mut state);

    let help_area = Rect::new(
        popup_area.x + 1,
        popup_area.y + popup_area.height.saturating_sub(1),
        popup_area.width.saturating_sub(2),
        1,
    );
    let help = Line::from(vec![
        Span::styled("j/k", Style::default().fg(Color::Yellow)),
        Span::raw(": navigate  "),
        Span::styled("c", Style::default().fg(Color::Yellow)),
        Span::raw(": clear all  "),
        Span::styled("q/n/Esc", Style::default().fg(Color::Yellow)),
        Span::raw(": close"),
    ]);
    f.render_widget(Paragraph::new(help).alignment(Alignment::Center), help_area);
}

fn format_time_ago(elapsed: std::time::Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}
