//! Header Component
//!
//! Displays scope, auto-poll state and action hints.

use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tazvm::resource::Scope;
use tazvm::VERSION;

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" tazvm v{} ", VERSION),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    // Row 1: Scope and auto-poll
    let (poll_text, poll_color) = if app.auto_polling {
        (
            format!("every {}s", app.poll_interval.as_secs()),
            Color::Green,
        )
    } else {
        ("off".to_string(), Color::DarkGray)
    };

    let scope_line = Line::from(vec![
        Span::styled(" Subscription: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.scope_display(),
            Style::default()
                .fg(if app.scope == Scope::All {
                    Color::Yellow
                } else {
                    Color::Green
                })
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("Auto-poll: ", Style::default().fg(Color::DarkGray)),
        Span::styled(poll_text, Style::default().fg(poll_color)),
    ]);
    f.render_widget(Paragraph::new(scope_line), rows[0]);

    // Row 2: Actions
    let action_style = if app.readonly {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let actions_line = Line::from(vec![
        Span::styled(" Actions:", Style::default().fg(Color::DarkGray)),
        Span::styled(" [s]Start ", action_style),
        Span::styled(" [x]Stop ", Style::default().fg(Color::Red)),
        Span::styled(" [r]Restart ", action_style),
        Span::styled(" [c]Copy IP ", Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(actions_line), rows[1]);

    // Row 3: Help hint
    let help_line = Line::from(vec![
        Span::styled(
            " ?:help  R:refresh  p:subscription  a:auto-poll  n:history  q:quit",
            Style::default().fg(Color::DarkGray),
        ),
        if app.readonly {
            Span::styled(
                "  [READ-ONLY]",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw("")
        },
    ]);
    f.render_widget(Paragraph::new(help_line), rows[2]);
}
