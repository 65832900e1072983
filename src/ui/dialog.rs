//! Confirmation and warning popups

use super::{centered_rect, state_color};
use crate::app::{App, Mode, PendingAction};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tazvm::resource::{Action, Resource};

pub fn render(f: &mut Frame, app: &App) {
    match app.mode {
        Mode::Confirm => {
            if let Some(pending) = &app.pending_action {
                let target = app.resources.iter().find(|r| r.id == pending.resource_id);
                render_confirm(f, pending, target);
            }
        },
        Mode::Warning => {
            if let Some(message) = &app.warning_message {
                render_warning(f, message);
            }
        },
        _ => {},
    }
}

/// What the action does to the VM, shown under the question
fn consequence(action: Action) -> &'static str {
    match action {
        Action::Start => "The VM boots and compute billing resumes.",
        Action::Stop => "The VM is deallocated. Compute billing stops, public IP may change.",
        Action::Restart => "The VM reboots in place. Running sessions are interrupted.",
    }
}

fn detail(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:>15}  ", label), Style::default().fg(Color::DarkGray)),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn confirm_lines(pending: &PendingAction, target: Option<&Resource>) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            pending.message.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if let Some(vm) = target {
        lines.push(detail(
            "Resource group",
            vm.resource_group.clone().unwrap_or_else(|| "-".to_string()),
            Color::White,
        ));
        lines.push(detail("Subscription", vm.subscription_name.clone(), Color::White));
        lines.push(detail(
            "Current state",
            vm.power_state.to_string(),
            state_color(vm.power_state),
        ));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled(
        consequence(pending.action),
        Style::default().fg(Color::Gray),
    )));
    lines.push(Line::from(""));

    let accent = if pending.destructive { Color::Red } else { Color::Green };
    let (yes, no) = if pending.selected_yes {
        (
            Style::default().fg(Color::Black).bg(accent),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::Black).bg(Color::White),
        )
    };
    lines.push(Line::from(vec![
        Span::styled(format!(" [y] {} ", pending.action), yes),
        Span::raw("   "),
        Span::styled(" [n] Cancel ", no),
    ]));

    lines
}

fn popup(f: &mut Frame, area: Rect, title: String, color: Color) -> Rect {
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            title,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);
    inner
}

fn render_confirm(f: &mut Frame, pending: &PendingAction, target: Option<&Resource>) {
    let color = if pending.destructive { Color::Red } else { Color::Yellow };
    let title = format!(" {} {} ", pending.action, pending.resource_name);
    let inner = popup(f, centered_rect(56, 40, f.area()), title, color);

    f.render_widget(
        Paragraph::new(confirm_lines(pending, target))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        inner,
    );
}

fn render_warning(f: &mut Frame, message: &str) {
    let inner = popup(
        f,
        centered_rect(50, 20, f.area()),
        " Warning ".to_string(),
        Color::Yellow,
    );

    let lines = vec![
        Line::from(""),
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "Enter/Esc to dismiss",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        inner,
    );
}
