//! Subscription picker
//!
//! Lists "all" plus every enabled subscription with its id and how many VMs
//! of it are currently loaded.

use super::{centered_rect, truncate_string};
use crate::app::{App, ScopeOption};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};
use tazvm::resource::Summary;

/// Loaded VMs of the option's subscription; unknown for "all" and for
/// subscriptions outside the current scope
fn loaded_count(summary: &Summary, option: &ScopeOption) -> Option<usize> {
    let id = option.subscription_id.as_deref()?;
    summary
        .by_subscription
        .iter()
        .find(|s| s.subscription_id == id)
        .map(|s| s.count)
}

fn option_row<'a>(app: &App, option: &'a ScopeOption) -> Row<'a> {
    let current = app.is_current_scope(option);
    let name_style = if current {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let vms = match (&option.subscription_id, loaded_count(&app.summary, option)) {
        (None, _) => String::new(),
        (Some(_), Some(n)) => n.to_string(),
        (Some(_), None) => "-".to_string(),
    };

    Row::new(vec![
        Cell::from(if current { "●" } else { " " }).style(Style::default().fg(Color::Green)),
        Cell::from(truncate_string(&option.label, 32)).style(name_style),
        Cell::from(option.subscription_id.as_deref().unwrap_or("")).style(Style::default().fg(Color::DarkGray)),
        Cell::from(vms).style(Style::default().fg(Color::Cyan)),
    ])
}

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect(70, 60, area);
    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Subscription scope ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Line::from(Span::styled(
            " Enter:switch  Esc:cancel  type to filter by name or id ",
            Style::default().fg(Color::DarkGray),
        )));
    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let [filter_area, table_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .areas(inner);

    let filter_line = Line::from(vec![
        Span::styled(" Filter: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{}▏", app.scope_search_text),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!("  {} of {}", app.scope_filtered.len(), app.scope_options.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(filter_line), filter_area);

    let header = Row::new(["", "NAME", "SUBSCRIPTION ID", "VMS"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = app
        .scope_filtered
        .iter()
        .map(|option| option_row(app, option))
        .collect();
    let widths = [
        Constraint::Length(2),
        Constraint::Percentage(40),
        Constraint::Min(20),
        Constraint::Length(5),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = TableState::default();
    if !app.scope_filtered.is_empty() {
        state.select(Some(app.scope_selected));
    }
    f.render_stateful_widget(table, table_area, &mut state);
}
