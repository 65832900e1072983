//! Help Overlay

use super::centered_rect;
use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("j/k, ↑/↓", "Move up/down"),
            ("g/G", "Go to top/bottom"),
            ("Ctrl+d/u", "Page down/up"),
        ],
    ),
    (
        "Machines",
        &[
            ("s", "Start selected VM"),
            ("x", "Stop (deallocate) selected VM"),
            ("r", "Restart selected VM"),
            ("c", "Copy public IP to clipboard"),
            ("R", "Reload VMs of the current scope"),
            ("a", "Toggle automatic status polling"),
        ],
    ),
    (
        "Views",
        &[
            ("p", "Choose subscription scope"),
            ("n", "Command history"),
            ("?/Esc", "Close help"),
            ("q", "Quit application"),
        ],
    ),
];

fn key_line(key: &str, description: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", key), Style::default().fg(Color::Yellow)),
        Span::raw(description.to_string()),
    ])
}

pub fn render(f: &mut Frame) {
    let popup_area = centered_rect(60, 70, f.area());
    f.render_widget(Clear, popup_area);

    let mut help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (title, keys) in SECTIONS {
        help_text.push(Line::from(Span::styled(
            *title,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        help_text.extend(keys.iter().map(|(k, d)| key_line(k, d)));
        help_text.push(Line::from(""));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Help ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left);

    f.render_widget(paragraph, popup_area);
}
