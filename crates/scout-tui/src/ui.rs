use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use scout_core::ChatRole;

use crate::app::App;

fn role_label(role: ChatRole) -> Line<'static> {
    match role {
        ChatRole::User => Line::from(Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        ChatRole::Assistant => Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    }
}

fn chat_text(app: &App) -> Text<'_> {
    let session = &app.session;

    if session.history.is_empty() && !app.is_busy() && session.last_error.is_none() {
        return Text::from(Span::styled(
            "Ask me anything...",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let mut lines: Vec<Line> = Vec::new();

    for msg in &session.history {
        lines.push(role_label(msg.role));
        for line in msg.content.lines() {
            lines.push(Line::from(line));
        }
        lines.push(Line::default());
    }

    if app.is_thinking() {
        lines.push(role_label(ChatRole::Assistant));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    } else if !session.pending_text.is_empty() {
        lines.push(role_label(ChatRole::Assistant));
        for line in session.pending_text.lines() {
            lines.push(Line::from(line));
        }
    }

    if let Some(error) = &session.last_error {
        lines.push(Line::from(Span::styled(
            error.as_str(),
            Style::default().fg(Color::White).bg(Color::Red),
        )));
    }

    Text::from(lines)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let [chat_area, input_area, help_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    let resized = app.chat_height != chat_area.height.saturating_sub(2)
        || app.chat_width != chat_area.width.saturating_sub(2);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);
    if resized && app.follow {
        app.scroll_to_bottom();
    }

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(app.title.as_str());

    let chat = Paragraph::new(chat_text(app))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.scroll, 0));

    frame.render_widget(chat, chat_area);

    // Input is disabled while an exchange is running
    let busy = app.is_busy();
    let (input_title, input_color) = if busy {
        (" Thinking... ", Color::DarkGray)
    } else {
        (" Ask (Enter to send) ", Color::Yellow)
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_color))
        .title(input_title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input_style = if busy {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let input = Paragraph::new(visible_text)
        .style(input_style)
        .block(input_block);

    frame.render_widget(input, input_area);

    if !busy {
        frame.set_cursor_position((
            input_area.x + 1 + (cursor_pos - scroll_offset) as u16,
            input_area.y + 1,
        ));
    }

    let help = Paragraph::new(Line::from(vec![
        Span::styled("Enter", Style::default().fg(Color::Cyan)),
        Span::raw(" send  "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Cyan)),
        Span::raw(" scroll  "),
        Span::styled("Esc", Style::default().fg(Color::Cyan)),
        Span::raw(" quit"),
    ]))
    .style(Style::default().fg(Color::DarkGray));

    frame.render_widget(help, help_area);
}
