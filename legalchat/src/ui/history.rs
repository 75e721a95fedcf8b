use super::*;
use legalchat_core::format::format_relative_str;
use ratatui::widgets::Clear;

use crate::message_format::history_role_label;

/// Render server-side history and user memories over the main view.
pub(super) fn render_history_overlay(frame: &mut Frame, app: &mut App, area: Rect) {
    let popup = centered_rect(80, 75, area);
    frame.render_widget(Clear, popup);

    let state = app.controller.state();
    let block = Block::default()
        .title(format!(" History · session {} ", state.session.id.short()))
        .title_style(Style::default().fg(BORDER_FOCUSED).bold())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_FOCUSED));

    let mut lines: Vec<Line> = vec![Line::from(Span::styled(
        "Conversation",
        Style::default().fg(LABEL_COLOR).bold(),
    ))];

    if state.in_flight.history {
        lines.push(Line::from(Span::styled("  loading…", Style::default().fg(DIM))));
    } else if state.history.is_empty() {
        lines.push(Line::from(Span::styled(
            "  Nothing stored for this session yet.",
            Style::default().fg(DIM).italic(),
        )));
    }

    for entry in &state.history {
        let (role, style) = history_role_label(entry);
        let when = entry
            .timestamp
            .as_deref()
            .map(format_relative_str)
            .unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<10}", role), style),
            Span::styled(when, Style::default().fg(DIM)),
        ]));
        for line in entry.content.lines() {
            lines.push(Line::raw(format!("    {}", line)));
        }
    }

    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Memories",
        Style::default().fg(LABEL_COLOR).bold(),
    )));

    if state.in_flight.memories {
        lines.push(Line::from(Span::styled("  loading…", Style::default().fg(DIM))));
    } else if state.memories.is_empty() {
        lines.push(Line::from(Span::styled(
            "  No memories recorded.",
            Style::default().fg(DIM).italic(),
        )));
    }
    for memory in &state.memories {
        lines.push(Line::raw(format!("  • {}", memory.text())));
    }

    // Clamp scroll offset
    let visible = popup.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(visible);
    if app.history_scroll > max_scroll {
        app.history_scroll = max_scroll;
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.history_scroll as u16, 0));
    frame.render_widget(paragraph, popup);
}
