use super::*;
use legalchat_core::ChatMessage;
use ratatui::widgets::{Scrollbar, ScrollbarOrientation, ScrollbarState};

use crate::message_format::{message_body_style, message_label, message_time, STREAMING_CURSOR};

/// Render the chat transcript with a scrollbar.
pub(super) fn render_transcript(frame: &mut Frame, app: &mut App, area: Rect) {
    let state = app.controller.state();
    let mut lines: Vec<Line> = Vec::new();

    if state.transcript.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "  No messages yet. Pick an agent and ask a question.",
            Style::default().fg(DIM).italic(),
        )));
    }

    for (idx, msg) in state.transcript.messages().iter().enumerate() {
        // Add separator before each message (except first)
        if idx > 0 {
            lines.push(Line::from(Span::styled(
                "─".repeat(40),
                Style::default().fg(SEPARATOR_COLOR),
            )));
        }
        lines.extend(format_message(msg));
        lines.push(Line::raw(""));
    }

    // Inner height, minus the borders
    let visible = area.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(visible);
    if app.follow_transcript || app.transcript_scroll >= max_scroll {
        app.transcript_scroll = max_scroll;
        app.follow_transcript = true;
    }

    let title = format!(" Conversation ({}) ", state.transcript.len());
    let total_lines = lines.len();
    let paragraph = Paragraph::new(lines)
        .block(region_block(title, app.focus == Focus::Transcript))
        .wrap(Wrap { trim: false })
        .scroll((app.transcript_scroll as u16, 0));

    frame.render_widget(paragraph, area);

    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("↑"))
        .end_symbol(Some("↓"));
    let mut scrollbar_state = ScrollbarState::new(total_lines).position(app.transcript_scroll);

    frame.render_stateful_widget(
        scrollbar,
        area.inner(ratatui::layout::Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut scrollbar_state,
    );
}

/// Format a single message into display lines.
fn format_message(msg: &ChatMessage) -> Vec<Line<'static>> {
    let (label, label_style) = message_label(msg);
    let body_style = message_body_style(msg);

    let mut lines = vec![Line::from(vec![
        Span::styled(label, label_style),
        Span::styled(format!("  {}", message_time(msg)), Style::default().fg(DIM)),
    ])];

    let mut body: Vec<Line<'static>> = msg
        .content
        .lines()
        .map(|line| Line::from(Span::styled(format!("  {}", line), body_style)))
        .collect();

    if msg.is_streaming {
        let cursor = Span::styled(STREAMING_CURSOR, Style::default().fg(Color::Green));
        match body.last_mut() {
            Some(last) => last.push_span(cursor),
            None => body.push(Line::from(vec![Span::raw("  "), cursor])),
        }
    }

    lines.extend(body);
    lines
}
