//! Shared message formatting helpers for TUI rendering.

use legalchat_core::format::format_clock;
use legalchat_core::{ChatMessage, HistoryEntry, ServiceStatus};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::Span;

/// Marker appended to a reply that is still streaming.
pub const STREAMING_CURSOR: &str = "▌";

/// Author label and style for transcript rows.
pub fn message_label(msg: &ChatMessage) -> (String, Style) {
    if !msg.is_bot {
        let label = match &msg.agent {
            Some(agent) => format!("You → {}", agent),
            None => "You".to_string(),
        };
        return (label, Style::default().fg(Color::Cyan).bold());
    }
    if msg.is_error {
        return ("Error".to_string(), Style::default().fg(Color::Red).bold());
    }
    match msg.agent.as_deref() {
        Some("System") => ("System".to_string(), Style::default().fg(Color::DarkGray)),
        Some(agent) => (agent.to_string(), Style::default().fg(Color::Green).bold()),
        None => ("Assistant".to_string(), Style::default().fg(Color::Green).bold()),
    }
}

/// Body style for transcript rows.
pub fn message_body_style(msg: &ChatMessage) -> Style {
    if msg.is_error {
        Style::default().fg(Color::Red)
    } else if msg.is_bot && msg.agent.as_deref() == Some("System") {
        Style::default().fg(Color::DarkGray).italic()
    } else {
        Style::default()
    }
}

/// Message time as HH:MM, empty if the timestamp doesn't parse.
pub fn message_time(msg: &ChatMessage) -> String {
    format_clock(&msg.timestamp)
}

/// Role label and style for server-side history rows.
pub fn history_role_label(entry: &HistoryEntry) -> (&'static str, Style) {
    if entry.is_user() {
        ("user", Style::default().fg(Color::Cyan))
    } else {
        ("assistant", Style::default().fg(Color::Green))
    }
}

/// Colored status word for a backing service.
pub fn service_status_span(status: &ServiceStatus) -> Span<'static> {
    let color = match status {
        ServiceStatus::Connected | ServiceStatus::Healthy => Color::Green,
        ServiceStatus::Degraded => Color::Yellow,
        ServiceStatus::Error => Color::Red,
        ServiceStatus::Unknown | ServiceStatus::Other(_) => Color::DarkGray,
    };
    Span::styled(status.label().to_string(), Style::default().fg(color))
}
