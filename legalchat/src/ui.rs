//! UI rendering for the TUI.

mod history;
mod knowledge;
mod transcript;

use legalchat_core::{AgentType, ConnectionStatus};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Focus};

// ========== Standard View Colors ==========

/// Border color for the focused region
const BORDER_FOCUSED: Color = Color::Rgb(0, 180, 180);
/// Border color for unfocused regions
const BORDER_IDLE: Color = Color::Rgb(80, 80, 80);
/// Border color for the knowledge panel
const BORDER_KNOWLEDGE: Color = Color::Rgb(180, 100, 180);
/// Label color for metadata attributes
const LABEL_COLOR: Color = Color::Rgb(100, 180, 180);
/// Separator line color
const SEPARATOR_COLOR: Color = Color::Rgb(60, 60, 60);
/// Dim gray for secondary text
const DIM: Color = Color::Rgb(128, 128, 128);
/// Highlight for selected rows
const SELECTED_BG: Color = Color::Rgb(40, 60, 80);

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Render the application UI.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Layout: main area, composer, status bar, footer
    let chunks = Layout::vertical([
        Constraint::Min(5),    // Sidebar | Transcript | Knowledge
        Constraint::Length(3), // Composer
        Constraint::Length(1), // Status bar
        Constraint::Length(1), // Footer
    ])
    .split(area);

    let knowledge_open = app.controller.state().knowledge_open;
    let main_chunks = if knowledge_open {
        Layout::horizontal([
            Constraint::Length(30),     // Agents
            Constraint::Min(30),        // Transcript
            Constraint::Percentage(40), // Knowledge
        ])
        .split(chunks[0])
    } else {
        Layout::horizontal([Constraint::Length(30), Constraint::Min(30)]).split(chunks[0])
    };

    render_agent_sidebar(frame, app, main_chunks[0]);
    transcript::render_transcript(frame, app, main_chunks[1]);
    if knowledge_open {
        knowledge::render_knowledge_panel(frame, app, main_chunks[2]);
    }

    render_composer(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);

    if app.controller.state().history_open {
        history::render_history_overlay(frame, app, area);
    }
}

/// Rounded block whose border reflects focus.
fn region_block(title: String, focused: bool) -> Block<'static> {
    let color = if focused { BORDER_FOCUSED } else { BORDER_IDLE };
    Block::default()
        .title(title)
        .title_style(Style::default().fg(color).bold())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

/// Render the agent picker with the description of the agent under the cursor.
fn render_agent_sidebar(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = region_block(" Agents ".to_string(), app.focus == Focus::Agents);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::vertical([
        Constraint::Length(AgentType::ALL.len() as u16),
        Constraint::Length(1),
        Constraint::Min(1),
    ])
    .split(inner);

    let selected = app.controller.state().selected_agent;
    let items: Vec<ListItem> = AgentType::ALL
        .iter()
        .map(|agent| {
            let (marker, style) = if *agent == selected {
                ("● ", Style::default().fg(Color::Green).bold())
            } else {
                ("  ", Style::default())
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Green)),
                Span::styled(agent.display_name(), style),
            ]))
        })
        .collect();

    let mut list = List::new(items);
    if app.focus == Focus::Agents {
        list = list
            .highlight_style(Style::default().bg(SELECTED_BG).add_modifier(Modifier::BOLD));
    }
    frame.render_stateful_widget(list, chunks[0], &mut app.agent_list_state);

    let separator = "─".repeat(chunks[1].width as usize);
    frame.render_widget(
        Paragraph::new(Span::styled(separator, Style::default().fg(SEPARATOR_COLOR))),
        chunks[1],
    );

    let described = app
        .agent_list_state
        .selected()
        .and_then(|i| AgentType::ALL.get(i))
        .copied()
        .unwrap_or(selected);
    let description = Paragraph::new(described.description())
        .style(Style::default().fg(DIM))
        .wrap(Wrap { trim: true });
    frame.render_widget(description, chunks[2]);
}

/// Render the composer, or the active prompt in its place.
fn render_composer(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.controller.state();

    let (title, text, focused) = match app.prompt {
        Some(prompt) => (
            format!(" {} (Enter to submit, Esc to cancel) ", prompt.label()),
            app.prompt_input.as_str(),
            true,
        ),
        None => (
            format!(" Message → {} ", state.selected_agent.display_name()),
            app.input.as_str(),
            app.focus == Focus::Composer && !state.history_open,
        ),
    };

    let block = region_block(title, focused);
    let inner = block.inner(area);

    let line = if text.is_empty() && app.prompt.is_none() {
        let hint = if !state.connection.is_open() {
            "waiting for connection…"
        } else if state.transcript.is_loading() {
            "waiting for the reply…"
        } else {
            "Ask a legal question"
        };
        Line::from(Span::styled(hint, Style::default().fg(DIM).italic()))
    } else {
        Line::from(text.to_string())
    };

    // Keep the end of long input visible
    let width = inner.width.saturating_sub(1) as usize;
    let skip = text.chars().count().saturating_sub(width);
    let paragraph = Paragraph::new(line).block(block).scroll((0, skip as u16));
    frame.render_widget(paragraph, area);

    if focused {
        let cursor_x = inner.x + (text.chars().count() - skip) as u16;
        frame.set_cursor_position((cursor_x.min(inner.right().saturating_sub(1)), inner.y));
    }
}

/// Render the one-line status bar: connection, session, activity.
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.controller.state();

    let connection_color = match state.connection {
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::Connecting | ConnectionStatus::Reconnecting { .. } => Color::Yellow,
        ConnectionStatus::Disconnected => Color::Red,
    };

    let mut spans = vec![
        Span::styled(" ● ", Style::default().fg(connection_color)),
        Span::styled(state.connection.label(), Style::default().fg(connection_color)),
        Span::raw("  "),
        Span::styled("session ", Style::default().fg(LABEL_COLOR)),
        Span::raw(state.session.id.short().to_string()),
        Span::raw("  "),
        Span::styled("agent ", Style::default().fg(LABEL_COLOR)),
        Span::raw(state.selected_agent.display_name()),
    ];

    if let Some(health) = &state.health {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("backend ", Style::default().fg(LABEL_COLOR)));
        spans.push(crate::message_format::service_status_span(&health.status));
    }

    let activity = activity_label(app);
    if !activity.is_empty() {
        let frame_idx = app.tick % SPINNER_FRAMES.len();
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{} {}", SPINNER_FRAMES[frame_idx], activity),
            Style::default().fg(Color::Yellow),
        ));
    }

    let bar =
        Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Rgb(25, 25, 25)));
    frame.render_widget(bar, area);
}

/// What the app is waiting on, for the spinner.
fn activity_label(app: &App) -> String {
    let state = app.controller.state();
    let in_flight = &state.in_flight;

    let mut parts = Vec::new();
    if state.transcript.is_loading() {
        parts.push("thinking");
    }
    if in_flight.upload {
        parts.push("uploading");
    }
    if in_flight.delete {
        parts.push("deleting");
    }
    if in_flight.search {
        parts.push("searching");
    }
    if in_flight.reindex {
        parts.push("reindexing");
    }
    if in_flight.documents || in_flight.stats {
        parts.push("loading knowledge");
    }
    if in_flight.history || in_flight.memories {
        parts.push("loading history");
    }
    if in_flight.status || in_flight.health {
        parts.push("checking status");
    }
    parts.join(", ")
}

/// Render key hints for the focused region.
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let mut spans = if app.prompt.is_some() {
        vec![
            key(" Enter"),
            Span::raw(" submit  "),
            key("Esc"),
            Span::raw(" cancel"),
        ]
    } else if app.controller.state().history_open {
        vec![
            key(" j/k"),
            Span::raw(" scroll  "),
            key("Esc"),
            Span::raw(" close"),
        ]
    } else {
        match app.focus {
            Focus::Composer => vec![
                key(" Enter"),
                Span::raw(" send  "),
                key("Esc"),
                Span::raw(" quit  "),
            ],
            Focus::Agents => vec![
                key(" j/k"),
                Span::raw(" move  "),
                key("Enter"),
                Span::raw(" select  "),
                key("r"),
                Span::raw(" reconnect  "),
            ],
            Focus::Transcript => vec![
                key(" j/k"),
                Span::raw(" scroll  "),
                key("g/G"),
                Span::raw(" top/bottom  "),
                key("r"),
                Span::raw(" reconnect  "),
            ],
            Focus::Knowledge => vec![
                key(" j/k"),
                Span::raw(" select  "),
                key("u"),
                Span::raw(" upload  "),
                key("d"),
                Span::raw(" delete  "),
                key("/"),
                Span::raw(" search  "),
                key("f"),
                Span::raw(" filter  "),
            ],
        }
    };

    if app.prompt.is_none() && !app.controller.state().history_open {
        spans.extend([
            key("Tab"),
            Span::raw(" focus  "),
            key("^K"),
            Span::raw(" knowledge  "),
            key("^H"),
            Span::raw(" history  "),
            key("^N"),
            Span::raw(" new  "),
            key("^R"),
            Span::raw(" reindex  "),
            key("^S"),
            Span::raw(" status  "),
            key("^C"),
            Span::raw(" quit"),
        ]);
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, area);
}

/// A rectangle of `percent_x` by `percent_y` centered in `area`.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(vertical[1])[1]
}
