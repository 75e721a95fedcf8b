use super::*;
use legalchat_core::format::{
    format_length, format_relative_str, format_similarity, single_line, truncate,
};
use ratatui::widgets::{Cell, Row, Table};

/// Render the knowledge panel: stats, document table, search results.
pub(super) fn render_knowledge_panel(frame: &mut Frame, app: &mut App, area: Rect) {
    let focused = app.focus == Focus::Knowledge;
    let border = if focused { BORDER_KNOWLEDGE } else { BORDER_IDLE };
    let block = Block::default()
        .title(" Knowledge Base ")
        .title_style(Style::default().fg(border).bold())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Layout: stats, documents, search results
    let chunks = Layout::vertical([
        Constraint::Length(2),      // Stats + filter
        Constraint::Percentage(50), // Documents
        Constraint::Min(3),         // Search results
    ])
    .split(inner);

    render_stats(frame, app, chunks[0]);
    render_documents(frame, app, chunks[1]);
    render_search_results(frame, app, chunks[2]);
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.controller.state();

    let count = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
    let mut first = vec![
        Span::styled("docs ", Style::default().fg(LABEL_COLOR)),
        Span::raw(count(state.stats.as_ref().and_then(|s| s.total_documents))),
        Span::styled("  chunks ", Style::default().fg(LABEL_COLOR)),
        Span::raw(count(state.stats.as_ref().and_then(|s| s.total_chunks))),
    ];
    if let Some(index) = state.stats.as_ref().and_then(|s| s.opensearch_index.as_deref()) {
        first.push(Span::styled("  index ", Style::default().fg(LABEL_COLOR)));
        first.push(Span::raw(index.to_string()));
    }

    let filter = &state.document_filter;
    let second = vec![
        Span::styled("filter ", Style::default().fg(LABEL_COLOR)),
        Span::raw(
            filter
                .document_type
                .map(|t| t.as_str())
                .unwrap_or("all types")
                .to_string(),
        ),
        Span::raw(
            filter
                .category
                .as_deref()
                .map(|c| format!(" in {}", c))
                .unwrap_or_default(),
        ),
    ];

    frame.render_widget(
        Paragraph::new(vec![Line::from(first), Line::from(second)]),
        area,
    );
}

fn render_documents(frame: &mut Frame, app: &mut App, area: Rect) {
    let state = app.controller.state();

    let header = Row::new(vec!["File", "Type", "Category", "Chunks", "Size", "Added"])
        .style(Style::default().fg(LABEL_COLOR).bold());

    let rows: Vec<Row> = state
        .documents
        .iter()
        .map(|doc| {
            let size = doc
                .total_content_length
                .map(format_length)
                .unwrap_or_else(|| "-".to_string());
            Row::new(vec![
                Cell::from(truncate(&doc.file_name, 28)),
                Cell::from(doc.document_type.clone()),
                Cell::from(doc.category.clone()),
                Cell::from(doc.chunk_count.to_string()),
                Cell::from(size),
                Cell::from(format_relative_str(&doc.created_at)),
            ])
        })
        .collect();

    let title = if state.in_flight.documents {
        " Documents (loading…) ".to_string()
    } else {
        format!(" Documents ({}) ", state.documents.len())
    };

    let table = Table::new(
        rows,
        [
            Constraint::Min(12),
            Constraint::Length(5),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(title)
            .title_style(Style::default().fg(DIM))
            .borders(Borders::TOP)
            .border_style(Style::default().fg(SEPARATOR_COLOR)),
    )
    .row_highlight_style(Style::default().bg(SELECTED_BG).add_modifier(Modifier::BOLD));

    frame.render_stateful_widget(table, area, &mut app.document_table_state);
}

fn render_search_results(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.controller.state();

    let title = match (&state.last_query, state.in_flight.search) {
        (_, true) => " Search (searching…) ".to_string(),
        (Some(query), false) => format!(
            " Search: \"{}\" ({}) ",
            truncate(query, 24),
            state.search_results.len()
        ),
        (None, false) => " Search ".to_string(),
    };

    let mut lines: Vec<Line> = Vec::new();
    if state.search_results.is_empty() {
        let hint = if state.last_query.is_some() {
            "  No results above the similarity threshold."
        } else {
            "  Press / to search the knowledge base."
        };
        lines.push(Line::from(Span::styled(hint, Style::default().fg(DIM).italic())));
    }

    for result in &state.search_results {
        lines.push(Line::from(vec![
            Span::styled(
                format_similarity(result.similarity_score),
                Style::default().fg(Color::Green).bold(),
            ),
            Span::raw("  "),
            Span::styled(result.file_name.clone(), Style::default().bold()),
            Span::styled(
                format!("  #{} {}", result.chunk_index, result.category),
                Style::default().fg(DIM),
            ),
        ]));
        lines.push(Line::from(Span::raw(format!(
            "  {}",
            truncate(&single_line(&result.content), 160)
        ))));
    }

    if let Some(info) = &state.search_info {
        if !state.search_results.is_empty() && !info.embedding_model.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("  {} · {}", info.embedding_model, info.vector_database),
                Style::default().fg(DIM),
            )));
        }
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(title)
                .title_style(Style::default().fg(DIM))
                .borders(Borders::TOP)
                .border_style(Style::default().fg(SEPARATOR_COLOR)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
