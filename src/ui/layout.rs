use {
    super::{
        outline::{Outline, VisibleRow},
        renderer::{format_age, node_color, short_key},
    },
    crate::{tree::FlatNode, view::HitView},
    chrono::{DateTime, Utc},
    ratatui::{
        layout::{Constraint, Layout as RatLayout, Rect},
        style::{Color, Modifier, Style},
        text::{Line, Span},
        widgets::{Block, Borders, Paragraph, Row, Table, TableState},
        Frame,
    },
};

/// Render the main UI layout
pub fn render_layout(f: &mut Frame, area: Rect, view: &HitView, outline: &Outline, now: DateTime<Utc>) {
    let chunks = RatLayout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Tree table
            Constraint::Length(3), // Footer/Status
        ])
        .split(area);

    render_header(f, chunks[0], view);
    render_tree_table(f, chunks[1], view, outline, now);
    render_footer(f, chunks[2], view, now);
}

fn render_header(f: &mut Frame, area: Rect, view: &HitView) {
    let header = Block::default()
        .borders(Borders::ALL)
        .title("hitscope - Live Gear Traffic");

    let text = vec![Line::from(vec![
        Span::styled(
            "hitscope",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " - source: {} | retention: {}m | ↑/↓ select, Enter collapse, q quit",
            view.source(),
            view.retention().num_minutes()
        )),
    ])];

    f.render_widget(Paragraph::new(text).block(header), area);
}

fn render_tree_table(f: &mut Frame, area: Rect, view: &HitView, outline: &Outline, now: DateTime<Utc>) {
    let header = Row::new(vec!["Node", "Type", "Size", "Hits", "Age"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = outline
        .visible_rows(view.nodes())
        .into_iter()
        .map(|row| tree_row(row, now))
        .collect();

    let widths = [
        Constraint::Min(30),    // Node
        Constraint::Length(12), // Type
        Constraint::Length(10), // Size
        Constraint::Length(6),  // Hits
        Constraint::Length(8),  // Age
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Application → Gears → Hits"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = TableState::default().with_selected(Some(outline.selected()));
    f.render_stateful_widget(table, area, &mut state);
}

fn tree_row<'a>(row: VisibleRow<'_>, now: DateTime<Utc>) -> Row<'a> {
    let node = row.node;
    let marker = match (node.is_branch(), row.collapsed) {
        (true, true) => "▸ ",
        (true, false) => "▾ ",
        (false, _) => "• ",
    };
    let label = format!("{}{}{}", "  ".repeat(node.depth()), marker, short_key(node.key(), 24));

    let (hits, age) = match node {
        FlatNode::Application { .. } => (String::new(), String::new()),
        FlatNode::Gear { hit_count, .. } => (hit_count.to_string(), String::new()),
        FlatNode::Hit { timestamp, .. } => (String::new(), format_age(now - *timestamp)),
    };

    Row::new(vec![
        label,
        node.kind().to_string(),
        node.size().to_string(),
        hits,
        age,
    ])
    .style(Style::default().fg(node_color(node, row.collapsed)))
}

fn render_footer(f: &mut Frame, area: Rect, view: &HitView, now: DateTime<Utc>) {
    let status = match (view.last_error(), view.last_poll()) {
        (Some(error), _) => Span::styled(format!("Error: {}", error), Style::default().fg(Color::Red)),
        (None, Some(at)) => Span::raw(format!("Polled {} ago", format_age(now - at))),
        (None, None) => Span::raw("Waiting for first poll"),
    };

    let text = vec![Line::from(vec![
        Span::styled("Status: ", Style::default().fg(Color::Green)),
        status,
        Span::raw(" | "),
        Span::styled("Gears: ", Style::default().fg(Color::Cyan)),
        Span::raw(view.gear_count().to_string()),
        Span::raw(" | "),
        Span::styled("Hits: ", Style::default().fg(Color::Cyan)),
        Span::raw(view.hit_count().to_string()),
        Span::raw(" | "),
        Span::styled("Requests: ", Style::default().fg(Color::Cyan)),
        Span::raw(view.total_size().to_string()),
        Span::raw(" | "),
        Span::styled("Cycles: ", Style::default().fg(Color::Cyan)),
        Span::raw(view.cycles().to_string()),
    ])];

    let footer = Block::default().borders(Borders::ALL).title("Status");

    f.render_widget(Paragraph::new(text).block(footer), area);
}
