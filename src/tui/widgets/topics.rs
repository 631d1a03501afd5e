use chrono::Utc;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{format_date, percent_color, tier_color};
use crate::aura;
use crate::tui::App;
use crate::truncate;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.state.tag_filter() {
        Some(tag) => format!(" Topics (tag: {}) ", tag),
        None => " Topics ".to_string(),
    };

    let now = Utc::now();
    let items: Vec<ListItem> = app
        .displayed()
        .into_iter()
        .map(|record| {
            let tier = aura::classify(record, now);
            let last = record
                .revision_date
                .as_deref()
                .map(format_date)
                .unwrap_or_else(|| "-".to_string());

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<30}", truncate(&record.name, 28)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:<14}", tier.label()),
                    Style::default().fg(tier_color(tier)),
                ),
                Span::styled(
                    format!("{:>5.0}% ", record.percent_before),
                    Style::default().fg(percent_color(record.percent_before)),
                ),
                Span::styled(
                    format!("{:>5.0}% ", record.percent_after),
                    Style::default().fg(percent_color(record.percent_after)),
                ),
                Span::styled(
                    format!("{:>6}  ", record.cycle_count),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(last, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));

    let header_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    let header = Line::from(vec![
        Span::styled(format!("{:<30}", "Name"), header_style),
        Span::styled(format!("{:<14}", "Aura"), header_style),
        Span::styled("Before  After  Cycles  Last", header_style),
    ]);

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.topics.selected);

    let inner = block.inner(area);
    f.render_widget(block, area);

    let header_area = Rect {
        x: inner.x + 2,
        width: inner.width.saturating_sub(2),
        height: inner.height.min(1),
        ..inner
    };
    f.render_widget(Paragraph::new(header), header_area);

    let list_area = Rect {
        y: inner.y + 1,
        height: inner.height.saturating_sub(1),
        ..inner
    };

    f.render_stateful_widget(list, list_area, &mut state);
}
