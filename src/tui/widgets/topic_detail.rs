use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::{format_date, percent_color, tier_color};
use crate::aura;
use crate::models::{Confidence, TopicRecord};
use crate::parse::clamp_percent_str;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(record) = app.topic() else {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Topic Detail ");
        let paragraph = Paragraph::new("No topic selected").block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Current results
            Constraint::Length(4), // Aura breakdown
            Constraint::Min(0),    // Cycle history
        ])
        .split(area);

    draw_header(f, record, chunks[0]);
    draw_aura(f, record, chunks[1]);
    draw_history(f, app, record, chunks[2]);
}

fn draw_header(f: &mut Frame, record: &TopicRecord, area: Rect) {
    let tags = if record.tags.is_empty() {
        "None".to_string()
    } else {
        record.tags.join(", ")
    };
    let last = record
        .revision_date
        .as_deref()
        .map(format_date)
        .unwrap_or_else(|| "never".to_string());

    let text = vec![
        Line::from(vec![
            Span::styled("Before: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} ({:.0}%)", record.result_before, record.percent_before),
                Style::default().fg(percent_color(record.percent_before)),
            ),
            Span::raw("  "),
            Span::styled("After: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} ({:.0}%)", record.result_after, record.percent_after),
                Style::default().fg(percent_color(record.percent_after)),
            ),
        ]),
        Line::from(vec![
            Span::styled("Confidence: ", Style::default().fg(Color::Gray)),
            Span::styled(
                record.confidence_level().label(),
                Style::default().fg(confidence_color(record.confidence_level())),
            ),
            Span::raw("  "),
            Span::styled("Last revised: ", Style::default().fg(Color::Gray)),
            Span::styled(last, Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Tags: ", Style::default().fg(Color::Gray)),
            Span::styled(tags, Style::default().fg(Color::Cyan)),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", record.name))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_aura(f: &mut Frame, record: &TopicRecord, area: Rect) {
    let score = aura::score(record, Utc::now());
    let tier = score.tier();

    let text = vec![Line::from(vec![
        Span::styled(
            format!("{} ", tier.label()),
            Style::default()
                .fg(tier_color(tier))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                "score {} = performance {} + recency {} + confidence {}",
                score.total, score.performance, score.recency, score.confidence
            ),
            Style::default().fg(Color::Gray),
        ),
    ])];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Aura ")
        .title_style(Style::default().fg(tier_color(tier)));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_history(f: &mut Frame, app: &App, record: &TopicRecord, area: Rect) {
    let title = if record.history.is_empty() {
        " Past Cycles (none) ".to_string()
    } else {
        format!(" Past Cycles ({}) ", record.history.len())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Magenta));

    if record.history.is_empty() {
        let paragraph = Paragraph::new("Only one cycle so far. Submit again to build history.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .cycles
        .items
        .iter()
        .filter_map(|&i| record.history.get(i).map(|cycle| (i, cycle)))
        .map(|(i, cycle)| {
            let before = clamp_percent_str(&cycle.result_before);
            let after = clamp_percent_str(&cycle.result_after);
            ListItem::new(Line::from(vec![
                Span::styled(format!("#{:<4}", i), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{:<10}", format_date(&cycle.date)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:<8}", cycle.result_before),
                    Style::default().fg(percent_color(before)),
                ),
                Span::styled("→ ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{:<8}", cycle.result_after),
                    Style::default().fg(percent_color(after)),
                ),
                Span::styled(cycle.confidence.clone(), Style::default().fg(Color::Cyan)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.cycles.selected);
    f.render_stateful_widget(list, area, &mut state);
}

fn confidence_color(confidence: Confidence) -> Color {
    match confidence {
        Confidence::Low => Color::Red,
        Confidence::Medium => Color::Yellow,
        Confidence::Neutral => Color::White,
    }
}
