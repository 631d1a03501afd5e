use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::{format_date, tier_color};
use crate::aura;
use crate::heatmap::{window_total, DayCell};
use crate::tui::App;
use crate::truncate;

const CELL: &str = "■ ";
const CELL_WIDTH: u16 = 2;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(10), // Summary + focus row
            Constraint::Min(0),     // Activity
        ])
        .split(area);

    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[0]);

    draw_summary(f, app, top_chunks[0]);
    draw_focus(f, app, top_chunks[1]);
    draw_activity(f, &app.dashboard.grid, chunks[1]);
}

fn stat_line(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn draw_summary(f: &mut Frame, app: &App, area: Rect) {
    let s = &app.dashboard.summary;

    let text = vec![
        Line::from(vec![
            Span::styled("Topics: ", Style::default().fg(Color::Gray)),
            Span::styled(
                s.total_topics.to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        stat_line("Past cycles", s.total_cycles.to_string(), Color::White),
        stat_line("Questions", s.total_questions.to_string(), Color::White),
        stat_line(
            "After-study score",
            format!("{}%", s.pooled_after_percent),
            super::percent_color(s.pooled_after_percent as f64),
        ),
        stat_line("Last studied", truncate(&s.most_recent_topic, 24), Color::Cyan),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{} urgent ", s.urgent), Style::default().fg(Color::Red)),
            Span::styled(
                format!("{} unstable ", s.unstable),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                format!("{} consolidated", s.consolidated),
                Style::default().fg(Color::Green),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Summary ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_focus(f: &mut Frame, app: &App, area: Rect) {
    let now = Utc::now();
    let items: Vec<ListItem> = app
        .dashboard
        .focus
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let tier = aura::classify(record, now);
            let last = record
                .revision_date
                .as_deref()
                .map(format_date)
                .unwrap_or_else(|| "never".to_string());

            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{:<26}", truncate(&record.name, 24)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(format!("{:<13}", tier.label()), Style::default().fg(tier_color(tier))),
                Span::styled(last, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Focus ")
        .title_style(Style::default().fg(Color::Yellow));

    if items.is_empty() {
        let paragraph = Paragraph::new("Nothing to review yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
    } else {
        f.render_widget(List::new(items).block(block), area);
    }
}

fn cell_color(tier: u8) -> Color {
    match tier {
        0 => Color::DarkGray,
        1 => Color::Rgb(14, 68, 41),
        2 => Color::Rgb(0, 109, 50),
        3 => Color::Rgb(38, 166, 65),
        _ => Color::Rgb(57, 211, 83),
    }
}

// Today in the top-left, older days flowing right then down
fn draw_activity(f: &mut Frame, grid: &[DayCell], area: Rect) {
    let per_row = (area.width.saturating_sub(2) / CELL_WIDTH).max(1) as usize;
    let total = window_total(grid);

    let lines: Vec<Line> = grid
        .chunks(per_row)
        .map(|row| {
            Line::from(
                row.iter()
                    .map(|cell| {
                        let mut style = Style::default().fg(cell_color(cell.tier));
                        if cell.is_today {
                            style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
                        }
                        Span::styled(CELL, style)
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(
            " Activity ({} days, {} questions) ",
            grid.len(),
            total
        ))
        .title_style(Style::default().fg(Color::Magenta));

    f.render_widget(Paragraph::new(lines).block(block), area);
}
