pub mod dashboard;
pub mod topic_detail;
pub mod topics;

use ratatui::style::Color;

use crate::models::AuraTier;
use crate::parse::parse_revision;

pub fn tier_color(tier: AuraTier) -> Color {
    match tier {
        AuraTier::Urgent => Color::Red,
        AuraTier::Unstable => Color::Yellow,
        AuraTier::Consolidated => Color::Green,
    }
}

pub fn percent_color(percent: f64) -> Color {
    if percent >= 70.0 {
        Color::Green
    } else if percent >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub fn format_date(date_str: &str) -> String {
    match parse_revision(date_str) {
        Some(dt) => dt.format("%b %d").to_string(),
        None => date_str.chars().take(10).collect(),
    }
}
