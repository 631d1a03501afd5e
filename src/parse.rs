//! Lenient parsers for quiz results and percentage-like input.
//!
//! Nothing in here fails: malformed input degrades to 0 (or `NaN` for
//! [`fraction_to_percent`], which callers clamp).

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use unidecode::unidecode;

fn fraction_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)[/,](\d+)").expect("fraction pattern is valid"))
}

/// Numerator and denominator of the first `acertos/total` (or `acertos,total`)
/// found in `raw`. Counts too large for `u64` saturate at `u64::MAX`.
pub fn fraction_parts(raw: &str) -> Option<(u64, u64)> {
    let caps = fraction_re().captures(raw)?;
    // Captures are all digits, so the only parse failure is overflow
    let count = |s: &str| s.parse::<u64>().unwrap_or(u64::MAX);
    Some((count(&caps[1]), count(&caps[2])))
}

/// `"7/10"` becomes `70.0`. Input without a fraction is coerced as a plain
/// number, and anything non-numeric comes back as `NaN`.
pub fn fraction_to_percent(raw: &str) -> f64 {
    let Some(caps) = fraction_re().captures(raw) else {
        return coerce_number(raw);
    };
    let hits: f64 = caps[1].parse().unwrap_or(f64::INFINITY);
    let total: f64 = caps[2].parse().unwrap_or(f64::INFINITY);
    if total == 0.0 {
        return 0.0;
    }
    (100.0 * hits / total).round()
}

/// Denominator of the fraction in `raw`, or 0.
pub fn fraction_total(raw: &str) -> u64 {
    fraction_parts(raw).map(|(_, total)| total).unwrap_or(0)
}

pub fn clamp_percent(v: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    v.clamp(0.0, 100.0)
}

/// Like [`clamp_percent`] for text such as `"85%"`.
pub fn clamp_percent_str(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix('%').unwrap_or(trimmed);
    clamp_percent(coerce_number(digits))
}

// Blank input counts as zero, the way form fields behave
fn coerce_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Canonical identity for a topic name: accents stripped, lowercased,
/// whitespace collapsed.
pub fn normalize_key(name: &str) -> String {
    unidecode(name)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Instant of a stored revision date. Accepts RFC 3339, SQLite's
/// `YYYY-MM-DD HH:MM:SS`, or a bare date (taken as midnight UTC).
pub fn parse_revision(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Calendar date written in a revision string, ignoring any time part.
pub fn date_portion(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().split(['T', ' ']).next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
