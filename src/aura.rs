//! Urgency scoring.
//!
//! A topic's tier comes from three independent terms added together:
//! weighted quiz performance, days since the last revision, and the
//! self-reported confidence label. The tier depends on `now`, so it is
//! computed on every read and never stored.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{AuraTier, Confidence, TopicRecord};
use crate::parse::{clamp_percent, parse_revision};

const URGENT_AT: u32 = 7;
const UNSTABLE_AT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuraScore {
    pub performance: u32,
    pub recency: u32,
    pub confidence: u32,
    pub total: u32,
}

impl AuraScore {
    pub fn tier(&self) -> AuraTier {
        if self.total >= URGENT_AT {
            AuraTier::Urgent
        } else if self.total >= UNSTABLE_AT {
            AuraTier::Unstable
        } else {
            AuraTier::Consolidated
        }
    }
}

pub fn score(record: &TopicRecord, now: DateTime<Utc>) -> AuraScore {
    let performance = performance_term(record.percent_before, record.percent_after);
    let recency = recency_term(record.revision_date.as_deref(), now);
    let confidence = confidence_term(record.confidence_level());
    AuraScore {
        performance,
        recency,
        confidence,
        total: performance + recency + confidence,
    }
}

pub fn classify(record: &TopicRecord, now: DateTime<Utc>) -> AuraTier {
    score(record, now).tier()
}

fn performance_term(percent_before: f64, percent_after: f64) -> u32 {
    let before = clamp_percent(percent_before);
    let after = clamp_percent(percent_after);
    let weighted = 0.7 * before + 0.3 * after;

    let mut term = if weighted < 50.0 {
        3
    } else if weighted < 80.0 {
        2
    } else {
        1
    };
    // Scoring worse after studying than before
    if percent_after < percent_before {
        term += 1;
    }
    term
}

// A missing or unreadable date lands in the freshest bucket, not the stalest
fn recency_term(revision_date: Option<&str>, now: DateTime<Utc>) -> u32 {
    let Some(days) = revision_date.and_then(parse_revision).map(|at| days_between(at, now)) else {
        return 1;
    };
    if days >= 14 {
        3
    } else if days >= 7 {
        2
    } else {
        1
    }
}

// Whole days elapsed, floored (a revision 1.5 days ago counts as 1)
fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    later
        .signed_duration_since(earlier)
        .num_milliseconds()
        .div_euclid(86_400_000)
}

fn confidence_term(confidence: Confidence) -> u32 {
    match confidence {
        Confidence::Low => 2,
        Confidence::Medium => 1,
        Confidence::Neutral => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 20, 15, 0, 0).unwrap()
    }

    fn record(before: f64, after: f64, confidence: &str, revision_date: Option<String>) -> TopicRecord {
        TopicRecord {
            id: 1,
            name: "Termodinâmica".to_string(),
            name_key: Some("termodinamica".to_string()),
            revised_at: None,
            revision_date,
            result_before: String::new(),
            result_after: String::new(),
            percent_before: before,
            percent_after: after,
            confidence: confidence.to_string(),
            tags: vec![],
            history: vec![],
            cycle_count: 0,
        }
    }

    fn days_ago(days: i64) -> Option<String> {
        Some((now() - Duration::days(days)).to_rfc3339())
    }

    mod scenario_tests {
        use super::*;

        #[test]
        fn stale_low_confidence_is_urgent() {
            let r = record(50.0, 80.0, "Baixa", days_ago(20));
            let s = score(&r, now());
            assert_eq!(s.performance, 2);
            assert_eq!(s.recency, 3);
            assert_eq!(s.confidence, 2);
            assert_eq!(s.total, 7);
            assert_eq!(classify(&r, now()), AuraTier::Urgent);
        }

        #[test]
        fn fresh_high_confidence_is_consolidated() {
            let r = record(50.0, 80.0, "Alta", days_ago(2));
            let s = score(&r, now());
            assert_eq!((s.performance, s.recency, s.confidence), (2, 1, 0));
            assert_eq!(classify(&r, now()), AuraTier::Consolidated);
        }

        #[test]
        fn middle_scores_are_unstable() {
            let r = record(50.0, 80.0, "médio", days_ago(8));
            assert_eq!(score(&r, now()).total, 5);
            assert_eq!(classify(&r, now()), AuraTier::Unstable);
        }
    }

    mod performance_tests {
        use super::*;

        #[test]
        fn buckets() {
            assert_eq!(performance_term(0.0, 0.0), 3);
            assert_eq!(performance_term(49.0, 50.0), 3);
            assert_eq!(performance_term(60.0, 60.0), 2);
            assert_eq!(performance_term(80.0, 80.0), 1);
            assert_eq!(performance_term(100.0, 100.0), 1);
        }

        #[test]
        fn regression_adds_one() {
            assert_eq!(performance_term(90.0, 70.0), 2);
            assert_eq!(performance_term(40.0, 30.0), 4);
        }

        #[test]
        fn out_of_range_percentages_are_clamped() {
            assert_eq!(performance_term(250.0, 250.0), 1);
            assert_eq!(performance_term(f64::NAN, f64::NAN), 3);
        }
    }

    mod recency_tests {
        use super::*;

        #[test]
        fn bucket_edges() {
            assert_eq!(recency_term(days_ago(0).as_deref(), now()), 1);
            assert_eq!(recency_term(days_ago(6).as_deref(), now()), 1);
            assert_eq!(recency_term(days_ago(7).as_deref(), now()), 2);
            assert_eq!(recency_term(days_ago(13).as_deref(), now()), 2);
            assert_eq!(recency_term(days_ago(14).as_deref(), now()), 3);
        }

        #[test]
        fn partial_days_are_floored() {
            let almost_week = (now() - Duration::days(7) + Duration::minutes(1)).to_rfc3339();
            assert_eq!(recency_term(Some(&almost_week), now()), 1);
        }

        #[test]
        fn bare_dates_are_accepted() {
            assert_eq!(recency_term(Some("2024-06-01"), now()), 3);
        }

        #[test]
        fn unreadable_or_missing_dates_score_lowest() {
            assert_eq!(recency_term(None, now()), 1);
            assert_eq!(recency_term(Some("not a date"), now()), 1);

            let r = record(0.0, 0.0, "baixo", Some("???".to_string()));
            assert_eq!(score(&r, now()).recency, 1);
        }
    }

    mod purity_tests {
        use super::*;

        #[test]
        fn same_inputs_same_tier() {
            let r = record(65.0, 40.0, "médio", days_ago(9));
            let first = classify(&r, now());
            for _ in 0..10 {
                assert_eq!(classify(&r, now()), first);
            }
        }

        #[test]
        fn tier_moves_with_now() {
            let r = record(70.0, 75.0, "baixo", Some(now().to_rfc3339()));
            assert_eq!(classify(&r, now()), AuraTier::Unstable);
            assert_eq!(classify(&r, now() + Duration::days(30)), AuraTier::Urgent);
        }
    }
}
