use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::aura::classify;
use crate::models::{AuraTier, TopicRecord};
use crate::parse::{date_portion, fraction_parts, fraction_total};

pub const NO_TOPIC: &str = "—";

/// Questions answered across every current result and every past cycle.
pub fn total_questions(records: &[TopicRecord]) -> u64 {
    records
        .iter()
        .map(|r| {
            std::iter::once((r.result_before.as_str(), r.result_after.as_str()))
                .chain(
                    r.history
                        .iter()
                        .map(|c| (c.result_before.as_str(), c.result_after.as_str())),
                )
                .fold(0u64, |acc, (before, after)| {
                    acc.saturating_add(fraction_total(before))
                        .saturating_add(fraction_total(after))
                })
        })
        .fold(0u64, u64::saturating_add)
}

/// Post-study correctness pooled over all cycles: hits and totals are summed
/// before dividing, so a 2/20 weighs ten times more than a 1/2.
pub fn pooled_after_performance(records: &[TopicRecord]) -> u32 {
    let (hits, total) = records
        .iter()
        .flat_map(|r| {
            std::iter::once(r.result_after.as_str())
                .chain(r.history.iter().map(|c| c.result_after.as_str()))
        })
        .filter_map(fraction_parts)
        .fold((0u128, 0u128), |(h, t), (hits, total)| {
            (h + hits as u128, t + total as u128)
        });

    if total == 0 {
        return 0;
    }
    (100.0 * hits as f64 / total as f64).round() as u32
}

pub fn most_recent_topic(records: &[TopicRecord]) -> &str {
    let mut best: Option<(i64, &str)> = None;
    for r in records {
        let Some(at) = r.revised_at else { continue };
        if best.map_or(true, |(best_at, _)| at > best_at) {
            best = Some((at, r.name.as_str()));
        }
    }
    best.map(|(_, name)| name).unwrap_or(NO_TOPIC)
}

/// Questions answered per calendar day, keyed by each record's last revision.
/// Past cycles are not included.
pub fn daily_question_volume(records: &[TopicRecord]) -> BTreeMap<NaiveDate, u64> {
    let mut volume = BTreeMap::new();
    for r in records {
        let Some(raw) = r.revision_date.as_deref() else {
            continue;
        };
        let Some(day) = date_portion(raw) else {
            log::trace!("skipping '{}': unreadable revision date {:?}", r.name, raw);
            continue;
        };
        let count = fraction_total(&r.result_before).saturating_add(fraction_total(&r.result_after));
        let day_total = volume.entry(day).or_insert(0u64);
        *day_total = day_total.saturating_add(count);
    }
    volume
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub total_topics: usize,
    pub total_cycles: usize,
    pub total_questions: u64,
    pub pooled_after_percent: u32,
    pub most_recent_topic: String,
    pub urgent: usize,
    pub unstable: usize,
    pub consolidated: usize,
}

pub fn summarize(records: &[TopicRecord], now: DateTime<Utc>) -> Summary {
    let mut summary = Summary {
        total_topics: records.len(),
        total_cycles: records.iter().map(|r| r.cycle_count).sum(),
        total_questions: total_questions(records),
        pooled_after_percent: pooled_after_performance(records),
        most_recent_topic: most_recent_topic(records).to_string(),
        urgent: 0,
        unstable: 0,
        consolidated: 0,
    };
    for r in records {
        match classify(r, now) {
            AuraTier::Urgent => summary.urgent += 1,
            AuraTier::Unstable => summary.unstable += 1,
            AuraTier::Consolidated => summary.consolidated += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CycleSnapshot;
    use chrono::TimeZone;

    fn record(name: &str, before: &str, after: &str) -> TopicRecord {
        TopicRecord {
            id: 0,
            name: name.to_string(),
            name_key: None,
            revised_at: None,
            revision_date: None,
            result_before: before.to_string(),
            result_after: after.to_string(),
            percent_before: 0.0,
            percent_after: 0.0,
            confidence: String::new(),
            tags: vec![],
            history: vec![],
            cycle_count: 0,
        }
    }

    fn cycle(before: &str, after: &str) -> CycleSnapshot {
        CycleSnapshot {
            date: "2024-01-01".to_string(),
            result_before: before.to_string(),
            result_after: after.to_string(),
            confidence: String::new(),
        }
    }

    fn with_history(mut r: TopicRecord, cycles: Vec<CycleSnapshot>) -> TopicRecord {
        r.cycle_count = cycles.len();
        r.history = cycles;
        r
    }

    mod total_questions_tests {
        use super::*;

        #[test]
        fn includes_history() {
            let r = with_history(record("A", "3/10", "7/10"), vec![cycle("2/5", "3/5")]);
            assert_eq!(total_questions(&[r]), 30);
        }

        #[test]
        fn unparsable_results_count_zero() {
            let records = vec![record("A", "abc", "7/10"), record("B", "", "50%")];
            assert_eq!(total_questions(&records), 10);
        }

        #[test]
        fn empty_is_zero() {
            assert_eq!(total_questions(&[]), 0);
        }

        #[test]
        fn huge_totals_saturate() {
            let max = "1/18446744073709551615";
            let r = with_history(record("A", max, max), vec![cycle(max, "1/10")]);
            assert_eq!(total_questions(&[r.clone(), r]), u64::MAX);
            assert_eq!(total_questions(&[record("A", "5/99999999999999999999", "")]), u64::MAX);
        }
    }

    mod pooled_tests {
        use super::*;

        #[test]
        fn volume_weighted_not_averaged() {
            // 1/2 and 2/20 average to 30% per topic, but pool to 3/22
            let records = vec![record("A", "0/1", "1/2"), record("B", "0/1", "2/20")];
            assert_eq!(pooled_after_performance(&records), 14);
        }

        #[test]
        fn uses_after_results_of_history_only() {
            let r = with_history(record("A", "0/100", "8/10"), vec![cycle("0/100", "2/10")]);
            assert_eq!(pooled_after_performance(&[r]), 50);
        }

        #[test]
        fn no_denominator_is_zero() {
            assert_eq!(pooled_after_performance(&[]), 0);
            assert_eq!(pooled_after_performance(&[record("A", "1/2", "x")]), 0);
            assert_eq!(pooled_after_performance(&[record("A", "1/2", "0/0")]), 0);
        }

        #[test]
        fn huge_totals_do_not_overflow() {
            let max = "18446744073709551615/18446744073709551615";
            let records = vec![record("A", "", max), record("B", "", max)];
            assert_eq!(pooled_after_performance(&records), 100);
        }
    }

    mod most_recent_tests {
        use super::*;

        #[test]
        fn picks_latest_instant() {
            let mut a = record("A", "", "");
            a.revised_at = Some(1_000);
            let mut b = record("B", "", "");
            b.revised_at = Some(5_000);
            let c = record("C", "", "");
            assert_eq!(most_recent_topic(&[a, b, c]), "B");
        }

        #[test]
        fn ties_keep_first() {
            let mut a = record("A", "", "");
            a.revised_at = Some(7);
            let mut b = record("B", "", "");
            b.revised_at = Some(7);
            assert_eq!(most_recent_topic(&[a, b]), "A");
        }

        #[test]
        fn sentinel_when_nothing_qualifies() {
            assert_eq!(most_recent_topic(&[]), NO_TOPIC);
            assert_eq!(most_recent_topic(&[record("A", "", "")]), NO_TOPIC);
        }
    }

    mod daily_volume_tests {
        use super::*;

        #[test]
        fn buckets_by_date_portion() {
            let mut a = record("A", "3/10", "7/10");
            a.revision_date = Some("2024-03-10T08:00:00+00:00".to_string());
            let mut b = record("B", "1/5", "2/5");
            b.revision_date = Some("2024-03-10".to_string());
            let mut c = record("C", "1/4", "2/4");
            c.revision_date = Some("2024-03-11T23:00:00-03:00".to_string());
            let d = record("D", "1/4", "2/4");

            let volume = daily_question_volume(&[a, b, c, d]);
            assert_eq!(volume.len(), 2);
            assert_eq!(volume[&NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()], 30);
            assert_eq!(volume[&NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()], 8);
        }

        #[test]
        fn ignores_history() {
            let mut r = with_history(record("A", "1/5", "1/5"), vec![cycle("1/50", "1/50")]);
            r.revision_date = Some("2024-03-10".to_string());
            let volume = daily_question_volume(&[r]);
            assert_eq!(volume.values().sum::<u64>(), 10);
        }

        #[test]
        fn empty_is_empty() {
            assert!(daily_question_volume(&[]).is_empty());
        }

        #[test]
        fn same_day_totals_saturate() {
            let mut a = record("A", "1/18446744073709551615", "1/10");
            a.revision_date = Some("2024-03-10".to_string());
            let b = a.clone();
            let volume = daily_question_volume(&[a, b]);
            assert_eq!(volume[&NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()], u64::MAX);
        }
    }

    mod summary_tests {
        use super::*;

        #[test]
        fn counts_tiers_and_totals() {
            let now = Utc.with_ymd_and_hms(2024, 6, 20, 12, 0, 0).unwrap();

            let mut urgent = record("Urgent", "1/10", "2/10");
            urgent.confidence = "baixo".to_string();
            urgent.revision_date = Some("2024-05-01".to_string());

            let mut calm = record("Calm", "9/10", "10/10");
            calm.percent_before = 90.0;
            calm.percent_after = 100.0;
            calm.revision_date = Some("2024-06-19".to_string());
            calm.revised_at = Some(now.timestamp_millis());

            let summary = summarize(&[urgent, calm], now);
            assert_eq!(summary.total_topics, 2);
            assert_eq!(summary.total_questions, 40);
            assert_eq!(summary.pooled_after_percent, 60);
            assert_eq!(summary.most_recent_topic, "Calm");
            assert_eq!((summary.urgent, summary.unstable, summary.consolidated), (1, 0, 1));
        }
    }
}
