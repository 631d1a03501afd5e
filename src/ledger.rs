//! Create-or-append bookkeeping for topic submissions.
//!
//! Re-submitting a topic never loses data: the previous results are pushed
//! onto the record's cycle history before the new ones overwrite them.

use chrono::{DateTime, Utc};

use crate::models::{CycleSnapshot, Submission, TopicRecord};
use crate::parse::{clamp_percent, fraction_to_percent, normalize_key};

/// Where a submission landed in the record list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created(usize),
    Updated(usize),
}

impl Upsert {
    pub fn index(&self) -> usize {
        match self {
            Upsert::Created(i) | Upsert::Updated(i) => *i,
        }
    }
}

/// Finds the record a topic name refers to: normalized key first, then the
/// exact display name for records that predate keys.
pub fn find_match(records: &[TopicRecord], name: &str) -> Option<usize> {
    let key = normalize_key(name);
    records
        .iter()
        .position(|r| r.name_key.as_deref() == Some(key.as_str()))
        .or_else(|| records.iter().position(|r| r.name == name))
}

pub fn upsert(records: &mut Vec<TopicRecord>, submission: Submission, now: DateTime<Utc>) -> Upsert {
    let key = normalize_key(&submission.name);

    if let Some(idx) = find_match(records, &submission.name) {
        let record = &mut records[idx];
        let snapshot = CycleSnapshot {
            date: record
                .revision_date
                .clone()
                .unwrap_or_else(|| now.to_rfc3339()),
            result_before: record.result_before.clone(),
            result_after: record.result_after.clone(),
            confidence: record.confidence.clone(),
        };
        record.history.push(snapshot);
        record.cycle_count = record.history.len();

        apply_submission(record, submission, key, now);
        log::debug!(
            "topic '{}' updated, {} cycle(s) in history",
            record.name,
            record.cycle_count
        );
        return Upsert::Updated(idx);
    }

    let mut record = TopicRecord {
        id: 0,
        name: String::new(),
        name_key: None,
        revised_at: None,
        revision_date: None,
        result_before: String::new(),
        result_after: String::new(),
        percent_before: 0.0,
        percent_after: 0.0,
        confidence: String::new(),
        tags: Vec::new(),
        history: Vec::new(),
        cycle_count: 0,
    };
    apply_submission(&mut record, submission, key, now);
    log::debug!("topic '{}' created", record.name);
    records.push(record);
    Upsert::Created(records.len() - 1)
}

fn apply_submission(record: &mut TopicRecord, submission: Submission, key: String, now: DateTime<Utc>) {
    record.percent_before = clamp_percent(fraction_to_percent(&submission.result_before));
    record.percent_after = clamp_percent(fraction_to_percent(&submission.result_after));
    record.name = submission.name;
    record.name_key = Some(key);
    record.result_before = submission.result_before;
    record.result_after = submission.result_after;
    record.confidence = submission.confidence;
    record.tags = normalize_tags(submission.tags);
    record.revised_at = Some(now.timestamp_millis());
    record.revision_date = Some(now.to_rfc3339());
}

// Trimmed, sorted and deduplicated, the way storage hands tags back
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut tags: Vec<String> = tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Removes one past cycle by position. Out-of-range indices are ignored and
/// reported as `false`. Later cycles shift down by one.
pub fn delete_cycle_at(record: &mut TopicRecord, index: usize) -> bool {
    if index >= record.history.len() {
        log::debug!(
            "cycle {} out of range for '{}' ({} cycles)",
            index,
            record.name,
            record.history.len()
        );
        return false;
    }
    record.history.remove(index);
    record.cycle_count = record.history.len();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn submission(name: &str, before: &str, after: &str, confidence: &str) -> Submission {
        Submission {
            name: name.to_string(),
            result_before: before.to_string(),
            result_after: after.to_string(),
            confidence: confidence.to_string(),
            tags: vec![],
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    mod upsert_tests {
        use super::*;

        #[test]
        fn first_submission_creates_record() {
            let mut records = Vec::new();
            let outcome = upsert(&mut records, submission("Óptica", "3/10", "7/10", "baixo"), t0());

            assert_eq!(outcome, Upsert::Created(0));
            let r = &records[0];
            assert_eq!(r.name, "Óptica");
            assert_eq!(r.name_key.as_deref(), Some("optica"));
            assert_eq!(r.percent_before, 30.0);
            assert_eq!(r.percent_after, 70.0);
            assert!(r.history.is_empty());
            assert_eq!(r.cycle_count, 0);
            assert_eq!(r.revised_at, Some(t0().timestamp_millis()));
            assert_eq!(r.revision_date, Some(t0().to_rfc3339()));
        }

        #[test]
        fn tags_are_trimmed_sorted_and_deduplicated() {
            let mut records = Vec::new();
            let mut s = submission("Óptica", "3/10", "7/10", "");
            s.tags = ["b", " a", "a ", "", "  "].iter().map(|t| t.to_string()).collect();
            upsert(&mut records, s, t0());
            assert_eq!(records[0].tags, ["a", "b"]);
        }

        #[test]
        fn resubmission_snapshots_previous_state() {
            let mut records = Vec::new();
            upsert(&mut records, submission("Óptica", "3/10", "7/10", "baixo"), t0());
            let later = t0() + Duration::days(3);
            let outcome = upsert(&mut records, submission("optica", "6/10", "9/10", "alto"), later);

            assert_eq!(outcome, Upsert::Updated(0));
            assert_eq!(records.len(), 1);
            let r = &records[0];
            assert_eq!(r.history.len(), 1);
            assert_eq!(
                r.history[0],
                CycleSnapshot {
                    date: t0().to_rfc3339(),
                    result_before: "3/10".to_string(),
                    result_after: "7/10".to_string(),
                    confidence: "baixo".to_string(),
                }
            );
            assert_eq!(r.result_before, "6/10");
            assert_eq!(r.confidence, "alto");
            assert_eq!(r.revision_date, Some(later.to_rfc3339()));
        }

        #[test]
        fn n_submissions_leave_n_minus_one_cycles() {
            let mut records = Vec::new();
            for i in 0..5 {
                let s = submission("Genética", &format!("{}/10", i), "5/10", "médio");
                upsert(&mut records, s, t0() + Duration::days(i));
            }
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].history.len(), 4);
            assert_eq!(records[0].cycle_count, 4);
            let befores: Vec<_> = records[0].history.iter().map(|c| c.result_before.as_str()).collect();
            assert_eq!(befores, ["0/10", "1/10", "2/10", "3/10"]);
        }

        #[test]
        fn snapshot_date_falls_back_to_now() {
            let mut records = vec![TopicRecord {
                id: 7,
                name: "Legacy".to_string(),
                name_key: None,
                revised_at: None,
                revision_date: None,
                result_before: "1/2".to_string(),
                result_after: "2/2".to_string(),
                percent_before: 50.0,
                percent_after: 100.0,
                confidence: String::new(),
                tags: vec![],
                history: vec![],
                cycle_count: 0,
            }];
            let outcome = upsert(&mut records, submission("Legacy", "2/2", "2/2", ""), t0());

            assert_eq!(outcome, Upsert::Updated(0));
            assert_eq!(records[0].id, 7);
            assert_eq!(records[0].history[0].date, t0().to_rfc3339());
            assert_eq!(records[0].name_key.as_deref(), Some("legacy"));
        }

        #[test]
        fn legacy_match_requires_exact_name() {
            let mut records = Vec::new();
            upsert(&mut records, submission("Legacy", "1/2", "1/2", ""), t0());
            records[0].name_key = None;

            let outcome = upsert(&mut records, submission("LEGACY", "1/2", "1/2", ""), t0());
            assert_eq!(outcome, Upsert::Created(1));
        }

        #[test]
        fn non_numeric_results_store_zero_percent() {
            let mut records = Vec::new();
            upsert(&mut records, submission("X", "abc", "", ""), t0());
            assert_eq!(records[0].percent_before, 0.0);
            assert_eq!(records[0].percent_after, 0.0);
        }
    }

    mod delete_cycle_tests {
        use super::*;

        fn with_cycles(n: i64) -> TopicRecord {
            let mut records = Vec::new();
            for i in 0..=n {
                let s = submission("Topic", &format!("{}/10", i), "5/10", "");
                upsert(&mut records, s, t0() + Duration::days(i));
            }
            records.remove(0)
        }

        #[test]
        fn removes_and_shifts() {
            let mut r = with_cycles(3);
            assert!(delete_cycle_at(&mut r, 1));
            assert_eq!(r.cycle_count, 2);
            let befores: Vec<_> = r.history.iter().map(|c| c.result_before.as_str()).collect();
            assert_eq!(befores, ["0/10", "2/10"]);
        }

        #[test]
        fn out_of_range_is_noop() {
            let mut r = with_cycles(2);
            let before = r.clone();
            assert!(!delete_cycle_at(&mut r, 2));
            assert!(!delete_cycle_at(&mut r, usize::MAX));
            assert_eq!(r, before);
        }

        #[test]
        fn empty_history_is_noop() {
            let mut r = with_cycles(0);
            assert!(!delete_cycle_at(&mut r, 0));
            assert_eq!(r.cycle_count, 0);
        }
    }
}
