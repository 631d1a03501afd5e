use chrono::{DateTime, Utc};

use crate::aura::classify;
use crate::models::{AuraTier, TopicRecord};
use crate::parse::parse_revision;

pub const DEFAULT_FOCUS_LIMIT: usize = 5;

/// Short list of topics to work on next.
///
/// Urgent topics come first in their existing order. Unstable topics fill
/// any remaining room, then the least recently revised of the rest. Topics
/// without a readable revision date count as the oldest.
pub fn select_focus_set<'a>(
    records: &'a [TopicRecord],
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<&'a TopicRecord> {
    let tiers: Vec<AuraTier> = records.iter().map(|r| classify(r, now)).collect();
    let tiers = tiers.as_slice();
    let of_tier = move |tier: AuraTier| {
        tiers
            .iter()
            .enumerate()
            .filter(move |(_, t)| **t == tier)
            .map(|(i, _)| i)
    };

    let mut picked: Vec<usize> = of_tier(AuraTier::Urgent).take(limit).collect();
    if picked.len() < limit {
        let room = limit - picked.len();
        picked.extend(of_tier(AuraTier::Unstable).take(room));
    }

    if picked.len() < limit {
        let mut rest: Vec<usize> = (0..records.len()).filter(|i| !picked.contains(i)).collect();
        // Stable sort keeps list order among equal dates; None sorts first
        rest.sort_by_key(|&i| records[i].revision_date.as_deref().and_then(parse_revision));
        let room = limit - picked.len();
        picked.extend(rest.into_iter().take(room));
    }

    picked.into_iter().map(|i| &records[i]).collect()
}
