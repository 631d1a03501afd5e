use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

pub const DEFAULT_WINDOW_DAYS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub count: u64,
    pub tier: u8,
    pub is_today: bool,
}

// Intensity bucket for a day's question count
pub fn intensity(count: u64) -> u8 {
    match count {
        0 => 0,
        1..=19 => 1,
        20..=49 => 2,
        50..=79 => 3,
        _ => 4,
    }
}

/// One cell per day for the `days` days ending on `today`, most recent
/// first: `cells[0]` is today and the last cell is the oldest day. The grid
/// stops early at the earliest representable date.
pub fn activity_grid(volume: &BTreeMap<NaiveDate, u64>, today: NaiveDate, days: usize) -> Vec<DayCell> {
    std::iter::successors(Some(today), |d| d.pred_opt())
        .take(days)
        .map(|date| {
            let count = volume.get(&date).copied().unwrap_or(0);
            DayCell {
                date,
                count,
                tier: intensity(count),
                is_today: date == today,
            }
        })
        .collect()
}

/// Questions across `cells`, saturating instead of overflowing.
pub fn window_total(cells: &[DayCell]) -> u64 {
    cells.iter().fold(0u64, |acc, c| acc.saturating_add(c.count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn intensity_thresholds() {
        assert_eq!(intensity(0), 0);
        assert_eq!(intensity(1), 1);
        assert_eq!(intensity(19), 1);
        assert_eq!(intensity(20), 2);
        assert_eq!(intensity(49), 2);
        assert_eq!(intensity(50), 3);
        assert_eq!(intensity(79), 3);
        assert_eq!(intensity(80), 4);
        assert_eq!(intensity(5_000), 4);
    }

    #[test]
    fn sixty_cells_most_recent_first() {
        let today = day(2024, 3, 1);
        let cells = activity_grid(&BTreeMap::new(), today, DEFAULT_WINDOW_DAYS);

        assert_eq!(cells.len(), 60);
        assert_eq!(cells[0].date, today);
        assert!(cells[0].is_today);
        assert_eq!(cells[59].date, day(2024, 1, 2));
        assert!(cells[1..].iter().all(|c| !c.is_today));
        assert!(cells.windows(2).all(|w| w[0].date - w[1].date == Duration::days(1)));
    }

    #[test]
    fn today_cell_carries_volume() {
        let today = day(2024, 3, 1);
        let mut volume = BTreeMap::new();
        volume.insert(today, 13);
        volume.insert(day(2024, 2, 28), 55);

        let cells = activity_grid(&volume, today, DEFAULT_WINDOW_DAYS);
        assert_eq!(cells[0].count, 13);
        assert_eq!(cells[0].tier, 1);
        assert_eq!(cells[2].count, 55);
        assert_eq!(cells[2].tier, 3);
        assert_eq!(cells[1].count, 0);
        assert_eq!(cells[1].tier, 0);
    }

    #[test]
    fn days_outside_window_are_ignored() {
        let today = day(2024, 3, 1);
        let mut volume = BTreeMap::new();
        volume.insert(day(2023, 12, 1), 90);
        volume.insert(day(2024, 3, 2), 90);

        let cells = activity_grid(&volume, today, 60);
        assert!(cells.iter().all(|c| c.count == 0));
    }

    #[test]
    fn window_stops_at_earliest_date() {
        let today = NaiveDate::MIN.succ_opt().unwrap().succ_opt().unwrap();
        let cells = activity_grid(&BTreeMap::new(), today, usize::MAX);
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[2].date, NaiveDate::MIN);
    }

    #[test]
    fn window_total_saturates() {
        let today = day(2024, 3, 1);
        let mut volume = BTreeMap::new();
        volume.insert(today, u64::MAX);
        volume.insert(day(2024, 2, 29), 7);

        let cells = activity_grid(&volume, today, 3);
        assert_eq!(window_total(&cells), u64::MAX);
        assert_eq!(window_total(&cells[1..]), 7);
    }

    #[test]
    fn zero_window_is_empty() {
        assert!(activity_grid(&BTreeMap::new(), day(2024, 3, 1), 0).is_empty());
    }
}
