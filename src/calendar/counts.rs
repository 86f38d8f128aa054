use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{models::Session, viewport::DateRange};

/// How busy a day cell looks.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LoadBucket {
    Empty,
    Single,
    Few,
    Many,
}

impl LoadBucket {
    pub fn for_count(count: usize) -> Self {
        match count {
            0 => LoadBucket::Empty,
            1 => LoadBucket::Single,
            2..=3 => LoadBucket::Few,
            _ => LoadBucket::Many,
        }
    }

    pub fn class_names(&self) -> &'static [&'static str] {
        match self {
            LoadBucket::Empty => &[],
            LoadBucket::Single => &["has-sessions", "single-session"],
            LoadBucket::Few => &["has-sessions", "few-sessions"],
            LoadBucket::Many => &["has-sessions", "many-sessions"],
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayLoad {
    pub date: NaiveDate,
    pub count: usize,
    pub bucket: LoadBucket,
    pub is_today: bool,
}

/// Sessions per calendar day for the currently loaded list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCountIndex {
    counts: BTreeMap<NaiveDate, usize>,
}

impl SessionCountIndex {
    pub fn build(sessions: &[Session]) -> Self {
        let mut counts = BTreeMap::new();
        for session in sessions {
            *counts.entry(session.date).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn rebuild(&mut self, sessions: &[Session]) {
        *self = Self::build(sessions);
    }

    pub fn count_on(&self, date: NaiveDate) -> usize {
        self.counts.get(&date).copied().unwrap_or(0)
    }

    pub fn bucket_on(&self, date: NaiveDate) -> LoadBucket {
        LoadBucket::for_count(self.count_on(date))
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Annotations for every day with at least one session inside `range`.
    pub fn day_loads(&self, range: DateRange, today: NaiveDate) -> Vec<DayLoad> {
        self.counts
            .range(range.start..=range.end)
            .map(|(date, count)| DayLoad {
                date: *date,
                count: *count,
                bucket: LoadBucket::for_count(*count),
                is_today: *date == today,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::session_on;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn counts_sessions_per_day() {
        let sessions = vec![
            session_on(1, d(15)),
            session_on(2, d(15)),
            session_on(3, d(16)),
            session_on(4, d(17)),
            session_on(5, d(17)),
            session_on(6, d(17)),
            session_on(7, d(17)),
        ];
        let index = SessionCountIndex::build(&sessions);

        assert_eq!(index.count_on(d(15)), 2);
        assert_eq!(index.count_on(d(14)), 0);
        assert_eq!(index.bucket_on(d(16)), LoadBucket::Single);
        assert_eq!(index.bucket_on(d(15)), LoadBucket::Few);
        assert_eq!(index.bucket_on(d(17)), LoadBucket::Many);
        assert_eq!(index.total(), sessions.len());
    }

    #[test]
    fn rebuild_replaces_previous_counts() {
        let mut index = SessionCountIndex::build(&[session_on(1, d(15))]);
        index.rebuild(&[session_on(2, d(20))]);
        assert_eq!(index.count_on(d(15)), 0);
        assert_eq!(index.count_on(d(20)), 1);
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(LoadBucket::for_count(0), LoadBucket::Empty);
        assert_eq!(LoadBucket::for_count(1), LoadBucket::Single);
        assert_eq!(LoadBucket::for_count(3), LoadBucket::Few);
        assert_eq!(LoadBucket::for_count(4), LoadBucket::Many);
        assert!(LoadBucket::Empty.class_names().is_empty());
    }

    #[test]
    fn day_loads_are_clipped_to_range() {
        let index = SessionCountIndex::build(&[
            session_on(1, d(13)),
            session_on(2, d(15)),
            session_on(3, d(21)),
        ]);
        let loads = index.day_loads(
            DateRange {
                start: d(14),
                end: d(20),
            },
            d(15),
        );
        assert_eq!(loads.len(), 1);
        assert_eq!(loads[0].date, d(15));
        assert!(loads[0].is_today);
    }
}
