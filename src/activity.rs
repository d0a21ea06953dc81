//! Time-based listening activity.
//!
//! Albums only remember when they were last listened, so every listen of an
//! album is attributed to that single instant. An album listened 12 times
//! contributes 12 listens to the day, weekday and hour of its last listen.
//! This is an approximation of listening history, not a play log.

use crate::model::AlbumRecord;
use crate::session::SessionContext;
use serde::Serialize;
use std::collections::BTreeMap;
use time::{Date, OffsetDateTime, UtcOffset, Weekday};

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
    Weekday::Sunday,
];

/// All listens of one album, pinned to its last listen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenSample {
    pub at: OffsetDateTime,
    pub plays: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub day: Date,
    pub listens: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekdayCount {
    pub weekday: Weekday,
    pub listens: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourCount {
    pub hour: u8,
    pub listens: u64,
}

/// `None` fields mean there is no listen to derive them from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListeningActivity {
    pub total_listens: u64,
    pub active_days: usize,
    pub most_active_day: Option<DayCount>,
    pub most_active_weekday: Option<WeekdayCount>,
    pub longest_streak: u32,
    pub average_listens_per_day: f64,
    pub most_active_hour: Option<HourCount>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub first_listen: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_listen: Option<OffsetDateTime>,
}

/// One sample per album that has been listened, weighted by its listen count.
/// A recorded listen with a zero count still counts once.
pub fn expand_listens(records: &[AlbumRecord]) -> Vec<ListenSample> {
    records
        .iter()
        .filter_map(|record| {
            record.last_listened.map(|at| ListenSample {
                at,
                plays: u64::from(record.listen_count.max(1)),
            })
        })
        .collect()
}

pub fn compute_activity(records: &[AlbumRecord], session: &SessionContext) -> ListeningActivity {
    let samples = expand_listens(records);
    let offset = session.offset();

    let total_listens: u64 = samples.iter().map(|sample| sample.plays).sum();
    let daily = daily_buckets(&samples);
    let active_days = daily.len();
    let average_listens_per_day = if active_days == 0 {
        0.0
    } else {
        total_listens as f64 / active_days as f64
    };

    let most_active_day =
        busiest(daily.iter().map(|(day, listens)| (*day, *listens))).map(|(day, listens)| {
            DayCount { day, listens }
        });
    let most_active_weekday = busiest(WEEKDAYS.into_iter().zip(weekday_buckets(&samples, offset)))
        .map(|(weekday, listens)| WeekdayCount { weekday, listens });
    let most_active_hour = busiest((0_u8..24).zip(hour_buckets(&samples, offset)))
        .map(|(hour, listens)| HourCount { hour, listens });

    ListeningActivity {
        total_listens,
        active_days,
        most_active_day,
        most_active_weekday,
        longest_streak: longest_streak(daily.keys().copied()),
        average_listens_per_day,
        most_active_hour,
        first_listen: samples.iter().map(|sample| sample.at).min(),
        last_listen: samples.iter().map(|sample| sample.at).max(),
    }
}

/// Longest run of consecutive calendar days.
///
/// `days` must be ascending and free of duplicates.
pub fn longest_streak(days: impl IntoIterator<Item = Date>) -> u32 {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<Date> = None;
    for day in days {
        current = match previous {
            Some(prev) if prev.next_day() == Some(day) => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(day);
    }
    longest
}

// Calendar days are taken in UTC.
fn daily_buckets(samples: &[ListenSample]) -> BTreeMap<Date, u64> {
    let mut buckets = BTreeMap::new();
    for sample in samples {
        let day = sample.at.to_offset(UtcOffset::UTC).date();
        *buckets.entry(day).or_insert(0) += sample.plays;
    }
    buckets
}

fn weekday_buckets(samples: &[ListenSample], offset: UtcOffset) -> [u64; 7] {
    let mut buckets = [0_u64; 7];
    for sample in samples {
        let weekday = sample.at.to_offset(offset).weekday();
        buckets[usize::from(weekday.number_days_from_monday())] += sample.plays;
    }
    buckets
}

fn hour_buckets(samples: &[ListenSample], offset: UtcOffset) -> [u64; 24] {
    let mut buckets = [0_u64; 24];
    for sample in samples {
        buckets[usize::from(sample.at.to_offset(offset).hour())] += sample.plays;
    }
    buckets
}

// Buckets arrive in ascending key order; the first of several equal maxima wins.
fn busiest<K>(buckets: impl IntoIterator<Item = (K, u64)>) -> Option<(K, u64)> {
    buckets
        .into_iter()
        .filter(|(_, listens)| *listens > 0)
        .fold(None, |best, (key, listens)| match best {
            Some((_, top)) if listens <= top => best,
            _ => Some((key, listens)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::tests::album;
    use proptest::prelude::*;
    use time::macros::{date, datetime};

    fn utc_session() -> SessionContext {
        SessionContext::new("uid", datetime!(2024-06-15 12:00 UTC))
    }

    #[test]
    fn empty_collection_has_no_activity() {
        let activity = compute_activity(&[], &utc_session());
        assert_eq!(activity.total_listens, 0);
        assert_eq!(activity.active_days, 0);
        assert_eq!(activity.most_active_day, None);
        assert_eq!(activity.most_active_weekday, None);
        assert_eq!(activity.most_active_hour, None);
        assert_eq!(activity.longest_streak, 0);
        assert_eq!(activity.average_listens_per_day, 0.0);
        assert_eq!(activity.first_listen, None);
        assert_eq!(activity.last_listen, None);
    }

    #[test]
    fn albums_without_listens_are_left_out() {
        let records = vec![album("saved", 4, None)];
        let activity = compute_activity(&records, &utc_session());
        assert_eq!(activity.total_listens, 0);
        assert_eq!(activity.most_active_day, None);
    }

    #[test]
    fn listens_are_expanded_by_count() {
        let records = vec![
            album("a", 3, Some(datetime!(2024-06-10 21:15 UTC))),
            album("b", 0, Some(datetime!(2024-06-11 08:00 UTC))),
        ];
        let samples = expand_listens(&records);
        assert_eq!(samples.iter().map(|s| s.plays).collect::<Vec<_>>(), vec![3, 1]);

        let activity = compute_activity(&records, &utc_session());
        assert_eq!(activity.total_listens, 4);
        assert_eq!(
            activity.most_active_day,
            Some(DayCount {
                day: date!(2024-06-10),
                listens: 3
            })
        );
        assert_eq!(
            activity.most_active_weekday,
            Some(WeekdayCount {
                weekday: Weekday::Monday,
                listens: 3
            })
        );
        assert_eq!(
            activity.most_active_hour,
            Some(HourCount {
                hour: 21,
                listens: 3
            })
        );
        assert_eq!(activity.average_listens_per_day, 2.0);
        assert_eq!(activity.longest_streak, 2);
        assert_eq!(activity.first_listen, Some(datetime!(2024-06-10 21:15 UTC)));
        assert_eq!(activity.last_listen, Some(datetime!(2024-06-11 08:00 UTC)));
    }

    #[test]
    fn tied_buckets_resolve_to_lowest_key() {
        let records = vec![
            album("late", 2, Some(datetime!(2024-06-14 17:00 UTC))),
            album("early", 2, Some(datetime!(2024-06-12 09:00 UTC))),
        ];
        let activity = compute_activity(&records, &utc_session());
        assert_eq!(activity.most_active_day.map(|d| d.day), Some(date!(2024-06-12)));
        assert_eq!(
            activity.most_active_weekday.map(|w| w.weekday),
            Some(Weekday::Wednesday)
        );
        assert_eq!(activity.most_active_hour.map(|h| h.hour), Some(9));
    }

    #[test]
    fn days_are_utc_but_hours_and_weekdays_are_local() {
        let records = vec![album("a", 1, Some(datetime!(2024-06-15 23:30 UTC)))];
        let session = SessionContext::new("uid", datetime!(2024-06-16 10:00 +02:00));

        let activity = compute_activity(&records, &session);
        assert_eq!(activity.most_active_day.map(|d| d.day), Some(date!(2024-06-15)));
        assert_eq!(
            activity.most_active_weekday.map(|w| w.weekday),
            Some(Weekday::Sunday)
        );
        assert_eq!(activity.most_active_hour.map(|h| h.hour), Some(1));
    }

    #[test]
    fn streak_lengths() {
        assert_eq!(longest_streak(std::iter::empty()), 0);
        assert_eq!(longest_streak([date!(2024-06-01)]), 1);
        assert_eq!(
            longest_streak([date!(2024-06-01), date!(2024-06-02), date!(2024-06-03)]),
            3
        );
        assert_eq!(
            longest_streak([
                date!(2024-06-01),
                date!(2024-06-02),
                date!(2024-06-05),
                date!(2024-06-06),
            ]),
            2
        );
        assert_eq!(
            longest_streak([date!(2024-02-28), date!(2024-02-29), date!(2024-03-01)]),
            3
        );
        assert_eq!(
            longest_streak([date!(2023-12-31), date!(2024-01-01)]),
            2
        );
    }

    #[test]
    fn a_gap_resets_the_running_streak() {
        let days = [
            date!(2024-06-01),
            date!(2024-06-02),
            date!(2024-06-03),
            date!(2024-06-05),
            date!(2024-06-06),
        ];
        assert_eq!(longest_streak(days), 3);
        assert_eq!(longest_streak(days[3..].iter().copied()), 2);
    }

    proptest! {
        #[test]
        fn streak_never_exceeds_active_days(offsets in proptest::collection::btree_set(0i64..400, 0..60)) {
            let start = date!(2024-01-01);
            let days: Vec<Date> = offsets
                .iter()
                .map(|n| start + time::Duration::days(*n))
                .collect();
            let streak = longest_streak(days.iter().copied());
            prop_assert!((streak as usize) <= days.len());
            prop_assert_eq!(streak == 0, days.is_empty());
        }

        #[test]
        fn total_listens_match_expanded_counts(counts in proptest::collection::vec(0u32..20, 0..20)) {
            let at = datetime!(2024-06-01 12:00 UTC);
            let records: Vec<AlbumRecord> = counts
                .iter()
                .enumerate()
                .map(|(idx, count)| album(&idx.to_string(), *count, Some(at)))
                .collect();
            let activity = compute_activity(&records, &utc_session());
            let expected: u64 = counts.iter().map(|c| u64::from((*c).max(1))).sum();
            prop_assert_eq!(activity.total_listens, expected);
            prop_assert_eq!(activity.longest_streak, u32::from(!counts.is_empty()));
        }
    }
}
