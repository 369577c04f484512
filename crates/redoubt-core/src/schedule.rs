//! Recurring focus schedules and window matching.
//!
//! A schedule is a time-of-day window on a set of weekdays. A window
//! whose end precedes its start spans midnight and matches across two
//! calendar days: the evening portion on the scheduled weekday and the
//! morning portion on the following day. Matching is seconds-since-
//! midnight interval arithmetic over an injected instant, never real
//! time, so it re-derives cleanly after system-clock jumps.

use chrono::{DateTime, Datelike, Duration, Local, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Short weekday name used in storage and JSON ("Mon".."Sun").
pub fn format_weekday(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Parse a weekday from a short or full English name, case-insensitive.
pub fn parse_weekday(value: &str) -> Option<Weekday> {
    match value.trim().to_ascii_lowercase().as_str() {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

mod weekday_names {
    use chrono::Weekday;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(days: &[Weekday], ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_seq(days.iter().map(|d| super::format_weekday(*d)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<Weekday>, D::Error> {
        let names = Vec::<String>::deserialize(de)?;
        names
            .iter()
            .map(|n| {
                super::parse_weekday(n)
                    .ok_or_else(|| D::Error::custom(format!("unknown weekday '{n}'")))
            })
            .collect()
    }
}

/// A user-defined recurring focus window.
///
/// Mutations take effect on the next evaluation tick only; a running
/// session keeps the end instant captured when it started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringSchedule {
    pub id: String,
    pub name: String,
    /// Window start, local time-of-day.
    pub start: NaiveTime,
    /// Window end, local time-of-day. An end before the start spans
    /// midnight.
    pub end: NaiveTime,
    #[serde(with = "weekday_names")]
    pub days: Vec<Weekday>,
    pub hardcore: bool,
    pub enabled: bool,
    pub created_at: DateTime<Local>,
}

impl RecurringSchedule {
    /// Create an enabled schedule with a fresh id. Days are stored
    /// sorted and deduplicated.
    pub fn new(
        name: impl Into<String>,
        start: NaiveTime,
        end: NaiveTime,
        days: Vec<Weekday>,
        hardcore: bool,
    ) -> Self {
        let mut days = days;
        days.sort_by_key(|d| d.num_days_from_monday());
        days.dedup();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            start,
            end,
            days,
            hardcore,
            enabled: true,
            created_at: Local::now(),
        }
    }

    /// Check the schedule invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.start == self.end {
            return Err(ValidationError::EmptyWindow {
                start: self.start,
                end: self.end,
            });
        }
        if self.enabled && self.days.is_empty() {
            return Err(ValidationError::NoWeekdays);
        }
        Ok(())
    }

    /// True when `now` falls inside the window on a scheduled weekday.
    pub fn matches(&self, now: DateTime<Local>) -> bool {
        self.remaining_secs(now).is_some()
    }

    /// Seconds left until the matching window closes, `None` when the
    /// schedule does not match `now`.
    pub fn remaining_secs(&self, now: DateTime<Local>) -> Option<i64> {
        self.remaining_at(now.weekday(), i64::from(now.time().num_seconds_from_midnight()))
    }

    /// The instant the currently-matching window closes.
    pub fn window_end(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        self.remaining_secs(now).map(|secs| now + Duration::seconds(secs))
    }

    fn remaining_at(&self, today: Weekday, tod: i64) -> Option<i64> {
        if !self.enabled {
            return None;
        }
        let start = i64::from(self.start.num_seconds_from_midnight());
        let end = i64::from(self.end.num_seconds_from_midnight());
        if start < end {
            if self.days.contains(&today) && tod >= start && tod < end {
                return Some(end - tod);
            }
            return None;
        }
        // Window spans midnight: the evening portion runs to 24:00 on a
        // scheduled day, then continues into the next calendar day.
        if self.days.contains(&today) && tod >= start {
            return Some(SECS_PER_DAY - tod + end);
        }
        if self.days.contains(&today.pred()) && tod < end {
            return Some(end - tod);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn schedule(start: (u32, u32), end: (u32, u32), days: Vec<Weekday>) -> RecurringSchedule {
        RecurringSchedule::new(
            "test",
            NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            days,
            false,
        )
    }

    // 2026-03-02 is a Monday.
    fn local(day: u32, hour: u32, min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, day, hour, min, 0).unwrap()
    }

    #[test]
    fn plain_window_matches_inside_only() {
        let s = schedule((9, 0), (17, 0), vec![Weekday::Mon]);
        assert!(s.matches(local(2, 10, 0)));
        assert!(s.matches(local(2, 9, 0)));
        assert!(!s.matches(local(2, 17, 0))); // end-exclusive
        assert!(!s.matches(local(2, 8, 59)));
        assert!(!s.matches(local(3, 10, 0))); // Tuesday
    }

    #[test]
    fn remaining_counts_down_to_window_end() {
        let s = schedule((9, 0), (17, 0), vec![Weekday::Mon]);
        assert_eq!(s.remaining_secs(local(2, 10, 0)), Some(7 * 3600));
        assert_eq!(s.window_end(local(2, 10, 0)), Some(local(2, 17, 0)));
    }

    #[test]
    fn wrapping_window_spans_two_calendar_days() {
        let s = schedule((22, 0), (2, 0), vec![Weekday::Mon]);
        assert!(s.matches(local(2, 23, 0))); // Monday evening
        assert!(s.matches(local(3, 1, 0))); // Tuesday morning
        assert!(!s.matches(local(3, 3, 0)));
        assert!(!s.matches(local(1, 23, 0))); // Sunday evening
        assert_eq!(s.remaining_secs(local(2, 23, 0)), Some(3 * 3600));
        assert_eq!(s.window_end(local(2, 23, 0)), Some(local(3, 2, 0)));
        assert_eq!(s.remaining_secs(local(3, 1, 0)), Some(3600));
    }

    #[test]
    fn disabled_schedule_never_matches() {
        let mut s = schedule((9, 0), (17, 0), vec![Weekday::Mon]);
        s.enabled = false;
        assert!(!s.matches(local(2, 10, 0)));
    }

    #[test]
    fn validate_rejects_empty_window_and_no_days() {
        let s = schedule((9, 0), (9, 0), vec![Weekday::Mon]);
        assert!(matches!(
            s.validate(),
            Err(ValidationError::EmptyWindow { .. })
        ));

        let s = schedule((9, 0), (17, 0), vec![]);
        assert!(matches!(s.validate(), Err(ValidationError::NoWeekdays)));
    }

    #[test]
    fn days_are_sorted_and_deduped() {
        let s = schedule(
            (9, 0),
            (17, 0),
            vec![Weekday::Fri, Weekday::Mon, Weekday::Fri],
        );
        assert_eq!(s.days, vec![Weekday::Mon, Weekday::Fri]);
    }

    #[test]
    fn weekday_names_round_trip_through_json() {
        let s = schedule((9, 0), (17, 0), vec![Weekday::Mon, Weekday::Wed]);
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"Mon\""));
        let back: RecurringSchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back.days, s.days);
    }

    proptest! {
        // For non-wrapping windows, matching is exactly the half-open
        // interval check on a scheduled weekday.
        #[test]
        fn non_wrapping_match_is_interval_membership(
            start in 0i64..SECS_PER_DAY - 1,
            len in 1i64..SECS_PER_DAY,
            tod in 0i64..SECS_PER_DAY,
        ) {
            let end = (start + len).min(SECS_PER_DAY - 1);
            prop_assume!(start < end);
            let s = RecurringSchedule::new(
                "prop",
                NaiveTime::from_num_seconds_from_midnight_opt(start as u32, 0).unwrap(),
                NaiveTime::from_num_seconds_from_midnight_opt(end as u32, 0).unwrap(),
                vec![Weekday::Mon],
                false,
            );
            let expected = tod >= start && tod < end;
            prop_assert_eq!(s.remaining_at(Weekday::Mon, tod).is_some(), expected);
            prop_assert_eq!(s.remaining_at(Weekday::Tue, tod), None);
            if expected {
                prop_assert_eq!(s.remaining_at(Weekday::Mon, tod), Some(end - tod));
            }
        }

        // Wrapping windows match the evening portion on the scheduled
        // day and the morning portion on the day after.
        #[test]
        fn wrapping_match_splits_across_days(
            start in 1i64..SECS_PER_DAY,
            end in 0i64..SECS_PER_DAY,
            tod in 0i64..SECS_PER_DAY,
        ) {
            prop_assume!(end < start);
            let s = RecurringSchedule::new(
                "prop",
                NaiveTime::from_num_seconds_from_midnight_opt(start as u32, 0).unwrap(),
                NaiveTime::from_num_seconds_from_midnight_opt(end as u32, 0).unwrap(),
                vec![Weekday::Mon],
                false,
            );
            prop_assert_eq!(s.remaining_at(Weekday::Mon, tod).is_some(), tod >= start);
            prop_assert_eq!(s.remaining_at(Weekday::Tue, tod).is_some(), tod < end);
            prop_assert_eq!(s.remaining_at(Weekday::Wed, tod), None);
        }
    }
}
