//! Date bucketing of interaction logs for analytics charts.

use serde::Serialize;
use utoipa::ToSchema;

use super::TrackingEvent;

/// Events sharing the same UTC calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DateBucket {
    /// Calendar date in `YYYY-MM-DD` form.
    pub date: String,
    /// Number of events on this date.
    pub count: u64,
    /// The events themselves, in input order.
    pub items: Vec<TrackingEvent>,
}

/// Groups events by the UTC date of `occurred_at`.
///
/// Buckets appear in the order their date is first seen in `events`; the
/// output is not re-sorted. Pure and deterministic.
#[must_use]
pub fn bucketize(events: &[TrackingEvent]) -> Vec<DateBucket> {
    let mut buckets: Vec<DateBucket> = Vec::new();
    for event in events {
        let date = event.occurred_at.date_naive().format("%Y-%m-%d").to_string();
        match buckets.iter_mut().find(|b| b.date == date) {
            Some(bucket) => {
                bucket.count += 1;
                bucket.items.push(event.clone());
            }
            None => buckets.push(DateBucket {
                date,
                count: 1,
                items: vec![event.clone()],
            }),
        }
    }
    buckets
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        let Some(ts) = Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single() else {
            panic!("valid timestamp");
        };
        ts
    }

    fn event(ts: DateTime<Utc>) -> TrackingEvent {
        TrackingEvent::at("anonymous", "test-device", "127.0.0.1", ts)
    }

    #[test]
    fn empty_input_yields_no_buckets() {
        assert!(bucketize(&[]).is_empty());
    }

    #[test]
    fn buckets_follow_first_seen_order() {
        let events = vec![
            event(at(2024, 1, 1, 9)),
            event(at(2024, 1, 2, 9)),
            event(at(2024, 1, 1, 18)),
        ];
        let buckets = bucketize(&events);
        let shape: Vec<(&str, u64)> = buckets.iter().map(|b| (b.date.as_str(), b.count)).collect();
        assert_eq!(shape, vec![("2024-01-01", 2), ("2024-01-02", 1)]);
    }

    #[test]
    fn later_date_first_is_not_resorted() {
        let events = vec![event(at(2024, 3, 5, 0)), event(at(2024, 3, 4, 0))];
        let dates: Vec<String> = bucketize(&events).into_iter().map(|b| b.date).collect();
        assert_eq!(dates, vec!["2024-03-05", "2024-03-04"]);
    }

    #[test]
    fn items_keep_input_order_within_bucket() {
        let first = TrackingEvent::at("u1", "a", "1", at(2024, 1, 1, 1));
        let second = TrackingEvent::at("u2", "b", "2", at(2024, 1, 1, 23));
        let buckets = bucketize(&[first.clone(), second.clone()]);
        let Some(bucket) = buckets.first() else {
            panic!("expected one bucket");
        };
        assert_eq!(bucket.items, vec![first, second]);
    }

    #[test]
    fn deterministic_for_same_input() {
        let events = vec![
            event(at(2024, 2, 1, 0)),
            event(at(2024, 2, 3, 0)),
            event(at(2024, 2, 1, 12)),
        ];
        assert_eq!(bucketize(&events), bucketize(&events));
    }

    #[test]
    fn uses_utc_midnight_boundary() {
        let events = vec![event(at(2024, 1, 1, 23)), event(at(2024, 1, 2, 0))];
        assert_eq!(bucketize(&events).len(), 2);
    }
}
