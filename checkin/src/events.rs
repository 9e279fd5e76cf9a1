//! Event selector: which events the desk offers, and in what order.

use chrono::{DateTime, TimeDelta, Utc};
use reception_core::model::Event;

/// How long after its end an event stays selectable.
pub const GRACE_PERIOD_HOURS: i64 = 24;

/// Keep events that ended less than a day before `now`, most recently
/// started first.
///
/// The sort is stable, so events sharing a start time keep API order.
#[must_use]
pub fn select_active(events: Vec<Event>, now: DateTime<Utc>) -> Vec<Event> {
    let cutoff = now - TimeDelta::hours(GRACE_PERIOD_HOURS);
    let mut active: Vec<Event> = events
        .into_iter()
        .filter(|event| event.end_time > cutoff)
        .collect();
    active.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    active
}

/// Picker label: `name (YYYY-MM-DD)` using the start date.
#[must_use]
pub fn event_label(event: &Event) -> String {
    format!("{} ({})", event.name, event.start_time.format("%Y-%m-%d"))
}

/// What the event picker currently holds.
///
/// An empty filtered list is a different state from a failed load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EventList {
    /// Nothing requested yet (no base URL configured)
    #[default]
    NotLoaded,
    /// Request in flight
    Loading,
    /// Active events, already filtered and ordered
    Loaded(Vec<Event>),
    /// The API answered but no event is active
    Empty,
    /// The request failed
    Failed(String),
}

impl EventList {
    /// Build from an already-filtered list.
    #[must_use]
    pub fn from_active(events: Vec<Event>) -> Self {
        if events.is_empty() {
            Self::Empty
        } else {
            Self::Loaded(events)
        }
    }

    /// Selectable events, empty unless loaded.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        match self {
            Self::Loaded(events) => events,
            _ => &[],
        }
    }

    /// Event by id.
    #[must_use]
    pub fn find(&self, event_id: &str) -> Option<&Event> {
        self.events().iter().find(|event| event.id == event_id)
    }

    /// Resolve a picker choice: a 1-based position, else an event id.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<&Event> {
        if let Some(event) = self.find(key) {
            return Some(event);
        }
        key.parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| self.events().get(index))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn event(id: &str, start_offset_hours: i64, end_offset_hours: i64) -> Event {
        Event {
            id: id.to_string(),
            name: format!("Event {id}"),
            start_time: now() + TimeDelta::hours(start_offset_hours),
            end_time: now() + TimeDelta::hours(end_offset_hours),
        }
    }

    #[test]
    fn test_filters_events_ended_over_a_day_ago() {
        let events = vec![
            event("old", -72, -48),
            event("yesterday", -30, -23),
            event("boundary", -30, -24),
            event("future", 24, 26),
        ];
        let ids: Vec<String> = select_active(events, now()).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["future", "yesterday"]);
    }

    #[test]
    fn test_label_uses_start_date() {
        let label = event_label(&event("EV1", 0, 2));
        assert_eq!(label, "Event EV1 (2025-06-01)");
    }

    #[test]
    fn test_empty_is_distinct_from_failure() {
        assert_eq!(EventList::from_active(Vec::new()), EventList::Empty);
        assert_ne!(EventList::Empty, EventList::Failed("API Error".into()));
    }

    #[test]
    fn test_resolve_by_position_or_id() {
        let list = EventList::from_active(vec![event("EV9", 2, 4), event("EV1", 0, 2)]);
        assert_eq!(list.resolve("1").map(|e| e.id.as_str()), Some("EV9"));
        assert_eq!(list.resolve("EV1").map(|e| e.id.as_str()), Some("EV1"));
        assert!(list.resolve("0").is_none());
        assert!(list.resolve("3").is_none());
        assert!(EventList::Loading.resolve("1").is_none());
    }

    fn arb_event() -> impl Strategy<Value = Event> {
        (0u32..1000, -200i64..200, 0i64..100).prop_map(|(id, start, length)| Event {
            id: format!("EV{id}"),
            name: String::new(),
            start_time: now() + TimeDelta::hours(start),
            end_time: now() + TimeDelta::hours(start + length),
        })
    }

    proptest! {
        #[test]
        fn prop_included_iff_ended_within_grace(events in prop::collection::vec(arb_event(), 0..30)) {
            let cutoff = now() - TimeDelta::hours(GRACE_PERIOD_HOURS);
            let active = select_active(events.clone(), now());

            let expected = events.iter().filter(|e| e.end_time > cutoff).count();
            prop_assert_eq!(active.len(), expected);
            prop_assert!(active.iter().all(|e| e.end_time > cutoff));
        }

        #[test]
        fn prop_ordered_by_start_descending(events in prop::collection::vec(arb_event(), 0..30)) {
            let active = select_active(events, now());
            for pair in active.windows(2) {
                prop_assert!(pair[0].start_time >= pair[1].start_time);
            }
        }
    }
}
