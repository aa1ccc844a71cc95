//! Booking deduplication - one reservation generates many emails
//!
//! Events sharing a confirmation number are folded together. Events without
//! one are grouped greedily when they are the same kind of booking, close in
//! time, and agree on destination or provider. Grouping is seeded in input
//! order and is not transitive, so the result depends on that order.

use crate::domain::event::{Location, TravelEvent};
use crate::infra::config::Config;
use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use tracing::{debug, info};

/// Collapses duplicate bookings into single, richer events
pub struct Deduplicator {
    window_days: i64,
}

impl Deduplicator {
    pub fn new(config: &Config) -> Self {
        Self { window_days: config.dedup_window_days() }
    }

    /// Create a deduplicator with an explicit date window
    pub fn with_window_days(window_days: i64) -> Self {
        Self { window_days }
    }

    /// Deduplicate a batch.
    ///
    /// Confirmed bookings come first (in first-seen confirmation order),
    /// followed by the unconfirmed groups. Output is not chronological.
    pub fn deduplicate(&self, events: Vec<TravelEvent>) -> Vec<TravelEvent> {
        if events.is_empty() {
            return Vec::new();
        }
        let input_len = events.len();

        // Phase 1: group by confirmation number
        let mut by_conf: Vec<Vec<TravelEvent>> = Vec::new();
        let mut conf_index: FxHashMap<String, usize> = FxHashMap::default();
        let mut no_conf: Vec<Option<TravelEvent>> = Vec::new();

        for event in events {
            let conf = event.confirmation_number.trim();
            if conf.is_empty() {
                no_conf.push(Some(event));
                continue;
            }
            let idx = *conf_index.entry(conf.to_string()).or_insert_with(|| {
                by_conf.push(Vec::new());
                by_conf.len() - 1
            });
            by_conf[idx].push(event);
        }

        let confirmed_groups = by_conf.len();
        let mut merged: Vec<TravelEvent> = by_conf.into_iter().filter_map(merge_group).collect();

        // Phase 2: greedy type + date window + destination/provider grouping
        let mut unconfirmed_groups = 0;
        for i in 0..no_conf.len() {
            let Some(seed) = no_conf[i].take() else {
                continue;
            };

            let mut group = vec![seed];
            for candidate in no_conf.iter_mut().skip(i + 1) {
                if candidate.as_ref().is_some_and(|c| self.matches_by_date(&group[0], c)) {
                    if let Some(event) = candidate.take() {
                        group.push(event);
                    }
                }
            }

            if group.len() > 1 {
                debug!(
                    event_type = %group[0].event_type,
                    size = %group.len(),
                    "dedup_window_group"
                );
            }
            unconfirmed_groups += 1;
            merged.extend(merge_group(group));
        }

        info!(
            input = %input_len,
            output = %merged.len(),
            confirmed_groups = %confirmed_groups,
            unconfirmed_groups = %unconfirmed_groups,
            "dedup_complete"
        );

        merged
    }

    /// Check if two unconfirmed events are likely the same booking
    pub fn matches_by_date(&self, a: &TravelEvent, b: &TravelEvent) -> bool {
        if a.event_type != b.event_type {
            return false;
        }

        let (Some(a_date), Some(b_date)) = (a.reference_date(), b.reference_date()) else {
            return false;
        };
        if (a_date - b_date).num_days().abs() > self.window_days {
            return false;
        }

        let a_dest = a.destination_city();
        let b_dest = b.destination_city();
        if !a_dest.is_empty() && !b_dest.is_empty() && a_dest.to_lowercase() == b_dest.to_lowercase() {
            return true;
        }

        !a.provider.is_empty()
            && !b.provider.is_empty()
            && a.provider.to_lowercase() == b.provider.to_lowercase()
    }
}

/// Fold a group into its richest member; `None` only for an empty group
fn merge_group(mut group: Vec<TravelEvent>) -> Option<TravelEvent> {
    // Stable: equal richness keeps input order
    group.sort_by_key(|e| Reverse(e.richness_score()));
    let mut members = group.into_iter();
    let primary = members.next()?;
    Some(members.fold(primary, |primary, secondary| merge_pair(primary, &secondary)))
}

/// Fill the primary's empty fields from the secondary.
///
/// A field already set on the primary is never replaced.
pub fn merge_pair(mut primary: TravelEvent, secondary: &TravelEvent) -> TravelEvent {
    if primary.start_date.is_none() {
        primary.start_date = secondary.start_date;
    }
    if primary.end_date.is_none() {
        primary.end_date = secondary.end_date;
    }

    merge_location(&mut primary.origin, secondary.origin.as_ref());
    merge_location(&mut primary.destination, secondary.destination.as_ref());

    fill_string(&mut primary.confirmation_number, &secondary.confirmation_number);
    fill_string(&mut primary.provider, &secondary.provider);
    fill_string(&mut primary.property_name, &secondary.property_name);
    fill_string(&mut primary.activity_name, &secondary.activity_name);
    fill_string(&mut primary.traveler_name, &secondary.traveler_name);

    if primary.legs.is_empty() && !secondary.legs.is_empty() {
        primary.legs = secondary.legs.clone();
    }

    primary
}

/// Absent locations are copied wholesale; cityless ones only gain a city
fn merge_location(target: &mut Option<Location>, source: Option<&Location>) {
    let Some(other) = source else {
        return;
    };
    match target {
        Some(own) => own.fill_from(other),
        None => *target = Some(other.clone()),
    }
}

#[inline]
fn fill_string(target: &mut String, source: &str) {
    if target.is_empty() && !source.is_empty() {
        *target = source.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{EventType, FlightLeg};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn dedup(events: Vec<TravelEvent>) -> Vec<TravelEvent> {
        Deduplicator::new(&Config::default()).deduplicate(events)
    }

    #[test]
    fn test_empty_input() {
        assert!(dedup(Vec::new()).is_empty());
    }

    #[test]
    fn test_confirmation_group_prefers_richest() {
        let sparse = TravelEvent::new(EventType::Hotel)
            .with_confirmation("H-1")
            .with_property("Casa Sparse");
        let rich = TravelEvent::new(EventType::Hotel)
            .with_confirmation("H-1")
            .with_dates(date(2024, 3, 1), date(2024, 3, 4))
            .with_destination("Barcelona")
            .with_property("Hotel Arts");

        let out = dedup(vec![sparse, rich]);

        assert_eq!(out.len(), 1);
        // Both set a property name; the richer record's value wins
        assert_eq!(out[0].property_name, "Hotel Arts");
        assert_eq!(out[0].start_date, date(2024, 3, 1));
        assert_eq!(out[0].destination_city(), "Barcelona");
    }

    #[test]
    fn test_confirmation_is_trimmed() {
        let a = TravelEvent::new(EventType::Flight).with_confirmation(" XY12 ");
        let b = TravelEvent::new(EventType::Flight).with_confirmation("XY12").with_provider("Vueling");

        let out = dedup(vec![a, b]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].provider, "Vueling");
    }

    #[test]
    fn test_merge_never_overwrites() {
        let primary = TravelEvent::new(EventType::Flight)
            .with_dates(date(2024, 3, 1), None)
            .with_provider("Iberia");
        let secondary = TravelEvent::new(EventType::Flight)
            .with_dates(date(2024, 3, 9), date(2024, 3, 10))
            .with_provider("Vueling")
            .with_destination("Paris");

        let merged = merge_pair(primary, &secondary);

        assert_eq!(merged.start_date, date(2024, 3, 1));
        assert_eq!(merged.end_date, date(2024, 3, 10));
        assert_eq!(merged.provider, "Iberia");
        assert_eq!(merged.destination_city(), "Paris");
    }

    #[test]
    fn test_merge_fills_cityless_location() {
        let mut primary = TravelEvent::new(EventType::Flight);
        primary.destination = Some(Location { iata: "ORY".to_string(), ..Location::default() });
        let secondary = TravelEvent::new(EventType::Flight).with_destination("Paris");

        let merged = merge_pair(primary, &secondary);

        let dest = merged.destination.unwrap();
        assert_eq!(dest.city, "Paris");
        assert_eq!(dest.iata, "ORY");
    }

    #[test]
    fn test_merge_copies_legs_only_when_missing() {
        let primary = TravelEvent::new(EventType::Flight)
            .with_leg(FlightLeg::new("New York", "Madrid", date(2024, 3, 1)));
        let secondary = TravelEvent::new(EventType::Flight)
            .with_leg(FlightLeg::new("Boston", "Lisbon", date(2024, 3, 1)))
            .with_leg(FlightLeg::new("Lisbon", "Porto", date(2024, 3, 2)));

        let merged = merge_pair(primary, &secondary);
        assert_eq!(merged.legs.len(), 1);
        assert_eq!(merged.legs[0].origin.city, "New York");

        let empty = TravelEvent::new(EventType::Flight);
        let merged = merge_pair(empty, &secondary);
        assert_eq!(merged.legs.len(), 2);
    }

    #[test]
    fn test_unconfirmed_same_provider_within_window() {
        let a = TravelEvent::new(EventType::Flight)
            .with_dates(date(2024, 3, 1), None)
            .with_destination("Paris")
            .with_provider("Air France");
        let b = TravelEvent::new(EventType::Flight)
            .with_dates(date(2024, 3, 2), None)
            .with_provider("air france")
            .with_origin("Barcelona");

        let out = dedup(vec![a, b]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].destination_city(), "Paris");
        assert_eq!(out[0].origin_city(), "Barcelona");
    }

    #[test]
    fn test_unconfirmed_outside_window_not_merged() {
        let a = TravelEvent::new(EventType::Flight)
            .with_dates(date(2024, 3, 1), None)
            .with_destination("Paris");
        let b = TravelEvent::new(EventType::Flight)
            .with_dates(date(2024, 3, 4), None)
            .with_destination("Paris");

        assert_eq!(dedup(vec![a, b]).len(), 2);
    }

    #[test]
    fn test_unconfirmed_different_type_not_merged() {
        let a = TravelEvent::new(EventType::Flight)
            .with_dates(date(2024, 3, 1), None)
            .with_destination("Paris");
        let b = TravelEvent::new(EventType::Rail)
            .with_dates(date(2024, 3, 1), None)
            .with_destination("Paris");

        assert_eq!(dedup(vec![a, b]).len(), 2);
    }

    #[test]
    fn test_unconfirmed_without_dates_never_merged() {
        let a = TravelEvent::new(EventType::Hotel).with_destination("Rome");
        let b = TravelEvent::new(EventType::Hotel).with_destination("Rome");

        assert_eq!(dedup(vec![a, b]).len(), 2);
    }

    #[test]
    fn test_greedy_grouping_is_not_transitive() {
        // c matches b by provider, but candidates are only compared with the seed
        let a = TravelEvent::new(EventType::Flight)
            .with_dates(date(2024, 3, 1), None)
            .with_destination("Paris");
        let b = TravelEvent::new(EventType::Flight)
            .with_dates(date(2024, 3, 3), None)
            .with_destination("Paris")
            .with_provider("Vueling");
        let c = TravelEvent::new(EventType::Flight)
            .with_dates(date(2024, 3, 4), None)
            .with_provider("Vueling");

        let out = dedup(vec![a, b, c]);

        // a absorbs b; c does not match a and stays alone
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].start_date, date(2024, 3, 4));
    }

    #[test]
    fn test_confirmed_events_come_first() {
        let unconfirmed = TravelEvent::new(EventType::Tour)
            .with_dates(date(2024, 1, 1), None)
            .with_activity("Walking tour");
        let confirmed = TravelEvent::new(EventType::Hotel)
            .with_dates(date(2024, 6, 1), None)
            .with_confirmation("Z9");

        let out = dedup(vec![unconfirmed, confirmed]);

        assert_eq!(out[0].confirmation_number, "Z9");
        assert_eq!(out[1].activity_name, "Walking tour");
    }

    #[test]
    fn test_window_is_configurable() {
        let a = TravelEvent::new(EventType::Flight)
            .with_dates(date(2024, 3, 1), None)
            .with_destination("Paris");
        let b = TravelEvent::new(EventType::Flight)
            .with_dates(date(2024, 3, 6), None)
            .with_destination("Paris");

        let wide = Deduplicator::with_window_days(5);
        assert!(wide.matches_by_date(&a, &b));
        assert!(!Deduplicator::with_window_days(4).matches_by_date(&a, &b));
    }
}
