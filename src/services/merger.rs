//! Visit merging - collapses back-to-back visits to the same city
//!
//! Hotel presence and check-in signals often split one stay into several
//! fragments; the merger folds each run of adjacent same-city visits into a
//! single visit and re-scores it.

use crate::domain::visit::{CityVisit, METHOD_INFERRED, NOTE_STARTED_FROM_PRESENT};
use crate::infra::config::Config;
use tracing::debug;

/// Whether `next` continues `current` as one stay.
///
/// Cities must match; when either boundary is unknown the visits are
/// assumed adjacent.
fn should_merge(current: &CityVisit, next: &CityVisit, adjacency_days: i64) -> bool {
    if !current.is_in(&next.city) {
        return false;
    }
    match (current.effective_end(), next.effective_start()) {
        (Some(end), Some(start)) => (start - end).num_days() <= adjacency_days,
        _ => true,
    }
}

#[inline]
fn is_inferred(method: &str) -> bool {
    method.contains("inferred")
}

/// Fold `next` into `current`; `next`'s notes are dropped
/// Fold `next` into `current`. A strictly earlier enter or later exit
/// replaces date and method together; on equal or absent dates an explicit
/// method still beats an inferred one.
fn absorb(current: &mut CityVisit, next: CityVisit) {
    if let Some(enter) = next.enter_date {
        if current.enter_date.map_or(true, |d| enter < d) {
            current.enter_date = Some(enter);
            current.enter_method = next.enter_method.clone();
        }
    }
    if let Some(exit) = next.exit_date {
        if current.exit_date.map_or(true, |d| exit > d) {
            current.exit_date = Some(exit);
            current.exit_method = next.exit_method.clone();
        }
    }

    if is_inferred(&current.enter_method) && !is_inferred(&next.enter_method) {
        current.enter_method = next.enter_method;
    }
    if is_inferred(&current.exit_method) && !is_inferred(&next.exit_method) {
        current.exit_method = next.exit_method;
    }

    for event in &next.supporting_events {
        current.attach_event(event);
    }
    current.accommodations.extend(next.accommodations);
    current.activities.extend(next.activities);

    // A departure followed by a re-arrival leaves the boundaries crossed;
    // span the known dates instead, neither of which is a true boundary
    if let (Some(enter), Some(exit)) = (current.enter_date, current.exit_date) {
        if enter > exit {
            current.enter_date = Some(exit);
            current.exit_date = Some(enter);
            current.enter_method = METHOD_INFERRED.to_string();
            current.exit_method = METHOD_INFERRED.to_string();
        }
    }
}

fn finalize(mut visit: CityVisit) -> CityVisit {
    visit.dedup_accommodations();
    visit.confidence = visit.score_confidence();
    visit.notes.retain(|n| !n.contains(NOTE_STARTED_FROM_PRESENT));
    visit
}

/// Merge consecutive same-city visits that are at most the configured
/// adjacency apart. Input order is preserved.
pub fn merge_consecutive(visits: Vec<CityVisit>, config: &Config) -> Vec<CityVisit> {
    let adjacency_days = config.merge_adjacency_days();
    let mut merged = Vec::with_capacity(visits.len());
    let mut iter = visits.into_iter();

    let Some(mut current) = iter.next() else {
        return merged;
    };

    for next in iter {
        if should_merge(&current, &next, adjacency_days) {
            debug!(
                city = %current.city,
                enter = ?next.enter_date,
                exit = ?next.exit_date,
                "visit_merged"
            );
            absorb(&mut current, next);
        } else {
            merged.push(finalize(current));
            current = next;
        }
    }
    merged.push(finalize(current));

    merged
}
