//! Gap detection - finds stretches with no location evidence

use crate::domain::visit::{CityVisit, Gap};
use crate::infra::config::Config;
use tracing::debug;

/// Order visits chronologically by enter date, else exit date; undated last.
///
/// Stable, so equal keys keep merger order.
pub fn sort_visits(visits: &mut [CityVisit]) {
    visits.sort_by_key(|v| (v.effective_start().is_none(), v.effective_start()));
}

/// Sort visits and report gaps longer than the configured threshold.
///
/// Visits are returned unchanged apart from ordering; gaps never add visits.
pub fn detect_gaps(mut visits: Vec<CityVisit>, config: &Config) -> (Vec<CityVisit>, Vec<Gap>) {
    sort_visits(&mut visits);

    let threshold = config.gap_threshold_days();
    let mut gaps = Vec::new();

    for pair in visits.windows(2) {
        let (last, next) = (&pair[0], &pair[1]);
        let (Some(last_date), Some(next_date)) = (last.effective_end(), next.effective_start())
        else {
            continue;
        };

        let duration_days = (next_date - last_date).num_days();
        if duration_days <= threshold {
            continue;
        }

        let note = if config.is_home_base_city(&last.city) {
            format!("Likely at home base ({})", config.home_base())
        } else {
            format!("No evidence for {duration_days} days")
        };
        debug!(
            from = %last.city,
            to = %next.city,
            days = %duration_days,
            "gap_detected"
        );

        gaps.push(Gap {
            last_known_city: last.city.clone(),
            last_known_date: last_date,
            next_known_city: next.city.clone(),
            next_known_date: next_date,
            duration_days,
            note,
        });
    }

    (visits, gaps)
}
