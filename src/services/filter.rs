//! Input filters applied before deduplication
//!
//! Mailboxes are often shared, so bookings made for companions and
//! cancellation notices both need to be kept out of the timeline.

use crate::domain::event::TravelEvent;
use crate::infra::config::Config;
use tracing::debug;

/// Subject keywords marking a cancellation or refund notice
const CANCELLATION_KEYWORDS: [&str; 4] = ["cancelled", "canceled", "cancellation", "refund"];

/// Whether an email subject reads like a cancellation or refund
pub fn is_cancellation(subject: &str) -> bool {
    let subject = subject.to_lowercase();
    CANCELLATION_KEYWORDS.iter().any(|k| subject.contains(k))
}

/// Keeps events booked for the configured traveler
pub struct TravelerFilter {
    first_names: Vec<String>,
    last_name: String,
}

impl TravelerFilter {
    /// Build from config; `None` when no traveler name is configured
    pub fn from_config(config: &Config) -> Option<Self> {
        let name = config.traveler_name().to_lowercase();
        let mut parts = name.split_whitespace();
        let first = parts.next()?;
        let last = parts.next_back().unwrap_or(first);

        Some(Self {
            first_names: config.first_name_variants(first),
            last_name: last.to_string(),
        })
    }

    /// Events without a traveler name are kept; otherwise the last names
    /// must match and the first names must share a variant
    pub fn matches(&self, event: &TravelEvent, config: &Config) -> bool {
        let name = event.traveler_name.to_lowercase();
        let mut parts = name.split_whitespace();
        let Some(first) = parts.next() else {
            return true;
        };
        let last = parts.next_back().unwrap_or(first);

        if last != self.last_name {
            return false;
        }
        config
            .first_name_variants(first)
            .iter()
            .any(|variant| self.first_names.contains(variant))
    }
}

/// Counts of events removed by each filter
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterCounts {
    pub traveler: usize,
    pub cancelled: usize,
}

/// Apply the traveler and cancellation filters configured for this run
pub fn filter_events(events: Vec<TravelEvent>, config: &Config) -> (Vec<TravelEvent>, FilterCounts) {
    let traveler = TravelerFilter::from_config(config);
    let skip_cancellations = config.skip_cancellations();
    let mut counts = FilterCounts::default();

    let kept = events
        .into_iter()
        .filter(|event| {
            if let Some(filter) = &traveler {
                if !filter.matches(event, config) {
                    debug!(
                        traveler = %event.traveler_name,
                        source = %event.source_email_id,
                        "event_other_traveler"
                    );
                    counts.traveler += 1;
                    return false;
                }
            }
            if skip_cancellations && is_cancellation(&event.source_subject) {
                debug!(subject = %event.source_subject, "event_cancellation_skipped");
                counts.cancelled += 1;
                return false;
            }
            true
        })
        .collect();

    (kept, counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::EventType;

    fn booked_for(name: &str) -> TravelEvent {
        TravelEvent::new(EventType::Flight).with_traveler(name)
    }

    fn config_for(name: &str) -> Config {
        Config::default()
            .with_traveler_name(name)
            .with_first_name_variants(&["matthew", "matt", "mat"])
    }

    #[test]
    fn test_is_cancellation() {
        assert!(is_cancellation("Your booking has been CANCELLED"));
        assert!(is_cancellation("Reservation canceled: Hotel Arts"));
        assert!(is_cancellation("Cancellation confirmation"));
        assert!(is_cancellation("Your refund is on the way"));
        assert!(!is_cancellation("Your trip to Lisbon"));
        assert!(!is_cancellation(""));
    }

    #[test]
    fn test_no_configured_traveler_disables_filter() {
        assert!(TravelerFilter::from_config(&Config::default()).is_none());
    }

    #[test]
    fn test_traveler_variants_match() {
        let config = config_for("Matthew Smith");
        let filter = TravelerFilter::from_config(&config).unwrap();

        assert!(filter.matches(&booked_for("Matt Smith"), &config));
        assert!(filter.matches(&booked_for("MAT SMITH"), &config));
        assert!(filter.matches(&booked_for("Matthew James Smith"), &config));
        assert!(filter.matches(&booked_for(""), &config));
        assert!(filter.matches(&booked_for("   "), &config));
    }

    #[test]
    fn test_traveler_mismatch() {
        let config = config_for("Matthew Smith");
        let filter = TravelerFilter::from_config(&config).unwrap();

        assert!(!filter.matches(&booked_for("Anna Smith"), &config));
        assert!(!filter.matches(&booked_for("Matt Jones"), &config));
    }

    #[test]
    fn test_filter_events_counts() {
        let config = config_for("Matt Smith");
        let events = vec![
            booked_for("Matthew Smith").with_subject("Your flight to Rome"),
            booked_for("Anna Smith"),
            booked_for("Matt Smith").with_subject("Booking cancelled"),
            TravelEvent::new(EventType::Hotel),
        ];

        let (kept, counts) = filter_events(events, &config);

        assert_eq!(kept.len(), 2);
        assert_eq!(counts, FilterCounts { traveler: 1, cancelled: 1 });
    }

    #[test]
    fn test_cancellations_kept_when_disabled() {
        let config = Config::default().with_skip_cancellations(false);
        let events = vec![TravelEvent::new(EventType::Hotel).with_subject("Refund processed")];

        let (kept, counts) = filter_events(events, &config);
        assert_eq!(kept.len(), 1);
        assert_eq!(counts.cancelled, 0);
    }
}
