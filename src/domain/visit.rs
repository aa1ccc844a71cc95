//! City visit and gap model for the assembled timeline

use crate::domain::event::{EventRef, EventType, TravelEvent};
use chrono::NaiveDate;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::rc::Rc;

/// Boundary method when nothing better is known
pub const METHOD_INFERRED: &str = "inferred";
pub const METHOD_INFERRED_FROM_NEXT_ARRIVAL: &str = "inferred_from_next_arrival";
pub const METHOD_INFERRED_UNKNOWN: &str = "inferred_unknown";
pub const METHOD_INFERRED_FROM_PRESENCE: &str = "inferred_from_presence_elsewhere";

/// Note left on visits opened by a PRESENT signal; dropped once merged
pub const NOTE_STARTED_FROM_PRESENT: &str = "Started from PRESENT signal only";
pub const NOTE_DEPARTURE_ONLY: &str = "Departure only — no arrival evidence";
pub const NOTE_NO_EXIT: &str = "No exit evidence — visit may still be ongoing or exit unknown";

/// Render an optional date, "?" when unknown
pub fn date_str(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "?".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

#[inline]
fn is_explicit(method: &str) -> bool {
    !method.is_empty() && !method.contains(METHOD_INFERRED)
}

/// Lodging attached to a visit
#[derive(Debug, Clone, PartialEq)]
pub struct Accommodation {
    pub name: String,
    pub provider: String,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub confirmation: String,
}

impl Accommodation {
    /// Build from a hotel booking with a property or provider name
    pub fn from_event(event: &TravelEvent) -> Option<Self> {
        if event.event_type != EventType::Hotel {
            return None;
        }
        let name = if !event.property_name.is_empty() {
            &event.property_name
        } else if !event.provider.is_empty() {
            &event.provider
        } else {
            return None;
        };
        Some(Self {
            name: name.clone(),
            provider: event.provider.clone(),
            check_in: event.start_date,
            check_out: event.end_date,
            confirmation: event.confirmation_number.clone(),
        })
    }

    /// Identity used to drop repeats: confirmation, else name and dates
    pub fn dedup_key(&self) -> String {
        if !self.confirmation.is_empty() {
            return self.confirmation.clone();
        }
        format!("{}|{}|{}", self.name, date_str(self.check_in), date_str(self.check_out))
    }

    fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "provider": self.provider,
            "check_in": date_str(self.check_in),
            "check_out": date_str(self.check_out),
            "confirmation": self.confirmation,
        })
    }
}

/// Tour or ticketed activity attached to a visit
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub name: String,
    pub provider: String,
    pub dt: Option<NaiveDate>,
    pub confirmation: String,
}

impl Activity {
    pub fn from_event(event: &TravelEvent) -> Option<Self> {
        if event.event_type != EventType::Tour || event.activity_name.is_empty() {
            return None;
        }
        Some(Self {
            name: event.activity_name.clone(),
            provider: event.provider.clone(),
            dt: event.start_date,
            confirmation: event.confirmation_number.clone(),
        })
    }

    fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "provider": self.provider,
            "date": date_str(self.dt),
            "confirmation": self.confirmation,
        })
    }
}

/// A continuous, possibly open-ended stay in one city
#[derive(Debug, Clone)]
pub struct CityVisit {
    pub city: String,
    pub enter_date: Option<NaiveDate>,
    pub exit_date: Option<NaiveDate>,
    pub enter_method: String,
    pub exit_method: String,
    pub accommodations: Vec<Accommodation>,
    pub activities: Vec<Activity>,
    pub confidence: f64,
    /// Source events in attach order, unique by identity
    pub supporting_events: SmallVec<[EventRef; 4]>,
    pub notes: Vec<String>,
}

impl CityVisit {
    /// Create a visit with no dates and inferred boundaries
    pub fn new(city: &str) -> Self {
        Self {
            city: city.to_string(),
            enter_date: None,
            exit_date: None,
            enter_method: METHOD_INFERRED.to_string(),
            exit_method: METHOD_INFERRED.to_string(),
            accommodations: Vec::new(),
            activities: Vec::new(),
            confidence: 0.0,
            supporting_events: SmallVec::new(),
            notes: Vec::new(),
        }
    }

    /// Open a visit at an arrival
    pub fn entered(city: &str, date: NaiveDate, method: &str) -> Self {
        let mut visit = Self::new(city);
        visit.enter_date = Some(date);
        visit.enter_method = method.to_string();
        visit
    }

    /// Set the exit boundary
    pub fn close(&mut self, date: NaiveDate, method: &str) {
        self.exit_date = Some(date);
        self.exit_method = method.to_string();
    }

    pub fn add_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Attach a source event unless the same event is already attached
    pub fn attach_event(&mut self, event: &EventRef) -> bool {
        if self.supports(event) {
            return false;
        }
        self.supporting_events.push(event.clone());
        true
    }

    pub fn supports(&self, event: &EventRef) -> bool {
        self.supporting_events.iter().any(|e| Rc::ptr_eq(e, event))
    }

    /// Case-insensitive city comparison
    #[inline]
    pub fn is_in(&self, city: &str) -> bool {
        self.city.to_lowercase() == city.to_lowercase()
    }

    /// Last known day in the city: exit, else enter
    #[inline]
    pub fn effective_end(&self) -> Option<NaiveDate> {
        self.exit_date.or(self.enter_date)
    }

    /// First known day in the city: enter, else exit
    #[inline]
    pub fn effective_start(&self) -> Option<NaiveDate> {
        self.enter_date.or(self.exit_date)
    }

    pub fn has_explicit_enter(&self) -> bool {
        is_explicit(&self.enter_method)
    }

    pub fn has_explicit_exit(&self) -> bool {
        is_explicit(&self.exit_method)
    }

    /// Rebuild accommodations and activities from the supporting events
    pub fn collect_bookings(&mut self) {
        self.accommodations =
            self.supporting_events.iter().filter_map(|e| Accommodation::from_event(e)).collect();
        self.activities =
            self.supporting_events.iter().filter_map(|e| Activity::from_event(e)).collect();
    }

    /// Drop repeated accommodations, keeping first occurrence
    pub fn dedup_accommodations(&mut self) {
        let mut seen = FxHashSet::default();
        self.accommodations.retain(|a| seen.insert(a.dedup_key()));
    }

    /// Evidence-quality score in [0.4, 1.0].
    ///
    /// Base 1.0 with both boundaries explicit, 0.7 with one, 0.4 with none;
    /// +0.1 for a known accommodation and +0.1 for three or more sources.
    pub fn score_confidence(&self) -> f64 {
        let mut score: f64 = match (self.has_explicit_enter(), self.has_explicit_exit()) {
            (true, true) => 1.0,
            (true, false) | (false, true) => 0.7,
            (false, false) => 0.4,
        };
        if !self.accommodations.is_empty() {
            score = (score + 0.1).min(1.0);
        }
        if self.supporting_events.len() >= 3 {
            score = (score + 0.1).min(1.0);
        }
        (score * 100.0).round() / 100.0
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        let accommodations: Vec<serde_json::Value> =
            self.accommodations.iter().map(|a| a.to_json_value()).collect();
        let activities: Vec<serde_json::Value> =
            self.activities.iter().map(|a| a.to_json_value()).collect();
        let sources: Vec<&str> =
            self.supporting_events.iter().map(|e| e.source_email_id.as_str()).collect();

        serde_json::json!({
            "city": self.city,
            "enter_date": date_str(self.enter_date),
            "exit_date": date_str(self.exit_date),
            "enter_method": self.enter_method,
            "exit_method": self.exit_method,
            "accommodations": accommodations,
            "activities": activities,
            "confidence": self.confidence,
            "sources": sources,
            "notes": self.notes,
        })
    }
}

/// Unexplained stretch between two visits
#[derive(Debug, Clone, PartialEq)]
pub struct Gap {
    pub last_known_city: String,
    pub last_known_date: NaiveDate,
    pub next_known_city: String,
    pub next_known_date: NaiveDate,
    pub duration_days: i64,
    pub note: String,
}

impl Gap {
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "last_known_city": self.last_known_city,
            "last_known_date": date_str(Some(self.last_known_date)),
            "next_known_city": self.next_known_city,
            "next_known_date": date_str(Some(self.next_known_date)),
            "duration_days": self.duration_days,
            "note": self.note,
        })
    }
}
