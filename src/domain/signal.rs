//! Location signals derived from travel events

use crate::domain::event::EventRef;
use chrono::NaiveDate;

/// Direction of a location claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalType {
    Enter,
    Exit,
    Present,
}

impl SignalType {
    /// Same-day tie-break rank: departures first, arrivals last
    #[inline]
    pub fn priority(&self) -> u8 {
        match self {
            SignalType::Exit => 0,
            SignalType::Present => 1,
            SignalType::Enter => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Enter => "enter",
            SignalType::Exit => "exit",
            SignalType::Present => "present",
        }
    }
}

/// A single dated claim about presence in a city
#[derive(Debug, Clone)]
pub struct CitySignal {
    pub signal_type: SignalType,
    pub city: String,
    pub dt: NaiveDate,
    /// Evidentiary weight, 1.0 for transport, 0.5 for car rentals
    pub strength: f64,
    pub source_event: EventRef,
    /// How the claim was derived, e.g. "flight_arrival"
    pub method: String,
}

impl CitySignal {
    pub fn new(
        signal_type: SignalType,
        city: &str,
        dt: NaiveDate,
        strength: f64,
        source_event: &EventRef,
        method: &str,
    ) -> Self {
        Self {
            signal_type,
            city: city.to_string(),
            dt,
            strength,
            source_event: source_event.clone(),
            method: method.to_string(),
        }
    }

    /// Sort key: date, then type priority
    #[inline]
    pub fn sort_key(&self) -> (NaiveDate, u8) {
        (self.dt, self.signal_type.priority())
    }
}
