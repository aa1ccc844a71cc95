//! Domain models - travel events, location signals and the assembled timeline
//!
//! This module contains the canonical data types used throughout the system:
//! - `TravelEvent` - one extracted booking (flight, hotel, rail, ...)
//! - `CitySignal` - a dated enter/exit/present claim derived from an event
//! - `CityVisit` - a stay in one city, possibly open-ended
//! - `Gap` - an unexplained stretch between two visits

pub mod event;
pub mod signal;
pub mod visit;

// Re-export commonly used types at module level
pub use event::{EventRef, EventType, FlightLeg, Location, TravelEvent};
pub use signal::{CitySignal, SignalType};
pub use visit::{Accommodation, Activity, CityVisit, Gap};
