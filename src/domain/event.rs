//! Canonical travel events as delivered by the extraction layer

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::rc::Rc;

/// Shared handle to a deduplicated event.
///
/// Signals and visits point back at the event they came from; identity
/// (`Rc::ptr_eq`) is what "already attached" checks compare.
pub type EventRef = Rc<TravelEvent>;

/// Booking category of a travel event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    Flight,
    Hotel,
    Rail,
    BusFerry,
    CarRental,
    Tour,
    /// Any value the extractor produced that we don't recognize
    Unknown(String),
}

impl std::str::FromStr for EventType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "flight" => EventType::Flight,
            "hotel" => EventType::Hotel,
            "rail" => EventType::Rail,
            "bus_ferry" => EventType::BusFerry,
            "car_rental" => EventType::CarRental,
            "tour" => EventType::Tour,
            _ => EventType::Unknown(s.to_string()),
        })
    }
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Flight => "flight",
            EventType::Hotel => "hotel",
            EventType::Rail => "rail",
            EventType::BusFerry => "bus_ferry",
            EventType::CarRental => "car_rental",
            EventType::Tour => "tour",
            EventType::Unknown(s) => s,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        // FromStr is infallible; unrecognized values land in Unknown
        Ok(raw.parse().unwrap_or(EventType::Unknown(raw)))
    }
}

/// A place as resolved by the normalization layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    /// Canonical city name, empty if unresolved
    pub city: String,
    /// Original string before normalization
    pub raw: String,
    pub iata: String,
    pub country: String,
}

impl Location {
    pub fn new(city: &str) -> Self {
        Self { city: city.to_string(), ..Self::default() }
    }

    #[inline]
    pub fn has_city(&self) -> bool {
        !self.city.is_empty()
    }

    /// Take the city (and any missing audit fields) from `other`.
    ///
    /// Only applies when this location is cityless and `other` has a city;
    /// components already set are never replaced.
    pub fn fill_from(&mut self, other: &Location) {
        if self.has_city() || !other.has_city() {
            return;
        }
        self.city = other.city.clone();
        if self.raw.is_empty() {
            self.raw = other.raw.clone();
        }
        if self.iata.is_empty() {
            self.iata = other.iata.clone();
        }
        if self.country.is_empty() {
            self.country = other.country.clone();
        }
    }
}

/// One segment of a multi-leg flight booking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightLeg {
    pub origin: Location,
    pub destination: Location,
    pub departure_date: Option<NaiveDate>,
    pub arrival_date: Option<NaiveDate>,
    pub flight_number: String,
    pub carrier: String,
}

impl FlightLeg {
    pub fn new(origin: &str, destination: &str, departure_date: Option<NaiveDate>) -> Self {
        Self {
            origin: Location::new(origin),
            destination: Location::new(destination),
            departure_date,
            ..Self::default()
        }
    }
}

/// A single booking observation extracted from one email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelEvent {
    pub event_type: EventType,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub origin: Option<Location>,
    #[serde(default)]
    pub destination: Option<Location>,
    #[serde(default)]
    pub confirmation_number: String,
    #[serde(default)]
    pub provider: String,
    /// Hotel or rental property name
    #[serde(default)]
    pub property_name: String,
    /// Tour or event name
    #[serde(default)]
    pub activity_name: String,
    /// Passenger/guest name on the booking
    #[serde(default)]
    pub traveler_name: String,
    #[serde(default)]
    pub legs: Vec<FlightLeg>,
    #[serde(default)]
    pub source_email_id: String,
    #[serde(default)]
    pub source_subject: String,
    #[serde(default)]
    pub extraction_confidence: f64,
}

impl TravelEvent {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            start_date: None,
            end_date: None,
            origin: None,
            destination: None,
            confirmation_number: String::new(),
            provider: String::new(),
            property_name: String::new(),
            activity_name: String::new(),
            traveler_name: String::new(),
            legs: Vec::new(),
            source_email_id: String::new(),
            source_subject: String::new(),
            extraction_confidence: 0.0,
        }
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_origin(mut self, city: &str) -> Self {
        self.origin = Some(Location::new(city));
        self
    }

    pub fn with_destination(mut self, city: &str) -> Self {
        self.destination = Some(Location::new(city));
        self
    }

    pub fn with_confirmation(mut self, confirmation: &str) -> Self {
        self.confirmation_number = confirmation.to_string();
        self
    }

    pub fn with_provider(mut self, provider: &str) -> Self {
        self.provider = provider.to_string();
        self
    }

    pub fn with_property(mut self, property_name: &str) -> Self {
        self.property_name = property_name.to_string();
        self
    }

    pub fn with_activity(mut self, activity_name: &str) -> Self {
        self.activity_name = activity_name.to_string();
        self
    }

    pub fn with_traveler(mut self, traveler_name: &str) -> Self {
        self.traveler_name = traveler_name.to_string();
        self
    }

    pub fn with_subject(mut self, subject: &str) -> Self {
        self.source_subject = subject.to_string();
        self
    }

    pub fn with_leg(mut self, leg: FlightLeg) -> Self {
        self.legs.push(leg);
        self
    }

    /// Origin city, empty when unknown
    pub fn origin_city(&self) -> &str {
        self.origin.as_ref().map_or("", |l| l.city.as_str())
    }

    /// Destination city, empty when unknown
    pub fn destination_city(&self) -> &str {
        self.destination.as_ref().map_or("", |l| l.city.as_str())
    }

    /// Date used when comparing unconfirmed bookings: start, else end
    pub fn reference_date(&self) -> Option<NaiveDate> {
        self.start_date.or(self.end_date)
    }

    /// Count of populated informative fields.
    ///
    /// Dates weigh double; every flight leg counts once.
    pub fn richness_score(&self) -> u32 {
        let mut score = 0;
        if self.start_date.is_some() {
            score += 2;
        }
        if self.end_date.is_some() {
            score += 2;
        }
        score += u32::from(!self.origin_city().is_empty());
        score += u32::from(!self.destination_city().is_empty());
        score += u32::from(!self.confirmation_number.is_empty());
        score += u32::from(!self.provider.is_empty());
        score += u32::from(!self.property_name.is_empty());
        score += u32::from(!self.activity_name.is_empty());
        score + self.legs.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_event_type_from_str() {
        assert_eq!("flight".parse::<EventType>().unwrap(), EventType::Flight);
        assert_eq!("BUS_FERRY".parse::<EventType>().unwrap(), EventType::BusFerry);
        assert!(matches!("cruise".parse::<EventType>().unwrap(), EventType::Unknown(_)));
    }

    #[test]
    fn test_event_deserializes_with_defaults() {
        let json = r#"{"event_type": "hotel", "start_date": "2024-03-01",
                       "destination": {"city": "Barcelona"}}"#;
        let event: TravelEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.event_type, EventType::Hotel);
        assert_eq!(event.start_date, date(2024, 3, 1));
        assert!(event.end_date.is_none());
        assert_eq!(event.destination_city(), "Barcelona");
        assert_eq!(event.destination.as_ref().unwrap().iata, "");
        assert!(event.legs.is_empty());
    }

    #[test]
    fn test_unknown_event_type_round_trips_raw_value() {
        let event: TravelEvent = serde_json::from_str(r#"{"event_type": "Cruise"}"#).unwrap();
        assert_eq!(event.event_type, EventType::Unknown("Cruise".to_string()));

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event_type"], "Cruise");
        assert!(value["start_date"].is_null());
    }

    #[test]
    fn test_richness_score() {
        let bare = TravelEvent::new(EventType::Flight);
        assert_eq!(bare.richness_score(), 0);

        let rich = TravelEvent::new(EventType::Flight)
            .with_dates(date(2024, 3, 1), date(2024, 3, 2))
            .with_origin("New York")
            .with_destination("Barcelona")
            .with_confirmation("ABC123")
            .with_provider("Iberia")
            .with_leg(FlightLeg::new("New York", "Madrid", date(2024, 3, 1)))
            .with_leg(FlightLeg::new("Madrid", "Barcelona", date(2024, 3, 2)));
        // 2 + 2 + 1 + 1 + 1 + 1 + 2 legs
        assert_eq!(rich.richness_score(), 10);
    }

    #[test]
    fn test_cityless_location_does_not_count() {
        let mut event = TravelEvent::new(EventType::Hotel);
        event.destination = Some(Location { raw: "BCN downtown".to_string(), ..Location::default() });
        assert_eq!(event.richness_score(), 0);
    }

    #[test]
    fn test_location_fill_from_only_when_cityless() {
        let mut cityless = Location { iata: "XXX".to_string(), ..Location::default() };
        let source = Location {
            city: "Paris".to_string(),
            raw: "paris cdg".to_string(),
            iata: "CDG".to_string(),
            country: "France".to_string(),
        };
        cityless.fill_from(&source);
        assert_eq!(cityless.city, "Paris");
        assert_eq!(cityless.iata, "XXX");
        assert_eq!(cityless.country, "France");

        let mut known = Location::new("Lyon");
        known.fill_from(&source);
        assert_eq!(known, Location::new("Lyon"));
    }

    #[test]
    fn test_reference_date_prefers_start() {
        let event = TravelEvent::new(EventType::Rail).with_dates(date(2024, 1, 2), date(2024, 1, 3));
        assert_eq!(event.reference_date(), date(2024, 1, 2));

        let end_only = TravelEvent::new(EventType::Rail).with_dates(None, date(2024, 1, 3));
        assert_eq!(end_only.reference_date(), date(2024, 1, 3));
    }
}
