//! Location signal generation and ordering
//!
//! Each booking type yields its own mix of ENTER/EXIT/PRESENT claims. The
//! strength weights express how much a booking proves about where the
//! traveler was, not a probability.

use crate::domain::event::{EventRef, EventType, TravelEvent};
use crate::domain::signal::{CitySignal, SignalType};
use chrono::NaiveDate;
use smallvec::SmallVec;
use tracing::debug;

/// Signal weights per evidence source
const STRENGTH_TRANSPORT: f64 = 1.0;
const STRENGTH_HOTEL_BOUNDARY: f64 = 0.8;
const STRENGTH_HOTEL_STAY: f64 = 0.9;
const STRENGTH_TOUR: f64 = 0.7;
const STRENGTH_CAR_RENTAL: f64 = 0.5;

type Signals = SmallVec<[CitySignal; 4]>;

/// Convert events into a flat, unordered list of signals
pub fn events_to_signals(events: &[EventRef]) -> Vec<CitySignal> {
    let mut signals = Vec::with_capacity(events.len() * 2);
    let mut skipped = 0usize;

    for event in events {
        let derived = signals_for_event(event);
        if derived.is_empty() {
            skipped += 1;
            debug!(
                event_type = %event.event_type,
                source = %event.source_email_id,
                "event_without_signals"
            );
        }
        signals.extend(derived);
    }

    debug!(events = %events.len(), signals = %signals.len(), skipped = %skipped, "signals_generated");
    signals
}

/// Signals for a single event; empty for unknown types or missing data
pub fn signals_for_event(event: &EventRef) -> Signals {
    match event.event_type {
        EventType::Flight => flight_signals(event),
        EventType::Hotel => hotel_signals(event),
        EventType::Rail | EventType::BusFerry => ground_transport_signals(event),
        EventType::CarRental => car_rental_signals(event),
        EventType::Tour => tour_signals(event),
        EventType::Unknown(_) => Signals::new(),
    }
}

/// Order signals by date, departures before presence before arrivals.
///
/// The sort is stable so same-key signals keep generation order.
pub fn sort_signals(signals: &mut [CitySignal]) {
    signals.sort_by_key(CitySignal::sort_key);
}

fn push_if(
    signals: &mut Signals,
    signal_type: SignalType,
    city: &str,
    dt: Option<NaiveDate>,
    strength: f64,
    event: &EventRef,
    method: &str,
) {
    if city.is_empty() {
        return;
    }
    if let Some(dt) = dt {
        signals.push(CitySignal::new(signal_type, city, dt, strength, event, method));
    }
}

fn flight_signals(event: &EventRef) -> Signals {
    let mut signals = Signals::new();

    if event.legs.is_empty() {
        push_if(
            &mut signals,
            SignalType::Exit,
            event.origin_city(),
            event.start_date,
            STRENGTH_TRANSPORT,
            event,
            "flight_departure",
        );
        push_if(
            &mut signals,
            SignalType::Enter,
            event.destination_city(),
            event.end_date.or(event.start_date),
            STRENGTH_TRANSPORT,
            event,
            "flight_arrival",
        );
        return signals;
    }

    for leg in &event.legs {
        let departure = leg.departure_date.or(event.start_date);
        let arrival = leg.arrival_date.or(departure);
        push_if(
            &mut signals,
            SignalType::Exit,
            &leg.origin.city,
            departure,
            STRENGTH_TRANSPORT,
            event,
            "flight_departure",
        );
        push_if(
            &mut signals,
            SignalType::Enter,
            &leg.destination.city,
            arrival,
            STRENGTH_TRANSPORT,
            event,
            "flight_arrival",
        );
    }

    signals
}

fn hotel_signals(event: &EventRef) -> Signals {
    let mut signals = Signals::new();
    let city = event.destination_city();
    if city.is_empty() {
        return signals;
    }

    push_if(&mut signals, SignalType::Enter, city, event.start_date, STRENGTH_HOTEL_BOUNDARY, event, "hotel_checkin");
    push_if(&mut signals, SignalType::Exit, city, event.end_date, STRENGTH_HOTEL_BOUNDARY, event, "hotel_checkout");

    for night in stay_nights(event) {
        signals.push(CitySignal::new(
            SignalType::Present,
            city,
            night,
            STRENGTH_HOTEL_STAY,
            event,
            "hotel_stay",
        ));
    }

    signals
}

/// Nights of a stay: check-in up to (not including) check-out, or the
/// single known date when only one is set
fn stay_nights(event: &TravelEvent) -> Vec<NaiveDate> {
    match (event.start_date, event.end_date) {
        (Some(check_in), Some(check_out)) => check_in
            .iter_days()
            .take_while(|d| *d < check_out)
            .collect(),
        (Some(only), None) | (None, Some(only)) => vec![only],
        (None, None) => Vec::new(),
    }
}

fn ground_transport_signals(event: &EventRef) -> Signals {
    let mut signals = Signals::new();
    let subtype = event.event_type.as_str();

    push_if(
        &mut signals,
        SignalType::Exit,
        event.origin_city(),
        event.start_date,
        STRENGTH_TRANSPORT,
        event,
        &format!("{subtype}_departure"),
    );
    push_if(
        &mut signals,
        SignalType::Enter,
        event.destination_city(),
        event.end_date.or(event.start_date),
        STRENGTH_TRANSPORT,
        event,
        &format!("{subtype}_arrival"),
    );

    signals
}

/// A rental never proves travel between cities, only presence
fn car_rental_signals(event: &EventRef) -> Signals {
    let mut signals = Signals::new();
    push_if(
        &mut signals,
        SignalType::Present,
        event.origin_city(),
        event.start_date,
        STRENGTH_CAR_RENTAL,
        event,
        "car_rental_pickup",
    );
    push_if(
        &mut signals,
        SignalType::Present,
        event.destination_city(),
        event.end_date,
        STRENGTH_CAR_RENTAL,
        event,
        "car_rental_return",
    );
    signals
}

fn tour_signals(event: &EventRef) -> Signals {
    let mut signals = Signals::new();
    push_if(
        &mut signals,
        SignalType::Present,
        event.destination_city(),
        event.start_date,
        STRENGTH_TOUR,
        event,
        "tour_activity",
    );
    signals
}
