//! Per-signal-type transitions for the visit assembler

use super::{VisitAssembler, VisitState};
use crate::domain::signal::CitySignal;
use crate::domain::visit::{
    CityVisit, METHOD_INFERRED_FROM_NEXT_ARRIVAL, METHOD_INFERRED_FROM_PRESENCE,
    METHOD_INFERRED_UNKNOWN, NOTE_DEPARTURE_ONLY, NOTE_STARTED_FROM_PRESENT,
};
use tracing::debug;

impl VisitAssembler {
    /// Arrival: close whatever is open (inferring its exit) and open a new visit
    pub(crate) fn handle_enter(&mut self, signal: CitySignal) {
        if let VisitState::Open(mut current) = std::mem::take(&mut self.state) {
            if current.exit_date.is_none() {
                current.close(signal.dt, METHOD_INFERRED_FROM_NEXT_ARRIVAL);
                current.add_note(format!("Exit inferred from arrival in {}", signal.city));
            }
            self.emit(current);
        }

        self.open_visit(&signal);
    }

    /// Departure: close the matching visit, or record a departure-only visit
    pub(crate) fn handle_exit(&mut self, signal: CitySignal) {
        match std::mem::take(&mut self.state) {
            VisitState::Open(mut current) if current.is_in(&signal.city) => {
                current.close(signal.dt, &signal.method);
                current.attach_event(&signal.source_event);
                self.emit(current);
            }
            VisitState::Open(mut current) => {
                // Left somewhere else; where they went is unknown, so nothing opens
                if current.exit_date.is_none() {
                    current.close(signal.dt, METHOD_INFERRED_UNKNOWN);
                    current.add_note(format!("Closed: EXIT signal from {}", signal.city));
                }
                debug!(
                    open_city = %current.city,
                    exit_city = %signal.city,
                    "exit_from_other_city"
                );
                self.emit(current);
            }
            VisitState::NoOpenVisit => {
                let mut departure = CityVisit::new(&signal.city);
                departure.close(signal.dt, &signal.method);
                departure.attach_event(&signal.source_event);
                departure.add_note(NOTE_DEPARTURE_ONLY);
                self.emit(departure);
            }
        }
    }

    /// Presence: corroborate, override when strong, or open tentatively
    pub(crate) fn handle_present(&mut self, signal: CitySignal) {
        match std::mem::take(&mut self.state) {
            VisitState::Open(mut current) if current.is_in(&signal.city) => {
                current.attach_event(&signal.source_event);
                self.state = VisitState::Open(current);
            }
            VisitState::Open(mut current) if signal.strength >= self.override_strength => {
                if current.exit_date.is_none() {
                    current.close(signal.dt, METHOD_INFERRED_FROM_PRESENCE);
                    current.add_note(format!("Exit inferred from presence in {}", signal.city));
                }
                self.emit(current);
                self.open_visit(&signal);
            }
            VisitState::Open(current) => {
                // Weak evidence (car rentals) never overrides an established visit
                debug!(
                    open_city = %current.city,
                    signal_city = %signal.city,
                    strength = %signal.strength,
                    "weak_presence_ignored"
                );
                self.state = VisitState::Open(current);
            }
            VisitState::NoOpenVisit => {
                self.open_visit(&signal);
                if let VisitState::Open(visit) = &mut self.state {
                    visit.add_note(NOTE_STARTED_FROM_PRESENT);
                }
            }
        }
    }

    fn open_visit(&mut self, signal: &CitySignal) {
        let mut visit = CityVisit::entered(&signal.city, signal.dt, &signal.method);
        visit.attach_event(&signal.source_event);
        debug!(city = %visit.city, enter = %signal.dt, method = %signal.method, "visit_opened");
        self.state = VisitState::Open(visit);
    }
}
