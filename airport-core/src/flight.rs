use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use crate::airplane::Airplane;
use crate::crew::Crew;
use crate::route::Route;
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flight {
    pub id: Uuid,
    pub route: Route,
    pub airplane: Airplane,
    pub crew: Vec<Crew>,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    /// Tickets issued for this flight, aggregated when the flight was loaded.
    pub tickets_sold: i64,
}

impl Flight {
    pub fn available_seats(&self) -> i64 {
        self.airplane.total_seats() - self.tickets_sold
    }
}

impl fmt::Display for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            self.route.name_label(),
            self.airplane.code,
            self.departure_time
        )
    }
}

/// An occupied (row, seat) pair on a flight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Seat {
    pub row: i32,
    pub seat: i32,
}

/// Checks departure/arrival ordering. The "not in the past" rules only apply
/// when `now` is given.
pub fn validate_schedule(
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    now: Option<DateTime<Utc>>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if let Some(now) = now {
        if departure_time < now {
            errors.add("departure_time", "Departure time cannot be in the past");
        }
    }
    if arrival_time < departure_time {
        errors.add("arrival_time", "Arrival time cannot be before departure time");
    }
    if let Some(now) = now {
        if arrival_time < now {
            errors.add("arrival_time", "Arrival time cannot be in the past");
        }
    }

    errors.into_result()
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlightInput {
    pub route: Uuid,
    pub airplane: Uuid,
    #[serde(default)]
    pub crew: Vec<Uuid>,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
}

impl FlightInput {
    /// Validation for a new flight: the schedule must lie in the future.
    pub fn validate_new(mut self, now: DateTime<Utc>) -> Result<Self, ValidationErrors> {
        validate_schedule(self.departure_time, self.arrival_time, Some(now))?;
        self.dedup_crew();
        Ok(self)
    }

    /// Validation for a changed flight. Times that were not moved are not
    /// re-checked against the clock, so a departed flight stays editable.
    pub fn validate_change(mut self, existing: &Flight, now: DateTime<Utc>) -> Result<Self, ValidationErrors> {
        let moved = self.departure_time != existing.departure_time
            || self.arrival_time != existing.arrival_time;
        validate_schedule(self.departure_time, self.arrival_time, moved.then_some(now))?;
        self.dedup_crew();
        Ok(self)
    }

    fn dedup_crew(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.crew.retain(|id| seen.insert(*id));
    }
}

impl From<&Flight> for FlightInput {
    fn from(flight: &Flight) -> Self {
        Self {
            route: flight.route.id,
            airplane: flight.airplane.id,
            crew: flight.crew.iter().map(|c| c.id).collect(),
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlightPatch {
    pub route: Option<Uuid>,
    pub airplane: Option<Uuid>,
    pub crew: Option<Vec<Uuid>>,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
}

impl FlightPatch {
    pub fn apply_to(self, base: &Flight) -> FlightInput {
        let base = FlightInput::from(base);
        FlightInput {
            route: self.route.unwrap_or(base.route),
            airplane: self.airplane.unwrap_or(base.airplane),
            crew: self.crew.unwrap_or(base.crew),
            departure_time: self.departure_time.unwrap_or(base.departure_time),
            arrival_time: self.arrival_time.unwrap_or(base.arrival_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_future_schedule_is_valid() {
        let now = Utc::now();
        assert!(validate_schedule(now + Duration::hours(1), now + Duration::hours(3), Some(now)).is_ok());
    }

    #[test]
    fn test_departure_time_in_past() {
        let now = Utc::now();
        let errors = validate_schedule(now - Duration::days(1), now + Duration::hours(2), Some(now)).unwrap_err();
        assert_eq!(errors.messages("departure_time"), ["Departure time cannot be in the past"]);
        assert!(!errors.has("arrival_time"));
    }

    #[test]
    fn test_arrival_time_before_departure_time() {
        let now = Utc::now();
        let departure = now + Duration::hours(5);
        let errors = validate_schedule(departure, departure - Duration::hours(1), Some(now)).unwrap_err();
        assert_eq!(errors.messages("arrival_time"), ["Arrival time cannot be before departure time"]);
    }

    #[test]
    fn test_arrival_time_in_past() {
        let now = Utc::now();
        let errors = validate_schedule(now - Duration::days(2), now - Duration::days(1), Some(now)).unwrap_err();
        assert!(errors.has("departure_time"));
        assert_eq!(errors.messages("arrival_time"), ["Arrival time cannot be in the past"]);
    }

    #[test]
    fn test_ordering_checked_without_clock() {
        let now = Utc::now();
        assert!(validate_schedule(now - Duration::days(2), now - Duration::days(1), None).is_ok());
        assert!(validate_schedule(now, now - Duration::hours(1), None).is_err());
    }

    #[test]
    fn test_new_flight_drops_duplicate_crew() {
        let now = Utc::now();
        let captain = Uuid::new_v4();
        let input = FlightInput {
            route: Uuid::new_v4(),
            airplane: Uuid::new_v4(),
            crew: vec![captain, captain],
            departure_time: now + Duration::hours(1),
            arrival_time: now + Duration::hours(2),
        };
        assert_eq!(input.validate_new(now).unwrap().crew, vec![captain]);
    }
}
