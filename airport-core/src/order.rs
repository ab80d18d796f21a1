use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use crate::airplane::SeatLayout;
use crate::validation::ValidationErrors;

/// The user an order belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Owner {
    pub id: Uuid,
    pub email: String,
}

/// Flight details carried on a ticket for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlightSummary {
    pub id: Uuid,
    pub route: String,
    pub airplane: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ticket {
    pub id: Uuid,
    pub row: i32,
    pub seat: i32,
    pub flight: FlightSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: Uuid,
    pub owner: Owner,
    pub created_at: DateTime<Utc>,
    pub tickets: Vec<Ticket>,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order #{} by {} ({})", self.id, self.owner.email, self.created_at)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TicketInput {
    pub flight: Uuid,
    pub row: i32,
    pub seat: i32,
}

/// Checks a requested seat against the airplane's cabin. Both coordinates are
/// reported when both are out of range.
pub fn validate_ticket(row: i32, seat: i32, layout: SeatLayout) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if !(1..=layout.rows).contains(&row) {
        errors.add(
            "row",
            format!("row number must be in available range: (1, rows): (1, {})", layout.rows),
        );
    }
    if !(1..=layout.seats_in_row).contains(&seat) {
        errors.add(
            "seat",
            format!(
                "seat number must be in available range: (1, seats_in_row): (1, {})",
                layout.seats_in_row
            ),
        );
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_BY_FOUR: SeatLayout = SeatLayout { rows: 5, seats_in_row: 4 };

    #[test]
    fn test_validate_ticket_valid() {
        assert!(validate_ticket(1, 1, FIVE_BY_FOUR).is_ok());
        assert!(validate_ticket(5, 4, FIVE_BY_FOUR).is_ok());
    }

    #[test]
    fn test_validate_ticket_invalid_row() {
        let errors = validate_ticket(0, 1, FIVE_BY_FOUR).unwrap_err();
        assert_eq!(errors.messages("row"), ["row number must be in available range: (1, rows): (1, 5)"]);
        assert!(!errors.has("seat"));
    }

    #[test]
    fn test_validate_ticket_invalid_seat() {
        let errors = validate_ticket(1, 0, FIVE_BY_FOUR).unwrap_err();
        assert_eq!(
            errors.messages("seat"),
            ["seat number must be in available range: (1, seats_in_row): (1, 4)"]
        );
        assert!(!errors.has("row"));
    }

    #[test]
    fn test_validate_ticket_both_out_of_range() {
        let errors = validate_ticket(6, 5, FIVE_BY_FOUR).unwrap_err();
        assert!(errors.has("row"));
        assert!(errors.has("seat"));
    }
}
