//! Consistency rules for placing tickets on an order.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use uuid::Uuid;
use crate::airplane::SeatLayout;
use crate::order::{validate_ticket, TicketInput};
use crate::validation::{ValidationErrors, NON_FIELD_ERRORS};

/// Reported when a (flight, row, seat) triple is booked twice.
pub const SEAT_TAKEN: &str = "The fields flight, row, seat must make a unique set.";
pub const EMPTY_ORDER: &str = "An order must contain at least one ticket.";

pub fn missing_object(id: impl Display) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

/// Flights referenced by a ticket batch, in first-seen order.
pub fn referenced_flights(tickets: &[TicketInput]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    tickets
        .iter()
        .map(|t| t.flight)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Validates a batch of tickets against the cabins of the flights they name.
///
/// `layouts` holds the seat layout of every flight that exists; a ticket for
/// any other flight is rejected on `flight`. Seats repeated within the batch
/// are rejected before storage sees them.
pub fn validate_tickets(
    tickets: &[TicketInput],
    layouts: &HashMap<Uuid, SeatLayout>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if tickets.is_empty() {
        errors.add("tickets", EMPTY_ORDER);
    }

    let mut requested = HashSet::new();
    for ticket in tickets {
        match layouts.get(&ticket.flight) {
            Some(layout) => {
                if let Err(seat_errors) = validate_ticket(ticket.row, ticket.seat, *layout) {
                    errors.merge(seat_errors);
                }
            }
            None => errors.add("flight", missing_object(ticket.flight)),
        }
        if !requested.insert((ticket.flight, ticket.row, ticket.seat)) {
            errors.add(NON_FIELD_ERRORS, SEAT_TAKEN);
        }
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layouts(flight: Uuid) -> HashMap<Uuid, SeatLayout> {
        HashMap::from([(flight, SeatLayout { rows: 5, seats_in_row: 4 })])
    }

    #[test]
    fn test_valid_batch() {
        let flight = Uuid::new_v4();
        let tickets = [
            TicketInput { flight, row: 1, seat: 1 },
            TicketInput { flight, row: 1, seat: 2 },
        ];
        assert!(validate_tickets(&tickets, &layouts(flight)).is_ok());
    }

    #[test]
    fn test_row_out_of_range() {
        let flight = Uuid::new_v4();
        let tickets = [TicketInput { flight, row: 0, seat: 1 }];
        let errors = validate_tickets(&tickets, &layouts(flight)).unwrap_err();
        assert_eq!(errors.messages("row"), ["row number must be in available range: (1, rows): (1, 5)"]);
    }

    #[test]
    fn test_empty_order() {
        let errors = validate_tickets(&[], &HashMap::new()).unwrap_err();
        assert_eq!(errors.messages("tickets"), [EMPTY_ORDER]);
    }

    #[test]
    fn test_unknown_flight() {
        let flight = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let tickets = [TicketInput { flight: stranger, row: 1, seat: 1 }];
        let errors = validate_tickets(&tickets, &layouts(flight)).unwrap_err();
        assert_eq!(errors.messages("flight"), [missing_object(stranger)]);
    }

    #[test]
    fn test_seat_requested_twice() {
        let flight = Uuid::new_v4();
        let tickets = [
            TicketInput { flight, row: 2, seat: 3 },
            TicketInput { flight, row: 2, seat: 3 },
        ];
        let errors = validate_tickets(&tickets, &layouts(flight)).unwrap_err();
        assert_eq!(errors.messages(NON_FIELD_ERRORS), [SEAT_TAKEN]);
    }

    #[test]
    fn test_referenced_flights_are_distinct() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let tickets = [
            TicketInput { flight: a, row: 1, seat: 1 },
            TicketInput { flight: b, row: 1, seat: 1 },
            TicketInput { flight: a, row: 1, seat: 2 },
        ];
        assert_eq!(referenced_flights(&tickets), vec![a, b]);
    }
}
