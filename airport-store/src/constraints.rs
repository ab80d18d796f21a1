//! Names of the storage constraints and the errors they turn into.
//!
//! Both stores report violations through these helpers so callers see the
//! same messages whichever backend is running.

use airport_core::booking::{missing_object, SEAT_TAKEN};
use airport_core::validation::NON_FIELD_ERRORS;
use airport_core::{CoreError, ValidationErrors};

pub const UQ_AIRPLANES_NAME: &str = "uq_airplanes_name";
pub const UQ_AIRPLANES_CODE: &str = "uq_airplanes_code";
pub const UQ_AIRPORTS_CODE: &str = "uq_airports_code";
pub const UQ_USERS_EMAIL: &str = "uq_users_email";
pub const UQ_TICKETS_FLIGHT_ROW_SEAT: &str = "uq_tickets_flight_row_seat";

pub const FK_AIRPLANES_AIRPLANE_TYPE: &str = "fk_airplanes_airplane_type";
pub const FK_ROUTES_SOURCE: &str = "fk_routes_source";
pub const FK_ROUTES_DESTINATION: &str = "fk_routes_destination";
pub const FK_FLIGHTS_ROUTE: &str = "fk_flights_route";
pub const FK_FLIGHTS_AIRPLANE: &str = "fk_flights_airplane";
pub const FK_FLIGHT_CREW_CREW: &str = "fk_flight_crew_crew";
pub const FK_ORDERS_USER: &str = "fk_orders_user";
pub const FK_TICKETS_FLIGHT: &str = "fk_tickets_flight";

pub const CK_ROUTES_DISTINCT_AIRPORTS: &str = "ck_routes_distinct_airports";
pub const CK_FLIGHTS_SCHEDULE: &str = "ck_flights_schedule";

/// Field and message for a unique constraint.
fn unique_field(constraint: &str) -> (&'static str, &'static str) {
    match constraint {
        UQ_AIRPLANES_NAME => ("name", "airplane with this name already exists."),
        UQ_AIRPLANES_CODE => ("code", "airplane with this code already exists."),
        UQ_AIRPORTS_CODE => ("code", "airport with this code already exists."),
        UQ_USERS_EMAIL => ("email", "user with this email already exists."),
        UQ_TICKETS_FLIGHT_ROW_SEAT => (NON_FIELD_ERRORS, SEAT_TAKEN),
        _ => (NON_FIELD_ERRORS, "A record with these values already exists."),
    }
}

/// Field holding the reference for a foreign key, and the collection that
/// holds the referencing rows.
fn reference(constraint: &str) -> (&'static str, &'static str) {
    match constraint {
        FK_AIRPLANES_AIRPLANE_TYPE => ("airplane_type", "airplanes"),
        FK_ROUTES_SOURCE => ("source", "routes"),
        FK_ROUTES_DESTINATION => ("destination", "routes"),
        FK_FLIGHTS_ROUTE => ("route", "flights"),
        FK_FLIGHTS_AIRPLANE => ("airplane", "flights"),
        FK_FLIGHT_CREW_CREW => ("crew", "flights"),
        FK_ORDERS_USER => ("user", "orders"),
        FK_TICKETS_FLIGHT => ("flight", "tickets"),
        _ => (NON_FIELD_ERRORS, "other records"),
    }
}

pub fn unique_violation(constraint: &str) -> CoreError {
    let (field, message) = unique_field(constraint);
    CoreError::Validation(ValidationErrors::single(field, message))
}

pub fn check_violation(constraint: &str) -> CoreError {
    let (field, message) = match constraint {
        CK_ROUTES_DISTINCT_AIRPORTS => ("destination", "Source and destination airports must be different"),
        CK_FLIGHTS_SCHEDULE => ("arrival_time", "Arrival time cannot be before departure time"),
        _ => (NON_FIELD_ERRORS, "Invalid value."),
    };
    CoreError::Validation(ValidationErrors::single(field, message))
}

/// A write pointed at `pk`, which names no row.
pub fn missing_reference(constraint: &str, pk: impl std::fmt::Display) -> CoreError {
    let (field, _) = reference(constraint);
    CoreError::Validation(ValidationErrors::single(field, missing_object(pk)))
}

/// The key value out of a PostgreSQL foreign key detail:
/// `Key (route_id)=(<pk>) is not present in table "routes".`
pub fn referenced_key(detail: &str) -> Option<&str> {
    let start = detail.find(")=(")? + 3;
    let len = detail[start..].find(')')?;
    Some(&detail[start..start + len])
}

/// A delete was blocked by rows that still point at the target.
pub fn still_referenced(entity: &str, constraint: &str) -> CoreError {
    let (_, holders) = reference(constraint);
    CoreError::Conflict(format!("Cannot delete this {}: it is still referenced by {}.", entity, holders))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_conflict_is_a_non_field_error() {
        match unique_violation(UQ_TICKETS_FLIGHT_ROW_SEAT) {
            CoreError::Validation(errors) => assert_eq!(errors.messages(NON_FIELD_ERRORS), [SEAT_TAKEN]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unique_name_is_keyed_by_field() {
        match unique_violation(UQ_AIRPLANES_NAME) {
            CoreError::Validation(errors) => {
                assert_eq!(errors.messages("name"), ["airplane with this name already exists."])
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_reference_names_the_key() {
        let pk = "3f1c0a52-9d7e-4b8a-a1f0-5c2e7d9b6a41";
        match missing_reference(FK_FLIGHTS_ROUTE, pk) {
            CoreError::Validation(errors) => assert_eq!(
                errors.messages("route"),
                [format!("Invalid pk \"{}\" - object does not exist.", pk)]
            ),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_referenced_key_from_detail() {
        let detail = "Key (route_id)=(3f1c0a52-9d7e-4b8a-a1f0-5c2e7d9b6a41) is not present in table \"routes\".";
        assert_eq!(referenced_key(detail), Some("3f1c0a52-9d7e-4b8a-a1f0-5c2e7d9b6a41"));
        assert_eq!(referenced_key("no detail"), None);
    }

    #[test]
    fn test_still_referenced_is_a_conflict() {
        let err = still_referenced("airplane", FK_FLIGHTS_AIRPLANE);
        assert!(matches!(err, CoreError::Conflict(ref m) if m.contains("flights")));
    }
}
