use airport_core::airplane::{AirplaneInput, AirplaneTypeInput};
use airport_core::airport::AirportInput;
use airport_core::booking::SEAT_TAKEN;
use airport_core::crew::{CrewInput, CrewTitle};
use airport_core::filter::{FlightFilter, OrderScope, PageRequest};
use airport_core::flight::{Flight, FlightInput, Seat};
use airport_core::order::TicketInput;
use airport_core::repository::*;
use airport_core::route::RouteInput;
use airport_core::user::{NewUser, User};
use airport_core::validation::NON_FIELD_ERRORS;
use airport_core::CoreError;
use airport_store::MemoryStore;
use chrono::{Duration, Utc};
use uuid::Uuid;

fn airport(code: &str, name: &str, lat: f64, lon: f64) -> AirportInput {
    AirportInput {
        code: code.to_string(),
        name: name.to_string(),
        city: name.to_string(),
        state: None,
        country: Some("Denmark".to_string()),
        lat,
        lon,
    }
}

async fn user(store: &MemoryStore, email: &str) -> User {
    store
        .create_user(&NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            is_staff: false,
        })
        .await
        .unwrap()
}

/// One 5x4 airplane flying one route tomorrow.
async fn seed_flight(store: &MemoryStore) -> Flight {
    let airplane_type = store
        .create_airplane_type(&AirplaneTypeInput { name: "Boeing".to_string() })
        .await
        .unwrap();
    let airplane = store
        .create_airplane(&AirplaneInput {
            name: "Test Airplane".to_string(),
            code: "TA1".to_string(),
            rows: 5,
            seats_in_row: 4,
            airplane_type: airplane_type.id,
        })
        .await
        .unwrap();
    let source = store.create_airport(&airport("AAA", "Anaa", -17.3595, -145.494)).await.unwrap();
    let destination = store.create_airport(&airport("AAL", "Aalborg", 57.0952, 9.85606)).await.unwrap();
    let route = store
        .create_route(&RouteInput { source: source.id, destination: destination.id })
        .await
        .unwrap();
    let now = Utc::now();
    store
        .create_flight(&FlightInput {
            route: route.id,
            airplane: airplane.id,
            crew: vec![],
            departure_time: now + Duration::days(1),
            arrival_time: now + Duration::days(1) + Duration::hours(20),
        })
        .await
        .unwrap()
}

fn ticket(flight: Uuid, row: i32, seat: i32) -> TicketInput {
    TicketInput { flight, row, seat }
}

#[tokio::test]
async fn test_available_seats_follow_ticket_sales() {
    let store = MemoryStore::new();
    let flight = seed_flight(&store).await;
    assert_eq!(flight.available_seats(), 20);

    let owner = user(&store, "test@example.com").await;
    store
        .create_order(owner.id, &[ticket(flight.id, 1, 1), ticket(flight.id, 1, 2)])
        .await
        .unwrap();

    let reloaded = store.get_flight(flight.id).await.unwrap().unwrap();
    assert_eq!(reloaded.tickets_sold, 2);
    assert_eq!(reloaded.available_seats(), 18);
    assert_eq!(
        store.taken_seats(flight.id).await.unwrap(),
        vec![Seat { row: 1, seat: 1 }, Seat { row: 1, seat: 2 }]
    );
}

#[tokio::test]
async fn test_same_seat_cannot_be_booked_twice() {
    let store = MemoryStore::new();
    let flight = seed_flight(&store).await;
    let first = user(&store, "first@example.com").await;
    let second = user(&store, "second@example.com").await;

    let order = store.create_order(first.id, &[ticket(flight.id, 3, 3)]).await.unwrap();

    match store.create_order(second.id, &[ticket(flight.id, 3, 3)]).await {
        Err(CoreError::Validation(errors)) => assert_eq!(errors.messages(NON_FIELD_ERRORS), [SEAT_TAKEN]),
        other => panic!("expected a validation error, got {:?}", other),
    }

    let kept = store.get_order(OrderScope::All, order.id).await.unwrap().unwrap();
    assert_eq!(kept.tickets.len(), 1);
    assert_eq!(store.list_orders(OrderScope::All, PageRequest::default()).await.unwrap().count, 1);
}

#[tokio::test]
async fn test_deleting_order_frees_its_seats() {
    let store = MemoryStore::new();
    let flight = seed_flight(&store).await;
    let owner = user(&store, "test@example.com").await;

    let order = store.create_order(owner.id, &[ticket(flight.id, 2, 2)]).await.unwrap();
    store.delete_order(OrderScope::Owner(owner.id), order.id).await.unwrap();

    assert!(store.taken_seats(flight.id).await.unwrap().is_empty());
    assert!(store.create_order(owner.id, &[ticket(flight.id, 2, 2)]).await.is_ok());
}

#[tokio::test]
async fn test_orders_are_scoped_to_their_owner() {
    let store = MemoryStore::new();
    let flight = seed_flight(&store).await;
    let alice = user(&store, "alice@example.com").await;
    let bob = user(&store, "bob@example.com").await;

    let order = store.create_order(alice.id, &[ticket(flight.id, 1, 1)]).await.unwrap();

    let bobs = store.list_orders(OrderScope::Owner(bob.id), PageRequest::default()).await.unwrap();
    assert_eq!(bobs.count, 0);
    assert!(store.get_order(OrderScope::Owner(bob.id), order.id).await.unwrap().is_none());
    assert!(matches!(
        store.delete_order(OrderScope::Owner(bob.id), order.id).await,
        Err(CoreError::NotFound { .. })
    ));

    let alices = store.list_orders(OrderScope::Owner(alice.id), PageRequest::default()).await.unwrap();
    assert_eq!(alices.results[0].owner.email, "alice@example.com");
}

#[tokio::test]
async fn test_replacing_tickets_can_keep_a_seat() {
    let store = MemoryStore::new();
    let flight = seed_flight(&store).await;
    let owner = user(&store, "test@example.com").await;
    let order = store.create_order(owner.id, &[ticket(flight.id, 1, 1)]).await.unwrap();

    let updated = store
        .replace_tickets(OrderScope::All, order.id, &[ticket(flight.id, 1, 1), ticket(flight.id, 1, 2)])
        .await
        .unwrap();
    assert_eq!(updated.tickets.len(), 2);
}

#[tokio::test]
async fn test_referenced_rows_cannot_be_deleted() {
    let store = MemoryStore::new();
    let flight = seed_flight(&store).await;

    assert!(matches!(
        store.delete_airplane(flight.airplane.id).await,
        Err(CoreError::Conflict(_))
    ));
    assert!(matches!(
        store.delete_airport(flight.route.source.id).await,
        Err(CoreError::Conflict(_))
    ));

    let owner = user(&store, "test@example.com").await;
    store.create_order(owner.id, &[ticket(flight.id, 1, 1)]).await.unwrap();
    assert!(matches!(store.delete_flight(flight.id).await, Err(CoreError::Conflict(_))));
}

#[tokio::test]
async fn test_unique_airplane_name_and_airport_code() {
    let store = MemoryStore::new();
    let flight = seed_flight(&store).await;

    let duplicate = AirplaneInput {
        name: "Test Airplane".to_string(),
        code: "OTHER".to_string(),
        rows: 1,
        seats_in_row: 1,
        airplane_type: flight.airplane.airplane_type.id,
    };
    match store.create_airplane(&duplicate).await {
        Err(CoreError::Validation(errors)) => {
            assert_eq!(errors.messages("name"), ["airplane with this name already exists."])
        }
        other => panic!("expected a validation error, got {:?}", other),
    }

    match store.create_airport(&airport("AAA", "Elsewhere", 0.0, 0.0)).await {
        Err(CoreError::Validation(errors)) => assert!(errors.has("code")),
        other => panic!("expected a validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_flight_filters() {
    let store = MemoryStore::new();
    let flight = seed_flight(&store).await;
    let captain = store
        .create_crew(&CrewInput {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            title: CrewTitle::Captain,
        })
        .await
        .unwrap();
    let mut input = FlightInput::from(&flight);
    input.crew = vec![captain.id];
    store.update_flight(flight.id, &input).await.unwrap();

    let by_crew = FlightFilter { crew: vec![captain.id], ..Default::default() };
    assert_eq!(store.list_flights(&by_crew, PageRequest::default()).await.unwrap().count, 1);

    let by_route = FlightFilter { routes: vec![Uuid::new_v4()], ..Default::default() };
    assert_eq!(store.list_flights(&by_route, PageRequest::default()).await.unwrap().count, 0);

    let by_date = FlightFilter {
        departure_date: Some(flight.departure_time.date_naive()),
        ..Default::default()
    };
    assert_eq!(store.list_flights(&by_date, PageRequest::default()).await.unwrap().count, 1);

    assert!(matches!(store.delete_crew(captain.id).await, Err(CoreError::Conflict(_))));
}

#[tokio::test]
async fn test_dangling_reference_names_the_key() {
    let store = MemoryStore::new();
    let flight = seed_flight(&store).await;
    let ghost = Uuid::new_v4();

    let mut input = FlightInput::from(&flight);
    input.route = ghost;
    match store.create_flight(&input).await {
        Err(CoreError::Validation(errors)) => assert_eq!(
            errors.messages("route"),
            [format!("Invalid pk \"{}\" - object does not exist.", ghost)]
        ),
        other => panic!("expected a validation error, got {:?}", other),
    }
}
