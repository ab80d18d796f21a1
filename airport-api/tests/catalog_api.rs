//! Airports, routes and flights as staff manage them.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::build_test_app;
use serde_json::json;

#[tokio::test]
async fn airport_code_is_normalized_and_unique() {
    let app = build_test_app();
    let token = app.token("admin@example.com", true).await;
    let body = json!({
        "code": "aal",
        "name": "Aalborg Airport",
        "city": "Aalborg",
        "country": "denmark",
        "lat": 57.0952,
        "lon": 9.85606,
    });

    let (status, airport) = app.post("/api/v1/airport/airports", Some(&token), body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(airport["code"], "AAL");
    assert_eq!(airport["country"], "Denmark");

    let (status, errors) = app.post("/api/v1/airport/airports", Some(&token), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(errors["fields"]["code"].is_array());
}

#[tokio::test]
async fn airport_validation_messages() {
    let app = build_test_app();
    let token = app.token("admin@example.com", true).await;

    let (status, body) = app
        .post(
            "/api/v1/airport/airports",
            Some(&token),
            json!({
                "code": "A1",
                "name": "Nowhere",
                "city": "Nowhere",
                "country": "Atlantis",
                "lat": 91.0,
                "lon": 0.0,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = &body["fields"];
    assert_eq!(
        fields["code"],
        json!(["Airport code must contain only letters", "Airport code must be exactly 3 letters"])
    );
    assert_eq!(fields["country"][0], "'Atlantis' is not a valid country name");
    assert_eq!(fields["lat"][0], "Latitude must be between -90 and 90");
}

#[tokio::test]
async fn airport_detail_has_weather_slot() {
    let app = build_test_app();
    let flight = app.seed_flight().await;

    let uri = format!("/api/v1/airport/airports/{}", flight.route.source.id);
    let (status, body) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "AAA");
    assert!(body["weather"].is_null());
}

#[tokio::test]
async fn route_needs_two_distinct_airports() {
    let app = build_test_app();
    let flight = app.seed_flight().await;
    let token = app.token("admin@example.com", true).await;
    let source = flight.route.source.id;

    let (status, body) = app
        .post(
            "/api/v1/airport/routes",
            Some(&token),
            json!({"source": source, "destination": source}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["destination"][0], "Source and destination airports must be different");
}

#[tokio::test]
async fn route_list_filters_by_code() {
    let app = build_test_app();
    app.seed_flight().await;

    let (_, body) = app.get("/api/v1/airport/routes?source=aa", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["source"], "AAA");
    assert_eq!(body["results"][0]["distance"], 15142);

    let (_, body) = app.get("/api/v1/airport/routes?destination=CPH", None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn flight_schedule_is_checked() {
    let app = build_test_app();
    let flight = app.seed_flight().await;
    let token = app.token("admin@example.com", true).await;
    let past = Utc::now() - Duration::days(1);

    let (status, body) = app
        .post(
            "/api/v1/airport/flights",
            Some(&token),
            json!({
                "route": flight.route.id,
                "airplane": flight.airplane.id,
                "departure_time": past,
                "arrival_time": past - Duration::hours(1),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["departure_time"][0], "Departure time cannot be in the past");
    assert_eq!(
        body["fields"]["arrival_time"],
        json!(["Arrival time cannot be before departure time", "Arrival time cannot be in the past"])
    );
}

#[tokio::test]
async fn flight_with_crew_round_trips() {
    let app = build_test_app();
    let flight = app.seed_flight().await;
    let token = app.token("admin@example.com", true).await;

    let (_, crew) = app
        .post(
            "/api/v1/airport/crews",
            Some(&token),
            json!({"first_name": "Jane", "last_name": "Roe", "title": "Co-Pilot"}),
        )
        .await;
    let uri = format!("/api/v1/airport/flights/{}", flight.id);

    let (status, written) = app
        .send(Method::PATCH, &uri, Some(&token), Some(json!({"crew": [crew["id"]]})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(written["crew"], json!([crew["id"]]));

    let (_, detail) = app.get(&uri, None).await;
    assert_eq!(detail["crew"], json!(["Jane Roe"]));

    let filter = format!("/api/v1/airport/flights?crew={}", crew["id"].as_str().unwrap());
    let (_, list) = app.get(&filter, None).await;
    assert_eq!(list["count"], 1);
}

#[tokio::test]
async fn malformed_filters_are_field_errors() {
    let app = build_test_app();

    let (status, body) = app
        .get("/api/v1/airport/flights?departure_date=soon&route=abc&page=0", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["departure_date"][0], "Enter a valid date in the format YYYY-MM-DD.");
    assert!(body["fields"]["route"].is_array());
    assert_eq!(body["fields"]["page"][0], "Invalid page.");
}

#[tokio::test]
async fn page_past_the_end_is_empty() {
    let app = build_test_app();
    app.seed_flight().await;

    let (status, body) = app.get("/api/v1/airport/airports?page=5&page_size=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn referenced_airport_cannot_be_deleted() {
    let app = build_test_app();
    let flight = app.seed_flight().await;
    let token = app.token("admin@example.com", true).await;

    let uri = format!("/api/v1/airport/airports/{}", flight.route.source.id);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn page_beyond_any_offset_is_a_field_error() {
    let app = build_test_app();

    let (status, body) = app
        .get("/api/v1/airport/airports?page=18446744073709551615", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["page"][0], "Invalid page.");
}

#[tokio::test]
async fn airport_state_can_be_cleared() {
    let app = build_test_app();
    let token = app.token("admin@example.com", true).await;

    let (_, airport) = app
        .post(
            "/api/v1/airport/airports",
            Some(&token),
            json!({
                "code": "AAL",
                "name": "Aalborg Airport",
                "city": "Aalborg",
                "state": "North Denmark",
                "country": "Denmark",
                "lat": 57.0952,
                "lon": 9.85606,
            }),
        )
        .await;
    let uri = format!("/api/v1/airport/airports/{}", airport["id"].as_str().unwrap());

    let (_, renamed) = app
        .send(Method::PATCH, &uri, Some(&token), Some(json!({"name": "Aalborg"})))
        .await;
    assert_eq!(renamed["state"], "North Denmark");

    let (status, cleared) = app
        .send(Method::PATCH, &uri, Some(&token), Some(json!({"state": null})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["state"].is_null());
}
