#![allow(dead_code)]

use std::sync::Arc;

use airport_api::middleware::auth::{issue_token, TokenType};
use airport_api::password::hash_password;
use airport_api::state::{AppState, AuthConfig};
use airport_core::airplane::{AirplaneInput, AirplaneTypeInput};
use airport_core::airport::AirportInput;
use airport_core::flight::{Flight, FlightInput};
use airport_core::repository::*;
use airport_core::route::RouteInput;
use airport_core::user::{NewUser, User};
use airport_core::weather::NoWeather;
use airport_store::app_config::PaginationConfig;
use airport_store::MemoryStore;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse-42";

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub auth: AuthConfig,
}

/// The full router over an empty in-memory store.
pub fn build_test_app() -> TestApp {
    let store = MemoryStore::new();
    let auth = AuthConfig {
        secret: "test-secret".to_string(),
        access_expiration: 300,
        refresh_expiration: 3600,
    };
    let state = AppState {
        store: Arc::new(store.clone()),
        weather: Arc::new(NoWeather),
        auth: auth.clone(),
        pagination: PaginationConfig { default_page_size: 20, max_page_size: 100 },
    };

    TestApp { router: airport_api::app(state), store, auth }
}

impl TestApp {
    pub async fn user(&self, email: &str, is_staff: bool) -> User {
        self.store
            .create_user(&NewUser {
                email: email.to_string(),
                password_hash: hash_password(PASSWORD).unwrap(),
                is_staff,
            })
            .await
            .unwrap()
    }

    /// An access token for a freshly created account.
    pub async fn token(&self, email: &str, is_staff: bool) -> String {
        let user = self.user(email, is_staff).await;
        issue_token(&self.auth, &user, TokenType::Access).unwrap()
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// A 5x4 airplane flying Anaa -> Aalborg tomorrow.
    pub async fn seed_flight(&self) -> Flight {
        let airplane_type = self
            .store
            .create_airplane_type(&AirplaneTypeInput { name: "Boeing".to_string() })
            .await
            .unwrap();
        let airplane = self
            .store
            .create_airplane(&AirplaneInput {
                name: "Test Airplane".to_string(),
                code: "TA1".to_string(),
                rows: 5,
                seats_in_row: 4,
                airplane_type: airplane_type.id,
            })
            .await
            .unwrap();
        let source = self.store.create_airport(&anaa()).await.unwrap();
        let destination = self.store.create_airport(&aalborg()).await.unwrap();
        let route = self
            .store
            .create_route(&RouteInput { source: source.id, destination: destination.id })
            .await
            .unwrap();

        let departure = Utc::now() + Duration::days(1);
        self.store
            .create_flight(&FlightInput {
                route: route.id,
                airplane: airplane.id,
                crew: vec![],
                departure_time: departure,
                arrival_time: departure + Duration::hours(20),
            })
            .await
            .unwrap()
    }
}

pub fn anaa() -> AirportInput {
    AirportInput {
        code: "AAA".to_string(),
        name: "Anaa Airport".to_string(),
        city: "Anaa".to_string(),
        state: None,
        country: Some("French Polynesia".to_string()),
        lat: -17.3595,
        lon: -145.494,
    }
}

pub fn aalborg() -> AirportInput {
    AirportInput {
        code: "AAL".to_string(),
        name: "Aalborg Airport".to_string(),
        city: "Aalborg".to_string(),
        state: None,
        country: Some("Denmark".to_string()),
        lat: 57.0952,
        lon: 9.85606,
    }
}
