use std::net::SocketAddr;
use std::sync::Arc;
use airport_api::{app, state::{AppState, AuthConfig}, weather::WeatherApiClient};
use airport_core::repository::Store;
use airport_core::weather::{NoWeather, WeatherProvider};
use airport_store::{app_config::Config, MemoryStore, PgStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airport_api=debug,airport_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Airport API on port {}", config.server.port);

    // Storage: PostgreSQL when configured, otherwise in-memory
    let store: Arc<dyn Store> = match config.database.url.as_deref() {
        Some(url) => {
            let pg = PgStore::new(url, config.database.max_connections)
                .await
                .expect("Failed to connect to Postgres");
            pg.migrate().await.expect("Failed to run migrations");
            tracing::info!("Using PostgreSQL store");
            Arc::new(pg)
        }
        None => {
            tracing::warn!("No database url configured; data lives in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let weather: Arc<dyn WeatherProvider> = match WeatherApiClient::from_config(&config.weather)
        .expect("Failed to build weather client")
    {
        Some(client) => Arc::new(client),
        None => {
            tracing::info!("Weather lookups disabled (no api key)");
            Arc::new(NoWeather)
        }
    };

    let app_state = AppState {
        store,
        weather,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            access_expiration: config.auth.access_token_seconds,
            refresh_expiration: config.auth.refresh_token_seconds,
        },
        pagination: config.pagination.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server error");
}
