use std::sync::Arc;
use airport_core::repository::Store;
use airport_core::weather::WeatherProvider;
use airport_store::app_config::PaginationConfig;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    /// Lifetimes in seconds.
    pub access_expiration: u64,
    pub refresh_expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub weather: Arc<dyn WeatherProvider>,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
}
