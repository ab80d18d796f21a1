use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::airport::Airport;

/// Current conditions shown on an airport's detail view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Weather {
    pub condition: String,
    pub temp_c: f64,
    pub wind_kph: f64,
    pub humidity: i32,
    pub last_updated: String,
}

/// A source of current weather. Providers swallow nothing: the caller decides
/// how a failure is rendered.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, airport: &Airport) -> Result<Option<Weather>, anyhow::Error>;
}

/// Used when no weather service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWeather;

#[async_trait]
impl WeatherProvider for NoWeather {
    async fn current(&self, _airport: &Airport) -> Result<Option<Weather>, anyhow::Error> {
        Ok(None)
    }
}
