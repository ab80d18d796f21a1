//! Current conditions from a WeatherAPI-compatible service.

use std::time::Duration;
use airport_core::airport::Airport;
use airport_core::weather::{Weather, WeatherProvider};
use airport_store::app_config::WeatherConfig;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: Current,
}

#[derive(Debug, Deserialize)]
struct Current {
    last_updated: String,
    temp_c: f64,
    wind_kph: f64,
    humidity: i32,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: String,
}

impl From<Current> for Weather {
    fn from(current: Current) -> Self {
        Weather {
            condition: current.condition.text,
            temp_c: current.temp_c,
            wind_kph: current.wind_kph,
            humidity: current.humidity,
            last_updated: current.last_updated,
        }
    }
}

pub struct WeatherApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WeatherApiClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build weather HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &WeatherConfig) -> anyhow::Result<Option<Self>> {
        match config.api_key.as_deref().filter(|key| !key.is_empty()) {
            Some(key) => Ok(Some(Self::new(
                &config.base_url,
                key,
                Duration::from_secs(config.timeout_seconds),
            )?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiClient {
    async fn current(&self, airport: &Airport) -> Result<Option<Weather>, anyhow::Error> {
        let url = format!("{}/current.json", self.base_url);
        let location = format!("{},{}", airport.lat, airport.lon);

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", location.as_str())])
            .send()
            .await
            .context("weather request failed")?
            .error_for_status()
            .context("weather service returned an error")?;

        let body: CurrentResponse = response.json().await.context("unexpected weather payload")?;
        Ok(Some(body.current.into()))
    }
}
