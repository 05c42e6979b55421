use anyhow::{anyhow, bail, Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::LOOKUP_TIMEOUT;

#[derive(Deserialize)]
struct WeatherLocation {
    name: String,
}

#[derive(Deserialize)]
struct WeatherCondition {
    text: String,
}

#[derive(Deserialize)]
struct WeatherCurrent {
    temp_c: f64,
    condition: WeatherCondition,
    humidity: f64,
    wind_kph: f64,
}

#[derive(Deserialize)]
struct WeatherResponse {
    location: WeatherLocation,
    current: WeatherCurrent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub city: String,
    pub temp_c: f64,
    pub description: String,
    pub humidity: f64,
    pub wind_kph: f64,
}

impl WeatherReport {
    pub fn from_json(body: &str) -> Result<Self> {
        let response: WeatherResponse =
            serde_json::from_str(body).context("Unexpected weather response format")?;
        Ok(Self {
            city: response.location.name,
            temp_c: response.current.temp_c,
            description: response.current.condition.text,
            humidity: response.current.humidity,
            wind_kph: response.current.wind_kph,
        })
    }
}

/// Current conditions from WeatherAPI.
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn current_request(&self, city: &str) -> RequestBuilder {
        let url = format!("{}/v1/current.json", self.base_url);
        self.client
            .get(&url)
            .timeout(LOOKUP_TIMEOUT)
            .query(&[("key", self.api_key.as_str()), ("q", city), ("aqi", "no")])
    }

    pub async fn current(&self, city: &str) -> Result<WeatherReport> {
        if self.api_key.trim().is_empty() {
            bail!("A WeatherAPI key is required");
        }
        let city = city.trim();
        if city.is_empty() {
            bail!("City name must not be empty");
        }

        info!(city, "fetching current weather");
        let response = self.current_request(city).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Weather request failed with status code: {}",
                response.status().as_u16()
            ));
        }

        let body = response.text().await?;
        WeatherReport::from_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let body = r#"{
            "location": {"name": "Madrid", "country": "Spain"},
            "current": {"temp_c": 21.0, "humidity": 40, "wind_kph": 12.6,
                        "condition": {"text": "Sunny", "code": 1000}}
        }"#;
        let report = WeatherReport::from_json(body).unwrap();
        assert_eq!(report.city, "Madrid");
        assert_eq!(report.description, "Sunny");
        assert_eq!(report.humidity, 40.0);
        assert_eq!(report.wind_kph, 12.6);
    }

    #[test]
    fn test_current_request_is_bounded() {
        let client = WeatherClient::new("http://api.weatherapi.com", "wk");
        let request = client.current_request("Madrid").build().unwrap();

        assert_eq!(request.timeout(), Some(&LOOKUP_TIMEOUT));
        assert_eq!(
            request.url().as_str(),
            "http://api.weatherapi.com/v1/current.json?key=wk&q=Madrid&aqi=no"
        );
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let client = WeatherClient::new("http://127.0.0.1:9", "");
        let err = client.current("Madrid").await.unwrap_err();
        assert!(err.to_string().contains("key"));
    }
}
