//! OpenWeatherMap client.
//!
//! One request per call, no retries. Any non-success status is a total
//! failure of the call (`UpstreamUnavailable`); a success status with an
//! unexpected body is `UpstreamMalformed`; network-level failures surface as
//! `TransportError` (see the `From<reqwest::Error>` impl in `errors`).
//! See: https://openweathermap.org/api

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::helpers::{Coordinates, Units};
use crate::services::forecast::{ForecastSample, WeatherCondition};

/// Client for the OpenWeatherMap data and geocoding APIs.
#[derive(Debug, Clone)]
pub struct OwmClient {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    geo_api_url: String,
}

/// Forecast samples plus the location's UTC offset reported alongside them.
#[derive(Debug, Clone)]
pub struct ForecastBatch {
    pub samples: Vec<ForecastSample>,
    /// `city.timezone` from the response, seconds east of UTC.
    pub utc_offset_secs: Option<i32>,
}

/// Severe weather alert, reduced to the fields the dashboard shows.
/// Fields upstream leaves out come through empty or zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct WeatherAlert {
    pub sender_name: String,
    pub event: String,
    pub description: String,
    /// Alert start, seconds since the Unix epoch
    pub start: i64,
    /// Alert end, seconds since the Unix epoch
    pub end: i64,
}

/// Pollutant concentrations in μg/m³.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AirComponents {
    pub co: f64,
    pub no: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub nh3: f64,
}

/// Current air quality at a location.
#[derive(Debug, Clone, PartialEq)]
pub struct AirQuality {
    /// OpenWeatherMap air quality index, 1 (good) to 5 (very poor)
    pub aqi: u8,
    pub components: AirComponents,
}

// --- OpenWeatherMap JSON response types ---

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    #[serde(with = "chrono::serde::ts_seconds")]
    dt: DateTime<Utc>,
    main: OwmMain,
    weather: Vec<WeatherCondition>,
    #[serde(default)]
    pop: f64,
    rain: Option<OwmVolume>,
    snow: Option<OwmVolume>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct OwmVolume {
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmCity {
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OwmAirResponse {
    list: Vec<OwmAirEntry>,
}

#[derive(Debug, Deserialize)]
struct OwmAirEntry {
    main: OwmAirMain,
    components: AirComponents,
}

#[derive(Debug, Deserialize)]
struct OwmAirMain {
    aqi: u8,
}

impl OwmClient {
    pub fn new(api_key: &str, api_url: &str, geo_api_url: &str) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            geo_api_url: geo_api_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET `url` with `query` plus the API key; return the JSON body.
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, AppError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "OpenWeatherMap returned HTTP {}",
                status
            )));
        }

        Ok(response.json::<Value>().await?)
    }

    /// Fetch the 5-day / 3-hour forecast for a location.
    pub async fn fetch_forecast(
        &self,
        coords: Coordinates,
        units: Units,
    ) -> Result<ForecastBatch, AppError> {
        tracing::debug!(
            "Fetching forecast for ({:.4}, {:.4}) in {}",
            coords.lat,
            coords.lon,
            units
        );
        let body = self
            .get_json(
                &format!("{}/forecast", self.api_url),
                &location_query(coords, Some(units)),
            )
            .await?;
        parse_forecast(body)
    }

    /// Fetch current conditions. The body is passed through; only `alerts`
    /// entries are projected.
    pub async fn fetch_current(&self, coords: Coordinates, units: Units) -> Result<Value, AppError> {
        tracing::debug!(
            "Fetching current weather for ({:.4}, {:.4}) in {}",
            coords.lat,
            coords.lon,
            units
        );
        let body = self
            .get_json(
                &format!("{}/weather", self.api_url),
                &location_query(coords, Some(units)),
            )
            .await?;
        project_current(body)
    }

    /// Fetch current air pollution for a location.
    pub async fn fetch_air_quality(&self, coords: Coordinates) -> Result<AirQuality, AppError> {
        tracing::debug!(
            "Fetching air quality for ({:.4}, {:.4})",
            coords.lat,
            coords.lon
        );
        let body = self
            .get_json(
                &format!("{}/air_pollution", self.api_url),
                &location_query(coords, None),
            )
            .await?;
        parse_air_quality(body)
    }

    /// Geocode a city name. The upstream array is returned verbatim.
    pub async fn search_cities(&self, query: &str, limit: u8) -> Result<Value, AppError> {
        tracing::debug!("Searching cities for '{}' (limit {})", query, limit);
        let body = self
            .get_json(
                &format!("{}/direct", self.geo_api_url),
                &[("q", query.to_string()), ("limit", limit.to_string())],
            )
            .await?;

        if !body.is_array() {
            return Err(AppError::UpstreamMalformed(
                "geocoding response is not an array".to_string(),
            ));
        }
        Ok(body)
    }
}

fn location_query(coords: Coordinates, units: Option<Units>) -> Vec<(&'static str, String)> {
    let mut query = vec![("lat", coords.lat.to_string()), ("lon", coords.lon.to_string())];
    if let Some(units) = units {
        query.push(("units", units.as_str().to_string()));
    }
    query
}

/// Parse a `/forecast` body into ordered samples.
///
/// Pure function (no I/O); the whole call fails on the first bad entry so
/// callers never see a partially parsed list.
pub fn parse_forecast(mut body: Value) -> Result<ForecastBatch, AppError> {
    let list = match body.get_mut("list") {
        Some(list) if list.is_array() => list.take(),
        Some(_) => {
            return Err(AppError::UpstreamMalformed(
                "forecast 'list' is not an array".to_string(),
            ))
        }
        None => {
            return Err(AppError::UpstreamMalformed(
                "forecast response has no 'list' field".to_string(),
            ))
        }
    };

    let items: Vec<OwmForecastItem> = serde_json::from_value(list).map_err(|e| {
        AppError::UpstreamMalformed(format!("forecast entry structure error: {}", e))
    })?;

    let utc_offset_secs = body
        .get_mut("city")
        .map(Value::take)
        .and_then(|city| serde_json::from_value::<OwmCity>(city).ok())
        .and_then(|city| city.timezone);

    let samples = items
        .into_iter()
        .map(into_sample)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ForecastBatch {
        samples,
        utc_offset_secs,
    })
}

fn into_sample(item: OwmForecastItem) -> Result<ForecastSample, AppError> {
    let condition = item.weather.into_iter().next().ok_or_else(|| {
        AppError::UpstreamMalformed(format!(
            "forecast entry at {} has no weather condition",
            item.dt.timestamp()
        ))
    })?;

    Ok(ForecastSample {
        timestamp: item.dt,
        temp: item.main.temp,
        temp_min: item.main.temp_min,
        temp_max: item.main.temp_max,
        feels_like: item.main.feels_like,
        condition,
        pop: item.pop,
        rain: item.rain.and_then(|v| v.three_hours),
        snow: item.snow.and_then(|v| v.three_hours),
    })
}

/// Validate a `/weather` body and project its `alerts`, if any.
pub fn project_current(mut body: Value) -> Result<Value, AppError> {
    let object = body.as_object_mut().ok_or_else(|| {
        AppError::UpstreamMalformed("current weather response is not an object".to_string())
    })?;

    if let Some(alerts) = object.get_mut("alerts") {
        let projected: Vec<WeatherAlert> = serde_json::from_value(alerts.take())
            .map_err(|e| AppError::UpstreamMalformed(format!("alert structure error: {}", e)))?;
        *alerts = serde_json::to_value(projected)
            .map_err(|e| AppError::Internal(format!("alert serialization failed: {}", e)))?;
    }

    Ok(body)
}

/// Extract `{aqi, components}` from the first entry of an `/air_pollution` body.
pub fn parse_air_quality(body: Value) -> Result<AirQuality, AppError> {
    let response: OwmAirResponse = serde_json::from_value(body).map_err(|e| {
        AppError::UpstreamMalformed(format!("air pollution response structure error: {}", e))
    })?;

    let first = response.list.into_iter().next().ok_or_else(|| {
        AppError::UpstreamMalformed("air pollution response has an empty list".to_string())
    })?;

    Ok(AirQuality {
        aqi: first.main.aqi,
        components: first.components,
    })
}
