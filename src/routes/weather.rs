//! Weather HTTP endpoints.
//!
//! - GET /api/weather/current?lat&lon&units
//! - GET /api/weather/forecast?lat&lon&units
//! - GET /api/weather/hourly?lat&lon&units&limit
//! - GET /api/weather/air-quality?lat&lon
//! - GET /api/weather/search?q&limit
//! - GET /api/weather/activities?lat&lon&units
//! - GET /api/weather/dashboard?lat&lon&units

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use utoipa::{IntoParams, ToSchema};

use crate::config::DayBoundary;
use crate::errors::{AppError, ErrorResponse};
use crate::helpers::{Coordinates, Units};
use crate::services::cache::{cache_key, ResponseCache};
use crate::services::forecast::{
    day_offset, to_daily_summaries, to_hourly_projection, DailySummary, HourlyProjection,
};
use crate::services::insights::{
    aqi_label, suggest_activities, ActivitySuggestion, CurrentConditions,
};
use crate::services::owm::{AirComponents, AirQuality, OwmClient};

/// Hourly slots included in the dashboard view.
const DASHBOARD_HOURLY_LIMIT: i64 = 24;

/// Default and maximum number of geocoding results.
const SEARCH_MAX_LIMIT: u8 = 5;

/// Shared application state for weather endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) owm: OwmClient,
    pub(crate) cache: Arc<dyn ResponseCache>,
    pub(crate) cache_ttl: Duration,
    pub(crate) day_boundary: DayBoundary,
}

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
pub struct LocationQuery {
    /// Latitude in degrees (-90..=90)
    pub lat: f64,
    /// Longitude in degrees (-180..=180)
    pub lon: f64,
    /// Unit system: "metric" (default) or "imperial"
    pub units: Option<String>,
}

impl LocationQuery {
    fn validate(&self) -> Result<(Coordinates, Units), AppError> {
        Ok((
            Coordinates::new(self.lat, self.lon)?,
            Units::parse(self.units.as_deref())?,
        ))
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HourlyQuery {
    /// Latitude in degrees (-90..=90)
    pub lat: f64,
    /// Longitude in degrees (-180..=180)
    pub lon: f64,
    /// Unit system: "metric" (default) or "imperial"
    pub units: Option<String>,
    /// Keep at most this many slots (all when omitted, none when <= 0)
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AirQualityQuery {
    /// Latitude in degrees (-90..=90)
    pub lat: f64,
    /// Longitude in degrees (-180..=180)
    pub lon: f64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// City name, optionally with state and country code ("Paris,FR")
    pub q: String,
    /// Maximum number of results, 1..=5 (default 5)
    pub limit: Option<u8>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Air quality with its rating label.
#[derive(Debug, Serialize, ToSchema)]
pub struct AirQualityResponse {
    /// OpenWeatherMap air quality index, 1 (good) to 5 (very poor)
    pub aqi: u8,
    /// Rating label ("Good", "Fair", "Moderate", "Poor", "Very Poor")
    pub label: String,
    pub components: AirComponents,
}

impl From<AirQuality> for AirQualityResponse {
    fn from(aq: AirQuality) -> Self {
        Self {
            aqi: aq.aqi,
            label: aqi_label(aq.aqi).to_string(),
            components: aq.components,
        }
    }
}

/// Activity suggestions for current conditions.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActivitiesResponse {
    /// Coarse condition category used for the suggestions (e.g. "Rain")
    pub condition: String,
    /// Current temperature in Celsius, whatever unit system was requested
    pub temperature_c: f64,
    pub activities: Vec<ActivitySuggestion>,
}

impl From<CurrentConditions> for ActivitiesResponse {
    fn from(c: CurrentConditions) -> Self {
        Self {
            activities: suggest_activities(&c.condition, c.temperature_c),
            condition: c.condition,
            temperature_c: c.temperature_c,
        }
    }
}

/// Everything the dashboard page renders, fetched in one round-trip.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    /// Upstream current conditions (alerts projected)
    #[schema(value_type = Object)]
    pub current: Value,
    pub daily: Vec<DailySummary>,
    /// The next 24 forecast slots
    pub hourly: Vec<HourlyProjection>,
    pub air_quality: AirQualityResponse,
    pub activities: Vec<ActivitySuggestion>,
}

// ---------------------------------------------------------------------------
// Cache helper
// ---------------------------------------------------------------------------

/// Serve `key` from the response cache, or produce, cache and return it.
/// Failures are never cached.
async fn cached<T, F, Fut>(state: &AppState, key: String, produce: F) -> Result<Value, AppError>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    if let Some(hit) = state.cache.get(&key) {
        return Ok(hit);
    }

    let value = serde_json::to_value(produce().await?)
        .map_err(|e| AppError::Internal(format!("Response serialization failed: {}", e)))?;
    state.cache.set(key, value.clone(), state.cache_ttl);
    Ok(value)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Get current conditions for a location.
///
/// The OpenWeatherMap body is passed through unchanged, except that alert
/// entries (if any) are reduced to `{sender_name, event, description, start, end}`.
#[utoipa::path(
    get,
    path = "/api/weather/current",
    tag = "Weather",
    params(LocationQuery),
    responses(
        (status = 200, description = "Upstream current conditions, alerts projected"),
        (status = 400, description = "Invalid coordinates or units", body = ErrorResponse),
        (status = 502, description = "OpenWeatherMap failed or returned an unexpected body", body = ErrorResponse),
    )
)]
pub async fn get_current(
    State(state): State<AppState>,
    params: Result<Query<LocationQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let (coords, units) = params.validate()?;

    let owm = &state.owm;
    let key = cache_key("current", &[&coords.cache_fragment(), units.as_str()]);
    let value = cached(&state, key, move || owm.fetch_current(coords, units)).await?;
    Ok(Json(value))
}

/// Get the daily forecast for a location.
///
/// Buckets OpenWeatherMap's 3-hour forecast into one summary per calendar
/// day, in the order the days first appear in the upstream list.
#[utoipa::path(
    get,
    path = "/api/weather/forecast",
    tag = "Weather",
    params(LocationQuery),
    responses(
        (status = 200, description = "Daily summaries", body = [DailySummary]),
        (status = 400, description = "Invalid coordinates or units", body = ErrorResponse),
        (status = 502, description = "OpenWeatherMap failed or returned an unexpected body", body = ErrorResponse),
    )
)]
pub async fn get_forecast(
    State(state): State<AppState>,
    params: Result<Query<LocationQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let (coords, units) = params.validate()?;

    let owm = &state.owm;
    let boundary = state.day_boundary;
    let key = cache_key("forecast", &[&coords.cache_fragment(), units.as_str()]);
    let value = cached(&state, key, move || async move {
        let batch = owm.fetch_forecast(coords, units).await?;
        let offset = day_offset(boundary, batch.utc_offset_secs);
        Ok::<_, AppError>(to_daily_summaries(&batch.samples, offset))
    })
    .await?;
    Ok(Json(value))
}

/// Get the hourly (3-hour slot) forecast for a location.
#[utoipa::path(
    get,
    path = "/api/weather/hourly",
    tag = "Weather",
    params(HourlyQuery),
    responses(
        (status = 200, description = "Forecast slots in upstream order", body = [HourlyProjection]),
        (status = 400, description = "Invalid coordinates, units or limit", body = ErrorResponse),
        (status = 502, description = "OpenWeatherMap failed or returned an unexpected body", body = ErrorResponse),
    )
)]
pub async fn get_hourly(
    State(state): State<AppState>,
    params: Result<Query<HourlyQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let coords = Coordinates::new(params.lat, params.lon)?;
    let units = Units::parse(params.units.as_deref())?;
    let limit = params.limit.unwrap_or(i64::MAX);

    let owm = &state.owm;
    let key = cache_key(
        "hourly",
        &[&coords.cache_fragment(), units.as_str(), &limit.to_string()],
    );
    let value = cached(&state, key, move || async move {
        let batch = owm.fetch_forecast(coords, units).await?;
        Ok::<_, AppError>(to_hourly_projection(&batch.samples, limit))
    })
    .await?;
    Ok(Json(value))
}

/// Get current air quality for a location.
#[utoipa::path(
    get,
    path = "/api/weather/air-quality",
    tag = "Weather",
    params(AirQualityQuery),
    responses(
        (status = 200, description = "Air quality index and pollutant concentrations", body = AirQualityResponse),
        (status = 400, description = "Invalid coordinates", body = ErrorResponse),
        (status = 502, description = "OpenWeatherMap failed or returned an unexpected body", body = ErrorResponse),
    )
)]
pub async fn get_air_quality(
    State(state): State<AppState>,
    params: Result<Query<AirQualityQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let coords = Coordinates::new(params.lat, params.lon)?;

    let owm = &state.owm;
    let key = cache_key("air-quality", &[&coords.cache_fragment()]);
    let value = cached(&state, key, move || async move {
        let aq = owm.fetch_air_quality(coords).await?;
        Ok::<_, AppError>(AirQualityResponse::from(aq))
    })
    .await?;
    Ok(Json(value))
}

/// Search cities by name.
///
/// Returns the OpenWeatherMap geocoding array verbatim.
#[utoipa::path(
    get,
    path = "/api/weather/search",
    tag = "Weather",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching cities (name, country, state, lat, lon)"),
        (status = 400, description = "Missing query or invalid limit", body = ErrorResponse),
        (status = 502, description = "OpenWeatherMap failed or returned an unexpected body", body = ErrorResponse),
    )
)]
pub async fn search_cities(
    State(state): State<AppState>,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::InvalidRequest("q must not be empty".to_string()));
    }
    let limit = params.limit.unwrap_or(SEARCH_MAX_LIMIT);
    if limit == 0 || limit > SEARCH_MAX_LIMIT {
        return Err(AppError::InvalidRequest(format!(
            "limit must be between 1 and {}",
            SEARCH_MAX_LIMIT
        )));
    }

    let owm = &state.owm;
    let key = cache_key("search", &[&query.to_lowercase(), &limit.to_string()]);
    let value = cached(&state, key, move || owm.search_cities(query, limit)).await?;
    Ok(Json(value))
}

/// Suggest activities for the current conditions at a location.
#[utoipa::path(
    get,
    path = "/api/weather/activities",
    tag = "Weather",
    params(LocationQuery),
    responses(
        (status = 200, description = "Activity suggestions", body = ActivitiesResponse),
        (status = 400, description = "Invalid coordinates or units", body = ErrorResponse),
        (status = 502, description = "OpenWeatherMap failed or returned an unexpected body", body = ErrorResponse),
    )
)]
pub async fn get_activities(
    State(state): State<AppState>,
    params: Result<Query<LocationQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let (coords, units) = params.validate()?;

    let owm = &state.owm;
    let key = cache_key("activities", &[&coords.cache_fragment(), units.as_str()]);
    let value = cached(&state, key, move || async move {
        let current = owm.fetch_current(coords, units).await?;
        let conditions = CurrentConditions::from_current(&current, units)?;
        Ok::<_, AppError>(ActivitiesResponse::from(conditions))
    })
    .await?;
    Ok(Json(value))
}

/// Get the full dashboard for a location.
///
/// Fetches current conditions, forecast and air quality from OpenWeatherMap
/// concurrently. Any upstream failure fails the whole request.
#[utoipa::path(
    get,
    path = "/api/weather/dashboard",
    tag = "Weather",
    params(LocationQuery),
    responses(
        (status = 200, description = "Combined dashboard view", body = DashboardResponse),
        (status = 400, description = "Invalid coordinates or units", body = ErrorResponse),
        (status = 502, description = "OpenWeatherMap failed or returned an unexpected body", body = ErrorResponse),
    )
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    params: Result<Query<LocationQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let (coords, units) = params.validate()?;

    let owm = &state.owm;
    let boundary = state.day_boundary;
    let key = cache_key("dashboard", &[&coords.cache_fragment(), units.as_str()]);
    let value = cached(&state, key, move || async move {
        let (current, batch, air_quality) = futures::future::try_join3(
            owm.fetch_current(coords, units),
            owm.fetch_forecast(coords, units),
            owm.fetch_air_quality(coords),
        )
        .await?;

        let conditions = CurrentConditions::from_current(&current, units)?;
        let offset = day_offset(boundary, batch.utc_offset_secs);

        Ok::<_, AppError>(DashboardResponse {
            daily: to_daily_summaries(&batch.samples, offset),
            hourly: to_hourly_projection(&batch.samples, DASHBOARD_HOURLY_LIMIT),
            air_quality: AirQualityResponse::from(air_quality),
            activities: suggest_activities(&conditions.condition, conditions.temperature_c),
            current,
        })
    })
    .await?;
    Ok(Json(value))
}
