//! Shared helpers for request parameters.
//!
//! Coordinates and unit systems are validated here before anything is
//! forwarded to OpenWeatherMap.

use std::fmt;

use crate::errors::AppError;

/// Unit system forwarded verbatim to OpenWeatherMap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Parse the optional `units` query parameter (default `metric`).
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(str::trim) {
            None | Some("") | Some("metric") => Ok(Units::Metric),
            Some("imperial") => Ok(Units::Imperial),
            Some(other) => Err(AppError::InvalidRequest(format!(
                "units must be 'metric' or 'imperial', got '{}'",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    /// Convert a temperature reported in this unit system to Celsius.
    pub fn to_celsius(self, temperature: f64) -> f64 {
        match self {
            Units::Metric => temperature,
            Units::Imperial => (temperature - 32.0) * 5.0 / 9.0,
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, AppError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(AppError::InvalidRequest(
                "lat and lon must be finite numbers".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::InvalidRequest(format!(
                "lat must be between -90 and 90, got {}",
                lat
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(AppError::InvalidRequest(format!(
                "lon must be between -180 and 180, got {}",
                lon
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Stable key fragment, rounded to 4 decimal places (~11 m).
    pub fn cache_fragment(&self) -> String {
        format!("{:.4},{:.4}", self.lat, self.lon)
    }
}
