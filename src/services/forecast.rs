//! Forecast aggregation.
//!
//! Turns OpenWeatherMap's flat list of 3-hour forecast samples into the two
//! views the dashboard renders: one summary per calendar day, and a flattened
//! hourly projection. Both are pure functions of their input; no I/O happens
//! here, the samples are fetched by `services::owm` beforehand.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::config::DayBoundary;

/// OpenWeatherMap weather condition, copied verbatim from upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeatherCondition {
    /// Condition id (e.g. 500 for light rain)
    pub id: i64,
    /// Coarse category (e.g. "Rain", "Clear", "Clouds")
    pub main: String,
    /// Human-readable description (e.g. "light rain")
    pub description: String,
    /// Icon key (e.g. "10d")
    pub icon: String,
}

/// One upstream forecast slot (3 hours).
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    pub timestamp: DateTime<Utc>,
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub feels_like: f64,
    pub condition: WeatherCondition,
    /// Probability of precipitation, 0..=1
    pub pop: f64,
    /// Rain volume for the slot; `None` when upstream omitted the field.
    pub rain: Option<f64>,
    /// Snow volume for the slot; `None` when upstream omitted the field.
    pub snow: Option<f64>,
}

/// Aggregated forecast for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailySummary {
    /// Calendar date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Display label, e.g. "19 Oct"
    pub day: String,
    /// Lowest `temp_min` across the day's samples
    pub temp_min: f64,
    /// Highest `temp_max` across the day's samples
    pub temp_max: f64,
    /// Condition of the first sample of the day
    pub weather: WeatherCondition,
    /// Highest probability of precipitation across the day's samples
    pub pop: f64,
    /// Total rain volume for the day (0 when none reported)
    pub rain: f64,
    /// Total snow volume for the day (0 when none reported)
    pub snow: f64,
}

impl DailySummary {
    fn seed(date: NaiveDate, sample: &ForecastSample) -> Self {
        Self {
            date,
            day: day_label(date),
            temp_min: sample.temp_min,
            temp_max: sample.temp_max,
            weather: sample.condition.clone(),
            pop: sample.pop,
            rain: sample.rain.unwrap_or(0.0),
            snow: sample.snow.unwrap_or(0.0),
        }
    }

    /// Fold a later sample of the same date in. Condition and label stay.
    fn absorb(&mut self, sample: &ForecastSample) {
        self.temp_min = self.temp_min.min(sample.temp_min);
        self.temp_max = self.temp_max.max(sample.temp_max);
        self.pop = self.pop.max(sample.pop);
        self.rain += sample.rain.unwrap_or(0.0);
        self.snow += sample.snow.unwrap_or(0.0);
    }
}

/// A single forecast slot, reshaped for the hourly chart.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HourlyProjection {
    /// Slot start, seconds since the Unix epoch (UTC)
    #[serde(with = "chrono::serde::ts_seconds")]
    #[schema(value_type = i64)]
    pub dt: DateTime<Utc>,
    pub temp: f64,
    pub feels_like: f64,
    pub weather: WeatherCondition,
    /// Probability of precipitation, 0..=1
    pub pop: f64,
    /// Rain volume, omitted when upstream reported none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rain: Option<f64>,
    /// Snow volume, omitted when upstream reported none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snow: Option<f64>,
}

impl From<&ForecastSample> for HourlyProjection {
    fn from(s: &ForecastSample) -> Self {
        Self {
            dt: s.timestamp,
            temp: s.temp,
            feels_like: s.feels_like,
            weather: s.condition.clone(),
            pop: s.pop,
            rain: s.rain,
            snow: s.snow,
        }
    }
}

fn day_label(date: NaiveDate) -> String {
    date.format("%d %b").to_string()
}

/// Pick the offset used to decide which calendar day a sample falls on.
///
/// `utc_offset_secs` is the location offset reported by OpenWeatherMap. When
/// it is missing or out of range we bucket by UTC.
pub fn day_offset(boundary: DayBoundary, utc_offset_secs: Option<i32>) -> FixedOffset {
    let utc = Utc.fix();
    match boundary {
        DayBoundary::Utc => utc,
        DayBoundary::Location => match utc_offset_secs {
            Some(secs) => FixedOffset::east_opt(secs).unwrap_or_else(|| {
                tracing::warn!("Location UTC offset {}s out of range, using UTC", secs);
                utc
            }),
            None => utc,
        },
    }
}

/// Group samples into one summary per calendar day.
///
/// Days are returned in the order their first sample appears in `samples`,
/// not sorted by date. The first sample of a day decides its condition and
/// label; temperatures are min/maxed, `pop` is maxed and precipitation is
/// summed (absent values count as zero).
pub fn to_daily_summaries(samples: &[ForecastSample], offset: FixedOffset) -> Vec<DailySummary> {
    let mut by_date: HashMap<NaiveDate, DailySummary> = HashMap::new();
    // HashMap iteration order is arbitrary; this list fixes the output order.
    let mut order: Vec<NaiveDate> = Vec::new();

    for sample in samples {
        let date = sample.timestamp.with_timezone(&offset).date_naive();
        match by_date.entry(date) {
            Entry::Occupied(mut existing) => existing.get_mut().absorb(sample),
            Entry::Vacant(slot) => {
                order.push(date);
                slot.insert(DailySummary::seed(date, sample));
            }
        }
    }

    order
        .into_iter()
        .filter_map(|date| by_date.remove(&date))
        .collect()
}

/// Reshape samples for the hourly view, keeping at most `limit` of them.
///
/// A zero or negative `limit` yields an empty list.
pub fn to_hourly_projection(samples: &[ForecastSample], limit: i64) -> Vec<HourlyProjection> {
    let take = usize::try_from(limit).unwrap_or(0);
    samples
        .iter()
        .take(take)
        .map(HourlyProjection::from)
        .collect()
}
