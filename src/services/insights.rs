//! Dashboard insights derived from current conditions.
//!
//! Activity suggestions use temperature bands in Celsius and the coarse
//! OpenWeatherMap condition category (`weather[0].main`).

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::helpers::Units;

/// An outdoor/indoor activity and whether the weather suits it.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ActivitySuggestion {
    /// Activity name (e.g. "Hiking")
    pub name: String,
    /// Whether current conditions suit the activity
    pub suitable: bool,
}

impl ActivitySuggestion {
    fn new(name: &str, suitable: bool) -> Self {
        Self {
            name: name.to_string(),
            suitable,
        }
    }
}

/// The two inputs activity suggestions depend on.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Coarse condition category, e.g. "Rain"
    pub condition: String,
    pub temperature_c: f64,
}

impl CurrentConditions {
    /// Read `weather[0].main` and `main.temp` from a `/weather` body.
    pub fn from_current(current: &Value, units: Units) -> Result<Self, AppError> {
        let condition = current
            .pointer("/weather/0/main")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AppError::UpstreamMalformed("current weather has no condition".to_string())
            })?;
        let temperature = current
            .pointer("/main/temp")
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                AppError::UpstreamMalformed("current weather has no temperature".to_string())
            })?;

        Ok(Self {
            condition: condition.to_string(),
            temperature_c: units.to_celsius(temperature),
        })
    }
}

/// Suggest activities for a condition category and temperature (°C).
///
/// The bands are defined in Celsius. Callers holding imperial readings
/// convert first; `CurrentConditions::from_current` does this for
/// `/weather` bodies fetched with `units=imperial`.
pub fn suggest_activities(condition_main: &str, temperature_c: f64) -> Vec<ActivitySuggestion> {
    let condition = condition_main.to_lowercase();
    let wet = condition == "rain" || condition == "thunderstorm";
    let mut activities = Vec::new();

    if temperature_c > 20.0 {
        activities.push(ActivitySuggestion::new("Swimming", !wet));
        activities.push(ActivitySuggestion::new("Hiking", !wet));
        activities.push(ActivitySuggestion::new("Cycling", !wet));
    } else if temperature_c > 15.0 {
        activities.push(ActivitySuggestion::new("Hiking", !wet));
        activities.push(ActivitySuggestion::new("Cycling", !wet));
        activities.push(ActivitySuggestion::new(
            "Picnic",
            condition == "clear" || condition == "clouds",
        ));
    } else if temperature_c > 5.0 {
        activities.push(ActivitySuggestion::new("Running", !wet));
        activities.push(ActivitySuggestion::new(
            "Walking",
            condition != "thunderstorm",
        ));
    } else {
        activities.push(ActivitySuggestion::new("Skiing", condition == "snow"));
        activities.push(ActivitySuggestion::new("Indoor activities", true));
    }

    match condition.as_str() {
        "clear" => {
            activities.push(ActivitySuggestion::new("Sunbathing", temperature_c > 18.0));
            activities.push(ActivitySuggestion::new("Photography", true));
        }
        "clouds" => activities.push(ActivitySuggestion::new("Photography", true)),
        "rain" | "drizzle" => activities.push(ActivitySuggestion::new("Museum visit", true)),
        _ => {}
    }

    activities
}

/// Rating label for an OpenWeatherMap air quality index (1..=5).
pub fn aqi_label(aqi: u8) -> &'static str {
    match aqi {
        0 | 1 => "Good",
        2 => "Fair",
        3 => "Moderate",
        4 => "Poor",
        _ => "Very Poor",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(activities: &[ActivitySuggestion]) -> Vec<&str> {
        activities.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_warm_clear_day() {
        let activities = suggest_activities("Clear", 25.0);
        assert_eq!(
            names(&activities),
            vec!["Swimming", "Hiking", "Cycling", "Sunbathing", "Photography"]
        );
        assert!(activities.iter().all(|a| a.suitable));
    }

    #[test]
    fn test_warm_rain_not_ideal_outdoors() {
        let activities = suggest_activities("Rain", 22.0);
        assert!(!activities[0].suitable, "Swimming in rain");
        assert_eq!(activities.last().unwrap().name, "Museum visit");
        assert!(activities.last().unwrap().suitable);
    }

    #[test]
    fn test_mild_picnic_depends_on_sky() {
        let clouds = suggest_activities("Clouds", 17.0);
        let picnic = clouds.iter().find(|a| a.name == "Picnic").unwrap();
        assert!(picnic.suitable);

        let mist = suggest_activities("Mist", 17.0);
        let picnic = mist.iter().find(|a| a.name == "Picnic").unwrap();
        assert!(!picnic.suitable);
    }

    #[test]
    fn test_band_edges_are_exclusive() {
        // Exactly 20 °C is mild, not warm
        assert_eq!(
            names(&suggest_activities("Haze", 20.0)),
            vec!["Hiking", "Cycling", "Picnic"]
        );
        // Exactly 5 °C is cold
        assert_eq!(
            names(&suggest_activities("Haze", 5.0)),
            vec!["Skiing", "Indoor activities"]
        );
    }

    #[test]
    fn test_cold_snow_skiing() {
        let activities = suggest_activities("Snow", -3.0);
        assert_eq!(activities[0], ActivitySuggestion::new("Skiing", true));
        assert!(!suggest_activities("Clear", -3.0)[0].suitable);
    }

    #[test]
    fn test_cool_thunderstorm_no_walking() {
        let activities = suggest_activities("Thunderstorm", 10.0);
        assert_eq!(names(&activities), vec!["Running", "Walking"]);
        assert!(activities.iter().all(|a| !a.suitable));
    }

    #[test]
    fn test_sunbathing_threshold() {
        let activities = suggest_activities("Clear", 18.0);
        let sunbathing = activities.iter().find(|a| a.name == "Sunbathing").unwrap();
        assert!(!sunbathing.suitable);
    }

    #[test]
    fn test_aqi_labels() {
        assert_eq!(aqi_label(1), "Good");
        assert_eq!(aqi_label(2), "Fair");
        assert_eq!(aqi_label(3), "Moderate");
        assert_eq!(aqi_label(4), "Poor");
        assert_eq!(aqi_label(5), "Very Poor");
    }

    #[test]
    fn test_conditions_from_imperial_current() {
        let current = serde_json::json!({
            "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }],
            "main": { "temp": 77.0 }
        });
        let conditions = CurrentConditions::from_current(&current, Units::Imperial).unwrap();
        assert_eq!(conditions.condition, "Clear");
        assert!((conditions.temperature_c - 25.0).abs() < 1e-10);
    }

    #[test]
    fn test_imperial_reading_uses_celsius_bands() {
        let current = serde_json::json!({
            "weather": [{ "id": 500, "main": "Clouds", "description": "overcast", "icon": "04d" }],
            "main": { "temp": 50.0 }
        });
        let conditions = CurrentConditions::from_current(&current, Units::Imperial).unwrap();
        let activities = suggest_activities(&conditions.condition, conditions.temperature_c);
        assert_eq!(names(&activities), vec!["Running", "Walking", "Photography"]);
    }

    #[test]
    fn test_conditions_missing_fields() {
        let current = serde_json::json!({ "main": { "temp": 10.0 } });
        let err = CurrentConditions::from_current(&current, Units::Metric).unwrap_err();
        assert!(matches!(err, AppError::UpstreamMalformed(_)));
    }
}
