/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    /// OpenWeatherMap data API base (current, forecast, air pollution).
    pub api_url: String,
    /// OpenWeatherMap geocoding API base.
    pub geo_api_url: String,
    pub port: u16,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: u64,
    pub day_boundary: DayBoundary,
    pub log_json: bool,
}

/// Which UTC offset decides the calendar day of a forecast sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBoundary {
    /// The queried location's offset as reported by OpenWeatherMap.
    Location,
    Utc,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

const DEFAULT_API_URL: &str = "https://api.openweathermap.org/data/2.5";
const DEFAULT_GEO_API_URL: &str = "https://api.openweathermap.org/geo/1.0";

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENWEATHERMAP_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::Missing("OPENWEATHERMAP_API_KEY"))?;

        let day_boundary = match lookup("FORECAST_DAY_BOUNDARY").as_deref() {
            None | Some("location") => DayBoundary::Location,
            Some("utc") => DayBoundary::Utc,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "FORECAST_DAY_BOUNDARY",
                    value: other.to_string(),
                })
            }
        };

        let log_json = match lookup("LOG_FORMAT").as_deref() {
            None | Some("text") => false,
            Some("json") => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            api_key,
            api_url: lookup("OPENWEATHERMAP_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            geo_api_url: lookup("OPENWEATHERMAP_GEO_API_URL")
                .unwrap_or_else(|| DEFAULT_GEO_API_URL.to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            cache_ttl_secs: parse_or(&lookup, "CACHE_TTL_SECS", 600)?,
            cache_max_entries: parse_or(&lookup, "CACHE_MAX_ENTRIES", 1000)?,
            day_boundary,
            log_json,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = AppConfig::from_lookup(lookup_from(&[("OPENWEATHERMAP_API_KEY", "k")]))
            .unwrap();

        assert_eq!(config.api_key, "k");
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_ttl_secs, 600);
        assert_eq!(config.cache_max_entries, 1000);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.geo_api_url, DEFAULT_GEO_API_URL);
        assert_eq!(config.day_boundary, DayBoundary::Location);
        assert!(!config.log_json);
    }

    #[test]
    fn test_missing_api_key() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("OPENWEATHERMAP_API_KEY"));

        let err = AppConfig::from_lookup(lookup_from(&[("OPENWEATHERMAP_API_KEY", "  ")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("OPENWEATHERMAP_API_KEY"));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("OPENWEATHERMAP_API_KEY", "k"),
            ("OPENWEATHERMAP_API_URL", "http://localhost:9000"),
            ("PORT", "3000"),
            ("CACHE_TTL_SECS", "30"),
            ("FORECAST_DAY_BOUNDARY", "utc"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cache_ttl_secs, 30);
        assert_eq!(config.day_boundary, DayBoundary::Utc);
        assert!(config.log_json);
    }

    #[test]
    fn test_invalid_port() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("OPENWEATHERMAP_API_KEY", "k"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PORT",
                value: "not-a-port".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_day_boundary() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("OPENWEATHERMAP_API_KEY", "k"),
            ("FORECAST_DAY_BOUNDARY", "server"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "FORECAST_DAY_BOUNDARY",
                ..
            }
        ));
    }
}
