use axum::{routing::get, Router};

pub mod health;
pub mod weather;

use weather::AppState;

/// All API routes, with state applied.
pub(crate) fn api_router(state: AppState) -> Router {
    let weather_routes = Router::new()
        .route("/api/weather/current", get(weather::get_current))
        .route("/api/weather/forecast", get(weather::get_forecast))
        .route("/api/weather/hourly", get(weather::get_hourly))
        .route("/api/weather/air-quality", get(weather::get_air_quality))
        .route("/api/weather/search", get(weather::search_cities))
        .route("/api/weather/activities", get(weather::get_activities))
        .route("/api/weather/dashboard", get(weather::get_dashboard))
        .with_state(state);

    Router::new()
        .route("/api/health", get(health::health_check))
        .merge(weather_routes)
}
