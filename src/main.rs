use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod helpers;
mod routes;
mod services;

use config::AppConfig;
use routes::weather::AppState;
use services::cache::MokaResponseCache;
use services::owm::OwmClient;

/// OpenAPI document for the Weather Dashboard API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Weather Dashboard API",
        version = "0.1.0",
        description = "Weather dashboard backend. Proxies OpenWeatherMap current \
            conditions, 5-day/3-hour forecasts, air quality and city search, \
            aggregates forecasts into daily summaries and an hourly projection, \
            and caches responses per location and unit system.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Weather", description = "Current conditions, forecasts and air quality"),
        (name = "Insights", description = "Activity suggestions and dashboard bundle"),
    ),
    paths(
        routes::health::health_check,
        routes::weather::get_current,
        routes::weather::get_forecast,
        routes::weather::get_hourly,
        routes::weather::get_air_quality,
        routes::weather::search_cities,
        routes::weather::get_activities,
        routes::weather::get_dashboard,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            services::forecast::WeatherCondition,
            services::forecast::DailySummary,
            services::forecast::HourlyProjection,
            services::owm::WeatherAlert,
            services::owm::AirComponents,
            services::insights::ActivitySuggestion,
            routes::weather::AirQualityResponse,
            routes::weather::ActivitiesResponse,
            routes::weather::DashboardResponse,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    let (json_layer, text_layer) = if config.log_json {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_dashboard_api=debug,tower_http=debug".into()),
        )
        .with(json_layer)
        .with(text_layer)
        .init();

    let owm = match OwmClient::new(&config.api_key, &config.api_url, &config.geo_api_url) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to build OpenWeatherMap client: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = AppState {
        owm,
        cache: Arc::new(MokaResponseCache::new(config.cache_max_entries)),
        cache_ttl: Duration::from_secs(config.cache_ttl_secs),
        day_boundary: config.day_boundary,
    };

    tracing::info!(
        ttl_secs = config.cache_ttl_secs,
        max_entries = config.cache_max_entries,
        day_boundary = ?config.day_boundary,
        "Response cache configured"
    );

    // CORS: read-only API, GET from any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    let app = routes::api_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server terminated unexpectedly: {}", e);
        std::process::exit(1);
    }
}
