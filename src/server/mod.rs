mod handlers;
mod state;

use axum::http::{header, HeaderValue};
use axum::routing::{delete, get};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/weather", get(handlers::weather))
        .route("/weather/coords", get(handlers::weather_by_coords))
        .route("/weather/nearby", get(handlers::nearby))
        .route("/weather/forecast", get(handlers::forecast))
        .route("/weather/forecast/coords", get(handlers::forecast_by_coords))
        .route(
            "/saved-cities",
            get(handlers::list_saved).post(handlers::save_city),
        )
        .route("/saved-cities/{id}", delete(handlers::delete_saved))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start(state: Arc<AppState>, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("weather dashboard listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
