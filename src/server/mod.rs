//! HTTP server: axum router over the store.

use axum::{
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::storage::Store;

pub mod routes;

/// Server state: the store behind an async mutex, so every request gets
/// the one shared physical connection (required for in-memory databases).
pub struct AppState {
    pub store: Mutex<Store>,
}

/// Build the application router. Split out from [`start_server`] so tests
/// can drive it without binding a socket.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/health/db", get(routes::health_db))
        .route("/stats", get(routes::get_stats))
        .route("/instruments", post(routes::create_instrument).get(routes::list_instruments))
        .route(
            "/instruments/{id}",
            get(routes::get_instrument)
                .put(routes::update_instrument)
                .delete(routes::delete_instrument),
        )
        .route("/instruments/{id}/practices", get(routes::list_instrument_practices))
        .route("/instruments/{id}/techniques", get(routes::list_instrument_techniques))
        .route(
            "/instruments/{id}/techniques/{technique_id}",
            post(routes::link_instrument_technique)
                .delete(routes::unlink_instrument_technique),
        )
        .route("/instruments/{id}/tunings", get(routes::list_instrument_tunings))
        .route(
            "/instruments/{id}/tunings/{tuning_id}",
            post(routes::link_instrument_tuning).delete(routes::unlink_instrument_tuning),
        )
        .route("/tunings", post(routes::create_tuning).get(routes::list_tunings))
        .route(
            "/tunings/{id}",
            get(routes::get_tuning)
                .put(routes::update_tuning)
                .delete(routes::delete_tuning),
        )
        .route("/tunings/{id}/instruments", get(routes::list_tuning_instruments))
        .route("/exercises", post(routes::create_exercise).get(routes::list_exercises))
        .route(
            "/exercises/{id}",
            get(routes::get_exercise)
                .put(routes::update_exercise)
                .delete(routes::delete_exercise),
        )
        .route(
            "/exercises/{id}/state",
            post(routes::create_exercise_state).get(routes::get_exercise_state),
        )
        .route(
            "/exercise-states/{id}",
            put(routes::update_exercise_state).delete(routes::delete_exercise_state),
        )
        .route("/exercises/{id}/techniques", get(routes::list_exercise_techniques))
        .route(
            "/exercises/{id}/techniques/{technique_id}",
            post(routes::link_exercise_technique).delete(routes::unlink_exercise_technique),
        )
        .route(
            "/exercises/{id}/overload-dimensions",
            get(routes::list_exercise_overload_dimensions),
        )
        .route(
            "/exercises/{id}/overload-dimensions/{dimension_id}",
            post(routes::link_exercise_overload_dimension)
                .delete(routes::unlink_exercise_overload_dimension),
        )
        .route("/techniques", post(routes::create_technique).get(routes::list_techniques))
        .route(
            "/techniques/{id}",
            get(routes::get_technique)
                .put(routes::update_technique)
                .delete(routes::delete_technique),
        )
        .route("/techniques/{id}/exercises", get(routes::list_technique_exercises))
        .route("/techniques/{id}/instruments", get(routes::list_technique_instruments))
        .route(
            "/overload-dimensions",
            post(routes::create_overload_dimension).get(routes::list_overload_dimensions),
        )
        .route(
            "/overload-dimensions/{id}",
            get(routes::get_overload_dimension)
                .put(routes::update_overload_dimension)
                .delete(routes::delete_overload_dimension),
        )
        .route(
            "/overload-dimensions/{id}/exercises",
            get(routes::list_overload_dimension_exercises),
        )
        .route("/practices", post(routes::create_practice).get(routes::list_practices))
        .route(
            "/practices/{id}",
            get(routes::get_practice)
                .put(routes::update_practice)
                .delete(routes::delete_practice),
        )
        .route(
            "/practices/{id}/instances",
            post(routes::create_exercise_instance).get(routes::list_practice_instances),
        )
        .route(
            "/instances/{id}",
            get(routes::get_exercise_instance)
                .put(routes::update_exercise_instance)
                .delete(routes::delete_exercise_instance),
        )
        .route(
            "/instances/{id}/log",
            post(routes::create_exercise_log).get(routes::get_instance_log),
        )
        .route(
            "/logs/{id}",
            get(routes::get_exercise_log)
                .put(routes::update_exercise_log)
                .delete(routes::delete_exercise_log),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(port: u16, store: Store) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        store: Mutex::new(store),
    });
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
