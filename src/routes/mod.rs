use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;

mod flags;
mod health;

pub use health::health;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    let flag_router = Router::new()
        .route("/", post(flags::routes::create).get(flags::routes::list))
        .route("/evaluate", get(flags::routes::evaluate))
        .route(
            "/{flag_name}",
            get(flags::routes::get).put(flags::routes::update),
        );

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/flags", flag_router)
        .layer(CorsLayer::permissive())
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Feature Flag Hub API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
