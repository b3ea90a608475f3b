use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthData {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

pub async fn health() -> Json<HealthData> {
    let health_data = HealthData {
        status: "healthy",
        service: "feature-flag-hub",
        version: env!("CARGO_PKG_VERSION"),
    };
    Json(health_data)
}
