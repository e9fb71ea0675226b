use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SERVICE_NAME: &str = "signaling";

/// Liveness report
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub service: String,
    pub time: DateTime<Utc>,
}

pub async fn status() -> Json<StatusResponse> {
    tracing::debug!("Status requested");
    Json(StatusResponse {
        ok: true,
        service: SERVICE_NAME.to_string(),
        time: Utc::now(),
    })
}
