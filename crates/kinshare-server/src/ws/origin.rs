use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

/// Refuse signaling upgrades from browsers served by another origin.
/// Requests without an Origin header (native endpoints) pass through.
pub async fn origin_guard(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response> {
    if let Some(origin) = req.headers().get(header::ORIGIN) {
        let origin = origin
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Origin header".to_string()))?;

        if !state.config.allows_origin(origin) {
            return Err(AppError::OriginNotAllowed(origin.to_string()));
        }
    }

    Ok(next.run(req).await)
}
