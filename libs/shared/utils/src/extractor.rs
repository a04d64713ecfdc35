use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use shared_models::actor::{Actor, Role};
use shared_models::error::AppError;

/// Middleware resolving the upstream-authenticated identity headers into a
/// typed `Actor`. The gateway in front of this service validates credentials
/// and forwards `x-user-id` / `x-user-role`; everything past this point works
/// with the closed `Role` enum.
pub async fn actor_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = request
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| AppError::Auth("Missing or invalid x-user-id header".to_string()))?;

    let role = request
        .headers()
        .get("x-user-role")
        .and_then(|v| v.to_str().ok())
        .and_then(Role::parse)
        .ok_or_else(|| AppError::Auth("Missing or invalid x-user-role header".to_string()))?;

    request.extensions_mut().insert(Actor::new(user_id, role));

    Ok(next.run(request).await)
}
