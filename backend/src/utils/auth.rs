// src/utils/auth.rs

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, utils::hash::AdminCredential};

/// Header carrying the shared admin password.
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Axum Middleware: Admin Authorization.
///
/// Checks the `x-admin-password` header against the configured credential.
/// Missing header, wrong password, or no configured password all yield 401.
pub async fn admin_middleware(
    State(credential): State<AdminCredential>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let attempt = req
        .headers()
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::AuthError("Enter admin password to continue.".to_string()))?;

    if !credential.verify(attempt)? {
        tracing::warn!("Rejected admin request with wrong password");
        return Err(AppError::AuthError("Wrong admin password".to_string()));
    }

    Ok(next.run(req).await)
}
