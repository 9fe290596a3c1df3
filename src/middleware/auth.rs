use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::jwt::verify_token;
use crate::error::AppError;

/// Identity of the caller, attached to the request by [`require_auth`].
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub username: String,
}

pub async fn require_auth(
    State(secret): State<Arc<str>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = match req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok()) {
        Some(h) => h,
        None => return unauthorized("Missing Authorization header"),
    };

    // Expect "Bearer <token>"
    let token = match auth_header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return unauthorized("Invalid Authorization format"),
    };

    let claims = match verify_token(token, &secret) {
        Ok(c) => c,
        Err(e) => return e.into_response(),
    };

    // Writes are never anonymous.
    let username = claims.sub.trim().to_string();
    if username.is_empty() {
        return unauthorized("Token carries no username");
    }

    req.extensions_mut().insert(AuthContext { username });

    next.run(req).await
}

fn unauthorized(msg: &str) -> Response {
    AppError::unauthorized(msg).into_response()
}
