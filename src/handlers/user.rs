use axum::{Extension, Json};

use crate::dtos::commission::MeResponse;
use crate::middleware::auth::AuthContext;

// GET /me - Acting username as resolved from the bearer token
pub async fn get_me(Extension(auth): Extension<AuthContext>) -> Json<MeResponse> {
    Json(MeResponse { username: auth.username })
}
