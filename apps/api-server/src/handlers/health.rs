//! Liveness and database health endpoints.

use actix_web::{HttpResponse, web};
use quill_shared::MessageResponse;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /
pub async fn hello() -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse::new("hello world"))
}

/// Round-trips to the database.
///
/// GET /ping
pub async fn ping(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    state.db.ping().await.map_err(|e| {
        tracing::error!("Database ping failed: {}", e);
        AppError::Unavailable("Database unreachable".to_string())
    })?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("pong")))
}
