/*
 * Responsibility
 * - GET /health (疎通用, 認証なし)
 * - gateway / RBAC の外側に置く。DB には触らない
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "service": env!("CARGO_PKG_NAME")})),
    )
}
