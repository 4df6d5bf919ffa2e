use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::principal::parse_user_id;

const INVALID_PATH: &str = "INVALID_PATH";

/// `Path<u32>` with the application's error body instead of axum's plain-text
/// rejection. `0` is never a user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserIdPath(pub u32);

impl<S> FromRequestParts<S> for UserIdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::bad_request(INVALID_PATH, "missing user id in path"))?;

        match parse_user_id(&raw) {
            Ok(0) | Err(_) => Err(AppError::bad_request(
                INVALID_PATH,
                "user id must be a positive 32-bit integer",
            )),
            Ok(id) => Ok(Self(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn echo(UserIdPath(id): UserIdPath) -> String {
        id.to_string()
    }

    async fn get_path(uri: &str) -> (StatusCode, Vec<u8>) {
        let app = Router::new().route("/users/{user_id}", get(echo));
        let res = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn parses_decimal_id() {
        let (status, body) = get_path("/users/42").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"42");
    }

    #[tokio::test]
    async fn bad_ids_use_error_body() {
        for uri in ["/users/abc", "/users/4294967296", "/users/+7", "/users/0"] {
            let (status, body) = get_path(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");

            let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(body["error"]["code"], "INVALID_PATH", "{uri}");
        }
    }
}
