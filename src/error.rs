/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - 認証・認可・入力検査・トークン発行のエラーを安定した code に写像する
 *
 * Notes
 * - client 由来の値 (攻撃ペイロードの可能性) は message に含めない。パラメータ名のみ。
 * - RoleLookupFailed / SigningFailed はサーバ側の障害。外部には汎用 500 を返し、詳細はログへ。
 */
use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::auth::context::ContextError;
use crate::services::auth::principal::IdentityError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Where an offending request parameter was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Query,
    Path,
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamLocation::Query => f.write_str("query"),
            ParamLocation::Path => f.write_str("path"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("malformed identity")]
    MalformedIdentity,
    #[error("forbidden")]
    Forbidden,
    #[error("conflict")]
    Conflict,
    #[error("invalid input detected in {location} parameter: {param}")]
    InvalidInput {
        location: ParamLocation,
        param: String,
    },
    #[error("role lookup failed")]
    RoleLookupFailed,
    #[error("token signing failed")]
    SigningFailed,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn invalid_input(location: ParamLocation, param: impl Into<String>) -> Self {
        Self::InvalidInput {
            location,
            param: param.into(),
        }
    }

    /// Stable machine-readable code for the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest { code, .. } => *code,
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::MalformedIdentity => "MALFORMED_IDENTITY",
            AppError::Forbidden => "FORBIDDEN",
            AppError::Conflict => "CONFLICT",
            AppError::InvalidInput { .. } => "INVALID_INPUT",
            AppError::RoleLookupFailed | AppError::SigningFailed | AppError::Internal => {
                "INTERNAL_SERVER_ERROR"
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } | AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Unauthenticated | AppError::MalformedIdentity => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::RoleLookupFailed | AppError::SigningFailed | AppError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match self {
            AppError::BadRequest { message, .. } => message,
            AppError::NotFound { resource } => format!("{resource} not found."),
            AppError::Unauthenticated => "missing or invalid user identity".into(),
            AppError::MalformedIdentity => "invalid user id format".into(),
            AppError::Forbidden => "insufficient permissions".into(),
            AppError::Conflict => "resource already exists".into(),
            e @ AppError::InvalidInput { .. } => e.to_string(),
            AppError::RoleLookupFailed | AppError::SigningFailed | AppError::Internal => {
                "internal server error".into()
            }
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::Conflict,
            RepoError::Db(err) => {
                tracing::error!(error = %err, "database error");
                AppError::Internal
            }
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::Missing | IdentityError::Untrusted | IdentityError::MissingRole => {
                AppError::Unauthenticated
            }
            IdentityError::Malformed => AppError::MalformedIdentity,
        }
    }
}

impl From<ContextError> for AppError {
    fn from(_: ContextError) -> Self {
        AppError::Unauthenticated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn invalid_input_names_parameter_only() {
        let (status, body) =
            body_json(AppError::invalid_input(ParamLocation::Query, "name")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        assert_eq!(
            body["error"]["message"],
            "invalid input detected in query parameter: name"
        );
    }

    #[tokio::test]
    async fn server_faults_are_generic() {
        for err in [AppError::RoleLookupFailed, AppError::SigningFailed] {
            let (status, body) = body_json(err).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
            assert_eq!(body["error"]["message"], "internal server error");
        }
    }

    #[tokio::test]
    async fn unique_violation_is_a_client_conflict() {
        let (status, body) = body_json(AppError::from(RepoError::Conflict)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[test]
    fn identity_errors_map_to_unauthorized_class() {
        assert_eq!(
            AppError::from(IdentityError::Missing).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(IdentityError::Malformed).code(),
            "MALFORMED_IDENTITY"
        );
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
    }
}
