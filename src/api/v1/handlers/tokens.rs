use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::api::v1::dto::tokens::{IssueTokenRequest, TokenResponse};
use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::TokenSubject;
use crate::state::AppState;

/// `POST /admin/tokens`: mint an access + refresh pair for a user.
pub async fn issue_token(
    State(state): State<AppState>,
    AuthCtx(admin): AuthCtx,
    Json(req): Json<IssueTokenRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;

    let subject = TokenSubject {
        user_id: req.user_id,
        email: req.email.trim().to_string(),
        name: req.name.trim().to_string(),
    };

    let out = state.tokens.issue_token_pair(&subject, req.roles).await?;

    tracing::info!(
        user_id = subject.user_id,
        issued_by = admin.id(),
        "token pair issued"
    );

    Ok((
        StatusCode::OK,
        Json(TokenResponse {
            access_token: out.access_token,
            refresh_token: out.refresh_token,
            token_type: out.token_type.to_string(),
            expires_in: out.expires_in,
        }),
    ))
}
