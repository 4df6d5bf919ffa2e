/*
 * Responsibility
 * - /users 系 handler (本人 or admin) と /admin/users 系 handler (admin のみ)
 * - Path/Json を extractor で受け、DTO validation → 所有権チェック → repo 呼び出し
 * - 認証・ロールは middleware 側で済んでいる前提。ここでは can_access だけ見る
 */
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::{
    api::v1::{
        dto::users::{CreateUserRequest, ListUsersQuery, UpdateUserRequest, UserResponse},
        extractors::{AuthCtx, UserIdPath},
    },
    error::AppError,
    repos::user_repo,
    services::{
        auth::{Principal, policy},
        security::sanitize,
    },
    state::AppState,
};

fn ensure_access(principal: &Principal, user_id: u32) -> Result<(), AppError> {
    if policy::can_access(principal, user_id) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = principal.id(),
            target_user_id = user_id,
            "access to another user's resource denied"
        );
        Err(AppError::Forbidden)
    }
}

pub async fn me(
    State(state): State<AppState>,
    AuthCtx(principal): AuthCtx,
) -> Result<Json<UserResponse>, AppError> {
    let row = user_repo::get(&state.db, i64::from(principal.id()))
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(row.into()))
}

pub async fn get_user(
    State(state): State<AppState>,
    AuthCtx(principal): AuthCtx,
    UserIdPath(user_id): UserIdPath,
) -> Result<Json<UserResponse>, AppError> {
    ensure_access(&principal, user_id)?;

    let row = user_repo::get(&state.db, i64::from(user_id))
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(row.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    AuthCtx(principal): AuthCtx,
    UserIdPath(user_id): UserIdPath,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    ensure_access(&principal, user_id)?;
    req.validate()
        .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;

    let row = user_repo::update(
        &state.db,
        i64::from(user_id),
        req.name.as_deref().map(str::trim),
        req.email.as_deref().map(str::trim),
    )
    .await?
    .ok_or(AppError::not_found("user"))?;

    Ok(Json(row.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AuthCtx(principal): AuthCtx,
    UserIdPath(user_id): UserIdPath,
) -> Result<StatusCode, AppError> {
    ensure_access(&principal, user_id)?;

    let deleted = user_repo::delete(&state.db, i64::from(user_id)).await?;
    if !deleted {
        return Err(AppError::not_found("user"));
    }

    // user_roles rows cascade with the user; drop the cached copy as well
    if let Some(cache) = &state.role_cache {
        cache.invalidate(user_id).await;
    }

    tracing::info!(user_id, deleted_by = principal.id(), "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    // input_guard already rejected known attack shapes; strip leftovers
    // before using the value as a search term (it is still bound, never spliced)
    let name = query
        .name
        .as_deref()
        .map(sanitize)
        .filter(|s| !s.is_empty());

    let rows = user_repo::list(&state.db, name.as_deref(), query.limit(), query.offset()).await?;

    Ok(Json(rows.into_iter().map(UserResponse::from).collect()))
}

pub async fn create_user(
    State(state): State<AppState>,
    AuthCtx(principal): AuthCtx,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;

    let row = user_repo::create(&state.db, req.name.trim(), req.email.trim()).await?;

    tracing::info!(user_id = row.id, created_by = principal.id(), "user created");
    Ok((StatusCode::CREATED, Json(row.into())))
}
