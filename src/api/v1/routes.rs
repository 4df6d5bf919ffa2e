/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health (公開), /users (user|admin ロール), /admin (admin ロール) を nest
 * - 各グループのゲートは route_layer で適用する (未定義ルートは 404 のまま)
 *
 * Layer order (外側 → 内側)
 * - input_guard → gateway → require_authenticated → require_role → handler
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{
    auth::{
        gateway,
        rbac::{self, RbacConfigError, RequireRole},
    },
    input_guard,
};
use crate::services::auth::principal::{ROLE_ADMIN, ROLE_USER};
use crate::state::AppState;

use crate::api::v1::handlers::{
    health::health,
    tokens::issue_token,
    users::{create_user, delete_user, get_user, list_users, me, update_user},
};

pub fn routes(state: &AppState) -> Result<Router<AppState>, RbacConfigError> {
    // self or admin; ownership is checked in the handlers
    let users = Router::new()
        .route("/me", get(me))
        .route(
            "/{user_id}",
            get(get_user).put(update_user).delete(delete_user),
        );
    let users = rbac::require_role(users, RequireRole::any_of([ROLE_USER, ROLE_ADMIN])?);
    let users = rbac::require_authenticated(users);
    let users = gateway::apply(users, state.gateway.clone());

    let admin = Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{user_id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/tokens", post(issue_token));
    let admin = rbac::require_role(admin, RequireRole::admin());
    let admin = rbac::require_authenticated(admin);
    let admin = gateway::apply(admin, state.gateway.clone());

    let v1 = Router::new()
        .route("/health", get(health))
        .nest("/users", users)
        .nest("/admin", admin);

    Ok(input_guard::apply(v1, state.signatures.clone()))
}
