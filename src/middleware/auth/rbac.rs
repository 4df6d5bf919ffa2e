//! RBAC gates for route groups.
//!
//! Must run after the gateway extractor (`gateway::apply`) for the same
//! routes. Gates fail closed:
//! - no authenticated principal → 401
//! - role not in the required set → 403
//!
//! Route groups chain gates, e.g. the admin group is
//! `gateway` → `require_authenticated` → `RequireRole::admin()`.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::Extensions,
    middleware::{self, Next},
    response::Response,
};
use thiserror::Error;

use crate::error::AppError;
use crate::services::auth::principal::ROLE_ADMIN;
use crate::services::auth::{RequestContext, policy};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RbacConfigError {
    #[error("role gate requires at least one role")]
    EmptyRoleList,
}

/// Passes when the principal's role equals any of `roles` (ASCII case folded).
#[derive(Debug, Clone)]
pub struct RequireRole {
    roles: Arc<[String]>,
}

impl RequireRole {
    pub fn any_of<I, S>(roles: I) -> Result<Self, RbacConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles: Arc<[String]> = roles.into_iter().map(Into::into).collect();
        if roles.is_empty() {
            return Err(RbacConfigError::EmptyRoleList);
        }
        Ok(Self { roles })
    }

    pub fn admin() -> Self {
        Self {
            roles: Arc::from([ROLE_ADMIN.to_string()]),
        }
    }

    pub fn allows(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn check(&self, ext: &Extensions) -> Result<(), AppError> {
        let user_id = ext.require_user_id()?;
        let allowed = ext
            .principal()
            .is_some_and(|p| policy::roles(p).into_iter().any(|role| self.allows(role)));

        if !allowed {
            tracing::warn!(
                user_id,
                role = ext.role(),
                required = ?self.roles,
                "insufficient permissions"
            );
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}

/// "principal attached" gate.
pub fn require_authenticated<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn(authenticated_middleware))
}

pub fn require_role<S>(router: Router<S>, gate: RequireRole) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(gate, role_middleware))
}

async fn authenticated_middleware(req: Request, next: Next) -> Result<Response, AppError> {
    if !req.extensions().is_authenticated() {
        return Err(AppError::Unauthenticated);
    }
    Ok(next.run(req).await)
}

async fn role_middleware(
    State(gate): State<RequireRole>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    gate.check(req.extensions())?;
    Ok(next.run(req).await)
}
