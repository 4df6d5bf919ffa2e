/*
 * Responsibility
 * - Request Context Store: request.extensions() に Principal を載せる/読む
 * - getter はソフト (0 / "" を返す) と厳格 (Err) の二系統
 * - middleware / extractor / handler はすべてこの trait 経由で読む (重複ヘルパーを作らない)
 *
 * Notes
 * - extensions は request 単位なので同期は不要
 * - 型付きスロットなので「想定外の型が入っている」ケースは存在しない
 */
use axum::http::Extensions;
use thiserror::Error;

use crate::services::auth::principal::Principal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("user id not found in request context")]
    UserIdNotFound,
    #[error("user role not found in request context")]
    RoleNotFound,
}

pub trait RequestContext {
    /// Last write wins.
    fn set_principal(&mut self, principal: Principal);

    fn principal(&self) -> Option<&Principal>;

    /// `0` when no principal is attached.
    fn user_id(&self) -> u32 {
        self.principal().map(Principal::id).unwrap_or(0)
    }

    fn require_user_id(&self) -> Result<u32, ContextError> {
        match self.user_id() {
            0 => Err(ContextError::UserIdNotFound),
            id => Ok(id),
        }
    }

    /// `""` when no principal is attached.
    fn role(&self) -> &str {
        self.principal().map(Principal::role).unwrap_or("")
    }

    fn require_role(&self) -> Result<&str, ContextError> {
        match self.role() {
            "" => Err(ContextError::RoleNotFound),
            role => Ok(role),
        }
    }

    fn is_authenticated(&self) -> bool {
        self.user_id() != 0
    }
}

impl RequestContext for Extensions {
    fn set_principal(&mut self, principal: Principal) {
        self.insert(principal);
    }

    fn principal(&self) -> Option<&Principal> {
        self.get::<Principal>()
    }
}
