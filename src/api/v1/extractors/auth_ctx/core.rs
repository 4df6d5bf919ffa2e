use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::{Principal, RequestContext};

/// Handler で Principal を受け取るための extractor
/// gateway middleware が Principal を request.extensions() に insert 済みである前提
/// id / role のどちらかが欠けている (または id == 0) 場合は 401 を返す（ミドルウェア未設定など）
#[derive(Debug, Clone)]
pub struct AuthCtx(pub Principal);

impl<S> FromRequestParts<S> for AuthCtx
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ext = &parts.extensions;
        ext.require_user_id()?;
        ext.require_role()?;

        ext.principal()
            .cloned()
            .map(AuthCtx)
            .ok_or(AppError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(principal: Option<Principal>) -> Result<AuthCtx, AppError> {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        if let Some(p) = principal {
            parts.extensions.set_principal(p);
        }
        AuthCtx::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn attached_principal_is_returned() {
        let AuthCtx(p) = extract(Some(Principal::new(5, "user"))).await.unwrap();
        assert_eq!(p, Principal::new(5, "user"));
    }

    #[tokio::test]
    async fn incomplete_identity_is_unauthenticated() {
        for principal in [None, Some(Principal::new(0, "user")), Some(Principal::new(5, ""))] {
            assert!(matches!(
                extract(principal).await,
                Err(AppError::Unauthenticated)
            ));
        }
    }
}
