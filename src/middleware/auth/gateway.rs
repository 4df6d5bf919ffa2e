//! Gateway identity headers → `Principal` を extensions に入れる
//!
//! - `X-User-ID` / `X-User-Role` はゲートウェイが認証済みの値として注入する前提
//! - どのピアがヘッダを主張してよいかは `TrustBoundary` で判定する
//! - 既に Principal が付与済みなら再抽出しない (リクエスト途中での権限変化を防ぐ)

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{ConnectInfo, Request, State},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::auth::{GatewayPolicy, RequestContext};

/// Attach the gateway extractor to every route of `router`.
///
/// 例：
/// ```ignore
/// let users = middleware::auth::gateway::apply(users, state.gateway.clone());
/// ```
pub fn apply<S>(router: Router<S>, policy: Arc<GatewayPolicy>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // route_layer: only matched routes are guarded, 404s stay 404
    router.route_layer(middleware::from_fn_with_state(policy, gateway_middleware))
}

async fn gateway_middleware(
    State(policy): State<Arc<GatewayPolicy>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.extensions().principal().is_some() {
        return Ok(next.run(req).await);
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let principal = policy.extract(req.headers(), peer).map_err(|err| {
        tracing::warn!(error = %err, peer = ?peer, "gateway identity rejected");
        AppError::from(err)
    })?;

    tracing::debug!(
        user_id = principal.id(),
        role = principal.role(),
        "principal attached"
    );

    // middleware → extractor への受け渡し
    req.extensions_mut().set_principal(principal);

    Ok(next.run(req).await)
}
