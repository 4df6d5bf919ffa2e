/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - db: PgPool, tokens: TokenIssuer, gateway: GatewayPolicy, signatures など
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use sqlx::PgPool;

use crate::services::auth::role_cache::CachedRoleLookup;
use crate::services::auth::{GatewayPolicy, TokenIssuer};
use crate::services::cache::ValkeyClient;
use crate::services::security::AttackSignatures;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub tokens: Arc<TokenIssuer>,
    pub gateway: Arc<GatewayPolicy>,
    pub signatures: Arc<AttackSignatures>,
    /// Present only when REDIS_URL is configured.
    pub role_cache: Option<Arc<CachedRoleLookup<ValkeyClient>>>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        tokens: Arc<TokenIssuer>,
        gateway: Arc<GatewayPolicy>,
        signatures: Arc<AttackSignatures>,
        role_cache: Option<Arc<CachedRoleLookup<ValkeyClient>>>,
    ) -> Self {
        Self {
            db,
            tokens,
            gateway,
            signatures,
            role_cache,
        }
    }
}
