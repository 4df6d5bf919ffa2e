//! Read-through cache in front of a [`RoleLookup`].
//!
//! Cache failures never fail token issuance: they are logged and the lookup
//! falls through to the inner source (usually the database).

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::services::auth::token_issuer::{RoleLookup, RoleLookupError};
use crate::services::cache::{CacheClient, CacheError};

const KEY_PREFIX: &str = "roles:user";

pub struct CachedRoleLookup<C: CacheClient> {
    inner: Arc<dyn RoleLookup>,
    cache: C,
    ttl: Duration,
}

impl<C: CacheClient> CachedRoleLookup<C> {
    pub fn new(inner: Arc<dyn RoleLookup>, cache: C, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    fn key(user_id: u32) -> String {
        format!("{KEY_PREFIX}:{user_id}")
    }

    async fn cached(&self, key: &str) -> Result<Option<Vec<String>>, CacheError> {
        let Some(raw) = self.cache.get_string(key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| CacheError::InvalidValue(e.to_string()))
    }

    /// Drop the cached entry, e.g. after the user was deleted.
    pub async fn invalidate(&self, user_id: u32) {
        if let Err(err) = self.cache.del(&Self::key(user_id)).await {
            warn!(user_id, backend = self.cache.backend_name(), error = %err, "role cache invalidation failed");
        }
    }
}

#[async_trait]
impl<C: CacheClient> RoleLookup for CachedRoleLookup<C> {
    async fn roles_for_user(&self, user_id: u32) -> Result<Vec<String>, RoleLookupError> {
        let key = Self::key(user_id);

        match self.cached(&key).await {
            Ok(Some(roles)) => {
                debug!(user_id, "role cache hit");
                return Ok(roles);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(user_id, backend = self.cache.backend_name(), error = %err, "role cache read failed");
            }
        }

        let roles = self.inner.roles_for_user(user_id).await?;

        match serde_json::to_string(&roles) {
            Ok(raw) => {
                if let Err(err) = self.cache.set_string(&key, &raw, self.ttl).await {
                    warn!(user_id, backend = self.cache.backend_name(), error = %err, "role cache write failed");
                }
            }
            Err(err) => warn!(user_id, error = %err, "failed to encode roles for cache"),
        }

        Ok(roles)
    }
}
