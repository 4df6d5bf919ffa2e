use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::AppError;
use crate::repos::role_repo::RoleRepo;
use crate::services::auth::jwt::JwtIssuer;

pub const REFRESH_TOKEN_TYPE: &str = "refresh";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub jti: String,
}

/// Refresh assertion: no roles/claims payload, so it cannot act as an access
/// credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub jti: String,
}

/// Who the access token is about.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub user_id: u32,
    pub email: String,
    pub name: String,
}

/// Resolves role names for a user when the caller did not supply them.
#[async_trait]
pub trait RoleLookup: Send + Sync {
    async fn roles_for_user(&self, user_id: u32) -> Result<Vec<String>, RoleLookupError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RoleLookupError {
    #[error(transparent)]
    Repo(#[from] crate::repos::error::RepoError),
    #[error("role lookup timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
impl RoleLookup for RoleRepo {
    async fn roles_for_user(&self, user_id: u32) -> Result<Vec<String>, RoleLookupError> {
        Ok(self.list_names_for_user(i64::from(user_id)).await?)
    }
}

#[derive(Clone, Debug)]
pub struct IssuedTokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    jwt: JwtIssuer,
    roles: Option<Arc<dyn RoleLookup>>,
    lookup_timeout: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("jwt", &self.jwt)
            .field("role_lookup", &self.roles.is_some())
            .field("lookup_timeout", &self.lookup_timeout)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(
        jwt: JwtIssuer,
        roles: Option<Arc<dyn RoleLookup>>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            jwt,
            roles,
            lookup_timeout,
        }
    }

    /// Issue an access token.
    ///
    /// - `roles: None` resolves roles through the configured lookup (bounded by
    ///   `lookup_timeout`); without a lookup the role list is empty.
    /// - lookup failure or timeout fails the whole issuance.
    pub async fn issue_access_token(
        &self,
        subject: &TokenSubject,
        roles: Option<Vec<String>>,
    ) -> Result<String, AppError> {
        let roles = match roles {
            Some(roles) => roles,
            None => self.resolve_roles(subject.user_id).await?,
        };

        let now = chrono::Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: subject.user_id.to_string(),
            email: subject.email.clone(),
            name: subject.name.clone(),
            roles,
            iat: now,
            nbf: now,
            exp: now + self.jwt.access_ttl_seconds() as i64,
            jti: Uuid::new_v4().to_string(),
        };

        self.jwt.sign(&claims)
    }

    pub fn issue_refresh_token(&self, user_id: u32) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let claims = RefreshTokenClaims {
            sub: user_id.to_string(),
            token_type: REFRESH_TOKEN_TYPE.to_string(),
            iat: now,
            nbf: now,
            exp: now + self.jwt.refresh_ttl_seconds() as i64,
            jti: Uuid::new_v4().to_string(),
        };

        self.jwt.sign(&claims)
    }

    pub async fn issue_token_pair(
        &self,
        subject: &TokenSubject,
        roles: Option<Vec<String>>,
    ) -> Result<IssuedTokenPair, AppError> {
        let access_token = self.issue_access_token(subject, roles).await?;
        let refresh_token = self.issue_refresh_token(subject.user_id)?;

        Ok(IssuedTokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_in: self.jwt.access_ttl_seconds(),
        })
    }

    async fn resolve_roles(&self, user_id: u32) -> Result<Vec<String>, AppError> {
        let Some(lookup) = &self.roles else {
            debug!(user_id, "no role lookup configured, issuing token without roles");
            return Ok(Vec::new());
        };

        let res = tokio::time::timeout(self.lookup_timeout, lookup.roles_for_user(user_id))
            .await
            .unwrap_or(Err(RoleLookupError::Timeout(self.lookup_timeout)));

        res.map_err(|e| {
            error!(user_id, error = %e, "failed to fetch user roles");
            AppError::RoleLookupFailed
        })
    }
}
