use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use tracing::error;

use crate::error::AppError;

/// HS256 signer shared by access and refresh tokens.
///
/// This service only signs. Verification belongs to whoever holds the shared
/// secret downstream (the gateway).
#[derive(Clone)]
pub struct JwtIssuer {
    encoding_key: EncodingKey,
    access_ttl_seconds: u64,
    refresh_ttl_seconds: u64,
}

impl std::fmt::Debug for JwtIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("JwtIssuer")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .finish()
    }
}

impl JwtIssuer {
    pub fn new(secret: &str, access_ttl_seconds: u64, refresh_ttl_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            access_ttl_seconds,
            refresh_ttl_seconds,
        }
    }

    pub fn access_ttl_seconds(&self) -> u64 {
        self.access_ttl_seconds
    }

    pub fn refresh_ttl_seconds(&self) -> u64 {
        self.refresh_ttl_seconds
    }

    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AppError> {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign JWT");
            AppError::SigningFailed
        })
    }
}
