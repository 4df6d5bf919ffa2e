//! Gateway identity headers → `Principal`.
//!
//! The gateway in front of this service authenticates the caller and injects
//! `X-User-ID` / `X-User-Role`. This module trusts those headers completely;
//! whether a request is allowed to carry them at all is decided by
//! [`TrustBoundary`] before extraction runs.

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;
use thiserror::Error;

pub const HEADER_USER_ID: &str = "x-user-id";
pub const HEADER_USER_ROLE: &str = "x-user-role";

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("missing user id header")]
    Missing,
    #[error("invalid user id format")]
    Malformed,
    #[error("missing user role header")]
    MissingRole,
    #[error("identity headers from untrusted peer")]
    Untrusted,
}

/// The authenticated identity for the current request.
///
/// - `id == 0` means "no principal" for the purposes of [`crate::services::auth::context`]
/// - exactly one role; casing is preserved, comparisons fold case
/// - immutable after construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    id: u32,
    role: String,
}

impl Principal {
    pub fn new(id: u32, role: impl Into<String>) -> Self {
        Self {
            id,
            role: role.into(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    /// Header Extractor.
    ///
    /// - `X-User-ID` missing/empty → [`IdentityError::Missing`]
    /// - not a plain decimal `u32` → [`IdentityError::Malformed`]
    /// - `X-User-Role` missing/empty → `"user"`, unless `require_role` is set
    pub fn from_headers(headers: &HeaderMap, require_role: bool) -> Result<Self, IdentityError> {
        let raw_id = headers
            .get(HEADER_USER_ID)
            .ok_or(IdentityError::Missing)?
            .to_str()
            .map_err(|_| IdentityError::Malformed)?;

        if raw_id.is_empty() {
            return Err(IdentityError::Missing);
        }
        let id = parse_user_id(raw_id)?;

        let role = headers
            .get(HEADER_USER_ROLE)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let role = match role {
            Some(role) => role.to_string(),
            None if require_role => return Err(IdentityError::MissingRole),
            None => ROLE_USER.to_string(),
        };

        Ok(Self::new(id, role))
    }
}

/// Decimal `u32`, digits only (no sign, no whitespace).
pub fn parse_user_id(raw: &str) -> Result<u32, IdentityError> {
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdentityError::Malformed);
    }
    raw.parse::<u32>().map_err(|_| IdentityError::Malformed)
}

/// Which TCP peers are allowed to assert identity headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TrustBoundary {
    /// Every peer is the gateway (network perimeter guarantees it).
    #[default]
    Gateway,
    /// Only these peer addresses may carry identity headers.
    Peers(Vec<IpAddr>),
}

impl TrustBoundary {
    pub fn from_peers(peers: Vec<IpAddr>) -> Self {
        if peers.is_empty() {
            Self::Gateway
        } else {
            Self::Peers(peers)
        }
    }

    /// `peer` is `None` when the server was not started with connect info.
    pub fn admits(&self, peer: Option<SocketAddr>) -> bool {
        match self {
            TrustBoundary::Gateway => true,
            TrustBoundary::Peers(allowed) => {
                peer.is_some_and(|addr| allowed.iter().any(|ip| *ip == addr.ip()))
            }
        }
    }
}

/// Process-wide, read-only settings for the header extractor.
#[derive(Debug, Clone, Default)]
pub struct GatewayPolicy {
    pub trust: TrustBoundary,
    pub require_role: bool,
}

impl GatewayPolicy {
    pub fn extract(
        &self,
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
    ) -> Result<Principal, IdentityError> {
        if !self.trust.admits(peer) {
            return Err(IdentityError::Untrusted);
        }
        Principal::from_headers(headers, self.require_role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use proptest::prelude::*;

    fn headers(id: Option<&str>, role: Option<&str>) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Some(id) = id {
            h.insert(HEADER_USER_ID, HeaderValue::from_str(id).unwrap());
        }
        if let Some(role) = role {
            h.insert(HEADER_USER_ROLE, HeaderValue::from_str(role).unwrap());
        }
        h
    }

    #[test]
    fn missing_id_is_unauthenticated() {
        assert_eq!(
            Principal::from_headers(&headers(None, Some("admin")), false),
            Err(IdentityError::Missing)
        );
        assert_eq!(
            Principal::from_headers(&headers(Some(""), None), false),
            Err(IdentityError::Missing)
        );
    }

    #[test]
    fn role_defaults_to_user() {
        let p = Principal::from_headers(&headers(Some("7"), None), false).unwrap();
        assert_eq!(p, Principal::new(7, "user"));

        let p = Principal::from_headers(&headers(Some("7"), Some("")), false).unwrap();
        assert_eq!(p.role(), "user");
    }

    #[test]
    fn role_casing_is_preserved() {
        let p = Principal::from_headers(&headers(Some("1"), Some("Admin")), false).unwrap();
        assert_eq!(p.role(), "Admin");
    }

    #[test]
    fn strict_mode_rejects_missing_role() {
        assert_eq!(
            Principal::from_headers(&headers(Some("7"), None), true),
            Err(IdentityError::MissingRole)
        );
    }

    #[test]
    fn rejects_signs_and_overflow() {
        for raw in ["+7", "-1", "4294967296", "7 ", "0x10", "1e3"] {
            assert_eq!(
                parse_user_id(raw),
                Err(IdentityError::Malformed),
                "input: {raw:?}"
            );
        }
        assert_eq!(parse_user_id("4294967295"), Ok(u32::MAX));
        assert_eq!(parse_user_id("0"), Ok(0));
    }

    #[test]
    fn peer_allow_list() {
        let trusted: IpAddr = "10.0.0.2".parse().unwrap();
        let policy = GatewayPolicy {
            trust: TrustBoundary::from_peers(vec![trusted]),
            require_role: false,
        };
        let h = headers(Some("3"), Some("admin"));

        assert!(
            policy
                .extract(&h, Some(SocketAddr::new(trusted, 4000)))
                .is_ok()
        );
        assert_eq!(
            policy.extract(&h, Some("10.0.0.9:4000".parse().unwrap())),
            Err(IdentityError::Untrusted)
        );
        assert_eq!(policy.extract(&h, None), Err(IdentityError::Untrusted));
        assert_eq!(TrustBoundary::from_peers(vec![]), TrustBoundary::Gateway);
    }

    proptest! {
        #[test]
        fn any_u32_round_trips(id in any::<u32>()) {
            let p = Principal::from_headers(&headers(Some(&id.to_string()), None), false).unwrap();
            prop_assert_eq!(p.id(), id);
        }

        #[test]
        fn non_numeric_is_malformed(raw in "[a-zA-Z_.:/ -]{1,16}") {
            prop_assume!(!raw.trim().is_empty());
            let raw = raw.trim();
            prop_assert_eq!(
                Principal::from_headers(&headers(Some(raw), None), false),
                Err(IdentityError::Malformed)
            );
        }
    }
}
