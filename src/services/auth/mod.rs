pub mod context;
pub mod jwt;
pub mod policy;
pub mod principal;
pub mod role_cache;
pub mod token_issuer;

pub use context::RequestContext;
pub use principal::{GatewayPolicy, Principal, TrustBoundary};
pub use token_issuer::{TokenIssuer, TokenSubject};
