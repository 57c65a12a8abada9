//! `boxoffice-auth` — pure authentication/authorization boundary.
//!
//! Decoupled from HTTP and storage. Token issuance lives elsewhere; this crate
//! only validates tokens and answers capability questions.

pub mod authorize;
pub mod claims;
pub mod principal;
pub mod roles;
pub mod validator;

pub use authorize::{AuthzError, authorize, ensure_owner_or_admin};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use principal::Principal;
pub use roles::{Capability, Role};
pub use validator::{Hs256JwtValidator, JwtError, JwtValidator};
