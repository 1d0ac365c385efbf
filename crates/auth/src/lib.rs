//! `talentmatch-auth` — authenticated-caller identity boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models
//! the claims a verified bearer token carries and how they are validated.
//! Signup/signin/token issuance live in an external service.

pub mod claims;
pub mod validator;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use validator::{AuthError, Hs256JwtValidator, JwtValidator};
