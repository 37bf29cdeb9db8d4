//! Multi-channel authentication.
//!
//! Four independent proof-of-identity channels (password, phone OTP, Google
//! access token, Apple identity token) that all converge on the same signed
//! session artifact minted by [`jwt::JwtService`]. The bridge module carries
//! that artifact across execution contexts (browser cookie vs. native shell).

pub mod bridge;
pub mod error;
pub mod jwt;
pub mod models;
pub mod oauth;
pub mod otp;
pub mod password;

pub use error::AuthFlowError;
pub use jwt::{JwtService, SessionClaims};
