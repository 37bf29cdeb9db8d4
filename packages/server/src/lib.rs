// Pawfinder - pet services marketplace API
//
// This crate provides the backend API for the marketplace: multi-channel
// authentication (password, phone OTP, Google, Apple), session issuance,
// profile/role management and admin moderation.
//
// Layout follows domain-driven design: SQL lives in domains/*/models,
// business logic in domain actions, HTTP wiring in server/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::Config;
