//! Request extractors that run before handler bodies.
//!
//! - [`auth::Authorized`] -- Resolves the caller or rejects the request.

pub mod auth;
