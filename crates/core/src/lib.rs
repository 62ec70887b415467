//! Domain types for the movie catalogue.
//!
//! This crate has no internal dependencies so it can be shared by the
//! repository layer, the HTTP API, and the offline loader.

pub mod error;
pub mod filter;
pub mod movie;
pub mod pagination;
pub mod types;
