//! # Excess Music Common Library
//!
//! Shared code for the Excess Music catalog service:
//! - Error type and result alias
//! - Configuration loading (CLI / environment / TOML / defaults)
//! - Store connection lifecycle and schema
//! - Catalog domain models (artists, releases, tracks)
//! - Slug derivation
//! - Signed admin tokens and the JSON response envelope

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod slug;
pub mod time;

pub use error::{Error, Result};
