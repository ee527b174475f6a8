//! Catalog persistence
//!
//! Entity reads and writes, counter aggregation and admin statistics over
//! the SQLite store.

pub mod aggregate;
pub mod artists;
pub mod releases;
pub mod rows;
pub mod stats;
