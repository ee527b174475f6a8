//! Store connection lifecycle and schema

pub mod init;

pub use init::*;
