//! HTTP API handlers for exm-api

pub mod admin;
pub mod artists;
pub mod contact;
pub mod health;
pub mod releases;
pub mod upload;

pub use admin::admin_routes;
pub use artists::artist_routes;
pub use contact::contact_routes;
pub use health::health_routes;
pub use releases::release_routes;
pub use upload::upload_routes;
