// Library exports for the community board.
// Integration tests and the binary both build on these modules.

pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
