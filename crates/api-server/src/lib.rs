//! HTTP server — public serving surface plus the mounted management API.

pub mod rest;
pub mod server;

pub use server::ApiServer;
