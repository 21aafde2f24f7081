//! REST API gateway.

pub mod client;
pub mod routes;

pub use client::HttpEntityGateway;
