//! # kbnav-gateway
//!
//! Entity gateway implementations for kbnav. Supports two modes:
//!
//! - **http**: the knowledge-base REST API, via [reqwest](https://crates.io/crates/reqwest)
//! - **memory**: an in-process model of the same API, used for tests,
//!   demos, and offline work from a JSON fixture
//!
//! The provider is selected at runtime based on configuration.

#[cfg(feature = "http-backend")]
pub mod http;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
pub mod traits;

pub use provider::GatewayManager;
pub use traits::{Endpoint, EntityGateway};
