//! In-memory entity gateway.

pub mod fixture;
pub mod store;

pub use fixture::{Fixture, FixtureFolder, FixtureKnowledgeBase};
pub use store::{GatewayCalls, MemoryEntityGateway, MemoryGatewayBuilder};
