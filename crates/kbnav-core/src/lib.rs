//! # kbnav-core
//!
//! Core crate for kbnav. Contains configuration schemas, typed
//! identifiers, node keys, tree events, pagination types, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other kbnav crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
