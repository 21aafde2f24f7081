//! End-to-end tests of the tree store over the in-memory gateway.

mod helpers;

mod config_test;
mod filter_test;
mod mutation_test;
mod store_test;
