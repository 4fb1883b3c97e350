//! Integration tests for the inventory orchestrator.
//!
//! These tests drive [`inventory_authz::Resources`] end to end against the
//! in-memory store, with either the scripted authorizer or the REST
//! relations client pointed at a local mock server.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test integration
//!
//! # With orchestrator logs
//! RUST_LOG=inventory_authz=debug cargo test --test integration -- --nocapture
//! ```

mod common;
mod lifecycle_tests;
mod listing_tests;
mod permission_tests;
mod relations_tests;
