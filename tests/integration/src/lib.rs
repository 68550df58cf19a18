//! Integration test utilities for the emotion map
//!
//! Runs the HTTP adapter, the map controller and the page controllers
//! against an in-process stub of the REST backend.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
