//! Common test utilities for forum-composer E2E tests

#[allow(dead_code)]
pub mod forum;

pub use forum::*;
