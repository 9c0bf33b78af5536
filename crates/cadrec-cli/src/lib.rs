//! Shared CLI infrastructure, usable from integration tests.

pub mod logging;
