//! Shared test fixtures.

pub mod builder;
