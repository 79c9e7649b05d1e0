//! Integration test crate for the gridbroker components.
//!
//! This crate exists solely to run integration tests that span multiple
//! crates. It has no public API; everything lives in `tests/`.

#![forbid(unsafe_code)]
