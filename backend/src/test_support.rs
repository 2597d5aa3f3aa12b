//! Test doubles and fixtures shared by unit tests (in `src/`) and integration
//! tests (in `tests/`). Compiled for tests and the `test-support` feature.

pub mod fixtures;
pub mod migrations;
