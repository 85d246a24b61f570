//! Shared utilities.
//!
//! Currently only in-memory collaborators for tests.

#[cfg(test)]
pub mod testutil;
