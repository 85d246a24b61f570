//! Library integration tests running scripts from real directory trees.

mod executor_tests;
mod render_tests;
