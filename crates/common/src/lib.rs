//! Shared helpers for the identity workspace.

pub mod utils;
