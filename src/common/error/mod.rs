//! Unified error types for the content core.
//!
//! This module provides one error type covering decode, edit and encode
//! failures, presenting a consistent API to callers.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{EncodeError, Error, Result};
