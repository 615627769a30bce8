//! Common types and utilities shared by the content model, the codec and the
//! node tree index.

// Submodule declarations
pub mod error;
pub mod id;
pub mod style;
pub mod xml;

// Re-exports for convenience
pub use error::{EncodeError, Error, Result};
pub use id::NodeId;
pub use style::{ColorDepth, RGBColor};
