//! Style value types shared by spans and the tree index.

// Submodule declarations
pub mod color;

// Re-exports
pub use color::{ColorDepth, RGBColor};
