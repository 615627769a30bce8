//! XML text helpers shared by the codec and the tree document loader.

mod attributes;
mod escape;

pub use attributes::Attributes;
pub use escape::{escape_attr, escape_text, resolve_reference, unescape_xml};
