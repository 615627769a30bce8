//! Element and attribute names of the node markup dialect.
//!
//! Attribute lists are in emission order; that order is part of the
//! compatibility contract with files written by the desktop application.

use phf::{Map, phf_map};

// ============================================================================
// ELEMENTS
// ============================================================================

pub const NODE: &str = "node";
pub const RICH_TEXT: &str = "rich_text";
pub const ENCODED_PNG: &str = "encoded_png";
pub const CODEBOX: &str = "codebox";
pub const TABLE: &str = "table";
pub const ROW: &str = "row";
pub const CELL: &str = "cell";

/// XML declaration written before the root element
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

// ============================================================================
// ATTRIBUTES
// ============================================================================

pub const ATTR_WEIGHT: &str = "weight";
pub const ATTR_STYLE: &str = "style";
pub const ATTR_UNDERLINE: &str = "underline";
pub const ATTR_STRIKETHROUGH: &str = "strikethrough";
pub const ATTR_SCALE: &str = "scale";
pub const ATTR_FOREGROUND: &str = "foreground";
pub const ATTR_BACKGROUND: &str = "background";
pub const ATTR_FAMILY: &str = "family";
pub const ATTR_LINK: &str = "link";
pub const ATTR_JUSTIFICATION: &str = "justification";

pub const ATTR_CHAR_OFFSET: &str = "char_offset";
pub const ATTR_ANCHOR: &str = "anchor";
pub const ATTR_FILENAME: &str = "filename";
pub const ATTR_TIME: &str = "time";

pub const ATTR_FRAME_WIDTH: &str = "frame_width";
pub const ATTR_FRAME_HEIGHT: &str = "frame_height";
pub const ATTR_WIDTH_IN_PIXELS: &str = "width_in_pixels";
pub const ATTR_SYNTAX_HIGHLIGHTING: &str = "syntax_highlighting";
pub const ATTR_HIGHLIGHT_BRACKETS: &str = "highlight_brackets";
pub const ATTR_SHOW_LINE_NUMBERS: &str = "show_line_numbers";

pub const ATTR_COL_MIN: &str = "col_min";
pub const ATTR_COL_MAX: &str = "col_max";
pub const ATTR_COL_WIDTHS: &str = "col_widths";
pub const ATTR_IS_LIGHT: &str = "is_light";

/// `rich_text` attributes in emission order.
pub const RICH_TEXT_ATTRS: [&str; 10] = [
    ATTR_WEIGHT,
    ATTR_STYLE,
    ATTR_UNDERLINE,
    ATTR_STRIKETHROUGH,
    ATTR_SCALE,
    ATTR_FOREGROUND,
    ATTR_BACKGROUND,
    ATTR_FAMILY,
    ATTR_LINK,
    ATTR_JUSTIFICATION,
];

/// `encoded_png` attributes (anchor, file and image forms together).
pub const ENCODED_PNG_ATTRS: [&str; 6] = [
    ATTR_CHAR_OFFSET,
    ATTR_JUSTIFICATION,
    ATTR_ANCHOR,
    ATTR_FILENAME,
    ATTR_LINK,
    ATTR_TIME,
];

/// `codebox` attributes in emission order.
pub const CODEBOX_ATTRS: [&str; 8] = [
    ATTR_CHAR_OFFSET,
    ATTR_JUSTIFICATION,
    ATTR_FRAME_WIDTH,
    ATTR_FRAME_HEIGHT,
    ATTR_WIDTH_IN_PIXELS,
    ATTR_SYNTAX_HIGHLIGHTING,
    ATTR_HIGHLIGHT_BRACKETS,
    ATTR_SHOW_LINE_NUMBERS,
];

/// `table` attributes in emission order.
pub const TABLE_ATTRS: [&str; 6] = [
    ATTR_CHAR_OFFSET,
    ATTR_JUSTIFICATION,
    ATTR_COL_MIN,
    ATTR_COL_MAX,
    ATTR_COL_WIDTHS,
    ATTR_IS_LIGHT,
];

// ============================================================================
// VALUES
// ============================================================================

pub const WEIGHT_HEAVY: &str = "heavy";
pub const STYLE_ITALIC: &str = "italic";
pub const UNDERLINE_SINGLE: &str = "single";
pub const STRIKETHROUGH_TRUE: &str = "true";
pub const FAMILY_MONOSPACE: &str = "monospace";

/// `filename` marking an `encoded_png` as a LaTeX formula
pub const FORMULA_FILENAME: &str = "__ct_special.tex";

/// Link target prefixes
pub const LINK_NODE: &str = "node";
pub const LINK_FILE: &str = "file";
pub const LINK_FOLDER: &str = "fold";
pub const LINK_WEB: &str = "webs";

/// `scale` value of a span, before it becomes a span kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Superscript,
    Subscript,
    Small,
    Heading(u8),
}

/// `scale` attribute values.
pub static SCALE_VALUES: Map<&'static str, Scale> = phf_map! {
    "sup" => Scale::Superscript,
    "sub" => Scale::Subscript,
    "small" => Scale::Small,
    "h1" => Scale::Heading(1),
    "h2" => Scale::Heading(2),
    "h3" => Scale::Heading(3),
    "h4" => Scale::Heading(4),
    "h5" => Scale::Heading(5),
    "h6" => Scale::Heading(6),
};
