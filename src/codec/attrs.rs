//! Mapping between `rich_text` attributes and span kinds.

use super::constants::*;
use crate::common::xml::Attributes;
use crate::common::{Error, NodeId, RGBColor, Result};
use crate::content::{Justification, SpanKind};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Handle an attribute (or value) the codec does not know.
pub(crate) fn unknown_attr(element: &str, key: &str, value: &str, strict: bool) -> Result<()> {
    if strict {
        return Err(Error::malformed(
            element,
            format!("unsupported attribute {}=\"{}\"", key, value),
        ));
    }
    log::warn!(
        "event=skip_attribute element={} key={} value={}",
        element,
        key,
        value
    );
    Ok(())
}

/// Read the spans of a `rich_text` element.
pub(crate) fn parse_rich_text(attrs: &Attributes, strict: bool) -> Result<Vec<SpanKind>> {
    let mut kinds = Vec::new();
    for (key, value) in attrs.iter() {
        if value.is_empty() {
            continue;
        }
        let kind = match (key, value) {
            (ATTR_WEIGHT, WEIGHT_HEAVY) => SpanKind::Bold,
            (ATTR_STYLE, STYLE_ITALIC) => SpanKind::Italic,
            (ATTR_UNDERLINE, UNDERLINE_SINGLE) => SpanKind::Underline,
            (ATTR_STRIKETHROUGH, STRIKETHROUGH_TRUE) => SpanKind::Strikethrough,
            (ATTR_FAMILY, FAMILY_MONOSPACE) => SpanKind::Monospace,
            (ATTR_SCALE, v) if SCALE_VALUES.contains_key(v) => match SCALE_VALUES[v] {
                Scale::Superscript => SpanKind::Superscript,
                Scale::Subscript => SpanKind::Subscript,
                Scale::Small => SpanKind::Small,
                Scale::Heading(n) => SpanKind::Heading(n),
            },
            (ATTR_FOREGROUND, v) => SpanKind::Foreground(parse_color(v)?),
            (ATTR_BACKGROUND, v) => SpanKind::Background(parse_color(v)?),
            (ATTR_LINK, v) => parse_link(v)?,
            (ATTR_JUSTIFICATION, v) => SpanKind::Justify(Justification::parse(v)?),
            (k, v) => {
                unknown_attr(RICH_TEXT, k, v, strict)?;
                continue;
            },
        };
        kinds.push(kind);
    }
    Ok(kinds)
}

fn parse_color(value: &str) -> Result<RGBColor> {
    RGBColor::from_hex(value)
        .ok_or_else(|| Error::malformed(RICH_TEXT, format!("invalid color '{}'", value)))
}

/// Parse a `link` value (`node 12 anchor`, `file <b64>`, `fold <b64>`, `webs <url>`).
pub fn parse_link(value: &str) -> Result<SpanKind> {
    let (kind, target) = value
        .split_once(' ')
        .ok_or_else(|| Error::malformed(RICH_TEXT, format!("invalid link '{}'", value)))?;
    match kind {
        LINK_NODE => {
            let (id, anchor) = match target.split_once(' ') {
                Some((id, anchor)) => (id, Some(anchor.to_string())),
                None => (target, None),
            };
            let node: NodeId = id.parse()?;
            Ok(SpanKind::LinkNode { node, anchor })
        },
        LINK_FILE => Ok(SpanKind::LinkFile(decode_path(target)?)),
        LINK_FOLDER => Ok(SpanKind::LinkFolder(decode_path(target)?)),
        LINK_WEB => Ok(SpanKind::LinkWeb(target.to_string())),
        other => Err(Error::malformed(
            RICH_TEXT,
            format!("unknown link type '{}'", other),
        )),
    }
}

/// Format a link span as its `link` value; `None` for other kinds.
pub fn format_link(kind: &SpanKind) -> Option<String> {
    match kind {
        SpanKind::LinkNode { node, anchor: None } => Some(format!("{} {}", LINK_NODE, node)),
        SpanKind::LinkNode {
            node,
            anchor: Some(anchor),
        } => Some(format!("{} {} {}", LINK_NODE, node, anchor)),
        SpanKind::LinkFile(path) => Some(format!("{} {}", LINK_FILE, STANDARD.encode(path))),
        SpanKind::LinkFolder(path) => Some(format!("{} {}", LINK_FOLDER, STANDARD.encode(path))),
        SpanKind::LinkWeb(url) => Some(format!("{} {}", LINK_WEB, url)),
        _ => None,
    }
}

fn decode_path(b64: &str) -> Result<String> {
    let bytes = STANDARD.decode(b64.trim())?;
    Ok(String::from_utf8(bytes)?)
}

/// Attributes of a `rich_text` element covered by `kinds`, in emission order.
///
/// `kinds` must hold at most one kind per slot and no codebox.
pub(crate) fn rich_text_attrs(kinds: &[&SpanKind]) -> Vec<(&'static str, String)> {
    let mut sorted: Vec<&SpanKind> = kinds.to_vec();
    sorted.sort_by_key(|k| k.slot());
    let mut out = Vec::with_capacity(sorted.len());
    for kind in sorted {
        let pair = match kind {
            SpanKind::Bold => (ATTR_WEIGHT, WEIGHT_HEAVY.to_string()),
            SpanKind::Italic => (ATTR_STYLE, STYLE_ITALIC.to_string()),
            SpanKind::Underline => (ATTR_UNDERLINE, UNDERLINE_SINGLE.to_string()),
            SpanKind::Strikethrough => (ATTR_STRIKETHROUGH, STRIKETHROUGH_TRUE.to_string()),
            SpanKind::Superscript => (ATTR_SCALE, "sup".to_string()),
            SpanKind::Subscript => (ATTR_SCALE, "sub".to_string()),
            SpanKind::Small => (ATTR_SCALE, "small".to_string()),
            SpanKind::Heading(n) => (ATTR_SCALE, format!("h{}", n)),
            SpanKind::Foreground(c) => (ATTR_FOREGROUND, c.to_hex()),
            SpanKind::Background(c) => (ATTR_BACKGROUND, c.to_hex()),
            SpanKind::Monospace => (ATTR_FAMILY, FAMILY_MONOSPACE.to_string()),
            SpanKind::LinkNode { .. }
            | SpanKind::LinkFile(_)
            | SpanKind::LinkFolder(_)
            | SpanKind::LinkWeb(_) => match format_link(kind) {
                Some(link) => (ATTR_LINK, link),
                None => continue,
            },
            SpanKind::Justify(j) => (ATTR_JUSTIFICATION, j.as_str().to_string()),
            SpanKind::Codebox(_) => continue,
        };
        out.push(pair);
    }
    out
}
