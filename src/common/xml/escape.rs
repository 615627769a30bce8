use aho_corasick::{AhoCorasick, MatchKind};
use once_cell::sync::Lazy;

// Static initialization: automatons are built only once, thread-safe
static TEXT_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\r"])
        .expect("Failed to build XML text escaper")
});

// Attribute values are whitespace-normalized by readers, so line breaks and
// tabs must travel as character references.
static ATTR_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'", "\n", "\r", "\t"])
        .expect("Failed to build XML attribute escaper")
});

// Use LeftmostLongest to ensure longer entities are matched first (e.g., &amp; instead of &lt;)
static XML_UNESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
        .expect("Failed to build XML unescaper")
});

/// Escape character data for use between tags.
///
/// # Examples
///
/// ```
/// use cherrytree_core::common::xml::escape_text;
/// assert_eq!(escape_text("a & b"), "a &amp; b");
/// assert_eq!(escape_text("\"quoted\" <tag>"), "\"quoted\" &lt;tag&gt;");
/// ```
#[inline]
pub fn escape_text(s: &str) -> String {
    TEXT_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&#13;"])
}

/// Escape a value for use inside a double-quoted attribute.
///
/// # Examples
///
/// ```
/// use cherrytree_core::common::xml::escape_attr;
/// assert_eq!(escape_attr("a\"b"), "a&quot;b");
/// assert_eq!(escape_attr("line\nbreak"), "line&#10;break");
/// ```
#[inline]
pub fn escape_attr(s: &str) -> String {
    ATTR_ESCAPER.replace_all(
        s,
        &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;", "&#10;", "&#13;", "&#9;"],
    )
}

/// Unescape XML special characters.
///
/// Replaces the five standard XML entities and decimal/hex character
/// references with their corresponding characters. Unknown or malformed
/// references are left unchanged.
///
/// # Examples
///
/// ```
/// use cherrytree_core::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(unescape_xml("a&#10;b&#x41;"), "a\nbA");
/// assert_eq!(unescape_xml("&amp;lt;"), "&lt;"); // &amp; is matched first
/// assert_eq!(unescape_xml("&invalid;"), "&invalid;"); // unknown entity
/// ```
pub fn unescape_xml(s: &str) -> String {
    if memchr::memchr(b'&', s.as_bytes()).is_none() {
        return s.to_string();
    }
    if !s.contains("&#") {
        return XML_UNESCAPER.replace_all(s, &["&", "<", ">", "\"", "'"]);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match tail.find(';').and_then(|end| resolve_reference(&tail[1..end]).map(|c| (c, end))) {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            },
        }
    }
    out.push_str(rest);
    out
}

/// Resolve the body of a reference (without `&` and `;`) to a character.
pub fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_keeps_quotes_and_newlines() {
        assert_eq!(escape_text("it's \"fine\"\n"), "it's \"fine\"\n");
        assert_eq!(escape_text("a\r\nb"), "a&#13;\nb");
    }

    #[test]
    fn test_attr_roundtrip() {
        let raw = "tab\there & <now>\n'q'";
        assert_eq!(unescape_xml(&escape_attr(raw)), raw);
    }

    #[test]
    fn test_unescape_leaves_garbage() {
        assert_eq!(unescape_xml("a & b"), "a & b");
        assert_eq!(unescape_xml("&#xZZ;"), "&#xZZ;");
        assert_eq!(unescape_xml("&amp"), "&amp");
    }
}
