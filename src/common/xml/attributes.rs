use crate::common::{Error, Result};
use quick_xml::events::BytesStart;

use super::escape::unescape_xml;

/// Ordered, unescaped attributes of a start tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    element: String,
    pairs: Vec<(String, String)>,
}

impl Attributes {
    /// Read every attribute of `e`.
    pub fn read(e: &BytesStart<'_>) -> Result<Self> {
        let element = std::str::from_utf8(e.name().as_ref())?.to_string();
        let mut pairs = Vec::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let value = unescape_xml(std::str::from_utf8(&attr.value)?);
            pairs.push((key, value));
        }
        Ok(Self { element, pairs })
    }

    #[inline]
    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a mandatory attribute.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| {
            Error::malformed(&self.element, format!("missing attribute '{}'", key))
        })
    }

    /// Parse an optional numeric attribute.
    pub fn parse_or<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.get(key) {
            None | Some("") => Ok(default),
            Some(v) => v.trim().parse().map_err(|_| {
                Error::malformed(&self.element, format!("invalid {} value '{}'", key, v))
            }),
        }
    }

    /// Parse an optional boolean attribute (`1`/`0`, `true`/`false`).
    pub fn flag(&self, key: &str) -> Result<bool> {
        match self.get(key) {
            None | Some("") => Ok(false),
            Some("1") | Some("true") | Some("True") => Ok(true),
            Some("0") | Some("false") | Some("False") => Ok(false),
            Some(v) => Err(Error::malformed(
                &self.element,
                format!("invalid {} value '{}'", key, v),
            )),
        }
    }

    /// Keys not in `known`, in document order.
    pub fn unknown<'a>(&'a self, known: &'a [&str]) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(move |k| !known.contains(k))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_unescapes_values() {
        let mut start = BytesStart::new("cell");
        start.push_attribute(("name", "a & b"));
        start.push_attribute(("n", "7"));
        let attrs = Attributes::read(&start).unwrap();
        assert_eq!(attrs.element(), "cell");
        assert_eq!(attrs.get("name"), Some("a & b"));
        assert_eq!(attrs.parse_or::<u32>("n", 0).unwrap(), 7);
        assert_eq!(attrs.parse_or::<u32>("missing", 3).unwrap(), 3);
        assert!(attrs.require("missing").is_err());
        assert_eq!(attrs.unknown(&["name"]).collect::<Vec<_>>(), vec!["n"]);
    }

    #[test]
    fn test_flag_values() {
        let mut start = BytesStart::new("table");
        start.push_attribute(("is_light", "1"));
        start.push_attribute(("bad", "yes"));
        let attrs = Attributes::read(&start).unwrap();
        assert!(attrs.flag("is_light").unwrap());
        assert!(!attrs.flag("absent").unwrap());
        assert!(attrs.flag("bad").is_err());
    }
}
