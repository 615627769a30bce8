//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert errors raised by
//! the XML reader and payload decoding into the unified Error type.

use super::types::Error;
use quick_xml::errors::IllFormedError;

/// Markup that is not well-formed is a malformed document; only reader
/// failures (I/O, encoding) stay [`Error::Xml`].
impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::IllFormed(IllFormedError::MismatchedEndTag { ref expected, .. }) => {
                Error::malformed(expected.as_str(), err.to_string())
            },
            quick_xml::Error::IllFormed(_) | quick_xml::Error::Syntax(_) => {
                Error::malformed("node", err.to_string())
            },
            other => Error::Xml(other.to_string()),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::malformed("attribute", err.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::malformed("encoded_png", format!("invalid base64 payload: {}", err))
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::malformed("node", format!("invalid UTF-8: {}", err))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::malformed("node", format!("invalid UTF-8: {}", err))
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::malformed("attribute", format!("integer parsing error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_maps_to_malformed() {
        let err: Error = "x1".parse::<u32>().unwrap_err().into();
        assert!(matches!(err, Error::MalformedDocument { .. }));
    }

    #[test]
    fn test_ill_formed_markup_maps_to_malformed() {
        let mut reader = quick_xml::Reader::from_str("<node><rich_text>x</node>");
        let err = loop {
            match reader.read_event() {
                Ok(quick_xml::events::Event::Eof) => panic!("mismatch not reported"),
                Ok(_) => {},
                Err(e) => break Error::from(e),
            }
        };
        match err {
            Error::MalformedDocument { element, .. } => assert_eq!(element, "rich_text"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_base64_maps_to_malformed() {
        use base64::Engine;
        let err: Error = base64::engine::general_purpose::STANDARD
            .decode("***")
            .unwrap_err()
            .into();
        match err {
            Error::MalformedDocument { element, .. } => assert_eq!(element, "encoded_png"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
