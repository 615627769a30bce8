//! Configuration for the node markup codec.
//!
//! # Examples
//!
//! ```rust
//! use cherrytree_core::config::{CodecConfig, HeaderRow};
//!
//! // Create with defaults
//! let config = CodecConfig::default();
//!
//! // Or customize for files saved by the desktop application
//! let config = CodecConfig::new()
//!     .with_header_row(HeaderRow::Last)
//!     .with_strict_attributes(false);
//! ```

use crate::common::{Error, Result};
use serde::Deserialize;

/// Where a table's header row sits among its `row` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderRow {
    /// First `row` element is the header
    #[default]
    First,
    /// Last `row` element is the header (desktop application layout)
    Last,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Position of the header row on the wire
    pub header_row: HeaderRow,
    /// On-screen factor for stored column widths; never persisted
    pub display_scale: f32,
    /// Whether to emit the `<?xml ...?>` declaration
    pub xml_declaration: bool,
    /// Reject unknown attributes instead of skipping them with a warning
    pub strict_attributes: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            header_row: HeaderRow::First,
            display_scale: 1.2,
            xml_declaration: true,
            strict_attributes: true,
        }
    }
}

impl CodecConfig {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_header_row(mut self, header_row: HeaderRow) -> Self {
        self.header_row = header_row;
        self
    }

    /// Set the column width display factor.
    ///
    /// Only [`crate::content::Table::display_min`] and
    /// [`crate::content::Table::display_max`] use it.
    #[inline]
    pub fn with_display_scale(mut self, scale: f32) -> Self {
        self.display_scale = scale;
        self
    }

    #[inline]
    pub fn with_xml_declaration(mut self, emit: bool) -> Self {
        self.xml_declaration = emit;
        self
    }

    #[inline]
    pub fn with_strict_attributes(mut self, strict: bool) -> Self {
        self.strict_attributes = strict;
        self
    }

    /// Load a configuration from YAML; missing keys keep their defaults.
    ///
    /// ```rust
    /// use cherrytree_core::config::{CodecConfig, HeaderRow};
    ///
    /// let config = CodecConfig::from_yaml("header_row: last\n").unwrap();
    /// assert_eq!(config.header_row, HeaderRow::Last);
    /// assert!(config.strict_attributes);
    /// ```
    #[cfg(feature = "yaml")]
    pub fn from_yaml(source: &str) -> Result<Self> {
        let config: Self =
            serde_saphyr::from_str(source).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no codec run could use.
    pub fn validate(&self) -> Result<()> {
        if !(self.display_scale.is_finite() && self.display_scale > 0.0) {
            return Err(Error::Config(format!(
                "display_scale must be positive, got {}",
                self.display_scale
            )));
        }
        Ok(())
    }
}
