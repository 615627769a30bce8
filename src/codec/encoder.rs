//! [`ContentBlockModel`] → node markup.
//!
//! Each text block is cut at every span and object boundary. A segment
//! becomes a `rich_text` carrying the attributes of the spans covering it,
//! except codebox spans, which are written whole as a `codebox`. Objects at
//! offset `k` follow the segment ending at `k`. Tables are written with
//! `char_offset` equal to the length of the text block before them.
//!
//! Output is built in memory and only returned once the whole model has been
//! written, so a failing model never yields partial markup.

use super::attrs::rich_text_attrs;
use super::constants::*;
use crate::common::xml::{escape_attr, escape_text};
use crate::common::{EncodeError, Error, Result};
use crate::config::{CodecConfig, HeaderRow};
use crate::content::{
    BlobStore, Checksum, CodeboxProps, ContentBlock, ContentBlockModel, EmbeddedObject,
    ObjectKind, Row, SpanKind, Table, TextBlock, text,
};
use crate::tree::NodeMetadata;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write;

/// Encoder for one node's content.
pub struct Encoder<'a, S: BlobStore + ?Sized> {
    config: &'a CodecConfig,
    store: &'a S,
    out: String,
}

impl<'a, S: BlobStore + ?Sized> Encoder<'a, S> {
    pub fn new(config: &'a CodecConfig, store: &'a S) -> Self {
        Self {
            config,
            store,
            out: String::new(),
        }
    }

    /// Encode `model` as the content of `node`.
    ///
    /// `node` must own its content: an alias fails with
    /// [`EncodeError::SharedNode`] so callers redirect to the master.
    pub fn encode(mut self, node: &NodeMetadata, model: &ContentBlockModel) -> Result<Vec<u8>> {
        if let Some(master) = node.master {
            return Err(EncodeError::SharedNode {
                node_id: node.id,
                master_id: master,
            }
            .into());
        }
        self.validate(model)?;

        if self.config.xml_declaration {
            self.out.push_str(XML_DECLARATION);
        }
        self.open_tag(NODE, &[]);
        let blocks = model.blocks();
        let mut prev_len = 0;
        for (i, block) in blocks.iter().enumerate() {
            match block {
                ContentBlock::Text(t) => {
                    let between_tables = i > 0
                        && blocks[i - 1].is_table()
                        && blocks.get(i + 1).is_some_and(ContentBlock::is_table);
                    if t.is_empty() && between_tables {
                        // Keeps the block from collapsing into the tables on decode.
                        self.empty_tag(RICH_TEXT, &[]);
                    } else {
                        self.write_text_block(t)?;
                    }
                    prev_len = t.char_len();
                },
                ContentBlock::Table(t) => {
                    self.write_table(t, prev_len);
                    prev_len = 0;
                },
            }
        }
        self.close_tag(NODE);

        log::debug!(
            "event=encode node={} blocks={} bytes={}",
            node.id,
            model.len(),
            self.out.len()
        );
        Ok(self.out.into_bytes())
    }

    /// Check everything the writer relies on before emitting anything.
    fn validate(&self, model: &ContentBlockModel) -> std::result::Result<(), EncodeError> {
        for block in model.blocks() {
            match block {
                ContentBlock::Text(t) => {
                    let len = t.char_len();
                    for s in t.spans().iter() {
                        if s.start >= s.end || s.end > len {
                            return Err(EncodeError::InvalidSpan {
                                start: s.start,
                                end: s.end,
                                len,
                            });
                        }
                    }
                    for o in t.objects() {
                        if o.offset > len {
                            return Err(EncodeError::InvalidObjectOffset {
                                offset: o.offset,
                                len,
                            });
                        }
                        if let Some(cb) = t.spans().codebox_around(o.offset) {
                            return Err(EncodeError::ObjectInCodebox {
                                offset: o.offset,
                                start: cb.start,
                                end: cb.end,
                            });
                        }
                        if let Some(checksum) = o.checksum() {
                            if !self.store.contains(checksum) {
                                return Err(EncodeError::MissingBlob(checksum.to_string()));
                            }
                        }
                    }
                },
                ContentBlock::Table(t) => t.validate()?,
            }
        }
        Ok(())
    }

    fn write_text_block(&mut self, block: &TextBlock) -> Result<()> {
        let len = block.char_len();
        let spans = block.spans().as_slice();
        let objects = block.objects();

        let mut cuts: Vec<usize> = Vec::with_capacity(spans.len() * 2 + objects.len() + 2);
        cuts.push(0);
        cuts.push(len);
        for s in spans {
            cuts.push(s.start);
            cuts.push(s.end);
        }
        cuts.extend(objects.iter().map(|o| o.offset));
        cuts.sort_unstable();
        cuts.dedup();

        let mut next_object = 0;
        let mut pos = 0;
        for &cut in &cuts {
            if cut < pos {
                continue;
            }
            pos = cut;
            while next_object < objects.len() && objects[next_object].offset == pos {
                self.write_object(&objects[next_object])?;
                next_object += 1;
            }
            if pos >= len {
                break;
            }

            if let Some(cb) = spans
                .iter()
                .find(|s| s.start == pos && s.kind.is_codebox())
            {
                if let SpanKind::Codebox(props) = &cb.kind {
                    self.write_codebox(props, pos, text::slice(block.text(), &cb.range()));
                }
                pos = cb.end;
                continue;
            }

            let end = cuts.iter().copied().find(|&c| c > pos).unwrap_or(len);
            let covering: Vec<&SpanKind> = spans
                .iter()
                .filter(|s| s.start <= pos && end <= s.end)
                .map(|s| &s.kind)
                .collect();
            let attrs = rich_text_attrs(&covering);
            self.open_tag(RICH_TEXT, &attrs);
            self.out
                .push_str(&escape_text(text::slice(block.text(), &(pos..end))));
            self.close_tag(RICH_TEXT);
        }

        // Every object is written at its own cut; a leftover was skipped by a
        // codebox and would land behind it.
        if let Some(object) = objects.get(next_object) {
            return Err(EncodeError::InvalidObjectOffset {
                offset: object.offset,
                len,
            }
            .into());
        }
        Ok(())
    }

    fn write_codebox(&mut self, props: &CodeboxProps, offset: usize, content: &str) {
        let attrs = [
            (ATTR_CHAR_OFFSET, offset.to_string()),
            (ATTR_JUSTIFICATION, props.justification.as_str().to_string()),
            (ATTR_FRAME_WIDTH, props.frame_width.to_string()),
            (ATTR_FRAME_HEIGHT, props.frame_height.to_string()),
            (ATTR_WIDTH_IN_PIXELS, flag(props.width_in_pixels)),
            (ATTR_SYNTAX_HIGHLIGHTING, props.syntax.clone()),
            (ATTR_HIGHLIGHT_BRACKETS, flag(props.highlight_brackets)),
            (ATTR_SHOW_LINE_NUMBERS, flag(props.show_line_numbers)),
        ];
        self.open_tag(CODEBOX, &attrs);
        self.out.push_str(&escape_text(content));
        self.close_tag(CODEBOX);
    }

    fn write_object(&mut self, object: &EmbeddedObject) -> Result<()> {
        let mut attrs = vec![
            (ATTR_CHAR_OFFSET, object.offset.to_string()),
            (ATTR_JUSTIFICATION, object.justification.as_str().to_string()),
        ];
        let payload = match &object.kind {
            ObjectKind::Anchor(anchor) => {
                attrs.push((ATTR_ANCHOR, anchor.name.clone()));
                self.empty_tag(ENCODED_PNG, &attrs);
                return Ok(());
            },
            ObjectKind::Formula(formula) => {
                attrs.push((ATTR_FILENAME, FORMULA_FILENAME.to_string()));
                attrs.push((ATTR_TIME, formula.time.clone()));
                STANDARD.encode(formula.source.as_bytes())
            },
            ObjectKind::Attachment(att) => {
                attrs.push((ATTR_FILENAME, att.filename.clone()));
                attrs.push((ATTR_TIME, att.time.clone()));
                self.blob(&att.checksum)?
            },
            ObjectKind::Image(img) => {
                if let Some(link) = &img.link {
                    attrs.push((ATTR_LINK, link.clone()));
                }
                attrs.push((ATTR_TIME, img.time.clone()));
                self.blob(&img.checksum)?
            },
        };
        self.open_tag(ENCODED_PNG, &attrs);
        self.out.push_str(&payload);
        self.close_tag(ENCODED_PNG);
        Ok(())
    }

    fn blob(&self, checksum: &Checksum) -> Result<String> {
        let bytes = self
            .store
            .get(checksum)
            .ok_or_else(|| Error::from(EncodeError::MissingBlob(checksum.to_string())))?;
        Ok(STANDARD.encode(&bytes))
    }

    fn write_table(&mut self, table: &Table, offset: usize) {
        let widths = table
            .col_widths
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let attrs = [
            (ATTR_CHAR_OFFSET, offset.to_string()),
            (ATTR_JUSTIFICATION, table.justification.as_str().to_string()),
            (ATTR_COL_MIN, table.col_min.to_string()),
            (ATTR_COL_MAX, table.col_max.to_string()),
            (ATTR_COL_WIDTHS, widths),
            (ATTR_IS_LIGHT, flag(table.light)),
        ];
        self.open_tag(TABLE, &attrs);
        match self.config.header_row {
            HeaderRow::First => {
                self.write_row(table.header());
                for row in table.data_rows() {
                    self.write_row(row);
                }
            },
            HeaderRow::Last => {
                for row in table.data_rows() {
                    self.write_row(row);
                }
                self.write_row(table.header());
            },
        }
        self.close_tag(TABLE);
    }

    fn write_row(&mut self, row: &Row) {
        self.open_tag(ROW, &[]);
        for cell in row.cells() {
            self.open_tag(CELL, &[]);
            self.out.push_str(&escape_text(cell.text()));
            self.close_tag(CELL);
        }
        self.close_tag(ROW);
    }

    fn write_attrs(&mut self, attrs: &[(&str, String)]) {
        for (key, value) in attrs {
            // Writing into a String cannot fail.
            let _ = write!(self.out, " {}=\"{}\"", key, escape_attr(value));
        }
    }

    fn open_tag(&mut self, name: &str, attrs: &[(&str, String)]) {
        self.out.push('<');
        self.out.push_str(name);
        self.write_attrs(attrs);
        self.out.push('>');
    }

    fn empty_tag(&mut self, name: &str, attrs: &[(&str, String)]) {
        self.out.push('<');
        self.out.push_str(name);
        self.write_attrs(attrs);
        self.out.push_str("/>");
    }

    fn close_tag(&mut self, name: &str) {
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}
