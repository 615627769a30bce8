//! Node markup → [`ContentBlockModel`].
//!
//! The decoder walks the markup once, appending `rich_text` and `codebox`
//! text to the open text block and turning attributes into spans over the
//! appended range. `encoded_png` elements become objects at their declared
//! `char_offset`, and each `table` closes the open block.
//!
//! Offsets are per block and must never go backwards. Object payloads go to
//! the blob store; the model keeps only their checksums.

use super::attrs::{parse_rich_text, unknown_attr};
use super::constants::*;
use crate::common::xml::{Attributes, resolve_reference};
use crate::common::{Error, NodeId, Result};
use crate::config::{CodecConfig, HeaderRow};
use crate::content::{
    AnchorObject, AttachmentObject, BlobStore, CodeboxProps, ContentBlock, ContentBlockModel,
    EmbeddedObject, FormulaObject, ImageObject, Justification, ObjectKind, Row, SpanKind, Table,
    TextBlock,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use quick_xml::Reader;
use quick_xml::events::Event;

/// Element currently collecting text.
enum Open {
    /// Directly inside `<node>`
    Body,
    RichText {
        kinds: Vec<SpanKind>,
        text: String,
    },
    Codebox {
        props: CodeboxProps,
        text: String,
    },
    Png {
        attrs: Attributes,
        payload: String,
    },
    Table(TableBuilder),
}

#[derive(Default)]
struct TableBuilder {
    attrs: Option<Attributes>,
    rows: Vec<Row>,
    row: Option<Row>,
    cell: Option<String>,
}

/// Decoder for one node's markup.
pub struct Decoder<'a, S: BlobStore + ?Sized> {
    node_id: NodeId,
    config: &'a CodecConfig,
    store: &'a mut S,
    blocks: Vec<ContentBlock>,
    current: TextBlock,
    /// Last `char_offset` declared in the open block
    last_offset: usize,
    /// A `rich_text` element was read into the open block
    saw_run: bool,
}

impl<'a, S: BlobStore + ?Sized> Decoder<'a, S> {
    pub fn new(node_id: NodeId, config: &'a CodecConfig, store: &'a mut S) -> Self {
        Self {
            node_id,
            config,
            store,
            blocks: Vec::new(),
            current: TextBlock::new(),
            last_offset: 0,
            saw_run: false,
        }
    }

    /// Decode `markup` into a content model.
    ///
    /// Empty or whitespace-only markup is an empty node.
    pub fn decode(mut self, markup: &[u8]) -> Result<ContentBlockModel> {
        if markup.iter().all(u8::is_ascii_whitespace) {
            return Ok(ContentBlockModel::new());
        }

        let mut reader = Reader::from_reader(markup);
        let mut buf = Vec::new();
        let mut open: Option<Open> = None;
        let mut done = false;

        loop {
            let event = reader.read_event_into(&mut buf)?;
            match event {
                Event::Start(ref e) => {
                    let attrs = Attributes::read(e)?;
                    open = Some(self.start(open.take(), attrs)?);
                },
                Event::Empty(ref e) => {
                    let attrs = Attributes::read(e)?;
                    if open.is_none() && attrs.element() == NODE {
                        done = true;
                    } else {
                        let state = self.start(open.take(), attrs)?;
                        open = Some(self.end(state, e.name().as_ref())?);
                    }
                },
                Event::End(ref e) => {
                    let state = open.take().ok_or_else(|| {
                        Error::malformed(NODE, "closing tag outside the root element")
                    })?;
                    match self.end_or_root(state, e.name().as_ref())? {
                        Some(state) => open = Some(state),
                        None => done = true,
                    }
                },
                Event::Text(ref t) => push_text(&mut open, std::str::from_utf8(t)?)?,
                Event::CData(ref t) => push_text(&mut open, std::str::from_utf8(t)?)?,
                Event::GeneralRef(ref r) => {
                    let name = std::str::from_utf8(r)?;
                    let c = resolve_reference(name).ok_or_else(|| {
                        Error::malformed(NODE, format!("unknown entity '&{};'", name))
                    })?;
                    push_text(&mut open, c.encode_utf8(&mut [0; 4]))?;
                },
                Event::Eof => break,
                Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {},
            }
            buf.clear();
            if done {
                break;
            }
        }

        if !done {
            return Err(Error::malformed(NODE, "unterminated element"));
        }
        self.finish()
    }

    /// Handle a start tag, or the first half of an empty one.
    fn start(&mut self, open: Option<Open>, attrs: Attributes) -> Result<Open> {
        let element = attrs.element().to_string();
        match (open, element.as_str()) {
            (None, NODE) => Ok(Open::Body),
            (None, other) => Err(Error::malformed(
                other,
                format!("expected <{}> root element", NODE),
            )),
            (Some(Open::Body), RICH_TEXT) => Ok(Open::RichText {
                kinds: parse_rich_text(&attrs, self.config.strict_attributes)?,
                text: String::new(),
            }),
            (Some(Open::Body), CODEBOX) => {
                self.check_attrs(&attrs, &CODEBOX_ATTRS)?;
                let offset = self.declared_offset(&attrs, CODEBOX)?;
                self.expect_cursor(offset, CODEBOX)?;
                Ok(Open::Codebox {
                    props: codebox_props(&attrs)?,
                    text: String::new(),
                })
            },
            (Some(Open::Body), ENCODED_PNG) => {
                self.check_attrs(&attrs, &ENCODED_PNG_ATTRS)?;
                Ok(Open::Png {
                    attrs,
                    payload: String::new(),
                })
            },
            (Some(Open::Body), TABLE) => {
                self.check_attrs(&attrs, &TABLE_ATTRS)?;
                let offset = self.declared_offset(&attrs, TABLE)?;
                self.expect_cursor(offset, TABLE)?;
                Ok(Open::Table(TableBuilder {
                    attrs: Some(attrs),
                    ..TableBuilder::default()
                }))
            },
            (Some(Open::Table(mut t)), ROW) if t.row.is_none() => {
                t.row = Some(Row::new());
                Ok(Open::Table(t))
            },
            (Some(Open::Table(mut t)), CELL) if t.row.is_some() && t.cell.is_none() => {
                t.cell = Some(String::new());
                Ok(Open::Table(t))
            },
            (Some(_), other) => Err(Error::malformed(other, "unexpected element")),
        }
    }

    /// Handle an end tag; `None` once the root closes.
    fn end_or_root(&mut self, state: Open, name: &[u8]) -> Result<Option<Open>> {
        if let Open::Body = state {
            if name == NODE.as_bytes() {
                return Ok(None);
            }
            return Err(Error::malformed(NODE, "mismatched closing tag"));
        }
        self.end(state, name).map(Some)
    }

    /// Close the element `state` describes and return the enclosing state.
    fn end(&mut self, state: Open, name: &[u8]) -> Result<Open> {
        let name = std::str::from_utf8(name)?;
        match (state, name) {
            (Open::RichText { kinds, text }, RICH_TEXT) => {
                self.current.push_run(&text, kinds);
                self.saw_run = true;
                Ok(Open::Body)
            },
            (Open::Codebox { props, text }, CODEBOX) => {
                self.current.push_run(&text, [SpanKind::Codebox(props)]);
                Ok(Open::Body)
            },
            (Open::Png { attrs, payload }, ENCODED_PNG) => {
                self.push_object(&attrs, &payload)?;
                Ok(Open::Body)
            },
            (Open::Table(mut t), CELL) if t.cell.is_some() => {
                if let (Some(row), Some(cell)) = (t.row.as_mut(), t.cell.take()) {
                    row.push_text(cell);
                }
                Ok(Open::Table(t))
            },
            (Open::Table(mut t), ROW) if t.row.is_some() && t.cell.is_none() => {
                if let Some(row) = t.row.take() {
                    t.rows.push(row);
                }
                Ok(Open::Table(t))
            },
            (Open::Table(t), TABLE) if t.row.is_none() => {
                self.push_table(t)?;
                Ok(Open::Body)
            },
            (_, other) => Err(Error::malformed(other, "mismatched closing tag")),
        }
    }

    fn check_attrs(&self, attrs: &Attributes, known: &[&str]) -> Result<()> {
        for key in attrs.unknown(known) {
            let value = attrs.get(key).unwrap_or_default();
            unknown_attr(attrs.element(), key, value, self.config.strict_attributes)?;
        }
        Ok(())
    }

    /// Read `char_offset` and check it does not go backwards.
    fn declared_offset(&mut self, attrs: &Attributes, element: &str) -> Result<usize> {
        let offset: usize = attrs.require(ATTR_CHAR_OFFSET)?.trim().parse()?;
        if offset < self.last_offset {
            return Err(Error::malformed(
                element,
                format!(
                    "char_offset {} goes back before {}",
                    offset, self.last_offset
                ),
            ));
        }
        let cursor = self.current.char_len();
        if offset > cursor {
            return Err(Error::malformed(
                element,
                format!("char_offset {} beyond text length {}", offset, cursor),
            ));
        }
        self.last_offset = offset;
        Ok(offset)
    }

    fn expect_cursor(&self, offset: usize, element: &str) -> Result<()> {
        let cursor = self.current.char_len();
        if offset != cursor {
            return Err(Error::malformed(
                element,
                format!("char_offset {} must equal text length {}", offset, cursor),
            ));
        }
        Ok(())
    }

    fn push_object(&mut self, attrs: &Attributes, payload: &str) -> Result<()> {
        let offset = self.declared_offset(attrs, ENCODED_PNG)?;
        if self.current.spans().codebox_around(offset).is_some() {
            return Err(Error::malformed(
                ENCODED_PNG,
                format!("char_offset {} falls inside a codebox", offset),
            ));
        }
        let justification = justification(attrs)?;
        let time = attrs.get(ATTR_TIME).unwrap_or("0").to_string();

        let kind = if let Some(name) = attrs.get(ATTR_ANCHOR) {
            ObjectKind::Anchor(AnchorObject {
                name: name.to_string(),
            })
        } else {
            match attrs.get(ATTR_FILENAME).unwrap_or_default() {
                FORMULA_FILENAME => ObjectKind::Formula(FormulaObject {
                    source: String::from_utf8(decode_payload(payload)?)?,
                    time,
                }),
                "" => ObjectKind::Image(ImageObject {
                    node_id: self.node_id,
                    time,
                    checksum: self.store.put(Bytes::from(decode_payload(payload)?)),
                    link: attrs.get(ATTR_LINK).map(str::to_string),
                }),
                filename => ObjectKind::Attachment(AttachmentObject {
                    node_id: self.node_id,
                    filename: filename.to_string(),
                    time,
                    checksum: self.store.put(Bytes::from(decode_payload(payload)?)),
                    pending: false,
                }),
            }
        };
        self.current
            .push_object(EmbeddedObject::new(offset, justification, kind));
        Ok(())
    }

    fn push_table(&mut self, builder: TableBuilder) -> Result<()> {
        let attrs = builder
            .attrs
            .ok_or_else(|| Error::malformed(TABLE, "missing attributes"))?;
        let mut rows = builder.rows;
        if rows.is_empty() {
            return Err(Error::malformed(TABLE, "table without rows"));
        }
        let header = match self.config.header_row {
            HeaderRow::First => rows.remove(0),
            HeaderRow::Last => rows.remove(rows.len() - 1),
        };
        if header.cell_count() == 0 {
            return Err(Error::malformed(TABLE, "header row without cells"));
        }
        let mut table = Table::new(header);
        for row in rows {
            table.add_row(row);
        }
        table.justification = justification(&attrs)?;
        table.col_min = attrs.parse_or(ATTR_COL_MIN, 0)?;
        table.col_max = attrs.parse_or(ATTR_COL_MAX, 0)?;
        table.col_widths = parse_widths(attrs.get(ATTR_COL_WIDTHS).unwrap_or_default())?;
        table.light = attrs.flag(ATTR_IS_LIGHT)?;
        table
            .validate()
            .map_err(|e| Error::malformed(TABLE, e.to_string()))?;

        if !self.current.is_empty() || self.saw_run || self.blocks.is_empty() {
            let mut block = std::mem::take(&mut self.current);
            block.renumber();
            self.blocks.push(ContentBlock::Text(block));
        } else {
            self.current = TextBlock::new();
        }
        self.blocks.push(ContentBlock::Table(table));
        self.last_offset = 0;
        self.saw_run = false;
        Ok(())
    }

    fn finish(mut self) -> Result<ContentBlockModel> {
        let mut block = std::mem::take(&mut self.current);
        block.renumber();
        self.blocks.push(ContentBlock::Text(block));
        let model = ContentBlockModel::from_blocks(self.blocks);
        log::debug!(
            "event=decode node={} blocks={} objects={}",
            self.node_id,
            model.len(),
            model.objects().count()
        );
        Ok(model)
    }
}

/// Append character data to whatever element is open.
fn push_text(open: &mut Option<Open>, text: &str) -> Result<()> {
    match open {
        Some(Open::RichText { text: buf, .. })
        | Some(Open::Codebox { text: buf, .. })
        | Some(Open::Png { payload: buf, .. }) => {
            buf.push_str(text);
            Ok(())
        },
        Some(Open::Table(TableBuilder {
            cell: Some(buf), ..
        })) => {
            buf.push_str(text);
            Ok(())
        },
        _ if text.trim().is_empty() => Ok(()),
        Some(_) => Err(Error::malformed(NODE, "text outside a content element")),
        None => Err(Error::malformed(NODE, "text outside the root element")),
    }
}

fn justification(attrs: &Attributes) -> Result<Justification> {
    match attrs.get(ATTR_JUSTIFICATION) {
        None | Some("") => Ok(Justification::Left),
        Some(v) => Justification::parse(v),
    }
}

fn codebox_props(attrs: &Attributes) -> Result<CodeboxProps> {
    let defaults = CodeboxProps::default();
    Ok(CodeboxProps {
        syntax: attrs
            .get(ATTR_SYNTAX_HIGHLIGHTING)
            .filter(|s| !s.is_empty())
            .map_or(defaults.syntax, str::to_string),
        frame_width: attrs.parse_or(ATTR_FRAME_WIDTH, defaults.frame_width)?,
        frame_height: attrs.parse_or(ATTR_FRAME_HEIGHT, defaults.frame_height)?,
        width_in_pixels: attrs.flag(ATTR_WIDTH_IN_PIXELS)?,
        highlight_brackets: attrs.flag(ATTR_HIGHLIGHT_BRACKETS)?,
        show_line_numbers: attrs.flag(ATTR_SHOW_LINE_NUMBERS)?,
        justification: justification(attrs)?,
    })
}

fn parse_widths(value: &str) -> Result<Vec<u32>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|w| w.trim().parse::<u32>().map_err(Error::from))
        .collect()
}

fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}
