//! Node markup codec.
//!
//! [`decode`] turns one node's markup into a [`ContentBlockModel`] and
//! [`encode`] writes a model back. Both run over fully buffered input with
//! no I/O; embedded payloads travel through a [`BlobStore`].
//!
//! # Example
//!
//! ```
//! use cherrytree_core::codec;
//! use cherrytree_core::common::NodeId;
//! use cherrytree_core::config::CodecConfig;
//! use cherrytree_core::content::MemoryBlobStore;
//! use cherrytree_core::tree::NodeMetadata;
//!
//! let config = CodecConfig::default();
//! let mut store = MemoryBlobStore::new();
//! let markup = br#"<node><rich_text weight="heavy">Hi</rich_text></node>"#;
//! let model = codec::decode(NodeId(1), markup, &config, &mut store)?;
//! assert_eq!(model.plain_text(), "Hi");
//!
//! let bytes = codec::encode(&NodeMetadata::rich_text(NodeId(1)), &model, &config, &store)?;
//! assert!(String::from_utf8_lossy(&bytes).contains(r#"<rich_text weight="heavy">Hi</rich_text>"#));
//! # Ok::<(), cherrytree_core::common::Error>(())
//! ```

mod attrs;
pub mod constants;
mod decoder;
mod encoder;

pub use attrs::{format_link, parse_link};
pub use decoder::Decoder;
pub use encoder::Encoder;

use crate::common::{NodeId, Result};
use crate::config::CodecConfig;
use crate::content::{BlobStore, ContentBlockModel};
use crate::tree::NodeMetadata;

/// Decode the markup of node `node_id`.
pub fn decode<S: BlobStore + ?Sized>(
    node_id: NodeId,
    markup: &[u8],
    config: &CodecConfig,
    store: &mut S,
) -> Result<ContentBlockModel> {
    Decoder::new(node_id, config, store).decode(markup)
}

/// Encode `model` as the markup of `node`.
///
/// Fails without output on a structurally invalid model or when `node`
/// aliases a master node.
pub fn encode<S: BlobStore + ?Sized>(
    node: &NodeMetadata,
    model: &ContentBlockModel,
    config: &CodecConfig,
    store: &S,
) -> Result<Vec<u8>> {
    Encoder::new(config, store).encode(node, model)
}

/// Content elements of node markup, without declaration and root element.
pub(crate) fn inner_markup(markup: &[u8]) -> &[u8] {
    let mut rest = trim_ascii(markup);
    if rest.starts_with(b"<?") {
        if let Some(end) = memchr::memmem::find(rest, b"?>") {
            rest = trim_ascii(&rest[end + 2..]);
        }
    }
    if rest.starts_with(b"<node/>") || rest.starts_with(b"<node />") {
        return &[];
    }
    if rest.starts_with(b"<node>") && rest.ends_with(b"</node>") {
        return &rest[b"<node>".len()..rest.len() - b"</node>".len()];
    }
    rest
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{EncodeError, Error, RGBColor};
    use crate::config::HeaderRow;
    use crate::content::{
        AnchorObject, AttachmentObject, Checksum, CodeboxProps, ContentBlock, EmbeddedObject,
        FormulaObject, ImageObject, Justification, MemoryBlobStore, ObjectKind, Row, SpanKind,
        Table, TextBlock,
    };
    use bytes::Bytes;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<node><rich_text>plain </rich_text><rich_text weight="heavy">bold</rich_text><encoded_png char_offset="10" justification="left" anchor="top"/><table char_offset="10" justification="left" col_min="40" col_max="60" col_widths="0,0" is_light="0"><row><cell>h1</cell><cell>h2</cell></row><row><cell>a</cell><cell>b</cell></row></table><rich_text>after</rich_text></node>"#;

    fn config() -> CodecConfig {
        CodecConfig::default()
    }

    fn dec(markup: &str) -> Result<ContentBlockModel> {
        decode(NodeId(1), markup.as_bytes(), &config(), &mut MemoryBlobStore::new())
    }

    fn enc(model: &ContentBlockModel) -> String {
        let bytes = encode(
            &NodeMetadata::rich_text(NodeId(1)),
            model,
            &config().with_xml_declaration(false),
            &MemoryBlobStore::new(),
        )
        .unwrap();
        String::from_utf8(bytes).unwrap()
    }

    fn text(model: &ContentBlockModel, index: usize) -> &TextBlock {
        model.text_block(index).unwrap()
    }

    #[test]
    fn test_decode_sample() {
        let model = dec(SAMPLE).unwrap();
        assert_eq!(model.len(), 3);

        let first = text(&model, 0);
        assert_eq!(first.text(), "plain bold");
        let spans = first.spans().as_slice();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::Bold);
        assert_eq!(spans[0].range(), 6..10);
        assert_eq!(first.objects().len(), 1);
        assert_eq!(first.objects()[0].offset, 10);

        let table = model.table(1).unwrap();
        assert_eq!(table.header().cells()[0].text(), "h1");
        assert_eq!(table.data_rows().len(), 1);
        assert_eq!(table.col_min, 40);
        assert_eq!(table.col_max, 60);
        assert_eq!(table.col_widths, vec![0, 0]);

        assert_eq!(text(&model, 2).text(), "after");
    }

    #[test]
    fn test_sample_encodes_verbatim() {
        let model = dec(SAMPLE).unwrap();
        let body = SAMPLE.split_once('\n').unwrap().1;
        assert_eq!(enc(&model), body);
    }

    #[test]
    fn test_round_trip_decoded_model() {
        let markup = concat!(
            r#"<node><rich_text weight="heavy">Bo</rich_text>"#,
            r#"<rich_text weight="heavy" style="italic">th</rich_text>"#,
            r##"<rich_text style="italic" foreground="#00ff00"> it</rich_text>"##,
            r#"<rich_text link="node 7 sec"> link</rich_text>"#,
            r#"<codebox char_offset="12" justification="left" frame_width="300" frame_height="100" width_in_pixels="1" syntax_highlighting="rust" highlight_brackets="1" show_line_numbers="0">fn main() {}</codebox>"#,
            r#"<rich_text scale="h2">Title</rich_text>"#,
            r#"<encoded_png char_offset="29" justification="center" anchor="end"/>"#,
            r#"<table char_offset="29" justification="right" col_min="10" col_max="20" col_widths="5,0,7" is_light="1">"#,
            r#"<row><cell>x</cell><cell></cell><cell>&lt;y&gt;</cell></row>"#,
            r#"<row><cell>1</cell><cell>2</cell><cell>3</cell></row></table>"#,
            r#"<table char_offset="0" justification="left" col_min="1" col_max="2" col_widths="0" is_light="0"><row><cell>solo</cell></row></table>"#,
            r#"<rich_text justification="center">centered</rich_text></node>"#,
        );
        let model = dec(markup).unwrap();
        assert_eq!(model.len(), 4);
        assert!(model.block(1).unwrap().is_table());
        assert!(model.block(2).unwrap().is_table());

        let again = dec(&enc(&model)).unwrap();
        assert_eq!(again, model);
        assert_eq!(enc(&again), enc(&model));
    }

    #[test]
    fn test_overlapping_spans_round_trip() {
        let mut block = TextBlock::from_text("abcdefgh");
        block.apply_span(SpanKind::Bold, 0..5).unwrap();
        block.apply_span(SpanKind::Italic, 3..8).unwrap();
        block
            .apply_span(SpanKind::Background(RGBColor::new(1, 2, 3)), 4..6)
            .unwrap();
        let model = ContentBlockModel::from_blocks(vec![ContentBlock::Text(block)]);

        let markup = enc(&model);
        assert_eq!(markup.matches("<rich_text").count(), 5);
        let decoded = dec(&markup).unwrap();
        let spans = text(&decoded, 0).spans().as_slice();
        let ranges: Vec<_> = spans.iter().map(|s| (s.kind.clone(), s.range())).collect();
        assert!(ranges.contains(&(SpanKind::Bold, 0..5)));
        assert!(ranges.contains(&(SpanKind::Italic, 3..8)));
        assert!(ranges.contains(&(SpanKind::Background(RGBColor::new(1, 2, 3)), 4..6)));
        assert_eq!(ranges.len(), 3);
    }

    #[test]
    fn test_offset_regression_is_malformed() {
        let markup = concat!(
            r#"<node><rich_text>abcdef</rich_text>"#,
            r#"<encoded_png char_offset="4" justification="left" anchor="a"/>"#,
            r#"<encoded_png char_offset="2" justification="left" anchor="b"/></node>"#,
        );
        assert!(matches!(
            dec(markup),
            Err(Error::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_offsets_restart_per_block() {
        let markup = concat!(
            r#"<node><rich_text>abcdef</rich_text>"#,
            r#"<encoded_png char_offset="6" justification="left" anchor="a"/>"#,
            r#"<table char_offset="6" justification="left" col_min="1" col_max="2" col_widths="0" is_light="0"><row><cell>h</cell></row></table>"#,
            r#"<rich_text>xy</rich_text>"#,
            r#"<encoded_png char_offset="1" justification="left" anchor="b"/></node>"#,
        );
        let model = dec(markup).unwrap();
        assert_eq!(text(&model, 2).objects()[0].offset, 1);
    }

    #[test]
    fn test_same_offset_objects_keep_document_order() {
        let markup = concat!(
            r#"<node><rich_text>ab</rich_text>"#,
            r#"<encoded_png char_offset="1" justification="left" anchor="second"/>"#,
            r#"<encoded_png char_offset="1" justification="left" anchor="first"/></node>"#,
        );
        // Offset 1 is behind the cursor, which is fine: only regressions fail.
        let model = dec(markup).unwrap();
        let names: Vec<_> = text(&model, 0)
            .objects()
            .iter()
            .map(|o| match &o.kind {
                ObjectKind::Anchor(a) => (a.name.as_str(), o.rank),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(names, vec![("second", 0), ("first", 1)]);
        let encoded = enc(&model);
        assert!(encoded.find("second").unwrap() < encoded.find("first").unwrap());
    }

    #[test]
    fn test_offset_beyond_cursor_is_malformed() {
        let markup = r#"<node><rich_text>ab</rich_text><encoded_png char_offset="3" justification="left" anchor="a"/></node>"#;
        assert!(matches!(
            dec(markup),
            Err(Error::MalformedDocument { .. })
        ));
        let markup = r#"<node><rich_text>ab</rich_text><codebox char_offset="1" justification="left">x</codebox></node>"#;
        assert!(matches!(
            dec(markup),
            Err(Error::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_unknown_and_unterminated_elements() {
        let err = dec("<node><paragraph>x</paragraph></node>").unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { ref element, .. } if element == "paragraph"));
        assert!(matches!(
            dec("<node><rich_text>x</rich_text>"),
            Err(Error::MalformedDocument { .. })
        ));
        let err = dec("<node><rich_text>x</node>").unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { ref element, .. } if element == "rich_text"));
        assert!(matches!(dec("<node><rich_text x</node>"), Err(Error::MalformedDocument { .. })));
        assert!(matches!(dec("<body/>"), Err(Error::MalformedDocument { .. })));
    }

    #[test]
    fn test_unknown_attribute_policy() {
        let markup = r#"<node><rich_text indent="1" weight="heavy">x</rich_text></node>"#;
        assert!(dec(markup).is_err());
        let lenient = config().with_strict_attributes(false);
        let model = decode(
            NodeId(1),
            markup.as_bytes(),
            &lenient,
            &mut MemoryBlobStore::new(),
        )
        .unwrap();
        assert_eq!(text(&model, 0).spans().as_slice()[0].kind, SpanKind::Bold);
    }

    #[test]
    fn test_empty_markup() {
        for markup in ["", "  \n", "<node/>", "<node></node>"] {
            let model = dec(markup).unwrap();
            assert_eq!(model.len(), 1);
            assert!(text(&model, 0).is_empty());
        }
        assert_eq!(enc(&ContentBlockModel::new()), "<node></node>");
    }

    #[test]
    fn test_entities_and_escaping() {
        let model = dec(r#"<node><rich_text>a &amp; b &lt;c&gt; &#233;&#x263A;</rich_text></node>"#).unwrap();
        assert_eq!(model.plain_text(), "a & b <c> é☺");
        assert_eq!(
            enc(&model),
            "<node><rich_text>a &amp; b &lt;c&gt; é☺</rich_text></node>"
        );
    }

    #[test]
    fn test_header_row_position() {
        let markup = r#"<node><table char_offset="0" justification="left" col_min="1" col_max="2" col_widths="0" is_light="0"><row><cell>d1</cell></row><row><cell>d2</cell></row><row><cell>head</cell></row></table></node>"#;
        let last = config().with_header_row(HeaderRow::Last);
        let mut store = MemoryBlobStore::new();
        let model = decode(NodeId(1), markup.as_bytes(), &last, &mut store).unwrap();
        let table = model.table(1).unwrap();
        assert_eq!(table.header().cells()[0].text(), "head");
        assert_eq!(table.data_rows()[1].cells()[0].text(), "d2");

        let first = String::from_utf8(
            encode(&NodeMetadata::rich_text(NodeId(1)), &model, &config(), &store).unwrap(),
        )
        .unwrap();
        assert!(first.contains("<row><cell>head</cell></row><row><cell>d1</cell></row>"));
        let back = String::from_utf8(
            encode(&NodeMetadata::rich_text(NodeId(1)), &model, &last, &store).unwrap(),
        )
        .unwrap();
        assert!(back.contains("<row><cell>d2</cell></row><row><cell>head</cell></row>"));
    }

    #[test]
    fn test_table_widths_are_stored_not_scaled() {
        let mut model = ContentBlockModel::new();
        model.insert_table(0, 0, 2, 2, 100, false).unwrap();
        let markup = enc(&model);
        let decoded = dec(&markup).unwrap();
        let table = decoded.table(1).unwrap();
        assert_eq!(table, model.table(1).unwrap());
        assert_eq!(table.display_max(1.2), (table.col_max as f32 * 1.2).round() as u32);
    }

    #[test]
    fn test_objects_use_blob_store() {
        let mut store = MemoryBlobStore::new();
        let png = store.put(Bytes::from_static(b"\x89PNG fake"));
        let file = store.put(Bytes::from_static(b"attachment bytes"));

        let mut block = TextBlock::from_text("ab");
        block
            .insert_object(EmbeddedObject::new(
                1,
                Justification::Left,
                ObjectKind::Image(ImageObject {
                    node_id: NodeId(1),
                    time: "0".to_string(),
                    checksum: png.clone(),
                    link: Some("webs https://example.org".to_string()),
                }),
            ))
            .unwrap();
        block
            .insert_object(EmbeddedObject::new(
                2,
                Justification::Center,
                ObjectKind::Formula(FormulaObject {
                    source: "e^{i\\pi}+1=0".to_string(),
                    time: "1700000000.5".to_string(),
                }),
            ))
            .unwrap();
        block
            .insert_object(EmbeddedObject::new(
                2,
                Justification::Left,
                ObjectKind::Attachment(AttachmentObject {
                    node_id: NodeId(1),
                    filename: "notes.txt".to_string(),
                    time: "1700000001.0".to_string(),
                    checksum: file.clone(),
                    pending: false,
                }),
            ))
            .unwrap();
        let model = ContentBlockModel::from_blocks(vec![ContentBlock::Text(block)]);

        let cfg = config();
        let meta = NodeMetadata::rich_text(NodeId(1));
        let bytes = encode(&meta, &model, &cfg, &store).unwrap();
        let markup = String::from_utf8(bytes.clone()).unwrap();
        assert!(markup.contains(r#"filename="__ct_special.tex""#));
        assert!(markup.contains(r#"filename="notes.txt""#));

        let mut fresh = MemoryBlobStore::new();
        let decoded = decode(NodeId(1), &bytes, &cfg, &mut fresh).unwrap();
        assert_eq!(decoded, model);
        assert_eq!(fresh.len(), 2);
        assert!(fresh.contains(&png));
        assert!(fresh.contains(&file));
    }

    #[test]
    fn test_missing_blob_aborts() {
        let mut block = TextBlock::from_text("x");
        block
            .insert_object(EmbeddedObject::new(
                0,
                Justification::Left,
                ObjectKind::Image(ImageObject {
                    node_id: NodeId(1),
                    time: "0".to_string(),
                    checksum: Checksum::new("deadbeef"),
                    link: None,
                }),
            ))
            .unwrap();
        let model = ContentBlockModel::from_blocks(vec![ContentBlock::Text(block)]);
        let err = encode(
            &NodeMetadata::rich_text(NodeId(1)),
            &model,
            &config(),
            &MemoryBlobStore::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Encode(EncodeError::MissingBlob(ref c)) if c == "deadbeef"
        ));
    }

    #[test]
    fn test_row_length_mismatch_aborts() {
        let mut table = Table::new(["a", "b"].into_iter().collect::<Row>());
        table.add_row(["only"].into_iter().collect());
        let model = ContentBlockModel::from_blocks(vec![
            ContentBlock::Text(TextBlock::new()),
            ContentBlock::Table(table),
            ContentBlock::Text(TextBlock::new()),
        ]);
        let err = encode(
            &NodeMetadata::rich_text(NodeId(1)),
            &model,
            &config(),
            &MemoryBlobStore::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Encode(EncodeError::RowLength { row: 1, expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_shared_node_is_rejected() {
        let mut meta = NodeMetadata::rich_text(NodeId(5));
        meta.master = Some(NodeId(2));
        let err = encode(&meta, &ContentBlockModel::new(), &config(), &MemoryBlobStore::new())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Encode(EncodeError::SharedNode { node_id: NodeId(5), master_id: NodeId(2) })
        ));
    }

    #[test]
    fn test_codebox_round_trip_keeps_props() {
        let props = CodeboxProps {
            syntax: "python".to_string(),
            frame_width: 500,
            frame_height: 80,
            width_in_pixels: true,
            highlight_brackets: false,
            show_line_numbers: true,
            justification: Justification::Center,
        };
        let mut block = TextBlock::from_text("pre print(1) post");
        block
            .apply_span(SpanKind::Codebox(props.clone()), 4..12)
            .unwrap();
        block.apply_span(SpanKind::Bold, 0..3).unwrap();
        let model = ContentBlockModel::from_blocks(vec![ContentBlock::Text(block)]);
        let markup = enc(&model);
        assert!(markup.contains(r#"<codebox char_offset="4" justification="center""#));
        let decoded = dec(&markup).unwrap();
        let spans = text(&decoded, 0).spans().as_slice();
        assert!(
            spans
                .iter()
                .any(|s| s.kind == SpanKind::Codebox(props.clone()) && s.range() == (4..12))
        );
    }

    #[test]
    fn test_mixed_justification_round_trip() {
        let markup = concat!(
            r#"<node><rich_text weight="heavy" justification="center">Title"#,
            "\n",
            r#"</rich_text><rich_text>body</rich_text>"#,
            r#"<rich_text justification="right">end</rich_text></node>"#,
        );
        let model = dec(markup).unwrap();
        let block = text(&model, 0);
        assert_eq!(block.justification_at(0), Some(Justification::Center));
        assert_eq!(block.justification_at(6), None);
        assert_eq!(block.justification_at(10), Some(Justification::Right));
        assert_eq!(enc(&model), markup);
    }

    #[test]
    fn test_empty_rich_text_justification_is_dropped() {
        let model = dec(r#"<node><rich_text justification="right"/></node>"#).unwrap();
        assert!(text(&model, 0).is_empty());
        assert_eq!(enc(&model), "<node></node>");
    }

    #[test]
    fn test_empty_block_between_tables_survives() {
        let table = || ContentBlock::Table(Table::with_size(1, 1, 0, false).unwrap());
        let model = ContentBlockModel::from_blocks(vec![
            ContentBlock::Text(TextBlock::from_text("a")),
            table(),
            ContentBlock::Text(TextBlock::new()),
            table(),
            ContentBlock::Text(TextBlock::new()),
        ]);
        let markup = enc(&model);
        assert!(markup.contains("</table><rich_text/><table"));
        let decoded = dec(&markup).unwrap();
        assert_eq!(decoded.len(), 5);
        assert_eq!(decoded, model);

        // Without the empty run adjacent tables stay adjacent.
        let adjacent = dec(&markup.replace("<rich_text/>", "")).unwrap();
        assert_eq!(adjacent.len(), 4);
    }

    #[test]
    fn test_header_row_without_cells() {
        let markup = r#"<node><table char_offset="0" justification="left" col_min="1" col_max="2" col_widths="" is_light="0"><row></row></table></node>"#;
        let err = dec(markup).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { ref element, .. } if element == "table"));
    }

    #[test]
    fn test_object_inside_codebox_is_not_encoded() {
        let mut block = TextBlock::from_text("abcdef");
        block
            .apply_span(SpanKind::Codebox(CodeboxProps::default()), 0..6)
            .unwrap();
        block.push_object(EmbeddedObject::new(
            3,
            Justification::Left,
            ObjectKind::Anchor(AnchorObject {
                name: "mid".to_string(),
            }),
        ));
        let model = ContentBlockModel::from_blocks(vec![ContentBlock::Text(block)]);
        let err = encode(
            &NodeMetadata::rich_text(NodeId(1)),
            &model,
            &config(),
            &MemoryBlobStore::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Encode(EncodeError::ObjectInCodebox { offset: 3, start: 0, end: 6 })
        ));
    }

    #[test]
    fn test_inner_markup() {
        assert_eq!(
            inner_markup(b"<?xml version=\"1.0\"?>\n<node><rich_text>x</rich_text></node>\n"),
            b"<rich_text>x</rich_text>"
        );
        assert_eq!(inner_markup(b"<node/>"), b"");
        assert_eq!(inner_markup(b"<node></node>"), b"");
    }
}
