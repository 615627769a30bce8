//! Whole-document `.ctd` files.
//!
//! A `.ctd` file nests `<node>` elements under a `<cherrytree>` root. Each
//! node's own content elements come before its child nodes; on load they are
//! cut out verbatim and stored as standalone node markup, so nothing is
//! decoded until a node is opened.

use super::index::NodeTree;
use super::node::{Node, NodeFlags, NodeProperties, NodeType};
use crate::codec::inner_markup;
use crate::common::xml::{Attributes, escape_attr};
use crate::common::{Error, NodeId, Result};
use bytes::Bytes;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fmt::Write;
use std::path::Path;

const ROOT: &str = "cherrytree";
const NODE: &str = "node";
const BOOKMARKS: &str = "bookmarks";

/// Node being read: where its own content starts and, once a child or the
/// closing tag shows up, where it ends.
struct OpenNode {
    id: NodeId,
    content_start: usize,
    content_end: Option<usize>,
}

/// Load a `.ctd` file from disk.
pub fn read_ctd<P: AsRef<Path>>(path: P) -> Result<NodeTree> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_ctd(&bytes)
}

/// Save `tree` as a `.ctd` file.
pub fn write_ctd<P: AsRef<Path>>(tree: &NodeTree, path: P) -> Result<()> {
    std::fs::write(path.as_ref(), to_ctd(tree)?)?;
    Ok(())
}

/// Build a tree index from `.ctd` bytes.
pub fn parse_ctd(bytes: &[u8]) -> Result<NodeTree> {
    let mut tree = NodeTree::new();
    let mut reader = Reader::from_reader(bytes);
    let mut stack: Vec<OpenNode> = Vec::new();
    let mut bookmarks = Vec::new();
    let mut seen_root = false;

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(ref e) if e.name().as_ref() == NODE.as_bytes() => {
                mark_content_end(&mut stack, before);
                let attrs = Attributes::read(e)?;
                let id = insert_node(&mut tree, &attrs, stack.last().map(|n| n.id))?;
                stack.push(OpenNode {
                    id,
                    content_start: reader.buffer_position() as usize,
                    content_end: None,
                });
            },
            Event::Empty(ref e) if e.name().as_ref() == NODE.as_bytes() => {
                mark_content_end(&mut stack, before);
                let attrs = Attributes::read(e)?;
                insert_node(&mut tree, &attrs, stack.last().map(|n| n.id))?;
            },
            Event::End(ref e) if e.name().as_ref() == NODE.as_bytes() => {
                let open = stack
                    .pop()
                    .ok_or_else(|| Error::malformed(NODE, "closing tag without a node"))?;
                let end = open.content_end.unwrap_or(before);
                let inner = trim_ascii(&bytes[open.content_start..end]);
                if !inner.is_empty() {
                    let mut markup = Vec::with_capacity(inner.len() + 13);
                    markup.extend_from_slice(b"<node>");
                    markup.extend_from_slice(inner);
                    markup.extend_from_slice(b"</node>");
                    tree.set_loaded_markup(open.id, Bytes::from(markup))?;
                }
            },
            Event::Start(ref e) | Event::Empty(ref e) if stack.is_empty() => {
                match e.name().as_ref() {
                    b"cherrytree" => seen_root = true,
                    b"bookmarks" => {
                        let attrs = Attributes::read(e)?;
                        bookmarks = parse_bookmarks(attrs.get("list").unwrap_or_default())?;
                    },
                    other => {
                        return Err(Error::malformed(
                            String::from_utf8_lossy(other),
                            "unexpected element outside nodes",
                        ));
                    },
                }
            },
            Event::Eof => break,
            // Content elements stay in the raw markup slice.
            _ => {},
        }
    }

    if !seen_root {
        return Err(Error::malformed(ROOT, "missing root element"));
    }
    if let Some(open) = stack.last() {
        return Err(Error::malformed(
            NODE,
            format!("node {} is not terminated", open.id),
        ));
    }
    for id in bookmarks {
        if tree.add_bookmark(id).is_err() {
            log::warn!("event=skip_bookmark id={}", id);
        }
    }
    log::debug!(
        "event=load_ctd nodes={} bookmarks={}",
        tree.len(),
        tree.bookmarks().len()
    );
    Ok(tree)
}

fn mark_content_end(stack: &mut [OpenNode], at: usize) {
    if let Some(parent) = stack.last_mut() {
        parent.content_end.get_or_insert(at);
    }
}

fn insert_node(tree: &mut NodeTree, attrs: &Attributes, parent: Option<NodeId>) -> Result<NodeId> {
    let id: NodeId = attrs.require("unique_id")?.parse()?;
    let mut flags = NodeFlags::empty();
    flags.set(NodeFlags::READ_ONLY, attrs.flag("readonly")?);
    flags.set(NodeFlags::EXCLUDE_SELF, attrs.flag("nosearch_me")?);
    flags.set(NodeFlags::EXCLUDE_CHILDREN, attrs.flag("nosearch_ch")?);
    flags.set(NodeFlags::BOLD, attrs.flag("is_bold")?);

    let props = NodeProperties {
        name: attrs.get("name").unwrap_or_default().to_string(),
        node_type: NodeType::from_prog_lang(attrs.get("prog_lang").unwrap_or_default()),
        flags,
        tags: attrs.get("tags").unwrap_or_default().to_string(),
        custom_icon_id: attrs.parse_or("custom_icon_id", 0)?,
        foreground: attrs.get("foreground").unwrap_or_default().to_string(),
    };
    let node = Node {
        id,
        master: NodeId::master_from_wire(attrs.parse_or("master_id", 0)?),
        props,
        ts_creation: attrs.get("ts_creation").unwrap_or("0").to_string(),
        ts_lastsave: attrs.get("ts_lastsave").unwrap_or("0").to_string(),
        markup: Bytes::new(),
        parent: None,
        children: Vec::new(),
    };
    tree.insert_loaded(node, parent)?;
    Ok(id)
}

fn parse_bookmarks(list: &str) -> Result<Vec<NodeId>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<NodeId>().map_err(Error::from))
        .collect()
}

/// Serialize `tree` as `.ctd` bytes.
pub fn to_ctd(tree: &NodeTree) -> Result<Vec<u8>> {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push('\n');
    out.push_str("<cherrytree>\n");
    if !tree.bookmarks().is_empty() {
        let list = tree
            .bookmarks()
            .iter()
            .map(NodeId::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(out, "<{} list=\"{}\"/>", BOOKMARKS, list);
    }
    for &id in tree.children(None)? {
        write_node(tree, id, &mut out)?;
    }
    out.push_str("</cherrytree>\n");
    Ok(out.into_bytes())
}

fn write_node(tree: &NodeTree, id: NodeId, out: &mut String) -> Result<()> {
    let node = tree.node(id)?;
    let props = node.properties();
    let flag = |f: NodeFlags| if props.flags.contains(f) { "1" } else { "0" };

    let _ = write!(
        out,
        "<node name=\"{}\" unique_id=\"{}\"",
        escape_attr(&props.name),
        id
    );
    if let Some(master) = node.master() {
        let _ = write!(out, " master_id=\"{}\"", master);
    }
    let _ = write!(
        out,
        " prog_lang=\"{}\" tags=\"{}\" readonly=\"{}\" nosearch_me=\"{}\" nosearch_ch=\"{}\" custom_icon_id=\"{}\" is_bold=\"{}\" foreground=\"{}\" ts_creation=\"{}\" ts_lastsave=\"{}\">",
        escape_attr(props.node_type.prog_lang()),
        escape_attr(&props.tags),
        flag(NodeFlags::READ_ONLY),
        flag(NodeFlags::EXCLUDE_SELF),
        flag(NodeFlags::EXCLUDE_CHILDREN),
        props.custom_icon_id,
        flag(NodeFlags::BOLD),
        escape_attr(&props.foreground),
        escape_attr(node.ts_creation()),
        escape_attr(node.ts_lastsave()),
    );
    let inner = std::str::from_utf8(inner_markup(&node.markup))?;
    out.push_str(inner);
    for &child in node.children() {
        out.push('\n');
        write_node(tree, child, out)?;
    }
    out.push_str("</node>\n");
    Ok(())
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
    use crate::codec;
    use crate::config::CodecConfig;
    use crate::content::MemoryBlobStore;

    const SAMPLE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<cherrytree>
<bookmarks list="2,99"/>
<node name="Root &amp; co" unique_id="1" prog_lang="custom-colors" tags="a b" readonly="0" nosearch_me="0" nosearch_ch="1" custom_icon_id="0" is_bold="1" foreground="" ts_creation="1700000000.0" ts_lastsave="1700000001.5"><rich_text weight="heavy">Hello</rich_text>
<node name="Child" unique_id="2" prog_lang="python" tags="" readonly="1" nosearch_me="0" nosearch_ch="0" custom_icon_id="3" is_bold="0" foreground="#ff0000" ts_creation="1.0" ts_lastsave="2.0"><rich_text>print(1)</rich_text></node>
<node name="Alias" unique_id="3" master_id="1" prog_lang="custom-colors" tags="" readonly="0" nosearch_me="0" nosearch_ch="0" custom_icon_id="0" is_bold="0" foreground="" ts_creation="3.0" ts_lastsave="3.0"/>
</node>
<node name="Second" unique_id="7" prog_lang="plain-text" tags="" readonly="0" nosearch_me="1" nosearch_ch="0" custom_icon_id="0" is_bold="0" foreground="" ts_creation="4.0" ts_lastsave="4.0"></node>
</cherrytree>
"##;

    #[test]
    fn test_parse_structure() {
        let tree = parse_ctd(SAMPLE.as_bytes()).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.children(None).unwrap(), &[NodeId(1), NodeId(7)]);
        assert_eq!(tree.children(Some(NodeId(1))).unwrap(), &[NodeId(2), NodeId(3)]);
        assert_eq!(tree.bookmarks(), &[NodeId(2)]);

        let root = tree.node(NodeId(1)).unwrap();
        assert_eq!(root.name(), "Root & co");
        assert!(root.properties().flags.contains(NodeFlags::BOLD));
        assert!(root.properties().flags.contains(NodeFlags::EXCLUDE_CHILDREN));
        assert_eq!(root.ts_lastsave(), "1700000001.5");

        let child = tree.node(NodeId(2)).unwrap();
        assert_eq!(child.properties().node_type, NodeType::Code("python".to_string()));
        assert_eq!(child.properties().custom_icon_id, 3);
        assert_eq!(tree.node(NodeId(3)).unwrap().master(), Some(NodeId(1)));
        assert_eq!(tree.resolve_master(NodeId(3)).unwrap(), NodeId(1));

        // Ids keep growing past the largest loaded one.
        let mut tree = tree;
        let new = tree.add_child(None, NodeProperties::new("new")).unwrap();
        assert_eq!(new, NodeId(8));
    }

    #[test]
    fn test_node_markup_is_cut_per_node() {
        let tree = parse_ctd(SAMPLE.as_bytes()).unwrap();
        assert_eq!(
            &tree.load_raw_markup(NodeId(1)).unwrap()[..],
            br#"<node><rich_text weight="heavy">Hello</rich_text></node>"#
        );
        assert!(tree.load_raw_markup(NodeId(7)).unwrap().is_empty());

        let config = CodecConfig::default();
        let mut store = MemoryBlobStore::new();
        let markup = tree.load_raw_markup(NodeId(2)).unwrap();
        let model = codec::decode(NodeId(2), &markup, &config, &mut store).unwrap();
        assert_eq!(model.plain_text(), "print(1)");
    }

    #[test]
    fn test_save_and_reload() {
        let tree = parse_ctd(SAMPLE.as_bytes()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.ctd");
        write_ctd(&tree, &path).unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains(r#"<bookmarks list="2"/>"#));
        assert!(saved.contains(r#"unique_id="3" master_id="1" prog_lang"#));
        assert!(!saved.contains(r#"unique_id="2" master_id"#));

        let again = read_ctd(&path).unwrap();
        assert_eq!(again.depth_first(), tree.depth_first());
        assert_eq!(again.bookmarks(), tree.bookmarks());
        for (id, _) in tree.depth_first() {
            assert_eq!(again.node(id).unwrap(), tree.node(id).unwrap());
        }
    }

    #[test]
    fn test_saved_markup_drops_declaration() {
        let mut tree = NodeTree::new();
        let id = tree.add_child(None, NodeProperties::new("n")).unwrap();
        tree.store_raw_markup(
            id,
            &br#"<?xml version="1.0" encoding="UTF-8"?><node><rich_text>x</rich_text></node>"#[..],
        )
        .unwrap();
        let saved = String::from_utf8(to_ctd(&tree).unwrap()).unwrap();
        assert!(saved.contains("><rich_text>x</rich_text></node>"));
        assert_eq!(saved.matches("<?xml").count(), 1);
    }

    #[test]
    fn test_malformed_files() {
        assert!(parse_ctd(b"<node unique_id=\"1\"></node>").is_err());
        assert!(parse_ctd(b"<cherrytree><node unique_id=\"1\"><rich_text>x</rich_text></cherrytree>").is_err());
        assert!(
            parse_ctd(b"<cherrytree><node unique_id=\"1\"/><node unique_id=\"1\"/></cherrytree>")
                .is_err()
        );
        let empty = parse_ctd(b"<cherrytree></cherrytree>").unwrap();
        assert!(empty.is_empty());
    }
}
