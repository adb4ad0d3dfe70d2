//! Streaming reader for XML tree dumps.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::tree::{NodeId, NodeKind, SourceRange, Tree, TreeBuilder};

const TREE_TAG: &[u8] = b"tree";

/// Builds a [`Tree`] from an XML dump.
#[derive(Debug, Clone, Default)]
pub struct TreeDumpParser {
    path: Option<String>,
}

/// Attributes of one `<tree>` element.
struct NodeAttributes {
    kind: NodeKind,
    label: String,
    range: SourceRange,
}

impl TreeDumpParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source file path recorded in the parsed tree.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Parses a dump held in a string.
    pub fn parse_str(&self, xml: &str) -> Result<Tree> {
        let mut reader = Reader::from_str(xml);
        self.parse_reader(&mut reader)
    }

    /// Parses a dump stored in a file.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Tree> {
        let file = File::open(path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));
        self.parse_reader(&mut reader)
    }

    fn parse_reader<R: BufRead>(&self, reader: &mut Reader<R>) -> Result<Tree> {
        let mut builder = TreeBuilder::new();
        if let Some(path) = &self.path {
            builder = builder.with_path(path.clone());
        }
        let mut stack: Vec<NodeId> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if e.name().as_ref() == TREE_TAG => {
                    let node = self.push_node(&mut builder, &stack, e, reader)?;
                    stack.push(node);
                }
                Event::Empty(ref e) if e.name().as_ref() == TREE_TAG => {
                    self.push_node(&mut builder, &stack, e, reader)?;
                }
                Event::End(ref e) if e.name().as_ref() == TREE_TAG => {
                    stack.pop();
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(Error::Parse("unclosed <tree> element".to_string()));
        }
        builder.finish()
    }

    fn push_node<R: BufRead>(
        &self,
        builder: &mut TreeBuilder,
        stack: &[NodeId],
        e: &BytesStart,
        reader: &Reader<R>,
    ) -> Result<NodeId> {
        let attrs = self.parse_attributes(e, reader)?;
        match stack.last() {
            Some(&parent) => Ok(builder.child(parent, attrs.kind, attrs.label, attrs.range)),
            None if builder.is_empty() => Ok(builder.root(attrs.kind, attrs.label, attrs.range)),
            None => Err(Error::Parse("dump holds more than one root".to_string())),
        }
    }

    fn parse_attributes<R: BufRead>(&self, e: &BytesStart, reader: &Reader<R>) -> Result<NodeAttributes> {
        let mut kind = None;
        let mut label = String::new();
        let (mut pos, mut length) = (0, 0);

        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|e| Error::Parse(format!("attribute error: {}", e)))?;
            let key = reader
                .decoder()
                .decode(attr.key.as_ref())
                .map_err(|e| Error::Parse(e.to_string()))?;
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Parse(e.to_string()))?;
            match key.as_ref() {
                "type" => kind = Some(value.parse::<NodeKind>()?),
                "label" => label = value.into_owned(),
                "pos" => pos = parse_offset("pos", &value)?,
                "length" => length = parse_offset("length", &value)?,
                _ => {}
            }
        }

        let kind = kind.ok_or_else(|| Error::Parse("<tree> without a type".to_string()))?;
        Ok(NodeAttributes {
            kind,
            label,
            range: SourceRange::new(pos, length),
        })
    }
}

fn parse_offset(name: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| Error::Parse(format!("invalid {name} {value:?}")))
}

/// Parses a dump held in a string.
pub fn parse_str(xml: &str) -> Result<Tree> {
    TreeDumpParser::new().parse_str(xml)
}

/// Parses a dump stored in a file, recording the file path in the tree.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Tree> {
    let parser = TreeDumpParser::new().with_path(path.as_ref().to_string_lossy());
    parser.parse_file(path)
}
