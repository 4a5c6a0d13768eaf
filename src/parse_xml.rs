use std::io::BufRead;
use std::path::Path;

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{LodTreeError, Result};

/// Represents a parsed XML element with its attributes, text and children
#[derive(Debug, Clone, PartialEq)]
pub struct XmlNode {
    /// The name/tag of this element
    pub name: String,
    /// Attributes in document order
    pub attributes: IndexMap<String, String>,
    /// Concatenated text content of this element
    pub text_content: String,
    /// Child elements in document order
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// First direct child element with the given name.
    pub fn first_child_named(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|n| n.name == name)
    }

    /// All direct child elements with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |n| n.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Text content, or `None` when the element carries no text.
    pub fn text(&self) -> Option<&str> {
        if self.text_content.is_empty() {
            None
        } else {
            Some(&self.text_content)
        }
    }
}

/// Parses an XML document held in memory and returns its root element
///
/// `source` only labels diagnostics; nothing is read from it.
pub fn parse_xml_bytes(bytes: &[u8], source: &Path) -> Result<XmlNode> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);

    let mut buf = Vec::new();
    loop {
        buf.clear();
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| parse_error(source, e))?;
        let maybe_root = match event {
            Event::Start(start) => Some((start.into_owned(), false)),
            Event::Empty(start) => Some((start.into_owned(), true)),
            Event::Eof => {
                return Err(LodTreeError::Parse {
                    path: source.to_path_buf(),
                    message: "XML document is empty".to_string(),
                });
            }
            _ => None,
        };

        if let Some((start, self_closing)) = maybe_root {
            let mut node_buf = Vec::new();
            let root = parse_node(&mut reader, &mut node_buf, start, self_closing, source)?;
            expect_document_end(&mut reader, &mut buf, source)?;
            return Ok(root);
        }
    }
}

/// Only comments, processing instructions and whitespace may follow the root.
fn expect_document_end<R: BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    source: &Path,
) -> Result<()> {
    loop {
        buf.clear();
        let event = reader
            .read_event_into(buf)
            .map_err(|e| parse_error(source, e))?;
        let unexpected = match event {
            Event::Eof => return Ok(()),
            Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
            Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => continue,
            Event::Start(e) | Event::Empty(e) => format!("<{}>", String::from_utf8_lossy(e.name().as_ref())),
            Event::End(e) => format!("</{}>", String::from_utf8_lossy(e.name().as_ref())),
            other => format!("{other:?}"),
        };
        return Err(LodTreeError::Parse {
            path: source.to_path_buf(),
            message: format!("unexpected content after root element: {unexpected}"),
        });
    }
}

fn parse_node<R: BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    start: BytesStart<'static>,
    self_closing: bool,
    source: &Path,
) -> Result<XmlNode> {
    let element_name_bytes = start.name().as_ref().to_vec();
    let element_name = String::from_utf8_lossy(&element_name_bytes).to_string();
    let attributes = collect_attributes(&start, source)?;

    let mut node = XmlNode {
        name: element_name,
        attributes,
        text_content: String::new(),
        children: Vec::new(),
    };

    if self_closing {
        return Ok(node);
    }

    loop {
        buf.clear();
        let event = reader
            .read_event_into(buf)
            .map_err(|e| parse_error(source, e))?;
        match event {
            Event::Start(child_start) => {
                let mut child_buf = Vec::new();
                let child = parse_node(reader, &mut child_buf, child_start.into_owned(), false, source)?;
                node.children.push(child);
            }
            Event::Empty(child_start) => {
                let mut child_buf = Vec::new();
                let child = parse_node(reader, &mut child_buf, child_start.into_owned(), true, source)?;
                node.children.push(child);
            }
            Event::Text(text) => {
                let value = text.unescape().map_err(|e| parse_error(source, e))?;
                if !value.trim().is_empty() {
                    node.text_content.push_str(&value);
                }
            }
            Event::CData(text) => {
                let value = String::from_utf8_lossy(text.as_ref()).to_string();
                if !value.trim().is_empty() {
                    node.text_content.push_str(&value);
                }
            }
            Event::End(end) => {
                if end.name().as_ref() != element_name_bytes.as_slice() {
                    return Err(LodTreeError::Parse {
                        path: source.to_path_buf(),
                        message: format!(
                            "unexpected closing tag '</{}>' while parsing '<{}>'",
                            String::from_utf8_lossy(end.name().as_ref()),
                            node.name
                        ),
                    });
                }
                return Ok(node);
            }
            Event::Eof => {
                return Err(LodTreeError::Parse {
                    path: source.to_path_buf(),
                    message: format!("unexpected end of file while parsing element '{}'", node.name),
                });
            }
            _ => {}
        }
    }
}

fn collect_attributes(start: &BytesStart<'_>, source: &Path) -> Result<IndexMap<String, String>> {
    let mut map = IndexMap::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| parse_error(source, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| parse_error(source, e))?
            .into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn parse_error(source: &Path, err: impl std::fmt::Display) -> LodTreeError {
    LodTreeError::Parse {
        path: source.to_path_buf(),
        message: err.to_string(),
    }
}
