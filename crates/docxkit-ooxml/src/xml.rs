//! Thin XML layer over quick-xml: an element writer and a small element tree

use std::borrow::Cow;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{OoxmlError, Result};

/// WordprocessingML main namespace
pub const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
/// Office document relationships namespace (`r:id`)
pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

/// Namespace declarations for `w:document`, `w:hdr` and `w:ftr`
pub const PART_NAMESPACES: [(&str, &str); 5] = [
    ("xmlns:w", NS_W),
    ("xmlns:r", NS_R),
    ("xmlns:wp", NS_WP),
    ("xmlns:a", NS_A),
    ("xmlns:pic", NS_PIC),
];

/// Buffered XML output
pub struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlWriter {
    pub fn new() -> Self {
        Self {
            inner: Writer::new(Vec::new()),
        }
    }

    /// `<?xml version="1.0" encoding="UTF-8" standalone="yes"?>`
    pub fn declaration(&mut self) -> Result<()> {
        self.inner.write_event(Event::Decl(BytesDecl::new(
            "1.0",
            Some("UTF-8"),
            Some("yes"),
        )))?;
        Ok(())
    }

    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.inner.write_event(Event::Start(element(name, attrs)))?;
        Ok(())
    }

    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.inner.write_event(Event::Empty(element(name, attrs)))?;
        Ok(())
    }

    pub fn end(&mut self, name: &str) -> Result<()> {
        self.inner.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    pub fn text(&mut self, text: &str) -> Result<()> {
        self.inner.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    /// `<name attrs>text</name>`
    pub fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.text(text)?;
        self.end(name)
    }

    /// `<name w:val="value"/>`
    pub fn val(&mut self, name: &str, value: &str) -> Result<()> {
        self.empty(name, &[("w:val", value)])
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

fn element<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    for &attr in attrs {
        start.push_attribute(attr);
    }
    start
}

/// Parsed child of an [`XmlNode`]
#[derive(Debug, Clone, PartialEq)]
pub enum XmlChild {
    Element(XmlNode),
    Text(String),
}

/// An element with its attributes and children
///
/// Names keep their prefixes (`w:p`); parts written by this crate always use
/// the same prefixes, so lookups are by qualified name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlChild>,
}

impl XmlNode {
    /// Parse a document and return its root element
    pub fn parse(xml: &[u8]) -> Result<XmlNode> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => stack.push(node_from_start(&e)?),
                Event::Empty(e) => {
                    let node = node_from_start(&e)?;
                    attach(&mut stack, &mut root, node);
                }
                Event::End(_) => {
                    let node = stack.pop().ok_or_else(|| {
                        OoxmlError::InvalidStructure("unbalanced closing tag".into())
                    })?;
                    attach(&mut stack, &mut root, node);
                }
                Event::Text(t) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = t.unescape()?;
                        push_text(parent, text);
                    }
                }
                Event::CData(t) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                        push_text(parent, Cow::Owned(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(OoxmlError::InvalidStructure("unclosed element".into()));
        }
        root.ok_or_else(|| OoxmlError::InvalidStructure("document has no root element".into()))
    }

    /// Name without its namespace prefix
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute parsed as a number
    pub fn attr_num<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.attr(name).and_then(|v| v.trim().parse().ok())
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlNode> {
        self.children.iter().filter_map(|child| match child {
            XmlChild::Element(node) => Some(node),
            XmlChild::Text(_) => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.elements().find(|node| node.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.elements().filter(move |node| node.name == name)
    }

    /// Direct text content
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlChild::Text(text) => Some(text.as_str()),
                XmlChild::Element(_) => None,
            })
            .collect()
    }

    /// `w:val` of the named child
    pub fn val(&self, child: &str) -> Option<&str> {
        self.child(child).and_then(|node| node.attr("w:val"))
    }

    /// On/off property: present without `w:val`, or with a true value
    pub fn flag(&self, child: &str) -> bool {
        match self.child(child) {
            Some(node) => !matches!(node.attr("w:val"), Some("0" | "false" | "off" | "none")),
            None => false,
        }
    }
}

fn node_from_start(e: &BytesStart<'_>) -> Result<XmlNode> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(XmlNode {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlChild::Element(node)),
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

fn push_text(parent: &mut XmlNode, text: Cow<'_, str>) {
    if let Some(XmlChild::Text(existing)) = parent.children.last_mut() {
        existing.push_str(&text);
    } else {
        parent.children.push(XmlChild::Text(text.into_owned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_escapes() {
        let mut w = XmlWriter::new();
        w.declaration().unwrap();
        w.start("w:p", &[("w:rsid", "a&b")]).unwrap();
        w.text_element("w:t", &[], "1 < 2").unwrap();
        w.val("w:jc", "center").unwrap();
        w.end("w:p").unwrap();
        let xml = String::from_utf8(w.into_bytes()).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#));
        assert!(xml.contains(r#"<w:p w:rsid="a&amp;b"><w:t>1 &lt; 2</w:t><w:jc w:val="center"/></w:p>"#));
    }

    #[test]
    fn test_parse_tree() {
        let xml = br#"<?xml version="1.0"?>
            <w:p xmlns:w="x"><w:pPr><w:jc w:val="both"/><w:keepNext/><w:b w:val="0"/></w:pPr>
            <w:r><w:t xml:space="preserve"> a &amp; b </w:t></w:r></w:p>"#;
        let root = XmlNode::parse(xml).unwrap();
        assert_eq!(root.local_name(), "p");
        let ppr = root.child("w:pPr").unwrap();
        assert_eq!(ppr.val("w:jc"), Some("both"));
        assert!(ppr.flag("w:keepNext"));
        assert!(!ppr.flag("w:b"));
        let text = root.child("w:r").unwrap().child("w:t").unwrap().text();
        assert_eq!(text, " a & b ");
    }

    #[test]
    fn test_parse_rejects_unbalanced() {
        assert!(XmlNode::parse(b"").is_err());
        assert!(XmlNode::parse(b"<a><b></a>").is_err());
    }
}
