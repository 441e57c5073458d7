//! XML document handling
//!
//! A small owned DOM built from `quick-xml` events. Both schema files and
//! model documents are parsed into [`XmlDocument`] before anything else looks
//! at them; the binder walks the tree, the converter rewrites it in place and
//! the renamer serializes it back to text.

use crate::error::{Error, Result};
use crate::limits::Limits;
use indexmap::IndexMap;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt::Write as _;

/// XML element in the document tree
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Tag name as written (prefixes are kept)
    pub name: String,
    /// Attributes in document order
    pub attributes: IndexMap<String, String>,
    /// Text content (if any)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Create a new element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder: add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder: set the text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: append a child
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Get an attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Set (or replace) an attribute
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Remove an attribute, returning its value
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    /// Add a child element
    pub fn add_child(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    /// Set text content
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// First child with the given tag
    pub fn first_child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given tag
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text content of the first child with the given tag
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.first_child(name).and_then(|c| c.text.as_deref())
    }

    /// Serialize this element and its subtree
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out, 0);
        out
    }

    fn write_xml(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        let _ = write!(out, "{}<{}", pad, self.name);
        for (k, v) in &self.attributes {
            let _ = write!(out, " {}='{}'", k, escape(v.as_str()));
        }

        let text = self.text.as_deref().filter(|t| !t.is_empty());
        match (text, self.children.is_empty()) {
            (None, true) => out.push_str("/>\n"),
            (Some(t), true) => {
                let _ = writeln!(out, ">{}</{}>", escape(t), self.name);
            }
            (text, false) => {
                out.push_str(">\n");
                if let Some(t) = text {
                    let _ = writeln!(out, "{}  {}", pad, escape(t));
                }
                for child in &self.children {
                    child.write_xml(out, indent + 1);
                }
                let _ = writeln!(out, "{}</{}>", pad, self.name);
            }
        }
    }

    /// Maximum nesting depth of this subtree (a leaf has depth 1)
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(|c| c.depth()).max().unwrap_or(0)
    }
}

/// XML document representation
#[derive(Debug, Clone, Default)]
pub struct XmlDocument {
    /// Root element of the document
    pub root: Option<XmlElement>,
}

impl XmlDocument {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing root
    pub fn with_root(root: XmlElement) -> Self {
        Self { root: Some(root) }
    }

    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes(), &Limits::default())
    }

    /// Parse an XML document from a string, enforcing `limits`
    pub fn parse_with_limits(xml: &str, limits: &Limits) -> Result<Self> {
        Self::parse(xml.as_bytes(), limits)
    }

    /// Parse an XML document from bytes
    pub fn parse(xml: &[u8], limits: &Limits) -> Result<Self> {
        limits.check_xml_size(xml.len())?;

        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut doc = XmlDocument::new();
        let mut element_stack: Vec<XmlElement> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let element = Self::parse_element(&e, limits)?;
                    element_stack.push(element);
                    limits.check_xml_depth(element_stack.len())?;
                }
                Ok(Event::End(_)) => {
                    if let Some(current) = element_stack.pop() {
                        if let Some(parent) = element_stack.last_mut() {
                            parent.add_child(current);
                        } else {
                            doc.root = Some(current);
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    let element = Self::parse_element(&e, limits)?;
                    if let Some(parent) = element_stack.last_mut() {
                        parent.add_child(element);
                    } else {
                        doc.root = Some(element);
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                        Self::append_text(current, &text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let raw = e.into_inner();
                        let text = std::str::from_utf8(&raw)
                            .map_err(|e| Error::Xml(format!("Invalid CDATA content: {}", e)))?;
                        Self::append_text(current, text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // comments, processing instructions, declarations
            }
            buf.clear();
        }

        if !element_stack.is_empty() {
            return Err(Error::Xml("Unexpected end of document".to_string()));
        }

        Ok(doc)
    }

    fn append_text(element: &mut XmlElement, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        match element.text.as_mut() {
            Some(existing) => existing.push_str(text),
            None => element.text = Some(text.to_string()),
        }
    }

    /// Parse element from a start or empty tag
    fn parse_element(start: &BytesStart, limits: &Limits) -> Result<XmlElement> {
        let name_bytes = start.name();
        let name = std::str::from_utf8(name_bytes.as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?;

        let mut element = XmlElement::new(name);

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            element.attributes.insert(attr_name, attr_value);
        }
        limits.check_attributes(element.attributes.len())?;

        Ok(element)
    }

    /// Get the root element
    pub fn root(&self) -> Option<&XmlElement> {
        self.root.as_ref()
    }

    /// Get the root element mutably
    pub fn root_mut(&mut self) -> Option<&mut XmlElement> {
        self.root.as_mut()
    }

    /// Serialize the whole document with an XML declaration
    pub fn to_xml_string(&self) -> String {
        let mut out = String::from("<?xml version='1.0' ?>\n");
        if let Some(root) = &self.root {
            out.push_str(&root.to_xml_string());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<rml version="1.6"><model name="box"><static>true</static></model></rml>"#;
        let doc = XmlDocument::from_string(xml).unwrap();

        let root = doc.root().unwrap();
        assert_eq!(root.name, "rml");
        assert_eq!(root.attribute("version"), Some("1.6"));
        let model = root.first_child("model").unwrap();
        assert_eq!(model.attribute("name"), Some("box"));
        assert_eq!(model.child_text("static"), Some("true"));
    }

    #[test]
    fn test_attribute_order_preserved() {
        let xml = r#"<joint type="ball" name="j" extra="1"/>"#;
        let doc = XmlDocument::from_string(xml).unwrap();
        let keys: Vec<&str> = doc
            .root()
            .unwrap()
            .attributes
            .keys()
            .map(|k| k.as_str())
            .collect();
        assert_eq!(keys, vec!["type", "name", "extra"]);
    }

    #[test]
    fn test_cdata_and_entities() {
        let xml = r#"<plugin><script><![CDATA[a < b]]></script><note>x &amp; y</note></plugin>"#;
        let doc = XmlDocument::from_string(xml).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(root.child_text("script"), Some("a < b"));
        assert_eq!(root.child_text("note"), Some("x & y"));
    }

    #[test]
    fn test_children_named() {
        let xml = r#"<model><link/><joint/><link/></model>"#;
        let doc = XmlDocument::from_string(xml).unwrap();
        assert_eq!(doc.root().unwrap().children_named("link").count(), 2);
    }

    #[test]
    fn test_malformed_xml_is_error() {
        assert!(matches!(
            XmlDocument::from_string("<rml><model></rml>"),
            Err(Error::Xml(_))
        ));
    }

    #[test]
    fn test_depth_limit() {
        let limits = Limits {
            max_xml_depth: 2,
            ..Limits::default()
        };
        let result = XmlDocument::parse_with_limits("<a><b><c/></b></a>", &limits);
        assert!(result.is_ok());
        let result = XmlDocument::parse_with_limits("<a><b><c><d/></c></b></a>", &limits);
        assert!(matches!(result, Err(Error::LimitExceeded(_))));
    }

    #[test]
    fn test_serialize_and_reparse() {
        let element = XmlElement::new("link")
            .with_attribute("name", "base \"main\"")
            .with_child(XmlElement::new("pose").with_text("0 0 1 0 0 0"));
        let text = element.to_xml_string();
        assert!(text.contains("<pose>0 0 1 0 0 0</pose>"));

        let doc = XmlDocument::from_string(&text).unwrap();
        assert_eq!(doc.root(), Some(&element));
    }
}
