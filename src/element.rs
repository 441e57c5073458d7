//! Element descriptions and element instances
//!
//! The schema side and the document side of the tree are separate types:
//!
//! - [`ElementDescription`] is what the schema loader builds. It is immutable
//!   once loaded and shared through `Arc` by every instance created from it.
//! - [`Element`] is a bound node of a document. It owns its attribute and
//!   content cells and its child instances, and keeps the list of child
//!   descriptions it may instantiate.
//!
//! [`ElementDescription::instantiate`] is the only way from one to the other.
//! Both implement [`Node`].

use crate::documents::XmlElement;
use crate::error::{Error, Result};
use crate::param::{Param, ParamType};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Cardinality code of an element description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequiredCode {
    /// `0`: zero or one
    #[default]
    Optional,
    /// `1`: exactly one
    One,
    /// `+`: one or more
    OneOrMore,
    /// `*`: zero or more
    ZeroOrMore,
    /// `-1`: deprecated, ignored when bound
    Deprecated,
}

impl RequiredCode {
    /// Schema spelling of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredCode::Optional => "0",
            RequiredCode::One => "1",
            RequiredCode::OneOrMore => "+",
            RequiredCode::ZeroOrMore => "*",
            RequiredCode::Deprecated => "-1",
        }
    }

    /// Whether the document must contain the element
    pub fn is_required(&self) -> bool {
        matches!(self, RequiredCode::One | RequiredCode::OneOrMore)
    }

    /// Whether the element is deprecated
    pub fn is_deprecated(&self) -> bool {
        *self == RequiredCode::Deprecated
    }
}

impl FromStr for RequiredCode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(RequiredCode::Optional),
            "1" => Ok(RequiredCode::One),
            "+" => Ok(RequiredCode::OneOrMore),
            "*" => Ok(RequiredCode::ZeroOrMore),
            "-1" => Ok(RequiredCode::Deprecated),
            other => Err(format!("invalid required code '{}'", other)),
        }
    }
}

impl fmt::Display for RequiredCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared read interface of descriptions and instances
pub trait Node {
    /// Element name
    fn name(&self) -> &str;

    /// Cardinality code
    fn required(&self) -> RequiredCode;

    /// Whether children are copied verbatim instead of bound
    fn copy_children(&self) -> bool;

    /// Name of the referenced schema, if any
    fn reference(&self) -> Option<&str>;

    /// Attribute cells in declaration order
    fn attributes(&self) -> &[Param];

    /// Content cell
    fn value(&self) -> Option<&Param>;

    /// Child descriptions
    fn element_descriptions(&self) -> &[Arc<ElementDescription>];

    /// Attribute cell by key
    fn attribute(&self, key: &str) -> Option<&Param> {
        self.attributes().iter().find(|p| p.key() == key)
    }

    /// Whether an attribute with this key is declared
    fn has_attribute(&self, key: &str) -> bool {
        self.attribute(key).is_some()
    }

    /// Child description by name
    fn element_description(&self, name: &str) -> Option<&Arc<ElementDescription>> {
        self.element_descriptions().iter().find(|d| d.name() == name)
    }

    /// Whether a child description with this name exists
    fn has_element_description(&self, name: &str) -> bool {
        self.element_description(name).is_some()
    }
}

/// Schema-side element: the template instances are created from
#[derive(Debug, Clone, Default)]
pub struct ElementDescription {
    name: String,
    required: RequiredCode,
    reference: Option<String>,
    copy_children: bool,
    description: String,
    attributes: Vec<Param>,
    value: Option<Param>,
    elements: Vec<Arc<ElementDescription>>,
}

impl ElementDescription {
    /// Create an empty description
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Rename
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Set the cardinality
    pub fn set_required(&mut self, required: RequiredCode) {
        self.required = required;
    }

    /// Copy of this description with another cardinality
    pub fn with_required(&self, required: RequiredCode) -> Self {
        let mut copy = self.clone();
        copy.required = required;
        copy
    }

    /// Declare the content cell
    pub fn set_value(&mut self, type_name: &str, default: &str, required: bool, description: &str) {
        self.value = Some(Param::new(
            self.name.clone(),
            type_name,
            default,
            required,
            description,
        ));
    }

    /// Declare an attribute
    pub fn add_attribute(
        &mut self,
        name: &str,
        type_name: &str,
        default: &str,
        required: bool,
        description: &str,
    ) {
        self.attributes
            .push(Param::new(name, type_name, default, required, description));
    }

    /// Append a child description
    pub fn add_element_description(&mut self, element: Arc<ElementDescription>) {
        self.elements.push(element);
    }

    /// Mark the element as freeform
    pub fn set_copy_children(&mut self, copy_children: bool) {
        self.copy_children = copy_children;
    }

    /// Point at another schema to splice in at bind time
    pub fn set_reference(&mut self, reference: impl Into<String>) {
        self.reference = Some(reference.into());
    }

    /// Set the description text
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Description text
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Create a fresh instance.
    ///
    /// Attribute and content cells are cloned (so each instance owns its
    /// values); the child description list is shared.
    pub fn instantiate(&self) -> Element {
        Element {
            name: self.name.clone(),
            required: self.required,
            copy_children: self.copy_children,
            reference: self.reference.clone(),
            attributes: self.attributes.clone(),
            value: self.value.clone(),
            descriptions: self.elements.clone(),
            children: Vec::new(),
            original_version: String::new(),
            include_source: None,
        }
    }

    /// Render the description in schema syntax
    pub fn print_description(&self) -> String {
        self.to_schema_xml().to_xml_string()
    }

    fn to_schema_xml(&self) -> XmlElement {
        let mut xml = XmlElement::new("element")
            .with_attribute("name", self.name.clone())
            .with_attribute("required", self.required.as_str());
        if let Some(value) = &self.value {
            xml.set_attribute("type", value.type_name());
            xml.set_attribute("default", value.default_as_string());
        }
        if let Some(reference) = &self.reference {
            xml.set_attribute("ref", reference.clone());
        }
        if self.copy_children {
            xml.set_attribute("copy_data", "true");
        }
        if !self.description.is_empty() {
            xml.add_child(XmlElement::new("description").with_text(self.description.clone()));
        }
        for attr in &self.attributes {
            let mut a = XmlElement::new("attribute")
                .with_attribute("name", attr.key())
                .with_attribute("type", attr.type_name())
                .with_attribute("default", attr.default_as_string())
                .with_attribute("required", if attr.required() { "1" } else { "0" });
            if !attr.description().is_empty() {
                a.add_child(XmlElement::new("description").with_text(attr.description()));
            }
            xml.add_child(a);
        }
        for child in &self.elements {
            xml.add_child(child.to_schema_xml());
        }
        xml
    }
}

impl Node for ElementDescription {
    fn name(&self) -> &str {
        &self.name
    }

    fn required(&self) -> RequiredCode {
        self.required
    }

    fn copy_children(&self) -> bool {
        self.copy_children
    }

    fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    fn attributes(&self) -> &[Param] {
        &self.attributes
    }

    fn value(&self) -> Option<&Param> {
        self.value.as_ref()
    }

    fn element_descriptions(&self) -> &[Arc<ElementDescription>] {
        &self.elements
    }
}

/// A bound document node
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub(crate) name: String,
    pub(crate) required: RequiredCode,
    pub(crate) copy_children: bool,
    pub(crate) reference: Option<String>,
    pub(crate) attributes: Vec<Param>,
    pub(crate) value: Option<Param>,
    pub(crate) descriptions: Vec<Arc<ElementDescription>>,
    pub(crate) children: Vec<Element>,
    pub(crate) original_version: String,
    pub(crate) include_source: Option<PathBuf>,
}

impl Element {
    /// Create an instance with no schema behind it (freeform content)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Rename
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Add an attribute cell to this instance
    pub fn add_attribute(
        &mut self,
        name: &str,
        type_name: &str,
        default: &str,
        required: bool,
        description: &str,
    ) {
        self.attributes
            .push(Param::new(name, type_name, default, required, description));
    }

    /// Give this instance a content cell
    pub fn add_value(&mut self, type_name: &str, default: &str, required: bool) {
        self.value = Some(Param::new(self.name.clone(), type_name, default, required, ""));
    }

    /// Attribute cell by key, mutably
    pub fn attribute_mut(&mut self, key: &str) -> Option<&mut Param> {
        self.attributes.iter_mut().find(|p| p.key() == key)
    }

    /// Content cell, mutably
    pub fn value_mut(&mut self) -> Option<&mut Param> {
        self.value.as_mut()
    }

    /// Typed read by key.
    ///
    /// An empty key reads the content cell. Otherwise the attribute with that
    /// key is tried first, then the content of the first child element of
    /// that name, then the default content of the child description.
    pub fn get<T: ParamType>(&self, key: &str) -> Result<T> {
        if key.is_empty() {
            return match &self.value {
                Some(v) => v.get::<T>(),
                None => Err(self.not_defined(key)),
            };
        }

        if let Some(attr) = self.attribute(key) {
            return attr.get::<T>();
        }

        if let Some(value) = self.element(key).and_then(|c| c.value.as_ref()) {
            return value.get::<T>();
        }

        match self.element_description(key).and_then(|d| d.value()) {
            Some(value) => value.get::<T>(),
            None => Err(self.not_defined(key)),
        }
    }

    fn not_defined(&self, key: &str) -> Error {
        Error::UnknownAttribute {
            attribute: key.to_string(),
            element: self.name.clone(),
        }
    }

    /// Whether a child instance with this name exists
    pub fn has_element(&self, name: &str) -> bool {
        self.element(name).is_some()
    }

    /// First child instance with this name
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First child instance with this name, mutably
    pub fn element_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// All child instances with this name
    pub fn elements<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Child instances in document order
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Instantiate the child description `name` and append it.
    ///
    /// Children the new element requires exactly once are created as well.
    pub fn add_element(&mut self, name: &str) -> Result<&mut Element> {
        let description = self
            .element_description(name)
            .cloned()
            .ok_or_else(|| Error::UnknownElement {
                element: name.to_string(),
                parent: self.name.clone(),
            })?;

        let mut child = description.instantiate();
        child.original_version = self.original_version.clone();
        child.add_required_children()?;

        self.children.push(child);
        let last = self.children.len() - 1;
        Ok(&mut self.children[last])
    }

    fn add_required_children(&mut self) -> Result<()> {
        let required: Vec<String> = self
            .descriptions
            .iter()
            .filter(|d| d.required() == RequiredCode::One)
            .map(|d| d.name().to_string())
            .collect();
        for name in required {
            self.add_element(&name)?;
        }
        Ok(())
    }

    /// First child named `name`, created when absent
    pub fn get_or_add_element(&mut self, name: &str) -> Result<&mut Element> {
        match self.children.iter().position(|c| c.name == name) {
            Some(index) => Ok(&mut self.children[index]),
            None => self.add_element(name),
        }
    }

    /// Append an already built instance
    pub fn insert_element(&mut self, element: Element) {
        self.children.push(element);
    }

    /// Remove every child named `name`, returning how many went
    pub fn remove_elements(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|c| c.name != name);
        before - self.children.len()
    }

    /// Remove all children
    pub fn clear_elements(&mut self) {
        self.children.clear();
    }

    /// Version the enclosing document declared before any conversion
    pub fn original_version(&self) -> &str {
        &self.original_version
    }

    /// Record the declared document version
    pub fn set_original_version(&mut self, version: impl Into<String>) {
        self.original_version = version.into();
    }

    /// File this subtree was included from, if any
    pub fn include_source(&self) -> Option<&std::path::Path> {
        self.include_source.as_deref()
    }

    /// Restore every cell in the subtree to its default
    pub fn reset(&mut self) {
        for attr in &mut self.attributes {
            attr.reset();
        }
        if let Some(value) = &mut self.value {
            value.reset();
        }
        for child in &mut self.children {
            child.reset();
        }
    }

    /// Convert back to a plain XML element.
    ///
    /// Attributes are written when set or required; content is always
    /// written.
    pub fn to_xml(&self) -> XmlElement {
        let mut xml = XmlElement::new(self.name.clone());
        for attr in &self.attributes {
            if attr.is_set() || attr.required() {
                xml.set_attribute(attr.key(), attr.as_string());
            }
        }
        if let Some(value) = &self.value {
            let text = value.as_string();
            if !text.is_empty() {
                xml.set_text(text);
            }
        }
        for child in &self.children {
            xml.add_child(child.to_xml());
        }
        xml
    }

    /// Serialize this subtree
    pub fn to_xml_string(&self) -> String {
        self.to_xml().to_xml_string()
    }
}

impl Node for Element {
    fn name(&self) -> &str {
        &self.name
    }

    fn required(&self) -> RequiredCode {
        self.required
    }

    fn copy_children(&self) -> bool {
        self.copy_children
    }

    fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    fn attributes(&self) -> &[Param] {
        &self.attributes
    }

    fn value(&self) -> Option<&Param> {
        self.value.as_ref()
    }

    fn element_descriptions(&self) -> &[Arc<ElementDescription>] {
        &self.descriptions
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string())
    }
}
