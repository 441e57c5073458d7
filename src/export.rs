//! JSON export
//!
//! Bound trees are exported with the BadgerFish convention: attributes are
//! keys prefixed with `@`, element content sits under `$`, and each child
//! becomes a key named after its tag (an array when the tag repeats).
//! Schema descriptions export as [`DescriptionInfo`] records.

use crate::element::{Element, ElementDescription, Node};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// Attribute prefix
pub const ATTRIBUTE_PREFIX: &str = "@";

/// Key holding element content
pub const TEXT_KEY: &str = "$";

/// Export a bound tree, wrapped in an object keyed by the root tag
pub fn to_json(element: &Element) -> JsonValue {
    let mut root = Map::new();
    root.insert(element.name().to_string(), decode(element));
    JsonValue::Object(root)
}

/// Export a bound tree as a JSON string
pub fn to_json_string(element: &Element, pretty: bool) -> serde_json::Result<String> {
    let value = to_json(element);
    if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
}

fn decode(element: &Element) -> JsonValue {
    let mut result = Map::new();

    for attr in element.attributes() {
        if attr.is_set() || attr.required() {
            let key = format!("{}{}", ATTRIBUTE_PREFIX, attr.key());
            result.insert(key, JsonValue::String(attr.as_string()));
        }
    }

    if let Some(value) = element.value() {
        result.insert(TEXT_KEY.to_string(), JsonValue::String(value.as_string()));
    }

    for child in element.children() {
        let decoded = decode(child);
        match result.get_mut(child.name()) {
            Some(JsonValue::Array(items)) => items.push(decoded),
            Some(existing) => {
                let first = existing.take();
                *existing = JsonValue::Array(vec![first, decoded]);
            }
            None => {
                result.insert(child.name().to_string(), decoded);
            }
        }
    }

    JsonValue::Object(result)
}

/// Serializable view of an element description
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DescriptionInfo {
    /// Element name
    pub name: String,

    /// Cardinality code
    pub required: String,

    /// Content type tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,

    /// Content default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Referenced schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Whether children are copied verbatim
    pub copy_data: bool,

    /// Declared attributes
    pub attributes: Vec<AttributeInfo>,

    /// Child descriptions
    pub elements: Vec<DescriptionInfo>,
}

/// Serializable view of an attribute declaration
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AttributeInfo {
    /// Attribute name
    pub name: String,

    /// Type tag
    #[serde(rename = "type")]
    pub type_name: String,

    /// Default value
    pub default: String,

    /// Whether the document must set it
    pub required: bool,
}

impl From<&ElementDescription> for DescriptionInfo {
    fn from(desc: &ElementDescription) -> Self {
        Self {
            name: desc.name().to_string(),
            required: desc.required().to_string(),
            value_type: desc.value().map(|v| v.type_name().to_string()),
            default: desc.value().map(|v| v.default_as_string()),
            reference: desc.reference().map(str::to_string),
            copy_data: desc.copy_children(),
            attributes: desc
                .attributes()
                .iter()
                .map(|a| AttributeInfo {
                    name: a.key().to_string(),
                    type_name: a.type_name().to_string(),
                    default: a.default_as_string(),
                    required: a.required(),
                })
                .collect(),
            elements: desc
                .element_descriptions()
                .iter()
                .map(|d| DescriptionInfo::from(d.as_ref()))
                .collect(),
        }
    }
}
