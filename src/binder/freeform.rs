//! Freeform content
//!
//! Elements whose schema declares `copy_data` (plugins, geometry) keep their
//! children verbatim: every XML child becomes an instance with string-typed
//! attribute and content cells, recursively, without any schema checks.

use crate::documents::XmlElement;
use crate::element::Element;

/// Copy every XML child of `xml` under `element`
pub(crate) fn copy_children(element: &mut Element, xml: &XmlElement) {
    for child in &xml.children {
        let copied = copy_element(child, &element.original_version);
        element.children.push(copied);
    }
}

fn copy_element(xml: &XmlElement, version: &str) -> Element {
    let mut element = Element::new(xml.name.clone());
    element.original_version = version.to_string();

    // values are taken as defaults so no true/false remapping touches them
    for (key, value) in &xml.attributes {
        element.add_attribute(key, "string", value, true, "");
    }
    if let Some(text) = xml.text.as_deref() {
        element.add_value("string", text, true);
    }

    for child in &xml.children {
        let copied = copy_element(child, version);
        element.children.push(copied);
    }
    element
}
