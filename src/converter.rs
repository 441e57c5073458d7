//! Document version conversion
//!
//! Documents written against an older grammar are rewritten in place before
//! binding. A conversion step is a rule tree keyed by the version it starts
//! from:
//!
//! ```xml
//! <convert name="rml">
//!   <convert name="model">
//!     <rename><from element="old"/><to element="new"/></rename>
//!     <add attribute="type" value="point"/>
//!     <remove element="obsolete"/>
//!   </convert>
//! </convert>
//! ```
//!
//! Nested `<convert name="x">` scopes apply their rules to every child `<x>`
//! of the element the enclosing scope matched.

use crate::documents::{XmlDocument, XmlElement};
use crate::error::{Error, Result};
use crate::names::FormatVersion;
use std::collections::BTreeMap;

/// Rewrites a document to another grammar version
pub trait VersionConverter: Send + Sync {
    /// Convert `doc` to `target`, updating the root `version` attribute
    fn convert(&self, doc: &mut XmlDocument, target: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
struct ConversionStep {
    to: FormatVersion,
    rules: XmlElement,
}

/// Converter driven by rule documents, chained one step at a time
#[derive(Debug, Clone, Default)]
pub struct RuleConverter {
    steps: BTreeMap<FormatVersion, ConversionStep>,
}

impl RuleConverter {
    /// Converter without any rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Converter with the bundled `1.5 -> 1.6` rules
    pub fn bundled() -> Result<Self> {
        let mut converter = Self::new();
        converter.add_rules("1.5", "1.6", include_str!("../schemas/1.6/1_5.convert"))?;
        Ok(converter)
    }

    /// Register the step converting `from` into `to`
    pub fn add_rules(&mut self, from: &str, to: &str, rules: &str) -> Result<()> {
        let from: FormatVersion = from.parse()?;
        let to: FormatVersion = to.parse()?;
        if to <= from {
            return Err(Error::Conversion(format!(
                "rules must move forward, got {} -> {}",
                from, to
            )));
        }

        let rules = XmlDocument::from_string(rules)?
            .root
            .filter(|r| r.name == "convert")
            .ok_or_else(|| Error::Conversion("rule document has no <convert> root".to_string()))?;

        self.steps.insert(from, ConversionStep { to, rules });
        Ok(())
    }

    /// Builder form of [`RuleConverter::add_rules`]
    pub fn with_rules(mut self, from: &str, to: &str, rules: &str) -> Result<Self> {
        self.add_rules(from, to, rules)?;
        Ok(self)
    }
}

impl VersionConverter for RuleConverter {
    fn convert(&self, doc: &mut XmlDocument, target: &str) -> Result<()> {
        let root = doc
            .root_mut()
            .ok_or_else(|| Error::Conversion("document is empty".to_string()))?;
        let declared = root
            .attribute("version")
            .ok_or_else(|| Error::MissingVersion {
                root: root.name.clone(),
            })?;

        let mut current: FormatVersion = declared.parse()?;
        let target: FormatVersion = target.parse()?;
        if current > target {
            return Err(Error::Conversion(format!(
                "cannot convert version {} down to {}",
                current, target
            )));
        }

        while current != target {
            let step = self.steps.get(&current).ok_or_else(|| {
                Error::Conversion(format!("no rules to convert from version {}", current))
            })?;
            if step.to > target {
                return Err(Error::Conversion(format!(
                    "rules from {} overshoot target {}",
                    current, target
                )));
            }

            let scope = step.rules.attribute("name").unwrap_or_default();
            if scope != root.name {
                return Err(Error::Conversion(format!(
                    "rules for <{}> cannot convert <{}>",
                    scope, root.name
                )));
            }

            apply_rules(root, &step.rules);
            tracing::info!(from = %current, to = %step.to, "converted document");
            current = step.to;
            root.set_attribute("version", current.to_string());
        }

        Ok(())
    }
}

fn apply_rules(element: &mut XmlElement, rules: &XmlElement) {
    for rule in &rules.children {
        match rule.name.as_str() {
            "convert" => {
                let Some(name) = rule.attribute("name") else {
                    tracing::warn!("<convert> rule without a name, skipping");
                    continue;
                };
                for child in element.children.iter_mut().filter(|c| c.name == name) {
                    apply_rules(child, rule);
                }
            }
            "rename" => rename(element, rule),
            "add" => add(element, rule),
            "remove" => remove(element, rule),
            other => tracing::warn!(rule = %other, "unknown conversion rule, skipping"),
        }
    }
}

fn rename(element: &mut XmlElement, rule: &XmlElement) {
    let (Some(from), Some(to)) = (rule.first_child("from"), rule.first_child("to")) else {
        tracing::warn!("<rename> needs <from> and <to>");
        return;
    };

    match (from.attribute("element"), to.attribute("element")) {
        (Some(old), Some(new)) => {
            for child in element.children.iter_mut().filter(|c| c.name == old) {
                child.name = new.to_string();
            }
        }
        _ => {
            if let (Some(old), Some(new)) = (from.attribute("attribute"), to.attribute("attribute")) {
                if let Some(value) = element.remove_attribute(old) {
                    element.set_attribute(new, value);
                }
            }
        }
    }
}

fn add(element: &mut XmlElement, rule: &XmlElement) {
    let value = rule.attribute("value");
    if let Some(name) = rule.attribute("element") {
        if element.first_child(name).is_none() {
            let mut child = XmlElement::new(name);
            if let Some(value) = value {
                child.set_text(value);
            }
            element.add_child(child);
        }
    } else if let Some(name) = rule.attribute("attribute") {
        if element.attribute(name).is_none() {
            element.set_attribute(name, value.unwrap_or_default());
        }
    }
}

fn remove(element: &mut XmlElement, rule: &XmlElement) {
    if let Some(name) = rule.attribute("element") {
        element.children.retain(|c| c.name != name);
    } else if let Some(name) = rule.attribute("attribute") {
        element.remove_attribute(name);
    }
}
