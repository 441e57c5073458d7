//! Binding documents to schema descriptions
//!
//! [`Reader`] is a read session: it owns the schema cache, the file resolver
//! used for `<include>`s, the format hooks and an optional version
//! converter. Reading a document parses it, converts it to the grammar
//! version if needed and binds every XML node to the matching schema
//! description, producing an owned [`Element`] tree.
//!
//! Unknown elements and attributes are logged and skipped. Missing required
//! content, unparsable values and failures inside included files abort the
//! read.

mod freeform;
mod include;
pub mod rename;

use crate::converter::{RuleConverter, VersionConverter};
use crate::documents::{XmlDocument, XmlElement};
use crate::element::{Element, ElementDescription, Node};
use crate::error::{Error, Result};
use crate::helper::{FormatHelper, RmlHelper};
use crate::limits::Limits;
use crate::loaders::Loader;
use crate::locations::{FileResolver, Location, SearchPathResolver};
use crate::schema::SchemaSet;
use std::path::Path;
use std::sync::Arc;

/// Position of the node being bound
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope<'p> {
    /// Name of the enclosing element (empty at the top)
    parent: &'p str,
    /// Nesting depth within the current document
    depth: usize,
    /// Number of `<include>`s being resolved around this document
    include_depth: usize,
}

impl<'p> Scope<'p> {
    fn top(include_depth: usize) -> Self {
        Self {
            parent: "",
            depth: 1,
            include_depth,
        }
    }

    fn child<'c>(&self, parent: &'c str) -> Scope<'c> {
        Scope {
            parent,
            depth: self.depth + 1,
            include_depth: self.include_depth,
        }
    }
}

/// A document read session
pub struct Reader {
    schemas: Arc<SchemaSet>,
    resolver: Box<dyn FileResolver>,
    helper: Box<dyn FormatHelper>,
    converter: Option<Box<dyn VersionConverter>>,
    limits: Limits,
    loader: Loader,
}

impl Reader {
    /// Session over the bundled grammar, `RML_PATH` search paths and the
    /// bundled conversion rules
    pub fn new() -> Self {
        let converter: Option<Box<dyn VersionConverter>> = match RuleConverter::bundled() {
            Ok(c) => Some(Box::new(c)),
            Err(e) => {
                tracing::error!(error = %e, "bundled conversion rules are unusable");
                None
            }
        };

        Self {
            schemas: Arc::new(SchemaSet::bundled()),
            resolver: Box::new(SearchPathResolver::from_env()),
            helper: Box::new(RmlHelper::new()),
            converter,
            limits: Limits::default(),
            loader: Loader::new(),
        }
    }

    /// Use another schema set (shared between sessions through `Arc`)
    pub fn with_schemas(mut self, schemas: Arc<SchemaSet>) -> Self {
        self.schemas = schemas;
        self
    }

    /// Use another file resolver
    pub fn with_resolver(mut self, resolver: impl FileResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Use other format hooks
    pub fn with_helper(mut self, helper: impl FormatHelper + 'static) -> Self {
        self.helper = Box::new(helper);
        self
    }

    /// Use another version converter
    pub fn with_converter(mut self, converter: impl VersionConverter + 'static) -> Self {
        self.converter = Some(Box::new(converter));
        self
    }

    /// Refuse documents whose version differs from the grammar's
    pub fn without_converter(mut self) -> Self {
        self.converter = None;
        self
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.loader = self.loader.with_limits(limits.clone());
        self.limits = limits;
        self
    }

    /// Schema set of this session
    pub fn schemas(&self) -> &Arc<SchemaSet> {
        &self.schemas
    }

    /// Limits in force
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Read and bind a document file.
    ///
    /// The path goes through the resolver first (search paths, current
    /// directory) and is used as given when that finds nothing.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<Element> {
        let path = path.as_ref();
        let resolved = self
            .resolver
            .resolve(&path.to_string_lossy(), true, false)
            .unwrap_or_else(|| path.to_path_buf());
        self.read_path(&resolved, 0)
    }

    /// Read and bind a document held in memory; `source` names it in logs
    pub fn read_str(&self, xml: &str, source: &str) -> Result<Element> {
        self.read_str_at(xml, source, 0)
    }

    /// Bind an already parsed document
    pub fn read_document(&self, doc: XmlDocument, source: &str) -> Result<Element> {
        self.read_document_at(doc, source, 0)
    }

    /// Bind one XML node against `desc`.
    ///
    /// `None` stands for an absent node, which binds to an empty instance
    /// unless the description is required.
    pub fn bind(&self, xml: Option<&XmlElement>, desc: &ElementDescription) -> Result<Element> {
        self.bind_node(xml, desc, Scope::top(0), "")
    }

    pub(crate) fn read_path(&self, path: &Path, include_depth: usize) -> Result<Element> {
        let doc = self.loader.load_document(&Location::Path(path.to_path_buf()))?;
        let mut element = self.read_document_at(doc, &path.display().to_string(), include_depth)?;
        element.include_source = Some(path.to_path_buf());
        Ok(element)
    }

    pub(crate) fn read_str_at(&self, xml: &str, source: &str, include_depth: usize) -> Result<Element> {
        let doc = self.loader.load_document(&Location::String(xml.to_string()))?;
        self.read_document_at(doc, source, include_depth)
    }

    pub(crate) fn read_document_at(
        &self,
        mut doc: XmlDocument,
        source: &str,
        include_depth: usize,
    ) -> Result<Element> {
        let root = doc
            .root()
            .ok_or_else(|| Error::Xml(format!("document [{}] has no root element", source)))?;

        let expected = self.helper.root_name();
        if root.name != expected {
            return Err(Error::WrongRoot {
                expected: expected.to_string(),
                found: root.name.clone(),
            });
        }

        let declared = root
            .attribute("version")
            .map(|v| v.trim().to_string())
            .ok_or_else(|| Error::MissingVersion {
                root: root.name.clone(),
            })?;

        let target = self.schemas.version()?;
        if declared != target {
            let converter = self.converter.as_ref().ok_or_else(|| {
                Error::Conversion(format!(
                    "document [{}] has version {} but no converter is configured for {}",
                    source, declared, target
                ))
            })?;
            tracing::info!(source = %source, from = %declared, to = %target, "converting document");
            converter.convert(&mut doc, &target)?;
        }

        let root_desc = self.schemas.root()?;
        let root = doc
            .root()
            .ok_or_else(|| Error::Xml(format!("document [{}] has no root element", source)))?;

        tracing::debug!(source = %source, version = %declared, "binding document");
        let mut element = self.bind_node(Some(root), &root_desc, Scope::top(include_depth), &declared)?;
        element.original_version = declared;
        Ok(element)
    }

    pub(crate) fn bind_node(
        &self,
        xml: Option<&XmlElement>,
        desc: &ElementDescription,
        scope: Scope<'_>,
        version: &str,
    ) -> Result<Element> {
        self.limits.check_xml_depth(scope.depth)?;

        let mut element = desc.instantiate();
        element.original_version = version.to_string();

        if desc.required().is_deprecated() {
            tracing::warn!(element = %desc.name(), "element is deprecated");
            return Ok(element);
        }

        let Some(xml) = xml else {
            if desc.required().is_required() {
                return Err(Error::MissingRequiredElement {
                    element: desc.name().to_string(),
                    parent: scope.parent.to_string(),
                });
            }
            return Ok(element);
        };

        set_content(&mut element, xml)?;

        if let Some(reference) = desc.reference() {
            let referenced = self.schemas.load(&format!("{}.schema", reference))?;
            let mut spliced = referenced.instantiate();
            spliced.required = element.required;
            spliced.original_version = std::mem::take(&mut element.original_version);
            element = spliced;
            set_content(&mut element, xml)?;
        }

        for (key, raw) in &xml.attributes {
            match element.attribute_mut(key) {
                Some(param) => param.try_set_from_string(raw)?,
                None => {
                    let e = Error::UnknownAttribute {
                        attribute: key.clone(),
                        element: xml.name.clone(),
                    };
                    tracing::warn!(error = %e, "ignoring attribute");
                }
            }
        }

        if let Some(unset) = element.attributes().iter().find(|p| p.required() && !p.is_set()) {
            return Err(Error::RequiredAttributeUnset {
                key: unset.key().to_string(),
                element: xml.name.clone(),
            });
        }

        if element.copy_children {
            freeform::copy_children(&mut element, xml);
            return Ok(element);
        }

        let name = element.name.clone();
        for child in &xml.children {
            if child.name == "include" {
                include::process_include(self, &mut element, child, scope.child(&name))?;
                continue;
            }

            match element.element_description(&child.name).cloned() {
                Some(child_desc) => {
                    let bound = self.bind_node(Some(child), &child_desc, scope.child(&name), version)?;
                    element.children.push(bound);
                }
                None => {
                    let e = Error::UnknownElement {
                        element: child.name.clone(),
                        parent: name.clone(),
                    };
                    tracing::warn!(error = %e, "ignoring element");
                }
            }
        }

        add_missing_required(&mut element)?;
        Ok(element)
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("schemas", &self.schemas)
            .field("root_name", &self.helper.root_name())
            .field("converter", &self.converter.is_some())
            .field("limits", &self.limits)
            .finish()
    }
}

fn set_content(element: &mut Element, xml: &XmlElement) -> Result<()> {
    if let (Some(text), Some(value)) = (xml.text.as_deref(), element.value.as_mut()) {
        value.try_set_from_string(text)?;
    }
    Ok(())
}

/// Ball joints have no axis; a joint of type `ball` gets default instances
/// for whatever required children it lacks instead of failing.
fn synthesizes_missing_children(element: &Element) -> bool {
    element.name == "joint"
        && element
            .attribute("type")
            .map(|t| t.as_string() == "ball")
            .unwrap_or(false)
}

fn add_missing_required(element: &mut Element) -> Result<()> {
    let missing: Vec<String> = element
        .descriptions
        .iter()
        .filter(|d| d.required().is_required())
        .map(|d| d.name().to_string())
        .filter(|name| !element.has_element(name))
        .collect();

    for name in missing {
        if !synthesizes_missing_children(element) {
            return Err(Error::MissingRequiredElement {
                element: name,
                parent: element.name.clone(),
            });
        }
        tracing::debug!(joint = ?element.attribute("name").map(|p| p.as_string()), element = %name, "adding default element to ball joint");
        element.add_element(&name)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Pose, Vector3};

    fn read(xml: &str) -> Result<Element> {
        Reader::new().read_str(xml, "test")
    }

    #[test]
    fn test_light_requires_name() {
        let err = read(r#"<rml version="1.6"><light/></rml>"#).unwrap_err();
        assert!(matches!(
            err,
            Error::RequiredAttributeUnset { ref key, ref element } if key == "name" && element == "light"
        ));

        let root = read(r#"<rml version="1.6"><light name="sun"/></rml>"#).unwrap();
        let light = root.element("light").unwrap();
        assert_eq!(light.get::<String>("name").unwrap(), "sun");
        assert_eq!(light.get::<String>("type").unwrap(), "point");
    }

    #[test]
    fn test_wrong_root() {
        assert!(matches!(
            read(r#"<sdf version="1.6"/>"#),
            Err(Error::WrongRoot { .. })
        ));
    }

    #[test]
    fn test_missing_version() {
        assert!(matches!(
            read(r#"<rml><light name="sun"/></rml>"#),
            Err(Error::MissingVersion { .. })
        ));
    }

    #[test]
    fn test_unconvertible_version_without_converter() {
        let reader = Reader::new().without_converter();
        assert!(matches!(
            reader.read_str(r#"<rml version="1.5"/>"#, "test"),
            Err(Error::Conversion(_))
        ));
    }

    #[test]
    fn test_original_version_is_recorded() {
        let root = read(
            r#"<rml version="1.5"><model name="m"><allow_auto_disable_links>false</allow_auto_disable_links></model></rml>"#,
        )
        .unwrap();
        assert_eq!(root.original_version(), "1.5");
        let model = root.element("model").unwrap();
        assert_eq!(model.original_version(), "1.5");
        assert!(!model.get::<bool>("allow_auto_disable").unwrap());
    }

    #[test]
    fn test_content_parse_failure() {
        let err = read(r#"<rml version="1.6"><model name="m"><static>maybe</static></model></rml>"#)
            .unwrap_err();
        assert!(matches!(err, Error::ParseFailure { ref key, .. } if key == "static"));
    }

    #[test]
    fn test_nested_model_reference() {
        let root = read(
            r#"<rml version="1.6">
                 <model name="outer">
                   <model name="inner"><link name="l"/></model>
                 </model>
               </rml>"#,
        )
        .unwrap();
        let inner = root.element("model").unwrap().element("model").unwrap();
        assert_eq!(inner.get::<String>("name").unwrap(), "inner");
        assert!(inner.has_element("link"));
        assert!(inner.has_element_description("joint"));
    }

    #[test]
    fn test_required_child_missing() {
        let err = read(
            r#"<rml version="1.6"><model name="m">
                 <joint name="j" type="revolute"><parent>a</parent><child>b</child></joint>
               </model></rml>"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingRequiredElement { ref element, ref parent } if element == "axis" && parent == "joint"
        ));
    }

    #[test]
    fn test_ball_joint_gets_default_axis() {
        let root = read(
            r#"<rml version="1.6"><model name="m">
                 <joint name="j" type="ball"><parent>a</parent><child>b</child></joint>
               </model></rml>"#,
        )
        .unwrap();
        let joint = root.element("model").unwrap().element("joint").unwrap();
        let xyz: Vector3 = joint.element("axis").unwrap().get("xyz").unwrap();
        assert_eq!(xyz, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_bind_absent_node() {
        let reader = Reader::new();
        let schemas = reader.schemas().clone();
        let pose = schemas.load("pose.schema").unwrap();
        let bound = reader.bind(None, &pose).unwrap();
        assert_eq!(bound.get::<Pose>("").unwrap(), Pose::default());

        let root = schemas.root().unwrap();
        assert!(matches!(
            reader.bind(None, &root),
            Err(Error::MissingRequiredElement { .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let reader = Reader::new().with_limits(Limits {
            max_xml_depth: 2,
            ..Limits::default()
        });
        let err = reader
            .read_str(
                r#"<rml version="1.6"><model name="m"><link name="l"/></model></rml>"#,
                "test",
            )
            .unwrap_err();
        assert!(matches!(err, Error::LimitExceeded(_)));
    }
}
