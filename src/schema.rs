//! Schema loading
//!
//! Grammar files describe one element each:
//!
//! ```xml
//! <element name="link" required="*">
//!   <description>A physical link</description>
//!   <attribute name="name" type="string" default="__default__" required="1"/>
//!   <element name="gravity" type="bool" default="true" required="0"/>
//!   <include filename="pose.schema" required="0"/>
//! </element>
//! ```
//!
//! [`SchemaLoader`] turns such a tree into an [`ElementDescription`];
//! [`SchemaSet`] owns the grammar source and caches every file it has loaded,
//! so each schema is parsed once per session no matter how many documents
//! or `<include>`s use it.

use crate::documents::{XmlDocument, XmlElement};
use crate::element::{ElementDescription, Node, RequiredCode};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::loaders::Loader;
use crate::locations::Location;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Name of the grammar root file
pub const ROOT_SCHEMA: &str = "root.schema";

/// Version of the bundled grammar
pub const BUNDLED_VERSION: &str = "1.6";

const BUNDLED: &[(&str, &str)] = &[
    ("root.schema", include_str!("../schemas/1.6/root.schema")),
    ("world.schema", include_str!("../schemas/1.6/world.schema")),
    ("model.schema", include_str!("../schemas/1.6/model.schema")),
    ("link.schema", include_str!("../schemas/1.6/link.schema")),
    ("inertial.schema", include_str!("../schemas/1.6/inertial.schema")),
    ("joint.schema", include_str!("../schemas/1.6/joint.schema")),
    ("light.schema", include_str!("../schemas/1.6/light.schema")),
    ("plugin.schema", include_str!("../schemas/1.6/plugin.schema")),
    ("pose.schema", include_str!("../schemas/1.6/pose.schema")),
];

/// Where grammar files come from
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaSource {
    /// The grammar compiled into the library
    Bundled,
    /// `*.schema` files in a directory
    Directory(PathBuf),
}

/// Session-owned cache of loaded schema descriptions
#[derive(Debug)]
pub struct SchemaSet {
    source: SchemaSource,
    loader: Loader,
    cache: RwLock<HashMap<String, Arc<ElementDescription>>>,
}

impl SchemaSet {
    /// Schema set over `source`
    pub fn new(source: SchemaSource) -> Self {
        Self {
            source,
            loader: Loader::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Schema set over the bundled grammar
    pub fn bundled() -> Self {
        Self::new(SchemaSource::Bundled)
    }

    /// Schema set over a grammar directory
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(SchemaSource::Directory(dir.into()))
    }

    /// Set the limits used when reading grammar files
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.loader = self.loader.with_limits(limits);
        self
    }

    /// Grammar source
    pub fn source(&self) -> &SchemaSource {
        &self.source
    }

    /// Load (or fetch from the cache) the schema file `file_name`
    pub fn load(&self, file_name: &str) -> Result<Arc<ElementDescription>> {
        SchemaLoader::new(self).load_file(file_name)
    }

    /// The grammar root description
    pub fn root(&self) -> Result<Arc<ElementDescription>> {
        self.load(ROOT_SCHEMA)
    }

    /// Grammar version: the default of the root's `version` attribute
    pub fn version(&self) -> Result<String> {
        if self.source == SchemaSource::Bundled {
            return Ok(BUNDLED_VERSION.to_string());
        }
        let root = self.root()?;
        root.attribute("version")
            .map(|p| p.default_as_string())
            .ok_or_else(|| Error::MissingVersion {
                root: root.name().to_string(),
            })
    }

    /// Names of the schema files currently cached
    pub fn cached(&self) -> Vec<String> {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = cache.keys().cloned().collect();
        names.sort();
        names
    }

    fn cached_entry(&self, file_name: &str) -> Option<Arc<ElementDescription>> {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        cache.get(file_name).cloned()
    }

    fn insert(&self, file_name: &str, desc: Arc<ElementDescription>) -> Arc<ElementDescription> {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.entry(file_name.to_string()).or_insert(desc).clone()
    }

    fn read_source(&self, file_name: &str) -> Result<XmlDocument> {
        match &self.source {
            SchemaSource::Bundled => {
                let text = BUNDLED
                    .iter()
                    .find(|(name, _)| *name == file_name)
                    .map(|(_, text)| *text)
                    .ok_or_else(|| Error::UnknownSchema(file_name.to_string()))?;
                XmlDocument::parse_with_limits(text, self.loader.limits())
            }
            SchemaSource::Directory(dir) => {
                let path = dir.join(file_name);
                if !path.is_file() {
                    return Err(Error::UnknownSchema(path.display().to_string()));
                }
                self.loader.load_document(&Location::Path(path))
            }
        }
    }
}

impl Default for SchemaSet {
    fn default() -> Self {
        Self::bundled()
    }
}

/// Builds element descriptions from grammar trees
pub struct SchemaLoader<'a> {
    set: &'a SchemaSet,
    in_progress: Vec<String>,
}

impl<'a> SchemaLoader<'a> {
    /// Loader resolving `<include>`s through `set`
    pub fn new(set: &'a SchemaSet) -> Self {
        Self {
            set,
            in_progress: Vec::new(),
        }
    }

    /// Load a schema file, consulting the set's cache first
    pub fn load_file(&mut self, file_name: &str) -> Result<Arc<ElementDescription>> {
        if let Some(desc) = self.set.cached_entry(file_name) {
            return Ok(desc);
        }

        if self.in_progress.iter().any(|f| f == file_name) {
            return Err(Error::Resource(format!(
                "schema [{}] includes itself: {} -> {}",
                file_name,
                self.in_progress.join(" -> "),
                file_name
            )));
        }

        let doc = self.set.read_source(file_name)?;
        let root = doc
            .root()
            .ok_or_else(|| Error::Xml(format!("schema [{}] is empty", file_name)))?;

        self.in_progress.push(file_name.to_string());
        let loaded = self.load_element(root);
        self.in_progress.pop();

        let desc = loaded.map_err(|e| {
            tracing::error!(schema = %file_name, error = %e, "unable to load schema");
            e
        })?;

        tracing::debug!(schema = %file_name, "loaded schema");
        Ok(self.set.insert(file_name, Arc::new(desc)))
    }

    /// Build a description from one `<element>` declaration.
    ///
    /// An incomplete `<attribute>` does not stop the rest of the declaration
    /// from loading, but the first such failure is returned at the end.
    pub fn load_element(&mut self, xml: &XmlElement) -> Result<ElementDescription> {
        let name = xml.attribute("name").ok_or_else(|| Error::MissingName {
            context: "element".to_string(),
        })?;
        let required = xml.attribute("required").ok_or_else(|| Error::MissingRequired {
            element: name.to_string(),
        })?;

        let mut desc = ElementDescription::new(name);
        desc.set_required(parse_required(name, required));

        if let Some(text) = xml.child_text("description") {
            desc.set_description(text.trim());
        }

        if let Some(type_name) = xml.attribute("type") {
            let default = xml.attribute("default").unwrap_or("");
            let description = xml.child_text("description").unwrap_or("").trim();
            desc.set_value(type_name, default, required == "1", description);
        }

        if let Some(reference) = xml.attribute("ref") {
            desc.set_reference(reference);
        }

        let mut failure = None;

        for child in &xml.children {
            match child.name.as_str() {
                "attribute" => {
                    if let Err(e) = load_attribute(&mut desc, child) {
                        tracing::error!(error = %e, "skipping incomplete attribute declaration");
                        failure.get_or_insert(e);
                    }
                }
                "element" => {
                    if matches!(child.attribute("copy_data"), Some("true") | Some("1")) {
                        desc.set_copy_children(true);
                    } else {
                        let element = self.load_element(child)?;
                        desc.add_element_description(Arc::new(element));
                    }
                }
                "include" => {
                    let file_name = child.attribute("filename").ok_or_else(|| {
                        Error::Resource(format!(
                            "<include> in schema element <{}> has no filename",
                            name
                        ))
                    })?;
                    let included = self.load_file(file_name)?;
                    let included = match child.attribute("required") {
                        Some(code) => {
                            Arc::new(included.with_required(parse_required(name, code)))
                        }
                        None => included,
                    };
                    desc.add_element_description(included);
                }
                _ => {}
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(desc),
        }
    }
}

fn load_attribute(desc: &mut ElementDescription, xml: &XmlElement) -> Result<()> {
    let element = desc.name();
    let name = attribute_field(xml, element, "name")?;
    let type_name = attribute_field(xml, element, "type")?;
    let default = attribute_field(xml, element, "default")?;
    let required = attribute_field(xml, element, "required")?;
    let description = xml.child_text("description").unwrap_or("").trim();

    desc.add_attribute(name, type_name, default, required == "1", description);
    Ok(())
}

fn attribute_field<'x>(xml: &'x XmlElement, element: &str, field: &'static str) -> Result<&'x str> {
    xml.attribute(field).ok_or_else(|| Error::IncompleteAttribute {
        element: element.to_string(),
        attribute: xml.attribute("name").unwrap_or_default().to_string(),
        field,
    })
}

fn parse_required(element: &str, code: &str) -> RequiredCode {
    code.parse().unwrap_or_else(|e| {
        tracing::warn!(element = %element, error = %e, "treating element as optional");
        RequiredCode::Optional
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(xml: &str) -> XmlElement {
        XmlDocument::from_string(xml).unwrap().root.unwrap()
    }

    #[test]
    fn test_load_element_with_value_and_attributes() {
        let set = SchemaSet::bundled();
        let xml = parse(
            r#"<element name="mass" type="double" default="1.0" required="1">
                 <description>kg</description>
                 <attribute name="unit" type="string" default="kg" required="0"/>
               </element>"#,
        );
        let desc = SchemaLoader::new(&set).load_element(&xml).unwrap();
        assert_eq!(desc.name(), "mass");
        assert_eq!(desc.required(), RequiredCode::One);
        assert_eq!(desc.description(), "kg");

        let value = desc.value().unwrap();
        assert_eq!(value.type_name(), "double");
        assert!(value.required());
        assert_eq!(desc.attribute("unit").unwrap().default_as_string(), "kg");
    }

    #[test]
    fn test_missing_name() {
        let set = SchemaSet::bundled();
        let xml = parse(r#"<element required="1"/>"#);
        assert!(matches!(
            SchemaLoader::new(&set).load_element(&xml),
            Err(Error::MissingName { .. })
        ));
    }

    #[test]
    fn test_missing_required() {
        let set = SchemaSet::bundled();
        let xml = parse(r#"<element name="link"/>"#);
        assert!(matches!(
            SchemaLoader::new(&set).load_element(&xml),
            Err(Error::MissingRequired { ref element }) if element == "link"
        ));
    }

    #[test]
    fn test_incomplete_attribute_keeps_loading() {
        let set = SchemaSet::bundled();
        let xml = parse(
            r#"<element name="link" required="*">
                 <attribute name="name" type="string" required="1"/>
                 <attribute name="kind" type="string" default="x" required="0"/>
               </element>"#,
        );
        let err = SchemaLoader::new(&set).load_element(&xml).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompleteAttribute { ref attribute, field: "default", .. } if attribute == "name"
        ));
    }

    #[test]
    fn test_copy_data_sets_freeform() {
        let set = SchemaSet::bundled();
        let xml = parse(
            r#"<element name="plugin" required="*">
                 <element copy_data="true" required="*"/>
               </element>"#,
        );
        let desc = SchemaLoader::new(&set).load_element(&xml).unwrap();
        assert!(desc.copy_children());
        assert!(desc.element_descriptions().is_empty());
    }

    #[test]
    fn test_bundled_root() {
        let set = SchemaSet::bundled();
        let root = set.root().unwrap();
        assert_eq!(root.name(), "rml");
        assert!(root.has_element_description("world"));
        assert!(root.has_element_description("model"));

        let model = root.element_description("model").unwrap();
        assert_eq!(model.required(), RequiredCode::Optional);
        let nested = model.element_description("model").unwrap();
        assert_eq!(nested.reference(), Some("model"));
        assert_eq!(set.version().unwrap(), "1.6");
    }

    #[test]
    fn test_cache_is_shared() {
        let set = SchemaSet::bundled();
        let a = set.load("link.schema").unwrap();
        let b = set.load("link.schema").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(set.cached().contains(&"pose.schema".to_string()));
    }

    #[test]
    fn test_unknown_bundled_schema() {
        let set = SchemaSet::bundled();
        assert!(matches!(
            set.load("sensor.schema"),
            Err(Error::UnknownSchema(_))
        ));
    }

    #[test]
    fn test_directory_source_and_cycle() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("root.schema"),
            r#"<element name="doc" required="1">
                 <attribute name="version" type="string" default="2.0" required="1"/>
                 <include filename="a.schema" required="0"/>
               </element>"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("a.schema"),
            r#"<element name="a" required="*"><include filename="a.schema"/></element>"#,
        )
        .unwrap();

        let set = SchemaSet::from_dir(dir.path());
        assert!(matches!(set.root(), Err(Error::Resource(_))));

        fs::write(
            dir.path().join("a.schema"),
            r#"<element name="a" required="*"/>"#,
        )
        .unwrap();
        assert_eq!(set.version().unwrap(), "2.0");
    }
}
