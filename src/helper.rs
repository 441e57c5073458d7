//! Format-specific hooks
//!
//! The binder is generic over the document format; what differs between
//! formats built on the same machinery is the root tag and how a model
//! directory maps to the file to read. [`RmlHelper`] is the stock
//! implementation for `rml` documents.

use crate::documents::XmlDocument;
use crate::loaders::Loader;
use crate::locations::Location;
use crate::schema::BUNDLED_VERSION;
use std::path::{Path, PathBuf};

/// Format hooks used by the reader
pub trait FormatHelper: Send + Sync {
    /// Tag of the document root element
    fn root_name(&self) -> &str;

    /// Map a resolved include directory to the document file inside it
    fn uri_to_filename(&self, dir: &Path) -> Option<PathBuf>;
}

/// Manifest file of a model directory
pub const MODEL_CONFIG: &str = "model.config";

/// Manifest file name used before `model.config`
pub const LEGACY_MANIFEST: &str = "manifest.xml";

/// Hooks for `rml` documents
#[derive(Debug, Clone)]
pub struct RmlHelper {
    version: String,
    loader: Loader,
}

impl RmlHelper {
    /// Helper preferring documents of the bundled grammar version
    pub fn new() -> Self {
        Self {
            version: BUNDLED_VERSION.to_string(),
            loader: Loader::new(),
        }
    }

    /// Prefer manifest entries of another version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

impl Default for RmlHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatHelper for RmlHelper {
    fn root_name(&self) -> &str {
        crate::ROOT_NAME
    }

    /// Read the directory's manifest and pick its `<rml>` entry.
    ///
    /// The entry whose `version` matches ours wins; otherwise the first one
    /// is used.
    fn uri_to_filename(&self, dir: &Path) -> Option<PathBuf> {
        let mut manifest = dir.join(MODEL_CONFIG);
        if !manifest.exists() {
            tracing::warn!(
                dir = %dir.display(),
                "{} for a model is deprecated, rename it to {}",
                LEGACY_MANIFEST,
                MODEL_CONFIG
            );
            manifest = dir.join(LEGACY_MANIFEST);
        }

        let doc: XmlDocument = match self.loader.load_document(&Location::Path(manifest.clone())) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!(manifest = %manifest.display(), error = %e, "unable to read model manifest");
                return None;
            }
        };

        let Some(model) = doc.root().filter(|r| r.name == "model") else {
            tracing::error!(manifest = %manifest.display(), "no <model> element in manifest");
            return None;
        };

        let entry = model
            .children_named("rml")
            .find(|e| e.attribute("version") == Some(self.version.as_str()))
            .or_else(|| model.first_child("rml"))?;

        let file = entry.text.as_deref()?.trim();
        if file.is_empty() {
            return None;
        }
        Some(dir.join(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_root_name() {
        assert_eq!(RmlHelper::new().root_name(), "rml");
    }

    #[test]
    fn test_manifest_prefers_matching_version() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(MODEL_CONFIG),
            r#"<?xml version="1.0"?>
            <model>
              <name>box</name>
              <rml version="1.5">box_old.rml</rml>
              <rml version="1.6">box.rml</rml>
            </model>"#,
        )
        .unwrap();

        let helper = RmlHelper::new();
        assert_eq!(
            helper.uri_to_filename(dir.path()),
            Some(dir.path().join("box.rml"))
        );

        let helper = RmlHelper::new().with_version("2.0");
        assert_eq!(
            helper.uri_to_filename(dir.path()),
            Some(dir.path().join("box_old.rml"))
        );
    }

    #[test]
    fn test_legacy_manifest() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(LEGACY_MANIFEST),
            "<model><rml version='1.6'>m.rml</rml></model>",
        )
        .unwrap();
        assert_eq!(
            RmlHelper::new().uri_to_filename(dir.path()),
            Some(dir.path().join("m.rml"))
        );
    }

    #[test]
    fn test_missing_manifest() {
        let dir = TempDir::new().unwrap();
        assert_eq!(RmlHelper::new().uri_to_filename(dir.path()), None);
    }
}
