//! Resource loading utilities
//!
//! This module reads model documents, schema files and conversion rules from
//! their [`Location`], enforcing the size limit before any parsing happens.

use crate::documents::XmlDocument;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::locations::Location;
use std::fs;
use std::path::Path;

/// Resource loader for schemas and documents
#[derive(Debug, Clone, Default)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Limits in force
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Load a resource as a string
    pub fn load(&self, location: &Location) -> Result<String> {
        match location {
            Location::Path(path) => self.load_path(path),
            Location::Uri(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| Error::Resource(format!("Invalid file URI '{}'", url)))?;
                self.load_path(&path)
            }
            Location::Uri(url) => Err(Error::Resource(format!(
                "URI '{}' must be resolved to a file before loading",
                url
            ))),
            Location::String(s) => {
                self.limits.check_xml_size(s.len())?;
                Ok(s.clone())
            }
        }
    }

    fn load_path(&self, path: &Path) -> Result<String> {
        if let Ok(meta) = fs::metadata(path) {
            self.limits.check_xml_size(meta.len() as usize)?;
        }

        fs::read_to_string(path).map_err(|e| {
            Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
        })
    }

    /// Load and parse a resource
    pub fn load_document(&self, location: &Location) -> Result<XmlDocument> {
        let content = self.load(location)?;
        XmlDocument::parse_with_limits(&content, &self.limits)
    }
}
