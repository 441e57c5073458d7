//! Resource location resolution
//!
//! This module turns the names found in documents (`model://box`, a relative
//! file name, an absolute path) into files on disk. [`FileResolver`] is the
//! seam the binder resolves `<include>` targets through; the stock
//! implementation is [`SearchPathResolver`].

use crate::error::Result;
use indexmap::IndexMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Environment variable holding extra colon-separated search directories
pub const RML_PATH_ENV: &str = "RML_PATH";

/// Resource location - can be a URI, file path, or in-memory text
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// File system path
    Path(PathBuf),
    /// URI with a scheme (`model://`, `file://`, ...)
    Uri(Url),
    /// In-memory document text
    String(String),
}

impl Location {
    /// Classify a name as written in a document
    pub fn parse(s: &str) -> Result<Self> {
        if s.contains("://") {
            return Ok(Location::Uri(Url::parse(s)?));
        }
        Ok(Location::Path(PathBuf::from(s)))
    }

    /// Get the location as a string
    pub fn as_str(&self) -> String {
        match self {
            Location::Path(p) => p.to_string_lossy().to_string(),
            Location::Uri(u) => u.to_string(),
            Location::String(s) => s.clone(),
        }
    }

    /// Scheme of a URI location
    pub fn scheme(&self) -> Option<&str> {
        match self {
            Location::Uri(u) => Some(u.scheme()),
            _ => None,
        }
    }

    /// Check if this is a local file
    pub fn is_file(&self) -> bool {
        match self {
            Location::Path(_) => true,
            Location::Uri(u) => u.scheme() == "file",
            Location::String(_) => false,
        }
    }
}

/// Locates files named by documents
pub trait FileResolver: Send + Sync {
    /// Resolve `name` to an existing path.
    ///
    /// `search_local` also tries the current working directory;
    /// `use_fallback` consults a user supplied callback as a last resort.
    fn resolve(&self, name: &str, search_local: bool, use_fallback: bool) -> Option<PathBuf>;
}

/// Callback consulted when every search path fails
pub type FallbackFn = Arc<dyn Fn(&str) -> Option<PathBuf> + Send + Sync>;

/// Resolver over URI prefix mappings and search directories.
///
/// Lookup order: URI prefix mappings in registration order, the directories
/// of `RML_PATH`, the name as given, the current directory, the fallback.
#[derive(Clone, Default)]
pub struct SearchPathResolver {
    uri_paths: IndexMap<String, Vec<PathBuf>>,
    search_paths: Vec<PathBuf>,
    fallback: Option<FallbackFn>,
}

impl SearchPathResolver {
    /// Resolver with no mappings and no environment search path
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver seeded from the `RML_PATH` environment variable
    pub fn from_env() -> Self {
        let mut resolver = Self::new();
        if let Ok(paths) = env::var(RML_PATH_ENV) {
            resolver.search_paths = split_paths(&paths).collect();
        }
        resolver
    }

    /// Map a URI prefix onto colon-separated directories.
    ///
    /// Only entries that exist and are directories are kept.
    pub fn add_uri_path(&mut self, uri: &str, paths: &str) {
        for path in split_paths(paths) {
            if path.is_dir() {
                self.uri_paths
                    .entry(uri.to_string())
                    .or_default()
                    .push(path);
            } else {
                tracing::debug!(uri = %uri, path = %path.display(), "skipping missing uri path");
            }
        }
    }

    /// Builder form of [`SearchPathResolver::add_uri_path`]
    pub fn with_uri_path(mut self, uri: &str, paths: &str) -> Self {
        self.add_uri_path(uri, paths);
        self
    }

    /// Append a search directory
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    /// Register the last-resort callback
    pub fn set_fallback<F>(&mut self, f: F)
    where
        F: Fn(&str) -> Option<PathBuf> + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(f));
    }

    /// Directories mapped for a URI prefix
    pub fn uri_paths(&self, uri: &str) -> &[PathBuf] {
        self.uri_paths.get(uri).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

impl FileResolver for SearchPathResolver {
    fn resolve(&self, name: &str, search_local: bool, use_fallback: bool) -> Option<PathBuf> {
        for (uri, paths) in &self.uri_paths {
            if let Some(suffix) = name.strip_prefix(uri.as_str()) {
                if let Some(found) = paths.iter().map(|p| p.join(suffix)).find(|p| p.exists()) {
                    return Some(found);
                }
            }
        }

        if let Some(found) = self
            .search_paths
            .iter()
            .map(|p| p.join(name))
            .find(|p| p.exists())
        {
            return Some(found);
        }

        let given = Path::new(name);
        if given.exists() {
            return Some(given.to_path_buf());
        }

        if search_local {
            if let Ok(cwd) = env::current_dir() {
                let local = cwd.join(name);
                if local.exists() {
                    return Some(local);
                }
            }
        }

        if use_fallback {
            if let Some(fallback) = &self.fallback {
                return fallback(name);
            }
        }

        None
    }
}

impl std::fmt::Debug for SearchPathResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchPathResolver")
            .field("uri_paths", &self.uri_paths)
            .field("search_paths", &self.search_paths)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

fn split_paths(paths: &str) -> impl Iterator<Item = PathBuf> + '_ {
    paths
        .split(':')
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_location_from_uri() {
        let loc = Location::parse("model://box").unwrap();
        assert_eq!(loc.scheme(), Some("model"));
        assert!(!loc.is_file());
    }

    #[test]
    fn test_location_from_path() {
        let loc = Location::parse("/tmp/box.rml").unwrap();
        assert!(matches!(loc, Location::Path(_)));
        assert!(loc.is_file());
    }

    #[test]
    fn test_location_as_str() {
        let loc = Location::String("<rml/>".to_string());
        assert_eq!(loc.as_str(), "<rml/>");
    }

    #[test]
    fn test_uri_prefix_resolution() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("box")).unwrap();

        let resolver = SearchPathResolver::new()
            .with_uri_path("model://", dir.path().to_str().unwrap());
        assert_eq!(
            resolver.resolve("model://box", false, false),
            Some(dir.path().join("box"))
        );
        assert_eq!(resolver.resolve("model://sphere", false, false), None);
    }

    #[test]
    fn test_missing_uri_path_is_dropped() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let paths = format!("{}:{}", missing.display(), dir.path().display());

        let mut resolver = SearchPathResolver::new();
        resolver.add_uri_path("model://", &paths);
        assert_eq!(resolver.uri_paths("model://"), &[dir.path().to_path_buf()]);
    }

    #[test]
    fn test_search_path_resolution() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("world.rml"), "<rml/>").unwrap();

        let mut resolver = SearchPathResolver::new();
        resolver.add_search_path(dir.path());
        assert_eq!(
            resolver.resolve("world.rml", false, false),
            Some(dir.path().join("world.rml"))
        );
    }

    #[test]
    fn test_fallback_only_when_asked() {
        let mut resolver = SearchPathResolver::new();
        resolver.set_fallback(|name| Some(PathBuf::from("/models").join(name)));

        assert_eq!(resolver.resolve("ghost", false, false), None);
        assert_eq!(
            resolver.resolve("ghost", false, true),
            Some(PathBuf::from("/models/ghost"))
        );
    }
}
