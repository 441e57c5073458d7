//! Entity names and format versions
//!
//! Flattened entities are addressed with scoped names (`outer::inner`), and
//! documents declare a `major.minor` format version. Both are validated
//! here.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Separator between the scopes of a scoped name
pub const SCOPE_DELIMITER: &str = "::";

static VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\.(\d+)\s*$").expect("version pattern is valid"));

/// Join a scope and a name: `scoped_name("arm", "link1") == "arm::link1"`
pub fn scoped_name(scope: &str, name: &str) -> String {
    format!("{}{}{}", scope, SCOPE_DELIMITER, name)
}

/// Split off the innermost name: `"a::b::c"` gives `(Some("a::b"), "c")`
pub fn split_scoped(name: &str) -> (Option<&str>, &str) {
    match name.rsplit_once(SCOPE_DELIMITER) {
        Some((scope, local)) => (Some(scope), local),
        None => (None, name),
    }
}

/// Check that a name can be used as an entity name
pub fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.starts_with(SCOPE_DELIMITER) && !name.ends_with(SCOPE_DELIMITER)
}

/// A `major.minor` format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatVersion {
    /// Major number
    pub major: u32,
    /// Minor number
    pub minor: u32,
}

impl FormatVersion {
    /// Create a version
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// File-name form used by conversion rules: `1.5` becomes `1_5`
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.major, self.minor)
    }
}

impl FromStr for FormatVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = VERSION
            .captures(s)
            .ok_or_else(|| Error::Conversion(format!("invalid version '{}'", s)))?;
        let number = |i: usize| {
            caps[i]
                .parse::<u32>()
                .map_err(|_| Error::Conversion(format!("invalid version '{}'", s)))
        };
        Ok(Self::new(number(1)?, number(2)?))
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl PartialOrd for FormatVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FormatVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor).cmp(&(other.major, other.minor))
    }
}
