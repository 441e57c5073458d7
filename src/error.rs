//! Error types for rmlformat
//!
//! This module defines all error types used throughout the library.
//! Schema authoring errors come from the loader, binding errors from the
//! binder. `UnknownElement`, `UnknownAttribute` and `UnresolvableInclude` are
//! tolerated conditions: they are formatted into log output and never
//! returned from a successful read.

use thiserror::Error;

/// Result type alias using rmlformat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for rmlformat operations
#[derive(Error, Debug)]
pub enum Error {
    /// A schema element or attribute declaration has no `name`
    #[error("schema {context} is missing the name attribute")]
    MissingName {
        /// What was being declared (`element`, `attribute`)
        context: String,
    },

    /// A schema element declaration has no `required` attribute
    #[error("schema element <{element}> is missing the required attribute")]
    MissingRequired {
        /// Name of the element declaration
        element: String,
    },

    /// A schema attribute declaration lacks one of `type`, `default`, `required`
    #[error("attribute [{attribute}] of schema element <{element}> is missing a {field}")]
    IncompleteAttribute {
        /// Owning element declaration
        element: String,
        /// Attribute name (empty when the name itself is missing)
        attribute: String,
        /// Missing field
        field: &'static str,
    },

    /// A required child element is absent from the document
    #[error("missing required element <{element}>, child of <{parent}>")]
    MissingRequiredElement {
        /// Name of the missing element
        element: String,
        /// Name of the element that should contain it
        parent: String,
    },

    /// A required attribute was never set by the document
    #[error("required attribute [{key}] in element <{element}> is not specified")]
    RequiredAttributeUnset {
        /// Attribute key
        key: String,
        /// Owning element
        element: String,
    },

    /// An `<include>` target could not be located
    #[error("unable to resolve include [{target}]")]
    UnresolvableInclude {
        /// URI or file name that failed to resolve
        target: String,
    },

    /// A value string could not be parsed into the declared type
    #[error("unable to set value [{value}] for key [{key}] of type [{type_name}]")]
    ParseFailure {
        /// Key of the value cell
        key: String,
        /// Offending input
        value: String,
        /// Declared type of the cell
        type_name: String,
    },

    /// An element not present in the schema
    #[error("element <{element}>, child of <{parent}>, is not defined in the schema")]
    UnknownElement {
        /// Tag name found in the document
        element: String,
        /// Enclosing element
        parent: String,
    },

    /// An attribute not present in the schema
    #[error("attribute [{attribute}] in element <{element}> is not defined in the schema")]
    UnknownAttribute {
        /// Attribute name found in the document
        attribute: String,
        /// Owning element
        element: String,
    },

    /// Typed read of a value cell that cannot be converted
    #[error("unable to convert parameter [{key}] whose type is [{type_name}] to {requested}")]
    TypeMismatch {
        /// Key of the value cell
        key: String,
        /// Declared type of the cell
        type_name: String,
        /// Requested Rust type
        requested: &'static str,
    },

    /// The document root is not the expected tag
    #[error("expected root element <{expected}>, found <{found}>")]
    WrongRoot {
        /// Expected root tag
        expected: String,
        /// Tag found in the document
        found: String,
    },

    /// The document root has no version attribute
    #[error("root element <{root}> has no version attribute")]
    MissingVersion {
        /// Root tag
        root: String,
    },

    /// Version conversion failed or no converter is available
    #[error("conversion error: {0}")]
    Conversion(String),

    /// A schema file could not be found in the configured source
    #[error("unknown schema [{0}]")]
    UnknownSchema(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Whether the binder treats this condition as tolerated (log only)
    pub fn is_tolerated(&self) -> bool {
        matches!(
            self,
            Error::UnknownElement { .. }
                | Error::UnknownAttribute { .. }
                | Error::UnresolvableInclude { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_attribute_display() {
        let err = Error::RequiredAttributeUnset {
            key: "name".to_string(),
            element: "light".to_string(),
        };

        let msg = format!("{}", err);
        assert!(msg.contains("[name]"));
        assert!(msg.contains("<light>"));
    }

    #[test]
    fn test_incomplete_attribute_display() {
        let err = Error::IncompleteAttribute {
            element: "model".to_string(),
            attribute: "name".to_string(),
            field: "default",
        };
        assert_eq!(
            err.to_string(),
            "attribute [name] of schema element <model> is missing a default"
        );
    }

    #[test]
    fn test_tolerated_conditions() {
        let unknown = Error::UnknownElement {
            element: "foo".to_string(),
            parent: "model".to_string(),
        };
        assert!(unknown.is_tolerated());

        let missing = Error::MissingRequiredElement {
            element: "parent".to_string(),
            parent: "joint".to_string(),
        };
        assert!(!missing.is_tolerated());
    }

    #[test]
    fn test_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
