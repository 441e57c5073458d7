//! # rmlformat
//!
//! A schema-driven reader for RML robot and world description documents.
//!
//! The grammar of the format is itself written in XML (`*.schema` files):
//! every element declares its attributes, its typed content and the child
//! elements it may contain. Reading a document binds each XML node to its
//! declaration, producing a tree of typed values.
//!
//! ## Features
//!
//! - Typed value cells for scalars, vectors, colors, poses and quaternions
//! - Bundled 1.6 grammar, or grammar files loaded from a directory
//! - `<include>` resolution through model directories, with nested model
//!   flattening
//! - Rule-based conversion of older documents
//! - JSON export of bound trees
//!
//! ## Example
//!
//! ```rust,no_run
//! use rmlformat::Reader;
//!
//! let reader = Reader::new();
//! let root = reader.read_file("world.rml")?;
//! if let Some(world) = root.element("world") {
//!     let name: String = world.get("name")?;
//!     println!("world {} has {} models", name, world.elements("model").count());
//! }
//! # Ok::<(), rmlformat::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Values
pub mod types;
pub mod param;

// Documents and resources
pub mod documents;
pub mod names;
pub mod locations;
pub mod loaders;

// Grammar
pub mod element;
pub mod schema;

// Reading
pub mod helper;
pub mod converter;
pub mod binder;

// Output
pub mod export;

// Re-exports for convenience
pub use binder::Reader;
pub use element::{Element, ElementDescription, Node, RequiredCode};
pub use error::{Error, Result};
pub use param::{Param, ParamType, ParamValue, ValueKind};
pub use schema::{SchemaSet, SchemaSource};

/// Version of the rmlformat library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Grammar version of the bundled schemas
pub const SCHEMA_VERSION: &str = schema::BUNDLED_VERSION;

/// Root tag of RML documents
pub const ROOT_NAME: &str = "rml";
