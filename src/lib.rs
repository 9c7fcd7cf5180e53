//! # xmlschema-validator
//!
//! Content-model automaton, identity constraints and decode/validate
//! traversal for XML Schema (XSD 1.0 and XSD 1.1).
//!
//! Schemas are assembled with a [`SchemaBuilder`], which checks the
//! component graph and produces an immutable [`XsdSchema`]. Documents are
//! parsed into a [`Document`] and validated or decoded against it.
//!
//! ## Example
//!
//! ```rust
//! use xmlschema_validator::{BuiltinType, Document, QName, SchemaBuilder, XsdElement, XsdGroup};
//!
//! let mut builder = SchemaBuilder::new();
//! let string = builder.builtin(BuiltinType::String);
//! let item = builder.add_element(XsdElement::new(QName::local("item"), string));
//! let group = builder.add_group(XsdGroup::sequence(), [item.into()])?;
//! let root_type = builder.add_element_only_type(group);
//! builder.add_global_element(XsdElement::new(QName::local("root"), root_type));
//! let schema = builder.build()?;
//!
//! let doc = Document::from_string("<root><item>x</item></root>")?;
//! assert!(schema.is_valid(&doc));
//! # Ok::<(), xmlschema_validator::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod limits;

pub mod documents;
pub mod namespaces;

pub mod validators;
pub mod xpath;

// Re-exports for convenience
pub use documents::{Document, Element};
pub use error::{Error, ErrorKind, ParseError, Result, Severity, ValidationError};
pub use limits::Limits;
pub use namespaces::{NamespaceContext, QName};
pub use validators::{
    BuiltinType, DecodeItem, DecodeOptions, DecodedElement, IdentityOptions, ModelVisitor,
    SchemaBuilder, ValidationMode, XsdElement, XsdGroup, XsdSchema, XsdVersion,
};

/// Version of the xmlschema-validator library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XSD 1.0 namespace
pub const XSD_1_0_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
