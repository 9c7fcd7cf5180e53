//! XML Schema validators
//!
//! This module contains the component graph of a schema, the content model
//! automaton, the identity constraint engine and the document traversal.

pub mod base;
pub mod exceptions;
pub mod particles;
pub mod validation;

pub mod complex_types;
pub mod elements;
pub mod simple_types;
pub mod wildcards;

pub mod globals;
pub mod groups;
pub mod identities;
pub mod models;

pub mod document_validation;
pub mod schemas;

// Re-exports
pub use base::{ElementId, GroupId, IdentityId, TypeId, ValidationMode, WildcardId, XsdVersion};
pub use complex_types::{AttributeUse, ContentType, XsdAttribute, XsdComplexType, XsdType};
pub use document_validation::{decode_document, DecodedElement};
pub use elements::{AlternativeTest, ElementScope, XsdElement};
pub use exceptions::{
    ChildrenValidationError, CircularityError, DecodeError, EncodeError, IdentityError,
    ModelDepthError, ParticleInfo,
};
pub use globals::XsdGlobals;
pub use groups::{GroupMember, ModelType, XsdGroup};
pub use identities::{
    AbsentKeyField, FieldTuple, FieldValue, IdentityKind, IdentityOptions, XsdIdentity,
};
pub use models::{ModelDiagnostic, ModelVisitor};
pub use particles::Occurs;
pub use schemas::{DecodeItem, SchemaBuilder, XsdSchema};
pub use simple_types::{AtomicType, BuiltinType, XsdSimpleType};
pub use validation::{DecodeOptions, ValidationContext};
pub use wildcards::{NamespaceConstraint, ProcessContents, XsdAnyAttribute, XsdAnyElement};
