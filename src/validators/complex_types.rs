//! XSD Complex Type Validators
//!
//! This module implements complex type definitions for XSD schemas.
//! Complex types can have element content (model groups), simple content,
//! or mixed content with both text and elements.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Complex_Type_Definitions

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::namespaces::QName;

use super::base::{GroupId, TypeId};
use super::simple_types::XsdSimpleType;
use super::wildcards::XsdAnyAttribute;

/// Content type label for complex types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTypeLabel {
    /// No content (empty element)
    Empty,
    /// Simple content (text only)
    Simple,
    /// Mixed content (text and elements)
    Mixed,
    /// Element-only content
    ElementOnly,
}

impl std::fmt::Display for ContentTypeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Simple => write!(f, "simple"),
            Self::Mixed => write!(f, "mixed"),
            Self::ElementOnly => write!(f, "element-only"),
        }
    }
}

/// The content of a complex type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// No text and no children
    Empty,
    /// Text decoded with a simple type
    Simple(TypeId),
    /// Children checked against a model group, no text
    ElementOnly(GroupId),
    /// Children checked against a model group, text allowed
    Mixed(GroupId),
}

impl ContentType {
    /// Content label
    pub fn label(&self) -> ContentTypeLabel {
        match self {
            Self::Empty => ContentTypeLabel::Empty,
            Self::Simple(_) => ContentTypeLabel::Simple,
            Self::ElementOnly(_) => ContentTypeLabel::ElementOnly,
            Self::Mixed(_) => ContentTypeLabel::Mixed,
        }
    }

    /// Model group of element-only or mixed content
    pub fn model_group(&self) -> Option<GroupId> {
        match self {
            Self::ElementOnly(group) | Self::Mixed(group) => Some(*group),
            _ => None,
        }
    }
}

/// Attribute use mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeUse {
    /// Attribute is optional (default)
    #[default]
    Optional,
    /// Attribute is required
    Required,
    /// Attribute is prohibited
    Prohibited,
}

impl AttributeUse {
    /// Parse from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "optional" => Ok(Self::Optional),
            "required" => Ok(Self::Required),
            "prohibited" => Ok(Self::Prohibited),
            _ => Err(Error::Value(format!(
                "attribute use must be 'optional', 'required' or 'prohibited', not '{}'",
                s
            ))),
        }
    }
}

/// XSD attribute declaration used by a complex type
#[derive(Debug, Clone)]
pub struct XsdAttribute {
    /// Attribute name
    pub name: QName,
    /// Simple type of the value
    pub type_id: TypeId,
    /// Use mode
    pub use_mode: AttributeUse,
    /// Default value
    pub default: Option<String>,
    /// Fixed value
    pub fixed: Option<String>,
}

impl XsdAttribute {
    /// Create an optional attribute
    pub fn new(name: QName, type_id: TypeId) -> Self {
        Self {
            name,
            type_id,
            use_mode: AttributeUse::Optional,
            default: None,
            fixed: None,
        }
    }

    /// Mark the attribute as required
    pub fn required(mut self) -> Self {
        self.use_mode = AttributeUse::Required;
        self
    }

    /// Set the use mode
    pub fn with_use(mut self, use_mode: AttributeUse) -> Self {
        self.use_mode = use_mode;
        self
    }

    /// Set default value
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set fixed value
    pub fn with_fixed(mut self, value: impl Into<String>) -> Self {
        self.fixed = Some(value.into());
        self
    }

    /// Check if the attribute is required
    pub fn is_required(&self) -> bool {
        self.use_mode == AttributeUse::Required
    }

    /// Value constraint, fixed taking precedence over default
    pub fn value_constraint(&self) -> Option<&str> {
        self.fixed.as_deref().or(self.default.as_deref())
    }
}

/// XSD Complex Type definition
#[derive(Debug, Clone)]
pub struct XsdComplexType {
    /// Type name (None for anonymous types)
    pub name: Option<QName>,
    /// Content of the type
    pub content: ContentType,
    /// Attribute declarations, by name
    pub attributes: IndexMap<QName, XsdAttribute>,
    /// Attribute wildcard
    pub any_attribute: Option<XsdAnyAttribute>,
}

impl XsdComplexType {
    /// Create a complex type
    pub fn new(name: Option<QName>, content: ContentType) -> Self {
        Self {
            name,
            content,
            attributes: IndexMap::new(),
            any_attribute: None,
        }
    }

    /// Create an anonymous element-only type
    pub fn element_only(group: GroupId) -> Self {
        Self::new(None, ContentType::ElementOnly(group))
    }

    /// Create an anonymous mixed type
    pub fn mixed(group: GroupId) -> Self {
        Self::new(None, ContentType::Mixed(group))
    }

    /// Create an anonymous empty type
    pub fn empty() -> Self {
        Self::new(None, ContentType::Empty)
    }

    /// Create an anonymous type with simple content
    pub fn simple_content(simple_type: TypeId) -> Self {
        Self::new(None, ContentType::Simple(simple_type))
    }

    /// Set the type name
    pub fn with_name(mut self, name: QName) -> Self {
        self.name = Some(name);
        self
    }

    /// Add an attribute declaration
    pub fn with_attribute(mut self, attribute: XsdAttribute) -> Self {
        self.attributes.insert(attribute.name.clone(), attribute);
        self
    }

    /// Set the attribute wildcard
    pub fn with_any_attribute(mut self, any_attribute: XsdAnyAttribute) -> Self {
        self.any_attribute = Some(any_attribute);
        self
    }

    /// Check if an undeclared attribute is admitted
    pub fn admits_attribute(&self, name: &QName) -> bool {
        self.attributes.contains_key(name)
            || self.any_attribute.as_ref().is_some_and(|any| any.is_matching(name))
    }
}

/// A type in the component graph
#[derive(Debug, Clone)]
pub enum XsdType {
    /// Simple type
    Simple(XsdSimpleType),
    /// Complex type
    Complex(XsdComplexType),
}

impl XsdType {
    /// Type name, if global
    pub fn name(&self) -> Option<&QName> {
        match self {
            Self::Simple(t) => t.name.as_ref(),
            Self::Complex(t) => t.name.as_ref(),
        }
    }

    /// Check if this is a simple type
    pub fn is_simple(&self) -> bool {
        matches!(self, Self::Simple(_))
    }

    /// Get as simple type
    pub fn as_simple(&self) -> Option<&XsdSimpleType> {
        match self {
            Self::Simple(t) => Some(t),
            Self::Complex(_) => None,
        }
    }

    /// Get as complex type
    pub fn as_complex(&self) -> Option<&XsdComplexType> {
        match self {
            Self::Simple(_) => None,
            Self::Complex(t) => Some(t),
        }
    }

    /// Content label, simple types have simple content
    pub fn content_label(&self) -> ContentTypeLabel {
        match self {
            Self::Simple(_) => ContentTypeLabel::Simple,
            Self::Complex(t) => t.content.label(),
        }
    }
}

impl From<XsdSimpleType> for XsdType {
    fn from(t: XsdSimpleType) -> Self {
        Self::Simple(t)
    }
}

impl From<XsdComplexType> for XsdType {
    fn from(t: XsdComplexType) -> Self {
        Self::Complex(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::simple_types::BuiltinType;
    use crate::validators::wildcards::{NamespaceConstraint, ProcessContents};

    #[test]
    fn test_attribute_use_from_str() {
        assert_eq!(AttributeUse::from_str("required").unwrap(), AttributeUse::Required);
        assert!(AttributeUse::from_str("mandatory").is_err());
    }

    #[test]
    fn test_attribute_builders() {
        let attr = XsdAttribute::new(QName::local("id"), TypeId(0))
            .required()
            .with_default("x");
        assert!(attr.is_required());
        assert_eq!(attr.value_constraint(), Some("x"));
    }

    #[test]
    fn test_content_labels() {
        assert_eq!(XsdComplexType::empty().content.label(), ContentTypeLabel::Empty);
        assert_eq!(
            XsdComplexType::mixed(GroupId(0)).content.model_group(),
            Some(GroupId(0))
        );
        assert_eq!(XsdComplexType::simple_content(TypeId(1)).content.model_group(), None);
        assert_eq!(ContentTypeLabel::ElementOnly.to_string(), "element-only");

        let simple: XsdType = XsdSimpleType::builtin(BuiltinType::Token).into();
        assert_eq!(simple.content_label(), ContentTypeLabel::Simple);
        assert_eq!(simple.name().map(|n| n.local_name.as_str()), Some("token"));
    }

    #[test]
    fn test_admits_attribute() {
        let ct = XsdComplexType::empty()
            .with_attribute(XsdAttribute::new(QName::local("a"), TypeId(0)))
            .with_any_attribute(XsdAnyAttribute::new(
                NamespaceConstraint::from_namespace_attr("urn:x", None).unwrap(),
                ProcessContents::Lax,
            ));
        assert!(ct.admits_attribute(&QName::local("a")));
        assert!(ct.admits_attribute(&QName::namespaced("urn:x", "b")));
        assert!(!ct.admits_attribute(&QName::local("b")));
    }
}
