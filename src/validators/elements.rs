//! XSD Element Validators
//!
//! This module implements element declarations for XSD schemas.
//! Elements are the primary building blocks of XML documents.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Element_Declarations

use crate::documents::Element;
use crate::namespaces::QName;

use super::base::{GroupId, IdentityId, TypeId};
use super::particles::{Occurs, Particle};

/// The scope of an element declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementScope {
    /// Global element declaration
    #[default]
    Global,
    /// Local element declaration (within a complex type or group)
    Local,
}

impl std::fmt::Display for ElementScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Test of an XSD 1.1 type alternative
#[derive(Debug, Clone, PartialEq)]
pub enum AlternativeTest {
    /// The attribute is present
    HasAttribute(QName),
    /// The attribute is present with the given value
    AttributeEquals(QName, String),
}

impl AlternativeTest {
    /// Evaluate the test on an instance element
    pub fn matches(&self, elem: &Element) -> bool {
        match self {
            Self::HasAttribute(name) => elem.get_attribute_qname(name).is_some(),
            Self::AttributeEquals(name, value) => {
                elem.get_attribute_qname(name).map(str::trim) == Some(value.as_str())
            }
        }
    }
}

/// XSD 1.1 conditional type assignment
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAlternative {
    /// Condition selecting the alternative
    pub test: AlternativeTest,
    /// Type used when the test passes
    pub type_id: TypeId,
}

/// XSD Element declaration
#[derive(Debug, Clone)]
pub struct XsdElement {
    /// Element name
    pub name: QName,
    /// Declared type
    pub type_id: TypeId,
    /// Occurrence constraints
    pub occurs: Occurs,
    /// Whether this element is nillable
    pub nillable: bool,
    /// Default value constraint
    pub default: Option<String>,
    /// Fixed value constraint
    pub fixed: Option<String>,
    /// Identity constraints declared on this element
    pub identities: Vec<IdentityId>,
    /// Type alternatives, tried in order
    pub alternatives: Vec<TypeAlternative>,
    /// Declaration scope
    pub scope: ElementScope,
    /// Group owning this particle
    pub(crate) parent: Option<GroupId>,
}

impl XsdElement {
    /// Create a new element declaration
    pub fn new(name: QName, type_id: TypeId) -> Self {
        Self {
            name,
            type_id,
            occurs: Occurs::once(),
            nillable: false,
            default: None,
            fixed: None,
            identities: Vec::new(),
            alternatives: Vec::new(),
            scope: ElementScope::Local,
            parent: None,
        }
    }

    /// Check if an instance name matches the declaration
    pub fn is_matching(&self, name: &QName) -> bool {
        self.name == *name
    }

    /// Value constraint, fixed taking precedence over default
    pub fn value_constraint(&self) -> Option<&str> {
        self.fixed.as_deref().or(self.default.as_deref())
    }

    /// Check if this is a global declaration
    pub fn is_global(&self) -> bool {
        self.scope == ElementScope::Global
    }

    /// Type for an instance element, after evaluating type alternatives
    pub fn select_type(&self, elem: &Element) -> TypeId {
        self.alternatives
            .iter()
            .find(|alt| alt.test.matches(elem))
            .map_or(self.type_id, |alt| alt.type_id)
    }

    /// Set occurrence constraints
    pub fn with_occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }

    /// Set nillable flag
    pub fn with_nillable(mut self, nillable: bool) -> Self {
        self.nillable = nillable;
        self
    }

    /// Set default value
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set fixed value
    pub fn with_fixed(mut self, fixed: impl Into<String>) -> Self {
        self.fixed = Some(fixed.into());
        self
    }

    /// Attach identity constraints
    pub fn with_identities(mut self, identities: impl IntoIterator<Item = IdentityId>) -> Self {
        self.identities.extend(identities);
        self
    }

    /// Add a type alternative
    pub fn with_alternative(mut self, test: AlternativeTest, type_id: TypeId) -> Self {
        self.alternatives.push(TypeAlternative { test, type_id });
        self
    }

    /// Set the scope
    pub fn with_scope(mut self, scope: ElementScope) -> Self {
        self.scope = scope;
        self
    }
}

impl Particle for XsdElement {
    fn occurs(&self) -> Occurs {
        self.occurs
    }
}
