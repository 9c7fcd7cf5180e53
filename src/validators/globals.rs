//! Global XSD declarations management
//!
//! [`XsdGlobals`] is the component arena of a built schema: every element
//! particle, model group, wildcard, type and identity constraint lives here
//! and is addressed by its handle. Global elements and types are also
//! indexed by name.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::limits::Limits;
use crate::namespaces::{NamespaceContext, QName};

use super::base::{ElementId, GroupId, IdentityId, TypeId, WildcardId, XsdVersion};
use super::complex_types::XsdType;
use super::elements::XsdElement;
use super::exceptions::ParticleInfo;
use super::groups::{GroupMember, XsdGroup};
use super::identities::XsdIdentity;
use super::particles::Occurs;
use super::wildcards::XsdAnyElement;

/// Element map - maps QNames to global element declarations
pub type ElementMap = IndexMap<QName, ElementId>;
/// Type map - maps QNames to global types
pub type TypeMap = IndexMap<QName, TypeId>;
/// Identity map - maps QNames to identity constraints
pub type IdentityMap = IndexMap<QName, IdentityId>;

/// Component arena of a schema
#[derive(Debug, Default)]
pub struct XsdGlobals {
    pub(crate) elements: Vec<XsdElement>,
    pub(crate) groups: Vec<XsdGroup>,
    pub(crate) wildcards: Vec<XsdAnyElement>,
    pub(crate) types: Vec<XsdType>,
    pub(crate) identities: Vec<XsdIdentity>,
    pub(crate) global_elements: ElementMap,
    pub(crate) global_types: TypeMap,
    pub(crate) identity_names: IdentityMap,
    /// Ancestor-folded occurs of every particle that has a parent group
    pub(crate) particle_occurs: HashMap<GroupMember, Occurs>,
    pub(crate) limits: Limits,
    pub(crate) version: XsdVersion,
}

impl XsdGlobals {
    /// Create an empty arena
    pub fn new(version: XsdVersion, limits: Limits) -> Self {
        Self {
            version,
            limits,
            ..Self::default()
        }
    }

    /// XSD version of the schema
    pub fn version(&self) -> XsdVersion {
        self.version
    }

    /// Resource limits of the schema
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    // ========== Component access ==========

    /// Get an element declaration
    pub fn element(&self, id: ElementId) -> &XsdElement {
        &self.elements[id.0]
    }

    /// Get a model group
    pub fn group(&self, id: GroupId) -> &XsdGroup {
        &self.groups[id.0]
    }

    /// Get an element wildcard
    pub fn wildcard(&self, id: WildcardId) -> &XsdAnyElement {
        &self.wildcards[id.0]
    }

    /// Get a type
    pub fn xsd_type(&self, id: TypeId) -> &XsdType {
        &self.types[id.0]
    }

    /// Get an identity constraint
    pub fn identity(&self, id: IdentityId) -> &XsdIdentity {
        &self.identities[id.0]
    }

    // ========== Lookups ==========

    /// Look up a global element by name
    pub fn lookup_element(&self, name: &QName) -> Option<ElementId> {
        self.global_elements.get(name).copied()
    }

    /// Look up a global type by name
    pub fn lookup_type(&self, name: &QName) -> Option<TypeId> {
        self.global_types.get(name).copied()
    }

    /// Look up an identity constraint by name
    pub fn lookup_identity(&self, name: &QName) -> Option<IdentityId> {
        self.identity_names.get(name).copied()
    }

    /// Iterate over global elements
    pub fn iter_global_elements(&self) -> impl Iterator<Item = (&QName, ElementId)> {
        self.global_elements.iter().map(|(name, id)| (name, *id))
    }

    // ========== Statistics ==========

    /// Get number of element particles and declarations
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Get number of model groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Get number of types
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    // ========== Particle queries ==========

    /// Declared occurrence bounds of a group member
    pub fn member_occurs(&self, member: GroupMember) -> Occurs {
        match member {
            GroupMember::Element(id) => self.element(id).occurs,
            GroupMember::Wildcard(id) => self.wildcard(id).occurs,
            GroupMember::Group(id) => self.group(id).occurs,
        }
    }

    /// Check if a member can be matched by no content at all
    pub fn is_emptiable(&self, member: GroupMember) -> bool {
        match member {
            GroupMember::Group(id) => self.group(id).emptiable,
            other => self.member_occurs(other).is_emptiable(),
        }
    }

    /// Occurrence bounds folded with every enclosing group
    ///
    /// Members outside of any group get their own bounds back.
    pub fn effective_occurs(&self, member: GroupMember) -> Occurs {
        self.particle_occurs
            .get(&member)
            .copied()
            .unwrap_or_else(|| self.member_occurs(member))
    }

    /// Parent group of a member
    pub fn parent_of(&self, member: GroupMember) -> Option<GroupId> {
        match member {
            GroupMember::Element(id) => self.element(id).parent,
            GroupMember::Wildcard(id) => self.wildcard(id).parent,
            GroupMember::Group(id) => self.group(id).parent,
        }
    }

    /// Check if an instance element name matches a leaf member
    pub fn is_matching(&self, member: GroupMember, name: &QName) -> bool {
        match member {
            GroupMember::Element(id) => self.element(id).is_matching(name),
            GroupMember::Wildcard(id) => self.wildcard(id).is_matching(name),
            GroupMember::Group(_) => false,
        }
    }

    /// Particle rendering used in children diagnostics
    pub fn particle_info(&self, member: GroupMember, namespaces: &NamespaceContext) -> ParticleInfo {
        let name = match member {
            GroupMember::Element(id) => format!("'{}'", self.element(id).name.prefixed(namespaces)),
            GroupMember::Wildcard(_) => "any".to_string(),
            GroupMember::Group(id) => self.group(id).model.to_string(),
        };
        ParticleInfo {
            name,
            occurs: self.member_occurs(member),
        }
    }

    /// Tag rendering of an expected leaf, `None` if it is not reported
    pub fn expected_tag(&self, member: GroupMember, namespaces: &NamespaceContext) -> Option<String> {
        match member {
            GroupMember::Element(id) => Some(self.element(id).name.prefixed(namespaces)),
            GroupMember::Wildcard(id) => self.wildcard(id).expected_tag(),
            GroupMember::Group(_) => None,
        }
    }
}
