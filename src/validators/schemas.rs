//! XML Schema validators
//!
//! This module contains the schema builder, the only mutable phase of the
//! component graph, and [`XsdSchema`], the immutable result that validates
//! and decodes documents.

use std::collections::HashSet;

use log::debug;
use serde::Serialize;

use crate::documents::Document;
use crate::error::{Error, ParseError, Result, ValidationError};
use crate::limits::Limits;

use super::base::{ElementId, GroupId, IdentityId, TypeId, ValidationMode, WildcardId, XsdVersion};
use super::complex_types::{ContentType, XsdComplexType, XsdType};
use super::document_validation::{decode_document, DecodedElement};
use super::elements::{ElementScope, XsdElement};
use super::exceptions::CircularityError;
use super::globals::XsdGlobals;
use super::groups::{compute_group_caches, fold_ancestor_occurs, GroupMember, ModelType, XsdGroup};
use super::identities::{IdentityKind, XsdIdentity};
use super::particles::Occurs;
use super::simple_types::{BuiltinType, XsdSimpleType};
use super::validation::{DecodeOptions, ValidationContext};
use super::wildcards::XsdAnyElement;

/// Builder of the component graph of a schema
///
/// Every `add_*` call returns the handle of the new component. Members are
/// attached to their group by [`SchemaBuilder::add_group`], so a group can
/// only be built from components that already exist.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    maps: XsdGlobals,
}

impl SchemaBuilder {
    /// Create an XSD 1.0 builder with the default limits
    pub fn new() -> Self {
        Self {
            maps: XsdGlobals::new(XsdVersion::default(), Limits::default()),
        }
    }

    /// Set the resource limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.maps.limits = limits;
        self
    }

    /// Set the XSD version
    pub fn with_version(mut self, version: XsdVersion) -> Self {
        self.maps.version = version;
        self
    }

    /// Handle of a builtin type, registered on first use
    pub fn builtin(&mut self, builtin: BuiltinType) -> TypeId {
        match self.maps.global_types.get(&builtin.qname()) {
            Some(&id) => id,
            None => self.add_global_type(XsdType::Simple(XsdSimpleType::builtin(builtin))),
        }
    }

    /// Add a local element declaration
    pub fn add_element(&mut self, element: XsdElement) -> ElementId {
        let id = ElementId(self.maps.elements.len());
        self.maps.elements.push(element);
        id
    }

    /// Add a global element declaration, registered by name
    pub fn add_global_element(&mut self, element: XsdElement) -> ElementId {
        let name = element.name.clone();
        let id = self.add_element(element.with_scope(ElementScope::Global));
        self.maps.global_elements.insert(name, id);
        id
    }

    /// Add an element wildcard
    pub fn add_wildcard(&mut self, wildcard: XsdAnyElement) -> WildcardId {
        let id = WildcardId(self.maps.wildcards.len());
        self.maps.wildcards.push(wildcard);
        id
    }

    /// Add a model group with its members
    ///
    /// Fails if a member doesn't exist or already belongs to a group.
    pub fn add_group(
        &mut self,
        mut group: XsdGroup,
        members: impl IntoIterator<Item = GroupMember>,
    ) -> Result<GroupId> {
        let id = GroupId(self.maps.groups.len());
        let members: Vec<GroupMember> = members.into_iter().collect();

        let mut seen = HashSet::new();
        for &member in &members {
            self.check_member(member)?;
            if !seen.insert(member) {
                return Err(Error::Value(format!("{} is repeated in {}", member, id)));
            }
            if let Some(parent) = self.maps.parent_of(member) {
                return Err(Error::Value(format!("{} already belongs to {}", member, parent)));
            }
        }

        for &member in &members {
            match member {
                GroupMember::Element(e) => self.maps.elements[e.0].parent = Some(id),
                GroupMember::Wildcard(w) => self.maps.wildcards[w.0].parent = Some(id),
                GroupMember::Group(g) => self.maps.groups[g.0].parent = Some(id),
            }
        }
        group.members = members;
        group.parent = None;
        self.maps.groups.push(group);
        Ok(id)
    }

    /// Add an anonymous element-only complex type
    pub fn add_element_only_type(&mut self, group: GroupId) -> TypeId {
        self.add_complex_type(XsdComplexType::element_only(group))
    }

    /// Add a complex type, registered by name if it has one
    pub fn add_complex_type(&mut self, complex: XsdComplexType) -> TypeId {
        self.add_global_type(XsdType::Complex(complex))
    }

    /// Add a simple type, registered by name if it has one
    pub fn add_simple_type(&mut self, simple: XsdSimpleType) -> TypeId {
        self.add_global_type(XsdType::Simple(simple))
    }

    /// Add an anonymous type
    pub fn add_type(&mut self, xsd_type: XsdType) -> TypeId {
        let id = TypeId(self.maps.types.len());
        self.maps.types.push(xsd_type);
        id
    }

    /// Add a type, registered by name if it has one
    pub fn add_global_type(&mut self, xsd_type: XsdType) -> TypeId {
        let name = xsd_type.name().cloned();
        let id = self.add_type(xsd_type);
        if let Some(name) = name {
            self.maps.global_types.insert(name, id);
        }
        id
    }

    /// Add an identity constraint, registered by name
    pub fn add_identity(&mut self, identity: XsdIdentity) -> IdentityId {
        let id = IdentityId(self.maps.identities.len());
        self.maps.identity_names.insert(identity.name.clone(), id);
        self.maps.identities.push(identity);
        id
    }

    fn check_member(&self, member: GroupMember) -> Result<()> {
        let exists = match member {
            GroupMember::Element(id) => id.0 < self.maps.elements.len(),
            GroupMember::Wildcard(id) => id.0 < self.maps.wildcards.len(),
            GroupMember::Group(id) => id.0 < self.maps.groups.len(),
        };
        if exists {
            Ok(())
        } else {
            Err(dangling(member))
        }
    }

    /// Check the component graph and compute the cached values
    pub fn build(mut self) -> Result<XsdSchema> {
        self.check_handles()?;
        self.check_occurs()?;
        let order = self.group_order()?;
        self.check_all_groups()?;
        self.resolve_keyrefs()?;
        for identity in &mut self.maps.identities {
            identity.compile()?;
        }

        for &id in &order {
            compute_group_caches(&mut self.maps, id);
        }

        let particles: Vec<GroupMember> = (0..self.maps.elements.len())
            .map(|i| GroupMember::Element(ElementId(i)))
            .chain((0..self.maps.wildcards.len()).map(|i| GroupMember::Wildcard(WildcardId(i))))
            .chain((0..self.maps.groups.len()).map(|i| GroupMember::Group(GroupId(i))))
            .filter(|&member| self.maps.parent_of(member).is_some())
            .collect();
        for member in particles {
            let occurs = fold_ancestor_occurs(&self.maps, member);
            self.maps.particle_occurs.insert(member, occurs);
        }

        debug!(
            "built XSD {} schema with {} elements, {} groups, {} types and {} identities",
            self.maps.version,
            self.maps.elements.len(),
            self.maps.groups.len(),
            self.maps.types.len(),
            self.maps.identities.len()
        );
        Ok(XsdSchema { maps: self.maps })
    }

    fn check_handles(&self) -> Result<()> {
        let maps = &self.maps;
        let check_type = |id: TypeId| {
            if id.0 < maps.types.len() {
                Ok(())
            } else {
                Err(dangling(id))
            }
        };

        for element in &maps.elements {
            check_type(element.type_id)?;
            for alternative in &element.alternatives {
                check_type(alternative.type_id)?;
            }
            if let Some(&id) = element.identities.iter().find(|id| id.0 >= maps.identities.len()) {
                return Err(dangling(id));
            }
        }

        for xsd_type in &maps.types {
            let XsdType::Complex(complex) = xsd_type else {
                continue;
            };
            match complex.content {
                ContentType::Empty => {}
                ContentType::Simple(id) => check_type(id)?,
                ContentType::ElementOnly(id) | ContentType::Mixed(id) => {
                    self.check_member(id.into())?
                }
            }
            for attribute in complex.attributes.values() {
                check_type(attribute.type_id)?;
            }
        }

        for group in &maps.groups {
            for &member in &group.members {
                self.check_member(member)?;
            }
        }
        Ok(())
    }

    /// Every particle must have `maxOccurs` unbounded or not lower than `minOccurs`
    fn check_occurs(&self) -> Result<()> {
        let maps = &self.maps;
        let elements = maps
            .elements
            .iter()
            .map(|e| (e.occurs, e.name.to_string()));
        let wildcards = maps
            .wildcards
            .iter()
            .enumerate()
            .map(|(i, w)| (w.occurs, WildcardId(i).to_string()));
        let groups = maps.groups.iter().enumerate().map(|(i, g)| {
            let component = g
                .name
                .as_ref()
                .map_or_else(|| GroupId(i).to_string(), ToString::to_string);
            (g.occurs, component)
        });

        for (occurs, component) in elements.chain(wildcards).chain(groups) {
            if let Err(Error::Parse(err)) = Occurs::checked(occurs.min, occurs.max) {
                return Err(err.with_component(component).into());
            }
        }
        Ok(())
    }

    /// Groups in post-order, so that members come before their group
    fn group_order(&self) -> Result<Vec<GroupId>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Open,
            Done,
        }

        fn visit(
            maps: &XsdGlobals,
            id: GroupId,
            marks: &mut [Mark],
            stack: &mut Vec<GroupId>,
            order: &mut Vec<GroupId>,
        ) -> Result<()> {
            match marks[id.0] {
                Mark::Done => return Ok(()),
                Mark::Open => {
                    let group = maps.group(id);
                    let name = group
                        .name
                        .as_ref()
                        .map_or_else(|| id.to_string(), ToString::to_string);
                    let cycle = stack.iter().map(ToString::to_string).collect();
                    return Err(CircularityError::new("group", name)
                        .with_cycle_path(cycle)
                        .into());
                }
                Mark::New => {}
            }

            marks[id.0] = Mark::Open;
            stack.push(id);
            for member in &maps.group(id).members {
                if let GroupMember::Group(sub) = *member {
                    visit(maps, sub, marks, stack, order)?;
                }
            }
            stack.pop();
            marks[id.0] = Mark::Done;
            order.push(id);
            Ok(())
        }

        let count = self.maps.groups.len();
        let mut marks = vec![Mark::New; count];
        let mut order = Vec::with_capacity(count);
        for index in 0..count {
            visit(&self.maps, GroupId(index), &mut marks, &mut Vec::new(), &mut order)?;
        }
        Ok(order)
    }

    fn check_all_groups(&self) -> Result<()> {
        if self.maps.version == XsdVersion::Xsd11 {
            return Ok(());
        }

        for (index, group) in self.maps.groups.iter().enumerate() {
            if group.model != ModelType::All {
                continue;
            }
            let component = group
                .name
                .as_ref()
                .map_or_else(|| GroupId(index).to_string(), ToString::to_string);
            let error = |message: &str| -> Error {
                ParseError::new(message).with_component(component.clone()).into()
            };

            if group.parent.is_some() {
                return Err(error("an 'all' model group must appear at the top of a content model"));
            }
            if group.occurs.min > 1 || group.occurs.max != Some(1) {
                return Err(error("an 'all' model group must have maxOccurs=1 and minOccurs 0 or 1"));
            }
            for &member in &group.members {
                match member {
                    GroupMember::Element(id) if self.maps.element(id).occurs.max.is_some_and(|m| m <= 1) => {}
                    GroupMember::Element(_) => {
                        return Err(error("an element of an 'all' model group can't have maxOccurs > 1"));
                    }
                    GroupMember::Wildcard(_) | GroupMember::Group(_) => {
                        return Err(error("an 'all' model group can contain only element declarations"));
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve_keyrefs(&mut self) -> Result<()> {
        let maps = &mut self.maps;
        for index in 0..maps.identities.len() {
            let IdentityKind::Keyref(refer_name) = &maps.identities[index].kind else {
                continue;
            };
            let component = maps.identities[index].to_string();

            let Some(&refer) = maps.identity_names.get(refer_name) else {
                return Err(ParseError::new(format!("key/unique '{}' not found", refer_name))
                    .with_component(component)
                    .into());
            };
            let referred = &maps.identities[refer.0];
            if referred.is_keyref() {
                return Err(ParseError::new(format!("{} is not a key or a unique", referred))
                    .with_component(component)
                    .into());
            }
            if referred.fields.len() != maps.identities[index].fields.len() {
                return Err(ParseError::new(format!(
                    "field cardinality mismatch with the referred {}",
                    referred
                ))
                .with_component(component)
                .into());
            }
            maps.identities[index].refer = Some(refer);
        }
        Ok(())
    }
}

fn dangling(handle: impl std::fmt::Display) -> Error {
    Error::Value(format!("dangling handle {}", handle))
}

/// Item of a decoding iteration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeItem {
    /// A validation error
    Error(ValidationError),
    /// The decoded document, always the last item
    Value(DecodedElement),
}

/// A built XML Schema
///
/// The schema is immutable and can be shared between threads: each call
/// gets its own validation context.
#[derive(Debug)]
pub struct XsdSchema {
    maps: XsdGlobals,
}

impl XsdSchema {
    /// The component arena
    pub fn maps(&self) -> &XsdGlobals {
        &self.maps
    }

    /// XSD version of the schema
    pub fn version(&self) -> XsdVersion {
        self.maps.version()
    }

    /// Collect the validation errors of a document in lax mode
    ///
    /// Resource limit violations are returned as an error.
    pub fn iter_errors(&self, doc: &Document) -> Result<impl Iterator<Item = ValidationError>> {
        let mut context = ValidationContext::with_mode(ValidationMode::Lax);
        decode_document(&self.maps, doc, &mut context)?;
        Ok(context.take_errors().into_iter())
    }

    /// Check if a document is valid against this schema
    ///
    /// Warnings don't count, a fatal error makes the document invalid.
    pub fn is_valid(&self, doc: &Document) -> bool {
        match self.iter_errors(doc) {
            Ok(mut errors) => !errors.any(|e| e.is_error()),
            Err(_) => false,
        }
    }

    /// Validate a document, failing on the first error
    pub fn validate(&self, doc: &Document) -> Result<()> {
        let mut context = ValidationContext::with_mode(ValidationMode::Strict);
        decode_document(&self.maps, doc, &mut context)?;
        Ok(())
    }

    /// Parse an XML string and validate it
    pub fn validate_string(&self, xml: &str) -> Result<()> {
        self.validate(&Document::from_string(xml)?)
    }

    /// Check if an XML string is a valid document
    pub fn is_valid_string(&self, xml: &str) -> bool {
        Document::from_string(xml).is_ok_and(|doc| self.is_valid(&doc))
    }

    /// Decode a document, yielding the errors first and the value last
    pub fn iter_decode(
        &self,
        doc: &Document,
        options: &DecodeOptions,
    ) -> Result<impl Iterator<Item = DecodeItem>> {
        let (value, errors) = self.decode(doc, options)?;
        Ok(errors
            .into_iter()
            .map(DecodeItem::Error)
            .chain(value.map(DecodeItem::Value)))
    }

    /// Decode a document, returning the value and the collected errors
    ///
    /// In strict mode the first error is returned as `Err`.
    pub fn decode(
        &self,
        doc: &Document,
        options: &DecodeOptions,
    ) -> Result<(Option<DecodedElement>, Vec<ValidationError>)> {
        let mut context = ValidationContext::new(*options);
        let value = decode_document(&self.maps, doc, &mut context)?;
        Ok((value, context.take_errors()))
    }
}
