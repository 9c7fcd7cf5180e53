//! XSD Model Group validators
//!
//! This module implements model groups for XSD content models:
//! - xs:sequence - ordered content
//! - xs:choice - alternative content
//! - xs:all - unordered content (XSD 1.0: elements only, XSD 1.1: any particles)
//!
//! Groups reference their members by handle. The traversals over a group
//! tree live on [`XsdGlobals`] and are guarded by the model depth limit.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Model_Groups

use std::fmt;

use crate::error::{Error, Result};
use crate::namespaces::QName;

use super::base::{ElementId, GroupId, WildcardId, XsdVersion};
use super::exceptions::ModelDepthError;
use super::globals::XsdGlobals;
use super::particles::{Occurs, Particle};

/// Model group compositor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelType {
    /// Ordered sequence of particles
    #[default]
    Sequence,
    /// One of multiple alternatives
    Choice,
    /// Unordered set of particles (XSD 1.0: elements only)
    All,
}

impl ModelType {
    /// Parse from element tag name
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "sequence" | "{http://www.w3.org/2001/XMLSchema}sequence" => Some(Self::Sequence),
            "choice" | "{http://www.w3.org/2001/XMLSchema}choice" => Some(Self::Choice),
            "all" | "{http://www.w3.org/2001/XMLSchema}all" => Some(Self::All),
            _ => None,
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence => write!(f, "sequence"),
            Self::Choice => write!(f, "choice"),
            Self::All => write!(f, "all"),
        }
    }
}

/// A particle in a model group (element, wildcard, or nested group)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupMember {
    /// Element particle
    Element(ElementId),
    /// Wildcard (xs:any)
    Wildcard(WildcardId),
    /// Nested model group
    Group(GroupId),
}

impl GroupMember {
    /// Get the nested group handle
    pub fn as_group(self) -> Option<GroupId> {
        match self {
            Self::Group(id) => Some(id),
            _ => None,
        }
    }

    /// Check if this member is a nested group
    pub fn is_group(self) -> bool {
        matches!(self, Self::Group(_))
    }
}

impl fmt::Display for GroupMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(id) => id.fmt(f),
            Self::Wildcard(id) => id.fmt(f),
            Self::Group(id) => id.fmt(f),
        }
    }
}

impl From<ElementId> for GroupMember {
    fn from(id: ElementId) -> Self {
        Self::Element(id)
    }
}

impl From<WildcardId> for GroupMember {
    fn from(id: WildcardId) -> Self {
        Self::Wildcard(id)
    }
}

impl From<GroupId> for GroupMember {
    fn from(id: GroupId) -> Self {
        Self::Group(id)
    }
}

/// XSD Model Group (sequence, choice, all)
#[derive(Debug, Clone)]
pub struct XsdGroup {
    /// Optional name for named model groups
    pub name: Option<QName>,
    /// Model type (sequence, choice, all)
    pub model: ModelType,
    /// Members of this group
    pub members: Vec<GroupMember>,
    /// Occurrence constraints
    pub occurs: Occurs,
    pub(crate) parent: Option<GroupId>,
    pub(crate) effective: Occurs,
    pub(crate) emptiable: bool,
    pub(crate) leaves: Vec<GroupMember>,
}

impl XsdGroup {
    /// Create a new model group
    pub fn new(model: ModelType) -> Self {
        Self {
            name: None,
            model,
            members: Vec::new(),
            occurs: Occurs::once(),
            parent: None,
            effective: Occurs::empty(),
            emptiable: true,
            leaves: Vec::new(),
        }
    }

    /// Create a sequence group
    pub fn sequence() -> Self {
        Self::new(ModelType::Sequence)
    }

    /// Create a choice group
    pub fn choice() -> Self {
        Self::new(ModelType::Choice)
    }

    /// Create an all group
    pub fn all() -> Self {
        Self::new(ModelType::All)
    }

    /// Set the name of a named model group
    pub fn with_name(mut self, name: QName) -> Self {
        self.name = Some(name);
        self
    }

    /// Set occurrence constraints
    pub fn with_occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }

    /// Check if group has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Get number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if group can produce empty content
    pub fn is_emptiable(&self) -> bool {
        self.emptiable
    }

    /// Check if this group is "pointless" and can be eliminated
    pub fn is_pointless(&self, parent_model: ModelType) -> bool {
        if self.members.is_empty() {
            return true;
        }
        if self.occurs != Occurs::once() {
            return false;
        }
        if self.members.len() == 1 {
            return true;
        }

        // Same model type as parent can be flattened
        self.model == parent_model
    }

    /// Minimum number of elements the group content requires
    pub fn effective_min_occurs(&self) -> u32 {
        self.effective.min
    }

    /// Maximum number of elements the group content admits (None = unbounded)
    pub fn effective_max_occurs(&self) -> Option<u32> {
        self.effective.max
    }

    /// Leaf particles reachable from this group, nested groups flattened
    pub fn leaves(&self) -> &[GroupMember] {
        &self.leaves
    }
}

impl Particle for XsdGroup {
    fn occurs(&self) -> Occurs {
        self.occurs
    }
}

/// Lazy traversal over the members of a group tree
///
/// Produced by [`XsdGlobals::iter_elements`] and [`XsdGlobals::iter_model`].
/// Yields an error and stops once the nesting exceeds the model depth limit.
pub struct ModelIter<'a> {
    maps: &'a XsdGlobals,
    stack: Vec<(ModelType, std::slice::Iter<'a, GroupMember>)>,
    unwrap_all: bool,
    failed: bool,
}

impl<'a> ModelIter<'a> {
    fn new(maps: &'a XsdGlobals, root: GroupId, unwrap_all: bool) -> Self {
        let group = maps.group(root);
        let stack = if unwrap_all && group.occurs.is_empty() {
            Vec::new()
        } else {
            vec![(group.model, group.members.iter())]
        };
        Self {
            maps,
            stack,
            unwrap_all,
            failed: false,
        }
    }
}

impl Iterator for ModelIter<'_> {
    type Item = Result<GroupMember>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let (parent_model, next) = match self.stack.last_mut() {
                Some((model, members)) => (*model, members.next().copied()),
                None => return None,
            };

            match next {
                None => {
                    self.stack.pop();
                }
                Some(GroupMember::Group(id)) => {
                    let group = self.maps.group(id);
                    if !self.unwrap_all && !group.is_pointless(parent_model) {
                        return Some(Ok(GroupMember::Group(id)));
                    }
                    if self.unwrap_all && group.occurs.is_empty() {
                        continue;
                    }
                    let max_depth = self.maps.limits.max_model_depth;
                    if self.stack.len() > max_depth {
                        self.failed = true;
                        let err = ModelDepthError::new(self.stack.len(), max_depth)
                            .with_group(format!("{} {}", group.model, id));
                        return Some(Err(err.into()));
                    }
                    self.stack.push((group.model, group.members.iter()));
                }
                Some(member) => return Some(Ok(member)),
            }
        }
    }
}

impl XsdGlobals {
    /// Iterate the leaf element and wildcard particles of a group
    ///
    /// Nested groups are always unwrapped, groups with `maxOccurs=0` are
    /// skipped. The iteration is restartable by calling the method again.
    pub fn iter_elements(&self, group: GroupId) -> ModelIter<'_> {
        ModelIter::new(self, group, true)
    }

    /// Iterate the particles of a group, unwrapping only pointless groups
    ///
    /// Nested groups that carry matching semantics are yielded as members.
    pub fn iter_model(&self, group: GroupId) -> ModelIter<'_> {
        ModelIter::new(self, group, false)
    }

    /// Chain of groups from `root` down to the group containing `target`
    ///
    /// The target itself is not included.
    pub fn get_subgroups(&self, root: GroupId, target: GroupMember) -> Result<Vec<GroupId>> {
        let max_depth = self.limits.max_model_depth;
        let mut subgroups = vec![root];
        let mut stack = vec![self.group(root).members.iter()];

        loop {
            let next = match stack.last_mut() {
                Some(members) => members.next().copied(),
                None => break,
            };

            match next {
                Some(member) if member == target => return Ok(subgroups),
                Some(GroupMember::Group(id)) => {
                    if subgroups.len() > max_depth {
                        return Err(ModelDepthError::new(subgroups.len(), max_depth)
                            .with_group(format!("{} {}", self.group(root).model, root))
                            .into());
                    }
                    subgroups.push(id);
                    stack.push(self.group(id).members.iter());
                }
                Some(_) => {}
                None => {
                    stack.pop();
                    subgroups.pop();
                }
            }
        }

        Err(Error::Value(format!("{} is not a particle of {}", target, root)))
    }

    /// Overall minimum occurrences of a particle within the model of `root`
    pub fn overall_min_occurs(&self, root: GroupId, target: GroupMember) -> Result<u32> {
        let mut min_occurs = self.member_occurs(target).min;
        for id in self.get_subgroups(root, target)? {
            let group = self.group(id);
            if group.model == ModelType::Choice && group.members.len() > 1 {
                return Ok(0);
            }
            min_occurs = min_occurs.saturating_mul(group.occurs.min);
        }
        Ok(min_occurs)
    }

    /// Overall maximum occurrences of a particle within the model of `root`
    pub fn overall_max_occurs(&self, root: GroupId, target: GroupMember) -> Result<Option<u32>> {
        let mut max_occurs = self.member_occurs(target).max;
        for id in self.get_subgroups(root, target)? {
            let group_max = self.group(id).occurs.max;
            max_occurs = match (max_occurs, group_max) {
                (Some(0), _) => return Ok(Some(0)),
                (None, _) => None,
                (Some(_), None) => None,
                (Some(max), Some(group_max)) => Some(max.saturating_mul(group_max)),
            };
        }
        Ok(max_occurs)
    }

    /// Members of an `all` group taking part in unordered matching
    ///
    /// XSD 1.0 matches the direct members, XSD 1.1 the flattened leaves.
    pub(crate) fn unordered_members(&self, group: GroupId, version: XsdVersion) -> &[GroupMember] {
        let group = self.group(group);
        match version {
            XsdVersion::Xsd10 => &group.members,
            XsdVersion::Xsd11 => &group.leaves,
        }
    }

    fn member_effective(&self, member: GroupMember) -> Occurs {
        match member {
            GroupMember::Group(id) => self.group(id).effective,
            other => self.member_occurs(other),
        }
    }
}

/// Compute the cached values of a group once its members are computed
pub(crate) fn compute_group_caches(maps: &mut XsdGlobals, id: GroupId) {
    let group = maps.group(id);
    let emptiable = group.occurs.is_emptiable()
        || group.members.is_empty()
        || match group.model {
            ModelType::Choice => group.members.iter().any(|&m| maps.is_emptiable(m)),
            ModelType::Sequence | ModelType::All => {
                group.members.iter().all(|&m| maps.is_emptiable(m))
            }
        };
    let effective = Occurs::new(effective_min_occurs(maps, id), effective_max_occurs(maps, id));

    let mut leaves = Vec::new();
    for &member in &maps.group(id).members {
        match member {
            GroupMember::Group(sub) => {
                let sub = maps.group(sub);
                if !sub.occurs.is_empty() {
                    leaves.extend_from_slice(&sub.leaves);
                }
            }
            leaf => leaves.push(leaf),
        }
    }

    let group = &mut maps.groups[id.0];
    group.emptiable = emptiable;
    group.effective = effective;
    group.leaves = leaves;
}

fn effective_items(maps: &XsdGlobals, id: GroupId) -> Vec<Occurs> {
    maps.group(id)
        .members
        .iter()
        .map(|&m| maps.member_effective(m))
        .filter(|occurs| occurs.max != Some(0))
        .collect()
}

fn effective_min_occurs(maps: &XsdGlobals, id: GroupId) -> u32 {
    let group = maps.group(id);
    if group.occurs.min == 0 || group.members.is_empty() {
        return 0;
    }

    let items = effective_items(maps, id);
    if items.is_empty() {
        return 0;
    }

    match group.model {
        ModelType::Choice => {
            let min = items.iter().map(|o| o.min).min().unwrap_or(0);
            group.occurs.min.saturating_mul(min)
        }
        ModelType::All => items.iter().map(|o| o.min).max().unwrap_or(0),
        ModelType::Sequence => {
            let not_emptiable: Vec<_> = items.iter().filter(|o| o.min > 0).collect();
            match not_emptiable.as_slice() {
                [] => 0,
                [single] => group.occurs.min.saturating_mul(single.min),
                _ => group.occurs.min,
            }
        }
    }
}

fn effective_max_occurs(maps: &XsdGlobals, id: GroupId) -> Option<u32> {
    let group = maps.group(id);
    if group.occurs.max == Some(0) || group.members.is_empty() {
        return Some(0);
    }

    let items = effective_items(maps, id);
    if items.is_empty() {
        return Some(0);
    }

    let group_max = group.occurs.max?;
    let widest = |items: &[&Occurs]| -> Option<u32> {
        if items.iter().any(|o| o.max.is_none()) {
            None
        } else {
            let max = items.iter().filter_map(|o| o.max).max().unwrap_or(0);
            Some(group_max.saturating_mul(max))
        }
    };

    let all_items: Vec<&Occurs> = items.iter().collect();
    match group.model {
        ModelType::Choice => widest(&all_items),
        ModelType::All | ModelType::Sequence => {
            let not_emptiable: Vec<&Occurs> = items.iter().filter(|o| o.min > 0).collect();
            match not_emptiable.as_slice() {
                [] => widest(&all_items),
                [single] => single.max.map(|max| group_max.saturating_mul(max)),
                _ if group.model == ModelType::Sequence => Some(group_max),
                _ if not_emptiable.iter().all(|o| o.max.is_none()) => None,
                _ => not_emptiable.iter().filter_map(|o| o.max).min(),
            }
        }
    }
}

/// Fold a particle's bounds with every enclosing group's bounds
///
/// An optional ancestor, or a choice with alternatives, makes the particle
/// effectively optional.
pub(crate) fn fold_ancestor_occurs(maps: &XsdGlobals, member: GroupMember) -> Occurs {
    let mut occurs = maps.member_occurs(member);
    let mut parent = maps.parent_of(member);

    while let Some(id) = parent {
        let group = maps.group(id);
        if group.model == ModelType::Choice && group.members.len() > 1 {
            occurs.min = 0;
        }
        occurs = occurs.multiply(group.occurs);
        parent = group.parent;
    }
    occurs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::Limits;
    use crate::validators::elements::XsdElement;
    use crate::validators::schemas::{SchemaBuilder, XsdSchema};
    use crate::validators::simple_types::BuiltinType;

    struct Fixture {
        builder: SchemaBuilder,
        string: crate::validators::base::TypeId,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_limits(Limits::default())
        }

        fn with_limits(limits: Limits) -> Self {
            let mut builder = SchemaBuilder::new().with_limits(limits);
            let string = builder.builtin(BuiltinType::String);
            Self { builder, string }
        }

        fn element(&mut self, name: &str, occurs: Occurs) -> GroupMember {
            self.builder
                .add_element(XsdElement::new(QName::local(name), self.string).with_occurs(occurs))
                .into()
        }

        fn group(&mut self, group: XsdGroup, members: Vec<GroupMember>) -> GroupId {
            self.builder.add_group(group, members).unwrap()
        }

        fn build(self, root: GroupId) -> XsdSchema {
            let mut builder = self.builder;
            let root_type = builder.add_element_only_type(root);
            builder.add_global_element(XsdElement::new(QName::local("root"), root_type));
            builder.build().unwrap()
        }
    }

    fn nested_chain(depth: usize, limits: Limits) -> (XsdSchema, GroupId, GroupMember) {
        let mut fx = Fixture::with_limits(limits);
        let leaf = fx.element("leaf", Occurs::once());
        let mut current = fx.group(XsdGroup::sequence(), vec![leaf]);
        for _ in 0..depth {
            current = fx.group(XsdGroup::sequence(), vec![current.into()]);
        }
        (fx.build(current), current, leaf)
    }

    #[test]
    fn test_model_type_from_tag() {
        assert_eq!(ModelType::from_tag("sequence"), Some(ModelType::Sequence));
        assert_eq!(ModelType::from_tag("choice"), Some(ModelType::Choice));
        assert_eq!(ModelType::from_tag("all"), Some(ModelType::All));
        assert_eq!(ModelType::from_tag("invalid"), None);
    }

    #[test]
    fn test_is_pointless() {
        let empty = XsdGroup::sequence();
        assert!(empty.is_pointless(ModelType::Sequence));

        let mut single = XsdGroup::sequence();
        single.members.push(GroupMember::Element(ElementId(0)));
        assert!(single.is_pointless(ModelType::Choice));

        let mut multi = XsdGroup::sequence();
        multi.members = vec![ElementId(0).into(), ElementId(1).into()];
        assert!(multi.is_pointless(ModelType::Sequence));
        assert!(!multi.is_pointless(ModelType::Choice));

        let repeated = multi.clone().with_occurs(Occurs::zero_or_more());
        assert!(!repeated.is_pointless(ModelType::Sequence));
    }

    #[test]
    fn test_emptiable_and_effective_occurs() {
        let mut fx = Fixture::new();
        let a = fx.element("a", Occurs::new(2, Some(5)));
        let b = fx.element("b", Occurs::optional());
        let seq = fx.group(XsdGroup::sequence(), vec![a, b]);
        let c = fx.element("c", Occurs::new(1, Some(3)));
        let choice = fx.group(XsdGroup::choice(), vec![seq.into(), c]);
        let schema = fx.build(choice);
        let maps = schema.maps();

        let seq = maps.group(seq);
        assert!(!seq.is_emptiable());
        assert_eq!(seq.effective_min_occurs(), 2);
        assert_eq!(seq.effective_max_occurs(), Some(5));

        let choice = maps.group(choice);
        assert!(!choice.is_emptiable());
        assert_eq!(choice.effective_min_occurs(), 1);
        assert_eq!(choice.effective_max_occurs(), Some(5));
    }

    #[test]
    fn test_effective_max_unbounded() {
        let mut fx = Fixture::new();
        let a = fx.element("a", Occurs::new(1, Some(5)));
        let b = fx.element("b", Occurs::one_or_more());
        let choice = fx.group(XsdGroup::choice(), vec![a, b]);
        let schema = fx.build(choice);
        assert_eq!(schema.maps().group(choice).effective_max_occurs(), None);
    }

    #[test]
    fn test_particle_effective_occurs() {
        let mut fx = Fixture::new();
        let a = fx.element("a", Occurs::new(2, Some(2)));
        let inner = fx.group(XsdGroup::sequence().with_occurs(Occurs::new(0, Some(3))), vec![a]);
        let b = fx.element("b", Occurs::once());
        let c = fx.element("c", Occurs::once());
        let choice = fx.group(XsdGroup::choice(), vec![b, c]);
        let root = fx.group(XsdGroup::sequence(), vec![inner.into(), choice.into()]);
        let schema = fx.build(root);
        let maps = schema.maps();

        assert_eq!(maps.effective_occurs(a), Occurs::new(0, Some(6)));
        assert_eq!(maps.effective_occurs(b), Occurs::new(0, Some(1)));
        assert_eq!(maps.effective_occurs(root.into()), Occurs::once());
    }

    #[test]
    fn test_iter_elements_and_model() {
        let mut fx = Fixture::new();
        let a = fx.element("a", Occurs::once());
        let b = fx.element("b", Occurs::once());
        let c = fx.element("c", Occurs::once());
        let d = fx.element("d", Occurs::once());
        let pointless = fx.group(XsdGroup::sequence(), vec![a, b]);
        let repeated = fx.group(XsdGroup::choice().with_occurs(Occurs::zero_or_more()), vec![c]);
        let skipped = fx.group(XsdGroup::sequence().with_occurs(Occurs::empty()), vec![d]);
        let root = fx.group(
            XsdGroup::sequence(),
            vec![pointless.into(), repeated.into(), skipped.into()],
        );
        let schema = fx.build(root);
        let maps = schema.maps();

        let elements: Vec<_> = maps.iter_elements(root).collect::<Result<_>>().unwrap();
        assert_eq!(elements, vec![a, b, c]);

        let model: Vec<_> = maps.iter_model(root).collect::<Result<_>>().unwrap();
        assert_eq!(model, vec![a, b, repeated.into(), skipped.into()]);

        // restartable
        assert_eq!(maps.iter_elements(root).count(), 3);
        assert_eq!(maps.group(root).leaves(), &[a, b, c]);
    }

    #[test]
    fn test_get_subgroups_and_overall_occurs() {
        let mut fx = Fixture::new();
        let a = fx.element("a", Occurs::new(1, Some(2)));
        let inner = fx.group(XsdGroup::sequence().with_occurs(Occurs::new(2, Some(3))), vec![a]);
        let b = fx.element("b", Occurs::once());
        let root = fx.group(XsdGroup::sequence(), vec![inner.into(), b]);
        let schema = fx.build(root);
        let maps = schema.maps();

        assert_eq!(maps.get_subgroups(root, a).unwrap(), vec![root, inner]);
        assert_eq!(maps.get_subgroups(root, b).unwrap(), vec![root]);
        assert_eq!(maps.overall_min_occurs(root, a).unwrap(), 2);
        assert_eq!(maps.overall_max_occurs(root, a).unwrap(), Some(6));

        let stranger = GroupMember::Element(ElementId(999));
        assert!(matches!(maps.get_subgroups(root, stranger), Err(Error::Value(_))));
    }

    #[test]
    fn test_overall_occurs_with_choice_and_unbounded() {
        let mut fx = Fixture::new();
        let a = fx.element("a", Occurs::once());
        let b = fx.element("b", Occurs::once());
        let choice = fx.group(XsdGroup::choice().with_occurs(Occurs::one_or_more()), vec![a, b]);
        let root = fx.group(XsdGroup::sequence(), vec![choice.into()]);
        let schema = fx.build(root);
        let maps = schema.maps();

        assert_eq!(maps.overall_min_occurs(root, a).unwrap(), 0);
        assert_eq!(maps.overall_max_occurs(root, a).unwrap(), None);
    }

    #[test]
    fn test_depth_guard() {
        let limits = Limits::default();
        let (schema, root, leaf) = nested_chain(limits.max_model_depth + 1, limits);
        let maps = schema.maps();

        let result: Result<Vec<_>> = maps.iter_elements(root).collect();
        assert!(matches!(result, Err(Error::ModelDepth(_))));
        let result: Result<Vec<_>> = maps.iter_model(root).collect();
        assert!(matches!(result, Err(Error::ModelDepth(_))));
        assert!(matches!(maps.get_subgroups(root, leaf), Err(Error::ModelDepth(_))));
    }

    #[test]
    fn test_depth_within_limit() {
        let limits = Limits::default();
        let (schema, root, leaf) = nested_chain(limits.max_model_depth - 1, limits);
        let maps = schema.maps();

        let result: Vec<_> = maps.iter_elements(root).collect::<Result<_>>().unwrap();
        assert_eq!(result, vec![leaf]);
        assert_eq!(maps.get_subgroups(root, leaf).unwrap().len(), limits.max_model_depth);
    }
}
