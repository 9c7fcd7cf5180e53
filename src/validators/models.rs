//! XSD Content Model Validators
//!
//! This module provides the content model automaton used to validate the
//! children of an element against a model group:
//! - ModelVisitor walks the group tree counting occurrences
//! - ModelDiagnostic reports occurrence violations found while advancing
//!
//! The visitor assumes the model satisfies the Unique Particle Attribution
//! constraint: it performs an ordered, greedy walk and never backtracks.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#coss-particle

use std::collections::HashMap;

use log::trace;

use crate::error::{Error, Result};
use crate::namespaces::QName;

use super::base::{GroupId, XsdVersion};
use super::exceptions::ModelDepthError;
use super::globals::XsdGlobals;
use super::groups::{GroupMember, ModelType};

/// Occurrence violation found while advancing a model
///
/// `particle` is the element, wildcard or group that violated its bounds,
/// `occurs` its count at the time of the violation and `expected` the leaf
/// particles that could have been matched instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDiagnostic {
    /// The particle that generated the diagnostic
    pub particle: GroupMember,
    /// Occurrences of the particle
    pub occurs: u32,
    /// Expected leaf particles
    pub expected: Vec<GroupMember>,
}

/// Cursor over the members of the current group
#[derive(Debug, Clone, Copy)]
struct Items<'a> {
    members: &'a [GroupMember],
    position: usize,
    /// Skip members that are groups or already over their maximum
    unordered: bool,
}

impl Items<'_> {
    fn empty() -> Self {
        Self {
            members: &[],
            position: 0,
            unordered: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame<'a> {
    group: GroupId,
    items: Items<'a>,
    matched: bool,
}

enum Step {
    Positioned,
    Ended,
}

/// Model visitor for validating XML content against XSD model groups.
///
/// The visitor uses a state machine to track position within the content model,
/// counting occurrences and returning diagnostics when constraints are violated.
/// The visit ends when [`current_member`](Self::current_member) becomes `None`.
#[derive(Debug)]
pub struct ModelVisitor<'a> {
    maps: &'a XsdGlobals,
    root: GroupId,
    version: XsdVersion,

    /// Enclosing groups of the current one
    frames: Vec<Frame<'a>>,

    /// Running occurrence counts
    occurs: HashMap<GroupMember, u32>,

    /// Upper estimate of the occurrences of repeated particles
    ceiling: HashMap<GroupMember, u32>,

    element: Option<GroupMember>,
    group: GroupId,
    items: Items<'a>,
    matched: bool,
}

impl<'a> ModelVisitor<'a> {
    /// Create a new model visitor for the given root group
    pub fn new(maps: &'a XsdGlobals, root: GroupId) -> Result<Self> {
        Self::with_version(maps, root, maps.version())
    }

    /// Create a visitor with an explicit XSD version for `all` groups
    pub fn with_version(maps: &'a XsdGlobals, root: GroupId, version: XsdVersion) -> Result<Self> {
        let mut visitor = Self {
            maps,
            root,
            version,
            frames: Vec::new(),
            occurs: HashMap::new(),
            ceiling: HashMap::new(),
            element: None,
            group: root,
            items: Items::empty(),
            matched: false,
        };
        visitor.items = visitor.iter_group();
        visitor.start()?;
        Ok(visitor)
    }

    /// The root model group
    pub fn root(&self) -> GroupId {
        self.root
    }

    /// XSD version used for `all` groups
    pub fn version(&self) -> XsdVersion {
        self.version
    }

    /// Current leaf particle, `None` once the model is ended
    pub fn current_member(&self) -> Option<GroupMember> {
        self.element
    }

    /// Group containing the current particle
    pub fn current_group(&self) -> GroupId {
        self.group
    }

    /// Check if the model visit is ended
    pub fn is_ended(&self) -> bool {
        self.element.is_none()
    }

    /// Occurrences counted for a particle
    pub fn occurs_of(&self, member: GroupMember) -> u32 {
        self.count(member)
    }

    /// Clear the visitor state, leaving the model ended
    pub fn clear(&mut self) {
        self.frames.clear();
        self.occurs.clear();
        self.ceiling.clear();
        self.element = None;
        self.group = self.root;
        self.items = self.iter_group();
        self.matched = false;
    }

    /// Restart the visit from the first particle of the root group
    pub fn restart(&mut self) -> Result<()> {
        self.clear();
        self.start()
    }

    /// Model-less match of a child name among the root leaf particles
    pub fn match_element(&self, name: &QName) -> Option<GroupMember> {
        self.maps
            .group(self.root)
            .leaves()
            .iter()
            .copied()
            .find(|&member| self.maps.is_matching(member, name))
    }

    /// Expected leaf particles of the current group
    ///
    /// Every member of a choice is expected, for the other models only the
    /// members that still need occurrences.
    pub fn expected(&self) -> Vec<GroupMember> {
        let maps = self.maps;
        let group = maps.group(self.group);
        let mut expected = Vec::new();

        for &member in &group.members {
            if group.model != ModelType::Choice && maps.member_occurs(member).min <= self.count(member) {
                continue;
            }
            match member {
                GroupMember::Group(id) => {
                    let inner = maps.group(id);
                    if !inner.occurs.is_empty() {
                        expected.extend_from_slice(inner.leaves());
                    }
                }
                leaf => expected.push(leaf),
            }
        }
        expected
    }

    /// Advance to the next particle
    ///
    /// `matched` tells whether the current particle matched the child being
    /// checked. Returns the occurrence violations found while moving on.
    pub fn advance(&mut self, matched: bool) -> Result<Vec<ModelDiagnostic>> {
        let element = self
            .element
            .ok_or_else(|| Error::Value("cannot advance, model is ended".to_string()))?;
        let maps = self.maps;
        let mut diagnostics = Vec::new();

        if matched {
            *self.occurs.entry(element).or_default() += 1;
            self.matched = true;

            let model = maps.group(self.group).model;
            let occurs = maps.member_occurs(element);
            if model == ModelType::All {
                self.items = self.iter_group();
            } else if !occurs.is_over(self.count(element)) {
                return Ok(diagnostics);
            } else if model == ModelType::Choice && occurs.is_ambiguous() {
                return Ok(diagnostics);
            }
        }

        let mut last_item = None;
        if let Step::Ended = self.run(element, &mut last_item, &mut diagnostics)? {
            self.element = None;
            let group_id = GroupMember::Group(self.group);
            let group = maps.group(self.group);
            let count = self.count(group_id);

            if group.occurs.is_missing(count.max(self.ceil(group_id))) {
                let report = match group.model {
                    ModelType::Choice => true,
                    ModelType::Sequence => last_item.is_some(),
                    ModelType::All => group
                        .members
                        .iter()
                        .any(|&m| maps.member_occurs(m).min > self.count(m)),
                };
                if report {
                    diagnostics.push(self.diagnostic(group_id, count));
                }
            } else if group.occurs.max.is_some_and(|max| max < count) {
                diagnostics.push(self.diagnostic(group_id, count));
            }
            trace!("model of {} ended", self.root);
        }

        Ok(diagnostics)
    }

    /// Stop the visit, returning the violations of the remaining particles
    pub fn stop(&mut self) -> Result<Vec<ModelDiagnostic>> {
        let mut diagnostics = Vec::new();
        while self.element.is_some() {
            diagnostics.extend(self.advance(false)?);
        }
        Ok(diagnostics)
    }

    fn run(
        &mut self,
        element: GroupMember,
        last_item: &mut Option<GroupMember>,
        diagnostics: &mut Vec<ModelDiagnostic>,
    ) -> Result<Step> {
        let maps = self.maps;

        let element_occurs = self.count(element);
        match self.stop_item(element) {
            None => return Ok(Step::Ended),
            Some(true) => diagnostics.push(ModelDiagnostic {
                particle: element,
                occurs: element_occurs,
                expected: vec![element],
            }),
            Some(false) => {}
        }

        loop {
            while self.is_group_over() {
                if self.stop_item(GroupMember::Group(self.group)).is_none() {
                    return Ok(Step::Ended);
                }
            }

            let item = self.next_item();
            *last_item = item;
            let group = maps.group(self.group);

            match item {
                Some(GroupMember::Group(id)) => {
                    self.push_group(id)?;
                    let member = GroupMember::Group(id);
                    self.occurs.insert(member, 0);
                    self.ceiling.insert(member, 0);
                }
                Some(member) => {
                    self.element = Some(member);
                    if group.model == ModelType::Sequence {
                        self.occurs.insert(member, 0);
                    }
                    trace!("model of {} positioned on {}", self.root, member);
                    return Ok(Step::Positioned);
                }
                None if !self.matched => {
                    let current = GroupMember::Group(self.group);
                    if group.model == ModelType::All && self.is_unordered_satisfied() {
                        self.occurs.insert(current, 1);
                    }
                    let expected = self.expected();
                    match self.stop_item(current) {
                        None => return Ok(Step::Ended),
                        Some(true) if !expected.is_empty() => diagnostics.push(ModelDiagnostic {
                            particle: current,
                            occurs: self.count(current),
                            expected,
                        }),
                        Some(_) => {}
                    }
                }
                None if group.model != ModelType::All => {
                    self.items = self.iter_group();
                    self.matched = false;
                }
                None if !self.is_unordered_satisfied() => {
                    if group.occurs.min == 0 {
                        let current = GroupMember::Group(self.group);
                        diagnostics.push(self.diagnostic(current, self.count(current)));
                    }
                    if !self.pop_frame() {
                        return Ok(Step::Ended);
                    }
                }
                None if group
                    .members
                    .iter()
                    .any(|&m| !maps.member_occurs(m).is_over(self.count(m))) =>
                {
                    self.items = self.iter_group();
                    self.matched = false;
                }
                None => {
                    let current = GroupMember::Group(self.group);
                    self.occurs.insert(current, 1);
                    // a repeatable group would be re-entered forever
                    if !group.occurs.is_over(1) && self.stop_item(current).is_none() {
                        return Ok(Step::Ended);
                    }
                }
            }
        }
    }

    /// Stop matching an element or group, updating the current group counters
    ///
    /// Returns `Some(true)` if the item violated its minimum occurrences or
    /// the current group's, `None` when the model has no enclosing group left.
    fn stop_item(&mut self, item: GroupMember) -> Option<bool> {
        if item.is_group() && !self.pop_frame() {
            return None;
        }

        let maps = self.maps;
        let group_id = GroupMember::Group(self.group);
        let group = maps.group(self.group);
        let item_occurs = maps.member_occurs(item);

        match group.model {
            ModelType::Choice => {
                let count = self.count(item);
                if count == 0 {
                    return Some(false);
                }
                let item_max = match self.ceil(item) {
                    0 => count,
                    ceil => ceil,
                };
                let min_group = match item_occurs.max {
                    None | Some(0) => 1,
                    Some(max) => count.div_ceil(max),
                };
                let max_group = (item_max / item_occurs.min.max(1)).max(1);

                *self.occurs.entry(group_id).or_default() += min_group;
                *self.ceiling.entry(group_id).or_default() += max_group;
                self.occurs.insert(item, 0);

                self.items = self.iter_group();
                self.matched = false;
                Some(item_occurs.is_missing(item_max))
            }
            ModelType::All => Some(false),
            ModelType::Sequence => {
                if self.matched {
                    // already matched
                } else if self.count(item) > 0 {
                    self.matched = true;
                } else if maps.is_emptiable(item) {
                    return Some(false);
                } else if !self.frames.is_empty() {
                    return self.stop_item(group_id);
                } else if group.occurs.min <= self.count(group_id).max(self.ceil(group_id)) {
                    return self.stop_item(group_id);
                } else {
                    return Some(true);
                }

                if group.members.last() == Some(&item) {
                    self.count_sequence_repetition(self.group);
                }
                Some(item_occurs.is_missing(self.count(item).max(self.ceil(item))))
            }
        }
    }

    /// Add the occurrences of a sequence deduced from its first matched member
    fn count_sequence_repetition(&mut self, id: GroupId) {
        let maps = self.maps;
        let group = maps.group(id);
        let group_id = GroupMember::Group(id);

        for (k, &member) in group.members.iter().enumerate() {
            let count = self.count(member);
            if count == 0 {
                continue;
            }
            let member_max = match self.ceil(member) {
                0 => count,
                ceil => ceil,
            };
            if member_max == 1 || group.members[k + 1..].iter().any(|&m| !maps.is_emptiable(m)) {
                *self.occurs.entry(group_id).or_default() += 1;
                break;
            }

            let occurs = maps.member_occurs(member);
            let max = occurs.max.filter(|&max| max > 0).unwrap_or(count);
            let min_group = (count / max).max(1);
            let max_group = (member_max / occurs.min.max(1)).max(1);

            *self.occurs.entry(group_id).or_default() += min_group;
            *self.ceiling.entry(group_id).or_default() += max_group;
            break;
        }
    }

    fn start(&mut self) -> Result<()> {
        loop {
            match self.next_item() {
                None => {
                    if !self.pop_frame() {
                        break;
                    }
                }
                Some(GroupMember::Group(id)) => {
                    if !self.maps.group(id).is_empty() {
                        self.push_group(id)?;
                    }
                }
                Some(member) => {
                    self.element = Some(member);
                    break;
                }
            }
        }
        Ok(())
    }

    fn iter_group(&self) -> Items<'a> {
        let maps = self.maps;
        let group = maps.group(self.group);
        if group.occurs.is_empty() {
            Items::empty()
        } else if group.model != ModelType::All {
            Items {
                members: &group.members,
                position: 0,
                unordered: false,
            }
        } else {
            Items {
                members: maps.unordered_members(self.group, self.version),
                position: 0,
                unordered: true,
            }
        }
    }

    fn next_item(&mut self) -> Option<GroupMember> {
        while let Some(&member) = self.items.members.get(self.items.position) {
            self.items.position += 1;
            if self.items.unordered
                && (member.is_group() || self.maps.member_occurs(member).is_over(self.count(member)))
            {
                continue;
            }
            return Some(member);
        }
        None
    }

    fn push_group(&mut self, id: GroupId) -> Result<()> {
        let depth = self.frames.len() + 1;
        let max_depth = self.maps.limits().max_model_depth;
        if depth > max_depth {
            return Err(ModelDepthError::new(depth, max_depth)
                .with_group(format!("{} {}", self.maps.group(self.root).model, self.root))
                .into());
        }

        self.frames.push(Frame {
            group: self.group,
            items: self.items,
            matched: self.matched,
        });
        self.group = id;
        self.items = self.iter_group();
        self.matched = false;
        Ok(())
    }

    fn pop_frame(&mut self) -> bool {
        match self.frames.pop() {
            Some(frame) => {
                self.group = frame.group;
                self.items = frame.items;
                self.matched = frame.matched;
                true
            }
            None => false,
        }
    }

    fn is_group_over(&self) -> bool {
        let current = GroupMember::Group(self.group);
        let reached = self.count(current).max(self.ceil(current));
        self.maps.group(self.group).occurs.is_over(reached)
    }

    fn is_unordered_satisfied(&self) -> bool {
        self.maps
            .unordered_members(self.group, self.version)
            .iter()
            .all(|&m| self.maps.member_occurs(m).min <= self.count(m))
    }

    fn diagnostic(&self, particle: GroupMember, occurs: u32) -> ModelDiagnostic {
        ModelDiagnostic {
            particle,
            occurs,
            expected: self.expected(),
        }
    }

    fn count(&self, member: GroupMember) -> u32 {
        self.occurs.get(&member).copied().unwrap_or(0)
    }

    fn ceil(&self, member: GroupMember) -> u32 {
        self.ceiling.get(&member).copied().unwrap_or(0)
    }
}
