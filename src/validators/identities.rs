//! XSD Identity Constraints
//!
//! This module implements identity constraints for XML Schema:
//! - xs:unique - Ensures values are unique within scope
//! - xs:key - Like unique, but all field values must be present
//! - xs:keyref - References a key/unique constraint (foreign key)
//!
//! Constraints are evaluated on the decoded subtree of the element that
//! declares them, once that element has been fully processed. Value tables of
//! key/unique constraints propagate upwards so that a keyref declared on an
//! ancestor can be resolved against them.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use indexmap::map::Entry;
use indexmap::IndexMap;
use log::{trace, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result, Severity, ValidationError};
use crate::namespaces::{NamespaceContext, QName};
use crate::xpath::{IdentityPath, PathNode};

use super::base::IdentityId;
use super::document_validation::DecodedElement;
use super::exceptions::IdentityError;
use super::globals::XsdGlobals;

/// Policy for a `key` field that selects nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsentKeyField {
    /// Report a "missing key field" error
    #[default]
    Error,
    /// Count the tuple like a unique constraint does
    Exclude,
    /// Report a warning and leave the tuple out
    Warn,
}

/// Runtime options of the identity engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityOptions {
    /// What to do with absent key fields
    pub absent_key_field: AbsentKeyField,
}

/// Typed value of an identity field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    /// The field selected nothing
    Absent,
    /// String value
    String(String),
    /// Integer value
    Integer(i64),
    /// Non integral or out of range number, normalized
    Decimal(Decimal),
    /// Boolean value
    Boolean(bool),
}

impl FieldValue {
    /// Check if the field selected nothing
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Absent,
            Value::Bool(b) => Self::Boolean(*b),
            Value::String(s) => Self::String(s.clone()),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => {
                    let text = n.to_string();
                    match Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)) {
                        Ok(d) => {
                            let d = d.normalize();
                            match i64::try_from(d) {
                                Ok(i) if d.scale() == 0 => Self::Integer(i),
                                _ => Self::Decimal(d),
                            }
                        }
                        Err(_) => Self::String(text),
                    }
                }
            },
            other => Self::String(other.to_string()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("None"),
            Self::String(s) if s.contains('\'') && !s.contains('"') => write!(f, "\"{}\"", s),
            Self::String(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Decimal(d) => write!(f, "{}", d),
            Self::Boolean(true) => f.write_str("True"),
            Self::Boolean(false) => f.write_str("False"),
        }
    }
}

/// A tuple of field values forming a composite key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldTuple(pub Vec<FieldValue>);

impl FieldTuple {
    /// Check if every field is absent
    pub fn is_all_absent(&self) -> bool {
        self.0.iter().all(FieldValue::is_absent)
    }

    /// Position of the first absent field
    pub fn first_absent(&self) -> Option<usize> {
        self.0.iter().position(FieldValue::is_absent)
    }
}

impl<T: Into<FieldValue>> FromIterator<T> for FieldTuple {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for FieldTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", value)?;
        }
        if self.0.len() == 1 {
            f.write_str(",")?;
        }
        f.write_str(")")
    }
}

/// Value tables of key and unique constraints, by constraint
pub type IdentityTables = HashMap<IdentityId, HashSet<FieldTuple>>;

/// XPath selector for identity constraints.
/// The selector identifies which elements are subject to the constraint.
#[derive(Debug, Clone)]
pub struct XsdSelector {
    /// The XPath expression
    pub xpath: String,
    path: IdentityPath,
}

impl XsdSelector {
    /// Create a selector, compiled when the schema is built
    pub fn new(xpath: impl Into<String>) -> Self {
        Self {
            xpath: xpath.into(),
            path: IdentityPath::default(),
        }
    }

    fn compile(&mut self, namespaces: &NamespaceContext) -> Result<()> {
        self.path = IdentityPath::parse_selector(&self.xpath, namespaces)?;
        Ok(())
    }

    /// Elements selected from the scope element
    pub fn select<'a>(&self, scope: &'a DecodedElement) -> std::result::Result<Vec<&'a DecodedElement>, IdentityError> {
        self.path
            .select(scope)
            .into_iter()
            .map(|node| match node {
                PathNode::Element(elem) => Ok(elem),
                PathNode::Attribute { .. } => Err(IdentityError::new(
                    "selector xpath expression can only select elements",
                )
                .with_path(&scope.path)),
            })
            .collect()
    }
}

/// XPath field selector for identity constraints.
/// Fields identify which values form the key within selected elements.
#[derive(Debug, Clone)]
pub struct XsdField {
    /// The XPath expression
    pub xpath: String,
    path: IdentityPath,
}

impl XsdField {
    /// Create a field, compiled when the schema is built
    pub fn new(xpath: impl Into<String>) -> Self {
        Self {
            xpath: xpath.into(),
            path: IdentityPath::default(),
        }
    }

    fn compile(&mut self, namespaces: &NamespaceContext) -> Result<()> {
        self.path = IdentityPath::parse_field(&self.xpath, namespaces)?;
        Ok(())
    }

    /// Field value for a selected element
    pub fn get_value(&self, elem: &DecodedElement) -> std::result::Result<FieldValue, IdentityError> {
        let nodes = self.path.select(elem);
        match nodes.as_slice() {
            [] => Ok(FieldValue::Absent),
            [node] => Ok(node.typed_value().map_or(FieldValue::Absent, FieldValue::from)),
            _ => Err(IdentityError::new(format!(
                "'{}' field selects multiple values",
                self.xpath
            ))
            .with_path(&elem.path)),
        }
    }
}

/// Kind of identity constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityKind {
    /// xs:unique - values must be unique, but fields can be missing
    Unique,
    /// xs:key - values must be unique AND all fields must be present
    Key,
    /// xs:keyref - references a key or unique constraint by name
    Keyref(QName),
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unique => f.write_str("unique"),
            Self::Key => f.write_str("key"),
            Self::Keyref(_) => f.write_str("keyref"),
        }
    }
}

/// An identity constraint declared on an element
#[derive(Debug, Clone)]
pub struct XsdIdentity {
    /// Constraint name
    pub name: QName,
    /// Kind of constraint
    pub kind: IdentityKind,
    /// XPath selector
    pub selector: XsdSelector,
    /// XPath fields
    pub fields: Vec<XsdField>,
    /// Prefixes usable in the paths
    pub namespaces: NamespaceContext,
    /// Referenced constraint of a keyref, resolved at build
    pub(crate) refer: Option<IdentityId>,
}

impl XsdIdentity {
    fn new<F>(name: QName, kind: IdentityKind, selector: &str, fields: F) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            name,
            kind,
            selector: XsdSelector::new(selector),
            fields: fields.into_iter().map(XsdField::new).collect(),
            namespaces: NamespaceContext::new(),
            refer: None,
        }
    }

    /// Create an xs:key
    pub fn key<F>(name: QName, selector: &str, fields: F) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self::new(name, IdentityKind::Key, selector, fields)
    }

    /// Create an xs:unique
    pub fn unique<F>(name: QName, selector: &str, fields: F) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self::new(name, IdentityKind::Unique, selector, fields)
    }

    /// Create an xs:keyref referring to a key or unique by name
    pub fn keyref<F>(name: QName, refer: QName, selector: &str, fields: F) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self::new(name, IdentityKind::Keyref(refer), selector, fields)
    }

    /// Set the prefixes used to resolve names in the paths
    pub fn with_namespaces(mut self, namespaces: NamespaceContext) -> Self {
        self.namespaces = namespaces;
        self
    }

    /// Check if this is an xs:key
    pub fn is_key(&self) -> bool {
        self.kind == IdentityKind::Key
    }

    /// Check if this is an xs:keyref
    pub fn is_keyref(&self) -> bool {
        matches!(self.kind, IdentityKind::Keyref(_))
    }

    /// The referenced constraint of a keyref
    pub fn refer(&self) -> Option<IdentityId> {
        self.refer
    }

    /// Compile the selector and field paths
    pub(crate) fn compile(&mut self) -> Result<()> {
        let component = self.to_string();
        let with_component = |err: Error| match err {
            Error::Parse(e) => Error::Parse(e.with_component(component.clone())),
            other => other,
        };
        self.selector.compile(&self.namespaces).map_err(&with_component)?;
        for field in &mut self.fields {
            field.compile(&self.namespaces).map_err(&with_component)?;
        }
        Ok(())
    }

    /// Field tuples of the elements selected from a scope element
    ///
    /// Problems with single elements are appended to `errors` and the
    /// element is left out.
    pub fn collect_tuples<'a>(
        &self,
        scope: &'a DecodedElement,
        options: &IdentityOptions,
        errors: &mut Vec<ValidationError>,
    ) -> Vec<(FieldTuple, &'a str)> {
        let selected = match self.selector.select(scope) {
            Ok(selected) => selected,
            Err(err) => {
                errors.push(err.into());
                return Vec::new();
            }
        };

        let mut tuples = Vec::new();
        'elements: for elem in selected {
            let mut values = Vec::with_capacity(self.fields.len());
            for field in &self.fields {
                match field.get_value(elem) {
                    Ok(value) => values.push(value),
                    Err(err) => {
                        errors.push(err.into());
                        continue 'elements;
                    }
                }
            }
            let tuple = FieldTuple(values);

            if self.is_key() {
                if let Some(index) = tuple.first_absent() {
                    let message = format!(
                        "missing key field '{}' for {}",
                        self.fields[index].xpath, self
                    );
                    match options.absent_key_field {
                        AbsentKeyField::Error => {
                            errors.push(IdentityError::new(message).with_path(&elem.path).into());
                            continue;
                        }
                        AbsentKeyField::Warn => {
                            warn!("{} at {}", message, elem.path);
                            errors.push(
                                ValidationError::from(IdentityError::new(message).with_path(&elem.path))
                                    .with_severity(Severity::Warning),
                            );
                            continue;
                        }
                        AbsentKeyField::Exclude => {}
                    }
                }
            }

            if tuple.is_all_absent() && !elem.nil {
                continue;
            }
            tuples.push((tuple, elem.path.as_str()));
        }
        tuples
    }
}

impl fmt::Display for XsdIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

/// Occurrence counter of a key or unique constraint
#[derive(Debug, Clone)]
pub struct IdentityCounter {
    identity: IdentityId,
    counter: IndexMap<FieldTuple, usize>,
}

impl IdentityCounter {
    /// Create an empty counter
    pub fn new(identity: IdentityId) -> Self {
        Self {
            identity,
            counter: IndexMap::new(),
        }
    }

    /// The counted constraint
    pub fn identity(&self) -> IdentityId {
        self.identity
    }

    /// Count a tuple, a second occurrence is a duplicate
    pub fn increase(
        &mut self,
        fields: FieldTuple,
        identity: &XsdIdentity,
    ) -> std::result::Result<(), IdentityError> {
        trace!("{}: count {}", identity, fields);
        match self.counter.entry(fields) {
            Entry::Vacant(entry) => {
                entry.insert(1);
            }
            Entry::Occupied(mut entry) => {
                *entry.get_mut() += 1;
                if *entry.get() == 2 {
                    return Err(IdentityError::new(format!(
                        "duplicated value {} for {}",
                        entry.key(),
                        identity
                    )));
                }
            }
        }
        Ok(())
    }

    /// Occurrences of a tuple
    pub fn get_count(&self, fields: &FieldTuple) -> usize {
        self.counter.get(fields).copied().unwrap_or(0)
    }

    /// Check if a tuple was counted
    pub fn contains(&self, fields: &FieldTuple) -> bool {
        self.counter.contains_key(fields)
    }

    /// Counted tuples
    pub fn values(&self) -> impl Iterator<Item = &FieldTuple> {
        self.counter.keys()
    }
}

/// Reference counter of a keyref constraint
#[derive(Debug, Clone)]
pub struct KeyrefCounter {
    identity: IdentityId,
    counter: IndexMap<FieldTuple, usize>,
}

impl KeyrefCounter {
    /// Create an empty counter
    pub fn new(identity: IdentityId) -> Self {
        Self {
            identity,
            counter: IndexMap::new(),
        }
    }

    /// The counted constraint
    pub fn identity(&self) -> IdentityId {
        self.identity
    }

    /// Count a reference
    pub fn increase(&mut self, fields: FieldTuple) {
        *self.counter.entry(fields).or_insert(0) += 1;
    }

    /// Occurrences of a tuple
    pub fn get_count(&self, fields: &FieldTuple) -> usize {
        self.counter.get(fields).copied().unwrap_or(0)
    }

    /// Errors for the references not found in the table of the referenced constraint
    pub fn iter_errors<'a>(
        &'a self,
        refer: &'a XsdIdentity,
        refer_values: &'a HashSet<FieldTuple>,
    ) -> impl Iterator<Item = IdentityError> + 'a {
        self.counter
            .iter()
            .filter(move |(fields, _)| !refer_values.contains(*fields))
            .map(move |(fields, count)| {
                if *count > 1 {
                    IdentityError::new(format!(
                        "value {} not found for {} ({} times)",
                        fields, refer, count
                    ))
                } else {
                    IdentityError::new(format!("value {} not found for {}", fields, refer))
                }
            })
    }
}

/// Evaluate the constraints declared on a fully processed element
///
/// `descendants` holds the tables propagated from the element's subtree.
/// Returns the tables to propagate to the parent element.
pub(crate) fn check_scope(
    maps: &XsdGlobals,
    identities: &[IdentityId],
    scope: &DecodedElement,
    mut descendants: IdentityTables,
    options: &IdentityOptions,
    resolve_keyrefs: bool,
    errors: &mut Vec<ValidationError>,
) -> IdentityTables {
    let mut counters: Vec<IdentityCounter> = Vec::new();
    let mut keyrefs: Vec<KeyrefCounter> = Vec::new();

    for &id in identities {
        let identity = maps.identity(id);
        let tuples = identity.collect_tuples(scope, options, errors);
        if identity.is_keyref() {
            let mut counter = KeyrefCounter::new(id);
            for (fields, _) in tuples {
                counter.increase(fields);
            }
            keyrefs.push(counter);
        } else {
            let mut counter = IdentityCounter::new(id);
            for (fields, path) in tuples {
                if let Err(err) = counter.increase(fields, identity) {
                    errors.push(err.with_path(path).into());
                }
            }
            counters.push(counter);
        }
    }

    if resolve_keyrefs {
        let empty = HashSet::new();
        for keyref in &keyrefs {
            let identity = maps.identity(keyref.identity());
            let Some(refer_id) = identity.refer() else {
                continue;
            };
            let own: HashSet<FieldTuple>;
            let table = match counters.iter().find(|c| c.identity() == refer_id) {
                Some(counter) => {
                    own = counter.values().cloned().collect();
                    &own
                }
                None => descendants.get(&refer_id).unwrap_or(&empty),
            };
            for err in keyref.iter_errors(maps.identity(refer_id), table) {
                errors.push(err.with_path(&scope.path).into());
            }
        }
    }

    for counter in counters {
        descendants
            .entry(counter.identity())
            .or_default()
            .extend(counter.counter.into_keys());
    }
    descendants
}

/// Merge the tables of a child scope into the accumulated ones
pub(crate) fn merge_tables(into: &mut IdentityTables, tables: IdentityTables) {
    for (id, values) in tables {
        into.entry(id).or_default().extend(values);
    }
}
