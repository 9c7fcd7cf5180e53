//! XPath Selectors for XML Schema
//!
//! Selectors and fields of identity constraints (xs:selector, xs:field) use a
//! small subset of XPath: a union of relative child paths, each optionally
//! starting with `.//`. Only a field path may end with an attribute step.

use std::ptr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{Error, ParseError, Result};
use crate::namespaces::{NamespaceContext, QName};
use crate::validators::document_validation::DecodedElement;

const NCNAME: &str = r"[\p{L}_][\p{L}\p{N}_.\-]*";

fn path_pattern(field: bool) -> String {
    let name_test = format!(r"(?:{nc}:)?(?:{nc}|\*)", nc = NCNAME);
    let step = format!(r"(?:\.|(?:child::)?{})", name_test);
    let last = if field {
        format!(r"(?:{}|(?:@|attribute::){})", step, name_test)
    } else {
        step.clone()
    };
    let path = format!(r"(?:\.//)?(?:{}/)*{}", step, last);
    format!(r"^{path}(?:\|{path})*$", path = path)
}

static SELECTOR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(&path_pattern(false)).unwrap());

static FIELD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(&path_pattern(true)).unwrap());

/// Name test of a path step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    /// `*`
    Any,
    /// `prefix:*`
    Namespace(String),
    /// A resolved name
    Name(QName),
}

impl NameTest {
    fn parse(token: &str, namespaces: &NamespaceContext) -> Result<Self> {
        if token == "*" {
            return Ok(Self::Any);
        }
        match token.split_once(':') {
            None => Ok(Self::Name(QName::local(token))),
            Some((prefix, local)) => {
                let uri = namespaces.get_namespace(prefix).ok_or_else(|| {
                    Error::Namespace(format!("unmapped prefix '{}' in XPath expression", prefix))
                })?;
                if local == "*" {
                    Ok(Self::Namespace(uri.to_string()))
                } else {
                    Ok(Self::Name(QName::namespaced(uri, local)))
                }
            }
        }
    }

    /// Check if a node name passes the test
    pub fn matches(&self, name: &QName) -> bool {
        match self {
            Self::Any => true,
            Self::Namespace(uri) => name.namespace_uri() == uri,
            Self::Name(qname) => qname == name,
        }
    }
}

/// A single step in a restricted path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// `.`
    SelfNode,
    /// The leading `.//`
    DescendantOrSelf,
    /// Child axis, abbreviated or `child::`
    Child(NameTest),
    /// Attribute axis, `@` or `attribute::`
    Attribute(NameTest),
}

impl PathStep {
    fn parse(token: &str, namespaces: &NamespaceContext) -> Result<Self> {
        if token == "." {
            return Ok(Self::SelfNode);
        }
        if let Some(name) = token.strip_prefix('@').or_else(|| token.strip_prefix("attribute::")) {
            return Ok(Self::Attribute(NameTest::parse(name, namespaces)?));
        }
        let name = token.strip_prefix("child::").unwrap_or(token);
        Ok(Self::Child(NameTest::parse(name, namespaces)?))
    }
}

/// A node selected by a path
#[derive(Debug, Clone, Copy)]
pub enum PathNode<'a> {
    /// An element of the decoded tree
    Element(&'a DecodedElement),
    /// An attribute of a decoded element, defaults included
    Attribute {
        /// Owner element
        element: &'a DecodedElement,
        /// Attribute name
        name: &'a QName,
        /// Decoded value
        value: &'a Value,
    },
}

impl<'a> PathNode<'a> {
    /// Typed value of the node, `None` for nilled or contentless elements
    pub fn typed_value(&self) -> Option<&'a Value> {
        match *self {
            Self::Element(elem) if elem.nil => None,
            Self::Element(elem) => elem.text.as_ref().or(elem.default_value.as_ref()),
            Self::Attribute { value, .. } => Some(value),
        }
    }

    /// Instance path of the node's element
    pub fn path(&self) -> &'a str {
        match *self {
            Self::Element(elem) | Self::Attribute { element: elem, .. } => &elem.path,
        }
    }

    fn is_same(&self, other: &PathNode<'_>) -> bool {
        match (self, other) {
            (Self::Element(a), PathNode::Element(b)) => ptr::eq(*a, *b),
            (Self::Attribute { value: a, .. }, PathNode::Attribute { value: b, .. }) => {
                ptr::eq(*a, *b)
            }
            _ => false,
        }
    }
}

/// A compiled selector or field path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityPath {
    /// The source expression
    pub xpath: String,
    branches: Vec<Vec<PathStep>>,
}

impl IdentityPath {
    /// Compile a selector path
    pub fn parse_selector(xpath: &str, namespaces: &NamespaceContext) -> Result<Self> {
        Self::parse(xpath, namespaces, &SELECTOR_PATTERN, "selector")
    }

    /// Compile a field path
    pub fn parse_field(xpath: &str, namespaces: &NamespaceContext) -> Result<Self> {
        Self::parse(xpath, namespaces, &FIELD_PATTERN, "field")
    }

    fn parse(
        xpath: &str,
        namespaces: &NamespaceContext,
        pattern: &Regex,
        label: &str,
    ) -> Result<Self> {
        let compact: String = xpath.chars().filter(|c| !c.is_whitespace()).collect();
        if !pattern.is_match(&compact) {
            return Err(ParseError::new(format!(
                "invalid XPath expression for an identity {}: '{}'",
                label, xpath
            ))
            .into());
        }

        let mut branches = Vec::new();
        for branch in compact.split('|') {
            let mut steps = Vec::new();
            let rest = match branch.strip_prefix(".//") {
                Some(rest) => {
                    steps.push(PathStep::DescendantOrSelf);
                    rest
                }
                None => branch,
            };
            for token in rest.split('/') {
                steps.push(PathStep::parse(token, namespaces)?);
            }
            branches.push(steps);
        }

        Ok(Self {
            xpath: xpath.to_string(),
            branches,
        })
    }

    /// The alternatives of the union
    pub fn branches(&self) -> &[Vec<PathStep>] {
        &self.branches
    }

    /// Check if any branch ends on the attribute axis
    pub fn selects_attributes(&self) -> bool {
        self.branches
            .iter()
            .any(|steps| matches!(steps.last(), Some(PathStep::Attribute(_))))
    }

    /// Evaluate the path from a context element, in union order without duplicates
    pub fn select<'a>(&self, context: &'a DecodedElement) -> Vec<PathNode<'a>> {
        let mut result: Vec<PathNode<'a>> = Vec::new();
        for steps in &self.branches {
            for node in select_branch(steps, context) {
                if !result.iter().any(|n| n.is_same(&node)) {
                    result.push(node);
                }
            }
        }
        result
    }
}

fn select_branch<'a>(steps: &[PathStep], context: &'a DecodedElement) -> Vec<PathNode<'a>> {
    let mut elements: Vec<&'a DecodedElement> = vec![context];
    for step in steps {
        elements = match step {
            PathStep::SelfNode => elements,
            PathStep::DescendantOrSelf => elements.into_iter().flat_map(|e| e.iter()).collect(),
            PathStep::Child(test) => elements
                .into_iter()
                .flat_map(|e| e.children.iter().filter(move |c| test.matches(&c.tag)))
                .collect(),
            PathStep::Attribute(test) => {
                return elements
                    .into_iter()
                    .flat_map(|element| {
                        element
                            .iter_attributes()
                            .filter(move |(name, _)| test.matches(name))
                            .map(move |(name, value)| PathNode::Attribute { element, name, value })
                    })
                    .collect();
            }
        };
    }
    elements.into_iter().map(PathNode::Element).collect()
}

/// Check if a string is a valid NCName (non-colonized name)
///
/// NCName is defined in XML Namespaces as a Name that does not contain colons.
pub fn is_ncname(s: &str) -> bool {
    let mut chars = s.chars();

    // First character must be a letter or underscore
    match chars.next() {
        Some(c) if is_ncname_start_char(c) => {}
        _ => return false,
    }

    chars.all(is_ncname_char)
}

fn is_ncname_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Check if a character is valid in an NCName (not at start)
pub fn is_ncname_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}
