//! XSD Wildcard validators
//!
//! This module implements wildcards for XSD element and attribute content:
//! - xs:any - allows any element from specified namespaces
//! - xs:anyAttribute - allows any attribute from specified namespaces
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Wildcards

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::namespaces::QName;

use super::base::GroupId;
use super::particles::{Occurs, Particle};

/// Process contents mode for wildcards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessContents {
    /// Validate strictly - element/attribute must be declared
    #[default]
    Strict,
    /// Validate if declaration found, otherwise accept
    Lax,
    /// Skip validation entirely
    Skip,
}

impl ProcessContents {
    /// Parse from string value
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "strict" => Some(Self::Strict),
            "lax" => Some(Self::Lax),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProcessContents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Lax => write!(f, "lax"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// Namespace constraint for wildcards
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NamespaceConstraint {
    /// Any namespace is allowed (##any)
    #[default]
    Any,
    /// Any namespace except target namespace and no namespace (##other)
    Other {
        /// The target namespace to exclude
        target_namespace: Option<String>,
    },
    /// Specific set of allowed namespaces, `""` stands for no namespace
    Enumeration(BTreeSet<String>),
    /// XSD 1.1: Set of disallowed namespaces (notNamespace)
    Not(BTreeSet<String>),
}

impl NamespaceConstraint {
    /// Create from namespace attribute value
    pub fn from_namespace_attr(
        value: &str,
        target_namespace: Option<&str>,
    ) -> Result<Self, ParseError> {
        match value.trim() {
            "##any" => Ok(Self::Any),
            "##other" => Ok(Self::Other {
                target_namespace: target_namespace.map(String::from),
            }),
            value => Ok(Self::Enumeration(Self::parse_list(
                value,
                target_namespace,
                "namespace",
            )?)),
        }
    }

    /// Create from notNamespace attribute (XSD 1.1)
    pub fn from_not_namespace_attr(
        value: &str,
        target_namespace: Option<&str>,
    ) -> Result<Self, ParseError> {
        Ok(Self::Not(Self::parse_list(value, target_namespace, "notNamespace")?))
    }

    fn parse_list(
        value: &str,
        target_namespace: Option<&str>,
        attribute: &str,
    ) -> Result<BTreeSet<String>, ParseError> {
        let mut namespaces = BTreeSet::new();
        for ns in value.split_whitespace() {
            match ns {
                "##local" => {
                    namespaces.insert(String::new());
                }
                "##targetNamespace" => {
                    namespaces.insert(target_namespace.unwrap_or_default().to_string());
                }
                s if s.starts_with("##") => {
                    return Err(ParseError::new(format!(
                        "wrong value '{}' in '{}' attribute",
                        s, attribute
                    )));
                }
                uri => {
                    namespaces.insert(uri.to_string());
                }
            }
        }
        Ok(namespaces)
    }

    /// Check if a namespace is allowed by this constraint
    pub fn is_allowed(&self, namespace: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Other { target_namespace } => {
                !namespace.is_empty() && target_namespace.as_deref() != Some(namespace)
            }
            Self::Enumeration(set) => set.contains(namespace),
            Self::Not(set) => !set.contains(namespace),
        }
    }

    /// Compact rendering used in diagnostics
    pub fn label(&self) -> String {
        match self {
            Self::Any => "##any".to_string(),
            Self::Other { .. } => "##other".to_string(),
            Self::Enumeration(set) => set
                .iter()
                .map(|ns| if ns.is_empty() { "##local" } else { ns.as_str() })
                .collect::<Vec<_>>()
                .join(" "),
            Self::Not(set) => format!(
                "not {}",
                set.iter()
                    .map(|ns| if ns.is_empty() { "##local" } else { ns.as_str() })
                    .collect::<Vec<_>>()
                    .join(" ")
            ),
        }
    }
}

/// XSD element wildcard (xs:any)
#[derive(Debug, Clone)]
pub struct XsdAnyElement {
    /// Namespace constraint
    pub namespace: NamespaceConstraint,
    /// Process contents mode
    pub process_contents: ProcessContents,
    /// Occurrence constraints
    pub occurs: Occurs,
    /// Group owning this particle
    pub(crate) parent: Option<GroupId>,
}

impl XsdAnyElement {
    /// Create a wildcard accepting any namespace
    pub fn new(process_contents: ProcessContents) -> Self {
        Self {
            namespace: NamespaceConstraint::Any,
            process_contents,
            occurs: Occurs::once(),
            parent: None,
        }
    }

    /// Set the namespace constraint
    pub fn with_namespace(mut self, namespace: NamespaceConstraint) -> Self {
        self.namespace = namespace;
        self
    }

    /// Set the occurrence bounds
    pub fn with_occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }

    /// Check if an element name is admitted by the wildcard
    pub fn is_matching(&self, name: &QName) -> bool {
        self.namespace.is_allowed(name.namespace_uri())
    }

    /// Tag rendered in the expected list of a diagnostic
    ///
    /// Lax and skip wildcards are not reported.
    pub fn expected_tag(&self) -> Option<String> {
        match self.process_contents {
            ProcessContents::Strict => {
                Some(format!("from '{}' namespace/s", self.namespace.label()))
            }
            _ => None,
        }
    }
}

impl Particle for XsdAnyElement {
    fn occurs(&self) -> Occurs {
        self.occurs
    }
}

/// XSD attribute wildcard (xs:anyAttribute)
#[derive(Debug, Clone, Default)]
pub struct XsdAnyAttribute {
    /// Namespace constraint
    pub namespace: NamespaceConstraint,
    /// Process contents mode
    pub process_contents: ProcessContents,
}

impl XsdAnyAttribute {
    /// Create an attribute wildcard
    pub fn new(namespace: NamespaceConstraint, process_contents: ProcessContents) -> Self {
        Self {
            namespace,
            process_contents,
        }
    }

    /// Check if an attribute name is admitted by the wildcard
    pub fn is_matching(&self, name: &QName) -> bool {
        self.namespace.is_allowed(name.namespace_uri())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_contents_from_str() {
        assert_eq!(ProcessContents::from_str("lax"), Some(ProcessContents::Lax));
        assert_eq!(ProcessContents::from_str("loose"), None);
        assert_eq!(ProcessContents::Skip.to_string(), "skip");
    }

    #[test]
    fn test_namespace_any() {
        let constraint = NamespaceConstraint::from_namespace_attr("##any", None).unwrap();
        assert!(constraint.is_allowed("http://example.com"));
        assert!(constraint.is_allowed(""));
    }

    #[test]
    fn test_namespace_other() {
        let constraint =
            NamespaceConstraint::from_namespace_attr("##other", Some("http://tns")).unwrap();
        assert!(!constraint.is_allowed("http://tns"));
        assert!(!constraint.is_allowed(""));
        assert!(constraint.is_allowed("http://other"));
    }

    #[test]
    fn test_namespace_enumeration() {
        let constraint = NamespaceConstraint::from_namespace_attr(
            "##local ##targetNamespace http://a",
            Some("http://tns"),
        )
        .unwrap();
        assert!(constraint.is_allowed(""));
        assert!(constraint.is_allowed("http://tns"));
        assert!(constraint.is_allowed("http://a"));
        assert!(!constraint.is_allowed("http://b"));
        assert_eq!(constraint.label(), "##local http://a http://tns");
    }

    #[test]
    fn test_namespace_wrong_value() {
        assert!(NamespaceConstraint::from_namespace_attr("##foo", None).is_err());
        assert!(NamespaceConstraint::from_not_namespace_attr("##bar", None).is_err());
    }

    #[test]
    fn test_not_namespace() {
        let constraint = NamespaceConstraint::from_not_namespace_attr("http://x", None).unwrap();
        assert!(!constraint.is_allowed("http://x"));
        assert!(constraint.is_allowed("http://y"));
    }

    #[test]
    fn test_any_element_matching() {
        let any = XsdAnyElement::new(ProcessContents::Lax).with_namespace(
            NamespaceConstraint::from_namespace_attr("urn:a", None).unwrap(),
        );
        assert!(any.is_matching(&QName::namespaced("urn:a", "x")));
        assert!(!any.is_matching(&QName::local("x")));
        assert_eq!(any.expected_tag(), None);
    }

    #[test]
    fn test_strict_wildcard_expected_tag() {
        let any = XsdAnyElement::new(ProcessContents::Strict).with_occurs(Occurs::zero_or_more());
        assert_eq!(any.expected_tag().as_deref(), Some("from '##any' namespace/s"));
        assert!(any.is_emptiable());
    }

    #[test]
    fn test_any_attribute() {
        let any = XsdAnyAttribute::new(
            NamespaceConstraint::Other { target_namespace: None },
            ProcessContents::Skip,
        );
        assert!(any.is_matching(&QName::namespaced("urn:x", "a")));
        assert!(!any.is_matching(&QName::local("a")));
    }
}
