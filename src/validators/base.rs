//! Base validator infrastructure
//!
//! Handles into the schema component arena, the validation mode and the
//! XSD version switch shared by every validator.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position of the component in its arena
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $label, self.0)
            }
        }
    };
}

arena_id!(
    /// Handle of an element declaration (one per particle use)
    ElementId, "element"
);
arena_id!(
    /// Handle of a model group
    GroupId, "group"
);
arena_id!(
    /// Handle of an element wildcard (xs:any)
    WildcardId, "any"
);
arena_id!(
    /// Handle of a simple or complex type
    TypeId, "type"
);
arena_id!(
    /// Handle of an identity constraint
    IdentityId, "identity"
);

/// Validation mode for XSD validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Strict validation - the first error aborts the call
    #[default]
    Strict,
    /// Lax validation - errors are collected
    Lax,
    /// Skip validation - no structural or identity checks
    Skip,
}

impl ValidationMode {
    /// Parse validation mode from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(ValidationMode::Strict),
            "lax" => Ok(ValidationMode::Lax),
            "skip" => Ok(ValidationMode::Skip),
            _ => Err(Error::Value(format!(
                "Invalid validation mode: '{}'. Must be 'strict', 'lax', or 'skip'",
                s
            ))),
        }
    }

    /// Get the mode as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::Strict => "strict",
            ValidationMode::Lax => "lax",
            ValidationMode::Skip => "skip",
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// XSD version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum XsdVersion {
    /// XSD 1.0
    #[default]
    #[serde(rename = "1.0")]
    Xsd10,
    /// XSD 1.1
    #[serde(rename = "1.1")]
    Xsd11,
}

impl XsdVersion {
    /// Parse from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "1.0" => Ok(XsdVersion::Xsd10),
            "1.1" => Ok(XsdVersion::Xsd11),
            _ => Err(Error::Value(format!(
                "Invalid XSD version: '{}'. Must be '1.0' or '1.1'",
                s
            ))),
        }
    }

    /// Get as string
    pub fn as_str(&self) -> &'static str {
        match self {
            XsdVersion::Xsd10 => "1.0",
            XsdVersion::Xsd11 => "1.1",
        }
    }
}

impl fmt::Display for XsdVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
