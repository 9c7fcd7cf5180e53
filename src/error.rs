//! Error types for xmlschema-validator
//!
//! Fatal errors abort a call and come back as [`Error`]. Recoverable
//! problems found in an instance are [`ValidationError`] values that are
//! either raised (strict), collected (lax) or dropped (skip).

use std::fmt;
use thiserror::Error;

use crate::validators::base::ElementId;
use crate::validators::exceptions::{CircularityError, ModelDepthError};

/// Result type alias using the crate Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for schema building and validation calls
#[derive(Error, Debug)]
pub enum Error {
    /// Instance validation error (raised in strict mode)
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Schema building error
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Content model nested too deeply
    #[error("{0}")]
    ModelDepth(#[from] ModelDepthError),

    /// Circular definition among schema components
    #[error("{0}")]
    Circularity(#[from] CircularityError),

    /// Type error in schema or data
    #[error("type error: {0}")]
    Type(String),

    /// Value error, also used for misuse of a component API
    #[error("value error: {0}")]
    Value(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),
}

/// Category of a validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Unexpected, missing or misplaced child element
    Children,
    /// Duplicated key value or dangling key reference
    Identity,
    /// Leaf value conversion failure (text to value)
    Decode,
    /// Leaf value conversion failure (value to text)
    Encode,
    /// Text or nil content not admitted by the type
    Content,
    /// Missing, unknown or invalid attribute
    Attribute,
    /// Unknown element or type
    Type,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Children => "children",
            Self::Identity => "identity",
            Self::Decode => "decode",
            Self::Encode => "encode",
            Self::Content => "content",
            Self::Attribute => "attribute",
            Self::Type => "type",
        };
        f.write_str(s)
    }
}

/// Severity of a validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Makes the instance invalid
    #[default]
    Error,
    /// Reported but the instance stays valid; never raised in strict mode
    Warning,
}

/// XML Schema validation error with context
///
/// `reason` and `path` are the stable public contract: downstream consumers
/// classify errors from these two fields alone.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidationError {
    /// Error category
    pub kind: ErrorKind,
    /// Human readable reason
    pub reason: String,
    /// XPath-like location of the offending instance node
    pub path: String,
    /// Element declaration the instance node was validated against
    #[serde(skip)]
    pub element_ref: Option<ElementId>,
    /// Error severity
    pub severity: Severity,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            path: String::new(),
            element_ref: None,
            severity: Severity::Error,
        }
    }

    /// Set the path where validation failed
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the element declaration
    pub fn with_element(mut self, element: ElementId) -> Self {
        self.element_ref = Some(element);
        self
    }

    /// Set the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Check if this is an error-severity diagnostic
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.severity == Severity::Warning {
            write!(f, "warning: ")?;
        }
        write!(f, "{}", self.reason)?;

        if !self.path.is_empty() {
            write!(f, "\n\nPath: {}", self.path)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// XML Schema building error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Component that caused the error
    pub component: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            component: None,
        }
    }

    /// Set the offending component
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref component) = self.component {
            write!(f, "\n\nComponent: {}", component)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}
