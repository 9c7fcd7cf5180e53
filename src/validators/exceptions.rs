//! XSD Validation Exceptions
//!
//! Builders for the recoverable diagnostics produced while validating an
//! instance, plus the fatal errors raised by schema components.
//! Every builder converts into the public [`ValidationError`].

use std::fmt;

use crate::error::{ErrorKind, ValidationError};

use super::base::ElementId;
use super::particles::Occurs;

/// A particle as it appears in a children diagnostic
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleInfo {
    /// Display name, like `'A'` or `sequence`
    pub name: String,
    /// Occurrence bounds of the particle
    pub occurs: Occurs,
}

/// Error when a child element fails validation
#[derive(Debug, Clone)]
pub struct ChildrenValidationError {
    /// Tag of the element whose content is checked
    pub parent_tag: String,
    /// Index of the invalid child
    pub index: usize,
    /// The invalid tag, `None` when the content is incomplete
    pub invalid_tag: Option<String>,
    /// The particle that generated the error
    pub particle: Option<ParticleInfo>,
    /// Number of occurrences of the particle
    pub occurs: u32,
    /// Expected tags, `None` if no expectation is reported
    pub expected_tags: Option<Vec<String>>,
    path: String,
    element_ref: Option<ElementId>,
}

impl ChildrenValidationError {
    /// Create a new children validation error for unexpected child
    pub fn unexpected_child(
        parent_tag: impl Into<String>,
        child_tag: impl Into<String>,
        index: usize,
    ) -> Self {
        Self {
            parent_tag: parent_tag.into(),
            index,
            invalid_tag: Some(child_tag.into()),
            particle: None,
            occurs: 0,
            expected_tags: None,
            path: String::new(),
            element_ref: None,
        }
    }

    /// Create a new children validation error for incomplete content
    pub fn incomplete_content(parent_tag: impl Into<String>, index: usize) -> Self {
        Self {
            parent_tag: parent_tag.into(),
            index,
            invalid_tag: None,
            particle: None,
            occurs: 0,
            expected_tags: None,
            path: String::new(),
            element_ref: None,
        }
    }

    /// Set the particle and its occurrences
    pub fn with_particle(mut self, particle: ParticleInfo, occurs: u32) -> Self {
        self.particle = Some(particle);
        self.occurs = occurs;
        self
    }

    /// Set expected tags
    pub fn with_expected_tags(mut self, tags: Vec<String>) -> Self {
        self.expected_tags = Some(tags);
        self
    }

    /// Set the path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the element declaration whose content failed
    pub fn with_element(mut self, element: ElementId) -> Self {
        self.element_ref = Some(element);
        self
    }

    /// The reason text of the diagnostic
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ChildrenValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.invalid_tag {
            None => write!(f, "The content of element '{}' is not complete.", self.parent_tag)?,
            Some(ref tag) => write!(
                f,
                "Unexpected child with tag '{}' at position {}.",
                tag,
                self.index + 1
            )?,
        }

        if let Some(ref particle) = self.particle {
            if self.occurs > 0 && particle.occurs.is_missing(self.occurs) {
                write!(
                    f,
                    " The particle {} occurs {} times but the minimum is {}.",
                    particle.name, self.occurs, particle.occurs.min
                )?;
            } else if let Some(max) = particle.occurs.max {
                if particle.occurs.is_over(self.occurs) {
                    write!(
                        f,
                        " The particle {} occurs {} times but the maximum is {}.",
                        particle.name, self.occurs, max
                    )?;
                }
            }
        }

        match self.expected_tags.as_deref() {
            None | Some([]) => {}
            Some([tag]) => write!(f, " Tag {} expected.", tag)?,
            Some(tags) => write!(f, " Tag ({}) expected.", tags.join(" | "))?,
        }

        Ok(())
    }
}

impl From<ChildrenValidationError> for ValidationError {
    fn from(err: ChildrenValidationError) -> Self {
        let mut error = ValidationError::new(ErrorKind::Children, err.reason()).with_path(&err.path);
        error.element_ref = err.element_ref;
        error
    }
}

/// Decode error when text cannot be decoded to a value
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError {
    /// The value that failed to decode
    pub value: String,
    /// Why decoding failed
    pub reason: String,
    /// The target type
    pub target_type: Option<String>,
}

impl DecodeError {
    /// Create a new decode error
    pub fn new(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            reason: reason.into(),
            target_type: None,
        }
    }

    /// Set the target type
    pub fn with_target_type(mut self, type_name: impl Into<String>) -> Self {
        self.target_type = Some(type_name.into());
        self
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed decoding '{}'", self.value)?;
        if let Some(ref target) = self.target_type {
            write!(f, " with {}", target)?;
        }
        write!(f, ": {}", self.reason)
    }
}

impl std::error::Error for DecodeError {}

impl From<DecodeError> for ValidationError {
    fn from(err: DecodeError) -> Self {
        ValidationError::new(ErrorKind::Decode, err.to_string())
    }
}

/// Encode error when a value cannot be encoded to text
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeError {
    /// The value that failed to encode
    pub value: String,
    /// Why encoding failed
    pub reason: String,
}

impl EncodeError {
    /// Create a new encode error
    pub fn new(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed encoding '{}': {}", self.value, self.reason)
    }
}

impl std::error::Error for EncodeError {}

impl From<EncodeError> for ValidationError {
    fn from(err: EncodeError) -> Self {
        ValidationError::new(ErrorKind::Encode, err.to_string())
    }
}

/// Duplicated value or dangling reference of an identity constraint
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityError {
    /// The error message
    pub message: String,
    /// Path of the instance node that produced the value
    pub path: String,
}

impl IdentityError {
    /// Create a new identity error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: String::new(),
        }
    }

    /// Set the path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for IdentityError {}

impl From<IdentityError> for ValidationError {
    fn from(err: IdentityError) -> Self {
        ValidationError::new(ErrorKind::Identity, err.message).with_path(err.path)
    }
}

/// Error for circular definitions in schema
#[derive(Debug, Clone)]
pub struct CircularityError {
    /// The component type (group, complexType, ...)
    pub component_type: String,
    /// The component name
    pub component_name: String,
    /// The path of components in the cycle
    pub cycle_path: Vec<String>,
}

impl CircularityError {
    /// Create a new circularity error
    pub fn new(
        component_type: impl Into<String>,
        component_name: impl Into<String>,
    ) -> Self {
        Self {
            component_type: component_type.into(),
            component_name: component_name.into(),
            cycle_path: Vec::new(),
        }
    }

    /// Add to the cycle path
    pub fn with_cycle_path(mut self, path: Vec<String>) -> Self {
        self.cycle_path = path;
        self
    }
}

impl fmt::Display for CircularityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f, "Circular definition detected for xs:{} '{}'",
            self.component_type, self.component_name
        )?;
        if !self.cycle_path.is_empty() {
            write!(f, " (cycle: {})", self.cycle_path.join(" -> "))?;
        }
        Ok(())
    }
}

impl std::error::Error for CircularityError {}

/// Error when maximum model recursion depth is exceeded
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDepthError {
    /// The group where depth was exceeded
    pub group: Option<String>,
    /// The current depth
    pub depth: usize,
    /// The maximum allowed depth
    pub max_depth: usize,
}

impl ModelDepthError {
    /// Create a new model depth error
    pub fn new(depth: usize, max_depth: usize) -> Self {
        Self {
            group: None,
            depth,
            max_depth,
        }
    }

    /// Set the group
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

impl fmt::Display for ModelDepthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f, "maximum model recursion depth ({}) exceeded (at depth {})",
            self.max_depth, self.depth
        )?;
        if let Some(ref group) = self.group {
            write!(f, " while iterating {}", group)?;
        }
        Ok(())
    }
}

impl std::error::Error for ModelDepthError {}
