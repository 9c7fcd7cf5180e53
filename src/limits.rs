//! Limits and constraints for XML Schema processing
//!
//! Both limits are hard stops: a violation aborts the current call with a
//! typed error instead of being collected as a validation error.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default maximum nesting of model groups in a content model
pub const MAX_MODEL_DEPTH: usize = 15;

/// Default maximum nesting of elements in an XML instance
pub const MAX_XML_DEPTH: usize = 9999;

/// Lowest admitted value for `max_model_depth`
const MIN_MODEL_DEPTH: usize = 5;

/// Resource limits configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum depth of nested model groups
    pub max_model_depth: usize,

    /// Maximum depth of nested XML elements
    pub max_xml_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_model_depth: MAX_MODEL_DEPTH,
            max_xml_depth: MAX_XML_DEPTH,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_model_depth: 10,
            max_xml_depth: 1000,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_model_depth: 30,
            max_xml_depth: 100_000,
        }
    }

    /// Set the maximum model depth, which can't be lower than 5
    pub fn with_max_model_depth(mut self, depth: usize) -> Result<Self> {
        if depth < MIN_MODEL_DEPTH {
            return Err(Error::Value(format!(
                "maximum model depth must be at least {}, got {}",
                MIN_MODEL_DEPTH, depth
            )));
        }
        self.max_model_depth = depth;
        Ok(self)
    }

    /// Set the maximum XML depth, which must be positive
    pub fn with_max_xml_depth(mut self, depth: usize) -> Result<Self> {
        if depth == 0 {
            return Err(Error::Value(
                "maximum XML depth must be a positive integer".to_string(),
            ));
        }
        self.max_xml_depth = depth;
        Ok(self)
    }

    /// Check if XML depth is within limits
    pub fn check_xml_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_xml_depth {
            Err(Error::LimitExceeded(format!(
                "XML depth {} exceeds maximum {}",
                depth, self.max_xml_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if a model depth is within limits
    pub fn is_model_depth_exceeded(&self, depth: usize) -> bool {
        depth > self.max_model_depth
    }
}
