//! XML Validation Infrastructure
//!
//! This module provides the validation context of a document pass: the
//! runtime options and the diagnostics collected according to the
//! validation mode.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ValidationError};

use super::base::ValidationMode;
use super::identities::IdentityOptions;

/// Options of a decoding or validation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Validation mode
    pub mode: ValidationMode,
    /// Levels below the root that are decoded and checked (None = unlimited)
    pub max_depth: Option<usize>,
    /// Identity engine options
    pub identities: IdentityOptions,
    /// Fill missing attributes and empty elements with their defaults
    pub use_defaults: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            mode: ValidationMode::Strict,
            max_depth: None,
            identities: IdentityOptions::default(),
            use_defaults: true,
        }
    }
}

impl DecodeOptions {
    /// Create options with the default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the validation mode
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set the identity engine options
    pub fn with_identities(mut self, identities: IdentityOptions) -> Self {
        self.identities = identities;
        self
    }

    /// Enable or disable defaults in the decoded output
    pub fn with_use_defaults(mut self, use_defaults: bool) -> Self {
        self.use_defaults = use_defaults;
        self
    }
}

/// Validation context for handling the validation process
///
/// Stores status-related fields that are updated during validation,
/// along with parameters and configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    /// Call options
    pub options: DecodeOptions,
    /// Collected validation errors
    pub errors: Vec<ValidationError>,
}

impl ValidationContext {
    /// Create a new validation context
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            errors: Vec::new(),
        }
    }

    /// Create a context with a specific mode and default options
    pub fn with_mode(mode: ValidationMode) -> Self {
        Self::new(DecodeOptions::default().with_mode(mode))
    }

    /// Current validation mode
    pub fn mode(&self) -> ValidationMode {
        self.options.mode
    }

    /// Check if structural and identity checks are disabled
    pub fn is_skip(&self) -> bool {
        self.options.mode == ValidationMode::Skip
    }

    /// Check if an element at `level` (root = 0) is beyond `max_depth`
    pub fn is_max_depth_exceeded(&self, level: usize) -> bool {
        self.options.max_depth.is_some_and(|max| level >= max)
    }

    /// Check if there are any error-severity diagnostics
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(ValidationError::is_error)
    }

    /// Get the error count
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Raise or collect an error based on validation mode
    ///
    /// Strict mode raises on errors and collects warnings, skip mode drops
    /// everything.
    pub fn validation_error(&mut self, error: impl Into<ValidationError>) -> Result<()> {
        let error = error.into();
        match self.options.mode {
            ValidationMode::Strict if error.is_error() => Err(Error::Validation(error)),
            ValidationMode::Skip => Ok(()),
            _ => {
                self.errors.push(error);
                Ok(())
            }
        }
    }

    /// Take the collected errors, leaving the context empty
    pub fn take_errors(&mut self) -> Vec<ValidationError> {
        std::mem::take(&mut self.errors)
    }
}
