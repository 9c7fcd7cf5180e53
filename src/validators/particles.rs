//! XSD Particle Schema Components
//!
//! This module implements the particle model for XSD elements, groups, and wildcards.
//! Particles define occurrence constraints (minOccurs, maxOccurs) for schema components.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#p

use crate::error::{ParseError, Result};

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max_occurs means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Create occurrence bounds checking that max is not lower than min
    pub fn checked(min: u32, max: Option<u32>) -> Result<Self> {
        match max {
            Some(max) if max < min => Err(ParseError::new(format!(
                "maxOccurs ({}) must be 'unbounded' or not lower than minOccurs ({})",
                max, min
            ))
            .into()),
            _ => Ok(Self { min, max }),
        }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// One or more (1, unbounded)
    pub fn one_or_more() -> Self {
        Self { min: 1, max: None }
    }

    /// Empty (0, 0)
    pub fn empty() -> Self {
        Self { min: 0, max: Some(0) }
    }

    /// Check if this particle can be empty (minOccurs == 0)
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if this particle is empty (maxOccurs == 0)
    pub fn is_empty(&self) -> bool {
        self.max == Some(0)
    }

    /// Check if particle has maxOccurs == 1
    pub fn is_single(&self) -> bool {
        self.max == Some(1)
    }

    /// Check if particle can have multiple occurrences
    pub fn is_multiple(&self) -> bool {
        !self.is_empty() && !self.is_single()
    }

    /// Check if minOccurs != maxOccurs
    pub fn is_ambiguous(&self) -> bool {
        match self.max {
            Some(max) => self.min != max,
            None => true,
        }
    }

    /// Check if minOccurs == maxOccurs
    pub fn is_univocal(&self) -> bool {
        !self.is_ambiguous()
    }

    /// Check if occurrence count is under the minimum
    pub fn is_missing(&self, count: u32) -> bool {
        count < self.min
    }

    /// Check if occurrence count is at or over the maximum
    pub fn is_over(&self, count: u32) -> bool {
        match self.max {
            Some(max) => count >= max,
            None => false,
        }
    }

    /// Check if occurrence count exceeds the maximum
    pub fn is_exceeded(&self, count: u32) -> bool {
        match self.max {
            Some(max) => count > max,
            None => false,
        }
    }

    /// Check if these bounds only narrow the `base` bounds
    ///
    /// A lower minimum or a higher (or unbounded) maximum widens the base.
    pub fn has_occurs_restriction(&self, base: &Occurs) -> bool {
        if self.min < base.min {
            return false;
        }

        match (base.max, self.max) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(base_max), Some(max)) => max <= base_max,
        }
    }

    /// Fold these bounds with an enclosing particle's bounds
    pub fn multiply(&self, outer: Occurs) -> Occurs {
        let mut calc = OccursCalculator::from(*self);
        calc.multiply(outer);
        calc.occurs()
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

impl std::fmt::Display for Occurs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}, {}]", self.min, max),
            None => write!(f, "[{}, None]", self.min),
        }
    }
}

/// Trait for XSD components that have particle semantics
pub trait Particle {
    /// Get the occurrence bounds
    fn occurs(&self) -> Occurs;

    /// Get minimum occurrences
    fn min_occurs(&self) -> u32 {
        self.occurs().min
    }

    /// Get maximum occurrences (None = unbounded)
    fn max_occurs(&self) -> Option<u32> {
        self.occurs().max
    }

    /// Check if this particle can be empty
    fn is_emptiable(&self) -> bool {
        self.occurs().is_emptiable()
    }

    /// Check if this particle is empty (max = 0)
    fn is_empty(&self) -> bool {
        self.occurs().is_empty()
    }

    /// Check if this particle is single occurrence
    fn is_single(&self) -> bool {
        self.occurs().is_single()
    }

    /// Check if this particle can have multiple occurrences
    fn is_multiple(&self) -> bool {
        self.occurs().is_multiple()
    }

    /// Check if minOccurs != maxOccurs
    fn is_ambiguous(&self) -> bool {
        self.occurs().is_ambiguous()
    }

    /// Check if occurrence count is at or over the maximum
    fn is_over(&self, count: u32) -> bool {
        self.occurs().is_over(count)
    }
}

/// Helper for calculating combined min/max occurs for model groups
#[derive(Debug, Clone, Copy, Default)]
pub struct OccursCalculator {
    /// Calculated minimum occurrences
    pub min_occurs: u32,
    /// Calculated maximum occurrences (None = unbounded)
    pub max_occurs: Option<u32>,
}

impl OccursCalculator {
    /// Create a new calculator initialized to (0, 0)
    pub fn new() -> Self {
        Self {
            min_occurs: 0,
            max_occurs: Some(0),
        }
    }

    /// Get as Occurs
    pub fn occurs(&self) -> Occurs {
        Occurs::new(self.min_occurs, self.max_occurs)
    }

    /// Add another particle's occurs (for sequence)
    pub fn add(&mut self, other: Occurs) {
        self.min_occurs = self.min_occurs.saturating_add(other.min);
        match (self.max_occurs, other.max) {
            (Some(a), Some(b)) => self.max_occurs = Some(a.saturating_add(b)),
            _ => self.max_occurs = None,
        }
    }

    /// Multiply by another particle's occurs (for nested groups)
    pub fn multiply(&mut self, other: Occurs) {
        self.min_occurs = self.min_occurs.saturating_mul(other.min);
        match (self.max_occurs, other.max) {
            (None, Some(0)) => self.max_occurs = Some(0),
            (Some(0), _) => self.max_occurs = Some(0),
            (Some(_), None) => self.max_occurs = None,
            (None, _) => {}
            (Some(a), Some(b)) => self.max_occurs = Some(a.saturating_mul(b)),
        }
    }

    /// Take the bounds of an alternative (for choice)
    pub fn max_with(&mut self, other: Occurs) {
        self.min_occurs = self.min_occurs.min(other.min);
        match (self.max_occurs, other.max) {
            (None, _) | (_, None) => self.max_occurs = None,
            (Some(a), Some(b)) => self.max_occurs = Some(a.max(b)),
        }
    }
}

impl From<Occurs> for OccursCalculator {
    fn from(occurs: Occurs) -> Self {
        Self {
            min_occurs: occurs.min,
            max_occurs: occurs.max,
        }
    }
}
