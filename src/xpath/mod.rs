//! XPath Support for XML Schema
//!
//! Identity constraints use a restricted XPath subset for their selector and
//! field paths. This module parses those paths and evaluates them over a
//! decoded element tree.

mod selectors;

pub use selectors::{is_ncname, is_ncname_char, IdentityPath, NameTest, PathNode, PathStep};
