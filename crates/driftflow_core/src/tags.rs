// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tag sets describing the data kind carried by a port.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label that matches any tag set during compatibility negotiation.
pub const WILDCARD: &str = "any";

/// An unordered collection of string labels describing a data kind.
///
/// Tag sets are the currency of connection negotiation: an input port
/// declares the tags it requires, an output port declares the tags it
/// offers, and [`TagSet::compatible`] gates every connection attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    labels: IndexSet<String>,
}

impl TagSet {
    /// Create an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tag set with a single label.
    pub fn single(label: impl Into<String>) -> Self {
        let mut labels = IndexSet::new();
        labels.insert(label.into());
        Self { labels }
    }

    /// Create the wildcard tag set (matches anything).
    pub fn any() -> Self {
        Self::single(WILDCARD)
    }

    /// Add a label.
    pub fn insert(&mut self, label: impl Into<String>) {
        self.labels.insert(label.into());
    }

    /// Whether the set contains the given label.
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Whether the set carries the wildcard label.
    pub fn has_wildcard(&self) -> bool {
        self.contains(WILDCARD)
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Iterate over the labels.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Whether the two sets share at least one label.
    pub fn intersects(&self, other: &TagSet) -> bool {
        // iterate the smaller set
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().any(|label| large.contains(label))
    }

    /// Compatibility gate evaluated once per connection attempt.
    ///
    /// True iff `offered ∪ {any}` intersects `required`, or symmetrically
    /// `required ∪ {any}` intersects `offered` (either side may declare it
    /// accepts anything). Equivalently: either side carries the wildcard, or
    /// the two sets intersect. An empty `required` set never matches unless
    /// `offered` carries the wildcard.
    pub fn compatible(required: &TagSet, offered: &TagSet) -> bool {
        required.has_wildcard() || offered.has_wildcard() || required.intersects(offered)
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in &self.labels {
            write!(f, "#{label}")?;
        }
        Ok(())
    }
}
