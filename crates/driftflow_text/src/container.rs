// SPDX-License-Identifier: MIT OR Apache-2.0
//! Line-oriented text container.

use driftflow_core::{Container, TagSet};
use std::any::Any;

/// A buffer of text lines, the concrete resource behind text ports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextContainer {
    lines: Vec<String>,
}

impl TextContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container from an iterator of lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a line at the end of the buffer.
    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// The buffered lines in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Whether the buffer holds no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Container for TextContainer {
    fn tags(&self) -> TagSet {
        TagSet::single("text")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftflow_core::{read_as, share, write_as};

    #[test]
    fn test_line_buffer_basics() {
        let mut container = TextContainer::new();
        assert!(container.is_empty());
        container.push_line("alpha");
        container.push_line("beta");
        assert_eq!(container.line_count(), 2);
        assert_eq!(container.lines(), &["alpha".to_owned(), "beta".to_owned()]);
        container.clear();
        assert!(container.is_empty());
    }

    #[test]
    fn test_container_contract_downcasts() {
        let resource = share(TextContainer::from_lines(["x"]));
        assert_eq!(resource.borrow().tags(), TagSet::single("text"));
        write_as::<TextContainer>(&resource).unwrap().push_line("y");
        assert_eq!(read_as::<TextContainer>(&resource).unwrap().line_count(), 2);
    }
}
