// SPDX-License-Identifier: MIT OR Apache-2.0
//! Text filters and their node type descriptors.

use crate::container::TextContainer;
use driftflow_core::{
    read_as, write_as, NodeRegistry, NodeType, PortSpec, ProcessContext, ProcessError, Processor,
    PullUpdater, TagSet,
};
use std::sync::Arc;

/// Register the text node types into a registry.
///
/// The append descriptor defaults to an empty line; re-register
/// [`append_type`] with a custom line to replace it.
pub fn register(registry: &mut NodeRegistry) {
    registry.register(buffer_type());
    registry.register(uppercase_type());
    registry.register(append_type(""));
}

/// Descriptor of the text data-holder node: one shared output exposing a
/// persistent [`TextContainer`].
pub fn buffer_type() -> NodeType {
    NodeType::container("text.buffer", "Text Buffer")
        .with_output(PortSpec::shared_output("out", TagSet::single("text")))
}

/// Descriptor of the upper-casing filter.
pub fn uppercase_type() -> NodeType {
    NodeType::filter("text.uppercase", "Upper Case")
        .with_input(PortSpec::reader("in", TagSet::single("text")).required())
        .with_output(PortSpec::output("out", TagSet::single("text")))
        .with_updater(Arc::new(PullUpdater))
        .with_processor(|| Box::new(UpperCaseFilter))
}

/// Descriptor of a filter appending a fixed line through a writer input.
pub fn append_type(line: impl Into<String>) -> NodeType {
    let line = line.into();
    NodeType::filter("text.append", "Append Line")
        .with_input(PortSpec::writer("write", TagSet::single("text")))
        .with_updater(Arc::new(PullUpdater))
        .with_processor(move || {
            Box::new(AppendFilter {
                line: line.clone(),
            })
        })
}

/// Upper-cases every line of the connected input into its own output
/// container.
pub struct UpperCaseFilter;

impl Processor for UpperCaseFilter {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessError> {
        let source = ctx.input(0)?;
        let target = ctx.output::<TextContainer>(0)?;

        let input = read_as::<TextContainer>(&source)
            .ok_or_else(|| ProcessError::Custom("input is not a text container".to_owned()))?;
        let mut output = write_as::<TextContainer>(&target)
            .ok_or_else(|| ProcessError::Custom("output is not a text container".to_owned()))?;

        output.clear();
        for line in input.lines() {
            output.push_line(line.to_uppercase());
        }
        tracing::debug!(lines = input.line_count(), "upper-cased text");
        Ok(())
    }
}

/// Appends a configured line to the container behind its writer input,
/// auto-creating a private container when nothing is connected.
pub struct AppendFilter {
    /// Line appended on every update.
    pub line: String,
}

impl Processor for AppendFilter {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessError> {
        let target = ctx.write_target::<TextContainer>(0)?;
        write_as::<TextContainer>(&target)
            .ok_or_else(|| ProcessError::Custom("write target is not a text container".to_owned()))?
            .push_line(self.line.clone());
        Ok(())
    }

    // writer-style filters work with or without a connection
    fn ready(&self, _node: &driftflow_core::Node) -> bool {
        true
    }
}
