// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node type descriptors and the registry mapping type ids to them.

use crate::node::{Node, NodeKind};
use crate::port::PortSpec;
use crate::update::{Processor, Updater};
use indexmap::IndexMap;
use std::sync::Arc;

/// Factory producing a fresh processor behavior per node instance.
pub type ProcessorFactory = Arc<dyn Fn() -> Box<dyn Processor>>;

/// Static descriptor a node is constructed from: port layout, kind, update
/// strategy and processor behavior.
#[derive(Clone)]
pub struct NodeType {
    /// Unique type identifier (registry key).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Classification consumed by the pipeline.
    pub kind: NodeKind,
    /// Input port layout.
    pub inputs: Vec<PortSpec>,
    /// Output port layout.
    pub outputs: Vec<PortSpec>,
    pub(crate) updater: Option<Arc<dyn Updater>>,
    processor: Option<ProcessorFactory>,
}

impl NodeType {
    /// Start a descriptor for a computation node.
    pub fn filter(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::Filter,
            inputs: Vec::new(),
            outputs: Vec::new(),
            updater: None,
            processor: None,
        }
    }

    /// Start a descriptor for a persistent data-holder node.
    pub fn container(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::Container,
            inputs: Vec::new(),
            outputs: Vec::new(),
            updater: None,
            processor: None,
        }
    }

    /// Append an input port to the layout.
    pub fn with_input(mut self, spec: PortSpec) -> Self {
        self.inputs.push(spec);
        self
    }

    /// Append an output port to the layout.
    pub fn with_output(mut self, spec: PortSpec) -> Self {
        self.outputs.push(spec);
        self
    }

    /// Install the update strategy dispatched by `Pipeline::update`.
    pub fn with_updater(mut self, updater: Arc<dyn Updater>) -> Self {
        self.updater = Some(updater);
        self
    }

    /// Install the factory producing this type's processor behavior.
    pub fn with_processor<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Processor> + 'static,
    {
        self.processor = Some(Arc::new(factory));
        self
    }

    pub(crate) fn new_processor(&self) -> Option<Box<dyn Processor>> {
        self.processor.as_ref().map(|f| f())
    }
}

impl std::fmt::Debug for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeType")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("has_updater", &self.updater.is_some())
            .field("has_processor", &self.processor.is_some())
            .finish()
    }
}

/// Registry of available node types, keyed by identifier.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    types: IndexMap<String, NodeType>,
}

impl NodeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type, replacing any previous entry with the same id.
    pub fn register(&mut self, node_type: NodeType) {
        self.types.insert(node_type.id.clone(), node_type);
    }

    /// Get a node type by ID.
    pub fn get(&self, id: &str) -> Option<&NodeType> {
        self.types.get(id)
    }

    /// Get all registered types.
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }

    /// Create a node instance from a type ID.
    pub fn instantiate(&self, type_id: &str) -> Option<Node> {
        self.get(type_id).map(Node::new)
    }
}
