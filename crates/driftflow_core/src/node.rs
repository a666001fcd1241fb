// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions and incremental adjacency maintenance.

use crate::port::{InputPort, InputRef, OutputPort, OutputRef};
use crate::registry::NodeType;
use crate::update::{Processor, Updater};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Classification used by the pipeline when registering a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Pure computation, no persistent state of its own.
    Filter,
    /// Data holder persisting a resource across updates.
    Container,
}

/// A unit of computation or persistent state with a fixed set of tagged
/// ports.
///
/// Port count, names and tags come from the [`NodeType`] descriptor and
/// never change after construction. The predecessor/successor sets are
/// derived caches over the per-port connection state, refreshed by the
/// `*_connected`/`*_disconnected` notifications the pipeline fires on every
/// connection change.
pub struct Node {
    id: NodeId,
    type_id: String,
    kind: NodeKind,
    inputs: Vec<InputPort>,
    outputs: Vec<OutputPort>,
    predecessors: Vec<NodeId>,
    successors: Vec<NodeId>,
    pub(crate) updater: Option<Arc<dyn Updater>>,
    pub(crate) behavior: Option<Box<dyn Processor>>,
}

impl Node {
    /// Create a node instance from a type descriptor.
    ///
    /// Allocates exactly the ports the descriptor enumerates and installs
    /// the descriptor's updater strategy and processor behavior.
    pub fn new(node_type: &NodeType) -> Self {
        Self {
            id: NodeId::new(),
            type_id: node_type.id.clone(),
            kind: node_type.kind,
            inputs: node_type.inputs.iter().cloned().map(InputPort::new).collect(),
            outputs: node_type.outputs.iter().cloned().map(OutputPort::new).collect(),
            predecessors: Vec::new(),
            successors: Vec::new(),
            updater: node_type.updater.clone(),
            behavior: node_type.new_processor(),
        }
    }

    /// Unique instance ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// ID of the node type this instance was created from.
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// Classification consumed by the pipeline.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Input ports in descriptor order.
    pub fn inputs(&self) -> &[InputPort] {
        &self.inputs
    }

    /// Output ports in descriptor order.
    pub fn outputs(&self) -> &[OutputPort] {
        &self.outputs
    }

    /// Input port by index.
    ///
    /// # Panics
    /// Out-of-range indices are a wiring bug in the caller, not user input.
    pub fn input(&self, index: usize) -> &InputPort {
        match self.inputs.get(index) {
            Some(port) => port,
            None => panic!(
                "node type `{}` has no input port at index {index}",
                self.type_id
            ),
        }
    }

    /// Output port by index.
    ///
    /// # Panics
    /// Out-of-range indices are a wiring bug in the caller, not user input.
    pub fn output(&self, index: usize) -> &OutputPort {
        match self.outputs.get(index) {
            Some(port) => port,
            None => panic!(
                "node type `{}` has no output port at index {index}",
                self.type_id
            ),
        }
    }

    pub(crate) fn input_mut(&mut self, index: usize) -> &mut InputPort {
        if index >= self.inputs.len() {
            panic!(
                "node type `{}` has no input port at index {index}",
                self.type_id
            );
        }
        &mut self.inputs[index]
    }

    pub(crate) fn output_mut(&mut self, index: usize) -> &mut OutputPort {
        if index >= self.outputs.len() {
            panic!(
                "node type `{}` has no output port at index {index}",
                self.type_id
            );
        }
        &mut self.outputs[index]
    }

    #[cfg(test)]
    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    /// Index of the named input port, if present.
    pub fn find_input(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|p| p.name() == name)
    }

    /// Index of the named output port, if present.
    pub fn find_output(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|p| p.name() == name)
    }

    /// Handle to an input port of this node by index.
    ///
    /// # Panics
    /// When the index is out of range (port layout is static).
    pub fn input_ref(&self, index: usize) -> InputRef {
        let _ = self.input(index);
        InputRef {
            node: self.id,
            index,
        }
    }

    /// Handle to an output port of this node by index.
    ///
    /// # Panics
    /// When the index is out of range (port layout is static).
    pub fn output_ref(&self, index: usize) -> OutputRef {
        let _ = self.output(index);
        OutputRef {
            node: self.id,
            index,
        }
    }

    /// Distinct nodes currently feeding at least one of this node's inputs.
    pub fn predecessors(&self) -> &[NodeId] {
        &self.predecessors
    }

    /// Distinct nodes currently fed by at least one of this node's outputs.
    pub fn successors(&self) -> &[NodeId] {
        &self.successors
    }

    /// Whether every input marked required is connected (default ready
    /// condition consulted by updaters).
    pub fn required_inputs_connected(&self) -> bool {
        self.inputs
            .iter()
            .filter(|p| p.spec.required)
            .all(InputPort::is_connected)
    }

    // ------------------------------------------------------------------
    // Adjacency notifications. The per-port connection state is
    // authoritative; these keep the derived sets in sync in O(port count)
    // per notification. They are fired by the pipeline after the port state
    // has already been updated.
    // ------------------------------------------------------------------

    /// One of this node's inputs was connected to a port of `remote`.
    pub(crate) fn input_connected(&mut self, remote: NodeId) {
        if !self.predecessors.contains(&remote) {
            self.predecessors.push(remote);
        }
    }

    /// One of this node's inputs was disconnected from a port of `remote`.
    ///
    /// The remote node stays a predecessor while any other input port still
    /// connects to it; only when no input references it is it removed, by
    /// swap-with-last (set order carries no meaning).
    pub(crate) fn input_disconnected(&mut self, remote: NodeId) {
        for port in &self.inputs {
            if port.connection.is_some_and(|c| c.node == remote) {
                return;
            }
        }
        if let Some(pos) = self.predecessors.iter().position(|&n| n == remote) {
            self.predecessors.swap_remove(pos);
        }
    }

    /// One of this node's outputs was connected to a port of `remote`.
    pub(crate) fn output_connected(&mut self, remote: NodeId) {
        if !self.successors.contains(&remote) {
            self.successors.push(remote);
        }
    }

    /// One of this node's outputs was disconnected from a port of `remote`.
    ///
    /// Outputs fan out, so the scan enumerates every remaining connection of
    /// every output port before concluding the remote node is gone.
    pub(crate) fn output_disconnected(&mut self, remote: NodeId) {
        for port in &self.outputs {
            for connection in &port.connections {
                if connection.node == remote {
                    return;
                }
            }
        }
        if let Some(pos) = self.successors.iter().position(|&n| n == remote) {
            self.successors.swap_remove(pos);
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type_id", &self.type_id)
            .field("kind", &self.kind)
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .field("predecessors", &self.predecessors)
            .field("successors", &self.successors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortSpec;
    use crate::registry::NodeType;
    use crate::tags::TagSet;

    fn sample_type() -> NodeType {
        NodeType::filter("test.sample", "Sample")
            .with_input(PortSpec::reader("in", TagSet::single("text")).required())
            .with_input(PortSpec::reader("aux", TagSet::single("text")))
            .with_output(PortSpec::output("out", TagSet::single("text")))
    }

    #[test]
    fn test_ports_created_from_descriptor() {
        let node = Node::new(&sample_type());
        assert_eq!(node.inputs().len(), 2);
        assert_eq!(node.outputs().len(), 1);
        assert_eq!(node.input(0).name(), "in");
        assert_eq!(node.find_input("aux"), Some(1));
        assert_eq!(node.find_output("out"), Some(0));
        assert_eq!(node.find_input("nope"), None);
    }

    #[test]
    #[should_panic(expected = "no input port at index")]
    fn test_out_of_range_index_is_contract_violation() {
        let node = Node::new(&sample_type());
        let _ = node.input(5);
    }

    #[test]
    fn test_required_inputs_connected_default() {
        let mut node = Node::new(&sample_type());
        assert!(!node.required_inputs_connected());
        node.input_mut(0).connection = Some(OutputRef {
            node: NodeId::new(),
            index: 0,
        });
        // the optional "aux" input may stay unconnected
        assert!(node.required_inputs_connected());
    }

    #[test]
    fn test_adjacency_dedup_and_removal() {
        let mut node = Node::new(&sample_type());
        let remote = NodeId::new();

        node.input_connected(remote);
        node.input_connected(remote);
        assert_eq!(node.predecessors(), &[remote]);

        // no input port references the remote, so it gets removed
        node.input_disconnected(remote);
        assert!(node.predecessors().is_empty());
    }

    #[test]
    fn test_disconnect_keeps_predecessor_while_other_link_remains() {
        let mut node = Node::new(&sample_type());
        let remote = NodeId::new();
        node.input_connected(remote);

        // a second input still references the remote node
        node.input_mut(1).connection = Some(OutputRef {
            node: remote,
            index: 0,
        });
        node.input_disconnected(remote);
        assert_eq!(node.predecessors(), &[remote]);

        node.input_mut(1).connection = None;
        node.input_disconnected(remote);
        assert!(node.predecessors().is_empty());
    }
}
