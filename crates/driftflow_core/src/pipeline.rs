// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pipeline: owner of the node arena and driver of graph maintenance.
//!
//! All graph mutation runs through the pipeline, because the per-port
//! connection state and the derived adjacency caches of the two end nodes
//! have to change together. Execution dispatch also lives here: `update`
//! delegates to the node type's updater strategy under a re-entrancy guard.

use crate::data::DataStrategy;
use crate::node::{Node, NodeId, NodeKind};
use crate::port::{InputRef, OutputRef};
use crate::tags::TagSet;
use crate::update::{ProcessContext, UpdateError};
use indexmap::IndexMap;
use thiserror::Error;

/// Expected negative outcome of a connection attempt. The attempt leaves
/// both ports' state unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectError {
    /// One of the two ports is disabled.
    #[error("port is disabled")]
    PortDisabled,
    /// The output does not allow the access mode the input requests.
    #[error("output does not grant the requested access mode")]
    AccessMismatch,
    /// The tag sets do not intersect (and neither carries the wildcard).
    #[error("incompatible tags: required {required}, offered {offered}")]
    Incompatible {
        /// Tags required by the input port.
        required: TagSet,
        /// Tags offered by the output port.
        offered: TagSet,
    },
}

/// Owner and driver of a collection of nodes.
///
/// Nodes are owned by exactly one pipeline for their lifetime and
/// classified on registration as computation nodes or data holders.
#[derive(Debug, Default)]
pub struct Pipeline {
    nodes: IndexMap<NodeId, Node>,
    filters: Vec<NodeId>,
    containers: Vec<NodeId>,
    /// Nodes currently inside an update call, to bound recursive pulls.
    in_flight: Vec<NodeId>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Register a node, classifying it by kind.
    ///
    /// Returns false, dropping the argument, when a node with the same
    /// identity is already present. Identity means the node id, not
    /// structural equality.
    pub fn add(&mut self, node: Node) -> bool {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            tracing::debug!(node = ?id, "rejected duplicate node registration");
            return false;
        }
        match node.kind() {
            NodeKind::Filter => self.filters.push(id),
            NodeKind::Container => self.containers.push(id),
        }
        tracing::debug!(node = ?id, type_id = node.type_id(), "added node");
        self.nodes.insert(id, node);
        true
    }

    /// Identity membership check.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Get a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a mutable node by ID.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// All nodes, in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// IDs of the registered computation nodes.
    pub fn filters(&self) -> &[NodeId] {
        &self.filters
    }

    /// IDs of the registered data-holder nodes.
    pub fn containers(&self) -> &[NodeId] {
        &self.containers
    }

    pub(crate) fn node_ref(&self, id: NodeId) -> &Node {
        match self.nodes.get(&id) {
            Some(node) => node,
            None => panic!("node {id:?} is not registered in this pipeline"),
        }
    }

    pub(crate) fn node_mut_ref(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(&id) {
            Some(node) => node,
            None => panic!("node {id:?} is not registered in this pipeline"),
        }
    }

    // ------------------------------------------------------------------
    // Named port lookup
    // ------------------------------------------------------------------

    /// Handle to the named input port of a node.
    ///
    /// # Panics
    /// Port names come from the static type descriptor; an unknown name is
    /// a wiring bug and panics.
    pub fn input(&self, node: NodeId, name: &str) -> InputRef {
        let n = self.node_ref(node);
        match n.find_input(name) {
            Some(index) => InputRef { node, index },
            None => panic!("node type `{}` has no input port named `{name}`", n.type_id()),
        }
    }

    /// Handle to the named output port of a node.
    ///
    /// # Panics
    /// On an unknown port name, like [`Pipeline::input`].
    pub fn output(&self, node: NodeId, name: &str) -> OutputRef {
        let n = self.node_ref(node);
        match n.find_output(name) {
            Some(index) => OutputRef { node, index },
            None => panic!("node type `{}` has no output port named `{name}`", n.type_id()),
        }
    }

    // ------------------------------------------------------------------
    // Delegation (port rebinding)
    // ------------------------------------------------------------------

    /// Forward `outer` to `inner`, so that connections, effective tags and
    /// the effective owning node resolve to the inner port.
    ///
    /// # Panics
    ///
    /// Panics when the binding would close a delegation loop (including
    /// binding a port to itself); redirect chains must stay acyclic.
    pub fn bind_input(&mut self, outer: InputRef, inner: InputRef) {
        let _ = self.node_ref(inner.node).input(inner.index);
        let mut current = inner;
        loop {
            assert!(
                current != outer,
                "binding input {outer:?} to {inner:?} would create a delegation cycle"
            );
            match self.node_ref(current.node).input(current.index).redirect {
                Some(next) => current = next,
                None => break,
            }
        }
        self.node_mut_ref(outer.node).input_mut(outer.index).redirect = Some(inner);
    }

    /// Forward `outer` to `inner` for output ports.
    ///
    /// # Panics
    ///
    /// Panics when the binding would close a delegation loop.
    pub fn bind_output(&mut self, outer: OutputRef, inner: OutputRef) {
        let _ = self.node_ref(inner.node).output(inner.index);
        let mut current = inner;
        loop {
            assert!(
                current != outer,
                "binding output {outer:?} to {inner:?} would create a delegation cycle"
            );
            match self.node_ref(current.node).output(current.index).redirect {
                Some(next) => current = next,
                None => break,
            }
        }
        self.node_mut_ref(outer.node).output_mut(outer.index).redirect = Some(inner);
    }

    /// Resolve an input port handle through its delegation chain. Chains
    /// are acyclic, enforced by [`Pipeline::bind_input`].
    pub fn resolve_input(&self, port: InputRef) -> InputRef {
        let mut current = port;
        while let Some(next) = self.node_ref(current.node).input(current.index).redirect {
            current = next;
        }
        current
    }

    /// Resolve an output port handle through its delegation chain.
    pub fn resolve_output(&self, port: OutputRef) -> OutputRef {
        let mut current = port;
        while let Some(next) = self.node_ref(current.node).output(current.index).redirect {
            current = next;
        }
        current
    }

    /// Effective required tags of an input port (redirect-resolved).
    pub fn input_tags(&self, port: InputRef) -> TagSet {
        let resolved = self.resolve_input(port);
        self.node_ref(resolved.node).input(resolved.index).tags().clone()
    }

    /// Effective offered tags of an output port (redirect-resolved).
    pub fn output_tags(&self, port: OutputRef) -> TagSet {
        let resolved = self.resolve_output(port);
        self.node_ref(resolved.node).output(resolved.index).tags().clone()
    }

    // ------------------------------------------------------------------
    // Connection protocol
    // ------------------------------------------------------------------

    /// Connect an output port to an input port.
    ///
    /// Fails without any state change when either resolved port is
    /// disabled, when the access modes do not line up, or when the tag sets
    /// are incompatible. On success any prior connection of the input is
    /// detached first (an input holds at most one connection; outputs fan
    /// out freely), both ports record the new link, and both owning nodes
    /// refresh their adjacency caches.
    pub fn connect(&mut self, from: OutputRef, to: InputRef) -> Result<(), ConnectError> {
        let from = self.resolve_output(from);
        let to = self.resolve_input(to);

        let output = self.node_ref(from.node).output(from.index);
        let input = self.node_ref(to.node).input(to.index);

        if !output.is_enabled() || !input.is_enabled() {
            return Err(ConnectError::PortDisabled);
        }
        if !output.access().allows(input.access()) {
            return Err(ConnectError::AccessMismatch);
        }
        if !TagSet::compatible(input.tags(), output.tags()) {
            return Err(ConnectError::Incompatible {
                required: input.tags().clone(),
                offered: output.tags().clone(),
            });
        }

        // replace semantics: one connection per input
        if input.is_connected() {
            self.disconnect_input(to);
        }

        self.node_mut_ref(to.node).input_mut(to.index).connection = Some(from);
        self.node_mut_ref(from.node)
            .output_mut(from.index)
            .connections
            .push(to);

        self.node_mut_ref(to.node).input_connected(from.node);
        self.node_mut_ref(from.node).output_connected(to.node);

        tracing::debug!(?from, ?to, "connected");
        Ok(())
    }

    /// Detach the input port's connection, if any.
    ///
    /// Safe to call on an unconnected port; returns whether a connection
    /// was removed. Fires the symmetric adjacency notifications on both
    /// owning nodes.
    pub fn disconnect_input(&mut self, port: InputRef) -> bool {
        let to = self.resolve_input(port);
        let Some(from) = self.node_ref(to.node).input(to.index).connection else {
            return false;
        };

        self.node_mut_ref(to.node).input_mut(to.index).connection = None;
        let output = self.node_mut_ref(from.node).output_mut(from.index);
        if let Some(pos) = output.connections.iter().position(|&c| c == to) {
            output.connections.swap_remove(pos);
        }

        self.node_mut_ref(to.node).input_disconnected(from.node);
        self.node_mut_ref(from.node).output_disconnected(to.node);

        tracing::debug!(?from, ?to, "disconnected");
        true
    }

    /// Detach every connection fanning out of the output port.
    ///
    /// Returns whether at least one connection was removed.
    pub fn disconnect_output(&mut self, port: OutputRef) -> bool {
        let from = self.resolve_output(port);
        let mut any = false;
        while let Some(&to) = self.node_ref(from.node).output(from.index).connections.first() {
            self.disconnect_input(to);
            any = true;
        }
        any
    }

    /// Mutable access to the strategy backing an output port, for seeding a
    /// data holder's resource from outside the process path.
    pub fn output_strategy(&mut self, port: OutputRef) -> &mut DataStrategy {
        let resolved = self.resolve_output(port);
        self.node_mut_ref(resolved.node)
            .output_mut(resolved.index)
            .strategy_mut()
    }

    /// Enable or disable an input port. Disabled ports refuse connections.
    pub fn set_input_enabled(&mut self, port: InputRef, enabled: bool) {
        self.node_mut_ref(port.node).input_mut(port.index).enabled = enabled;
    }

    /// Enable or disable an output port.
    pub fn set_output_enabled(&mut self, port: OutputRef, enabled: bool) {
        self.node_mut_ref(port.node).output_mut(port.index).enabled = enabled;
    }

    // ------------------------------------------------------------------
    // Update dispatch
    // ------------------------------------------------------------------

    /// Update one node by delegating to its configured updater strategy.
    ///
    /// A node with no updater fails with [`UpdateError::NoUpdater`]. A node
    /// already being updated further up the call stack is skipped, which
    /// keeps demand-driven updaters terminating on cyclic graphs.
    pub fn update(&mut self, node: NodeId) -> Result<(), UpdateError> {
        let updater = match self.node_ref(node).updater.clone() {
            Some(updater) => updater,
            None => return Err(UpdateError::NoUpdater),
        };
        if self.in_flight.contains(&node) {
            tracing::trace!(node = ?node, "update already in flight, skipping");
            return Ok(());
        }
        self.in_flight.push(node);
        let result = updater.update(self, node);
        self.in_flight.pop();
        result
    }

    /// Run the node's processor if it is ready.
    ///
    /// Nodes without a processor (data holders) succeed trivially.
    pub(crate) fn run_process(&mut self, node: NodeId) -> Result<(), UpdateError> {
        let Some(mut behavior) = self.node_mut_ref(node).behavior.take() else {
            return Ok(());
        };
        if !behavior.ready(self.node_ref(node)) {
            self.node_mut_ref(node).behavior = Some(behavior);
            return Err(UpdateError::NotReady);
        }
        let result = behavior.process(&mut ProcessContext::new(self, node));
        self.node_mut_ref(node).behavior = Some(behavior);
        result.map_err(UpdateError::from)
    }

    /// Drive one update pass over every node that carries an updater.
    ///
    /// There is no topological pre-sort: demand-driven updaters pull their
    /// predecessors themselves, which stays correct while the graph is
    /// mutated between passes. Failures are collected per node and never
    /// abort the pass or touch unrelated nodes.
    pub fn process(&mut self) -> Vec<(NodeId, UpdateError)> {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        let mut failures = Vec::new();
        for id in ids {
            if self.node_ref(id).updater.is_none() {
                continue;
            }
            if let Err(error) = self.update(id) {
                tracing::warn!(node = ?id, %error, "node update failed");
                failures.push((id, error));
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::port::PortSpec;
    use crate::registry::NodeType;
    use proptest::prelude::*;

    fn source_type(tag: &str) -> NodeType {
        NodeType::container("test.source", "Source")
            .with_output(PortSpec::output("out", TagSet::single(tag)))
            .with_output(PortSpec::output("aux", TagSet::single(tag)))
    }

    fn sink_type(tag: &str) -> NodeType {
        NodeType::filter("test.sink", "Sink")
            .with_input(PortSpec::reader("in", TagSet::single(tag)))
            .with_input(PortSpec::reader("aux", TagSet::single(tag)))
    }

    fn two_nodes(tag: &str) -> (Pipeline, NodeId, NodeId) {
        let mut pipeline = Pipeline::new();
        let a = Node::new(&source_type(tag));
        let b = Node::new(&sink_type(tag));
        let (a_id, b_id) = (a.id(), b.id());
        assert!(pipeline.add(a));
        assert!(pipeline.add(b));
        (pipeline, a_id, b_id)
    }

    #[test]
    fn test_connect_updates_both_adjacency_sets() {
        let (mut p, a, b) = two_nodes("text");
        let out = p.output(a, "out");
        let inp = p.input(b, "in");

        p.connect(out, inp).unwrap();
        assert!(p.node(b).unwrap().predecessors().contains(&a));
        assert!(p.node(a).unwrap().successors().contains(&b));
        assert!(p.node(b).unwrap().input(0).is_connected());

        assert!(p.disconnect_output(out));
        assert!(p.node(b).unwrap().predecessors().is_empty());
        assert!(p.node(a).unwrap().successors().is_empty());
        assert!(!p.node(b).unwrap().input(0).is_connected());
    }

    #[test]
    fn test_incompatible_tags_leave_state_unchanged() {
        let mut pipeline = Pipeline::new();
        let a = Node::new(&source_type("image"));
        let b = Node::new(&sink_type("text"));
        let (a_id, b_id) = (a.id(), b.id());
        pipeline.add(a);
        pipeline.add(b);

        let result = pipeline.connect(pipeline.output(a_id, "out"), pipeline.input(b_id, "in"));
        assert!(matches!(result, Err(ConnectError::Incompatible { .. })));
        assert!(!pipeline.node(a_id).unwrap().output(0).is_connected());
        assert!(!pipeline.node(b_id).unwrap().input(0).is_connected());
        assert!(pipeline.node(a_id).unwrap().successors().is_empty());
        assert!(pipeline.node(b_id).unwrap().predecessors().is_empty());
    }

    #[test]
    fn test_wildcard_output_matches_any_requirement() {
        let mut pipeline = Pipeline::new();
        let a = Node::new(&source_type("any"));
        let b = Node::new(&sink_type("text"));
        let (a_id, b_id) = (a.id(), b.id());
        pipeline.add(a);
        pipeline.add(b);

        pipeline
            .connect(pipeline.output(a_id, "out"), pipeline.input(b_id, "in"))
            .unwrap();
    }

    #[test]
    fn test_disabled_port_refuses_connection() {
        let (mut p, a, b) = two_nodes("text");
        let out = p.output(a, "out");
        let inp = p.input(b, "in");

        p.set_input_enabled(inp, false);
        assert_eq!(p.connect(out, inp), Err(ConnectError::PortDisabled));

        p.set_input_enabled(inp, true);
        p.set_output_enabled(out, false);
        assert_eq!(p.connect(out, inp), Err(ConnectError::PortDisabled));

        p.set_output_enabled(out, true);
        p.connect(out, inp).unwrap();
    }

    #[test]
    fn test_writer_input_needs_shared_output() {
        let mut pipeline = Pipeline::new();
        let holder = Node::new(
            &NodeType::container("test.buffer", "Buffer")
                .with_output(PortSpec::shared_output("out", TagSet::single("text"))),
        );
        let reader_only = Node::new(&source_type("text"));
        let writer = Node::new(
            &NodeType::filter("test.writer", "Writer")
                .with_input(PortSpec::writer("write", TagSet::single("text"))),
        );
        let (h, r, w) = (holder.id(), reader_only.id(), writer.id());
        pipeline.add(holder);
        pipeline.add(reader_only);
        pipeline.add(writer);

        // read-only output rejects a writer input
        assert_eq!(
            pipeline.connect(pipeline.output(r, "out"), pipeline.input(w, "write")),
            Err(ConnectError::AccessMismatch)
        );
        // a shared output accepts it
        pipeline
            .connect(pipeline.output(h, "out"), pipeline.input(w, "write"))
            .unwrap();
    }

    #[test]
    fn test_parallel_links_disconnect_one_at_a_time() {
        let (mut p, a, b) = two_nodes("text");
        p.connect(p.output(a, "out"), p.input(b, "in")).unwrap();
        p.connect(p.output(a, "aux"), p.input(b, "aux")).unwrap();

        // two port pairs, one adjacency entry each way
        assert_eq!(p.node(b).unwrap().predecessors(), &[a]);
        assert_eq!(p.node(a).unwrap().successors(), &[b]);

        assert!(p.disconnect_input(p.input(b, "in")));
        assert_eq!(p.node(b).unwrap().predecessors(), &[a]);
        assert_eq!(p.node(a).unwrap().successors(), &[b]);

        assert!(p.disconnect_input(p.input(b, "aux")));
        assert!(p.node(b).unwrap().predecessors().is_empty());
        assert!(p.node(a).unwrap().successors().is_empty());
    }

    #[test]
    fn test_redundant_disconnect_is_noop() {
        let (mut p, _a, b) = two_nodes("text");
        let inp = p.input(b, "in");
        assert!(!p.disconnect_input(inp));
        assert!(!p.disconnect_input(inp));
    }

    #[test]
    fn test_connect_replaces_prior_connection() {
        let mut pipeline = Pipeline::new();
        let a = Node::new(&source_type("text"));
        let c = Node::new(&source_type("text"));
        let b = Node::new(&sink_type("text"));
        let (a_id, c_id, b_id) = (a.id(), c.id(), b.id());
        pipeline.add(a);
        pipeline.add(c);
        pipeline.add(b);

        let inp = pipeline.input(b_id, "in");
        pipeline.connect(pipeline.output(a_id, "out"), inp).unwrap();
        pipeline.connect(pipeline.output(c_id, "out"), inp).unwrap();

        assert_eq!(pipeline.node(b_id).unwrap().predecessors(), &[c_id]);
        assert!(pipeline.node(a_id).unwrap().successors().is_empty());
        assert!(pipeline.node(a_id).unwrap().output(0).connections().is_empty());
        assert_eq!(pipeline.node(c_id).unwrap().successors(), &[b_id]);
    }

    #[test]
    fn test_output_fans_out_to_many_inputs() {
        let mut pipeline = Pipeline::new();
        let a = Node::new(&source_type("text"));
        let b = Node::new(&sink_type("text"));
        let c = Node::new(&sink_type("text"));
        let (a_id, b_id, c_id) = (a.id(), b.id(), c.id());
        pipeline.add(a);
        pipeline.add(b);
        pipeline.add(c);

        let out = pipeline.output(a_id, "out");
        pipeline.connect(out, pipeline.input(b_id, "in")).unwrap();
        pipeline.connect(out, pipeline.input(c_id, "in")).unwrap();

        assert_eq!(pipeline.node(a_id).unwrap().output(0).connections().len(), 2);
        let successors = pipeline.node(a_id).unwrap().successors();
        assert!(successors.contains(&b_id) && successors.contains(&c_id));
    }

    #[test]
    fn test_node_may_be_predecessor_and_successor() {
        let mut pipeline = Pipeline::new();
        let make = || {
            Node::new(
                &NodeType::filter("test.both", "Both")
                    .with_input(PortSpec::reader("in", TagSet::single("text")))
                    .with_output(PortSpec::output("out", TagSet::single("text"))),
            )
        };
        let a = make();
        let b = make();
        let (a_id, b_id) = (a.id(), b.id());
        pipeline.add(a);
        pipeline.add(b);

        pipeline
            .connect(pipeline.output(a_id, "out"), pipeline.input(b_id, "in"))
            .unwrap();
        pipeline
            .connect(pipeline.output(b_id, "out"), pipeline.input(a_id, "in"))
            .unwrap();

        assert_eq!(pipeline.node(a_id).unwrap().successors(), &[b_id]);
        assert_eq!(pipeline.node(a_id).unwrap().predecessors(), &[b_id]);
        assert_eq!(pipeline.node(b_id).unwrap().successors(), &[a_id]);
        assert_eq!(pipeline.node(b_id).unwrap().predecessors(), &[a_id]);
    }

    #[test]
    fn test_duplicate_add_rejected_by_identity() {
        let mut pipeline = Pipeline::new();
        let registry_type = sink_type("text");
        let node = Node::new(&registry_type);
        let id = node.id();

        assert!(pipeline.add(node));
        assert!(pipeline.contains(id));
        assert_eq!(pipeline.node_count(), 1);

        // same identity again: rejected, present exactly once
        let mut twin = Node::new(&registry_type);
        twin.set_id(id);
        assert!(!pipeline.add(twin));
        assert_eq!(pipeline.node_count(), 1);

        // a different instance of the same type is fine
        assert!(pipeline.add(Node::new(&registry_type)));
        assert_eq!(pipeline.node_count(), 2);
    }

    #[test]
    fn test_bound_port_resolves_to_inner_node() {
        let mut pipeline = Pipeline::new();
        let outer = Node::new(&sink_type("text"));
        let inner = Node::new(&sink_type("text"));
        let source = Node::new(&source_type("text"));
        let (o_id, i_id, s_id) = (outer.id(), inner.id(), source.id());
        pipeline.add(outer);
        pipeline.add(inner);
        pipeline.add(source);

        pipeline.bind_input(pipeline.input(o_id, "in"), pipeline.input(i_id, "in"));
        let resolved = pipeline.resolve_input(pipeline.input(o_id, "in"));
        assert_eq!(resolved.node, i_id);

        // connecting to the outer port lands on the inner node
        pipeline
            .connect(pipeline.output(s_id, "out"), pipeline.input(o_id, "in"))
            .unwrap();
        assert!(pipeline.node(i_id).unwrap().input(0).is_connected());
        assert_eq!(pipeline.node(i_id).unwrap().predecessors(), &[s_id]);
        assert!(pipeline.node(o_id).unwrap().predecessors().is_empty());
    }

    #[test]
    #[should_panic(expected = "delegation cycle")]
    fn test_circular_bind_is_contract_violation() {
        let mut pipeline = Pipeline::new();
        let a = Node::new(&sink_type("text"));
        let b = Node::new(&sink_type("text"));
        let (a_id, b_id) = (a.id(), b.id());
        pipeline.add(a);
        pipeline.add(b);

        pipeline.bind_input(pipeline.input(a_id, "in"), pipeline.input(b_id, "in"));
        pipeline.bind_input(pipeline.input(b_id, "in"), pipeline.input(a_id, "in"));
    }

    #[test]
    #[should_panic(expected = "delegation cycle")]
    fn test_rebind_closing_a_longer_loop_is_rejected() {
        let mut pipeline = Pipeline::new();
        let a = Node::new(&sink_type("text"));
        let b = Node::new(&sink_type("text"));
        let c = Node::new(&sink_type("text"));
        let (a_id, b_id, c_id) = (a.id(), b.id(), c.id());
        pipeline.add(a);
        pipeline.add(b);
        pipeline.add(c);

        // a -> b and c -> a; rebinding a -> c would close a -> c -> a even
        // though the chain from c still terminates at b
        pipeline.bind_input(pipeline.input(a_id, "in"), pipeline.input(b_id, "in"));
        pipeline.bind_input(pipeline.input(c_id, "in"), pipeline.input(a_id, "in"));
        pipeline.bind_input(pipeline.input(a_id, "in"), pipeline.input(c_id, "in"));
    }

    #[test]
    #[should_panic(expected = "no input port named")]
    fn test_unknown_port_name_is_contract_violation() {
        let (p, _a, b) = two_nodes("text");
        let _ = p.input(b, "missing");
    }

    #[test]
    fn test_update_without_updater_fails() {
        let (mut p, _a, b) = two_nodes("text");
        assert!(matches!(p.update(b), Err(UpdateError::NoUpdater)));
    }

    // --------------------------------------------------------------
    // Adjacency invariant under arbitrary operation sequences
    // --------------------------------------------------------------

    /// Recompute, from the authoritative port state, whether `to` should be
    /// a successor of `from`, and compare with both cached sets.
    fn check_adjacency_invariant(pipeline: &Pipeline) {
        let ids: Vec<NodeId> = pipeline.nodes().map(|n| n.id()).collect();
        for &from in &ids {
            for &to in &ids {
                let linked = pipeline.node(from).unwrap().outputs().iter().any(|out| {
                    out.connections().iter().any(|c| c.node == to)
                });
                assert_eq!(
                    pipeline.node(from).unwrap().successors().contains(&to),
                    linked,
                    "successor cache out of sync"
                );
                assert_eq!(
                    pipeline.node(to).unwrap().predecessors().contains(&from),
                    linked,
                    "predecessor cache out of sync"
                );
            }
        }
    }

    #[derive(Debug, Clone)]
    enum Op {
        Connect(usize, usize, usize, usize),
        DisconnectInput(usize, usize),
        DisconnectOutput(usize, usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..3usize, 0..2usize, 0..3usize, 0..2usize)
                .prop_map(|(a, o, b, i)| Op::Connect(a, o, b, i)),
            (0..3usize, 0..2usize).prop_map(|(n, i)| Op::DisconnectInput(n, i)),
            (0..3usize, 0..2usize).prop_map(|(n, o)| Op::DisconnectOutput(n, o)),
        ]
    }

    proptest! {
        #[test]
        fn test_adjacency_invariant_holds_under_random_ops(
            ops in proptest::collection::vec(op_strategy(), 0..40)
        ) {
            let node_type = NodeType::filter("test.duplex", "Duplex")
                .with_input(PortSpec::reader("in0", TagSet::any()))
                .with_input(PortSpec::reader("in1", TagSet::any()))
                .with_output(PortSpec::output("out0", TagSet::any()))
                .with_output(PortSpec::output("out1", TagSet::any()));

            let mut pipeline = Pipeline::new();
            let mut ids = Vec::new();
            for _ in 0..3 {
                let node = Node::new(&node_type);
                ids.push(node.id());
                pipeline.add(node);
            }

            for op in ops {
                match op {
                    Op::Connect(a, o, b, i) => {
                        let from = pipeline.node(ids[a]).unwrap().output_ref(o);
                        let to = pipeline.node(ids[b]).unwrap().input_ref(i);
                        pipeline.connect(from, to).unwrap();
                    }
                    Op::DisconnectInput(n, i) => {
                        let port = pipeline.node(ids[n]).unwrap().input_ref(i);
                        pipeline.disconnect_input(port);
                    }
                    Op::DisconnectOutput(n, o) => {
                        let port = pipeline.node(ids[n]).unwrap().output_ref(o);
                        pipeline.disconnect_output(port);
                    }
                }
                check_adjacency_invariant(&pipeline);
            }
        }
    }
}
