// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions: connection endpoints attached to one owning node.
//!
//! Ports are stored inside their owning [`crate::Node`] and addressed from
//! the outside through [`InputRef`]/[`OutputRef`] handles, so the cyclic
//! Node/Port/Port references of a connected graph never become ownership
//! cycles. All state transitions (connect, disconnect, bind) run through
//! [`crate::Pipeline`], which owns the node arena.

use crate::data::{DataStrategy, SharedContainer};
use crate::node::NodeId;
use crate::tags::TagSet;
use serde::{Deserialize, Serialize};

/// Access mode negotiated between an output and the inputs connected to it.
///
/// Inputs request either `Read` (ordinary data consumption) or `Write` (the
/// writer-style connection that mutates the producer's container in place).
/// Outputs declare what they allow: `Read` for read-only exposure,
/// `ReadWrite` for containers open to both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortAccess {
    /// Read-only access.
    Read,
    /// Write access.
    Write,
    /// Both read and write access (output declaration only).
    ReadWrite,
}

impl PortAccess {
    /// Whether an output declaring `self` accepts an input requesting
    /// `requested`.
    pub fn allows(self, requested: PortAccess) -> bool {
        match self {
            Self::ReadWrite => true,
            Self::Read => requested == Self::Read,
            Self::Write => requested == Self::Write,
        }
    }
}

/// Static description of one port, part of a node type descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortSpec {
    /// Port name, unique within the owning node's port vector.
    pub name: String,
    /// Tags required (inputs) or offered (outputs).
    pub tags: TagSet,
    /// Access mode requested (inputs) or allowed (outputs).
    pub access: PortAccess,
    /// Whether the default ready condition insists on a connection here.
    pub required: bool,
}

impl PortSpec {
    /// A data input requesting read access.
    pub fn reader(name: impl Into<String>, tags: TagSet) -> Self {
        Self {
            name: name.into(),
            tags,
            access: PortAccess::Read,
            required: false,
        }
    }

    /// A writer input requesting in-place write access.
    pub fn writer(name: impl Into<String>, tags: TagSet) -> Self {
        Self {
            name: name.into(),
            tags,
            access: PortAccess::Write,
            required: false,
        }
    }

    /// An output allowing read-only consumption.
    pub fn output(name: impl Into<String>, tags: TagSet) -> Self {
        Self {
            name: name.into(),
            tags,
            access: PortAccess::Read,
            required: false,
        }
    }

    /// An output that downstream writers may also connect to.
    pub fn shared_output(name: impl Into<String>, tags: TagSet) -> Self {
        Self {
            name: name.into(),
            tags,
            access: PortAccess::ReadWrite,
            required: false,
        }
    }

    /// Mark the port as required by the default ready condition.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Handle to an input port: owning node plus index in its input vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputRef {
    /// Owning node.
    pub node: NodeId,
    /// Index within the node's input port vector.
    pub index: usize,
}

/// Handle to an output port: owning node plus index in its output vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    /// Owning node.
    pub node: NodeId,
    /// Index within the node's output port vector.
    pub index: usize,
}

/// An input port instance.
#[derive(Debug)]
pub struct InputPort {
    pub(crate) spec: PortSpec,
    pub(crate) enabled: bool,
    /// At most one upstream connection at a time.
    pub(crate) connection: Option<OutputRef>,
    /// Delegation link to another input port (resolved at query time).
    pub(crate) redirect: Option<InputRef>,
    /// Auto-created container for unconnected writer inputs.
    pub(crate) fallback: Option<SharedContainer>,
}

impl InputPort {
    pub(crate) fn new(spec: PortSpec) -> Self {
        Self {
            spec,
            enabled: true,
            connection: None,
            redirect: None,
            fallback: None,
        }
    }

    /// Port name from the type descriptor.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Required tag set declared by this port (not redirect-resolved; see
    /// [`crate::Pipeline::input_tags`] for the effective set).
    pub fn tags(&self) -> &TagSet {
        &self.spec.tags
    }

    /// Requested access mode.
    pub fn access(&self) -> PortAccess {
        self.spec.access
    }

    /// Whether the port takes part in connection attempts.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether an upstream output is currently connected.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The connected output, if any.
    pub fn connected_output(&self) -> Option<OutputRef> {
        self.connection
    }
}

/// An output port instance, owning the data strategy that backs its value.
#[derive(Debug)]
pub struct OutputPort {
    pub(crate) spec: PortSpec,
    pub(crate) enabled: bool,
    /// Fan-out: every input currently connected to this output.
    pub(crate) connections: Vec<InputRef>,
    /// Delegation link to another output port.
    pub(crate) redirect: Option<OutputRef>,
    pub(crate) strategy: DataStrategy,
}

impl OutputPort {
    pub(crate) fn new(spec: PortSpec) -> Self {
        Self {
            spec,
            enabled: true,
            connections: Vec::new(),
            redirect: None,
            strategy: DataStrategy::new(),
        }
    }

    /// Port name from the type descriptor.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Offered tag set declared by this port.
    pub fn tags(&self) -> &TagSet {
        &self.spec.tags
    }

    /// Allowed access mode.
    pub fn access(&self) -> PortAccess {
        self.spec.access
    }

    /// Whether the port takes part in connection attempts.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether at least one input is connected.
    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    /// Every input currently connected to this output.
    pub fn connections(&self) -> &[InputRef] {
        &self.connections
    }

    /// The strategy owning this output's backing resource.
    pub fn strategy(&self) -> &DataStrategy {
        &self.strategy
    }

    /// Mutable access to the backing strategy.
    pub fn strategy_mut(&mut self) -> &mut DataStrategy {
        &mut self.strategy
    }
}
