// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed dataflow-graph engine.
//!
//! Computational units ([`Node`]) expose tagged connection endpoints
//! (ports); ports are wired together under a tag-compatibility gate to form
//! a directed graph owned by a [`Pipeline`]. The pipeline drives execution
//! by delegating each node's update to a pluggable [`update::Updater`]
//! strategy, which invokes the node's processor; processors read upstream
//! resources and write their own through scoped accessors backed by a
//! lazily-chosen [`data::DataStrategy`].
//!
//! ## Architecture
//!
//! - Nodes live in an arena inside the pipeline and are addressed by
//!   [`NodeId`]; ports are addressed by [`InputRef`]/[`OutputRef`] handles,
//!   which sidesteps the Node/Port ownership cycle.
//! - Port-level connections are the authoritative state; each node's
//!   predecessor/successor sets are caches refreshed incrementally on every
//!   connect/disconnect.
//! - Everything is single-threaded and synchronous; shared resources use
//!   `Rc<RefCell<_>>` with borrow guards as the reader/writer discipline.

pub mod data;
pub mod node;
pub mod pipeline;
pub mod port;
pub mod registry;
pub mod tags;
pub mod update;

pub use data::{read_as, share, write_as, Container, DataStrategy, SharedContainer, StrategyError};
pub use node::{Node, NodeId, NodeKind};
pub use pipeline::{ConnectError, Pipeline};
pub use port::{InputRef, OutputRef, PortAccess, PortSpec};
pub use registry::{NodeRegistry, NodeType};
pub use tags::{TagSet, WILDCARD};
pub use update::{
    EagerUpdater, ProcessContext, ProcessError, Processor, PullUpdater, UpdateError, Updater,
};
