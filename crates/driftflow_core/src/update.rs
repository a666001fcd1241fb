// SPDX-License-Identifier: MIT OR Apache-2.0
//! Update dispatch: pluggable updater strategies and processor behaviors.
//!
//! A node's `update` entry point delegates to the [`Updater`] configured on
//! its type descriptor, so execution policy (eager, demand-driven) is
//! swapped without touching the node. The updater consults the processor's
//! ready condition and invokes [`Processor::process`], which pulls data from
//! connected inputs and pushes results through the node's output strategies.

use crate::data::{Container, SharedContainer, StrategyError};
use crate::node::{Node, NodeId};
use crate::pipeline::Pipeline;
use crate::port::PortAccess;
use thiserror::Error;

/// Failure reported by a node update.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The node's type descriptor configures no updater.
    #[error("node has no updater configured")]
    NoUpdater,
    /// The processor's ready condition rejected the update.
    #[error("node is not ready to process")]
    NotReady,
    /// The processor itself failed; local to this node.
    #[error("process failed: {0}")]
    Process(#[from] ProcessError),
}

/// Failure inside a processor's `process` routine.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A port that must be connected is not.
    #[error("port `{port}` is not connected")]
    NotConnected {
        /// Name of the offending port.
        port: String,
    },
    /// The upstream output has not produced a resource yet.
    #[error("no data available on port `{port}`")]
    NoData {
        /// Name of the offending port.
        port: String,
    },
    /// The port's access mode does not permit the requested operation.
    #[error("port `{port}` does not grant the requested access")]
    WrongAccess {
        /// Name of the offending port.
        port: String,
    },
    /// Representation negotiation failed.
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    /// Filter-specific failure.
    #[error("{0}")]
    Custom(String),
}

/// Execution policy dispatched by [`Pipeline::update`].
pub trait Updater {
    /// Run one update of `node` within `pipeline`.
    fn update(&self, pipeline: &mut Pipeline, node: NodeId) -> Result<(), UpdateError>;
}

/// Runs the processor on every call, provided it is ready.
#[derive(Debug, Default)]
pub struct EagerUpdater;

impl Updater for EagerUpdater {
    fn update(&self, pipeline: &mut Pipeline, node: NodeId) -> Result<(), UpdateError> {
        pipeline.run_process(node)
    }
}

/// Demand-driven policy: updates every predecessor before processing, so a
/// single update call at the sink refreshes the whole upstream chain.
///
/// Predecessor failures are logged and do not abort the node's own attempt;
/// a missing upstream value surfaces as an ordinary process failure when the
/// processor tries to read it. Recursion over cyclic graphs is bounded by
/// the pipeline's in-flight guard.
#[derive(Debug, Default)]
pub struct PullUpdater;

impl Updater for PullUpdater {
    fn update(&self, pipeline: &mut Pipeline, node: NodeId) -> Result<(), UpdateError> {
        let predecessors = pipeline.node_ref(node).predecessors().to_vec();
        for upstream in predecessors {
            if let Err(error) = pipeline.update(upstream) {
                tracing::warn!(node = ?upstream, %error, "predecessor update failed");
            }
        }
        pipeline.run_process(node)
    }
}

/// Behavior of a concrete computation node.
pub trait Processor {
    /// Perform the node's computation, reading connected inputs and writing
    /// outputs through the context.
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessError>;

    /// Predicate consulted by updaters before invoking [`Self::process`].
    /// Defaults to "all required inputs connected".
    fn ready(&self, node: &Node) -> bool {
        node.required_inputs_connected()
    }
}

/// Access to a node's connections and resources during one process call.
///
/// Every resource handle returned here is scoped to the call; concrete
/// read/write accessors are obtained from the handle with
/// [`crate::read_as`]/[`crate::write_as`] and released when dropped.
pub struct ProcessContext<'a> {
    pipeline: &'a mut Pipeline,
    node: NodeId,
}

impl<'a> ProcessContext<'a> {
    pub(crate) fn new(pipeline: &'a mut Pipeline, node: NodeId) -> Self {
        Self { pipeline, node }
    }

    /// ID of the node being processed.
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Whether the given input port is connected.
    pub fn input_connected(&self, index: usize) -> bool {
        let resolved = self
            .pipeline
            .resolve_input(self.pipeline.node_ref(self.node).input_ref(index));
        self.pipeline
            .node_ref(resolved.node)
            .input(resolved.index)
            .is_connected()
    }

    /// Resource behind the output connected to the given data input.
    ///
    /// Fails when the port is unconnected or the upstream output has not
    /// produced anything yet.
    pub fn input(&self, index: usize) -> Result<SharedContainer, ProcessError> {
        let resolved = self
            .pipeline
            .resolve_input(self.pipeline.node_ref(self.node).input_ref(index));
        let port = self.pipeline.node_ref(resolved.node).input(resolved.index);
        if port.access() != PortAccess::Read {
            return Err(ProcessError::WrongAccess {
                port: port.name().to_owned(),
            });
        }
        let name = port.name().to_owned();
        let upstream = port
            .connected_output()
            .ok_or(ProcessError::NotConnected { port: name.clone() })?;
        self.pipeline
            .node_ref(upstream.node)
            .output(upstream.index)
            .strategy()
            .resource()
            .ok_or(ProcessError::NoData { port: name })
    }

    /// Resource backing one of this node's own outputs, created lazily with
    /// representation `T` on first request.
    pub fn output<T: Container + Default>(
        &mut self,
        index: usize,
    ) -> Result<SharedContainer, ProcessError> {
        let resource = self
            .pipeline
            .node_mut_ref(self.node)
            .output_mut(index)
            .strategy_mut()
            .acquire::<T>()?;
        Ok(resource)
    }

    /// Resource to write through a writer input.
    ///
    /// When the writer input is connected, this negotiates representation
    /// `T` with the connected output's strategy. When nothing compatible is
    /// connected, a default `T` container is auto-created and kept on the
    /// port for subsequent calls.
    pub fn write_target<T: Container + Default>(
        &mut self,
        index: usize,
    ) -> Result<SharedContainer, ProcessError> {
        let resolved = self
            .pipeline
            .resolve_input(self.pipeline.node_ref(self.node).input_ref(index));
        let port = self.pipeline.node_ref(resolved.node).input(resolved.index);
        if port.access() != PortAccess::Write {
            return Err(ProcessError::WrongAccess {
                port: port.name().to_owned(),
            });
        }

        if let Some(upstream) = port.connected_output() {
            let resource = self
                .pipeline
                .node_mut_ref(upstream.node)
                .output_mut(upstream.index)
                .strategy_mut()
                .acquire::<T>()?;
            return Ok(resource);
        }

        // unconnected writer input: lazily keep a private default container
        let port = self
            .pipeline
            .node_mut_ref(resolved.node)
            .input_mut(resolved.index);
        match &port.fallback {
            Some(existing) => {
                if existing.borrow().as_any().is::<T>() {
                    Ok(existing.clone())
                } else {
                    Err(ProcessError::Strategy(StrategyError::RepresentationMismatch))
                }
            }
            None => {
                let created = crate::data::share(T::default());
                port.fallback = Some(created.clone());
                Ok(created)
            }
        }
    }
}
