// SPDX-License-Identifier: MIT OR Apache-2.0
//! Containers, scoped accessors and the lazy data strategy backing outputs.
//!
//! A container is the concrete buffer behind an output port's value. The
//! engine never inspects its contents; it only negotiates representation
//! through capability downcasts. Accessors are `Ref`/`RefMut` borrow guards,
//! so the single-writer/many-reader discipline and the "resource outlives
//! every accessor" rule fall out of the borrow checker.

use crate::tags::TagSet;
use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Contract every concrete buffer implementation must satisfy.
///
/// Implementations answer compatibility probes through the `Any` hooks and
/// report the tag set describing their data kind.
pub trait Container: Any + fmt::Debug {
    /// Tags describing the data kind held by this container.
    fn tags(&self) -> TagSet;

    /// Upcast for capability probing.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for capability probing.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Shared handle to a container resource.
///
/// The owning output port holds one handle in its [`DataStrategy`];
/// downstream readers clone the handle for the duration of a process call.
pub type SharedContainer = Rc<RefCell<Box<dyn Container>>>;

/// Wrap a concrete container into a shared resource handle.
pub fn share<T: Container>(container: T) -> SharedContainer {
    Rc::new(RefCell::new(Box::new(container)))
}

/// Borrow a shared container as a concrete type for reading.
///
/// Returns `None` when the resource's representation is not `T`, letting a
/// consumer probe several accessor kinds without failing hard.
pub fn read_as<T: Container>(resource: &SharedContainer) -> Option<Ref<'_, T>> {
    Ref::filter_map(resource.borrow(), |c| c.as_any().downcast_ref::<T>()).ok()
}

/// Borrow a shared container as a concrete type for writing.
///
/// Returns `None` on representation mismatch, leaving the buffer untouched.
pub fn write_as<T: Container>(resource: &SharedContainer) -> Option<RefMut<'_, T>> {
    RefMut::filter_map(resource.borrow_mut(), |c| c.as_any_mut().downcast_mut::<T>()).ok()
}

/// Failure at the representation-negotiation layer.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// The resource is already fixed to a different concrete representation.
    #[error("resource representation already fixed to an incompatible container")]
    RepresentationMismatch,
}

/// Policy object owning and lazily choosing the concrete representation of
/// an output port's backing resource.
///
/// The strategy is a two-state machine: unset until the first writer request
/// fixes the representation, then fixed for the rest of the port's life.
/// Attempts to acquire a different representation afterwards fail instead of
/// silently reinterpreting the buffer.
#[derive(Debug, Default)]
pub struct DataStrategy {
    resource: Option<SharedContainer>,
}

impl DataStrategy {
    /// A strategy with no representation chosen yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a concrete representation has been fixed.
    pub fn is_fixed(&self) -> bool {
        self.resource.is_some()
    }

    /// Handle to the current backing resource, if one exists.
    pub fn resource(&self) -> Option<SharedContainer> {
        self.resource.clone()
    }

    /// Install an externally created resource. Fails if a representation is
    /// already fixed.
    pub fn adopt(&mut self, resource: SharedContainer) -> Result<(), StrategyError> {
        if self.resource.is_some() {
            return Err(StrategyError::RepresentationMismatch);
        }
        self.resource = Some(resource);
        Ok(())
    }

    /// Fetch the backing resource for a writer of concrete kind `T`.
    ///
    /// The first request fixes the representation by allocating a default
    /// `T`; later requests succeed only while the fixed representation is
    /// still `T`.
    pub fn acquire<T: Container + Default>(&mut self) -> Result<SharedContainer, StrategyError> {
        match &self.resource {
            Some(existing) => {
                if existing.borrow().as_any().is::<T>() {
                    Ok(existing.clone())
                } else {
                    Err(StrategyError::RepresentationMismatch)
                }
            }
            None => {
                let created = share(T::default());
                tracing::debug!(kind = std::any::type_name::<T>(), "fixed output representation");
                self.resource = Some(created.clone());
                Ok(created)
            }
        }
    }

    /// Probe whether a reader of kind `T` would match the current resource.
    pub fn is_reader_compatible<T: Container>(&self) -> bool {
        self.resource
            .as_ref()
            .is_some_and(|r| r.borrow().as_any().is::<T>())
    }

    /// Probe whether a writer of kind `T` would match: true when the
    /// representation is still unset (the writer would fix it) or already `T`.
    pub fn is_writer_compatible<T: Container + Default>(&self) -> bool {
        match &self.resource {
            Some(r) => r.borrow().as_any().is::<T>(),
            None => true,
        }
    }
}
