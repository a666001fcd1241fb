// SPDX-License-Identifier: MIT OR Apache-2.0
//! Text containers and filters for the driftflow engine.
//!
//! This crate is a reference collaborator implementation: a line-oriented
//! [`TextContainer`] satisfying the core's container contract, and filters
//! exercising both connection styles (reader inputs pulling data, writer
//! inputs mutating an upstream container in place).

pub mod container;
pub mod filters;

pub use container::TextContainer;
pub use filters::{append_type, buffer_type, register, uppercase_type, AppendFilter, UpperCaseFilter};
