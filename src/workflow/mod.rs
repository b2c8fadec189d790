// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! Workflow definitions and types
//!
//! This module defines the core data structures for ciflow workflows:
//! triggers, the build matrix, steps, uploads, and configuration.

mod definition;
mod matrix;
mod trigger;
mod validation;

pub use definition::*;
pub use matrix::{JobSpec, Matrix, MatrixAxis};
pub use trigger::{Event, EventKind, TriggerRule, TriggerSet};
pub use validation::{ValidationResult, WorkflowValidator};
