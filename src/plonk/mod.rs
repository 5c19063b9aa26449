// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! The PLONK gadget protocol.
//!
//! A circuit is a [`PlonkCS`] (constraints, gates, copy constraints) together
//! with an [`AssignmentTable`] (cell values and selector activations). Gadgets
//! implement [`Gadget`]: `generate_circuit` registers the gadget's gates once
//! per selector seed and, per instance, its copy constraints, constants and
//! selector activations; `generate_assignments` fills the witness cells of the
//! same rows.
use crate::errors::BlueprintError;
use ff::PrimeField;

mod assignment;
mod constraint_system;
mod expression;
mod variable;

pub use assignment::{ArithmetizationParams, AssignmentTable, SelectorAllocation, SelectorEntry};
pub use constraint_system::{ConstraintHandle, CopyConstraint, Gate, PlonkCS};
pub use expression::Expression;
pub use variable::{ColumnKind, Var};

/// The contract every PLONK gadget upholds.
///
/// Both generation procedures of one instance occupy exactly the rows
/// `start_row..start_row + ROWS_AMOUNT`, and both return the same
/// [`Output`](Gadget::Output) as [`result`](Gadget::result).
pub trait Gadget<F: PrimeField> {
  /// Input variables (and build-time constants) of the gadget.
  type Params;

  /// Where the gadget's outputs live in the table.
  type Output;

  /// Number of rows occupied by one instance.
  const ROWS_AMOUNT: usize;

  /// Number of gates (and selector columns) registered per circuit.
  const GATES_AMOUNT: usize;

  /// Computes the output layout from the parameters and start row alone.
  fn result(params: &Self::Params, start_row: usize) -> Self::Output;

  /// Emits gates (once per selector seed), copy constraints, constants and
  /// selector activations.
  fn generate_circuit(
    cs: &mut PlonkCS<F>,
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError>;

  /// Fills the witness cells.
  fn generate_assignments(
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError>;
}

/// One of the two generation passes, so that stateful gadgets can drive both
/// passes through a single code path.
pub trait GenerationPass<F: PrimeField> {
  /// Runs the pass of gadget `G` at `start_row`.
  fn generate<G: Gadget<F>>(
    &mut self,
    table: &mut AssignmentTable<F>,
    params: &G::Params,
    start_row: usize,
  ) -> Result<G::Output, BlueprintError>;
}

/// The constraint-emitting pass.
pub struct CircuitPass<'a, F: PrimeField>(pub &'a mut PlonkCS<F>);

/// The witness-computing pass.
pub struct AssignmentPass;

impl<F: PrimeField> GenerationPass<F> for CircuitPass<'_, F> {
  fn generate<G: Gadget<F>>(
    &mut self,
    table: &mut AssignmentTable<F>,
    params: &G::Params,
    start_row: usize,
  ) -> Result<G::Output, BlueprintError> {
    G::generate_circuit(self.0, table, params, start_row)
  }
}

impl<F: PrimeField> GenerationPass<F> for AssignmentPass {
  fn generate<G: Gadget<F>>(
    &mut self,
    table: &mut AssignmentTable<F>,
    params: &G::Params,
    start_row: usize,
  ) -> Result<G::Output, BlueprintError> {
    G::generate_assignments(table, params, start_row)
  }
}
