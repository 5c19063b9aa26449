// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! The PLONK constraint system: constraints, gates and copy constraints.
use super::{AssignmentTable, Expression, Var};
use crate::{
  digest::{CircuitDigest, DigestComputer, SimpleDigestible},
  errors::BlueprintError,
  start_span,
};
use ff::PrimeField;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Opaque reference to a constraint registered with [`PlonkCS::add_constraint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintHandle(usize);

/// A custom gate: constraints that fire on every row where the selector is on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
  /// the selector column activating this gate
  pub selector: usize,
  /// the constraints of this gate, in order
  pub constraints: Vec<ConstraintHandle>,
}

/// An equality between two cells, enforced by the permutation argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CopyConstraint(pub Var, pub Var);

/// Accumulates the shape of a PLONK circuit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlonkCS<F> {
  constraints: Vec<Expression<F>>,
  gates: Vec<Gate>,
  copy_constraints: Vec<CopyConstraint>,
}

impl<F: Serialize> SimpleDigestible for PlonkCS<F> {}

impl<F: PrimeField> PlonkCS<F> {
  /// Creates an empty constraint system.
  pub fn new() -> Self {
    PlonkCS {
      constraints: Vec::new(),
      gates: Vec::new(),
      copy_constraints: Vec::new(),
    }
  }

  /// Registers a polynomial constraint.
  pub fn add_constraint(&mut self, expr: Expression<F>) -> ConstraintHandle {
    self.constraints.push(expr);
    ConstraintHandle(self.constraints.len() - 1)
  }

  /// Binds constraints to a selector column.
  pub fn add_gate(&mut self, selector: usize, constraints: Vec<ConstraintHandle>) {
    self.gates.push(Gate {
      selector,
      constraints,
    });
  }

  /// Registers an equality between two absolute cells. Values are not
  /// compared here; see [`check_copy_constraints`](Self::check_copy_constraints).
  pub fn add_copy_constraint(&mut self, (a, b): (Var, Var)) {
    debug_assert!(a.absolute && b.absolute, "copy constraints join absolute cells");
    self.copy_constraints.push(CopyConstraint(a, b));
  }

  /// The expression behind a handle.
  pub fn constraint(&self, handle: ConstraintHandle) -> &Expression<F> {
    &self.constraints[handle.0]
  }

  /// All gates, in registration order.
  pub fn gates(&self) -> &[Gate] {
    &self.gates
  }

  /// Number of gates.
  pub fn num_gates(&self) -> usize {
    self.gates.len()
  }

  /// Number of registered constraints.
  pub fn num_constraints(&self) -> usize {
    self.constraints.len()
  }

  /// All copy constraints, in registration order.
  pub fn copy_constraints(&self) -> &[CopyConstraint] {
    &self.copy_constraints
  }

  /// Checks that every copy constraint joins two written cells holding the
  /// same value.
  pub fn check_copy_constraints(&self, table: &AssignmentTable<F>) -> Result<(), BlueprintError> {
    self
      .copy_constraints
      .par_iter()
      .try_for_each(|CopyConstraint(a, b)| {
        let unsat = |e: BlueprintError| BlueprintError::UnSat {
          reason: format!("copy constraint {a:?} <-> {b:?}: {e}"),
        };
        let va = table.value(*a).map_err(unsat)?;
        let vb = table.value(*b).map_err(unsat)?;
        if va == vb {
          Ok(())
        } else {
          Err(BlueprintError::UnSat {
            reason: format!("copy constraint {a:?} <-> {b:?} joins different values"),
          })
        }
      })
  }

  /// Checks every gate on every row where its selector is active, then every
  /// copy constraint.
  pub fn is_sat(&self, table: &AssignmentTable<F>) -> Result<(), BlueprintError> {
    let (_is_sat_span, is_sat_t) = start_span!("plonk_is_sat");
    let rows = table.rows_amount();

    for (g, gate) in self.gates.iter().enumerate() {
      (0..rows).into_par_iter().try_for_each(|row| {
        let activation = table.selector(gate.selector, row);
        if activation.is_zero_vartime() {
          return Ok(());
        }
        let resolve = |var: &Var| table.value_at(var, row);
        for (j, handle) in gate.constraints.iter().enumerate() {
          let value = self
            .constraint(*handle)
            .evaluate(&resolve)
            .map_err(|e| BlueprintError::UnSat {
              reason: format!("gate {g} constraint {j} at row {row}: {e}"),
            })?;
          if !(value * activation).is_zero_vartime() {
            return Err(BlueprintError::UnSat {
              reason: format!(
                "gate {g} (selector {}) constraint {j} is not satisfied at row {row}",
                gate.selector
              ),
            });
          }
        }
        Ok(())
      })?;
    }

    self.check_copy_constraints(table)?;
    info!(
      elapsed_ms = %is_sat_t.elapsed().as_millis(),
      gates = self.gates.len(),
      copy_constraints = self.copy_constraints.len(),
      rows,
      "plonk_is_sat"
    );
    Ok(())
  }
}

impl<F: PrimeField + Serialize> PlonkCS<F> {
  /// SHA3-256 digest of the circuit shape.
  pub fn digest(&self) -> Result<CircuitDigest, BlueprintError> {
    DigestComputer::new(self)
      .digest()
      .map_err(|e| BlueprintError::DigestError {
        reason: e.to_string(),
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::plonk::ArithmetizationParams;
  use halo2curves::pasta::Fp;

  // a single gate: w0(0) * w1(0) - w0(+1) = 0
  fn product_chain() -> (PlonkCS<Fp>, AssignmentTable<Fp>) {
    let mut cs = PlonkCS::new();
    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    let s = table.get_or_allocate_selector(0x99, 1).first;
    let c = cs.add_constraint(
      Expression::from(Var::rotated(0, 0)) * Var::rotated(1, 0) - Var::rotated(0, 1),
    );
    cs.add_gate(s, vec![c]);

    // 2 * 3 = 6, 6 * 5 = 30
    for (row, (a, b)) in [(2u64, 3u64), (6, 5), (30, 0)].into_iter().enumerate() {
      table.assign_witness(0, row, Fp::from(a)).unwrap();
      table.assign_witness(1, row, Fp::from(b)).unwrap();
    }
    table.enable_selector(s, 0).unwrap();
    table.enable_selector(s, 1).unwrap();
    (cs, table)
  }

  #[test]
  fn test_is_sat() {
    let (cs, table) = product_chain();
    assert_eq!(cs.num_gates(), 1);
    assert_eq!(cs.num_constraints(), 1);
    assert!(cs.is_sat(&table).is_ok());
  }

  #[test]
  fn test_is_sat_detects_bad_gate() {
    let (cs, mut table) = product_chain();
    table.assign_witness(0, 2, Fp::from(31)).unwrap();
    assert!(matches!(
      cs.is_sat(&table),
      Err(BlueprintError::UnSat { .. })
    ));
  }

  #[test]
  fn test_is_sat_ignores_inactive_rows() {
    let (cs, mut table) = product_chain();
    // row 2 has no selector, so garbage below it is irrelevant
    table.assign_witness(0, 3, Fp::from(1)).unwrap();
    table.assign_witness(1, 2, Fp::from(77)).unwrap();
    assert!(cs.is_sat(&table).is_ok());
  }

  #[test]
  fn test_copy_constraints() {
    let (mut cs, mut table) = product_chain();
    table.assign_public_input(0, 0, Fp::from(2)).unwrap();
    cs.add_copy_constraint((Var::public_input(0, 0), Var::witness(0, 0)));
    assert!(cs.check_copy_constraints(&table).is_ok());

    cs.add_copy_constraint((Var::public_input(0, 0), Var::witness(1, 0)));
    assert!(cs.check_copy_constraints(&table).is_err());
    assert!(cs.is_sat(&table).is_err());

    // unwritten cells never satisfy a copy constraint
    let mut cs = PlonkCS::<Fp>::new();
    cs.add_copy_constraint((Var::witness(0, 40), Var::witness(0, 41)));
    assert!(cs.check_copy_constraints(&table).is_err());
  }

  #[test]
  fn test_digest_is_deterministic() {
    let (cs1, _) = product_chain();
    let (cs2, _) = product_chain();
    assert_eq!(cs1.digest().unwrap(), cs2.digest().unwrap());

    let mut cs3 = cs2.clone();
    cs3.add_copy_constraint((Var::witness(0, 0), Var::witness(1, 1)));
    assert_ne!(cs1.digest().unwrap(), cs3.digest().unwrap());
  }
}
