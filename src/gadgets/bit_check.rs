// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! Booleanity constraint `X·(X−1) = 0`.
use crate::plonk::{ConstraintHandle, Expression, PlonkCS, Var};
use ff::PrimeField;

/// Constrains a cell to hold 0 or 1. Occupies no rows of its own: the
/// constraint is meant to be bound into the caller's gate.
pub struct BitCheck;

impl BitCheck {
  /// The booleanity polynomial of `x`.
  pub fn expression<F: PrimeField>(x: Var) -> Expression<F> {
    Expression::from(x) * (Expression::from(x) - Expression::one())
  }

  /// Registers the booleanity constraint of `x`.
  pub fn generate_circuit<F: PrimeField>(cs: &mut PlonkCS<F>, x: Var) -> ConstraintHandle {
    cs.add_constraint(Self::expression(x))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::plonk::{ArithmetizationParams, AssignmentTable};
  use halo2curves::pasta::Fp;

  #[test]
  fn test_bit_check() {
    let mut cs = PlonkCS::<Fp>::new();
    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    let s = table.get_or_allocate_selector(0x42, 1).first;
    let c = BitCheck::generate_circuit(&mut cs, Var::rotated(0, 0));
    cs.add_gate(s, vec![c]);

    for (row, v) in [0u64, 1, 1, 0].into_iter().enumerate() {
      table.assign_witness(0, row, Fp::from(v)).unwrap();
      table.enable_selector(s, row).unwrap();
    }
    assert!(cs.is_sat(&table).is_ok());

    table.assign_witness(0, 2, Fp::from(2)).unwrap();
    assert!(cs.is_sat(&table).is_err());
  }
}
