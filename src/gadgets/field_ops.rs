// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! One-row binary field operations: addition, subtraction, multiplication.
//!
//! Layout: `W0 = x`, `W1 = y`, `W2 = x ∘ y`, with `x` and `y` copy-constrained
//! to the caller's variables.
use crate::{
  errors::BlueprintError,
  plonk::{AssignmentTable, Expression, Gadget, PlonkCS, Var},
};
use core::marker::PhantomData;
use ff::PrimeField;

/// A binary operation over the field, in and out of circuit.
pub trait BinaryOperation {
  /// Selector seed of the gadget computing this operation.
  const SELECTOR_SEED: u64;

  /// Native evaluation.
  fn compute<F: PrimeField>(x: F, y: F) -> F;

  /// The expression the output cell must equal.
  fn relation<F: PrimeField>(x: Expression<F>, y: Expression<F>) -> Expression<F>;
}

/// `x + y`
pub struct Add;
/// `x - y`
pub struct Sub;
/// `x * y`
pub struct Mul;

impl BinaryOperation for Add {
  const SELECTOR_SEED: u64 = 0x0f06;
  fn compute<F: PrimeField>(x: F, y: F) -> F {
    x + y
  }
  fn relation<F: PrimeField>(x: Expression<F>, y: Expression<F>) -> Expression<F> {
    x + y
  }
}

impl BinaryOperation for Sub {
  const SELECTOR_SEED: u64 = 0x0f07;
  fn compute<F: PrimeField>(x: F, y: F) -> F {
    x - y
  }
  fn relation<F: PrimeField>(x: Expression<F>, y: Expression<F>) -> Expression<F> {
    x - y
  }
}

impl BinaryOperation for Mul {
  const SELECTOR_SEED: u64 = 0x0f08;
  fn compute<F: PrimeField>(x: F, y: F) -> F {
    x * y
  }
  fn relation<F: PrimeField>(x: Expression<F>, y: Expression<F>) -> Expression<F> {
    x * y
  }
}

/// Operands of a binary gadget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinaryParams {
  /// left operand
  pub x: Var,
  /// right operand
  pub y: Var,
}

/// Result cell of a binary gadget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinaryOutput {
  /// `x ∘ y`
  pub output: Var,
}

/// A one-row gadget applying `Op`.
pub struct BinaryGadget<Op>(PhantomData<Op>);

/// `x + y` in one row.
pub type Addition = BinaryGadget<Add>;
/// `x - y` in one row.
pub type Subtraction = BinaryGadget<Sub>;
/// `x * y` in one row.
pub type Multiplication = BinaryGadget<Mul>;

impl<F: PrimeField, Op: BinaryOperation> Gadget<F> for BinaryGadget<Op> {
  type Params = BinaryParams;
  type Output = BinaryOutput;

  const ROWS_AMOUNT: usize = 1;
  const GATES_AMOUNT: usize = 1;

  fn result(_params: &Self::Params, start_row: usize) -> Self::Output {
    BinaryOutput {
      output: Var::witness(2, start_row),
    }
  }

  fn generate_circuit(
    cs: &mut PlonkCS<F>,
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let gates = <Self as Gadget<F>>::GATES_AMOUNT;
    let selector = table.get_or_allocate_selector(Op::SELECTOR_SEED, gates);
    if selector.fresh {
      let relation = Op::relation(Var::rotated(0, 0).into(), Var::rotated(1, 0).into());
      let c = cs.add_constraint(Expression::from(Var::rotated(2, 0)) - relation);
      cs.add_gate(selector.first, vec![c]);
    }
    table.enable_selector(selector.first, start_row)?;
    cs.add_copy_constraint((params.x, Var::witness(0, start_row)));
    cs.add_copy_constraint((params.y, Var::witness(1, start_row)));
    Ok(<Self as Gadget<F>>::result(params, start_row))
  }

  fn generate_assignments(
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let x = table.copy(params.x, Var::witness(0, start_row))?;
    let y = table.copy(params.y, Var::witness(1, start_row))?;
    table.assign_witness(2, start_row, Op::compute(x, y))?;
    Ok(<Self as Gadget<F>>::result(params, start_row))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::plonk::{ArithmetizationParams, test_utils::run_gadget};
  use halo2curves::pasta::Fp;

  fn check<G>(x: u64, y: u64, expected: Fp)
  where
    G: Gadget<Fp, Params = BinaryParams, Output = BinaryOutput>,
  {
    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    table.assign_public_input(0, 0, Fp::from(x)).unwrap();
    table.assign_public_input(0, 1, Fp::from(y)).unwrap();
    let params = BinaryParams {
      x: Var::public_input(0, 0),
      y: Var::public_input(0, 1),
    };
    let (cs, out) = run_gadget::<Fp, G>(&mut table, &params, 0).unwrap();
    assert!(cs.is_sat(&table).is_ok());
    assert_eq!(table.value(out.output), Ok(expected));
  }

  #[test]
  fn test_field_operations() {
    check::<Addition>(7, 5, Fp::from(12));
    check::<Subtraction>(7, 5, Fp::from(2));
    check::<Subtraction>(5, 7, -Fp::from(2));
    check::<Multiplication>(7, 5, Fp::from(35));
  }

  #[test]
  fn test_tampered_output_is_unsat() {
    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    table.assign_public_input(0, 0, Fp::from(3)).unwrap();
    table.assign_public_input(0, 1, Fp::from(4)).unwrap();
    let params = BinaryParams {
      x: Var::public_input(0, 0),
      y: Var::public_input(0, 1),
    };
    let (cs, out) = run_gadget::<Fp, Multiplication>(&mut table, &params, 0).unwrap();
    table.assign(out.output, Fp::from(13)).unwrap();
    assert!(cs.is_sat(&table).is_err());
  }
}
