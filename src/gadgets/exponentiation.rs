// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! `base^exponent` for an exponent fixed at circuit-generation time.
//!
//! Square-and-multiply, most significant bit first. Row `start` holds the
//! accumulator `1` (tied to a constant) in `W0` and the base in `W1`; row
//! `start + 1 + i` holds bit `i` of the exponent in constant column 1 and the
//! accumulator after that bit in `W0`. The gate, active on rows
//! `start..start + BITS`, enforces
//! `W0(+1) = W0² · (c·W1 + 1 − c)` and `W1(+1) = W1` with `c` the next row's bit.
use super::util::to_u64;
use crate::{
  errors::BlueprintError,
  plonk::{AssignmentTable, Expression, Gadget, PlonkCS, Var},
};
use ff::PrimeFieldBits;
use tracing::trace;

/// Exponentiation by a `BITS`-bit exponent.
pub struct Exponentiation<const BITS: usize = 64>;

/// Inputs of [`Exponentiation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExponentiationParams {
  /// the base
  pub base: Var,
  /// a constant cell holding the exponent
  pub exponent: Var,
}

impl<const BITS: usize> Exponentiation<BITS> {
  /// Selector seed of the square-and-multiply gate.
  pub const SELECTOR_SEED: u64 = 0x0f09;

  const CHECKED_BITS: usize = {
    assert!(BITS > 0 && BITS <= 64);
    BITS
  };

  fn exponent<F: PrimeFieldBits>(
    table: &AssignmentTable<F>,
    params: &ExponentiationParams,
  ) -> Result<u64, BlueprintError> {
    let exponent = to_u64(&table.value(params.exponent)?, "exponent")?;
    if exponent.checked_shr(BITS as u32).unwrap_or(0) != 0 {
      return Err(BlueprintError::ValueOutOfRange {
        reason: format!("exponent {exponent} does not fit in {BITS} bits"),
      });
    }
    Ok(exponent)
  }

  fn bit(exponent: u64, i: usize) -> u64 {
    (exponent >> (Self::CHECKED_BITS - 1 - i)) & 1
  }

  fn generate_gates<F: PrimeFieldBits>(cs: &mut PlonkCS<F>, selector: usize) {
    let acc = Expression::<F>::from(Var::rotated(0, 0));
    let base = Expression::<F>::from(Var::rotated(1, 0));
    let bit = Expression::<F>::from(Var::rotated_constant(1, 1));
    let factor = bit.clone() * base.clone() + Expression::one() - bit;

    let step = Expression::from(Var::rotated(0, 1)) - acc.square() * factor;
    let carry_base = Expression::from(Var::rotated(1, 1)) - base;
    let constraints = vec![cs.add_constraint(step), cs.add_constraint(carry_base)];
    cs.add_gate(selector, constraints);
  }
}

impl<F: PrimeFieldBits, const BITS: usize> Gadget<F> for Exponentiation<BITS> {
  type Params = ExponentiationParams;
  type Output = Var;

  const ROWS_AMOUNT: usize = BITS + 1;
  const GATES_AMOUNT: usize = 1;

  fn result(_params: &Self::Params, start_row: usize) -> Self::Output {
    Var::witness(0, start_row + BITS)
  }

  fn generate_circuit(
    cs: &mut PlonkCS<F>,
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let exponent = Self::exponent(table, params)?;
    let selector = table.get_or_allocate_selector(Self::SELECTOR_SEED, 1);
    if selector.fresh {
      Self::generate_gates(cs, selector.first);
    }

    table.assign_constant(0, start_row, F::ONE)?;
    for i in 0..Self::CHECKED_BITS {
      table.assign_constant(1, start_row + 1 + i, F::from(Self::bit(exponent, i)))?;
      table.enable_selector(selector.first, start_row + i)?;
    }
    cs.add_copy_constraint((Var::constant(0, start_row), Var::witness(0, start_row)));
    cs.add_copy_constraint((params.base, Var::witness(1, start_row)));
    Ok(<Self as Gadget<F>>::result(params, start_row))
  }

  fn generate_assignments(
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let exponent = Self::exponent(table, params)?;
    let base = table.copy(params.base, Var::witness(1, start_row))?;
    trace!(start_row, exponent, "exponentiation");

    let mut acc = F::ONE;
    table.assign_witness(0, start_row, acc)?;
    for i in 0..BITS {
      acc = acc.square();
      if Self::bit(exponent, i) == 1 {
        acc *= base;
      }
      table.assign_witness(0, start_row + 1 + i, acc)?;
      table.assign_witness(1, start_row + 1 + i, base)?;
    }
    Ok(<Self as Gadget<F>>::result(params, start_row))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::plonk::{ArithmetizationParams, test_utils::run_gadget};
  use ff::Field;
  use halo2curves::pasta::Fp;

  fn params() -> ExponentiationParams {
    ExponentiationParams {
      base: Var::public_input(0, 0),
      exponent: Var::constant(2, 0),
    }
  }

  fn table(base: Fp, exponent: u64) -> AssignmentTable<Fp> {
    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    table.assign_public_input(0, 0, base).unwrap();
    table.assign_constant(2, 0, Fp::from(exponent)).unwrap();
    table
  }

  #[test]
  fn test_exponentiation() {
    for (base, exponent) in [(3u64, 13u64), (7, 0), (2, 1), (5, u64::MAX)] {
      let mut t = table(Fp::from(base), exponent);
      let (cs, out) = run_gadget::<Fp, Exponentiation>(&mut t, &params(), 0).unwrap();
      assert_eq!(t.value(out), Ok(Fp::from(base).pow_vartime([exponent])));
      assert!(cs.is_sat(&t).is_ok());
    }
  }

  #[test]
  fn test_narrow_exponent() {
    let mut t = table(Fp::from(3), 200);
    let (cs, out) = run_gadget::<Fp, Exponentiation<8>>(&mut t, &params(), 0).unwrap();
    assert_eq!(t.value(out), Ok(Fp::from(3).pow_vartime([200])));
    assert!(cs.is_sat(&t).is_ok());

    let mut t = table(Fp::from(3), 300);
    assert!(matches!(
      run_gadget::<Fp, Exponentiation<8>>(&mut t, &params(), 0),
      Err(BlueprintError::ValueOutOfRange { .. })
    ));
  }

  #[test]
  fn test_wrong_power_is_unsat() {
    let mut t = table(Fp::from(3), 13);
    let (cs, out) = run_gadget::<Fp, Exponentiation>(&mut t, &params(), 0).unwrap();
    t.assign(out, Fp::from(3).pow_vartime([12])).unwrap();
    assert!(cs.is_sat(&t).is_err());
  }
}
