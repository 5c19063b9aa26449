// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! Range check `0 <= x < 2^BITS` by byte-wise bit decomposition.
//!
//! Row `start` holds a zero accumulator (tied to a constant cell). Each of the
//! following `BITS / 8` rows holds eight bits `W1..W8`, most significant
//! first, and the accumulator `W0 = 256·W0(prev) + Σ bits`. The last
//! accumulator is copy-constrained to `x`.
use super::{BitCheck, util::to_biguint};
use crate::{
  errors::BlueprintError,
  plonk::{AssignmentTable, Expression, Gadget, PlonkCS, Var},
};
use ff::{PrimeField, PrimeFieldBits};

const BITS_PER_ROW: usize = 8;

/// Range check over `BITS` bits (`BITS` a positive multiple of 8).
pub struct RangeCheck<const BITS: usize>;

/// The value to range-check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeCheckParams {
  /// the checked variable
  pub x: Var,
}

impl<const BITS: usize> RangeCheck<BITS> {
  /// Selector seed of the byte-accumulation gate.
  pub const SELECTOR_SEED: u64 = 0x0f03;

  const CHUNKS: usize = {
    assert!(BITS > 0 && BITS % BITS_PER_ROW == 0);
    BITS / BITS_PER_ROW
  };

  fn generate_gates<F: PrimeField>(cs: &mut PlonkCS<F>, selector: usize) {
    let chunk = Expression::sum((0..BITS_PER_ROW).map(|j| {
      Expression::from(Var::rotated(1 + j, 0)).scale(F::from(1 << (BITS_PER_ROW - 1 - j)))
    }));
    let accumulate = Expression::from(Var::rotated(0, 0))
      - Expression::from(Var::rotated(0, -1)).scale(F::from(1 << BITS_PER_ROW))
      - chunk;

    let mut constraints = vec![cs.add_constraint(accumulate)];
    for j in 0..BITS_PER_ROW {
      constraints.push(BitCheck::generate_circuit(cs, Var::rotated(1 + j, 0)));
    }
    cs.add_gate(selector, constraints);
  }
}

impl<F: PrimeFieldBits, const BITS: usize> Gadget<F> for RangeCheck<BITS> {
  type Params = RangeCheckParams;
  type Output = ();

  const ROWS_AMOUNT: usize = Self::CHUNKS + 1;
  const GATES_AMOUNT: usize = 1;

  fn result(_params: &Self::Params, _start_row: usize) -> Self::Output {}

  fn generate_circuit(
    cs: &mut PlonkCS<F>,
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let gates = <Self as Gadget<F>>::GATES_AMOUNT;
    let selector = table.get_or_allocate_selector(Self::SELECTOR_SEED, gates);
    if selector.fresh {
      Self::generate_gates(cs, selector.first);
    }

    table.assign_constant(0, start_row, F::ZERO)?;
    cs.add_copy_constraint((Var::constant(0, start_row), Var::witness(0, start_row)));
    for row in start_row + 1..start_row + Self::CHUNKS + 1 {
      table.enable_selector(selector.first, row)?;
    }
    cs.add_copy_constraint((params.x, Var::witness(0, start_row + Self::CHUNKS)));
    Ok(())
  }

  fn generate_assignments(
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let x = to_biguint(&table.value(params.x)?);

    let mut acc = F::ZERO;
    table.assign_witness(0, start_row, acc)?;
    for chunk in 0..Self::CHUNKS {
      let row = start_row + 1 + chunk;
      let top = BITS - chunk * BITS_PER_ROW;
      for j in 0..BITS_PER_ROW {
        let bit = F::from(u64::from(x.bit((top - 1 - j) as u64)));
        table.assign_witness(1 + j, row, bit)?;
        acc = acc.double() + bit;
      }
      table.assign_witness(0, row, acc)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::plonk::{ArithmetizationParams, test_utils::run_gadget};
  use ff::Field;
  use halo2curves::pasta::Fp;

  fn range_check_64(x: Fp) -> Result<(), BlueprintError> {
    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    table.assign_public_input(0, 0, x)?;
    let params = RangeCheckParams {
      x: Var::public_input(0, 0),
    };
    let (cs, ()) = run_gadget::<Fp, RangeCheck<64>>(&mut table, &params, 1)?;
    assert_eq!(<RangeCheck<64> as Gadget<Fp>>::ROWS_AMOUNT, 9);
    cs.is_sat(&table)
  }

  #[test]
  fn test_range_check_in_range() {
    assert!(range_check_64(Fp::from(35000)).is_ok());
    assert!(range_check_64(Fp::ZERO).is_ok());
    assert!(range_check_64(Fp::from(u64::MAX)).is_ok());
  }

  #[test]
  fn test_range_check_out_of_range() {
    let two_pow_64 = Fp::from(u64::MAX) + Fp::ONE;
    assert!(matches!(
      range_check_64(two_pow_64),
      Err(BlueprintError::UnSat { .. })
    ));
    assert!(range_check_64(-Fp::ONE).is_err());
  }

  #[test]
  fn test_range_check_narrow() {
    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    table.assign_public_input(0, 0, Fp::from(300)).unwrap();
    let params = RangeCheckParams {
      x: Var::public_input(0, 0),
    };
    let (cs, ()) = run_gadget::<Fp, RangeCheck<8>>(&mut table, &params, 0).unwrap();
    assert!(cs.is_sat(&table).is_err());
  }
}
