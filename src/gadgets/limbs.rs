// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! Conversions between a field element and 64-bit limbs.
//!
//! [`ToLimbs`] lays out `W0 = value`, `W1..W4 = limbs` (little-endian) and
//! constrains `W0 = Σ W(1+i)·2^(64i)`. [`FromLimbs`] lays out `W0 = low`,
//! `W1 = high`, `W2 = low + 2^64·high`. Limb widths are not range-checked here.
use super::util::{pow2, to_biguint};
use crate::{
  errors::BlueprintError,
  plonk::{AssignmentTable, Expression, Gadget, PlonkCS, Var},
};
use ff::{PrimeField, PrimeFieldBits};

const LIMB_BITS: usize = 64;
const LIMBS: usize = 4;

/// Splits a value into four 64-bit limbs.
pub struct ToLimbs;

/// Limb cells produced by [`ToLimbs`], least significant first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToLimbsOutput {
  /// the limbs
  pub limbs: [Var; LIMBS],
}

impl ToLimbs {
  /// Selector seed of the unpacking gate.
  pub const SELECTOR_SEED: u64 = 0x0f0a;
}

impl<F: PrimeFieldBits> Gadget<F> for ToLimbs {
  type Params = Var;
  type Output = ToLimbsOutput;

  const ROWS_AMOUNT: usize = 1;
  const GATES_AMOUNT: usize = 1;

  fn result(_params: &Self::Params, start_row: usize) -> Self::Output {
    ToLimbsOutput {
      limbs: core::array::from_fn(|i| Var::witness(1 + i, start_row)),
    }
  }

  fn generate_circuit(
    cs: &mut PlonkCS<F>,
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let selector = table.get_or_allocate_selector(Self::SELECTOR_SEED, 1);
    if selector.fresh {
      let packed = Expression::sum(
        (0..LIMBS).map(|i| Expression::from(Var::rotated(1 + i, 0)).scale(pow2(LIMB_BITS * i))),
      );
      let c = cs.add_constraint(Expression::from(Var::rotated(0, 0)) - packed);
      cs.add_gate(selector.first, vec![c]);
    }
    table.enable_selector(selector.first, start_row)?;
    cs.add_copy_constraint((*params, Var::witness(0, start_row)));
    Ok(<Self as Gadget<F>>::result(params, start_row))
  }

  fn generate_assignments(
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let value = table.copy(*params, Var::witness(0, start_row))?;
    let mut digits = to_biguint(&value).iter_u64_digits().collect::<Vec<_>>();
    digits.resize(LIMBS, 0);
    for (i, digit) in digits.into_iter().enumerate() {
      table.assign_witness(1 + i, start_row, F::from(digit))?;
    }
    Ok(<Self as Gadget<F>>::result(params, start_row))
  }
}

/// Packs two 64-bit limbs into `low + 2^64·high`.
pub struct FromLimbs;

/// The limbs to pack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FromLimbsParams {
  /// least significant limb
  pub low: Var,
  /// most significant limb
  pub high: Var,
}

impl FromLimbs {
  /// Selector seed of the packing gate.
  pub const SELECTOR_SEED: u64 = 0x0f0b;
}

impl<F: PrimeField> Gadget<F> for FromLimbs {
  type Params = FromLimbsParams;
  type Output = Var;

  const ROWS_AMOUNT: usize = 1;
  const GATES_AMOUNT: usize = 1;

  fn result(_params: &Self::Params, start_row: usize) -> Self::Output {
    Var::witness(2, start_row)
  }

  fn generate_circuit(
    cs: &mut PlonkCS<F>,
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let selector = table.get_or_allocate_selector(Self::SELECTOR_SEED, 1);
    if selector.fresh {
      let packed = Expression::from(Var::rotated(0, 0))
        + Expression::from(Var::rotated(1, 0)).scale(pow2(LIMB_BITS));
      let c = cs.add_constraint(Expression::from(Var::rotated(2, 0)) - packed);
      cs.add_gate(selector.first, vec![c]);
    }
    table.enable_selector(selector.first, start_row)?;
    cs.add_copy_constraint((params.low, Var::witness(0, start_row)));
    cs.add_copy_constraint((params.high, Var::witness(1, start_row)));
    Ok(<Self as Gadget<F>>::result(params, start_row))
  }

  fn generate_assignments(
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let low = table.copy(params.low, Var::witness(0, start_row))?;
    let high = table.copy(params.high, Var::witness(1, start_row))?;
    table.assign_witness(2, start_row, low + high * pow2::<F>(LIMB_BITS))?;
    Ok(<Self as Gadget<F>>::result(params, start_row))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::plonk::{ArithmetizationParams, test_utils::run_gadget};
  use ff::Field;
  use halo2curves::pasta::Fp;

  #[test]
  fn test_unpack_then_pack() {
    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    let value = -Fp::from(12345);
    table.assign_public_input(0, 0, value).unwrap();

    let mut cs = PlonkCS::new();
    let input = Var::public_input(0, 0);
    let unpacked = ToLimbs::generate_circuit(&mut cs, &mut table, &input, 0).unwrap();
    ToLimbs::generate_assignments(&mut table, &input, 0).unwrap();

    let limbs = unpacked.limbs.map(|l| table.value(l).unwrap());
    let recomposed = limbs
      .iter()
      .rev()
      .fold(Fp::ZERO, |acc, l| acc * pow2::<Fp>(64) + l);
    assert_eq!(recomposed, value);

    let params = FromLimbsParams {
      low: unpacked.limbs[0],
      high: unpacked.limbs[1],
    };
    let packed = FromLimbs::generate_circuit(&mut cs, &mut table, &params, 1).unwrap();
    FromLimbs::generate_assignments(&mut table, &params, 1).unwrap();
    assert_eq!(
      table.value(packed),
      Ok(limbs[0] + limbs[1] * pow2::<Fp>(64))
    );
    assert!(cs.is_sat(&table).is_ok());
  }

  #[test]
  fn test_small_value_has_zero_high_limbs() {
    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    table.assign_public_input(0, 0, Fp::from(7)).unwrap();
    let (cs, out) = run_gadget::<Fp, ToLimbs>(&mut table, &Var::public_input(0, 0), 0).unwrap();
    assert_eq!(table.value(out.limbs[0]), Ok(Fp::from(7)));
    for limb in &out.limbs[1..] {
      assert_eq!(table.value(*limb), Ok(Fp::ZERO));
    }
    assert!(cs.is_sat(&table).is_ok());

    table.assign(out.limbs[3], Fp::ONE).unwrap();
    assert!(cs.is_sat(&table).is_err());
  }
}
