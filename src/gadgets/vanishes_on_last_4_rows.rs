// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! The polynomial vanishing on the last four rows of a domain,
//! `(x − ω^(n−4))(x − ω^(n−3))(x − ω^(n−2))(x − ω^(n−1))`.
//!
//! A composite without gates of its own: row `start` holds `n − 4` in constant
//! column 0, followed by an exponentiation computing `ω^(n−4)`, three
//! multiplications for the next powers, four subtractions and a three-step
//! product.
use super::{BinaryParams, Exponentiation, ExponentiationParams, Multiplication, Subtraction};
use crate::{
  errors::BlueprintError,
  plonk::{AssignmentPass, AssignmentTable, CircuitPass, Gadget, GenerationPass, PlonkCS, Var},
};
use ff::PrimeFieldBits;

/// Evaluates the vanishing polynomial of the last four domain rows.
pub struct VanishesOnLast4Rows;

/// Inputs of [`VanishesOnLast4Rows`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VanishesParams {
  /// the evaluation point
  pub x: Var,
  /// the domain generator ω
  pub omega: Var,
  /// the domain size `n` (at least 4)
  pub domain_size: u64,
}

type Exp = Exponentiation<64>;

const BINARY_ROWS: usize = 1;

impl VanishesOnLast4Rows {
  fn generate<F: PrimeFieldBits, P: GenerationPass<F>>(
    pass: &mut P,
    table: &mut AssignmentTable<F>,
    params: &VanishesParams,
    start_row: usize,
  ) -> Result<Var, BlueprintError> {
    let exponent = params
      .domain_size
      .checked_sub(4)
      .ok_or_else(|| BlueprintError::ValueOutOfRange {
        reason: format!("domain size {} is smaller than 4", params.domain_size),
      })?;
    table.assign_constant(0, start_row, F::from(exponent))?;
    let mut row = start_row + 1;

    let exp_params = ExponentiationParams {
      base: params.omega,
      exponent: Var::constant(0, start_row),
    };
    let mut powers = vec![pass.generate::<Exp>(table, &exp_params, row)?];
    row += <Exp as Gadget<F>>::ROWS_AMOUNT;

    for _ in 0..3 {
      let last = powers[powers.len() - 1];
      let next = pass.generate::<Multiplication>(
        table,
        &BinaryParams {
          x: last,
          y: params.omega,
        },
        row,
      )?;
      powers.push(next.output);
      row += BINARY_ROWS;
    }

    let mut factors = Vec::with_capacity(powers.len());
    for power in powers {
      let factor = pass.generate::<Subtraction>(
        table,
        &BinaryParams {
          x: params.x,
          y: power,
        },
        row,
      )?;
      factors.push(factor.output);
      row += BINARY_ROWS;
    }

    let mut product = factors[0];
    for factor in &factors[1..] {
      product = pass
        .generate::<Multiplication>(
          table,
          &BinaryParams {
            x: product,
            y: *factor,
          },
          row,
        )?
        .output;
      row += BINARY_ROWS;
    }

    assert_eq!(row, start_row + <Self as Gadget<F>>::ROWS_AMOUNT);
    Ok(product)
  }
}

impl<F: PrimeFieldBits> Gadget<F> for VanishesOnLast4Rows {
  type Params = VanishesParams;
  type Output = Var;

  const ROWS_AMOUNT: usize = 1 + <Exp as Gadget<F>>::ROWS_AMOUNT + 3 + 4 + 3;
  const GATES_AMOUNT: usize = 0;

  fn result(_params: &Self::Params, start_row: usize) -> Self::Output {
    let last_row = start_row + <Self as Gadget<F>>::ROWS_AMOUNT - 1;
    <Multiplication as Gadget<F>>::result(
      &BinaryParams {
        x: Var::witness(0, last_row),
        y: Var::witness(1, last_row),
      },
      last_row,
    )
    .output
  }

  fn generate_circuit(
    cs: &mut PlonkCS<F>,
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    Self::generate(&mut CircuitPass(cs), table, params, start_row)
  }

  fn generate_assignments(
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    Self::generate(&mut AssignmentPass, table, params, start_row)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::plonk::{ArithmetizationParams, test_utils::run_gadget};
  use ff::{Field, PrimeField};
  use halo2curves::pasta::Fp;

  const LOG_N: u32 = 4;

  fn omega() -> Fp {
    Fp::ROOT_OF_UNITY.pow_vartime([1u64 << (Fp::S - LOG_N)])
  }

  fn run(x: Fp) -> (AssignmentTable<Fp>, Var, bool) {
    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    table.assign_public_input(0, 0, x).unwrap();
    table.assign_public_input(0, 1, omega()).unwrap();
    let params = VanishesParams {
      x: Var::public_input(0, 0),
      omega: Var::public_input(0, 1),
      domain_size: 1 << LOG_N,
    };
    let (cs, out) = run_gadget::<Fp, VanishesOnLast4Rows>(&mut table, &params, 0).unwrap();
    assert_eq!(out, <VanishesOnLast4Rows as Gadget<Fp>>::result(&params, 0));
    let sat = cs.is_sat(&table).is_ok();
    (table, out, sat)
  }

  #[test]
  fn test_vanishes_on_last_row() {
    let n = 1u64 << LOG_N;
    for k in n - 4..n {
      let (table, out, sat) = run(omega().pow_vartime([k]));
      assert_eq!(table.value(out), Ok(Fp::ZERO));
      assert!(sat);
    }
    let (table, out, _) = run(omega().pow_vartime([n - 5]));
    assert_ne!(table.value(out), Ok(Fp::ZERO));
  }

  #[test]
  fn test_matches_native_product() {
    let x = Fp::from(1234567);
    let n = 1u64 << LOG_N;
    let expected = (n - 4..n).fold(Fp::ONE, |acc, k| acc * (x - omega().pow_vartime([k])));
    let (table, out, sat) = run(x);
    assert_eq!(table.value(out), Ok(expected));
    assert!(sat);
    assert_eq!(<VanishesOnLast4Rows as Gadget<Fp>>::ROWS_AMOUNT, 76);
  }

  #[test]
  fn test_small_domain_is_rejected() {
    let mut table = AssignmentTable::<Fp>::new(ArithmetizationParams::default());
    let params = VanishesParams {
      x: Var::public_input(0, 0),
      omega: Var::public_input(0, 1),
      domain_size: 2,
    };
    assert!(matches!(
      run_gadget::<Fp, VanishesOnLast4Rows>(&mut table, &params, 0),
      Err(BlueprintError::ValueOutOfRange { .. })
    ));
  }
}
