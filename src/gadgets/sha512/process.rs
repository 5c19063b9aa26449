// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! One SHA-512 compression of a 16-word block into an 8-word state.
//!
//! | row | W0..W3 | W4..W7 |
//! |---|---|---|
//! | 0 | state[0..4] | state[4..8] |
//! | 1 | words[0..4] | words[4..8] |
//! | 2 | words[8..12] | words[12..16] |
//! | 3 | working[0..4] | state[0..4] |
//! | 4 | out[0..4] | carry[0..4] |
//! | 5 | working[4..8] | state[4..8] |
//! | 6 | out[4..8] | carry[4..8] |
//!
//! The 80 rounds producing `working` are computed natively; the gate on rows 4
//! and 6 constrains the feed-forward `out + 2^64·carry = working + state` with
//! boolean carries.
use super::native;
use crate::{
  errors::BlueprintError,
  gadgets::{
    BitCheck,
    util::{pow2, to_u64},
  },
  plonk::{AssignmentTable, Expression, Gadget, PlonkCS, Var},
};
use ff::PrimeFieldBits;
use tracing::trace;

const LANES: usize = 4;

/// The compression gadget.
pub struct Sha512Process;

/// Inputs of [`Sha512Process`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sha512ProcessParams {
  /// chaining state
  pub input_state: [Var; 8],
  /// message block
  pub input_words: [Var; 16],
}

/// Output of a compression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sha512ProcessOutput {
  /// the next chaining state
  pub output_state: [Var; 8],
}

impl Sha512Process {
  /// Selector seed of the feed-forward gate.
  pub const SELECTOR_SEED: u64 = 0x0f15;

  fn input_cell(index: usize, start_row: usize) -> Var {
    Var::witness(index % 8, start_row + index / 8)
  }

  fn generate_gates<F: PrimeFieldBits>(cs: &mut PlonkCS<F>, selector: usize) {
    let mut constraints = Vec::with_capacity(2 * LANES);
    for lane in 0..LANES {
      let out = Expression::from(Var::rotated(lane, 0));
      let carry = Var::rotated(LANES + lane, 0);
      let working = Expression::from(Var::rotated(lane, -1));
      let state = Expression::from(Var::rotated(LANES + lane, -1));
      let sum = out + Expression::from(carry).scale(pow2(64)) - working - state;
      constraints.push(cs.add_constraint(sum));
      constraints.push(BitCheck::generate_circuit(cs, carry));
    }
    cs.add_gate(selector, constraints);
  }
}

impl<F: PrimeFieldBits> Gadget<F> for Sha512Process {
  type Params = Sha512ProcessParams;
  type Output = Sha512ProcessOutput;

  const ROWS_AMOUNT: usize = 7;
  const GATES_AMOUNT: usize = 1;

  fn result(_params: &Self::Params, start_row: usize) -> Self::Output {
    Sha512ProcessOutput {
      output_state: core::array::from_fn(|i| {
        Var::witness(i % LANES, start_row + 4 + 2 * (i / LANES))
      }),
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
      Self::generate_gates(cs, selector.first);
    }
    table.enable_selector(selector.first, start_row + 4)?;
    table.enable_selector(selector.first, start_row + 6)?;

    let inputs = params.input_state.iter().chain(params.input_words.iter());
    for (i, input) in inputs.enumerate() {
      cs.add_copy_constraint((*input, Self::input_cell(i, start_row)));
    }
    for i in 0..8 {
      let copy_row = start_row + 3 + 2 * (i / LANES);
      cs.add_copy_constraint((
        Self::input_cell(i, start_row),
        Var::witness(LANES + i % LANES, copy_row),
      ));
    }
    Ok(<Self as Gadget<F>>::result(params, start_row))
  }

  fn generate_assignments(
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let mut state = [0u64; 8];
    for (i, input) in params.input_state.iter().enumerate() {
      let value = table.copy(*input, Self::input_cell(i, start_row))?;
      state[i] = to_u64(&value, "sha512 state word")?;
    }
    let mut block = [0u64; 16];
    for (i, input) in params.input_words.iter().enumerate() {
      let value = table.copy(*input, Self::input_cell(8 + i, start_row))?;
      block[i] = to_u64(&value, "sha512 message word")?;
    }

    let working = native::rounds(&state, &block);
    trace!(start_row, "sha512 compression");
    for i in 0..8 {
      let row = start_row + 3 + 2 * (i / LANES);
      let lane = i % LANES;
      let (out, carry) = working[i].overflowing_add(state[i]);
      table.assign_witness(lane, row, F::from(working[i]))?;
      table.assign_witness(LANES + lane, row, F::from(state[i]))?;
      table.assign_witness(lane, row + 1, F::from(out))?;
      table.assign_witness(LANES + lane, row + 1, F::from(u64::from(carry)))?;
    }
    Ok(<Self as Gadget<F>>::result(params, start_row))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::plonk::{ArithmetizationParams, test_utils::run_gadget};
  use halo2curves::pasta::Fp;

  fn setup(state: [u64; 8], block: [u64; 16]) -> (AssignmentTable<Fp>, Sha512ProcessParams) {
    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    for (row, v) in state.iter().chain(block.iter()).enumerate() {
      table.assign_public_input(0, row, Fp::from(*v)).unwrap();
    }
    let params = Sha512ProcessParams {
      input_state: core::array::from_fn(|i| Var::public_input(0, i)),
      input_words: core::array::from_fn(|i| Var::public_input(0, 8 + i)),
    };
    (table, params)
  }

  #[test]
  fn test_process_matches_native() {
    let block: [u64; 16] =
      core::array::from_fn(|i| (i as u64 + 1).wrapping_mul(0x9e3779b97f4a7c15));
    let (mut table, params) = setup(native::IV, block);
    let (cs, out) = run_gadget::<Fp, Sha512Process>(&mut table, &params, 0).unwrap();
    assert!(cs.is_sat(&table).is_ok());

    let expected = native::compress(&native::IV, &block);
    for (var, word) in out.output_state.iter().zip(expected) {
      assert_eq!(table.value(*var), Ok(Fp::from(word)));
    }
  }

  #[test]
  fn test_wrong_carry_is_unsat() {
    let (mut table, params) = setup(native::IV, [0u64; 16]);
    let (cs, out) = run_gadget::<Fp, Sha512Process>(&mut table, &params, 0).unwrap();
    let v = table.value(out.output_state[0]).unwrap();
    table.assign(out.output_state[0], v + pow2::<Fp>(64)).unwrap();
    assert!(cs.is_sat(&table).is_err());
  }

  #[test]
  fn test_wide_word_is_rejected() {
    let (mut table, params) = setup(native::IV, [0u64; 16]);
    table.assign_public_input(0, 8, pow2::<Fp>(64)).unwrap();
    assert!(matches!(
      run_gadget::<Fp, Sha512Process>(&mut table, &params, 0),
      Err(BlueprintError::ValueOutOfRange { .. })
    ));
  }
}
