// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! SHA-512 of an `(R, A, M)` triple given as 64-bit-ish limbs, as used when
//! hashing a signature's `R`, the public key `A` and the message scalar `M`.
//!
//! The limbs are decomposed into twenty message words over five row triples
//! (see [`schedule`]), padded into two blocks and compressed twice by
//! [`Sha512Process`]. Constant column 0 holds the IV, a zero and the stream
//! length at the first ten rows.
use crate::{
  errors::BlueprintError,
  gadgets::util::to_biguint,
  plonk::{AssignmentTable, Expression, Gadget, PlonkCS, Var},
  start_span,
};
use ff::PrimeFieldBits;
use itertools::Itertools;
use num_traits::ToPrimitive;
use tracing::info;

pub mod native;
mod process;
pub mod schedule;

pub use process::{Sha512Process, Sha512ProcessOutput, Sha512ProcessParams};
use schedule::{
  BORROWED_HEAD_CELL, DECOMPOSITION_ROWS, LIMBS, LimbParts, MESSAGE_BITS, SCHEDULE, SLOTS,
  TRIPLES, chunk_cell, head_cell, limb_cell, limb_terms, recomposition, split_limb, tail_cell,
  word_cell, word_padding, word_terms, words,
};

/// A curve point given by four coordinate limbs per coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VarPoint {
  /// x-coordinate limbs, least significant first
  pub x: [Var; 4],
  /// y-coordinate limbs, least significant first
  pub y: [Var; 4],
}

/// Inputs of [`Sha512`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sha512Params {
  /// the point `R`
  pub r: VarPoint,
  /// the point `A`
  pub a: VarPoint,
  /// the scalar `M`
  pub m: [Var; 4],
}

impl Sha512Params {
  /// The twenty limbs in stream order `R.x ‖ R.y ‖ A.x ‖ A.y ‖ M`.
  pub fn limbs(&self) -> [Var; LIMBS] {
    let groups = [self.r.x, self.r.y, self.a.x, self.a.y, self.m];
    core::array::from_fn(|i| groups[i / SLOTS][i % SLOTS])
  }
}

/// The SHA-512 composite.
pub struct Sha512;

type Process = Sha512Process;

const IV_ROWS: usize = 8;
const ZERO_ROW: usize = IV_ROWS;
const LENGTH_ROW: usize = IV_ROWS + 1;

impl Sha512 {
  /// Selector seed of the decomposition gates.
  pub const SELECTOR_SEED: u64 = 0x0f14;

  fn middle_row(start_row: usize, triple: usize) -> usize {
    start_row + 3 * triple + 1
  }

  fn assign_constants<F: PrimeFieldBits>(
    table: &mut AssignmentTable<F>,
    start_row: usize,
  ) -> Result<(), BlueprintError> {
    for (i, word) in native::IV.iter().enumerate() {
      table.assign_constant(0, start_row + i, F::from(*word))?;
    }
    table.assign_constant(0, start_row + ZERO_ROW, F::ZERO)?;
    table.assign_constant(0, start_row + LENGTH_ROW, F::from(MESSAGE_BITS))?;
    Ok(())
  }

  fn word_var(start_row: usize, word: usize) -> Var {
    word_cell(word % SLOTS).at(Self::middle_row(start_row, word / SLOTS))
  }

  fn process_params(start_row: usize) -> [Sha512ProcessParams; 2] {
    let words: [Var; LIMBS] = core::array::from_fn(|j| Self::word_var(start_row, j));
    let zero = Var::constant(0, start_row + ZERO_ROW);
    let length = Var::constant(0, start_row + LENGTH_ROW);

    let first = Sha512ProcessParams {
      input_state: core::array::from_fn(|i| Var::constant(0, start_row + i)),
      input_words: core::array::from_fn(|i| words[i]),
    };
    let mut second_words = [zero; 16];
    second_words[..LIMBS - 16].copy_from_slice(&words[16..]);
    second_words[15] = length;
    let second = Sha512ProcessParams {
      // filled in from the first compression's output
      input_state: first.input_state,
      input_words: second_words,
    };
    [first, second]
  }

  fn generate_gates<F: PrimeFieldBits>(cs: &mut PlonkCS<F>, first_selector: usize) {
    for triple in 0..TRIPLES {
      let mut constraints = Vec::with_capacity(2 * SLOTS);
      for slot in 0..SLOTS {
        let index = SLOTS * triple + slot;
        let limb = Expression::<F>::from(limb_cell(slot).rotated());
        constraints.push(cs.add_constraint(limb - recomposition(&limb_terms(index))));

        let word = Expression::from(word_cell(slot).rotated())
          - Expression::Constant(F::from(word_padding(index)));
        constraints.push(cs.add_constraint(word - recomposition(&word_terms(index))));
      }
      cs.add_gate(first_selector + triple, constraints);
    }
  }
}

impl<F: PrimeFieldBits> Gadget<F> for Sha512 {
  type Params = Sha512Params;
  type Output = Sha512ProcessOutput;

  const ROWS_AMOUNT: usize = DECOMPOSITION_ROWS + 2 * <Process as Gadget<F>>::ROWS_AMOUNT;
  const GATES_AMOUNT: usize = TRIPLES;

  fn result(_params: &Self::Params, start_row: usize) -> Self::Output {
    let second = start_row + DECOMPOSITION_ROWS + <Process as Gadget<F>>::ROWS_AMOUNT;
    let [_, second_params] = Self::process_params(start_row);
    <Process as Gadget<F>>::result(&second_params, second)
  }

  fn generate_circuit(
    cs: &mut PlonkCS<F>,
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let (_sha_span, sha_t) = start_span!("sha512_generate_circuit", start_row);
    let gates = <Self as Gadget<F>>::GATES_AMOUNT;
    let selector = table.get_or_allocate_selector(Self::SELECTOR_SEED, gates);
    if selector.fresh {
      Self::generate_gates(cs, selector.first);
    }

    Self::assign_constants(table, start_row)?;
    let limbs = params.limbs();
    for triple in 0..TRIPLES {
      let middle = Self::middle_row(start_row, triple);
      table.enable_selector(selector.first + triple, middle)?;
      for slot in 0..SLOTS {
        cs.add_copy_constraint((limbs[SLOTS * triple + slot], limb_cell(slot).at(middle)));
      }
      if triple + 1 < TRIPLES && SCHEDULE[SLOTS * (triple + 1)].head > 0 {
        let next = Self::middle_row(start_row, triple + 1);
        cs.add_copy_constraint((BORROWED_HEAD_CELL.at(middle), head_cell(0).at(next)));
      }
    }

    let mut row = start_row + DECOMPOSITION_ROWS;
    let [first, mut second] = Self::process_params(start_row);
    let chained = Process::generate_circuit(cs, table, &first, row)?;
    row += <Process as Gadget<F>>::ROWS_AMOUNT;
    second.input_state = chained.output_state;
    let output = Process::generate_circuit(cs, table, &second, row)?;
    row += <Process as Gadget<F>>::ROWS_AMOUNT;

    assert_eq!(row, start_row + <Self as Gadget<F>>::ROWS_AMOUNT);
    info!(elapsed_ms = %sha_t.elapsed().as_millis(), "sha512_generate_circuit");
    Ok(output)
  }

  fn generate_assignments(
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let (_sha_span, sha_t) = start_span!("sha512_generate_assignments", start_row);
    Self::assign_constants(table, start_row)?;

    let limbs = params.limbs();
    let mut parts = [LimbParts::default(); LIMBS];
    for (i, limb) in limbs.iter().enumerate() {
      let slot = i % SLOTS;
      let middle = Self::middle_row(start_row, i / SLOTS);
      let value = table.copy(*limb, limb_cell(slot).at(middle))?;
      let value = to_biguint(&value)
        .to_u128()
        .ok_or_else(|| BlueprintError::ValueOutOfRange {
          reason: format!("limb {i} does not fit in 128 bits"),
        })?;
      parts[i] = split_limb(i, value)?;

      for (c, chunk) in parts[i].chunks.iter().enumerate() {
        table.assign(chunk_cell(slot, c).at(middle), F::from(*chunk))?;
      }
      if SCHEDULE[i].head > 0 {
        table.assign(head_cell(slot).at(middle), F::from(parts[i].head))?;
      }
      if SCHEDULE[i].tail > 0 {
        table.assign(tail_cell(slot).at(middle), F::from(parts[i].tail))?;
      }
    }

    for (j, word) in words(&parts).iter().enumerate() {
      table.assign(Self::word_var(start_row, j), F::from(*word))?;
    }
    for (triple, next_triple) in (0..TRIPLES).tuple_windows() {
      if SCHEDULE[SLOTS * next_triple].head > 0 {
        let middle = Self::middle_row(start_row, triple);
        let next = Self::middle_row(start_row, next_triple);
        table.copy(head_cell(0).at(next), BORROWED_HEAD_CELL.at(middle))?;
      }
    }

    let mut row = start_row + DECOMPOSITION_ROWS;
    let [first, mut second] = Self::process_params(start_row);
    let chained = Process::generate_assignments(table, &first, row)?;
    row += <Process as Gadget<F>>::ROWS_AMOUNT;
    second.input_state = chained.output_state;
    let output = Process::generate_assignments(table, &second, row)?;
    row += <Process as Gadget<F>>::ROWS_AMOUNT;

    assert_eq!(row, start_row + <Self as Gadget<F>>::ROWS_AMOUNT);
    info!(elapsed_ms = %sha_t.elapsed().as_millis(), "sha512_generate_assignments");
    Ok(output)
  }
}
