// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! The Kimchi-shaped Poseidon permutation as a gadget, and the in-circuit
//! duplex sponge over it.
//!
//! Round `r` maps the state `s` to `MDS · s^7 + rc[r]`. In circuit the
//! permutation takes one row per round plus an output row: row `r` holds the
//! state entering round `r` in `W0..W2` and that round's constants in constant
//! columns `0..2`.
use super::{
  Addition, BinaryParams,
  poseidon::{PlonkSpongeConstantsKimchi, SpongeConstants, SpongeField, SpongeState, WIDTH},
};
use crate::{
  errors::BlueprintError,
  plonk::{AssignmentTable, Expression, Gadget, GenerationPass, PlonkCS, Var},
};
use core::array;

type SC = PlonkSpongeConstantsKimchi;

/// Number of rounds of the in-circuit permutation.
pub const ROUNDS: usize = SC::PERM_ROUNDS_FULL;

/// The permutation as a gadget.
pub struct Permutation;

impl Permutation {
  /// Selector seed of the round gate.
  pub const SELECTOR_SEED: u64 = 0x0f0c;

  fn generate_gates<F: SpongeField>(cs: &mut PlonkCS<F>, selector: usize) {
    let mds = &F::sponge_params().mds;
    let sboxed: Vec<Expression<F>> = (0..WIDTH)
      .map(|j| {
        let t = Expression::from(Var::rotated(j, 0));
        let t2 = t.clone().square();
        t * t2.clone() * t2.square()
      })
      .collect();

    let constraints = (0..WIDTH)
      .map(|i| {
        let mixed = Expression::sum(
          sboxed
            .iter()
            .enumerate()
            .map(|(j, s)| s.clone().scale(mds[i][j])),
        );
        let next = Expression::from(Var::rotated(i, 1));
        cs.add_constraint(next - mixed - Var::rotated_constant(i, 0))
      })
      .collect();
    cs.add_gate(selector, constraints);
  }
}

impl<F: SpongeField> Gadget<F> for Permutation {
  type Params = [Var; WIDTH];
  type Output = [Var; WIDTH];

  const ROWS_AMOUNT: usize = ROUNDS + 1;
  const GATES_AMOUNT: usize = 1;

  fn result(_params: &Self::Params, start_row: usize) -> Self::Output {
    array::from_fn(|i| Var::witness(i, start_row + ROUNDS))
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

    for (round, rc) in F::sponge_params().round_constants.iter().enumerate() {
      let row = start_row + round;
      for (j, c) in rc.iter().enumerate() {
        table.assign_constant(j, row, *c)?;
      }
      table.enable_selector(selector.first, row)?;
    }
    for (i, input) in params.iter().enumerate() {
      cs.add_copy_constraint((*input, Var::witness(i, start_row)));
    }
    Ok(<Self as Gadget<F>>::result(params, start_row))
  }

  fn generate_assignments(
    table: &mut AssignmentTable<F>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let sponge_params = F::sponge_params();
    let mut state = [F::ZERO; WIDTH];
    for (i, input) in params.iter().enumerate() {
      state[i] = table.copy(*input, Var::witness(i, start_row))?;
    }

    for round in 0..ROUNDS {
      super::poseidon::full_round::<F, SC>(sponge_params, &mut state, round);
      for (i, v) in state.iter().enumerate() {
        table.assign_witness(i, start_row + round + 1, *v)?;
      }
    }
    Ok(<Self as Gadget<F>>::result(params, start_row))
  }
}

/// An in-circuit sponge: the state is three table variables plus the duplex
/// position, which both passes track identically.
///
/// Every absorb reserves the rows of a permutation followed by one addition
/// row, and every squeeze reserves the rows of a permutation; the permutation
/// rows stay empty when the duplex does not permute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArithmeticSponge {
  state: [Var; WIDTH],
  sponge_state: SpongeState,
}

impl ArithmeticSponge {
  /// Rows consumed by [`absorb`](Self::absorb).
  pub const ABSORB_ROWS: usize = ROUNDS + 1 + 1;

  /// Rows consumed by [`squeeze`](Self::squeeze).
  pub const SQUEEZE_ROWS: usize = ROUNDS + 1;

  /// A sponge whose three lanes all start at `zero`, a cell holding zero.
  pub fn new(zero: Var) -> Self {
    ArithmeticSponge {
      state: [zero; WIDTH],
      sponge_state: SpongeState::Absorbed(0),
    }
  }

  fn permute<F: SpongeField, P: GenerationPass<F>>(
    &mut self,
    pass: &mut P,
    table: &mut AssignmentTable<F>,
    row: usize,
  ) -> Result<(), BlueprintError> {
    self.state = pass.generate::<Permutation>(table, &self.state, row)?;
    Ok(())
  }

  /// Adds `value` into the next rate lane, permuting first if the rate is
  /// exhausted.
  pub fn absorb<F: SpongeField, P: GenerationPass<F>>(
    &mut self,
    pass: &mut P,
    table: &mut AssignmentTable<F>,
    value: Var,
    row: &mut usize,
  ) -> Result<(), BlueprintError> {
    let (lane, permute) = self.sponge_state.absorb(SC::SPONGE_RATE);
    if permute {
      self.permute(pass, table, *row)?;
    }
    *row += <Permutation as Gadget<F>>::ROWS_AMOUNT;

    let params = BinaryParams {
      x: self.state[lane],
      y: value,
    };
    self.state[lane] = pass.generate::<Addition>(table, &params, *row)?.output;
    *row += 1;
    Ok(())
  }

  /// Reads the next rate lane, permuting first when switching from absorbing
  /// or when the rate is exhausted.
  pub fn squeeze<F: SpongeField, P: GenerationPass<F>>(
    &mut self,
    pass: &mut P,
    table: &mut AssignmentTable<F>,
    row: &mut usize,
  ) -> Result<Var, BlueprintError> {
    let (lane, permute) = self.sponge_state.squeeze(SC::SPONGE_RATE);
    if permute {
      self.permute(pass, table, *row)?;
    }
    *row += <Permutation as Gadget<F>>::ROWS_AMOUNT;
    Ok(self.state[lane])
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    gadgets::poseidon::{NativeSponge, poseidon_block_cipher},
    plonk::{ArithmetizationParams, AssignmentPass, CircuitPass},
  };
  use ff::Field;
  use halo2curves::pasta::Fp;

  #[test]
  fn test_permutation_matches_native() {
    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    let input = [Fp::from(1), Fp::from(2), Fp::from(3)];
    for (row, v) in input.iter().enumerate() {
      table.assign_public_input(0, row, *v).unwrap();
    }
    let params = array::from_fn(|i| Var::public_input(0, i));

    let mut cs = PlonkCS::new();
    Permutation::generate_circuit(&mut cs, &mut table, &params, 0).unwrap();
    let out = <Permutation as Gadget<Fp>>::generate_assignments(&mut table, &params, 0).unwrap();
    assert!(cs.is_sat(&table).is_ok());
    assert_eq!(cs.num_constraints(), WIDTH);

    let mut expected = input;
    poseidon_block_cipher::<Fp, SC>(Fp::sponge_params(), &mut expected);
    assert_eq!(out.map(|v| table.value(v).unwrap()), expected);

    // break one intermediate round
    table.assign_witness(1, 4, Fp::from(99)).unwrap();
    assert!(cs.is_sat(&table).is_err());
  }

  /// Runs `ops` (`Some(i)` absorbs public input `i`, `None` squeezes) through
  /// both passes and checks every squeeze against the native sponge.
  fn check_against_native(values: &[Fp], ops: &[Option<usize>]) -> usize {
    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    table.assign_public_input(0, 0, Fp::ZERO).unwrap();
    for (i, v) in values.iter().enumerate() {
      table.assign_public_input(0, 1 + i, *v).unwrap();
    }
    let zero = Var::public_input(0, 0);

    let mut cs = PlonkCS::new();
    let mut row = 0;
    let mut sponge = ArithmeticSponge::new(zero);
    for op in ops {
      match op {
        Some(i) => {
          let value = Var::public_input(0, 1 + i);
          sponge.absorb(&mut CircuitPass(&mut cs), &mut table, value, &mut row).unwrap();
        }
        None => {
          sponge.squeeze(&mut CircuitPass(&mut cs), &mut table, &mut row).unwrap();
        }
      }
    }
    let rows = row;

    let mut row = 0;
    let mut sponge = ArithmeticSponge::new(zero);
    let mut native = NativeSponge::<Fp>::default();
    for op in ops {
      match op {
        Some(i) => {
          let value = Var::public_input(0, 1 + i);
          sponge.absorb(&mut AssignmentPass, &mut table, value, &mut row).unwrap();
          native.absorb(&[values[*i]]);
        }
        None => {
          let squeezed = sponge.squeeze(&mut AssignmentPass, &mut table, &mut row).unwrap();
          assert_eq!(table.value(squeezed), Ok(native.squeeze()));
        }
      }
    }
    assert_eq!(row, rows);
    assert!(cs.is_sat(&table).is_ok());
    rows
  }

  #[test]
  fn test_sponge_matches_native() {
    let values = [Fp::from(42), -Fp::from(7), Fp::from(9)];
    let rows = check_against_native(&values, &[Some(0), Some(1), None]);
    assert_eq!(rows, 2 * ArithmeticSponge::ABSORB_ROWS + ArithmeticSponge::SQUEEZE_ROWS);
  }

  #[test]
  fn test_duplex_schedule_matches_native() {
    let values = [Fp::from(1), Fp::from(2), Fp::from(3), Fp::from(4)];
    // fill the rate, permute on the third absorb, squeeze three lanes across a
    // permutation, then absorb after squeezing
    let ops = [
      Some(0),
      Some(1),
      Some(2),
      None,
      None,
      None,
      Some(3),
      None,
    ];
    check_against_native(&values, &ops);
  }
}
