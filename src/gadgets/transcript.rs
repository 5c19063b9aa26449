// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! In-circuit Fiat-Shamir transcript.
//!
//! Challenges are drawn lazily: a squeeze is unpacked into four 64-bit limbs,
//! the low `HIGH_ENTROPY_LIMBS` of which are buffered, and each challenge packs
//! two buffered limbs. Absorbing discards the buffer.
//!
//! Every operation has a `*_circuit` and an `*_assignment` variant driving one
//! shared implementation, so both passes consume identical rows.
use super::{
  FromLimbs, FromLimbsParams, ToLimbs,
  poseidon::{NativeSponge, SpongeField},
  sponge::ArithmeticSponge,
  util::{pow2, to_biguint},
};
use crate::{
  errors::BlueprintError,
  plonk::{AssignmentPass, AssignmentTable, CircuitPass, GenerationPass, PlonkCS, Var},
};
use tracing::trace;

/// Limbs packed into one challenge.
pub const CHALLENGE_LENGTH_IN_LIMBS: usize = 2;

const LIMBS_PER_SQUEEZE: usize = 4;

/// Evaluations of the proof polynomials at one point, absorbed as a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofEvaluations<T> {
  /// permutation aggregation polynomial
  pub z: T,
  /// generic gate selector
  pub generic_selector: T,
  /// Poseidon gate selector
  pub poseidon_selector: T,
  /// witness columns
  pub w: [T; 15],
  /// permutation sigma polynomials
  pub s: [T; 6],
}

impl<T> ProofEvaluations<T> {
  /// The evaluations in absorption order.
  pub fn iter(&self) -> impl Iterator<Item = &T> {
    [&self.z, &self.generic_selector, &self.poseidon_selector]
      .into_iter()
      .chain(self.w.iter())
      .chain(self.s.iter())
  }
}

/// Fiat-Shamir transcript keeping `HIGH_ENTROPY_LIMBS` limbs of every squeeze.
#[derive(Clone, Debug)]
pub struct Transcript<const HIGH_ENTROPY_LIMBS: usize = 2> {
  sponge: ArithmeticSponge,
  last_squeezed: Vec<Var>,
  squeezes: usize,
}

impl<const HIGH_ENTROPY_LIMBS: usize> Transcript<HIGH_ENTROPY_LIMBS> {
  /// Rows consumed by [`init`](Self::init).
  pub const INIT_ROWS: usize = 0;
  /// Rows consumed by one absorb.
  pub const ABSORB_ROWS: usize = ArithmeticSponge::ABSORB_ROWS;
  /// Rows consumed by one squeeze.
  pub const SQUEEZE_ROWS: usize = ArithmeticSponge::SQUEEZE_ROWS;
  /// Rows consumed by unpacking a squeeze into limbs.
  pub const UNPACK_ROWS: usize = 1;
  /// Rows consumed by packing two limbs into a challenge.
  pub const PACK_ROWS: usize = 1;
  /// Rows consumed by absorbing a public evaluation and a [`ProofEvaluations`].
  pub const ABSORB_EVALUATIONS_ROWS: usize = 25 * Self::ABSORB_ROWS;

  /// A transcript over a zeroed sponge; `zero` must name a cell holding zero.
  pub fn new(zero: Var) -> Self {
    const {
      assert!(
        CHALLENGE_LENGTH_IN_LIMBS <= HIGH_ENTROPY_LIMBS && HIGH_ENTROPY_LIMBS <= LIMBS_PER_SQUEEZE
      )
    };
    Transcript {
      sponge: ArithmeticSponge::new(zero),
      last_squeezed: Vec::new(),
      squeezes: 0,
    }
  }

  /// Resets the sponge state to `zero` and empties the limb buffer.
  pub fn init(&mut self, zero: Var) {
    *self = Self::new(zero);
  }

  /// Number of sponge squeezes performed since the last `init`.
  pub fn squeezes(&self) -> usize {
    self.squeezes
  }

  /// Limbs squeezed but not yet consumed by a challenge.
  pub fn last_squeezed(&self) -> &[Var] {
    &self.last_squeezed
  }

  fn absorb<F: SpongeField, P: GenerationPass<F>>(
    &mut self,
    pass: &mut P,
    table: &mut AssignmentTable<F>,
    value: Var,
    row: &mut usize,
  ) -> Result<(), BlueprintError> {
    self.last_squeezed.clear();
    self.sponge.absorb(pass, table, value, row)
  }

  fn challenge<F: SpongeField, P: GenerationPass<F>>(
    &mut self,
    pass: &mut P,
    table: &mut AssignmentTable<F>,
    row: &mut usize,
  ) -> Result<Var, BlueprintError> {
    loop {
      if self.last_squeezed.len() >= CHALLENGE_LENGTH_IN_LIMBS {
        let params = FromLimbsParams {
          low: self.last_squeezed[0],
          high: self.last_squeezed[1],
        };
        let challenge = pass.generate::<FromLimbs>(table, &params, *row)?;
        *row += Self::PACK_ROWS;
        self.last_squeezed.drain(..CHALLENGE_LENGTH_IN_LIMBS);
        return Ok(challenge);
      }

      let squeezed = self.sponge.squeeze(pass, table, row)?;
      self.squeezes += 1;
      let limbs = pass.generate::<ToLimbs>(table, &squeezed, *row)?;
      *row += Self::UNPACK_ROWS;
      self
        .last_squeezed
        .extend_from_slice(&limbs.limbs[..HIGH_ENTROPY_LIMBS]);
      trace!(squeezes = self.squeezes, "transcript squeezed");
    }
  }

  fn absorb_evaluations<F: SpongeField, P: GenerationPass<F>>(
    &mut self,
    pass: &mut P,
    table: &mut AssignmentTable<F>,
    public_eval: Var,
    evals: &ProofEvaluations<Var>,
    row: &mut usize,
  ) -> Result<(), BlueprintError> {
    let start_row = *row;
    self.absorb(pass, table, public_eval, row)?;
    for value in evals.iter() {
      self.absorb(pass, table, *value, row)?;
    }
    assert_eq!(*row, start_row + Self::ABSORB_EVALUATIONS_ROWS);
    Ok(())
  }

  /// Emits the constraints of an absorb of `value`.
  pub fn absorb_circuit<F: SpongeField>(
    &mut self,
    cs: &mut PlonkCS<F>,
    table: &mut AssignmentTable<F>,
    value: Var,
    row: &mut usize,
  ) -> Result<(), BlueprintError> {
    self.absorb(&mut CircuitPass(cs), table, value, row)
  }

  /// Computes the witness of an absorb of `value`.
  pub fn absorb_assignment<F: SpongeField>(
    &mut self,
    table: &mut AssignmentTable<F>,
    value: Var,
    row: &mut usize,
  ) -> Result<(), BlueprintError> {
    self.absorb(&mut AssignmentPass, table, value, row)
  }

  /// Emits the constraints of a challenge and returns its cell.
  pub fn challenge_circuit<F: SpongeField>(
    &mut self,
    cs: &mut PlonkCS<F>,
    table: &mut AssignmentTable<F>,
    row: &mut usize,
  ) -> Result<Var, BlueprintError> {
    self.challenge(&mut CircuitPass(cs), table, row)
  }

  /// Computes the witness of a challenge and returns its cell.
  pub fn challenge_assignment<F: SpongeField>(
    &mut self,
    table: &mut AssignmentTable<F>,
    row: &mut usize,
  ) -> Result<Var, BlueprintError> {
    self.challenge(&mut AssignmentPass, table, row)
  }

  /// Emits the constraints absorbing `public_eval` followed by `evals`.
  pub fn absorb_evaluations_circuit<F: SpongeField>(
    &mut self,
    cs: &mut PlonkCS<F>,
    table: &mut AssignmentTable<F>,
    public_eval: Var,
    evals: &ProofEvaluations<Var>,
    row: &mut usize,
  ) -> Result<(), BlueprintError> {
    self.absorb_evaluations(&mut CircuitPass(cs), table, public_eval, evals, row)
  }

  /// Computes the witness absorbing `public_eval` followed by `evals`.
  pub fn absorb_evaluations_assignment<F: SpongeField>(
    &mut self,
    table: &mut AssignmentTable<F>,
    public_eval: Var,
    evals: &ProofEvaluations<Var>,
    row: &mut usize,
  ) -> Result<(), BlueprintError> {
    self.absorb_evaluations(&mut AssignmentPass, table, public_eval, evals, row)
  }
}

/// The out-of-circuit counterpart of [`Transcript`].
#[derive(Clone, Debug)]
pub struct NativeTranscript<F: 'static, const HIGH_ENTROPY_LIMBS: usize = 2> {
  sponge: NativeSponge<F>,
  last_squeezed: Vec<u64>,
  squeezes: usize,
}

impl<F: SpongeField, const HIGH_ENTROPY_LIMBS: usize> NativeTranscript<F, HIGH_ENTROPY_LIMBS> {
  /// A transcript over a zeroed sponge.
  pub fn new() -> Self {
    const {
      assert!(
        CHALLENGE_LENGTH_IN_LIMBS <= HIGH_ENTROPY_LIMBS && HIGH_ENTROPY_LIMBS <= LIMBS_PER_SQUEEZE
      )
    };
    NativeTranscript {
      sponge: NativeSponge::default(),
      last_squeezed: Vec::new(),
      squeezes: 0,
    }
  }

  /// Number of sponge squeezes performed.
  pub fn squeezes(&self) -> usize {
    self.squeezes
  }

  /// Absorbs one field element.
  pub fn absorb(&mut self, value: F) {
    self.last_squeezed.clear();
    self.sponge.absorb(&[value]);
  }

  /// Absorbs `public_eval` followed by `evals`.
  pub fn absorb_evaluations(&mut self, public_eval: F, evals: &ProofEvaluations<F>) {
    self.absorb(public_eval);
    for value in evals.iter() {
      self.absorb(*value);
    }
  }

  /// Draws a challenge.
  pub fn challenge(&mut self) -> F {
    loop {
      if self.last_squeezed.len() >= CHALLENGE_LENGTH_IN_LIMBS {
        let low = self.last_squeezed[0];
        let high = self.last_squeezed[1];
        self.last_squeezed.drain(..CHALLENGE_LENGTH_IN_LIMBS);
        return F::from(low) + F::from(high) * pow2::<F>(64);
      }

      let squeezed = self.sponge.squeeze();
      self.squeezes += 1;
      let mut limbs = to_biguint(&squeezed).iter_u64_digits().collect::<Vec<_>>();
      limbs.resize(LIMBS_PER_SQUEEZE, 0);
      self
        .last_squeezed
        .extend_from_slice(&limbs[..HIGH_ENTROPY_LIMBS]);
    }
  }
}

impl<F: SpongeField, const HIGH_ENTROPY_LIMBS: usize> Default
  for NativeTranscript<F, HIGH_ENTROPY_LIMBS>
{
  fn default() -> Self {
    Self::new()
  }
}
