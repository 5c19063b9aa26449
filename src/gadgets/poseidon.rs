// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! The Poseidon permutation and its duplex sponge, out of circuit.
//!
//! The permutation shape is fixed by a [`SpongeConstants`] implementation and
//! its tables by an [`ArithmeticSpongeParams`]. Width is always 3 with rate 2.
//! The sponge switches between absorbing and squeezing the way the Kimchi
//! verifier's sponge does: the permutation only runs when the rate is
//! exhausted or when switching from absorbing to squeezing.
use super::util::{from_biguint, inverse_or_zero};
use core::{array, marker::PhantomData};
use digest::{ExtendableOutput, Update, XofReader};
use ff::{Field, PrimeField, PrimeFieldBits};
use halo2curves::pasta::{Fp, Fq};
use num_bigint::BigUint;
use once_cell::sync::OnceCell;
use sha3::Shake256;

/// Sponge state width.
pub const WIDTH: usize = 3;

/// Shape of a Poseidon permutation.
pub trait SpongeConstants {
  /// capacity lanes
  const SPONGE_CAPACITY: usize = 1;
  /// total lanes
  const SPONGE_WIDTH: usize = WIDTH;
  /// rate lanes
  const SPONGE_RATE: usize = 2;
  /// full rounds, split in two halves around the partial rounds when
  /// `PERM_HALF_ROUNDS_FULL` is nonzero
  const PERM_ROUNDS_FULL: usize;
  /// rounds applying the S-box to the first lane only
  const PERM_ROUNDS_PARTIAL: usize;
  /// full rounds on each side of the partial rounds
  const PERM_HALF_ROUNDS_FULL: usize;
  /// S-box exponent
  const PERM_SBOX: u32;
  /// whether the MDS step uses `params.mds` rather than the fixed circulant
  const PERM_FULL_MDS: bool;
  /// whether round constants are added once before the first round
  const PERM_INITIAL_ARK: bool;
}

/// The permutation of the Kimchi verifier: 55 full rounds, `x^7`, full MDS,
/// no initial round-constant addition.
#[derive(Clone, Copy, Debug)]
pub struct PlonkSpongeConstantsKimchi;

impl SpongeConstants for PlonkSpongeConstantsKimchi {
  const PERM_ROUNDS_FULL: usize = 55;
  const PERM_ROUNDS_PARTIAL: usize = 0;
  const PERM_HALF_ROUNDS_FULL: usize = 0;
  const PERM_SBOX: u32 = 7;
  const PERM_FULL_MDS: bool = true;
  const PERM_INITIAL_ARK: bool = false;
}

/// Round constants and MDS matrix of a permutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArithmeticSpongeParams<F> {
  /// one row of constants per round (plus one when `PERM_INITIAL_ARK`)
  pub round_constants: Vec<[F; WIDTH]>,
  /// the MDS matrix
  pub mds: [[F; WIDTH]; WIDTH],
}

impl<F: PrimeField> ArithmeticSpongeParams<F> {
  /// Derives `rounds` rows of round constants from SHAKE256 over `label`,
  /// each a 512-bit integer reduced into the field, and the Cauchy MDS matrix
  /// `mds[i][j] = 1 / (i + j + 3)`.
  pub fn derive(label: &[u8], rounds: usize) -> Self {
    let mut hasher = Shake256::default();
    hasher.update(label);
    let mut reader = hasher.finalize_xof();

    let round_constants = (0..rounds)
      .map(|_| {
        array::from_fn(|_| {
          let mut bytes = [0u8; 64];
          reader.read(&mut bytes);
          from_biguint(&BigUint::from_bytes_le(&bytes))
        })
      })
      .collect();
    let mds = array::from_fn(|i| array::from_fn(|j| inverse_or_zero(F::from((i + j + 3) as u64))));

    ArithmeticSpongeParams {
      round_constants,
      mds,
    }
  }
}

/// A field with a Kimchi-shaped parameter set.
pub trait SpongeField: PrimeFieldBits {
  /// The parameters of the transcript sponge over this field.
  fn sponge_params() -> &'static ArithmeticSpongeParams<Self>;
}

// Tables are derived by `ArithmeticSpongeParams::derive`, not taken from Mina.
impl SpongeField for Fp {
  fn sponge_params() -> &'static ArithmeticSpongeParams<Fp> {
    static P: OnceCell<ArithmeticSpongeParams<Fp>> = OnceCell::new();
    P.get_or_init(|| {
      ArithmeticSpongeParams::derive(
        b"blueprint/poseidon/pallas-base",
        PlonkSpongeConstantsKimchi::PERM_ROUNDS_FULL,
      )
    })
  }
}

impl SpongeField for Fq {
  fn sponge_params() -> &'static ArithmeticSpongeParams<Fq> {
    static Q: OnceCell<ArithmeticSpongeParams<Fq>> = OnceCell::new();
    Q.get_or_init(|| {
      ArithmeticSpongeParams::derive(
        b"blueprint/poseidon/vesta-base",
        PlonkSpongeConstantsKimchi::PERM_ROUNDS_FULL,
      )
    })
  }
}

/// `x^PERM_SBOX`
pub fn sbox<F: Field, SC: SpongeConstants>(x: F) -> F {
  if SC::PERM_SBOX == 7 {
    let square = x.square();
    x * square * square.square()
  } else {
    x.pow_vartime([u64::from(SC::PERM_SBOX)])
  }
}

fn apply_mds_matrix<F: Field, SC: SpongeConstants>(
  params: &ArithmeticSpongeParams<F>,
  state: &[F; WIDTH],
) -> [F; WIDTH] {
  if SC::PERM_FULL_MDS {
    array::from_fn(|i| {
      state
        .iter()
        .zip(params.mds[i].iter())
        .fold(F::ZERO, |acc, (s, m)| acc + *m * s)
    })
  } else {
    [state[0] + state[2], state[0] + state[1], state[1] + state[2]]
  }
}

fn add_round_constants<F: Field>(
  params: &ArithmeticSpongeParams<F>,
  state: &mut [F; WIDTH],
  r: usize,
) {
  for (s, c) in state.iter_mut().zip(params.round_constants[r].iter()) {
    *s += c;
  }
}

/// One full round: S-box on every lane, MDS, then the constants of row `r`.
pub fn full_round<F: Field, SC: SpongeConstants>(
  params: &ArithmeticSpongeParams<F>,
  state: &mut [F; WIDTH],
  r: usize,
) {
  let sboxed = state.map(sbox::<F, SC>);
  *state = apply_mds_matrix::<F, SC>(params, &sboxed);
  add_round_constants(params, state, r);
}

fn half_rounds<F: Field, SC: SpongeConstants>(
  params: &ArithmeticSpongeParams<F>,
  state: &mut [F; WIDTH],
) {
  let full = |state: &mut [F; WIDTH], r: usize| {
    add_round_constants(params, state, r);
    let sboxed = state.map(sbox::<F, SC>);
    *state = apply_mds_matrix::<F, SC>(params, &sboxed);
  };

  for r in 0..SC::PERM_HALF_ROUNDS_FULL {
    full(state, r);
  }
  for r in 0..SC::PERM_ROUNDS_PARTIAL {
    add_round_constants(params, state, SC::PERM_HALF_ROUNDS_FULL + r);
    state[0] = sbox::<F, SC>(state[0]);
    *state = apply_mds_matrix::<F, SC>(params, state);
  }
  for r in 0..SC::PERM_HALF_ROUNDS_FULL {
    full(state, SC::PERM_HALF_ROUNDS_FULL + SC::PERM_ROUNDS_PARTIAL + r);
  }
}

/// Applies the permutation described by `SC` and `params` to `state`.
pub fn poseidon_block_cipher<F: Field, SC: SpongeConstants>(
  params: &ArithmeticSpongeParams<F>,
  state: &mut [F; WIDTH],
) {
  if SC::PERM_HALF_ROUNDS_FULL == 0 {
    if SC::PERM_INITIAL_ARK {
      add_round_constants(params, state, 0);
      for r in 0..SC::PERM_ROUNDS_FULL {
        full_round::<F, SC>(params, state, r + 1);
      }
    } else {
      for r in 0..SC::PERM_ROUNDS_FULL {
        full_round::<F, SC>(params, state, r);
      }
    }
  } else {
    half_rounds::<F, SC>(params, state);
  }
}

/// Which half of the duplex the sponge is in, with the number of rate lanes
/// already used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpongeState {
  /// absorbed into this many rate lanes since the last permutation
  Absorbed(usize),
  /// squeezed this many rate lanes since the last permutation
  Squeezed(usize),
}

impl SpongeState {
  /// Moves to the state after absorbing one element. Returns the lane the
  /// element is added to and whether the permutation runs first.
  pub fn absorb(&mut self, rate: usize) -> (usize, bool) {
    match *self {
      SpongeState::Absorbed(n) if n == rate => {
        *self = SpongeState::Absorbed(1);
        (0, true)
      }
      SpongeState::Absorbed(n) => {
        *self = SpongeState::Absorbed(n + 1);
        (n, false)
      }
      SpongeState::Squeezed(_) => {
        *self = SpongeState::Absorbed(1);
        (0, false)
      }
    }
  }

  /// Moves to the state after squeezing one element. Returns the lane read and
  /// whether the permutation runs first.
  pub fn squeeze(&mut self, rate: usize) -> (usize, bool) {
    match *self {
      SpongeState::Squeezed(n) if n == rate => {
        *self = SpongeState::Squeezed(1);
        (0, true)
      }
      SpongeState::Squeezed(n) => {
        *self = SpongeState::Squeezed(n + 1);
        (n, false)
      }
      SpongeState::Absorbed(_) => {
        *self = SpongeState::Squeezed(1);
        (0, true)
      }
    }
  }
}

/// The out-of-circuit sponge.
#[derive(Clone, Debug)]
pub struct NativeSponge<F: 'static, SC = PlonkSpongeConstantsKimchi> {
  sponge_state: SpongeState,
  state: [F; WIDTH],
  params: &'static ArithmeticSpongeParams<F>,
  constants: PhantomData<SC>,
}

impl<F: Field, SC: SpongeConstants> NativeSponge<F, SC> {
  /// A sponge in the all-zero state.
  pub fn new(params: &'static ArithmeticSpongeParams<F>) -> Self {
    NativeSponge {
      sponge_state: SpongeState::Absorbed(0),
      state: [F::ZERO; WIDTH],
      params,
      constants: PhantomData,
    }
  }

  /// Absorbs the elements of `xs` in order.
  pub fn absorb(&mut self, xs: &[F]) {
    for x in xs {
      let (lane, permute) = self.sponge_state.absorb(SC::SPONGE_RATE);
      if permute {
        poseidon_block_cipher::<F, SC>(self.params, &mut self.state);
      }
      self.state[lane] += x;
    }
  }

  /// Squeezes one element.
  pub fn squeeze(&mut self) -> F {
    let (lane, permute) = self.sponge_state.squeeze(SC::SPONGE_RATE);
    if permute {
      poseidon_block_cipher::<F, SC>(self.params, &mut self.state);
    }
    self.state[lane]
  }

  /// Returns to the all-zero state.
  pub fn reset(&mut self) {
    self.state = [F::ZERO; WIDTH];
    self.sponge_state = SpongeState::Absorbed(0);
  }
}

impl<F: SpongeField> Default for NativeSponge<F> {
  fn default() -> Self {
    Self::new(F::sponge_params())
  }
}
