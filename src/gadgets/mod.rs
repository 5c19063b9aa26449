// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! PLONK gadgets built on the [`Gadget`](crate::plonk::Gadget) protocol.
//!
//! # Available Gadgets
//!
//! - [`UnifiedAddition`]: complete elliptic-curve addition in one row
//! - [`VariableBaseScalarMul`]: double-and-add `[k]T` over [`UnifiedAddition`]
//! - [`Sha512`]: SHA-512 of an `(R, A, M)` triple of limbs, with the inner
//!   [`Sha512Process`] compression gadget
//! - [`Transcript`]: Fiat-Shamir transcript over an [`ArithmeticSponge`]
//! - [`Permutation`]: the Poseidon permutation, with its native counterpart
//!   [`NativeSponge`]
//! - [`RangeCheck`], [`BitCheck`]: bit-width constraints
//! - [`Addition`], [`Subtraction`], [`Multiplication`]: one-row field operations
//! - [`Exponentiation`], [`VanishesOnLast4Rows`]: power computations
//! - [`ToLimbs`], [`FromLimbs`]: 64-bit limb unpack/pack

mod bit_check;
mod exponentiation;
mod field_ops;
mod limbs;
mod range_check;
mod poseidon;
pub mod sha512;
mod sponge;
mod transcript;
mod unified_addition;
mod util;
mod vanishes_on_last_4_rows;
mod variable_base_scalar_mul;

pub use bit_check::BitCheck;
pub use exponentiation::{Exponentiation, ExponentiationParams};
pub use field_ops::{
  Add, Addition, BinaryGadget, BinaryOperation, BinaryOutput, BinaryParams, Mul, Multiplication,
  Sub, Subtraction,
};
pub use limbs::{FromLimbs, FromLimbsParams, ToLimbs, ToLimbsOutput};
pub use range_check::{RangeCheck, RangeCheckParams};
pub use sha512::{Sha512, Sha512Params, Sha512Process, Sha512ProcessParams, VarPoint};
pub use poseidon::{
  ArithmeticSpongeParams, NativeSponge, PlonkSpongeConstantsKimchi, SpongeConstants, SpongeField,
  SpongeState, WIDTH as SPONGE_WIDTH, full_round, poseidon_block_cipher, sbox,
};
pub use sponge::{ArithmeticSponge, Permutation};
pub use transcript::{NativeTranscript, ProofEvaluations, Transcript};
pub use unified_addition::{UnifiedAddition, UnifiedAdditionParams, VarEcPoint};
pub use vanishes_on_last_4_rows::{VanishesOnLast4Rows, VanishesParams};
pub use variable_base_scalar_mul::{VariableBaseScalarMul, VariableBaseScalarMulParams};
