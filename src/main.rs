// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! Builds the SHA-512 composite followed by a transcript absorbing its digest
//! in one circuit, then checks that the witness satisfies it.
use blueprint::{
  errors::BlueprintError,
  gadgets::{NativeTranscript, Sha512, Sha512Params, Transcript, VarPoint, sha512::schedule},
  plonk::{ArithmetizationParams, AssignmentTable, Gadget, PlonkCS, Var},
};
use ff::PrimeField;
use halo2curves::pasta::Fp;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Public-input row holding the zero the transcript starts from.
const ZERO_ROW: usize = schedule::LIMBS;

fn limb_values() -> [u128; schedule::LIMBS] {
  core::array::from_fn(|i| {
    let mask = (1u128 << schedule::LIMB_WIDTHS[i]) - 1;
    (0x9e37_79b9_7f4a_7c15_f39c_c060_5ced_c835u128).wrapping_mul(i as u128 + 1) & mask
  })
}

fn params() -> Sha512Params {
  let limb = |i: usize| -> [Var; 4] {
    core::array::from_fn(|j| Var::public_input(0, schedule::SLOTS * i + j))
  };
  Sha512Params {
    r: VarPoint {
      x: limb(0),
      y: limb(1),
    },
    a: VarPoint {
      x: limb(2),
      y: limb(3),
    },
    m: limb(4),
  }
}

fn main() -> Result<(), BlueprintError> {
  let _ = tracing_subscriber::fmt()
    .with_target(false)
    .with_env_filter(EnvFilter::from_default_env())
    .try_init();

  let mut table = AssignmentTable::<Fp>::new(ArithmetizationParams::default());
  for (row, limb) in limb_values().iter().enumerate() {
    table.assign_public_input(0, row, Fp::from_u128(*limb))?;
  }
  table.assign_public_input(0, ZERO_ROW, Fp::from(0))?;
  let zero = Var::public_input(0, ZERO_ROW);
  let params = params();

  let start = Instant::now();
  let mut cs = PlonkCS::new();
  let digest = Sha512::generate_circuit(&mut cs, &mut table, &params, 0)?;
  let transcript_row = <Sha512 as Gadget<Fp>>::ROWS_AMOUNT;
  let mut transcript = Transcript::<2>::new(zero);
  let mut row = transcript_row;
  for word in digest.output_state {
    transcript.absorb_circuit(&mut cs, &mut table, word, &mut row)?;
  }
  transcript.challenge_circuit(&mut cs, &mut table, &mut row)?;
  info!(
    elapsed_ms = %start.elapsed().as_millis(),
    gates = cs.num_gates(),
    constraints = cs.num_constraints(),
    copy_constraints = cs.copy_constraints().len(),
    "circuit generated"
  );

  let start = Instant::now();
  Sha512::generate_assignments(&mut table, &params, 0)?;
  transcript.init(zero);
  let mut row = transcript_row;
  for word in digest.output_state {
    transcript.absorb_assignment(&mut table, word, &mut row)?;
  }
  let challenge = transcript.challenge_assignment(&mut table, &mut row)?;
  info!(
    elapsed_ms = %start.elapsed().as_millis(),
    rows = table.rows_amount(),
    "assignments generated"
  );

  cs.is_sat(&table)?;

  let mut native = NativeTranscript::<Fp, 2>::new();
  for word in digest.output_state {
    native.absorb(table.value(word)?);
  }
  let expected = native.challenge();
  if table.value(challenge)? != expected {
    return Err(BlueprintError::UnSat {
      reason: "in-circuit challenge differs from the native transcript".to_string(),
    });
  }
  info!(challenge = ?expected, "circuit satisfied");
  Ok(())
}
