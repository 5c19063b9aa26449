// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! Logical OR of bits.
use bellpepper_core::{ConstraintSystem, LinearCombination, SynthesisError, num::AllocatedNum};
use ff::PrimeField;

/// Allocates `output = 1` if some input is nonzero and `output = 0` otherwise.
///
/// Enforced by `inv · Σ inputs = output` and `(1 − output) · Σ inputs = 0`, so
/// the inputs are expected to be bits: nonzero inputs summing to zero read as
/// false.
pub fn disjunction<F, CS>(
  mut cs: CS,
  inputs: &[AllocatedNum<F>],
) -> Result<AllocatedNum<F>, SynthesisError>
where
  F: PrimeField,
  CS: ConstraintSystem<F>,
{
  if inputs.is_empty() {
    return Err(SynthesisError::Unsatisfiable);
  }

  let sum: Option<F> = inputs.iter().map(|x| x.get_value()).sum();
  let inv = AllocatedNum::alloc(cs.namespace(|| "inv"), || {
    let sum = sum.ok_or(SynthesisError::AssignmentMissing)?;
    Ok(Option::from(sum.invert()).unwrap_or(F::ZERO))
  })?;
  let output = AllocatedNum::alloc(cs.namespace(|| "output"), || {
    let sum = sum.ok_or(SynthesisError::AssignmentMissing)?;
    Ok(if sum.is_zero_vartime() { F::ZERO } else { F::ONE })
  })?;

  let sum_lc = |lc: LinearCombination<F>| inputs.iter().fold(lc, |lc, x| lc + x.get_variable());
  cs.enforce(
    || "inv * sum = output",
    |lc| lc + inv.get_variable(),
    sum_lc,
    |lc| lc + output.get_variable(),
  );
  cs.enforce(
    || "(1 - output) * sum = 0",
    |lc| lc + CS::one() - output.get_variable(),
    sum_lc,
    |lc| lc,
  );
  Ok(output)
}
