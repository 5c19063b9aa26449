// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! Variable-base scalar multiplication `[k]T` by MSB-first double-and-add over
//! [`UnifiedAddition`].
//!
//! Each of the `BITS` steps takes three rows:
//!
//! | row | W0 | W1 | W2 | W3 | W4 | W5 | W6 |
//! |---|---|---|---|---|---|---|---|
//! | select | b | Tx | Ty | b·Tx | b·Ty | k_prev | 2·k_prev + b |
//! | double | `UnifiedAddition(A, A)` |||||||
//! | add | `UnifiedAddition(2A, (b·Tx, b·Ty))` |||||||
//!
//! `(b·Tx, b·Ty)` is `T` or the identity `(0, 0)`. The running scalar in `W6`
//! of the last select row is copy-constrained to `k`. Constant column 0 of the
//! first row holds the zero the accumulators start from.
use super::{UnifiedAddition, UnifiedAdditionParams, VarEcPoint, util::to_biguint};
use crate::{
  errors::BlueprintError,
  plonk::{AssignmentTable, Expression, Gadget, PlonkCS, Var},
};
use core::marker::PhantomData;
use ff::{Field, PrimeField, PrimeFieldBits};
use halo2curves::CurveAffine;
use tracing::trace;

/// `[k]T` for a `BITS`-bit scalar `k` over the curve `C`.
///
/// `BITS` must be below the bit length of `C::Base`, which makes the bit
/// decomposition of `k` unique.
pub struct VariableBaseScalarMul<C, const BITS: usize = 254>(PhantomData<C>);

/// Inputs of [`VariableBaseScalarMul`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariableBaseScalarMulParams {
  /// the base point
  pub point: VarEcPoint,
  /// the scalar, an integer below `2^BITS` held in the base field
  pub scalar: Var,
}

const ROWS_PER_BIT: usize = 3;

impl<C: CurveAffine, const BITS: usize> VariableBaseScalarMul<C, BITS>
where
  C::Base: PrimeFieldBits,
{
  /// Selector seed of the bit-select gate.
  pub const SELECTOR_SEED: u64 = 0x0f0d;

  const CHECKED_BITS: usize = {
    assert!(BITS > 0 && BITS < <C::Base as PrimeField>::NUM_BITS as usize);
    BITS
  };

  fn generate_gates(cs: &mut PlonkCS<C::Base>, selector: usize) {
    let w = |i: usize| Expression::<C::Base>::from(Var::rotated(i, 0));
    let constraints = vec![
      cs.add_constraint(w(0) * (w(0) - Expression::one())),
      cs.add_constraint(w(3) - w(0) * w(1)),
      cs.add_constraint(w(4) - w(0) * w(2)),
      cs.add_constraint(w(6) - w(5).scale(C::Base::from(2)) - w(0)),
    ];
    cs.add_gate(selector, constraints);
  }

  fn zero(start_row: usize) -> Var {
    Var::constant(0, start_row)
  }

  fn select_row(start_row: usize, step: usize) -> usize {
    start_row + ROWS_PER_BIT * step
  }

  // the running scalar and point entering `step`
  fn accumulators(start_row: usize, step: usize) -> (Var, VarEcPoint) {
    if step == 0 {
      let zero = Self::zero(start_row);
      (zero, VarEcPoint { x: zero, y: zero })
    } else {
      let previous = Self::select_row(start_row, step - 1);
      let sum = VarEcPoint {
        x: Var::witness(4, previous + 2),
        y: Var::witness(5, previous + 2),
      };
      (Var::witness(6, previous), sum)
    }
  }

  fn addition_params(
    start_row: usize,
    step: usize,
  ) -> (UnifiedAdditionParams, UnifiedAdditionParams) {
    let row = Self::select_row(start_row, step);
    let (_, acc) = Self::accumulators(start_row, step);
    let double = UnifiedAdditionParams { p: acc, q: acc };
    let doubled = <UnifiedAddition<C> as Gadget<C::Base>>::result(&double, row + 1);
    let add = UnifiedAdditionParams {
      p: doubled,
      q: VarEcPoint {
        x: Var::witness(3, row),
        y: Var::witness(4, row),
      },
    };
    (double, add)
  }
}

impl<C: CurveAffine, const BITS: usize> Gadget<C::Base> for VariableBaseScalarMul<C, BITS>
where
  C::Base: PrimeFieldBits,
{
  type Params = VariableBaseScalarMulParams;
  type Output = VarEcPoint;

  const ROWS_AMOUNT: usize = ROWS_PER_BIT * Self::CHECKED_BITS;
  const GATES_AMOUNT: usize = 1;

  fn result(_params: &Self::Params, start_row: usize) -> Self::Output {
    Self::accumulators(start_row, BITS).1
  }

  fn generate_circuit(
    cs: &mut PlonkCS<C::Base>,
    table: &mut AssignmentTable<C::Base>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let gates = <Self as Gadget<C::Base>>::GATES_AMOUNT;
    let selector = table.get_or_allocate_selector(Self::SELECTOR_SEED, gates);
    if selector.fresh {
      Self::generate_gates(cs, selector.first);
    }
    table.assign_constant(0, start_row, <C::Base as Field>::ZERO)?;

    for step in 0..BITS {
      let row = Self::select_row(start_row, step);
      table.enable_selector(selector.first, row)?;
      cs.add_copy_constraint((params.point.x, Var::witness(1, row)));
      cs.add_copy_constraint((params.point.y, Var::witness(2, row)));
      cs.add_copy_constraint((Self::accumulators(start_row, step).0, Var::witness(5, row)));

      let (double, add) = Self::addition_params(start_row, step);
      UnifiedAddition::<C>::generate_circuit(cs, table, &double, row + 1)?;
      UnifiedAddition::<C>::generate_circuit(cs, table, &add, row + 2)?;
    }
    let last = Self::select_row(start_row, BITS - 1);
    cs.add_copy_constraint((Var::witness(6, last), params.scalar));
    Ok(<Self as Gadget<C::Base>>::result(params, start_row))
  }

  fn generate_assignments(
    table: &mut AssignmentTable<C::Base>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let k = to_biguint(&table.value(params.scalar)?);
    if k.bits() > BITS as u64 {
      return Err(BlueprintError::ValueOutOfRange {
        reason: format!("scalar has {} bits, more than {BITS}", k.bits()),
      });
    }
    let tx = table.value(params.point.x)?;
    let ty = table.value(params.point.y)?;
    trace!(start_row, bits = BITS, "variable-base scalar multiplication");

    let mut running = <C::Base as Field>::ZERO;
    for step in 0..BITS {
      let row = Self::select_row(start_row, step);
      let bit = C::Base::from(u64::from(k.bit((BITS - 1 - step) as u64)));
      let previous = running;
      running = previous.double() + bit;
      let cells = [bit, tx, ty, bit * tx, bit * ty, previous, running];
      for (column, value) in cells.into_iter().enumerate() {
        table.assign_witness(column, row, value)?;
      }

      let (double, add) = Self::addition_params(start_row, step);
      UnifiedAddition::<C>::generate_assignments(table, &double, row + 1)?;
      UnifiedAddition::<C>::generate_assignments(table, &add, row + 2)?;
    }
    Ok(<Self as Gadget<C::Base>>::result(params, start_row))
  }
}
