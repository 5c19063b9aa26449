// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! Unified (complete) affine addition `R = P + Q` in one row.
//!
//! | W0 | W1 | W2 | W3 | W4 | W5 | W6 | W7 | W8 | W9 | W10 |
//! |----|----|----|----|----|----|----|----|----|----|-----|
//! | Px | Py | Qx | Qy | Rx | Ry | 1/Px | 1/Qx | 1/(Qx−Px) | 1/(Py+Qy) | λ |
//!
//! The identity is encoded as `(0, 0)`, and the gate forces `y = 0` whenever
//! `x = 0`. Every inverse helper is "inverse or zero", so the products `Px·W6`, `Qx·W7`, `(Qx−Px)·W8` and `(Py+Qy)·W9` are
//! 0/1 indicators of the non-identity, secant and tangent cases. The two
//! addition-law constraints use them as algebraic selectors, so one gate covers
//! every case without branching at verification time.
use super::util::inverse_or_zero;
use crate::{
  errors::BlueprintError,
  plonk::{AssignmentTable, Expression, Gadget, PlonkCS, Var},
};
use core::marker::PhantomData;
use ff::Field;
use halo2curves::CurveAffine;
use tracing::trace;

/// A curve point given by two coordinate variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VarEcPoint {
  /// x-coordinate
  pub x: Var,
  /// y-coordinate
  pub y: Var,
}

/// Operands of [`UnifiedAddition`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnifiedAdditionParams {
  /// left operand
  pub p: VarEcPoint,
  /// right operand
  pub q: VarEcPoint,
}

/// Complete addition over the curve `C`, arithmetized over `C::Base`.
///
/// Only curves without an affine point of abscissa zero are supported, since
/// `(0, 0)` encodes the identity. This holds for the Pasta curves, BN254 and
/// secp256k1 (`b` is not a square), but not for P-256. Operands with `x = 0`
/// and `y ≠ 0` are rejected by assignment and violate the gate.
pub struct UnifiedAddition<C>(PhantomData<C>);

impl<C: CurveAffine> UnifiedAddition<C> {
  /// Selector seed of the addition gate.
  pub const SELECTOR_SEED: u64 = 0x0f01;

  /// Number of witness columns the gadget occupies.
  pub const WITNESS_COLUMNS: usize = 11;

  fn generate_gates(cs: &mut PlonkCS<C::Base>, selector: usize) {
    let w = |i: usize| Expression::<C::Base>::from(Var::rotated(i, 0));
    let one = Expression::<C::Base>::one;
    let (px, py, qx, qy, rx, ry, lambda) = (w(0), w(1), w(2), w(3), w(4), w(5), w(10));

    // indicators
    let p = px.clone() * w(6);
    let q = qx.clone() * w(7);
    let dx = qx.clone() - px.clone();
    let sy = py.clone() + qy.clone();
    let d = dx.clone() * w(8);
    let e = sy.clone() * w(9);
    let n = d.clone() + (one() - d.clone()) * e.clone();

    let p_is_identity = one() - p.clone();
    let q_is_identity = p.clone() * (one() - q.clone());
    let neither = p.clone() * q.clone();

    let x_sum = lambda.clone().square() - px.clone() - qx.clone();
    let x_law = p_is_identity.clone() * (rx.clone() - qx.clone())
      + q_is_identity.clone() * (rx.clone() - px.clone())
      + neither.clone()
        * (n.clone() * (rx.clone() - x_sum) + (one() - n.clone()) * rx.clone());

    let y_sum = lambda.clone() * (px.clone() - rx.clone()) - py.clone();
    let y_law = p_is_identity * (ry.clone() - qy.clone())
      + q_is_identity * (ry.clone() - py.clone())
      + neither.clone() * (n.clone() * (ry.clone() - y_sum) + (one() - n) * ry);

    let secant = lambda.clone() * dx.clone() - (qy - py.clone());
    let tangent = (py.clone() * lambda).scale(C::Base::from(2))
      - px.clone().square().scale(C::Base::from(3))
      - Expression::Constant(C::a());
    let slope = neither * (d.clone() * secant + (one() - d.clone()) * e.clone() * tangent);

    let constraints = vec![
      cs.add_constraint(x_law),
      cs.add_constraint(y_law),
      cs.add_constraint(slope),
      cs.add_constraint(px * (one() - p.clone())),
      cs.add_constraint(qx * (one() - q.clone())),
      cs.add_constraint(w(1) * (one() - p)),
      cs.add_constraint(w(3) * (one() - q)),
      cs.add_constraint(dx * (one() - d.clone())),
      cs.add_constraint((one() - d) * sy * (one() - e)),
    ];
    cs.add_gate(selector, constraints);
  }

  /// Native unified addition over affine coordinates, `(0, 0)` being the
  /// identity. Returns `(Rx, Ry)`.
  pub fn add(p: (C::Base, C::Base), q: (C::Base, C::Base)) -> (C::Base, C::Base) {
    let zero = C::Base::ZERO;
    let (px, py) = p;
    let (qx, qy) = q;
    if px == zero && py == zero {
      q
    } else if qx == zero && qy == zero {
      p
    } else if px == qx && py == -qy {
      (zero, zero)
    } else {
      let lambda = Self::slope(p, q);
      let rx = lambda.square() - px - qx;
      (rx, lambda * (px - rx) - py)
    }
  }

  // secant slope when the x-coordinates differ, tangent slope otherwise
  fn slope(p: (C::Base, C::Base), q: (C::Base, C::Base)) -> C::Base {
    let (px, py) = p;
    let (qx, qy) = q;
    if px != qx {
      (qy - py) * inverse_or_zero(qx - px)
    } else {
      (px.square() * C::Base::from(3) + C::a()) * inverse_or_zero(py.double())
    }
  }
}

impl<C: CurveAffine> Gadget<C::Base> for UnifiedAddition<C> {
  type Params = UnifiedAdditionParams;
  type Output = VarEcPoint;

  const ROWS_AMOUNT: usize = 1;
  const GATES_AMOUNT: usize = 1;

  fn result(_params: &Self::Params, start_row: usize) -> Self::Output {
    VarEcPoint {
      x: Var::witness(4, start_row),
      y: Var::witness(5, start_row),
    }
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
    table.enable_selector(selector.first, start_row)?;

    let inputs = [params.p.x, params.p.y, params.q.x, params.q.y];
    for (column, input) in inputs.into_iter().enumerate() {
      cs.add_copy_constraint((input, Var::witness(column, start_row)));
    }
    Ok(<Self as Gadget<C::Base>>::result(params, start_row))
  }

  fn generate_assignments(
    table: &mut AssignmentTable<C::Base>,
    params: &Self::Params,
    start_row: usize,
  ) -> Result<Self::Output, BlueprintError> {
    let px = table.copy(params.p.x, Var::witness(0, start_row))?;
    let py = table.copy(params.p.y, Var::witness(1, start_row))?;
    let qx = table.copy(params.q.x, Var::witness(2, start_row))?;
    let qy = table.copy(params.q.y, Var::witness(3, start_row))?;
    for (name, x, y) in [("P", px, py), ("Q", qx, qy)] {
      if x.is_zero_vartime() && !y.is_zero_vartime() {
        return Err(BlueprintError::ValueOutOfRange {
          reason: format!("{name} has x = 0 and y != 0, which collides with the identity encoding"),
        });
      }
    }

    let (rx, ry) = Self::add((px, py), (qx, qy));
    trace!(start_row, "unified addition");

    let zero = C::Base::ZERO;
    let (dx_inv, sy_inv) = if px != qx {
      (inverse_or_zero(qx - px), zero)
    } else if py != -qy {
      (zero, inverse_or_zero(py + qy))
    } else {
      (zero, zero)
    };

    let row = [
      px,
      py,
      qx,
      qy,
      rx,
      ry,
      inverse_or_zero(px),
      inverse_or_zero(qx),
      dx_inv,
      sy_inv,
      Self::slope((px, py), (qx, qy)),
    ];
    for (column, value) in row.into_iter().enumerate() {
      table.assign_witness(column, start_row, value)?;
    }
    Ok(<Self as Gadget<C::Base>>::result(params, start_row))
  }
}
