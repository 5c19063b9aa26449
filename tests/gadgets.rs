// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

use bellpepper_core::{ConstraintSystem, num::AllocatedNum, test_cs::TestConstraintSystem};
use blueprint::{
  gadgets::{
    NativeTranscript, RangeCheck, RangeCheckParams, Transcript, UnifiedAddition,
    UnifiedAdditionParams, VarEcPoint, VariableBaseScalarMul, VariableBaseScalarMulParams,
  },
  plonk::{ArithmetizationParams, AssignmentTable, Gadget, PlonkCS, Var},
  r1cs::{Fp3, Fp6, Fp6Var, disjunction},
};
use ff::Field;
use group::{Curve, Group};
use halo2curves::{
  Coordinates, CurveAffine,
  pasta::{Fp, Fq, Pallas, PallasAffine},
};
use proptest::prelude::*;
use rand::{Rng, SeedableRng, rngs::StdRng};

type Add = UnifiedAddition<PallasAffine>;

fn coordinates(p: Pallas) -> (Fp, Fp) {
  let c: Option<Coordinates<PallasAffine>> = p.to_affine().coordinates().into();
  c.map(|c| (*c.x(), *c.y())).unwrap_or((Fp::ZERO, Fp::ZERO))
}

fn public_point(row: usize) -> VarEcPoint {
  VarEcPoint {
    x: Var::public_input(0, row),
    y: Var::public_input(0, row + 1),
  }
}

#[test]
fn point_sum_chain_shares_one_gate() {
  let mut rng = StdRng::seed_from_u64(11);
  let points: Vec<Pallas> = (0..6).map(|_| Pallas::random(&mut rng)).collect();

  let mut table = AssignmentTable::new(ArithmetizationParams::default());
  for (i, p) in points.iter().enumerate() {
    let (x, y) = coordinates(*p);
    table.assign_public_input(0, 2 * i, x).unwrap();
    table.assign_public_input(0, 2 * i + 1, y).unwrap();
  }

  let mut cs = PlonkCS::new();
  let mut acc = public_point(0);
  for i in 1..points.len() {
    let params = UnifiedAdditionParams {
      p: acc,
      q: public_point(2 * i),
    };
    let row = (i - 1) * <Add as Gadget<Fp>>::ROWS_AMOUNT;
    Add::generate_circuit(&mut cs, &mut table, &params, row).unwrap();
    acc = Add::generate_assignments(&mut table, &params, row).unwrap();
  }

  assert_eq!(cs.num_gates(), 1);
  assert_eq!(table.selector_columns(), 1);
  assert!(cs.is_sat(&table).is_ok());

  let sum = points.iter().fold(Pallas::identity(), |acc, p| acc + p);
  assert_eq!(
    (table.value(acc.x).unwrap(), table.value(acc.y).unwrap()),
    coordinates(sum)
  );
}

proptest! {
  #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]

  #[test]
  fn unified_addition_matches_group(seed in any::<u64>(), identity in 0u8..4) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut p = Pallas::random(&mut rng);
    let mut q = Pallas::random(&mut rng);
    match identity {
      1 => p = Pallas::identity(),
      2 => q = Pallas::identity(),
      3 => q = -p,
      _ => {}
    }

    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    let (px, py) = coordinates(p);
    let (qx, qy) = coordinates(q);
    for (row, v) in [px, py, qx, qy].into_iter().enumerate() {
      table.assign_public_input(0, row, v).unwrap();
    }
    let params = UnifiedAdditionParams { p: public_point(0), q: public_point(2) };
    let mut cs = PlonkCS::new();
    Add::generate_circuit(&mut cs, &mut table, &params, 0).unwrap();
    let out = Add::generate_assignments(&mut table, &params, 0).unwrap();

    prop_assert!(cs.is_sat(&table).is_ok());
    prop_assert_eq!(
      (table.value(out.x).unwrap(), table.value(out.y).unwrap()),
      coordinates(p + q)
    );
  }

  #[test]
  fn scalar_mul_matches_group(seed in any::<u64>(), k in any::<u64>()) {
    type Mul = VariableBaseScalarMul<PallasAffine, 64>;
    let mut rng = StdRng::seed_from_u64(seed);
    let t = Pallas::random(&mut rng);

    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    let (tx, ty) = coordinates(t);
    for (row, v) in [tx, ty, Fp::from(k)].into_iter().enumerate() {
      table.assign_public_input(0, row, v).unwrap();
    }
    let params = VariableBaseScalarMulParams {
      point: public_point(0),
      scalar: Var::public_input(0, 2),
    };
    let mut cs = PlonkCS::new();
    Mul::generate_circuit(&mut cs, &mut table, &params, 0).unwrap();
    let out = Mul::generate_assignments(&mut table, &params, 0).unwrap();

    prop_assert!(cs.is_sat(&table).is_ok());
    prop_assert_eq!(cs.num_gates(), 2);
    prop_assert_eq!(
      (table.value(out.x).unwrap(), table.value(out.y).unwrap()),
      coordinates(t * Fq::from(k))
    );
  }

  #[test]
  fn range_check_accepts_exactly_in_range(x in any::<u64>(), bits in 1u32..=64) {
    let value = x >> (64 - bits);
    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    table.assign_public_input(0, 0, Fp::from(value)).unwrap();
    let params = RangeCheckParams { x: Var::public_input(0, 0) };

    let mut cs = PlonkCS::new();
    RangeCheck::<32>::generate_circuit(&mut cs, &mut table, &params, 0).unwrap();
    RangeCheck::<32>::generate_assignments(&mut table, &params, 0).unwrap();
    prop_assert_eq!(cs.is_sat(&table).is_ok(), value < 1 << 32);
  }

  #[test]
  fn transcript_matches_native(values in prop::collection::vec(any::<u64>(), 1..4)) {
    let mut table = AssignmentTable::new(ArithmetizationParams::default());
    table.assign_public_input(0, 0, Fp::ZERO).unwrap();
    for (i, v) in values.iter().enumerate() {
      table.assign_public_input(0, 1 + i, Fp::from(*v)).unwrap();
    }
    let zero = Var::public_input(0, 0);

    let mut cs = PlonkCS::new();
    let mut transcript = Transcript::<2>::new(zero);
    let mut row = 0;
    for i in 0..values.len() {
      transcript.absorb_circuit(&mut cs, &mut table, Var::public_input(0, 1 + i), &mut row).unwrap();
    }
    transcript.challenge_circuit(&mut cs, &mut table, &mut row).unwrap();

    transcript.init(zero);
    let mut row = 0;
    for i in 0..values.len() {
      transcript.absorb_assignment(&mut table, Var::public_input(0, 1 + i), &mut row).unwrap();
    }
    let challenge = transcript.challenge_assignment(&mut table, &mut row).unwrap();

    let mut native = NativeTranscript::<Fp, 2>::new();
    for v in &values {
      native.absorb(Fp::from(*v));
    }
    prop_assert_eq!(table.value(challenge).unwrap(), native.challenge());
    prop_assert!(cs.is_sat(&table).is_ok());
  }

  #[test]
  fn disjunction_is_or(bits in prop::collection::vec(any::<bool>(), 1..8)) {
    let mut cs = TestConstraintSystem::<Fq>::new();
    let inputs: Vec<AllocatedNum<Fq>> = bits
      .iter()
      .enumerate()
      .map(|(i, b)| {
        AllocatedNum::alloc(cs.namespace(|| format!("bit {i}")), || Ok(Fq::from(u64::from(*b))))
      })
      .collect::<Result<_, _>>()
      .unwrap();
    let out = disjunction(cs.namespace(|| "or"), &inputs).unwrap();
    let expected = if bits.iter().any(|b| *b) { Fq::ONE } else { Fq::ZERO };
    prop_assert_eq!(out.get_value(), Some(expected));
    prop_assert!(cs.is_satisfied());
  }

  #[test]
  fn fp6_mul_matches_native(seed in any::<u64>()) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut fp3 = || Fp3 {
      c0: Fq::from(rng.r#gen::<u64>()),
      c1: Fq::from(rng.r#gen::<u64>()),
      c2: Fq::from(rng.r#gen::<u64>()),
    };
    let a = Fp6 { c0: fp3(), c1: fp3() };
    let b = Fp6 { c0: fp3(), c1: fp3() };
    let beta = Fq::from(7);

    let mut cs = TestConstraintSystem::<Fq>::new();
    let a_var = Fp6Var::alloc(cs.namespace(|| "a"), Some(a)).unwrap();
    let b_var = Fp6Var::alloc(cs.namespace(|| "b"), Some(b)).unwrap();
    let out = a_var.mul(cs.namespace(|| "mul"), &b_var, beta).unwrap();
    prop_assert_eq!(out.get_value(), Some(a.mul(&b, beta)));
    prop_assert_eq!(b.mul(&a, beta), a.mul(&b, beta));
    prop_assert!(cs.is_satisfied());
  }
}
