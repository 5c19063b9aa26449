// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! Multiplication in the extension fields `Fp2 = F[u]/(u² − β)`,
//! `Fp3 = F[u]/(u³ − β)` and `Fp6 = Fp3[v]/(v² − u)`.
//!
//! The non-residue `β` is a parameter of every multiplication; it is the
//! caller's job to pick one for which the polynomial is irreducible.
use bellpepper_core::{ConstraintSystem, LinearCombination, SynthesisError, num::AllocatedNum};
use ff::PrimeField;

/// An element `c0 + c1·u` of `Fp2`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fp2<F> {
  /// constant coefficient
  pub c0: F,
  /// coefficient of `u`
  pub c1: F,
}

impl<F: PrimeField> Fp2<F> {
  /// The product, with `u² = non_residue`.
  pub fn mul(&self, other: &Self, non_residue: F) -> Self {
    let v0 = self.c0 * other.c0;
    let v1 = self.c1 * other.c1;
    Fp2 {
      c0: v0 + non_residue * v1,
      c1: (self.c0 + self.c1) * (other.c0 + other.c1) - v0 - v1,
    }
  }
}

/// An element `c0 + c1·u + c2·u²` of `Fp3`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fp3<F> {
  /// constant coefficient
  pub c0: F,
  /// coefficient of `u`
  pub c1: F,
  /// coefficient of `u²`
  pub c2: F,
}

impl<F: PrimeField> Fp3<F> {
  fn coefficients(&self) -> [F; 3] {
    [self.c0, self.c1, self.c2]
  }

  /// The sum.
  pub fn add(&self, other: &Self) -> Self {
    Fp3 {
      c0: self.c0 + other.c0,
      c1: self.c1 + other.c1,
      c2: self.c2 + other.c2,
    }
  }

  /// The difference.
  pub fn sub(&self, other: &Self) -> Self {
    Fp3 {
      c0: self.c0 - other.c0,
      c1: self.c1 - other.c1,
      c2: self.c2 - other.c2,
    }
  }

  /// The product, with `u³ = non_residue`.
  pub fn mul(&self, other: &Self, non_residue: F) -> Self {
    let [a0, a1, a2] = self.coefficients();
    let [b0, b1, b2] = other.coefficients();
    let (v0, v1, v2) = (a0 * b0, a1 * b1, a2 * b2);
    Fp3 {
      c0: v0 + non_residue * ((a1 + a2) * (b1 + b2) - v1 - v2),
      c1: (a0 + a1) * (b0 + b1) - v0 - v1 + non_residue * v2,
      c2: (a0 + a2) * (b0 + b2) - v0 - v2 + v1,
    }
  }

  /// Multiplication by `u`: `(β·c2, c0, c1)`.
  pub fn mul_by_u(&self, non_residue: F) -> Self {
    Fp3 {
      c0: non_residue * self.c2,
      c1: self.c0,
      c2: self.c1,
    }
  }
}

/// An element `c0 + c1·v` of `Fp6` over [`Fp3`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fp6<F> {
  /// constant coefficient
  pub c0: Fp3<F>,
  /// coefficient of `v`
  pub c1: Fp3<F>,
}

impl<F: PrimeField> Fp6<F> {
  /// The product, with `v² = u` and `u³ = non_residue`.
  pub fn mul(&self, other: &Self, non_residue: F) -> Self {
    let v0 = self.c0.mul(&other.c0, non_residue);
    let v1 = self.c1.mul(&other.c1, non_residue);
    let cross = self.c0.add(&self.c1).mul(&other.c0.add(&other.c1), non_residue);
    Fp6 {
      c0: v0.add(&v1.mul_by_u(non_residue)),
      c1: cross.sub(&v0).sub(&v1),
    }
  }
}

/// A linear combination together with its value, if known.
#[derive(Clone)]
struct Term<F: PrimeField> {
  lc: LinearCombination<F>,
  value: Option<F>,
}

impl<F: PrimeField> Term<F> {
  fn from_num(num: &AllocatedNum<F>) -> Self {
    Term {
      lc: LinearCombination::zero() + num.get_variable(),
      value: num.get_value(),
    }
  }

  fn add(&self, other: &Self) -> Self {
    Term {
      lc: self.lc.clone() + &other.lc,
      value: self.value.zip(other.value).map(|(a, b)| a + b),
    }
  }

  fn scale(&self, k: F) -> Self {
    Term {
      lc: LinearCombination::zero() + (k, &self.lc),
      value: self.value.map(|v| v * k),
    }
  }
}

fn alloc_coefficient<F, CS>(cs: CS, value: Option<F>) -> Result<AllocatedNum<F>, SynthesisError>
where
  F: PrimeField,
  CS: ConstraintSystem<F>,
{
  AllocatedNum::alloc(cs, || value.ok_or(SynthesisError::AssignmentMissing))
}

/// Allocates `x·y` and enforces it.
fn product<F, CS>(mut cs: CS, x: &Term<F>, y: &Term<F>) -> Result<AllocatedNum<F>, SynthesisError>
where
  F: PrimeField,
  CS: ConstraintSystem<F>,
{
  let value = x.value.zip(y.value).map(|(a, b)| a * b);
  let v = alloc_coefficient(cs.namespace(|| "value"), value)?;
  cs.enforce(
    || "x * y = value",
    |lc| lc + &x.lc,
    |lc| lc + &y.lc,
    |lc| lc + v.get_variable(),
  );
  Ok(v)
}

/// An allocated [`Fp2`] element.
#[derive(Clone)]
pub struct Fp2Var<F: PrimeField> {
  /// constant coefficient
  pub c0: AllocatedNum<F>,
  /// coefficient of `u`
  pub c1: AllocatedNum<F>,
}

impl<F: PrimeField> Fp2Var<F> {
  /// Allocates the two coefficients of `value`.
  pub fn alloc<CS>(mut cs: CS, value: Option<Fp2<F>>) -> Result<Self, SynthesisError>
  where
    CS: ConstraintSystem<F>,
  {
    Ok(Fp2Var {
      c0: alloc_coefficient(cs.namespace(|| "c0"), value.map(|v| v.c0))?,
      c1: alloc_coefficient(cs.namespace(|| "c1"), value.map(|v| v.c1))?,
    })
  }

  /// The value, if assigned.
  pub fn get_value(&self) -> Option<Fp2<F>> {
    Some(Fp2 {
      c0: self.c0.get_value()?,
      c1: self.c1.get_value()?,
    })
  }

  /// Karatsuba multiplication in four constraints.
  pub fn mul<CS>(&self, mut cs: CS, other: &Self, non_residue: F) -> Result<Self, SynthesisError>
  where
    CS: ConstraintSystem<F>,
  {
    let [a0, a1] = [&self.c0, &self.c1].map(Term::from_num);
    let [b0, b1] = [&other.c0, &other.c1].map(Term::from_num);
    let v0 = product(cs.namespace(|| "a0 * b0"), &a0, &b0)?;
    let v1 = product(cs.namespace(|| "a1 * b1"), &a1, &b1)?;

    let result = self
      .get_value()
      .zip(other.get_value())
      .map(|(a, b)| a.mul(&b, non_residue));
    let out = Fp2Var::alloc(cs.namespace(|| "result"), result)?;

    cs.enforce(
      || "c0 = v0 + beta * v1",
      |lc| lc + CS::one(),
      |lc| lc + v0.get_variable() + (non_residue, v1.get_variable()),
      |lc| lc + out.c0.get_variable(),
    );
    cs.enforce(
      || "(a0 + a1) * (b0 + b1) = c1 + v0 + v1",
      |lc| lc + &a0.lc + &a1.lc,
      |lc| lc + &b0.lc + &b1.lc,
      |lc| lc + out.c1.get_variable() + v0.get_variable() + v1.get_variable(),
    );
    Ok(out)
  }
}

/// An allocated [`Fp3`] element.
#[derive(Clone)]
pub struct Fp3Var<F: PrimeField> {
  /// constant coefficient
  pub c0: AllocatedNum<F>,
  /// coefficient of `u`
  pub c1: AllocatedNum<F>,
  /// coefficient of `u²`
  pub c2: AllocatedNum<F>,
}

impl<F: PrimeField> Fp3Var<F> {
  /// Allocates the three coefficients of `value`.
  pub fn alloc<CS>(mut cs: CS, value: Option<Fp3<F>>) -> Result<Self, SynthesisError>
  where
    CS: ConstraintSystem<F>,
  {
    Ok(Fp3Var {
      c0: alloc_coefficient(cs.namespace(|| "c0"), value.map(|v| v.c0))?,
      c1: alloc_coefficient(cs.namespace(|| "c1"), value.map(|v| v.c1))?,
      c2: alloc_coefficient(cs.namespace(|| "c2"), value.map(|v| v.c2))?,
    })
  }

  /// The value, if assigned.
  pub fn get_value(&self) -> Option<Fp3<F>> {
    Some(Fp3 {
      c0: self.c0.get_value()?,
      c1: self.c1.get_value()?,
      c2: self.c2.get_value()?,
    })
  }

  fn terms(&self) -> [Term<F>; 3] {
    [&self.c0, &self.c1, &self.c2].map(Term::from_num)
  }

  /// Multiplication in six constraints.
  pub fn mul<CS>(&self, cs: CS, other: &Self, non_residue: F) -> Result<Self, SynthesisError>
  where
    CS: ConstraintSystem<F>,
  {
    mul_fp3_terms(cs, &self.terms(), &other.terms(), non_residue)
  }
}

fn fp3_value<F: PrimeField>(terms: &[Term<F>; 3]) -> Option<Fp3<F>> {
  Some(Fp3 {
    c0: terms[0].value?,
    c1: terms[1].value?,
    c2: terms[2].value?,
  })
}

/// `Fp3` multiplication of coefficients given as linear combinations.
fn mul_fp3_terms<F, CS>(
  mut cs: CS,
  a: &[Term<F>; 3],
  b: &[Term<F>; 3],
  non_residue: F,
) -> Result<Fp3Var<F>, SynthesisError>
where
  F: PrimeField,
  CS: ConstraintSystem<F>,
{
  let v0 = product(cs.namespace(|| "a0 * b0"), &a[0], &b[0])?;
  let v1 = product(cs.namespace(|| "a1 * b1"), &a[1], &b[1])?;
  let v2 = product(cs.namespace(|| "a2 * b2"), &a[2], &b[2])?;

  let result = fp3_value(a)
    .zip(fp3_value(b))
    .map(|(x, y)| x.mul(&y, non_residue));
  let out = Fp3Var::alloc(cs.namespace(|| "result"), result)?;

  let scaled = [a[1].scale(non_residue), a[2].scale(non_residue)];
  cs.enforce(
    || "beta * (a1 + a2) * (b1 + b2) = c0 - v0 + beta * (v1 + v2)",
    |lc| lc + &scaled[0].lc + &scaled[1].lc,
    |lc| lc + &b[1].lc + &b[2].lc,
    |lc| {
      lc + out.c0.get_variable() - v0.get_variable()
        + (non_residue, v1.get_variable())
        + (non_residue, v2.get_variable())
    },
  );
  cs.enforce(
    || "(a0 + a1) * (b0 + b1) = c1 + v0 + v1 - beta * v2",
    |lc| lc + &a[0].lc + &a[1].lc,
    |lc| lc + &b[0].lc + &b[1].lc,
    |lc| {
      lc + out.c1.get_variable() + v0.get_variable() + v1.get_variable()
        - (non_residue, v2.get_variable())
    },
  );
  cs.enforce(
    || "(a0 + a2) * (b0 + b2) = c2 + v0 + v2 - v1",
    |lc| lc + &a[0].lc + &a[2].lc,
    |lc| lc + &b[0].lc + &b[2].lc,
    |lc| lc + out.c2.get_variable() + v0.get_variable() + v2.get_variable() - v1.get_variable(),
  );
  Ok(out)
}

/// An allocated [`Fp6`] element.
#[derive(Clone)]
pub struct Fp6Var<F: PrimeField> {
  /// constant coefficient
  pub c0: Fp3Var<F>,
  /// coefficient of `v`
  pub c1: Fp3Var<F>,
}

impl<F: PrimeField> Fp6Var<F> {
  /// Allocates the six base-field coefficients of `value`.
  pub fn alloc<CS>(mut cs: CS, value: Option<Fp6<F>>) -> Result<Self, SynthesisError>
  where
    CS: ConstraintSystem<F>,
  {
    Ok(Fp6Var {
      c0: Fp3Var::alloc(cs.namespace(|| "c0"), value.map(|v| v.c0))?,
      c1: Fp3Var::alloc(cs.namespace(|| "c1"), value.map(|v| v.c1))?,
    })
  }

  /// The value, if assigned.
  pub fn get_value(&self) -> Option<Fp6<F>> {
    Some(Fp6 {
      c0: self.c0.get_value()?,
      c1: self.c1.get_value()?,
    })
  }

  /// Karatsuba over `Fp3`: three `Fp3` products, then six linear constraints
  /// recombining them.
  pub fn mul<CS>(&self, mut cs: CS, other: &Self, non_residue: F) -> Result<Self, SynthesisError>
  where
    CS: ConstraintSystem<F>,
  {
    let (a0, a1) = (self.c0.terms(), self.c1.terms());
    let (b0, b1) = (other.c0.terms(), other.c1.terms());
    let a_sum: [Term<F>; 3] = core::array::from_fn(|i| a0[i].add(&a1[i]));
    let b_sum: [Term<F>; 3] = core::array::from_fn(|i| b0[i].add(&b1[i]));

    let v0 = mul_fp3_terms(cs.namespace(|| "a0 * b0"), &a0, &b0, non_residue)?;
    let v1 = mul_fp3_terms(cs.namespace(|| "a1 * b1"), &a1, &b1, non_residue)?;
    let cross = mul_fp3_terms(
      cs.namespace(|| "(a0 + a1) * (b0 + b1)"),
      &a_sum,
      &b_sum,
      non_residue,
    )?;

    let result = self
      .get_value()
      .zip(other.get_value())
      .map(|(a, b)| a.mul(&b, non_residue));
    let out = Fp6Var::alloc(cs.namespace(|| "result"), result)?;

    // c0 = v0 + u·v1 = (v0.c0 + β·v1.c2, v0.c1 + v1.c0, v0.c2 + v1.c1)
    let shifted = [
      (non_residue, &v1.c2),
      (F::ONE, &v1.c0),
      (F::ONE, &v1.c1),
    ];
    let v0_coeffs = [&v0.c0, &v0.c1, &v0.c2];
    let c0_coeffs = [&out.c0.c0, &out.c0.c1, &out.c0.c2];
    for i in 0..3 {
      let (k, v1_coeff) = shifted[i];
      cs.enforce(
        || format!("c0[{i}] = v0[{i}] + (u * v1)[{i}]"),
        |lc| lc + CS::one(),
        |lc| lc + v0_coeffs[i].get_variable() + (k, v1_coeff.get_variable()),
        |lc| lc + c0_coeffs[i].get_variable(),
      );
    }

    // c1 = cross − v0 − v1
    let v1_coeffs = [&v1.c0, &v1.c1, &v1.c2];
    let cross_coeffs = [&cross.c0, &cross.c1, &cross.c2];
    let c1_coeffs = [&out.c1.c0, &out.c1.c1, &out.c1.c2];
    for i in 0..3 {
      cs.enforce(
        || format!("c1[{i}] = cross[{i}] - v0[{i}] - v1[{i}]"),
        |lc| lc + CS::one(),
        |lc| {
          lc + cross_coeffs[i].get_variable()
            - v0_coeffs[i].get_variable()
            - v1_coeffs[i].get_variable()
        },
        |lc| lc + c1_coeffs[i].get_variable(),
      );
    }
    Ok(out)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use bellpepper_core::test_cs::TestConstraintSystem;
  use ff::Field;
  use halo2curves::pasta::Fq;
  use rand::{SeedableRng, rngs::StdRng};

  fn beta() -> Fq {
    Fq::from(5)
  }

  fn random_fp3(rng: &mut StdRng) -> Fp3<Fq> {
    Fp3 {
      c0: Fq::random(&mut *rng),
      c1: Fq::random(&mut *rng),
      c2: Fq::random(&mut *rng),
    }
  }

  #[test]
  fn test_native_fp3_against_schoolbook() {
    let mut rng = StdRng::seed_from_u64(7);
    let (a, b) = (random_fp3(&mut rng), random_fp3(&mut rng));
    let [a0, a1, a2] = a.coefficients();
    let [b0, b1, b2] = b.coefficients();
    let expected = Fp3 {
      c0: a0 * b0 + beta() * (a1 * b2 + a2 * b1),
      c1: a0 * b1 + a1 * b0 + beta() * a2 * b2,
      c2: a0 * b2 + a2 * b0 + a1 * b1,
    };
    assert_eq!(a.mul(&b, beta()), expected);
  }

  #[test]
  fn test_native_fp6_v_squared_is_u() {
    let v = Fp6 {
      c0: Fp3::default(),
      c1: Fp3 {
        c0: Fq::ONE,
        ..Default::default()
      },
    };
    let u = Fp6 {
      c0: Fp3 {
        c1: Fq::ONE,
        ..Default::default()
      },
      c1: Fp3::default(),
    };
    assert_eq!(v.mul(&v, beta()), u);
  }

  #[test]
  fn test_fp2_mul() {
    let mut rng = StdRng::seed_from_u64(1);
    let a = Fp2 {
      c0: Fq::random(&mut rng),
      c1: Fq::random(&mut rng),
    };
    let b = Fp2 {
      c0: Fq::random(&mut rng),
      c1: Fq::random(&mut rng),
    };

    let mut cs = TestConstraintSystem::<Fq>::new();
    let a_var = Fp2Var::alloc(cs.namespace(|| "a"), Some(a)).unwrap();
    let b_var = Fp2Var::alloc(cs.namespace(|| "b"), Some(b)).unwrap();
    let out = a_var.mul(cs.namespace(|| "mul"), &b_var, beta()).unwrap();

    assert_eq!(out.get_value(), Some(a.mul(&b, beta())));
    assert!(cs.is_satisfied());
    assert_eq!(cs.num_constraints(), 4);

    cs.set("mul/result/c1/num", Fq::ONE);
    assert!(!cs.is_satisfied());
  }

  #[test]
  fn test_fp3_mul() {
    let mut rng = StdRng::seed_from_u64(2);
    let (a, b) = (random_fp3(&mut rng), random_fp3(&mut rng));

    let mut cs = TestConstraintSystem::<Fq>::new();
    let a_var = Fp3Var::alloc(cs.namespace(|| "a"), Some(a)).unwrap();
    let b_var = Fp3Var::alloc(cs.namespace(|| "b"), Some(b)).unwrap();
    let out = a_var.mul(cs.namespace(|| "mul"), &b_var, beta()).unwrap();

    assert_eq!(out.get_value(), Some(a.mul(&b, beta())));
    assert!(cs.is_satisfied());
    assert_eq!(cs.num_constraints(), 6);

    cs.set("mul/result/c0/num", Fq::ZERO);
    assert!(!cs.is_satisfied());
  }

  #[test]
  fn test_fp6_mul() {
    let mut rng = StdRng::seed_from_u64(3);
    let a = Fp6 {
      c0: random_fp3(&mut rng),
      c1: random_fp3(&mut rng),
    };
    let b = Fp6 {
      c0: random_fp3(&mut rng),
      c1: random_fp3(&mut rng),
    };

    let mut cs = TestConstraintSystem::<Fq>::new();
    let a_var = Fp6Var::alloc(cs.namespace(|| "a"), Some(a)).unwrap();
    let b_var = Fp6Var::alloc(cs.namespace(|| "b"), Some(b)).unwrap();
    let out = a_var.mul(cs.namespace(|| "mul"), &b_var, beta()).unwrap();

    assert_eq!(out.get_value(), Some(a.mul(&b, beta())));
    assert!(cs.is_satisfied());
    assert_eq!(cs.num_constraints(), 3 * 6 + 6);

    cs.set("mul/result/c1/c2/num", Fq::ONE);
    assert!(!cs.is_satisfied());
  }

  #[test]
  fn test_missing_witness_is_an_error() {
    let mut cs = TestConstraintSystem::<Fq>::new();
    assert!(Fp2Var::<Fq>::alloc(cs.namespace(|| "a"), None).is_err());
  }
}
