// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! Polynomial constraint expressions over table variables.
use super::Var;
use crate::errors::BlueprintError;
use core::ops::{Add, Mul, Neg, Sub};
use ff::PrimeField;
use serde::{Deserialize, Serialize};

/// A multivariate polynomial over [`Var`]s with coefficients in `F`.
///
/// A constraint built from an expression is satisfied on a row when the
/// expression evaluates to zero there.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expression<F> {
  /// a field constant
  Constant(F),
  /// the value of a table cell
  Var(Var),
  /// `-e`
  Negated(Box<Expression<F>>),
  /// `a + b`
  Sum(Box<Expression<F>>, Box<Expression<F>>),
  /// `a * b`
  Product(Box<Expression<F>>, Box<Expression<F>>),
  /// `e * c` for a constant `c`
  Scaled(Box<Expression<F>>, F),
}

impl<F: PrimeField> Expression<F> {
  /// The constant zero.
  pub fn zero() -> Self {
    Expression::Constant(F::ZERO)
  }

  /// The constant one.
  pub fn one() -> Self {
    Expression::Constant(F::ONE)
  }

  /// Multiplies by a constant.
  pub fn scale(self, c: F) -> Self {
    Expression::Scaled(Box::new(self), c)
  }

  /// `self * self`
  pub fn square(self) -> Self {
    self.clone() * self
  }

  /// Sums an iterator of expressions; the empty sum is zero.
  pub fn sum<I: IntoIterator<Item = Expression<F>>>(terms: I) -> Self {
    terms
      .into_iter()
      .reduce(|acc, t| acc + t)
      .unwrap_or_else(Self::zero)
  }

  /// Multiplies an iterator of expressions; the empty product is one.
  pub fn product<I: IntoIterator<Item = Expression<F>>>(terms: I) -> Self {
    terms
      .into_iter()
      .reduce(|acc, t| acc * t)
      .unwrap_or_else(Self::one)
  }

  /// Total degree of the polynomial (an upper bound, no cancellation is tracked).
  pub fn degree(&self) -> usize {
    match self {
      Expression::Constant(_) => 0,
      Expression::Var(_) => 1,
      Expression::Negated(e) | Expression::Scaled(e, _) => e.degree(),
      Expression::Sum(a, b) => a.degree().max(b.degree()),
      Expression::Product(a, b) => a.degree() + b.degree(),
    }
  }

  /// Evaluates the expression, reading variables through `resolve`.
  pub fn evaluate<R>(&self, resolve: &R) -> Result<F, BlueprintError>
  where
    R: Fn(&Var) -> Result<F, BlueprintError>,
  {
    Ok(match self {
      Expression::Constant(c) => *c,
      Expression::Var(v) => resolve(v)?,
      Expression::Negated(e) => -e.evaluate(resolve)?,
      Expression::Sum(a, b) => a.evaluate(resolve)? + b.evaluate(resolve)?,
      Expression::Product(a, b) => a.evaluate(resolve)? * b.evaluate(resolve)?,
      Expression::Scaled(e, c) => e.evaluate(resolve)? * c,
    })
  }
}

impl<F> From<Var> for Expression<F> {
  fn from(v: Var) -> Self {
    Expression::Var(v)
  }
}

impl<F: PrimeField> Neg for Expression<F> {
  type Output = Expression<F>;
  fn neg(self) -> Self::Output {
    Expression::Negated(Box::new(self))
  }
}

impl<F: PrimeField> Add for Expression<F> {
  type Output = Expression<F>;
  fn add(self, rhs: Self) -> Self::Output {
    Expression::Sum(Box::new(self), Box::new(rhs))
  }
}

impl<F: PrimeField> Sub for Expression<F> {
  type Output = Expression<F>;
  fn sub(self, rhs: Self) -> Self::Output {
    self + (-rhs)
  }
}

impl<F: PrimeField> Mul for Expression<F> {
  type Output = Expression<F>;
  fn mul(self, rhs: Self) -> Self::Output {
    Expression::Product(Box::new(self), Box::new(rhs))
  }
}

impl<F: PrimeField> Add<Var> for Expression<F> {
  type Output = Expression<F>;
  fn add(self, rhs: Var) -> Self::Output {
    self + Expression::from(rhs)
  }
}

impl<F: PrimeField> Sub<Var> for Expression<F> {
  type Output = Expression<F>;
  fn sub(self, rhs: Var) -> Self::Output {
    self - Expression::from(rhs)
  }
}

impl<F: PrimeField> Mul<Var> for Expression<F> {
  type Output = Expression<F>;
  fn mul(self, rhs: Var) -> Self::Output {
    self * Expression::from(rhs)
  }
}
