// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! Conversions between field elements and integers used by witness generation.
use crate::errors::BlueprintError;
use ff::{Field, PrimeField, PrimeFieldBits};
use num_bigint::BigUint;
use num_traits::ToPrimitive;

/// The canonical integer representative of a field element.
pub(crate) fn to_biguint<F: PrimeFieldBits>(v: &F) -> BigUint {
  let mut bytes = vec![0u8; (F::NUM_BITS as usize).div_ceil(8)];
  for (i, bit) in v.to_le_bits().into_iter().enumerate().take(F::NUM_BITS as usize) {
    if bit {
      bytes[i / 8] |= 1 << (i % 8);
    }
  }
  BigUint::from_bytes_le(&bytes)
}

/// Reduces an integer into the field.
pub(crate) fn from_biguint<F: PrimeField>(v: &BigUint) -> F {
  let shift = F::from(u64::MAX) + F::ONE;
  v.iter_u64_digits()
    .rev()
    .fold(F::ZERO, |acc, digit| acc * shift + F::from(digit))
}

/// The field element as a `u64`, or a range error naming `what`.
pub(crate) fn to_u64<F: PrimeFieldBits>(v: &F, what: &str) -> Result<u64, BlueprintError> {
  to_biguint(v)
    .to_u64()
    .ok_or_else(|| BlueprintError::ValueOutOfRange {
      reason: format!("{what} does not fit in 64 bits"),
    })
}

/// `v⁻¹`, or zero when `v` is zero.
pub(crate) fn inverse_or_zero<F: Field>(v: F) -> F {
  v.invert().unwrap_or(F::ZERO)
}

/// `2^k` in the field.
pub(crate) fn pow2<F: PrimeField>(k: usize) -> F {
  F::from(2).pow_vartime([k as u64])
}

#[cfg(test)]
mod tests {
  use super::*;
  use halo2curves::pasta::Fp;

  #[test]
  fn test_biguint_conversions() {
    let v = (BigUint::from(1u8) << 200) + BigUint::from(12345u32);
    let f: Fp = from_biguint(&v);
    assert_eq!(to_biguint(&f), v);
    assert_eq!(f, pow2::<Fp>(200) + Fp::from(12345));

    let minus_one = -Fp::ONE;
    assert_eq!(from_biguint::<Fp>(&to_biguint(&minus_one)), minus_one);
  }

  #[test]
  fn test_to_u64() {
    assert_eq!(to_u64(&Fp::from(u64::MAX), "x"), Ok(u64::MAX));
    assert!(to_u64(&pow2::<Fp>(64), "x").is_err());
  }

  #[test]
  fn test_inverse_or_zero() {
    assert_eq!(inverse_or_zero(Fp::ZERO), Fp::ZERO);
    assert_eq!(inverse_or_zero(Fp::from(4)) * Fp::from(4), Fp::ONE);
  }
}
