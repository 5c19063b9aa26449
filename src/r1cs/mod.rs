// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! R1CS gadgets written against `bellpepper-core`'s `ConstraintSystem`.
mod disjunction;
mod extension;

pub use disjunction::disjunction;
pub use extension::{Fp2, Fp2Var, Fp3, Fp3Var, Fp6, Fp6Var};
