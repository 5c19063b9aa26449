// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! This library implements constraint-system gadgets for zero-knowledge
//! circuits: a PLONK gadget protocol (rows, custom gates, selectors and copy
//! constraints) with gadgets for unified elliptic-curve addition, SHA-512
//! compression and an in-circuit Fiat-Shamir transcript, plus R1CS gadgets
//! written against `bellpepper-core`.
#![deny(
  warnings,
  unused,
  future_incompatible,
  nonstandard_style,
  rust_2018_idioms,
  missing_docs
)]
#![allow(non_snake_case)]
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::type_complexity)]
#![forbid(unsafe_code)]

// public modules
pub mod digest;
pub mod errors;
pub mod gadgets;
pub mod plonk;
pub mod r1cs;

/// Start a span + timer, return `(Span, Instant)`.
macro_rules! start_span {
    ($name:expr $(, $($fmt:tt)+)?) => {{
        let span       = tracing::info_span!($name $(, $($fmt)+)?);
        let span_clone = span.clone();    // lives as long as the guard
        let _guard      = span_clone.enter();
        (span, std::time::Instant::now())
    }};
}
pub(crate) use start_span;
