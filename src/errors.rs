// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! This module defines errors returned by the library.
use crate::plonk::{ColumnKind, Var};
use bellpepper_core::SynthesisError;
use core::fmt::Debug;
use thiserror::Error;

/// Errors returned by blueprint
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum BlueprintError {
  /// returned if a cell is read before any gadget has written it
  #[error("UnassignedCell: {var:?}")]
  UnassignedCell {
    /// The variable naming the unwritten cell
    var: Var,
  },
  /// returned if a relative variable is read outside of gate evaluation
  #[error("RelativeVariable: {var:?}")]
  RelativeVariable {
    /// The offending variable
    var: Var,
  },
  /// returned if a column index exceeds the table's declared column count
  #[error("ColumnOutOfRange: {kind:?} column {index}")]
  ColumnOutOfRange {
    /// The kind of column addressed
    kind: ColumnKind,
    /// The column index that was out of range
    index: usize,
  },
  /// returned if a witness value does not fit the bit width a gadget expects
  #[error("ValueOutOfRange: {reason}")]
  ValueOutOfRange {
    /// The reason for the range failure
    reason: String,
  },
  /// returned if the assignment does not satisfy a gate or copy constraint
  #[error("UnSat: {reason}")]
  UnSat {
    /// The reason for circuit UnSat failure
    reason: String,
  },
  /// return when error during R1CS synthesis
  #[error("SynthesisError: {reason}")]
  SynthesisError {
    /// The reason for circuit synthesis failure
    reason: String,
  },
  /// returned when there is an error creating a digest
  #[error("DigestError: {reason}")]
  DigestError {
    /// The reason for the digest error
    reason: String,
  },
}

impl From<SynthesisError> for BlueprintError {
  fn from(err: SynthesisError) -> Self {
    BlueprintError::SynthesisError {
      reason: err.to_string(),
    }
  }
}
