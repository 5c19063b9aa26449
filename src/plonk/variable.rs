// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! Variables name cells of the assignment table.
use serde::{Deserialize, Serialize};

/// The kind of column a variable lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColumnKind {
  /// private witness columns, written by `generate_assignments`
  Witness,
  /// public input columns, fixed before any gadget runs
  PublicInput,
  /// constant columns, written during circuit generation
  Constant,
  /// selector columns, activating gates row by row
  Selector,
}

/// A reference to one cell of the assignment table.
///
/// An absolute variable names row `offset` directly. A relative variable only
/// makes sense inside a gate constraint, where it is resolved against the row
/// the gate is evaluated on, so offsets `-1`, `0` and `1` reach the previous,
/// current and next row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Var {
  /// the kind of column
  pub kind: ColumnKind,
  /// the column index within its kind
  pub index: usize,
  /// the row (absolute) or the rotation (relative)
  pub offset: i64,
  /// whether `offset` is an absolute row
  pub absolute: bool,
}

impl Var {
  /// Creates a variable of any kind.
  pub const fn new(kind: ColumnKind, index: usize, offset: i64, absolute: bool) -> Self {
    Var {
      kind,
      index,
      offset,
      absolute,
    }
  }

  /// An absolute witness cell.
  pub const fn witness(index: usize, row: usize) -> Self {
    Self::new(ColumnKind::Witness, index, row as i64, true)
  }

  /// An absolute public input cell.
  pub const fn public_input(index: usize, row: usize) -> Self {
    Self::new(ColumnKind::PublicInput, index, row as i64, true)
  }

  /// An absolute constant cell.
  pub const fn constant(index: usize, row: usize) -> Self {
    Self::new(ColumnKind::Constant, index, row as i64, true)
  }

  /// A witness cell relative to the row a gate is evaluated on.
  pub const fn rotated(index: usize, rotation: i64) -> Self {
    Self::new(ColumnKind::Witness, index, rotation, false)
  }

  /// A constant cell relative to the row a gate is evaluated on.
  pub const fn rotated_constant(index: usize, rotation: i64) -> Self {
    Self::new(ColumnKind::Constant, index, rotation, false)
  }

  /// Resolves the variable against a gate row, returning the absolute row it
  /// names, or `None` if that row would be negative.
  pub fn row_at(&self, gate_row: usize) -> Option<usize> {
    let row = if self.absolute {
      self.offset
    } else {
      gate_row as i64 + self.offset
    };
    usize::try_from(row).ok()
  }

  /// The absolute row of an absolute variable.
  pub fn row(&self) -> Option<usize> {
    if self.absolute {
      usize::try_from(self.offset).ok()
    } else {
      None
    }
  }
}
