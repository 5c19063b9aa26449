// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! The assignment table: witness, public input, constant and selector columns,
//! plus the per-table selector allocation cache.
use super::{ColumnKind, Var};
use crate::errors::BlueprintError;
use ff::PrimeField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Column counts of a circuit. Selector columns are not listed here: they are
/// created on demand by selector allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArithmetizationParams {
  /// number of witness columns
  pub witness_columns: usize,
  /// number of public input columns
  pub public_input_columns: usize,
  /// number of constant columns
  pub constant_columns: usize,
}

impl Default for ArithmetizationParams {
  fn default() -> Self {
    ArithmetizationParams {
      witness_columns: 15,
      public_input_columns: 1,
      constant_columns: 3,
    }
  }
}

/// A registered range of selector columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorEntry {
  /// the gadget-specific seed the range was registered under
  pub seed: u64,
  /// index of the first selector column of the range
  pub first_selector_index: usize,
  /// number of consecutive selector columns (one per gate)
  pub gate_count: usize,
}

/// The answer of [`AssignmentTable::get_or_allocate_selector`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectorAllocation {
  /// index of the first selector column
  pub first: usize,
  /// true if the range was created by this call, in which case the caller must
  /// emit the gates bound to it
  pub fresh: bool,
}

type Column<F> = Vec<Option<F>>;

/// Storage for all cell values of a circuit.
#[derive(Clone, Debug)]
pub struct AssignmentTable<F: PrimeField> {
  witness: Vec<Column<F>>,
  public_input: Vec<Column<F>>,
  constant: Vec<Column<F>>,
  selector: Vec<Column<F>>,
  selectors_by_seed: BTreeMap<u64, SelectorEntry>,
}

fn write_cell<F: Copy>(column: &mut Column<F>, row: usize, value: F) {
  if column.len() <= row {
    column.resize(row + 1, None);
  }
  column[row] = Some(value);
}

impl<F: PrimeField> AssignmentTable<F> {
  /// Creates an empty table with the given column counts.
  pub fn new(params: ArithmetizationParams) -> Self {
    AssignmentTable {
      witness: vec![Vec::new(); params.witness_columns],
      public_input: vec![Vec::new(); params.public_input_columns],
      constant: vec![Vec::new(); params.constant_columns],
      selector: Vec::new(),
      selectors_by_seed: BTreeMap::new(),
    }
  }

  fn columns(&self, kind: ColumnKind) -> &[Column<F>] {
    match kind {
      ColumnKind::Witness => &self.witness,
      ColumnKind::PublicInput => &self.public_input,
      ColumnKind::Constant => &self.constant,
      ColumnKind::Selector => &self.selector,
    }
  }

  fn columns_mut(&mut self, kind: ColumnKind) -> &mut Vec<Column<F>> {
    match kind {
      ColumnKind::Witness => &mut self.witness,
      ColumnKind::PublicInput => &mut self.public_input,
      ColumnKind::Constant => &mut self.constant,
      ColumnKind::Selector => &mut self.selector,
    }
  }

  /// Reads a cell at an explicit row, `None` if it was never written.
  pub fn cell(&self, kind: ColumnKind, index: usize, row: usize) -> Option<F> {
    self
      .columns(kind)
      .get(index)
      .and_then(|column| column.get(row).copied().flatten())
  }

  /// Reads the cell named by an absolute variable.
  pub fn value(&self, var: Var) -> Result<F, BlueprintError> {
    if !var.absolute {
      return Err(BlueprintError::RelativeVariable { var });
    }
    var
      .row()
      .and_then(|row| self.cell(var.kind, var.index, row))
      .ok_or(BlueprintError::UnassignedCell { var })
  }

  /// Reads a cell the way a gate does: relative variables are resolved
  /// against `gate_row`.
  pub fn value_at(&self, var: &Var, gate_row: usize) -> Result<F, BlueprintError> {
    var
      .row_at(gate_row)
      .and_then(|row| self.cell(var.kind, var.index, row))
      .ok_or(BlueprintError::UnassignedCell { var: *var })
  }

  /// Writes one cell. This is the only mutator of cell values; rows grow on
  /// demand and existing values are overwritten.
  pub fn write(
    &mut self,
    kind: ColumnKind,
    index: usize,
    row: usize,
    value: F,
  ) -> Result<(), BlueprintError> {
    let column = self
      .columns_mut(kind)
      .get_mut(index)
      .ok_or(BlueprintError::ColumnOutOfRange { kind, index })?;
    write_cell(column, row, value);
    Ok(())
  }

  /// Writes a witness cell.
  pub fn assign_witness(
    &mut self,
    index: usize,
    row: usize,
    value: F,
  ) -> Result<(), BlueprintError> {
    self.write(ColumnKind::Witness, index, row, value)
  }

  /// Writes a public input cell.
  pub fn assign_public_input(
    &mut self,
    index: usize,
    row: usize,
    value: F,
  ) -> Result<(), BlueprintError> {
    self.write(ColumnKind::PublicInput, index, row, value)
  }

  /// Writes a constant cell.
  pub fn assign_constant(
    &mut self,
    index: usize,
    row: usize,
    value: F,
  ) -> Result<(), BlueprintError> {
    self.write(ColumnKind::Constant, index, row, value)
  }

  /// Writes the cell named by an absolute variable.
  pub fn assign(&mut self, var: Var, value: F) -> Result<(), BlueprintError> {
    let row = var.row().ok_or(BlueprintError::RelativeVariable { var })?;
    self.write(var.kind, var.index, row, value)
  }

  /// Propagates a value along a copy constraint: reads `from` and writes the
  /// same value into `to`. Fails if `from` is unwritten.
  pub fn copy(&mut self, from: Var, to: Var) -> Result<F, BlueprintError> {
    let value = self.value(from)?;
    self.assign(to, value)?;
    Ok(value)
  }

  /// Number of rows touched in any column.
  pub fn rows_amount(&self) -> usize {
    [
      &self.witness,
      &self.public_input,
      &self.constant,
      &self.selector,
    ]
    .iter()
    .flat_map(|columns| columns.iter().map(Vec::len))
    .max()
    .unwrap_or(0)
  }

  /// Number of selector columns allocated so far.
  pub fn selector_columns(&self) -> usize {
    self.selector.len()
  }

  /// The activation value of a selector on a row (zero when never enabled).
  pub fn selector(&self, index: usize, row: usize) -> F {
    self
      .cell(ColumnKind::Selector, index, row)
      .unwrap_or(F::ZERO)
  }

  /// Looks up the first selector index registered for `seed`.
  pub fn find_selector(&self, seed: u64) -> Option<usize> {
    self
      .selectors_by_seed
      .get(&seed)
      .map(|entry| entry.first_selector_index)
  }

  /// The full registry entry for `seed`.
  pub fn selector_entry(&self, seed: u64) -> Option<&SelectorEntry> {
    self.selectors_by_seed.get(&seed)
  }

  /// Appends `count` fresh selector columns and records them under `seed`.
  ///
  /// Not idempotent: callers following the two-step protocol check
  /// [`find_selector`](Self::find_selector) first. Prefer
  /// [`get_or_allocate_selector`](Self::get_or_allocate_selector).
  pub fn allocate_selector(&mut self, seed: u64, count: usize) -> usize {
    let first = self.selector.len();
    self.selector.extend((0..count).map(|_| Vec::new()));
    self.selectors_by_seed.insert(
      seed,
      SelectorEntry {
        seed,
        first_selector_index: first,
        gate_count: count,
      },
    );
    debug!(seed, first, count, "allocated selector range");
    first
  }

  /// Returns the selector range registered for `seed`, allocating it first if
  /// the seed is new.
  pub fn get_or_allocate_selector(&mut self, seed: u64, count: usize) -> SelectorAllocation {
    if let Some(entry) = self.selectors_by_seed.get(&seed) {
      assert_eq!(
        entry.gate_count, count,
        "selector seed {seed:#x} re-registered with a different gate count"
      );
      return SelectorAllocation {
        first: entry.first_selector_index,
        fresh: false,
      };
    }
    SelectorAllocation {
      first: self.allocate_selector(seed, count),
      fresh: true,
    }
  }

  /// Activates selector `index` on an absolute row.
  pub fn enable_selector(&mut self, index: usize, row: usize) -> Result<(), BlueprintError> {
    self.write(ColumnKind::Selector, index, row, F::ONE)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use halo2curves::pasta::Fp;

  fn table() -> AssignmentTable<Fp> {
    AssignmentTable::new(ArithmetizationParams {
      witness_columns: 2,
      public_input_columns: 1,
      constant_columns: 1,
    })
  }

  #[test]
  fn test_read_write() {
    let mut t = table();
    t.assign_witness(1, 4, Fp::from(9)).unwrap();
    assert_eq!(t.value(Var::witness(1, 4)), Ok(Fp::from(9)));
    assert_eq!(t.rows_amount(), 5);

    // overwrite
    t.assign_witness(1, 4, Fp::from(10)).unwrap();
    assert_eq!(t.value(Var::witness(1, 4)), Ok(Fp::from(10)));

    assert_eq!(
      t.value(Var::witness(1, 3)),
      Err(BlueprintError::UnassignedCell {
        var: Var::witness(1, 3)
      })
    );
    assert_eq!(
      t.value(Var::rotated(1, 0)),
      Err(BlueprintError::RelativeVariable {
        var: Var::rotated(1, 0)
      })
    );
    assert_eq!(
      t.assign_witness(2, 0, Fp::from(1)),
      Err(BlueprintError::ColumnOutOfRange {
        kind: ColumnKind::Witness,
        index: 2
      })
    );
  }

  #[test]
  fn test_copy_fails_fast_on_unwritten_source() {
    let mut t = table();
    let src = Var::public_input(0, 0);
    assert!(t.copy(src, Var::witness(0, 0)).is_err());
    t.assign_public_input(0, 0, Fp::from(3)).unwrap();
    assert_eq!(t.copy(src, Var::witness(0, 0)), Ok(Fp::from(3)));
    assert_eq!(t.value(Var::witness(0, 0)), Ok(Fp::from(3)));
  }

  #[test]
  fn test_two_step_selector_protocol() {
    let mut t = table();
    assert_eq!(t.find_selector(0xabc), None);
    let first = t.allocate_selector(0xabc, 3);
    assert_eq!(first, 0);
    assert_eq!(t.find_selector(0xabc), Some(0));

    // allocating again is not idempotent
    let again = t.allocate_selector(0xabc, 3);
    assert_eq!(again, 3);
    assert_eq!(t.selector_columns(), 6);
  }

  #[test]
  fn test_atomic_selector_allocation() {
    let mut t = table();
    let a = t.get_or_allocate_selector(0x1, 2);
    let b = t.get_or_allocate_selector(0x2, 1);
    let c = t.get_or_allocate_selector(0x1, 2);
    assert_eq!(a, SelectorAllocation { first: 0, fresh: true });
    assert_eq!(b, SelectorAllocation { first: 2, fresh: true });
    assert_eq!(c, SelectorAllocation { first: 0, fresh: false });
    assert_eq!(t.selector_columns(), 3);
    assert_eq!(t.selector_entry(0x1).map(|e| e.gate_count), Some(2));
  }

  #[test]
  fn test_enable_selector() {
    let mut t = table();
    let s = t.get_or_allocate_selector(0x7, 1).first;
    t.enable_selector(s, 2).unwrap();
    assert_eq!(t.selector(s, 2), Fp::from(1));
    assert_eq!(t.selector(s, 1), Fp::from(0));
    assert_eq!(t.selector(s, 100), Fp::from(0));
  }
}
