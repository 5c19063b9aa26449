// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the blueprint project.
// See the LICENSE file in the project root for full license information.

//! How the twenty input limbs are cut into the twenty 64-bit message words.
//!
//! The limbs are concatenated little-endian into a 1276-bit stream; word `j`
//! is stream bits `[64j, 64j + 64)`. Limb `i` is matched with word `i`: its
//! *head* is the part falling into word `i − 1`, its *body* the part inside
//! word `i` and its *tail* the part falling into word `i + 1`. Bodies are
//! stored as three chunks of 22, 22 and the remaining bits.
//!
//! Limbs and words are laid out in triples of rows, four slots per triple.
//! Relative to the middle row of a triple, slot `s` uses
//!
//! | cell | content |
//! |---|---|
//! | `(2s, −1)` | limb |
//! | `(2s, 0)` | word |
//! | `(2s + 1, −1..=1)` | body chunks |
//! | `(2s, +1)` | tail |
//! | `(8, −1)`, `(8, +1)` | head of slot 0, head of slot 1 |
//! | `(8, 0)` | the next triple's slot-0 head, borrowed into slot 3's word |
use crate::{
  errors::BlueprintError,
  gadgets::util::pow2,
  plonk::{Expression, Var},
};
use ff::PrimeField;
use once_cell::sync::Lazy;

/// Number of input limbs, and of message words.
pub const LIMBS: usize = 20;

/// Slots per row triple.
pub const SLOTS: usize = 4;

/// Number of row triples.
pub const TRIPLES: usize = LIMBS / SLOTS;

/// Rows of the decomposition section.
pub const DECOMPOSITION_ROWS: usize = 3 * TRIPLES;

/// Length in bits of the hashed stream.
pub const MESSAGE_BITS: u64 = 1276;

/// Bit of the last word carrying the padding `1`.
pub const PADDING_BIT: usize = 60;

/// Widths of the limbs: four 255-bit coordinates then one 256-bit scalar.
pub const LIMB_WIDTHS: [usize; LIMBS] = [
  66, 66, 66, 57, 66, 66, 66, 57, 66, 66, 66, 57, 66, 66, 66, 57, 66, 66, 66, 58,
];

const WORD_BITS: usize = 64;
const CHUNK_BITS: usize = 22;
const HEAD_COLUMN: usize = 8;

/// The split of one limb.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimbSplit {
  /// bits in the previous word
  pub head: usize,
  /// body chunk widths
  pub chunks: [usize; 3],
  /// bits in the next word
  pub tail: usize,
}

impl LimbSplit {
  fn body(&self) -> usize {
    self.chunks.iter().sum()
  }
}

/// Per-limb splits, derived from [`LIMB_WIDTHS`].
pub static SCHEDULE: Lazy<[LimbSplit; LIMBS]> = Lazy::new(|| {
  let mut start = 0;
  core::array::from_fn(|i| {
    let width = LIMB_WIDTHS[i];
    let word_start = WORD_BITS * i;
    let body_start = start.max(word_start);
    let body_end = (start + width).min(word_start + WORD_BITS);

    let split = LimbSplit {
      head: word_start.saturating_sub(start),
      chunks: [CHUNK_BITS, CHUNK_BITS, body_end - body_start - 2 * CHUNK_BITS],
      tail: start + width - body_end,
    };
    start += width;

    // heads only occur where the layout has a head cell, tails never cross a triple
    let slot = i % SLOTS;
    assert!(split.head == 0 || slot < 2, "limb {i} has an unplaceable head");
    assert!(split.tail == 0 || slot < SLOTS - 1, "limb {i} has an unplaceable tail");
    split
  })
});

/// A cell relative to the middle row of a triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
  /// witness column
  pub column: usize,
  /// row rotation
  pub rotation: i64,
}

impl Cell {
  const fn new(column: usize, rotation: i64) -> Self {
    Cell { column, rotation }
  }

  /// The absolute variable of this cell in the triple centred on `middle_row`.
  pub fn at(&self, middle_row: usize) -> Var {
    Var::witness(self.column, (middle_row as i64 + self.rotation) as usize)
  }

  /// The relative variable of this cell, for gate constraints.
  pub fn rotated(&self) -> Var {
    Var::rotated(self.column, self.rotation)
  }
}

/// Cell of the limb of `slot`.
pub const fn limb_cell(slot: usize) -> Cell {
  Cell::new(2 * slot, -1)
}

/// Cell of the word of `slot`.
pub const fn word_cell(slot: usize) -> Cell {
  Cell::new(2 * slot, 0)
}

/// Cell of body chunk `chunk` of `slot`.
pub const fn chunk_cell(slot: usize, chunk: usize) -> Cell {
  Cell::new(2 * slot + 1, chunk as i64 - 1)
}

/// Cell of the tail of `slot`.
pub const fn tail_cell(slot: usize) -> Cell {
  Cell::new(2 * slot, 1)
}

/// Cell of the head of `slot` (slots 0 and 1 only).
pub const fn head_cell(slot: usize) -> Cell {
  Cell::new(HEAD_COLUMN, if slot == 0 { -1 } else { 1 })
}

/// Cell holding the copy of the next triple's slot-0 head.
pub const BORROWED_HEAD_CELL: Cell = Cell::new(HEAD_COLUMN, 0);

/// A bit field of a limb or word: the cell holding it and its bit offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Term {
  /// the cell
  pub cell: Cell,
  /// bit offset of the field
  pub shift: usize,
}

/// The fields recomposing limb `limb`, all within the limb's triple.
pub fn limb_terms(limb: usize) -> Vec<Term> {
  let split = &SCHEDULE[limb];
  let slot = limb % SLOTS;
  let mut terms = Vec::with_capacity(5);
  if split.head > 0 {
    terms.push(Term {
      cell: head_cell(slot),
      shift: 0,
    });
  }
  let mut shift = split.head;
  for (c, width) in split.chunks.iter().enumerate() {
    terms.push(Term {
      cell: chunk_cell(slot, c),
      shift,
    });
    shift += width;
  }
  if split.tail > 0 {
    terms.push(Term {
      cell: tail_cell(slot),
      shift,
    });
  }
  terms
}

/// The fields recomposing word `word`, all within the word's triple.
pub fn word_terms(word: usize) -> Vec<Term> {
  let slot = word % SLOTS;
  let mut terms = Vec::with_capacity(6);
  let mut shift = 0;
  if word > 0 && SCHEDULE[word - 1].tail > 0 {
    terms.push(Term {
      cell: tail_cell(slot - 1),
      shift,
    });
    shift += SCHEDULE[word - 1].tail;
  }
  for (c, width) in SCHEDULE[word].chunks.iter().enumerate() {
    terms.push(Term {
      cell: chunk_cell(slot, c),
      shift,
    });
    shift += width;
  }
  if word + 1 < LIMBS && SCHEDULE[word + 1].head > 0 {
    let cell = if slot == SLOTS - 1 {
      BORROWED_HEAD_CELL
    } else {
      head_cell(slot + 1)
    };
    terms.push(Term { cell, shift });
  }
  terms
}

/// The constant added to word `word`: the padding bit of the last word.
pub fn word_padding(word: usize) -> u64 {
  if word == LIMBS - 1 { 1 << PADDING_BIT } else { 0 }
}

/// `Σ cell·2^shift`
pub fn recomposition<F: PrimeField>(terms: &[Term]) -> Expression<F> {
  Expression::sum(
    terms
      .iter()
      .map(|t| Expression::from(t.cell.rotated()).scale(pow2(t.shift))),
  )
}

/// Field values of one limb.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LimbParts {
  /// head bits
  pub head: u64,
  /// body chunks
  pub chunks: [u64; 3],
  /// tail bits
  pub tail: u64,
}

fn mask(width: usize) -> u128 {
  (1u128 << width) - 1
}

/// Cuts limb `limb` according to its split; fails if the value is wider than
/// the limb.
pub fn split_limb(limb: usize, value: u128) -> Result<LimbParts, BlueprintError> {
  let split = &SCHEDULE[limb];
  if value >> LIMB_WIDTHS[limb] != 0 {
    return Err(BlueprintError::ValueOutOfRange {
      reason: format!("limb {limb} does not fit in {} bits", LIMB_WIDTHS[limb]),
    });
  }
  let body = (value >> split.head) & mask(split.body());
  Ok(LimbParts {
    head: (value & mask(split.head)) as u64,
    chunks: [
      (body & mask(CHUNK_BITS)) as u64,
      ((body >> CHUNK_BITS) & mask(CHUNK_BITS)) as u64,
      (body >> (2 * CHUNK_BITS)) as u64,
    ],
    tail: (value >> (split.head + split.body())) as u64,
  })
}

/// The 20 message words of a limb stream, computed from the limb parts.
pub fn words(parts: &[LimbParts; LIMBS]) -> [u64; LIMBS] {
  core::array::from_fn(|j| {
    let mut word = word_padding(j) as u128;
    let mut shift = 0;
    if j > 0 {
      word |= (parts[j - 1].tail as u128) << shift;
      shift += SCHEDULE[j - 1].tail;
    }
    for (c, width) in SCHEDULE[j].chunks.iter().enumerate() {
      word |= (parts[j].chunks[c] as u128) << shift;
      shift += width;
    }
    if j + 1 < LIMBS {
      word |= (parts[j + 1].head as u128) << shift;
    }
    word as u64
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_schedule_covers_stream() {
    let total: usize = LIMB_WIDTHS.iter().sum();
    assert_eq!(total as u64, MESSAGE_BITS);

    for (i, split) in SCHEDULE.iter().enumerate() {
      assert_eq!(split.head + split.body() + split.tail, LIMB_WIDTHS[i]);
    }
    // every word but the last is filled exactly
    for j in 0..LIMBS {
      let prev_tail = if j > 0 { SCHEDULE[j - 1].tail } else { 0 };
      let next_head = if j + 1 < LIMBS { SCHEDULE[j + 1].head } else { 0 };
      let used = prev_tail + SCHEDULE[j].body() + next_head;
      if j + 1 < LIMBS {
        assert_eq!(used, WORD_BITS);
      } else {
        assert_eq!(used, PADDING_BIT);
      }
    }
  }

  #[test]
  fn test_degrading_chunks() {
    let thirds: Vec<usize> = SCHEDULE[..3].iter().map(|s| s.chunks[2]).collect();
    assert_eq!(thirds, vec![20, 18, 16]);
    let tails: Vec<usize> = SCHEDULE[..3].iter().map(|s| s.tail).collect();
    assert_eq!(tails, vec![2, 4, 6]);
  }

  #[test]
  fn test_words_are_the_bit_stream() {
    // limb i = i + 1 in its low bits and a set top bit
    let limbs: [u128; LIMBS] =
      core::array::from_fn(|i| (i as u128 + 1) | (1u128 << (LIMB_WIDTHS[i] - 1)));
    let parts: [LimbParts; LIMBS] =
      core::array::from_fn(|i| split_limb(i, limbs[i]).unwrap());
    let words = words(&parts);

    let bit = |pos: usize| -> u64 {
      let mut start = 0;
      for (i, width) in LIMB_WIDTHS.iter().enumerate() {
        if pos < start + width {
          return ((limbs[i] >> (pos - start)) & 1) as u64;
        }
        start += width;
      }
      u64::from(pos == MESSAGE_BITS as usize)
    };
    for (j, word) in words.iter().enumerate() {
      let expected = (0..WORD_BITS).fold(0u64, |acc, b| acc | (bit(64 * j + b) << b));
      assert_eq!(*word, expected, "word {j}");
    }
  }

  #[test]
  fn test_wide_limb_is_rejected() {
    assert!(split_limb(3, 1u128 << 57).is_err());
    assert!(split_limb(19, (1u128 << 58) - 1).is_ok());
  }
}
