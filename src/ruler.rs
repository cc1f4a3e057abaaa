//! The ruler model: marks, lengths, validity, and the published optima.

use crate::bitmap::Bitmap128;
use std::fmt;

/// Largest supported order. Bounded by the practical reach of the search,
/// not by the representation.
pub const MAX_MARKS: usize = 24;

/// Largest supported ruler length, fixed by the 128-bit difference bitmaps.
pub const MAX_LEN: i32 = 127;

/// Published optimal lengths for orders `0..=14`, indexed by order.
///
/// Orders 0 and 1 are degenerate placeholders; the search contract starts at
/// order 2.
pub const KNOWN_OPTIMAL: [i32; 15] = [0, 0, 1, 3, 6, 11, 17, 25, 34, 44, 55, 72, 85, 106, 127];

/// Returns the published optimal length for order `n`, if tabulated.
#[inline]
pub fn known_optimal(n: usize) -> Option<i32> {
    KNOWN_OPTIMAL.get(n).copied()
}

// ============================================================================
// GolombRuler
// ============================================================================

/// A ruler: an ascending list of marks starting at 0, plus its length
/// (the last mark).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GolombRuler {
    /// Ascending mark positions; `marks[0] == 0` for any non-empty ruler.
    pub marks: Vec<i32>,
    /// Position of the last mark; 0 for the empty ruler.
    pub length: i32,
}

impl GolombRuler {
    /// Builds a ruler from a mark list, deriving the length.
    pub fn from_marks(marks: Vec<i32>) -> Self {
        let length = marks.last().copied().unwrap_or(0);
        Self { marks, length }
    }

    /// Number of marks.
    #[inline]
    pub fn order(&self) -> usize {
        self.marks.len()
    }

    /// Checks the Golomb property: all pairwise positive differences are
    /// distinct. Also rejects non-ascending mark lists and differences beyond
    /// the representable range.
    pub fn is_valid(&self) -> bool {
        marks_are_valid(&self.marks)
    }

    /// The mirror ruler `{length - m}` in ascending order. Mirrors share the
    /// length and the Golomb property.
    pub fn mirrored(&self) -> Self {
        let mut marks: Vec<i32> = self.marks.iter().map(|&m| self.length - m).collect();
        marks.reverse();
        Self {
            marks,
            length: self.length,
        }
    }
}

impl fmt::Display for GolombRuler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for m in &self.marks {
            write!(f, "{m} ")?;
        }
        write!(f, "}} (L={})", self.length)
    }
}

/// Checks the Golomb property of an ascending mark list.
pub fn marks_are_valid(marks: &[i32]) -> bool {
    let mut seen = Bitmap128::EMPTY;
    for (i, &mi) in marks.iter().enumerate() {
        for &mj in &marks[i + 1..] {
            let d = mj - mi;
            if d <= 0 || d > MAX_LEN {
                return false;
            }
            if seen.test(d as u32) {
                return false;
            }
            seen.set(d as u32);
        }
    }
    true
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_rulers_are_valid() {
        let table: &[&[i32]] = &[
            &[0, 1],
            &[0, 1, 3],
            &[0, 1, 4, 6],
            &[0, 1, 4, 9, 11],
            &[0, 1, 4, 10, 12, 17],
            &[0, 1, 4, 9, 15, 22, 32, 34],
            &[0, 1, 6, 10, 23, 26, 34, 41, 53, 55],
            &[0, 1, 4, 13, 28, 33, 47, 54, 64, 70, 72],
            &[0, 2, 5, 25, 37, 43, 59, 70, 85, 89, 98, 99, 106],
        ];
        for marks in table {
            let ruler = GolombRuler::from_marks(marks.to_vec());
            assert!(ruler.is_valid(), "{ruler} should be valid");
            assert_eq!(
                ruler.length,
                known_optimal(ruler.order()).unwrap(),
                "{ruler} should be optimal"
            );
        }
    }

    #[test]
    fn duplicate_difference_is_invalid() {
        // 2-1 == 3-2.
        assert!(!marks_are_valid(&[0, 1, 2, 3]));
        // 4-1 == 3-0.
        assert!(!marks_are_valid(&[0, 1, 3, 4]));
    }

    #[test]
    fn descending_marks_are_invalid() {
        assert!(!marks_are_valid(&[0, 5, 3]));
        assert!(!marks_are_valid(&[0, 4, 4]));
    }

    #[test]
    fn empty_and_singleton_are_trivially_valid() {
        assert!(marks_are_valid(&[]));
        assert!(marks_are_valid(&[0]));
    }

    #[test]
    fn mirror_preserves_length_and_validity() {
        let ruler = GolombRuler::from_marks(vec![0, 1, 4, 10, 12, 17]);
        let mirror = ruler.mirrored();
        assert_eq!(mirror.length, 17);
        assert_eq!(mirror.marks, vec![0, 5, 7, 13, 16, 17]);
        assert!(mirror.is_valid());
    }

    #[test]
    fn from_marks_derives_length() {
        assert_eq!(GolombRuler::from_marks(vec![0, 1, 3]).length, 3);
        assert_eq!(GolombRuler::from_marks(vec![]).length, 0);
    }

    #[test]
    fn display_format() {
        let ruler = GolombRuler::from_marks(vec![0, 1, 4, 9, 11]);
        assert_eq!(format!("{ruler}"), "{ 0 1 4 9 11 } (L=11)");
    }
}
