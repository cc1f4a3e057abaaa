//! Fast deterministic self-check against published optima.

use crate::ruler::{known_optimal, marks_are_valid, GolombRuler};
use crate::search::{run_search, SearchConfig};

/// Canonical optimal rulers used as fixed reference points.
const REFERENCE_RULERS: &[&[i32]] = &[
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

// ============================================================================
// Public API
// ============================================================================

/// Validates the engine against published optima:
///
/// 1. every bundled reference ruler is a valid Golomb ruler of the
///    tabulated optimal length;
/// 2. searching orders 2 through 7 with the cap at the optimum reproduces
///    the optimal length with valid marks.
///
/// # Errors
/// Returns a description of the first failing check.
pub fn validate_known_rulers() -> Result<(), String> {
    for marks in REFERENCE_RULERS {
        let ruler = GolombRuler::from_marks(marks.to_vec());
        let n = ruler.order();
        if !ruler.is_valid() {
            return Err(format!("reference ruler {ruler} is not a Golomb ruler"));
        }
        let optimal = known_optimal(n).ok_or_else(|| format!("no optimum tabulated for {n}"))?;
        if ruler.length != optimal {
            return Err(format!(
                "reference ruler {ruler} has length {} but the optimum is {optimal}",
                ruler.length
            ));
        }
    }

    for n in 2..=7 {
        let optimal = known_optimal(n).expect("tabulated");
        let cfg = SearchConfig {
            n,
            max_len: optimal,
            procs: 1,
            threads_per_proc: 1,
            ..SearchConfig::default()
        };
        let report = run_search(&cfg).map_err(|e| format!("order {n}: {e}"))?;
        let Some(ruler) = report.ruler else {
            return Err(format!("order {n}: no ruler found within {optimal}"));
        };
        if ruler.length != optimal {
            return Err(format!(
                "order {n}: found length {} but expected {optimal}",
                ruler.length
            ));
        }
        if !marks_are_valid(&ruler.marks) {
            return Err(format!("order {n}: returned marks {ruler} are invalid"));
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_reproduces_published_optima() {
        validate_known_rulers().unwrap();
    }

    #[test]
    fn reference_rulers_cover_the_scenario_table() {
        let orders: Vec<usize> = REFERENCE_RULERS.iter().map(|m| m.len()).collect();
        for n in [5, 6, 8, 10, 11, 13] {
            assert!(orders.contains(&n), "missing reference for order {n}");
        }
    }
}
