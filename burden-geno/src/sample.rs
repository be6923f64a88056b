//! Sample ID alignment.
//!
//! The association stage joins per-gene score rows to the cohort by
//! sample ID, preserving the cohort's row order because the shared
//! phenotype and covariate arrays are indexed by that order.

use std::collections::HashMap;

/// Intersect two sample ID lists, keeping the primary list's order.
///
/// Returns `(primary_indices, secondary_indices)`: position `k` of each
/// vector points at the same sample in the respective source.
pub fn intersect_ordered(primary: &[String], secondary: &[String]) -> (Vec<usize>, Vec<usize>) {
    let secondary_pos: HashMap<&str, usize> = secondary
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    let mut primary_indices = Vec::new();
    let mut secondary_indices = Vec::new();
    for (i, id) in primary.iter().enumerate() {
        if let Some(&j) = secondary_pos.get(id.as_str()) {
            primary_indices.push(i);
            secondary_indices.push(j);
        }
    }
    (primary_indices, secondary_indices)
}

/// Reorder an f64 slice according to the given index mapping.
pub fn reorder_f64(data: &[f64], indices: &[usize]) -> Vec<f64> {
    indices.iter().map(|&i| data[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_intersect_preserves_primary_order() {
        let cohort = ids(&["A", "B", "C", "D"]);
        let gene = ids(&["D", "B", "E", "A"]);
        let (ci, gi) = intersect_ordered(&cohort, &gene);
        assert_eq!(ci, vec![0, 1, 3]);
        assert_eq!(gi, vec![3, 1, 0]);
    }

    #[test]
    fn test_empty_intersection() {
        let (ci, gi) = intersect_ordered(&ids(&["A"]), &ids(&["B"]));
        assert!(ci.is_empty());
        assert!(gi.is_empty());
    }

    #[test]
    fn test_reorder_f64() {
        assert_eq!(reorder_f64(&[10.0, 20.0, 30.0], &[2, 0]), vec![30.0, 10.0]);
    }
}
