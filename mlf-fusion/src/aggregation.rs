//! Weighted aggregation helpers
//!
//! Every fused value is a weighted arithmetic mean over components, divided
//! by the weight total rather than the component count.

use std::collections::HashMap;
use tracing::warn;

/// Weighted mean of `(value, weight)` pairs
///
/// Returns `None` when the weight total is not positive.
pub fn weighted_mean(values: &[(f64, f64)]) -> Option<f64> {
    let sum_weights: f64 = values.iter().map(|(_, w)| w).sum();
    if sum_weights <= 0.0 {
        return None;
    }
    let sum_weighted: f64 = values.iter().map(|(v, w)| v * w).sum();
    Some(sum_weighted / sum_weights)
}

/// Element-wise weighted mean of equally long vectors
///
/// A mean of vectors that each sum to 1 also sums to 1.
pub fn weighted_mean_vectors(vectors: &[(Vec<f64>, f64)], len: usize) -> Option<Vec<f64>> {
    let sum_weights: f64 = vectors.iter().map(|(_, w)| w).sum();
    if sum_weights <= 0.0 {
        return None;
    }

    let mut fused = vec![0.0; len];
    for (vector, weight) in vectors {
        for (acc, p) in fused.iter_mut().zip(vector) {
            *acc += weight * p;
        }
    }
    for acc in fused.iter_mut() {
        *acc /= sum_weights;
    }
    Some(fused)
}

/// Re-order a class → probability map onto `class_names`
///
/// Classes the map lacks get 0.0; classes outside `class_names` are dropped
/// and the rest rescaled so the projected vector sums to 1. Returns `None`
/// when a known class has a non-finite probability or the known classes
/// carry no mass.
pub fn project_onto_classes(
    probabilities: &HashMap<String, f64>,
    class_names: &[String],
) -> Option<Vec<f64>> {
    let unknown = probabilities
        .keys()
        .filter(|class| class_names.binary_search(*class).is_err())
        .count();
    if unknown > 0 {
        warn!("Ignoring {} classes outside the fusion's class list", unknown);
    }

    let projected: Vec<f64> = class_names
        .iter()
        .map(|class| probabilities.get(class).copied().unwrap_or(0.0))
        .collect();
    if projected.iter().any(|p| !p.is_finite()) {
        return None;
    }

    let total: f64 = projected.iter().sum();
    if total <= 0.0 {
        return None;
    }
    Some(projected.into_iter().map(|p| p / total).collect())
}

/// Index of the maximum value, earliest index on ties
pub fn argmax_first(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &value) in values.iter().enumerate() {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ if value.is_nan() => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_mean_divides_by_weight_total() {
        assert_eq!(weighted_mean(&[(10.0, 1.0), (20.0, 1.0)]), Some(15.0));
        assert_eq!(weighted_mean(&[(10.0, 1.0), (20.0, 3.0)]), Some(17.5));
        assert_eq!(weighted_mean(&[]), None);
        assert_eq!(weighted_mean(&[(10.0, 0.0)]), None);
    }

    #[test]
    fn test_weighted_mean_vectors() {
        let vectors = [(vec![0.8, 0.2], 1.0), (vec![0.4, 0.6], 3.0)];
        let fused = weighted_mean_vectors(&vectors, 2).unwrap();
        assert!((fused[0] - 0.5).abs() < 1e-12);
        assert!((fused[1] - 0.5).abs() < 1e-12);
        assert!((fused.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_fills_missing_classes() {
        let classes = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut probabilities = HashMap::new();
        probabilities.insert("c".to_string(), 0.7);
        probabilities.insert("a".to_string(), 0.3);
        probabilities.insert("z".to_string(), 0.0);

        assert_eq!(
            project_onto_classes(&probabilities, &classes),
            Some(vec![0.3, 0.0, 0.7])
        );
    }

    #[test]
    fn test_project_rescales_after_dropping_unknown_classes() {
        let classes = vec!["a".to_string(), "b".to_string()];
        let mut probabilities = HashMap::new();
        probabilities.insert("a".to_string(), 0.3);
        probabilities.insert("zz".to_string(), 0.7);

        let projected = project_onto_classes(&probabilities, &classes).unwrap();
        assert!((projected[0] - 1.0).abs() < 1e-12);
        assert_eq!(projected[1], 0.0);
    }

    #[test]
    fn test_project_rejects_unusable_mass() {
        let classes = vec!["a".to_string(), "b".to_string()];

        let only_unknown: HashMap<String, f64> = [("zz".to_string(), 1.0)].into_iter().collect();
        assert_eq!(project_onto_classes(&only_unknown, &classes), None);
        assert_eq!(project_onto_classes(&HashMap::new(), &classes), None);

        let nan: HashMap<String, f64> = [("a".to_string(), f64::NAN)].into_iter().collect();
        assert_eq!(project_onto_classes(&nan, &classes), None);
    }

    #[test]
    fn test_argmax_first_breaks_ties_by_index() {
        assert_eq!(argmax_first(&[0.2, 0.4, 0.4]), Some(1));
        assert_eq!(argmax_first(&[0.5, 0.5]), Some(0));
        assert_eq!(argmax_first(&[f64::NAN, 0.1]), Some(1));
        assert_eq!(argmax_first(&[]), None);
    }
}
