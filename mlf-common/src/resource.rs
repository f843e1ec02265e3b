//! Resource shapes shared by local predictors
//!
//! These mirror the JSON returned by the model registry for a finished
//! resource. Only the parts needed for local prediction are modelled;
//! unknown keys are ignored on decode.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Status code of a resource whose creation completed
pub const FINISHED: i64 = 5;

/// Optype tag of numeric fields
pub const NUMERIC: &str = "numeric";

/// Resource status block
///
/// A block without `code` has not reached any known state yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceStatus {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ResourceStatus {
    pub fn is_finished(&self) -> bool {
        self.code == Some(FINISHED)
    }
}

/// Field definition, keyed by field id in a `fields` map
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub optype: String,
    #[serde(default)]
    pub summary: Option<FieldSummary>,
    #[serde(default)]
    pub column_number: Option<u32>,
}

impl FieldDefinition {
    pub fn is_numeric(&self) -> bool {
        self.optype == NUMERIC
    }
}

/// Marginal summary of a field's values
///
/// `bins` and `counts` are present for numeric fields, `categories` for
/// categorical ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldSummary {
    #[serde(default)]
    pub bins: Option<Vec<(f64, u64)>>,
    #[serde(default)]
    pub counts: Option<Vec<(f64, u64)>>,
    #[serde(default)]
    pub categories: Option<Vec<(String, u64)>>,
}

/// Value side of a distribution entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DistributionValue {
    Number(f64),
    Category(String),
}

/// Marginal distribution as `(value, count)` pairs
pub type Distribution = Vec<(DistributionValue, u64)>;

impl FieldSummary {
    /// Distribution from the first of bins, counts, categories present
    pub fn distribution(&self) -> Distribution {
        if let Some(bins) = &self.bins {
            numeric_distribution(bins)
        } else if let Some(counts) = &self.counts {
            numeric_distribution(counts)
        } else if let Some(categories) = &self.categories {
            categories
                .iter()
                .map(|(name, count)| (DistributionValue::Category(name.clone()), *count))
                .collect()
        } else {
            Vec::new()
        }
    }

    /// Category names in summary order
    pub fn category_names(&self) -> Vec<String> {
        self.categories
            .as_ref()
            .map(|categories| categories.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }
}

fn numeric_distribution(pairs: &[(f64, u64)]) -> Distribution {
    pairs
        .iter()
        .map(|(value, count)| (DistributionValue::Number(*value), *count))
        .collect()
}

/// Field id → definition
pub type Fields = HashMap<String, FieldDefinition>;

/// Field importance as sent by the registry: a map or `[id, score]` pairs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ImportanceRepr {
    Map(HashMap<String, f64>),
    Pairs(Vec<(String, f64)>),
}

impl ImportanceRepr {
    pub fn into_map(self) -> BTreeMap<String, f64> {
        match self {
            ImportanceRepr::Map(map) => map.into_iter().collect(),
            ImportanceRepr::Pairs(pairs) => pairs.into_iter().collect(),
        }
    }
}

/// Objective field id from a resource's `objective_fields`
///
/// Only single-objective resources are supported; extra entries are ignored
/// with a warning.
pub fn extract_objective(objective_fields: &[String]) -> Option<&str> {
    if objective_fields.len() > 1 {
        warn!(
            "Resource declares {} objective fields, using the first",
            objective_fields.len()
        );
    }
    objective_fields.first().map(String::as_str)
}

/// Strip the retrieval envelope (`{"resource": ..., "object": {...}}`)
pub fn unwrap_object(value: &serde_json::Value) -> &serde_json::Value {
    match value.get("object") {
        Some(object) if object.is_object() => object,
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_distribution_priority_bins_first() {
        let summary: FieldSummary = serde_json::from_value(json!({
            "bins": [[1.5, 3], [2.5, 7]],
            "counts": [[1.0, 10]],
        }))
        .unwrap();

        let distribution = summary.distribution();
        assert_eq!(
            distribution,
            vec![
                (DistributionValue::Number(1.5), 3),
                (DistributionValue::Number(2.5), 7),
            ]
        );
    }

    #[test]
    fn test_distribution_priority_counts_before_categories() {
        let summary: FieldSummary = serde_json::from_value(json!({
            "counts": [[0.0, 12], [1.0, 30]],
            "categories": [["low", 12], ["high", 30]],
        }))
        .unwrap();

        assert_eq!(
            summary.distribution(),
            vec![
                (DistributionValue::Number(0.0), 12),
                (DistributionValue::Number(1.0), 30),
            ]
        );
    }

    #[test]
    fn test_distribution_from_categories() {
        let summary: FieldSummary = serde_json::from_value(json!({
            "categories": [["Iris-setosa", 50], ["Iris-virginica", 50]],
        }))
        .unwrap();

        assert_eq!(summary.distribution().len(), 2);
        assert_eq!(summary.category_names(), vec!["Iris-setosa", "Iris-virginica"]);
    }

    #[test]
    fn test_distribution_empty_summary() {
        assert!(FieldSummary::default().distribution().is_empty());
    }

    #[test]
    fn test_importance_pairs_and_map_agree() {
        let pairs: ImportanceRepr =
            serde_json::from_value(json!([["000000", 0.25], ["000002", 0.75]])).unwrap();
        let map: ImportanceRepr =
            serde_json::from_value(json!({"000000": 0.25, "000002": 0.75})).unwrap();
        assert_eq!(pairs.into_map(), map.into_map());
    }

    #[test]
    fn test_extract_objective() {
        assert_eq!(extract_objective(&["000004".to_string()]), Some("000004"));
        assert_eq!(extract_objective(&[]), None);
    }

    #[test]
    fn test_status_without_code_is_unfinished() {
        let status: ResourceStatus =
            serde_json::from_value(json!({"message": "Waiting"})).unwrap();
        assert_eq!(status.code, None);
        assert!(!status.is_finished());
    }

    #[test]
    fn test_unwrap_object_envelope() {
        let wrapped = json!({"resource": "fusion/1", "object": {"status": {"code": 5}}});
        assert_eq!(unwrap_object(&wrapped)["status"]["code"], 5);

        let bare = json!({"status": {"code": 5}});
        assert_eq!(unwrap_object(&bare)["status"]["code"], 5);
    }
}
