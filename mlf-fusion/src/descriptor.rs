//! Fusion descriptor - validated structural metadata of a fusion resource
//!
//! Built once from an already-fetched, finished fusion resource and never
//! updated afterwards. Any change needs a rebuild from a fresh resource.

use crate::component::{ComponentKind, ComponentModels, FusionComponent};
use crate::error::{FusionError, Result};
use mlf_common::resource::{
    extract_objective, unwrap_object, Distribution, Fields, ImportanceRepr, ResourceStatus,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Reference to a component inside the resource's model list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ModelReference {
    Id(String),
    Weighted { id: String, weight: Option<f64> },
}

/// Nested `fusion` object
#[derive(Debug, Deserialize)]
struct FusionSection {
    #[serde(default)]
    fields: Option<Fields>,
    #[serde(default)]
    models: Option<Vec<ModelReference>>,
    #[serde(default)]
    importance: Option<ImportanceRepr>,
    #[serde(default)]
    missing_numerics: Option<bool>,
}

/// Top-level resource object
#[derive(Debug, Deserialize)]
struct FusionObject {
    #[serde(default)]
    resource: Option<String>,
    #[serde(default)]
    objective_fields: Vec<String>,
    #[serde(default)]
    models: Option<Vec<ModelReference>>,
    #[serde(default)]
    importance: Option<ImportanceRepr>,
    #[serde(default)]
    missing_numerics: Option<bool>,
    fusion: FusionSection,
}

/// Validated description of a fusion
#[derive(Debug, Clone)]
pub struct FusionDescriptor {
    resource_id: Option<String>,
    objective_id: String,
    is_regression: bool,
    class_names: Vec<String>,
    components: Vec<FusionComponent>,
    distribution: Distribution,
    missing_numerics: bool,
    field_importance: BTreeMap<String, f64>,
    fields: Fields,
}

impl FusionDescriptor {
    /// Build a descriptor from a fusion resource and its component handles
    ///
    /// `resource` is either the bare resource object or the retrieval
    /// envelope holding it under `object`. Each model id the resource
    /// references must have a handle in `models`.
    pub fn from_resource(resource: &Value, models: &ComponentModels) -> Result<Self> {
        let object = unwrap_object(resource);

        check_status(object)?;

        if !object.get("fusion").map_or(false, Value::is_object) {
            return Err(FusionError::MalformedResource(
                "could not find the 'fusion' key in the resource".to_string(),
            ));
        }

        let parsed = FusionObject::deserialize(object)
            .map_err(|e| FusionError::MalformedResource(e.to_string()))?;

        let objective_id = extract_objective(&parsed.objective_fields)
            .ok_or_else(|| FusionError::MalformedResource("no objective field".to_string()))?
            .to_string();

        let fields = parsed
            .fusion
            .fields
            .ok_or_else(|| FusionError::MalformedResource("missing 'fusion.fields'".to_string()))?;

        let objective = fields.get(&objective_id).ok_or_else(|| {
            FusionError::MalformedResource(format!(
                "objective field {} not found in fields",
                objective_id
            ))
        })?;

        let is_regression = objective.is_numeric();
        let summary = objective.summary.clone().unwrap_or_default();

        let class_names = if is_regression {
            Vec::new()
        } else {
            let mut names = summary.category_names();
            names.sort();
            names.dedup();
            if names.is_empty() {
                return Err(FusionError::MalformedResource(format!(
                    "categorical objective field {} has no categories",
                    objective_id
                )));
            }
            names
        };

        let references = parsed
            .models
            .or(parsed.fusion.models)
            .ok_or_else(|| FusionError::MalformedResource("missing model list".to_string()))?;
        let components = build_components(&references, models)?;

        let missing_numerics = parsed
            .missing_numerics
            .or(parsed.fusion.missing_numerics)
            .unwrap_or(true);

        let field_importance = parsed
            .importance
            .or(parsed.fusion.importance)
            .map(ImportanceRepr::into_map)
            .unwrap_or_default();

        let descriptor = Self {
            resource_id: parsed.resource,
            objective_id,
            is_regression,
            class_names,
            components,
            distribution: summary.distribution(),
            missing_numerics,
            field_importance,
            fields,
        };

        info!(
            "Fusion {} ready: {} components, {}",
            descriptor.resource_id.as_deref().unwrap_or("<unnamed>"),
            descriptor.components.len(),
            if descriptor.is_regression {
                "regression".to_string()
            } else {
                format!("{} classes", descriptor.class_names.len())
            }
        );

        Ok(descriptor)
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    pub fn objective_id(&self) -> &str {
        &self.objective_id
    }

    pub fn is_regression(&self) -> bool {
        self.is_regression
    }

    /// Sorted class names, empty for regression
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn components(&self) -> &[FusionComponent] {
        &self.components
    }

    /// Objective field distribution (bins, counts or categories)
    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn missing_numerics(&self) -> bool {
        self.missing_numerics
    }

    pub fn field_importance(&self) -> &BTreeMap<String, f64> {
        &self.field_importance
    }

    /// Importances as `(field_id, importance)`, most important first
    pub fn field_importance_data(&self) -> Vec<(String, f64)> {
        let mut data: Vec<(String, f64)> = self
            .field_importance
            .iter()
            .map(|(id, importance)| (id.clone(), *importance))
            .collect();
        data.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        data
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }
}

fn check_status(object: &Value) -> Result<()> {
    let status = match object.get("status") {
        Some(status) => ResourceStatus::deserialize(status)
            .map_err(|e| FusionError::MalformedResource(format!("invalid status: {}", e)))?,
        None => return Err(FusionError::NotReady { code: None }),
    };

    if status.is_finished() {
        Ok(())
    } else {
        Err(FusionError::NotReady { code: status.code })
    }
}

/// Tag each reference by kind, attach its handle and weight
fn build_components(
    references: &[ModelReference],
    models: &ComponentModels,
) -> Result<Vec<FusionComponent>> {
    let weighted = match references.first() {
        Some(ModelReference::Weighted { .. }) => true,
        Some(ModelReference::Id(_)) => false,
        None => {
            return Err(FusionError::MalformedResource(
                "fusion has no component models".to_string(),
            ))
        }
    };

    let mut components = Vec::with_capacity(references.len());
    for reference in references {
        let (id, weight) = match (reference, weighted) {
            (ModelReference::Weighted { id, weight: Some(w) }, true) => (id, Some(*w)),
            (ModelReference::Id(id), false) => (id, None),
            (ModelReference::Weighted { id, weight: None }, true) => {
                return Err(FusionError::MalformedResource(format!(
                    "component {} has no weight",
                    id
                )))
            }
            _ => {
                return Err(FusionError::MalformedResource(
                    "model list mixes bare ids and weighted entries".to_string(),
                ))
            }
        };

        let kind = ComponentKind::from_resource_id(id)
            .ok_or_else(|| FusionError::UnknownComponentKind(id.clone()))?;

        let model = models
            .get(id)
            .cloned()
            .ok_or_else(|| FusionError::MissingComponent(id.clone()))?;

        debug!("Component {} tagged as {} (weight {:?})", id, kind, weight);
        components.push(FusionComponent {
            id: id.clone(),
            kind,
            weight,
            model,
        });
    }

    if weighted {
        check_weights(&components)?;
    }

    Ok(components)
}

fn check_weights(components: &[FusionComponent]) -> Result<()> {
    if let Some(bad) = components
        .iter()
        .find(|c| !c.effective_weight().is_finite() || c.effective_weight() < 0.0)
    {
        return Err(FusionError::MalformedResource(format!(
            "component {} has invalid weight {}",
            bad.id,
            bad.effective_weight()
        )));
    }

    let total: f64 = components.iter().map(FusionComponent::effective_weight).sum();
    if total <= 0.0 {
        return Err(FusionError::MalformedResource(
            "component weights sum to zero".to_string(),
        ));
    }
    Ok(())
}
