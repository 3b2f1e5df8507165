use std::collections::BTreeSet;

use serde::Serialize;

use super::domain::{JobPosting, WeightCategory};

/// Field-level finding from rubric validation.
///
/// Partially-specified jobs are a supported state, so validation reports
/// rather than rejects; hard failures belong to the operations that need a
/// usable stage list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RubricWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RubricReport {
    pub warnings: Vec<RubricWarning>,
}

impl RubricReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warn(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(RubricWarning {
            field: field.into(),
            message: message.into(),
        });
    }
}

/// Checks a posting's stage list and rubric weights, reporting every finding
/// as a field-level warning.
pub fn validate(job: &JobPosting) -> RubricReport {
    let mut report = RubricReport::default();

    if job.interview_stages.is_empty() {
        report.warn("interview_stages", "no interview stages configured");
    }

    let mut seen = BTreeSet::new();
    for name in &job.interview_stages {
        if !seen.insert(name.trim()) {
            report.warn(
                "interview_stages",
                format!("duplicate stage name '{}'", name.trim()),
            );
        }
    }

    for (category, weight) in &job.category_weights {
        if !weight.is_finite() || !(0.0..=1.0).contains(weight) {
            report.warn(
                format!("category_weights.{}", category.label()),
                format!("weight {weight} outside [0, 1]"),
            );
        }
    }

    for (category, attributes) in &job.weighted_attributes {
        for attribute in attributes {
            if !attribute.weight.is_finite() || !(0.0..=1.0).contains(&attribute.weight) {
                report.warn(
                    format!("weighted_attributes.{}", category.label()),
                    format!(
                        "'{}' has weight {} outside [0, 1]",
                        attribute.value, attribute.weight
                    ),
                );
            }
        }
    }

    report
}

/// Categories the posting has not configured any attributes for; tracked on
/// the job record for dashboard follow-up, not treated as a validation error.
pub fn missing_categories(job: &JobPosting) -> Vec<WeightCategory> {
    WeightCategory::ordered()
        .into_iter()
        .filter(|category| {
            job.weighted_attributes
                .get(category)
                .map(|attributes| attributes.is_empty())
                .unwrap_or(true)
        })
        .collect()
}

/// Clamps every weight into [0, 1] and deduplicates attribute values within a
/// category (case-insensitive), keeping the first occurrence in order.
pub fn normalize(job: &mut JobPosting) {
    for weight in job.category_weights.values_mut() {
        *weight = clamp_weight(*weight);
    }

    for attributes in job.weighted_attributes.values_mut() {
        let mut seen = BTreeSet::new();
        attributes.retain(|attribute| seen.insert(attribute.value.trim().to_lowercase()));
        for attribute in attributes.iter_mut() {
            attribute.weight = clamp_weight(attribute.weight);
        }
    }
}

fn clamp_weight(weight: f32) -> f32 {
    if !weight.is_finite() {
        return 0.0;
    }
    weight.clamp(0.0, 1.0)
}
