use super::common::*;
use crate::workflows::hiring::pipeline::domain::{WeightCategory, WeightedAttribute};
use crate::workflows::hiring::pipeline::weights::{missing_categories, normalize, validate};

#[test]
fn clean_rubric_produces_no_warnings() {
    let job = weighted_job();
    assert!(validate(&job).is_clean());
}

#[test]
fn out_of_range_weights_are_reported_per_field() {
    let mut job = weighted_job();
    job.category_weights.insert(WeightCategory::RedFlags, 1.4);
    job.weighted_attributes
        .entry(WeightCategory::RequiredSkills)
        .or_default()
        .push(WeightedAttribute {
            value: "Kubernetes".to_string(),
            weight: -0.2,
        });

    let report = validate(&job);
    assert_eq!(report.warnings.len(), 2);
    assert!(report
        .warnings
        .iter()
        .any(|warning| warning.field == "category_weights.red_flags"));
    assert!(report
        .warnings
        .iter()
        .any(|warning| warning.field == "weighted_attributes.required_skills"));
}

#[test]
fn stage_list_findings_are_warnings_not_failures() {
    let mut job = job_with_stages(&[]);
    let report = validate(&job);
    assert!(report
        .warnings
        .iter()
        .any(|warning| warning.field == "interview_stages"));

    job.interview_stages = vec!["Onsite".to_string(), "Onsite ".to_string()];
    let report = validate(&job);
    assert!(report
        .warnings
        .iter()
        .any(|warning| warning.message.contains("duplicate stage name 'Onsite'")));
}

#[test]
fn normalize_clamps_weights() {
    let mut job = weighted_job();
    job.category_weights.insert(WeightCategory::RedFlags, 3.5);
    job.category_weights
        .insert(WeightCategory::DealBreakers, f32::NAN);
    job.weighted_attributes.insert(
        WeightCategory::BehavioralTraits,
        vec![WeightedAttribute {
            value: "Ownership".to_string(),
            weight: -1.0,
        }],
    );

    normalize(&mut job);

    assert_eq!(job.category_weights[&WeightCategory::RedFlags], 1.0);
    assert_eq!(job.category_weights[&WeightCategory::DealBreakers], 0.0);
    assert_eq!(
        job.weighted_attributes[&WeightCategory::BehavioralTraits][0].weight,
        0.0
    );
}

#[test]
fn normalize_dedupes_attribute_values_case_insensitively() {
    let mut job = job_with_stages(&["Round 1"]);
    job.weighted_attributes.insert(
        WeightCategory::RequiredSkills,
        vec![
            WeightedAttribute {
                value: "Rust".to_string(),
                weight: 0.9,
            },
            WeightedAttribute {
                value: "Postgres".to_string(),
                weight: 0.6,
            },
            WeightedAttribute {
                value: "rust ".to_string(),
                weight: 0.2,
            },
        ],
    );

    normalize(&mut job);

    let attributes = &job.weighted_attributes[&WeightCategory::RequiredSkills];
    assert_eq!(attributes.len(), 2);
    assert_eq!(attributes[0].value, "Rust");
    assert_eq!(attributes[0].weight, 0.9, "first occurrence wins");
    assert_eq!(attributes[1].value, "Postgres");
}

#[test]
fn missing_categories_tracks_unconfigured_ones() {
    let job = weighted_job();
    let missing = missing_categories(&job);
    assert!(!missing.contains(&WeightCategory::RequiredSkills));
    assert!(missing.contains(&WeightCategory::DealBreakers));
    assert!(missing.contains(&WeightCategory::CulturalIndicators));
}
