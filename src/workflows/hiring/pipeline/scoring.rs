use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{JobPosting, WeightCategory};

/// Upper bound of the external scorer contract; both inputs and every derived
/// score live in `0..=MAX_SCORE`.
pub const MAX_SCORE: u8 = 100;

/// Discrete ranking bucket derived from the combined score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    TopTier,
    Strong,
    Good,
    Evaluate,
    Poor,
}

impl Tier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::TopTier => "Top Tier",
            Self::Strong => "Strong",
            Self::Good => "Good",
            Self::Evaluate => "Evaluate",
            Self::Poor => "Poor",
        }
    }

    /// Monotonic step function over the combined score; lower bounds are
    /// inclusive, so 85 is already Top Tier while 84 is still Good-or-below.
    pub const fn for_score(score: u8) -> Self {
        match score {
            85.. => Self::TopTier,
            70..=84 => Self::Strong,
            55..=69 => Self::Good,
            40..=54 => Self::Evaluate,
            _ => Self::Poor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("score {value} violates the 0-100 scorer contract")]
    InvalidScoreRange { value: u8 },
}

/// Result of blending the algorithmic and AI scores. Both fields are absent
/// until scoring completes; callers must render "unscored", never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreCard {
    pub combined_score: Option<u8>,
    pub tier: Option<Tier>,
}

impl ScoreCard {
    pub const fn unscored() -> Self {
        Self {
            combined_score: None,
            tier: None,
        }
    }
}

/// Blends the externally produced algorithmic and AI scores into the combined
/// ranking score and tier.
///
/// The blend is a fixed 50/50 average, rounded half up and clamped to the
/// score ceiling. Inputs outside the contract are rejected, never clamped;
/// clamping applies to the output only.
pub fn combine(algo_score: Option<u8>, ai_score: Option<u8>) -> Result<ScoreCard, ScoreError> {
    for value in [algo_score, ai_score].into_iter().flatten() {
        if value > MAX_SCORE {
            return Err(ScoreError::InvalidScoreRange { value });
        }
    }

    let (Some(algo), Some(ai)) = (algo_score, ai_score) else {
        return Ok(ScoreCard::unscored());
    };

    let combined = ((u16::from(algo) + u16::from(ai) + 1) / 2).min(u16::from(MAX_SCORE)) as u8;

    Ok(ScoreCard {
        combined_score: Some(combined),
        tier: Some(Tier::for_score(combined)),
    })
}

/// Category-weighted average over per-category breakdown scores, using the
/// job's configured category weights.
///
/// Reported alongside the 50/50 blend for ranking transparency; it never
/// replaces the combined score. Returns `None` when no weighted category has
/// a breakdown entry.
pub fn weighted_category_score(
    job: &JobPosting,
    breakdown: &BTreeMap<WeightCategory, u8>,
) -> Result<Option<u8>, ScoreError> {
    for value in breakdown.values() {
        if *value > MAX_SCORE {
            return Err(ScoreError::InvalidScoreRange { value: *value });
        }
    }

    let mut weighted = 0.0f32;
    let mut total_weight = 0.0f32;
    for (category, score) in breakdown {
        let weight = job.category_weights.get(category).copied().unwrap_or(0.0);
        if weight <= 0.0 || !weight.is_finite() {
            continue;
        }
        weighted += weight * f32::from(*score);
        total_weight += weight;
    }

    if total_weight <= 0.0 {
        return Ok(None);
    }

    let average = (weighted / total_weight).round().min(f32::from(MAX_SCORE));
    Ok(Some(average as u8))
}
