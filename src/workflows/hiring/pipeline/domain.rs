use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scoring::Tier;

/// Identifier wrapper for people; one person may hold several applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonId(pub String);

/// Identifier wrapper for a candidate, i.e. one (person, job) application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobPostingId(pub String);

/// Identifier wrapper for scheduled interviews.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterviewId(pub String);

/// Identity record; never scored directly, scores live on the per-job application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub full_name: String,
    pub email: String,
    pub resume_url: Option<String>,
}

/// The fixed set of weighted requirement categories a job can configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightCategory {
    RequiredSkills,
    PreferredSkills,
    SuccessSignals,
    RedFlags,
    BehavioralTraits,
    CulturalIndicators,
    DealBreakers,
}

impl WeightCategory {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::RequiredSkills,
            Self::PreferredSkills,
            Self::SuccessSignals,
            Self::RedFlags,
            Self::BehavioralTraits,
            Self::CulturalIndicators,
            Self::DealBreakers,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::RequiredSkills => "required_skills",
            Self::PreferredSkills => "preferred_skills",
            Self::SuccessSignals => "success_signals",
            Self::RedFlags => "red_flags",
            Self::BehavioralTraits => "behavioral_traits",
            Self::CulturalIndicators => "cultural_indicators",
            Self::DealBreakers => "deal_breakers",
        }
    }
}

/// One weighted requirement inside a category. Insertion order is preserved
/// for display and has no scoring significance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedAttribute {
    pub value: String,
    pub weight: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Open,
    Closed,
    Archived,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Archived => "archived",
        }
    }
}

/// A job posting with its configurable interview stage list and scoring rubric.
///
/// `interview_stages` drives the pipeline length and labels; its length is the
/// `N` every stage computation is recomputed against, even when the list
/// changes after candidates have progressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobPostingId,
    pub title: String,
    pub status: JobStatus,
    pub interview_stages: Vec<String>,
    #[serde(default)]
    pub category_weights: BTreeMap<WeightCategory, f32>,
    #[serde(default)]
    pub weighted_attributes: BTreeMap<WeightCategory, Vec<WeightedAttribute>>,
}

impl JobPosting {
    /// The legacy fixed three-round scheme, used when a posting does not
    /// configure its own stage list.
    pub fn default_stages() -> Vec<String> {
        ["Round 1", "Round 2", "Round 3"]
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn stage_count(&self) -> usize {
        self.interview_stages.len()
    }
}

/// Where a candidate sits in the interview pipeline, or the terminal outcome.
///
/// Stored and transmitted as a label (`new`, `stage_<i>`, `decision_pending`,
/// `accepted`, `rejected`). The legacy `round_1`..`round_3` labels are accepted
/// when parsing and map onto `stage_0`..`stage_2`; they are never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    New,
    Stage(usize),
    DecisionPending,
    Accepted,
    Rejected,
}

impl PipelineStatus {
    pub fn label(self) -> String {
        match self {
            Self::New => "new".to_string(),
            Self::Stage(index) => format!("stage_{index}"),
            Self::DecisionPending => "decision_pending".to_string(),
            Self::Accepted => "accepted".to_string(),
            Self::Rejected => "rejected".to_string(),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(Self::New),
            "decision_pending" => Some(Self::DecisionPending),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            other => stage_index_from_label(other).map(Self::Stage),
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for PipelineStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for PipelineStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        PipelineStatus::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown pipeline status '{raw}'")))
    }
}

/// Maps a stage label onto its zero-based index. Accepts the canonical
/// `stage_<i>` form plus the legacy `round_1`..`round_3` aliases.
pub fn stage_index_from_label(label: &str) -> Option<usize> {
    if let Some(index) = label.strip_prefix("stage_") {
        return index.parse().ok();
    }

    match label {
        "round_1" => Some(0),
        "round_2" => Some(1),
        "round_3" => Some(2),
        _ => None,
    }
}

/// Accepts a zero-based index or a legacy round label for interview rows
/// serialized before the configurable-stage migration.
pub(crate) fn deserialize_stage_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawStage {
        Index(usize),
        Label(String),
    }

    match RawStage::deserialize(deserializer)? {
        RawStage::Index(index) => Ok(index),
        RawStage::Label(label) => stage_index_from_label(&label)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown stage label '{label}'"))),
    }
}

/// Terminal outcome recorded once every configured stage has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalDecision {
    Accepted,
    Rejected,
}

impl FinalDecision {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub const fn pipeline_status(self) -> PipelineStatus {
        match self {
            Self::Accepted => PipelineStatus::Accepted,
            Self::Rejected => PipelineStatus::Rejected,
        }
    }
}

impl fmt::Display for FinalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One application of a person to a job posting.
///
/// Scores and tier are written by the aggregation path, pipeline status by the
/// stage machine, and the decision fields only by the finalizer. The decision
/// fields are populated iff the status is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub person_id: PersonId,
    pub job_posting_id: JobPostingId,
    pub algo_score: Option<u8>,
    pub ai_score: Option<u8>,
    pub combined_score: Option<u8>,
    pub tier: Option<Tier>,
    pub pipeline_status: PipelineStatus,
    pub final_decision: Option<FinalDecision>,
    pub decision_notes: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl Candidate {
    pub fn fresh(id: CandidateId, person_id: PersonId, job_posting_id: JobPostingId) -> Self {
        Self {
            id,
            person_id,
            job_posting_id,
            algo_score: None,
            ai_score: None,
            combined_score: None,
            tier: None,
            pipeline_status: PipelineStatus::New,
            final_decision: None,
            decision_notes: None,
            decided_at: None,
        }
    }

    pub fn decision_rationale(&self) -> String {
        match (self.final_decision, &self.decision_notes) {
            (Some(decision), Some(notes)) => format!("{decision}: {notes}"),
            (Some(decision), None) => decision.label().to_string(),
            (None, _) if self.pipeline_status == PipelineStatus::DecisionPending => {
                "awaiting final decision".to_string()
            }
            (None, _) => "pipeline in progress".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Scheduled,
    Active,
    Completed,
    Cancelled,
}

impl InterviewStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One interview slot for a candidate at a stage of a job's pipeline.
///
/// At most one non-cancelled row may exist per (candidate, job, stage);
/// cancellation frees the slot for rescheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub id: InterviewId,
    pub candidate_id: CandidateId,
    pub job_posting_id: JobPostingId,
    #[serde(deserialize_with = "deserialize_stage_index")]
    pub stage_index: usize,
    pub status: InterviewStatus,
    pub room_name: Option<String>,
}
