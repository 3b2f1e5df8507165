//! Candidate scoring and interview pipeline progression for job postings.
//!
//! Combines four pieces over one store: the weighted attribute rubric on a
//! posting, the score aggregation that blends external scorer outputs into a
//! ranked tier, the stage machine deriving each candidate's position from the
//! interviews recorded so far, and the finalizer that records the terminal
//! hire/reject outcome.

pub mod decision;
pub mod domain;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod stages;
pub mod weights;

#[cfg(test)]
mod tests;

pub use decision::DecisionError;
pub use domain::{
    Candidate, CandidateId, FinalDecision, Interview, InterviewId, InterviewStatus, JobPosting,
    JobPostingId, JobStatus, Person, PersonId, PipelineStatus, WeightCategory, WeightedAttribute,
};
pub use repository::{
    CandidateStatusView, MemoryPipelineRepository, NotificationError, NotificationPublisher,
    PipelineAlert, PipelineRepository, RepositoryError, TracingNotifier,
};
pub use router::pipeline_router;
pub use scoring::{ScoreCard, ScoreError, Tier};
pub use service::{PipelineService, PipelineServiceError};
pub use stages::{PipelineStageMachine, StageError};
pub use weights::{RubricReport, RubricWarning};
