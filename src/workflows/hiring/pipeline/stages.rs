use std::collections::BTreeSet;

use super::domain::{Interview, InterviewStatus, JobPosting, PipelineStatus};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    #[error("job has no interview stages configured")]
    NoStagesConfigured,
    #[error("stage index {index} outside the configured range 0..{count}")]
    StageOutOfRange { index: usize, count: usize },
    #[error("all {count} configured stages are already complete")]
    PipelineExhausted { count: usize },
}

/// Stage progression for one (candidate, job) pair.
///
/// The machine holds only the job's configured stage list; everything else is
/// derived from the interview rows passed into each query, so progression is
/// always recomputed against the current configuration. Candidates who
/// progressed under an older, longer list are not retroactively invalidated:
/// indices beyond the current list simply stop counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStageMachine {
    stages: Vec<String>,
}

impl PipelineStageMachine {
    pub fn for_job(job: &JobPosting) -> Result<Self, StageError> {
        Self::with_stages(job.interview_stages.clone())
    }

    pub fn with_stages(stages: Vec<String>) -> Result<Self, StageError> {
        if stages.is_empty() {
            return Err(StageError::NoStagesConfigured);
        }
        Ok(Self { stages })
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage_name(&self, index: usize) -> Option<&str> {
        self.stages.get(index).map(String::as_str)
    }

    pub fn require_in_range(&self, index: usize) -> Result<(), StageError> {
        if index >= self.stages.len() {
            return Err(StageError::StageOutOfRange {
                index,
                count: self.stages.len(),
            });
        }
        Ok(())
    }

    /// Distinct stage indices with a completed interview. Cancelled and
    /// in-flight rows do not count, and neither do indices beyond the current
    /// stage list.
    pub fn completed_stages(&self, interviews: &[Interview]) -> BTreeSet<usize> {
        interviews
            .iter()
            .filter(|interview| interview.status == InterviewStatus::Completed)
            .map(|interview| interview.stage_index)
            .filter(|index| *index < self.stages.len())
            .collect()
    }

    /// First stage in configured order without a completed interview, or
    /// `None` once the pipeline is exhausted.
    ///
    /// Advisory only: the unique (candidate, job, stage) constraint in the
    /// store is the authoritative guard against double-scheduling.
    pub fn next_stage(&self, interviews: &[Interview]) -> Option<usize> {
        let completed = self.completed_stages(interviews);
        (0..self.stages.len()).find(|index| !completed.contains(index))
    }

    /// Like `next_stage`, but an exhausted pipeline is an error; used by
    /// scheduling paths that need a concrete stage to act on.
    pub fn next_pending(&self, interviews: &[Interview]) -> Result<usize, StageError> {
        self.next_stage(interviews)
            .ok_or(StageError::PipelineExhausted {
                count: self.stages.len(),
            })
    }

    pub fn is_complete(&self, interviews: &[Interview]) -> bool {
        self.completed_stages(interviews).len() >= self.stages.len()
    }

    /// Pipeline status implied by the recorded interviews: the next pending
    /// stage, or `decision_pending` once every configured stage completed.
    pub fn derived_status(&self, interviews: &[Interview]) -> PipelineStatus {
        match self.next_stage(interviews) {
            Some(index) => PipelineStatus::Stage(index),
            None => PipelineStatus::DecisionPending,
        }
    }
}
