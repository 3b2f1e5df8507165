use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::decision::{self, DecisionError};
use super::domain::{
    Candidate, CandidateId, FinalDecision, Interview, InterviewId, InterviewStatus, JobPosting,
    JobPostingId, JobStatus, Person, PersonId, PipelineStatus, WeightCategory, WeightedAttribute,
};
use super::repository::{
    CandidateStatusView, NotificationError, NotificationPublisher, PipelineAlert,
    PipelineRepository, RepositoryError,
};
use super::scoring::{self, ScoreCard, ScoreError};
use super::stages::{PipelineStageMachine, StageError};
use super::weights;

/// Service composing the weight model, score aggregation, stage machine, and
/// decision finalizer over a shared store.
pub struct PipelineService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
}

static PERSON_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static CANDIDATE_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static INTERVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_person_id() -> PersonId {
    let id = PERSON_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PersonId(format!("person-{id:06}"))
}

fn next_job_id() -> JobPostingId {
    let id = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    JobPostingId(format!("job-{id:06}"))
}

fn next_candidate_id() -> CandidateId {
    let id = CANDIDATE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CandidateId(format!("cand-{id:06}"))
}

fn next_interview_id() -> InterviewId {
    let id = INTERVIEW_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    InterviewId(format!("int-{id:06}"))
}

/// Error raised by the pipeline service.
#[derive(Debug, thiserror::Error)]
pub enum PipelineServiceError {
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Decision(#[from] DecisionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error("an interview is already scheduled for stage {stage_index}")]
    StageAlreadyScheduled { stage_index: usize },
    #[error("interview for stage {stage_index} is already {status}")]
    InterviewClosed {
        stage_index: usize,
        status: InterviewStatus,
    },
}

impl<R, N> PipelineService<R, N>
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    pub fn register_person(
        &self,
        full_name: String,
        email: String,
        resume_url: Option<String>,
    ) -> Result<Person, PipelineServiceError> {
        let person = Person {
            id: next_person_id(),
            full_name,
            email,
            resume_url,
        };
        Ok(self.repository.insert_person(person)?)
    }

    /// Creates a posting in draft with a normalized rubric. An empty stage
    /// list falls back to the legacy three-round scheme.
    pub fn create_job(
        &self,
        title: String,
        interview_stages: Vec<String>,
        category_weights: BTreeMap<WeightCategory, f32>,
        weighted_attributes: BTreeMap<WeightCategory, Vec<WeightedAttribute>>,
    ) -> Result<JobPosting, PipelineServiceError> {
        let interview_stages = if interview_stages.is_empty() {
            JobPosting::default_stages()
        } else {
            interview_stages
        };

        let mut job = JobPosting {
            id: next_job_id(),
            title,
            status: JobStatus::Draft,
            interview_stages,
            category_weights,
            weighted_attributes,
        };
        weights::normalize(&mut job);

        let report = weights::validate(&job);
        if !report.is_clean() {
            info!(job_id = %job.id.0, warnings = report.warnings.len(), "job rubric has warnings");
        }
        let missing = weights::missing_categories(&job);
        if !missing.is_empty() {
            debug!(job_id = %job.id.0, missing = missing.len(), "rubric categories not yet configured");
        }

        Ok(self.repository.insert_job(job)?)
    }

    /// Registers an application. The one-application-per-(person, job) rule
    /// is enforced by the store and surfaces as a conflict.
    pub fn add_candidate(
        &self,
        person_id: PersonId,
        job_posting_id: JobPostingId,
    ) -> Result<Candidate, PipelineServiceError> {
        self.repository
            .fetch_person(&person_id)?
            .ok_or(RepositoryError::NotFound)?;
        self.repository
            .fetch_job(&job_posting_id)?
            .ok_or(RepositoryError::NotFound)?;

        let candidate = Candidate::fresh(next_candidate_id(), person_id, job_posting_id);
        Ok(self.repository.insert_candidate(candidate)?)
    }

    fn machine_for(
        &self,
        job_posting_id: &JobPostingId,
    ) -> Result<PipelineStageMachine, PipelineServiceError> {
        let job = self
            .repository
            .fetch_job(job_posting_id)?
            .ok_or(RepositoryError::NotFound)?;
        match PipelineStageMachine::for_job(&job) {
            Ok(machine) => Ok(machine),
            Err(error) => {
                warn!(job_id = %job.id.0, %error, "unusable stage configuration");
                Err(error.into())
            }
        }
    }

    fn candidate_for(
        &self,
        candidate_id: &CandidateId,
        job_posting_id: &JobPostingId,
    ) -> Result<Candidate, PipelineServiceError> {
        let candidate = self
            .repository
            .fetch_candidate(candidate_id)?
            .ok_or(RepositoryError::NotFound)?;
        if candidate.job_posting_id != *job_posting_id {
            return Err(RepositoryError::NotFound.into());
        }
        Ok(candidate)
    }

    /// First pending stage for the candidate, or `None` once the pipeline is
    /// exhausted and the candidate is ready for a decision.
    pub fn next_stage(
        &self,
        candidate_id: &CandidateId,
        job_posting_id: &JobPostingId,
    ) -> Result<Option<usize>, PipelineServiceError> {
        let machine = self.machine_for(job_posting_id)?;
        self.candidate_for(candidate_id, job_posting_id)?;
        let interviews = self.repository.interviews_for(candidate_id, job_posting_id)?;
        Ok(machine.next_stage(&interviews))
    }

    pub fn is_complete(
        &self,
        candidate_id: &CandidateId,
        job_posting_id: &JobPostingId,
    ) -> Result<bool, PipelineServiceError> {
        let machine = self.machine_for(job_posting_id)?;
        self.candidate_for(candidate_id, job_posting_id)?;
        let interviews = self.repository.interviews_for(candidate_id, job_posting_id)?;
        Ok(machine.is_complete(&interviews))
    }

    /// Schedules the next pending stage. `next_stage` is only the advisory
    /// gate; the store's unique slot constraint resolves concurrent requests,
    /// and losing that race is reported as a retryable conflict.
    pub fn schedule_next_interview(
        &self,
        candidate_id: &CandidateId,
        job_posting_id: &JobPostingId,
    ) -> Result<Interview, PipelineServiceError> {
        let machine = self.machine_for(job_posting_id)?;
        let mut candidate = self.candidate_for(candidate_id, job_posting_id)?;
        let interviews = self.repository.interviews_for(candidate_id, job_posting_id)?;
        let stage_index = machine.next_pending(&interviews)?;

        let interview = Interview {
            id: next_interview_id(),
            candidate_id: candidate_id.clone(),
            job_posting_id: job_posting_id.clone(),
            stage_index,
            status: InterviewStatus::Scheduled,
            room_name: None,
        };

        let interview = match self.repository.schedule_interview(interview) {
            Ok(interview) => interview,
            Err(RepositoryError::Conflict) => {
                return Err(PipelineServiceError::StageAlreadyScheduled { stage_index });
            }
            Err(other) => return Err(other.into()),
        };

        if candidate.pipeline_status == PipelineStatus::New {
            candidate.pipeline_status = PipelineStatus::Stage(stage_index);
            self.repository.update_candidate(candidate)?;
        }

        info!(
            candidate_id = %interview.candidate_id.0,
            stage_index,
            stage = machine.stage_name(stage_index).unwrap_or("unknown"),
            "interview scheduled"
        );
        Ok(interview)
    }

    /// Moves a scheduled interview to active, attaching the voice room when
    /// the session layer allocates one.
    pub fn begin_interview(
        &self,
        interview_id: &InterviewId,
        room_name: Option<String>,
    ) -> Result<Interview, PipelineServiceError> {
        let mut interview = self
            .repository
            .fetch_interview(interview_id)?
            .ok_or(RepositoryError::NotFound)?;
        if matches!(
            interview.status,
            InterviewStatus::Completed | InterviewStatus::Cancelled
        ) {
            return Err(PipelineServiceError::InterviewClosed {
                stage_index: interview.stage_index,
                status: interview.status,
            });
        }
        interview.status = InterviewStatus::Active;
        if room_name.is_some() {
            interview.room_name = room_name;
        }
        self.repository.update_interview(interview.clone())?;
        Ok(interview)
    }

    /// Cancels a scheduled or active interview, freeing the stage slot for
    /// rescheduling. Never touches the candidate's pipeline status.
    pub fn cancel_interview(
        &self,
        interview_id: &InterviewId,
    ) -> Result<Interview, PipelineServiceError> {
        let mut interview = self
            .repository
            .fetch_interview(interview_id)?
            .ok_or(RepositoryError::NotFound)?;
        if interview.status == InterviewStatus::Completed {
            return Err(PipelineServiceError::InterviewClosed {
                stage_index: interview.stage_index,
                status: interview.status,
            });
        }
        if interview.status == InterviewStatus::Cancelled {
            return Ok(interview);
        }
        interview.status = InterviewStatus::Cancelled;
        self.repository.update_interview(interview.clone())?;
        Ok(interview)
    }

    /// Interview-completion event handler.
    ///
    /// Idempotent: replaying the event for an already-completed stage leaves
    /// the same resulting status. Recording the completion and deriving the
    /// `decision_pending` hand-off are one read-modify-write; a relational
    /// adapter must scope a transaction to the candidate row around this.
    pub fn record_interview_completion(
        &self,
        candidate_id: &CandidateId,
        job_posting_id: &JobPostingId,
        stage_index: usize,
    ) -> Result<Candidate, PipelineServiceError> {
        let machine = self.machine_for(job_posting_id)?;
        machine.require_in_range(stage_index)?;
        let mut candidate = self.candidate_for(candidate_id, job_posting_id)?;
        let mut interviews = self.repository.interviews_for(candidate_id, job_posting_id)?;

        let slot = interviews.iter().position(|interview| {
            interview.stage_index == stage_index && interview.status != InterviewStatus::Cancelled
        });
        match slot {
            Some(position) if interviews[position].status == InterviewStatus::Completed => {}
            Some(position) => {
                interviews[position].status = InterviewStatus::Completed;
                self.repository
                    .update_interview(interviews[position].clone())?;
            }
            None => {
                // Completion may arrive for a stage this core never saw
                // scheduled; record the row so derived state follows the
                // event stream.
                let interview = Interview {
                    id: next_interview_id(),
                    candidate_id: candidate_id.clone(),
                    job_posting_id: job_posting_id.clone(),
                    stage_index,
                    status: InterviewStatus::Completed,
                    room_name: None,
                };
                interviews.push(self.repository.schedule_interview(interview)?);
            }
        }

        // Terminal candidates stay terminal, and a decision_pending candidate
        // whose job gained stages is only reopened by an explicit operator
        // action, not by a replayed completion event.
        if candidate.pipeline_status.is_terminal() {
            return Ok(candidate);
        }
        if candidate.pipeline_status == PipelineStatus::DecisionPending
            && !machine.is_complete(&interviews)
        {
            return Ok(candidate);
        }

        let derived = machine.derived_status(&interviews);
        let newly_pending = derived == PipelineStatus::DecisionPending
            && candidate.pipeline_status != PipelineStatus::DecisionPending;
        candidate.pipeline_status = derived;
        self.repository.update_candidate(candidate.clone())?;

        if newly_pending {
            info!(candidate_id = %candidate.id.0, "all stages complete, awaiting decision");
            let mut details = BTreeMap::new();
            details.insert(
                "stage_count".to_string(),
                machine.stage_count().to_string(),
            );
            self.notifier.publish(PipelineAlert {
                template: "decision_pending".to_string(),
                candidate_id: candidate.id.clone(),
                details,
            })?;
        }

        Ok(candidate)
    }

    /// Merges newly arrived scorer outputs and re-derives the combined score
    /// and tier. Whichever scorer reports last wins the final write; there is
    /// no ordering dependency between the two.
    pub fn record_scores(
        &self,
        candidate_id: &CandidateId,
        algo_score: Option<u8>,
        ai_score: Option<u8>,
    ) -> Result<ScoreCard, PipelineServiceError> {
        let mut candidate = self
            .repository
            .fetch_candidate(candidate_id)?
            .ok_or(RepositoryError::NotFound)?;

        let algo = algo_score.or(candidate.algo_score);
        let ai = ai_score.or(candidate.ai_score);
        let card = scoring::combine(algo, ai)?;

        candidate.algo_score = algo;
        candidate.ai_score = ai;
        candidate.combined_score = card.combined_score;
        candidate.tier = card.tier;
        self.repository.update_candidate(candidate)?;

        Ok(card)
    }

    /// Recomputes the combined score and tier from the stored scorer outputs.
    pub fn combine_scores(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<ScoreCard, PipelineServiceError> {
        self.record_scores(candidate_id, None, None)
    }

    /// Records the terminal decision once the pipeline is exhausted and
    /// notifies downstream consumers.
    pub fn decide(
        &self,
        candidate_id: &CandidateId,
        job_posting_id: &JobPostingId,
        decision: FinalDecision,
        notes: &str,
    ) -> Result<Candidate, PipelineServiceError> {
        let mut candidate = self.candidate_for(candidate_id, job_posting_id)?;
        decision::finalize(&mut candidate, decision, notes, Utc::now())?;
        self.repository.update_candidate(candidate.clone())?;

        info!(candidate_id = %candidate.id.0, decision = %decision, "final decision recorded");
        let mut details = BTreeMap::new();
        details.insert("decision".to_string(), decision.label().to_string());
        self.notifier.publish(PipelineAlert {
            template: format!("candidate_{}", decision.label()),
            candidate_id: candidate.id.clone(),
            details,
        })?;

        Ok(candidate)
    }

    /// Fetches a candidate's sanitized status for API responses.
    pub fn status(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<CandidateStatusView, PipelineServiceError> {
        let candidate = self
            .repository
            .fetch_candidate(candidate_id)?
            .ok_or(RepositoryError::NotFound)?;
        let machine = self.machine_for(&candidate.job_posting_id)?;
        let interviews = self
            .repository
            .interviews_for(candidate_id, &candidate.job_posting_id)?;
        Ok(CandidateStatusView::new(
            &candidate,
            machine.next_stage(&interviews),
        ))
    }

    pub fn job(&self, job_posting_id: &JobPostingId) -> Result<JobPosting, PipelineServiceError> {
        Ok(self
            .repository
            .fetch_job(job_posting_id)?
            .ok_or(RepositoryError::NotFound)?)
    }
}
