use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::domain::{
    Candidate, CandidateId, Interview, InterviewId, InterviewStatus, JobPosting, JobPostingId,
    Person, PersonId,
};

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction over the shared relational store so the service layer
/// can be exercised in isolation.
///
/// All pipeline state is partitioned by (candidate, job); implementations
/// must enforce one non-cancelled interview row per (candidate, job, stage)
/// and one application per (person, job), reporting violations as `Conflict`.
pub trait PipelineRepository: Send + Sync {
    fn insert_person(&self, person: Person) -> Result<Person, RepositoryError>;
    fn fetch_person(&self, id: &PersonId) -> Result<Option<Person>, RepositoryError>;

    fn insert_job(&self, job: JobPosting) -> Result<JobPosting, RepositoryError>;
    fn fetch_job(&self, id: &JobPostingId) -> Result<Option<JobPosting>, RepositoryError>;
    fn update_job(&self, job: JobPosting) -> Result<(), RepositoryError>;

    fn insert_candidate(&self, candidate: Candidate) -> Result<Candidate, RepositoryError>;
    fn fetch_candidate(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError>;
    fn update_candidate(&self, candidate: Candidate) -> Result<(), RepositoryError>;

    /// Creates the interview row for a stage slot. The uniqueness of the
    /// (candidate, job, stage) triple is the authoritative scheduling guard;
    /// a `Conflict` here is an expected, retryable outcome.
    fn schedule_interview(&self, interview: Interview) -> Result<Interview, RepositoryError>;
    fn fetch_interview(&self, id: &InterviewId) -> Result<Option<Interview>, RepositoryError>;
    fn update_interview(&self, interview: Interview) -> Result<(), RepositoryError>;
    fn interviews_for(
        &self,
        candidate_id: &CandidateId,
        job_posting_id: &JobPostingId,
    ) -> Result<Vec<Interview>, RepositoryError>;
}

/// Trait describing outbound notification hooks (ATS webhooks, e-mail
/// adapters) fired on pipeline milestones.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, alert: PipelineAlert) -> Result<(), NotificationError>;
}

/// Alert payload so routes and tests can assert integration boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineAlert {
    pub template: String,
    pub candidate_id: CandidateId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Default publisher that hands alerts to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationPublisher for TracingNotifier {
    fn publish(&self, alert: PipelineAlert) -> Result<(), NotificationError> {
        tracing::info!(
            template = %alert.template,
            candidate_id = %alert.candidate_id.0,
            "pipeline alert"
        );
        Ok(())
    }
}

/// Sanitized projection of a candidate for API responses and CLI output.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateStatusView {
    pub candidate_id: CandidateId,
    pub pipeline_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_stage: Option<usize>,
    pub decision_rationale: String,
}

impl CandidateStatusView {
    pub fn new(candidate: &Candidate, next_stage: Option<usize>) -> Self {
        Self {
            candidate_id: candidate.id.clone(),
            pipeline_status: candidate.pipeline_status.label(),
            combined_score: candidate.combined_score,
            tier: candidate.tier.map(|tier| tier.label()),
            next_stage,
            decision_rationale: candidate.decision_rationale(),
        }
    }
}

/// In-memory store backing the default binary wiring and the test suites.
///
/// Pipeline progress is long-lived, so production deployments swap this for a
/// relational adapter; the maps mirror the minimum persisted layout
/// (job_postings, candidates, interviews keyed per (candidate, job)).
#[derive(Debug, Default)]
pub struct MemoryPipelineRepository {
    persons: Mutex<HashMap<PersonId, Person>>,
    jobs: Mutex<HashMap<JobPostingId, JobPosting>>,
    candidates: Mutex<HashMap<CandidateId, Candidate>>,
    interviews: Mutex<HashMap<InterviewId, Interview>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("state mutex poisoned".to_string()))
}

impl PipelineRepository for MemoryPipelineRepository {
    fn insert_person(&self, person: Person) -> Result<Person, RepositoryError> {
        let mut persons = lock(&self.persons)?;
        if persons.contains_key(&person.id) {
            return Err(RepositoryError::Conflict);
        }
        persons.insert(person.id.clone(), person.clone());
        Ok(person)
    }

    fn fetch_person(&self, id: &PersonId) -> Result<Option<Person>, RepositoryError> {
        Ok(lock(&self.persons)?.get(id).cloned())
    }

    fn insert_job(&self, job: JobPosting) -> Result<JobPosting, RepositoryError> {
        let mut jobs = lock(&self.jobs)?;
        if jobs.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn fetch_job(&self, id: &JobPostingId) -> Result<Option<JobPosting>, RepositoryError> {
        Ok(lock(&self.jobs)?.get(id).cloned())
    }

    fn update_job(&self, job: JobPosting) -> Result<(), RepositoryError> {
        let mut jobs = lock(&self.jobs)?;
        if !jobs.contains_key(&job.id) {
            return Err(RepositoryError::NotFound);
        }
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    fn insert_candidate(&self, candidate: Candidate) -> Result<Candidate, RepositoryError> {
        let mut candidates = lock(&self.candidates)?;
        let duplicate = candidates.contains_key(&candidate.id)
            || candidates.values().any(|existing| {
                existing.person_id == candidate.person_id
                    && existing.job_posting_id == candidate.job_posting_id
            });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        candidates.insert(candidate.id.clone(), candidate.clone());
        Ok(candidate)
    }

    fn fetch_candidate(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        Ok(lock(&self.candidates)?.get(id).cloned())
    }

    fn update_candidate(&self, candidate: Candidate) -> Result<(), RepositoryError> {
        let mut candidates = lock(&self.candidates)?;
        if !candidates.contains_key(&candidate.id) {
            return Err(RepositoryError::NotFound);
        }
        candidates.insert(candidate.id.clone(), candidate);
        Ok(())
    }

    fn schedule_interview(&self, interview: Interview) -> Result<Interview, RepositoryError> {
        let mut interviews = lock(&self.interviews)?;
        let slot_taken = interviews.values().any(|existing| {
            existing.status != InterviewStatus::Cancelled
                && existing.candidate_id == interview.candidate_id
                && existing.job_posting_id == interview.job_posting_id
                && existing.stage_index == interview.stage_index
        });
        let room_taken = match &interview.room_name {
            Some(room) => interviews
                .values()
                .any(|existing| existing.room_name.as_deref() == Some(room)),
            None => false,
        };
        if slot_taken || room_taken || interviews.contains_key(&interview.id) {
            return Err(RepositoryError::Conflict);
        }
        interviews.insert(interview.id.clone(), interview.clone());
        Ok(interview)
    }

    fn fetch_interview(&self, id: &InterviewId) -> Result<Option<Interview>, RepositoryError> {
        Ok(lock(&self.interviews)?.get(id).cloned())
    }

    fn update_interview(&self, interview: Interview) -> Result<(), RepositoryError> {
        let mut interviews = lock(&self.interviews)?;
        if !interviews.contains_key(&interview.id) {
            return Err(RepositoryError::NotFound);
        }
        interviews.insert(interview.id.clone(), interview);
        Ok(())
    }

    fn interviews_for(
        &self,
        candidate_id: &CandidateId,
        job_posting_id: &JobPostingId,
    ) -> Result<Vec<Interview>, RepositoryError> {
        let interviews = lock(&self.interviews)?;
        let mut rows: Vec<Interview> = interviews
            .values()
            .filter(|interview| {
                interview.candidate_id == *candidate_id
                    && interview.job_posting_id == *job_posting_id
            })
            .cloned()
            .collect();
        rows.sort_by_key(|interview| interview.stage_index);
        Ok(rows)
    }
}
