use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::hiring::pipeline::domain::{
    Candidate, CandidateId, Interview, InterviewId, InterviewStatus, JobPosting, JobPostingId,
    JobStatus, Person, PersonId, WeightCategory, WeightedAttribute,
};
use crate::workflows::hiring::pipeline::repository::{
    MemoryPipelineRepository, NotificationError, NotificationPublisher, PipelineAlert,
    PipelineRepository, RepositoryError,
};
use crate::workflows::hiring::pipeline::service::PipelineService;

pub(super) fn job_with_stages(stages: &[&str]) -> JobPosting {
    JobPosting {
        id: JobPostingId("job-fixture".to_string()),
        title: "Backend Engineer".to_string(),
        status: JobStatus::Draft,
        interview_stages: stages.iter().map(|stage| stage.to_string()).collect(),
        category_weights: BTreeMap::new(),
        weighted_attributes: BTreeMap::new(),
    }
}

pub(super) fn weighted_job() -> JobPosting {
    let mut job = job_with_stages(&["Round 1", "Round 2", "Round 3"]);
    job.category_weights.insert(WeightCategory::RequiredSkills, 0.5);
    job.category_weights.insert(WeightCategory::SuccessSignals, 0.3);
    job.category_weights.insert(WeightCategory::RedFlags, 0.2);
    job.weighted_attributes.insert(
        WeightCategory::RequiredSkills,
        vec![
            WeightedAttribute {
                value: "Rust".to_string(),
                weight: 0.9,
            },
            WeightedAttribute {
                value: "Distributed systems".to_string(),
                weight: 0.7,
            },
        ],
    );
    job
}

pub(super) fn interview(
    candidate_id: &CandidateId,
    job_posting_id: &JobPostingId,
    stage_index: usize,
    status: InterviewStatus,
) -> Interview {
    Interview {
        id: InterviewId(format!("int-fixture-{stage_index}-{}", status.label())),
        candidate_id: candidate_id.clone(),
        job_posting_id: job_posting_id.clone(),
        stage_index,
        status,
        room_name: None,
    }
}

pub(super) fn completed(
    candidate_id: &CandidateId,
    job_posting_id: &JobPostingId,
    stage_index: usize,
) -> Interview {
    interview(
        candidate_id,
        job_posting_id,
        stage_index,
        InterviewStatus::Completed,
    )
}

pub(super) fn build_service() -> (
    PipelineService<MemoryPipelineRepository, MemoryNotifier>,
    Arc<MemoryPipelineRepository>,
    Arc<MemoryNotifier>,
) {
    let repository = Arc::new(MemoryPipelineRepository::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = PipelineService::new(repository.clone(), notifier.clone());
    (service, repository, notifier)
}

/// Registers a person, creates a job with the given stages, and applies.
pub(super) fn seeded_candidate(
    service: &PipelineService<MemoryPipelineRepository, MemoryNotifier>,
    stages: &[&str],
) -> (JobPosting, Candidate) {
    let person = service
        .register_person(
            "Jordan Reyes".to_string(),
            "jordan.reyes@example.com".to_string(),
            Some("https://example.com/resume.pdf".to_string()),
        )
        .expect("person registers");
    let job = service
        .create_job(
            "Backend Engineer".to_string(),
            stages.iter().map(|stage| stage.to_string()).collect(),
            BTreeMap::new(),
            BTreeMap::new(),
        )
        .expect("job creates");
    let candidate = service
        .add_candidate(person.id, job.id.clone())
        .expect("candidate applies");
    (job, candidate)
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<PipelineAlert>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<PipelineAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifier {
    fn publish(&self, alert: PipelineAlert) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("alert mutex poisoned")
            .push(alert);
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl PipelineRepository for UnavailableRepository {
    fn insert_person(&self, _person: Person) -> Result<Person, RepositoryError> {
        Err(offline())
    }

    fn fetch_person(&self, _id: &PersonId) -> Result<Option<Person>, RepositoryError> {
        Err(offline())
    }

    fn insert_job(&self, _job: JobPosting) -> Result<JobPosting, RepositoryError> {
        Err(offline())
    }

    fn fetch_job(&self, _id: &JobPostingId) -> Result<Option<JobPosting>, RepositoryError> {
        Err(offline())
    }

    fn update_job(&self, _job: JobPosting) -> Result<(), RepositoryError> {
        Err(offline())
    }

    fn insert_candidate(&self, _candidate: Candidate) -> Result<Candidate, RepositoryError> {
        Err(offline())
    }

    fn fetch_candidate(&self, _id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        Err(offline())
    }

    fn update_candidate(&self, _candidate: Candidate) -> Result<(), RepositoryError> {
        Err(offline())
    }

    fn schedule_interview(&self, _interview: Interview) -> Result<Interview, RepositoryError> {
        Err(offline())
    }

    fn fetch_interview(&self, _id: &InterviewId) -> Result<Option<Interview>, RepositoryError> {
        Err(offline())
    }

    fn update_interview(&self, _interview: Interview) -> Result<(), RepositoryError> {
        Err(offline())
    }

    fn interviews_for(
        &self,
        _candidate_id: &CandidateId,
        _job_posting_id: &JobPostingId,
    ) -> Result<Vec<Interview>, RepositoryError> {
        Err(offline())
    }
}

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("database offline".to_string())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
