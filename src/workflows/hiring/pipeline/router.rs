use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::decision::DecisionError;
use super::domain::{
    CandidateId, FinalDecision, InterviewId, JobPostingId, PersonId, WeightCategory,
    WeightedAttribute,
};
use super::repository::{
    CandidateStatusView, NotificationPublisher, PipelineRepository, RepositoryError,
};
use super::service::{PipelineService, PipelineServiceError};

/// Router builder exposing the pipeline operations as JSON endpoints.
pub fn pipeline_router<R, N>(service: Arc<PipelineService<R, N>>) -> Router
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/hiring/persons", post(register_person_handler::<R, N>))
        .route("/api/v1/hiring/jobs", post(create_job_handler::<R, N>))
        .route("/api/v1/hiring/jobs/:job_id", get(job_handler::<R, N>))
        .route(
            "/api/v1/hiring/jobs/:job_id/candidates",
            post(add_candidate_handler::<R, N>),
        )
        .route(
            "/api/v1/hiring/candidates/:candidate_id",
            get(status_handler::<R, N>),
        )
        .route(
            "/api/v1/hiring/jobs/:job_id/candidates/:candidate_id/next-stage",
            get(next_stage_handler::<R, N>),
        )
        .route(
            "/api/v1/hiring/jobs/:job_id/candidates/:candidate_id/complete",
            get(is_complete_handler::<R, N>),
        )
        .route(
            "/api/v1/hiring/jobs/:job_id/candidates/:candidate_id/interviews",
            post(schedule_handler::<R, N>),
        )
        .route(
            "/api/v1/hiring/jobs/:job_id/candidates/:candidate_id/interviews/:stage_index/complete",
            post(completion_handler::<R, N>),
        )
        .route(
            "/api/v1/hiring/candidates/:candidate_id/scores",
            post(scores_handler::<R, N>),
        )
        .route(
            "/api/v1/hiring/candidates/:candidate_id/scores/combine",
            post(combine_handler::<R, N>),
        )
        .route(
            "/api/v1/hiring/interviews/:interview_id/begin",
            post(begin_handler::<R, N>),
        )
        .route(
            "/api/v1/hiring/interviews/:interview_id/cancel",
            post(cancel_handler::<R, N>),
        )
        .route(
            "/api/v1/hiring/jobs/:job_id/candidates/:candidate_id/decision",
            post(decision_handler::<R, N>),
        )
        .with_state(service)
}

fn error_response(error: PipelineServiceError) -> Response {
    let status = match &error {
        PipelineServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        PipelineServiceError::Repository(RepositoryError::Conflict)
        | PipelineServiceError::StageAlreadyScheduled { .. }
        | PipelineServiceError::InterviewClosed { .. }
        | PipelineServiceError::Decision(DecisionError::AlreadyDecided { .. }) => {
            StatusCode::CONFLICT
        }
        PipelineServiceError::Decision(_)
        | PipelineServiceError::Stage(_)
        | PipelineServiceError::Score(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineServiceError::Repository(RepositoryError::Unavailable(_))
        | PipelineServiceError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterPersonRequest {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub resume_url: Option<String>,
}

pub(crate) async fn register_person_handler<R, N>(
    State(service): State<Arc<PipelineService<R, N>>>,
    axum::Json(request): axum::Json<RegisterPersonRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.register_person(request.full_name, request.email, request.resume_url) {
        Ok(person) => (StatusCode::CREATED, axum::Json(person)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateJobRequest {
    pub title: String,
    #[serde(default)]
    pub interview_stages: Vec<String>,
    #[serde(default)]
    pub category_weights: BTreeMap<WeightCategory, f32>,
    #[serde(default)]
    pub weighted_attributes: BTreeMap<WeightCategory, Vec<WeightedAttribute>>,
}

pub(crate) async fn create_job_handler<R, N>(
    State(service): State<Arc<PipelineService<R, N>>>,
    axum::Json(request): axum::Json<CreateJobRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.create_job(
        request.title,
        request.interview_stages,
        request.category_weights,
        request.weighted_attributes,
    ) {
        Ok(job) => (StatusCode::CREATED, axum::Json(job)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn job_handler<R, N>(
    State(service): State<Arc<PipelineService<R, N>>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.job(&JobPostingId(job_id)) {
        Ok(job) => (StatusCode::OK, axum::Json(job)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddCandidateRequest {
    pub person_id: String,
}

pub(crate) async fn add_candidate_handler<R, N>(
    State(service): State<Arc<PipelineService<R, N>>>,
    Path(job_id): Path<String>,
    axum::Json(request): axum::Json<AddCandidateRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.add_candidate(PersonId(request.person_id), JobPostingId(job_id)) {
        Ok(candidate) => (StatusCode::CREATED, axum::Json(candidate)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, N>(
    State(service): State<Arc<PipelineService<R, N>>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.status(&CandidateId(candidate_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn next_stage_handler<R, N>(
    State(service): State<Arc<PipelineService<R, N>>>,
    Path((job_id, candidate_id)): Path<(String, String)>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.next_stage(&CandidateId(candidate_id), &JobPostingId(job_id)) {
        Ok(next_stage) => {
            (StatusCode::OK, axum::Json(json!({ "next_stage": next_stage }))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn is_complete_handler<R, N>(
    State(service): State<Arc<PipelineService<R, N>>>,
    Path((job_id, candidate_id)): Path<(String, String)>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.is_complete(&CandidateId(candidate_id), &JobPostingId(job_id)) {
        Ok(complete) => {
            (StatusCode::OK, axum::Json(json!({ "complete": complete }))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn schedule_handler<R, N>(
    State(service): State<Arc<PipelineService<R, N>>>,
    Path((job_id, candidate_id)): Path<(String, String)>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.schedule_next_interview(&CandidateId(candidate_id), &JobPostingId(job_id)) {
        Ok(interview) => (StatusCode::CREATED, axum::Json(interview)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn completion_handler<R, N>(
    State(service): State<Arc<PipelineService<R, N>>>,
    Path((job_id, candidate_id, stage_index)): Path<(String, String, usize)>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.record_interview_completion(
        &CandidateId(candidate_id),
        &JobPostingId(job_id),
        stage_index,
    ) {
        Ok(candidate) => {
            (StatusCode::OK, axum::Json(json!({ "pipeline_status": candidate.pipeline_status })))
                .into_response()
        }
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordScoresRequest {
    #[serde(default)]
    pub algo_score: Option<u8>,
    #[serde(default)]
    pub ai_score: Option<u8>,
}

pub(crate) async fn scores_handler<R, N>(
    State(service): State<Arc<PipelineService<R, N>>>,
    Path(candidate_id): Path<String>,
    axum::Json(request): axum::Json<RecordScoresRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.record_scores(&CandidateId(candidate_id), request.algo_score, request.ai_score) {
        Ok(card) => (StatusCode::OK, axum::Json(card)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn combine_handler<R, N>(
    State(service): State<Arc<PipelineService<R, N>>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.combine_scores(&CandidateId(candidate_id)) {
        Ok(card) => (StatusCode::OK, axum::Json(card)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BeginInterviewRequest {
    #[serde(default)]
    pub room_name: Option<String>,
}

pub(crate) async fn begin_handler<R, N>(
    State(service): State<Arc<PipelineService<R, N>>>,
    Path(interview_id): Path<String>,
    axum::Json(request): axum::Json<BeginInterviewRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.begin_interview(&InterviewId(interview_id), request.room_name) {
        Ok(interview) => (StatusCode::OK, axum::Json(interview)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_handler<R, N>(
    State(service): State<Arc<PipelineService<R, N>>>,
    Path(interview_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.cancel_interview(&InterviewId(interview_id)) {
        Ok(interview) => (StatusCode::OK, axum::Json(interview)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionRequest {
    pub decision: FinalDecision,
    pub notes: String,
}

pub(crate) async fn decision_handler<R, N>(
    State(service): State<Arc<PipelineService<R, N>>>,
    Path((job_id, candidate_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<DecisionRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.decide(
        &CandidateId(candidate_id),
        &JobPostingId(job_id),
        request.decision,
        &request.notes,
    ) {
        Ok(candidate) => {
            let view = CandidateStatusView::new(&candidate, None);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}
