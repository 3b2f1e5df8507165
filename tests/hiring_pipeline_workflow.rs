//! Integration specifications for the candidate scoring and pipeline workflow.
//!
//! Scenarios drive the public service facade and HTTP router end-to-end so
//! stage progression, score aggregation, and decision finalization are
//! validated without reaching into private modules.

mod common {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use talent_ai::workflows::hiring::pipeline::{
        Candidate, JobPosting, MemoryPipelineRepository, NotificationError, NotificationPublisher,
        PipelineAlert, PipelineService, WeightCategory, WeightedAttribute,
    };

    #[derive(Default, Clone)]
    pub struct RecordingNotifier {
        events: Arc<Mutex<Vec<PipelineAlert>>>,
    }

    impl RecordingNotifier {
        pub fn events(&self) -> Vec<PipelineAlert> {
            self.events.lock().expect("alert mutex poisoned").clone()
        }
    }

    impl NotificationPublisher for RecordingNotifier {
        fn publish(&self, alert: PipelineAlert) -> Result<(), NotificationError> {
            self.events
                .lock()
                .expect("alert mutex poisoned")
                .push(alert);
            Ok(())
        }
    }

    pub fn build_service() -> (
        PipelineService<MemoryPipelineRepository, RecordingNotifier>,
        Arc<RecordingNotifier>,
    ) {
        let repository = Arc::new(MemoryPipelineRepository::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = PipelineService::new(repository, notifier.clone());
        (service, notifier)
    }

    pub fn rubric() -> BTreeMap<WeightCategory, Vec<WeightedAttribute>> {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            WeightCategory::RequiredSkills,
            vec![
                WeightedAttribute {
                    value: "Rust".to_string(),
                    weight: 0.9,
                },
                WeightedAttribute {
                    value: "rust".to_string(),
                    weight: 0.4,
                },
                WeightedAttribute {
                    value: "Event-driven design".to_string(),
                    weight: 1.7,
                },
            ],
        );
        attributes
    }

    pub fn seeded_candidate(
        service: &PipelineService<MemoryPipelineRepository, RecordingNotifier>,
        stages: &[&str],
    ) -> (JobPosting, Candidate) {
        let person = service
            .register_person(
                "Avery Chen".to_string(),
                "avery.chen@example.com".to_string(),
                None,
            )
            .expect("person registers");
        let mut weights = BTreeMap::new();
        weights.insert(WeightCategory::RequiredSkills, 0.6);
        weights.insert(WeightCategory::SuccessSignals, 0.4);
        let job = service
            .create_job(
                "Platform Engineer".to_string(),
                stages.iter().map(|stage| stage.to_string()).collect(),
                weights,
                rubric(),
            )
            .expect("job creates");
        let candidate = service
            .add_candidate(person.id, job.id.clone())
            .expect("candidate applies");
        (job, candidate)
    }
}

use common::{build_service, seeded_candidate};
use talent_ai::workflows::hiring::pipeline::{
    pipeline_router, FinalDecision, PipelineServiceError, PipelineStatus, Tier, WeightCategory,
};
use tower::ServiceExt;

#[test]
fn full_pipeline_run_reaches_an_audited_decision() {
    let (service, notifier) = build_service();
    let (job, candidate) = seeded_candidate(&service, &["Screen", "Tech Deep Dive", "Onsite"]);

    // rubric normalization happened on intake: dedup is case-insensitive and
    // weights are clamped into [0, 1]
    let attributes = &job.weighted_attributes[&WeightCategory::RequiredSkills];
    assert_eq!(attributes.len(), 2);
    assert_eq!(attributes[0].value, "Rust");
    assert_eq!(attributes[1].weight, 1.0);

    for stage_index in 0..job.stage_count() {
        let interview = service
            .schedule_next_interview(&candidate.id, &job.id)
            .expect("schedule succeeds");
        assert_eq!(interview.stage_index, stage_index);
        service
            .record_interview_completion(&candidate.id, &job.id, stage_index)
            .expect("completion records");
    }

    assert!(service
        .is_complete(&candidate.id, &job.id)
        .expect("completion computes"));

    let card = service
        .record_scores(&candidate.id, Some(88), Some(91))
        .expect("scores land");
    assert_eq!(card.combined_score, Some(90));
    assert_eq!(card.tier, Some(Tier::TopTier));

    let decided = service
        .decide(
            &candidate.id,
            &job.id,
            FinalDecision::Accepted,
            "consistent top-tier signal across rounds",
        )
        .expect("decision records");
    assert_eq!(decided.pipeline_status, PipelineStatus::Accepted);
    assert_eq!(decided.final_decision, Some(FinalDecision::Accepted));
    assert!(decided.decided_at.is_some());

    match service.decide(&candidate.id, &job.id, FinalDecision::Rejected, "flip") {
        Err(PipelineServiceError::Decision(_)) => {}
        other => panic!("expected terminal conflict, got {other:?}"),
    }

    let templates: Vec<String> = notifier
        .events()
        .into_iter()
        .map(|alert| alert.template)
        .collect();
    assert_eq!(templates, vec!["decision_pending", "candidate_accepted"]);
}

#[test]
fn unconfigured_jobs_use_the_legacy_three_round_pipeline() {
    let (service, _) = build_service();
    let (job, candidate) = seeded_candidate(&service, &[]);
    assert_eq!(job.interview_stages, vec!["Round 1", "Round 2", "Round 3"]);

    for stage_index in 0..3usize {
        assert_eq!(
            service
                .next_stage(&candidate.id, &job.id)
                .expect("next stage computes"),
            Some(stage_index)
        );
        service
            .record_interview_completion(&candidate.id, &job.id, stage_index)
            .expect("completion records");
    }

    assert_eq!(
        service
            .next_stage(&candidate.id, &job.id)
            .expect("next stage computes"),
        None
    );
    let view = service.status(&candidate.id).expect("status builds");
    assert_eq!(view.pipeline_status, "decision_pending");
}

#[test]
fn unscored_candidates_render_as_unscored_not_zero() {
    let (service, _) = build_service();
    let (_, candidate) = seeded_candidate(&service, &["Screen"]);

    let card = service
        .record_scores(&candidate.id, Some(72), None)
        .expect("partial update succeeds");
    assert_eq!(card.combined_score, None);
    assert_eq!(card.tier, None);

    let view = service.status(&candidate.id).expect("status builds");
    assert_eq!(view.combined_score, None);
    assert_eq!(view.tier, None);
}

#[tokio::test]
async fn router_exposes_the_pipeline_end_to_end() {
    let (service, _) = build_service();
    let service = std::sync::Arc::new(service);
    let (job, candidate) = seeded_candidate(&service, &["Screen"]);
    let app = pipeline_router(service);

    let schedule = app
        .clone()
        .oneshot(
            axum::http::Request::post(format!(
                "/api/v1/hiring/jobs/{}/candidates/{}/interviews",
                job.id.0, candidate.id.0
            ))
            .body(axum::body::Body::empty())
            .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(schedule.status(), axum::http::StatusCode::CREATED);

    let complete = app
        .clone()
        .oneshot(
            axum::http::Request::post(format!(
                "/api/v1/hiring/jobs/{}/candidates/{}/interviews/0/complete",
                job.id.0, candidate.id.0
            ))
            .body(axum::body::Body::empty())
            .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(complete.status(), axum::http::StatusCode::OK);

    let status = app
        .oneshot(
            axum::http::Request::get(format!(
                "/api/v1/hiring/candidates/{}",
                candidate.id.0
            ))
            .body(axum::body::Body::empty())
            .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(status.status(), axum::http::StatusCode::OK);
    let body = axum::body::to_bytes(status.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let payload: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
    assert_eq!(
        payload.get("pipeline_status"),
        Some(&serde_json::json!("decision_pending"))
    );
}
