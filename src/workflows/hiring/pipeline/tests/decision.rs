use chrono::{TimeZone, Utc};

use crate::workflows::hiring::pipeline::decision::{finalize, DecisionError};
use crate::workflows::hiring::pipeline::domain::{
    Candidate, CandidateId, FinalDecision, JobPostingId, PersonId, PipelineStatus,
};

fn pending_candidate() -> Candidate {
    let mut candidate = Candidate::fresh(
        CandidateId("cand-decision".to_string()),
        PersonId("person-decision".to_string()),
        JobPostingId("job-decision".to_string()),
    );
    candidate.pipeline_status = PipelineStatus::DecisionPending;
    candidate
}

#[test]
fn finalize_records_decision_fields_and_terminal_status() {
    let mut candidate = pending_candidate();
    let decided_at = Utc.with_ymd_and_hms(2025, 11, 3, 16, 30, 0).unwrap();

    finalize(
        &mut candidate,
        FinalDecision::Accepted,
        "strong technical signal",
        decided_at,
    )
    .expect("decision records");

    assert_eq!(candidate.pipeline_status, PipelineStatus::Accepted);
    assert_eq!(candidate.final_decision, Some(FinalDecision::Accepted));
    assert_eq!(
        candidate.decision_notes.as_deref(),
        Some("strong technical signal")
    );
    assert_eq!(candidate.decided_at, Some(decided_at));
    assert_eq!(
        candidate.decision_rationale(),
        "accepted: strong technical signal"
    );
}

#[test]
fn finalize_requires_a_complete_pipeline() {
    let mut candidate = pending_candidate();
    candidate.pipeline_status = PipelineStatus::Stage(1);

    match finalize(
        &mut candidate,
        FinalDecision::Rejected,
        "missing depth",
        Utc::now(),
    ) {
        Err(DecisionError::PipelineNotComplete { status }) => {
            assert_eq!(status, PipelineStatus::Stage(1));
        }
        other => panic!("expected precondition failure, got {other:?}"),
    }
    assert_eq!(candidate.final_decision, None, "nothing was written");
    assert_eq!(candidate.decided_at, None);
}

#[test]
fn finalize_is_one_way_and_preserves_the_audit_trail() {
    let mut candidate = pending_candidate();
    let first = Utc.with_ymd_and_hms(2025, 11, 3, 16, 30, 0).unwrap();
    finalize(&mut candidate, FinalDecision::Rejected, "culture mismatch", first)
        .expect("first decision records");

    let second = Utc.with_ymd_and_hms(2025, 11, 4, 9, 0, 0).unwrap();
    match finalize(&mut candidate, FinalDecision::Accepted, "changed our mind", second) {
        Err(DecisionError::AlreadyDecided {
            decision: FinalDecision::Rejected,
        }) => {}
        other => panic!("expected terminal conflict, got {other:?}"),
    }

    assert_eq!(candidate.pipeline_status, PipelineStatus::Rejected);
    assert_eq!(candidate.final_decision, Some(FinalDecision::Rejected));
    assert_eq!(candidate.decided_at, Some(first), "decided_at is immutable");
}

#[test]
fn finalize_requires_notes() {
    let mut candidate = pending_candidate();
    match finalize(&mut candidate, FinalDecision::Accepted, "   ", Utc::now()) {
        Err(DecisionError::NotesRequired) => {}
        other => panic!("expected notes requirement, got {other:?}"),
    }
    assert_eq!(candidate.pipeline_status, PipelineStatus::DecisionPending);
}
