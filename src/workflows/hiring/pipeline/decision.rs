use chrono::{DateTime, Utc};

use super::domain::{Candidate, FinalDecision, PipelineStatus};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    #[error("pipeline is not complete: candidate is at '{status}'")]
    PipelineNotComplete { status: PipelineStatus },
    #[error("candidate was already {decision}")]
    AlreadyDecided { decision: FinalDecision },
    #[error("decision notes are required")]
    NotesRequired,
}

/// Records the terminal hire/reject outcome on a candidate.
///
/// Only valid from `decision_pending`; the transition is one-way and a second
/// call fails without touching `decided_at`, keeping the audit trail intact.
/// This is the only writer of the decision fields.
pub fn finalize(
    candidate: &mut Candidate,
    decision: FinalDecision,
    notes: &str,
    decided_at: DateTime<Utc>,
) -> Result<(), DecisionError> {
    let existing = match candidate.pipeline_status {
        PipelineStatus::Accepted => Some(FinalDecision::Accepted),
        PipelineStatus::Rejected => Some(FinalDecision::Rejected),
        _ => candidate.final_decision,
    };
    if let Some(existing) = existing {
        return Err(DecisionError::AlreadyDecided { decision: existing });
    }

    if candidate.pipeline_status != PipelineStatus::DecisionPending {
        return Err(DecisionError::PipelineNotComplete {
            status: candidate.pipeline_status,
        });
    }

    let notes = notes.trim();
    if notes.is_empty() {
        return Err(DecisionError::NotesRequired);
    }

    candidate.final_decision = Some(decision);
    candidate.decision_notes = Some(notes.to_string());
    candidate.decided_at = Some(decided_at);
    candidate.pipeline_status = decision.pipeline_status();

    Ok(())
}
