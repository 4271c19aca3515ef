//! Task submission review workflow
//!
//! Submissions are created `pending` and move exactly once to `approved`
//! or `rejected`. Approval runs the mission-completion cascade; both
//! decisions trigger best-effort email + push on a detached task so
//! notification failures can never fail the review itself.

use std::collections::HashMap;

use common::models::{
    FormQuestion, MissionTask, SubmissionKind, SubmissionPayload, SubmissionStatus, TaskSubmission,
};
use common::Error;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::progression::{CompletionOutcome, CompletionSource, ProgressionEngine};
use services::Notifier;

/// Whitespace-separated word count
pub fn word_count(text: &str) -> i32 {
    text.split_whitespace().count() as i32
}

/// Check a text answer against the mission's word-count bounds
pub fn validate_text_answer(content: &str, min_words: i32, max_words: i32) -> Result<(), Error> {
    let words = word_count(content);
    if words < min_words {
        return Err(Error::Validation(format!(
            "Your answer has {} words; write at least {} words",
            words, min_words
        )));
    }
    if words > max_words {
        return Err(Error::Validation(format!(
            "Your answer has {} words; write at most {} words",
            words, max_words
        )));
    }
    Ok(())
}

/// Check form answers: every required question needs a non-empty answer
pub fn validate_form_answers(
    questions: &[FormQuestion],
    answers: &HashMap<String, String>,
) -> Result<(), Error> {
    for question in questions.iter().filter(|q| q.required) {
        match answers.get(&question.id) {
            Some(answer) if !answer.trim().is_empty() => {}
            _ => {
                return Err(Error::Validation(format!(
                    "The question \"{}\" requires an answer",
                    question.label
                )))
            }
        }
    }
    Ok(())
}

/// A player's incoming submission
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub mission_id: Uuid,
    pub kind: SubmissionKind,
    pub text_content: Option<String>,
    pub form_answers: Option<HashMap<String, String>>,
    pub photo_url: Option<String>,
}

/// What creating a submission produced
#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Queued for review
    Pending(TaskSubmission),
    /// An `unable` report: auto-approved, no progression effect
    AutoApproved(TaskSubmission),
}

/// A review decision from an admin
#[derive(Debug, Clone)]
pub enum ReviewDecision {
    Approve { comment: Option<String> },
    Reject { comment: Option<String> },
}

/// The reviewed submission plus the cascade it triggered, if any
#[derive(Debug)]
pub struct ReviewOutcome {
    pub submission: TaskSubmission,
    pub completion: Option<CompletionOutcome>,
}

pub struct ReviewWorkflow {
    pool: PgPool,
    progression: ProgressionEngine,
    notifier: Notifier,
}

impl ReviewWorkflow {
    pub fn new(pool: PgPool, notifier: Notifier) -> Self {
        Self {
            progression: ProgressionEngine::new(pool.clone()),
            pool,
            notifier,
        }
    }

    /// Create a submission. Guards: the mission must take submissions of
    /// this kind, the payload must pass the mission's validation rules,
    /// and no pending or approved submission may already exist.
    pub async fn submit(
        &self,
        user_id: Uuid,
        request: SubmissionRequest,
    ) -> Result<SubmissionOutcome, Error> {
        let mission = db::missions::get(&self.pool, request.mission_id)
            .await
            .map_err(Error::db)?
            .ok_or_else(|| Error::NotFound("Mission".into()))?;

        let payload = match (&mission.task.0, request.kind) {
            (MissionTask::Photo { .. }, SubmissionKind::Completed) => {
                if request.photo_url.is_none() {
                    return Err(Error::Validation("A photo is required".into()));
                }
                None
            }
            (MissionTask::Form { questions }, SubmissionKind::Form) => {
                let answers = request
                    .form_answers
                    .ok_or_else(|| Error::Validation("Form answers are required".into()))?;
                validate_form_answers(questions, &answers)?;
                Some(SubmissionPayload::Form { answers })
            }
            (MissionTask::Text { min_words, max_words, .. }, SubmissionKind::Text) => {
                let content = request
                    .text_content
                    .ok_or_else(|| Error::Validation("Answer text is required".into()))?;
                validate_text_answer(&content, *min_words, *max_words)?;
                Some(SubmissionPayload::Text { content })
            }
            (
                MissionTask::Photo { .. } | MissionTask::Form { .. } | MissionTask::Text { .. },
                SubmissionKind::Unable,
            ) => None,
            (MissionTask::Video { .. } | MissionTask::Games, _) => {
                return Err(Error::Validation(
                    "This mission does not take submissions".into(),
                ))
            }
            _ => {
                return Err(Error::Validation(
                    "Submission kind does not match the mission's task".into(),
                ))
            }
        };

        if db::submissions::has_blocking(&self.pool, user_id, mission.id)
            .await
            .map_err(Error::db)?
        {
            return Err(Error::Conflict(
                "A submission for this mission is already pending or approved".into(),
            ));
        }

        let status = if request.kind == SubmissionKind::Unable {
            SubmissionStatus::Approved
        } else {
            SubmissionStatus::Pending
        };

        let submission = db::submissions::create(
            &self.pool,
            &db::submissions::NewSubmission {
                user_id,
                mission_id: mission.id,
                phase_id: mission.phase_id,
                kind: request.kind,
                payload,
                photo_url: request.photo_url,
                status,
            },
        )
        .await
        .map_err(Error::db)?;

        if status == SubmissionStatus::Approved {
            // No cascade for "unable": the player is told to try again
            // another time.
            Ok(SubmissionOutcome::AutoApproved(submission))
        } else {
            info!(
                "Submission {} queued for review (mission {})",
                submission.id, mission.title
            );
            Ok(SubmissionOutcome::Pending(submission))
        }
    }

    /// Apply an admin's decision to a pending submission. Approved and
    /// rejected are terminal; a second decision is a conflict. Approval
    /// runs the completion cascade once.
    pub async fn review(
        &self,
        submission_id: Uuid,
        reviewer_id: Uuid,
        decision: ReviewDecision,
    ) -> Result<ReviewOutcome, Error> {
        let submission = db::submissions::get(&self.pool, submission_id)
            .await
            .map_err(Error::db)?
            .ok_or_else(|| Error::NotFound("Submission".into()))?;

        if submission.status != SubmissionStatus::Pending {
            return Err(Error::Conflict("Submission already reviewed".into()));
        }

        let (status, comment) = match decision {
            ReviewDecision::Approve { comment } => (SubmissionStatus::Approved, comment),
            ReviewDecision::Reject { comment } => (SubmissionStatus::Rejected, comment),
        };

        // The status='pending' guard in the UPDATE makes this race-safe:
        // whoever decides second gets nothing back.
        let updated = db::submissions::decide(
            &self.pool,
            submission_id,
            status,
            reviewer_id,
            comment.as_deref(),
        )
        .await
        .map_err(Error::db)?
        .ok_or_else(|| Error::Conflict("Submission already reviewed".into()))?;

        let completion = if status == SubmissionStatus::Approved {
            Some(
                self.progression
                    .complete_mission(updated.user_id, updated.mission_id, CompletionSource::Review)
                    .await?,
            )
        } else {
            None
        };

        let pool = self.pool.clone();
        let notifier = self.notifier.clone();
        let notified = updated.clone();
        tokio::spawn(async move {
            notify_decision(pool, notifier, notified).await;
        });

        Ok(ReviewOutcome {
            submission: updated,
            completion,
        })
    }
}

/// Best-effort email + push about a review decision. Runs detached from
/// the request; every failure is logged and swallowed.
async fn notify_decision(pool: PgPool, notifier: Notifier, submission: TaskSubmission) {
    let user = match db::users::get_by_id(&pool, submission.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return,
        Err(e) => {
            warn!("Could not load user for notification: {}", e);
            return;
        }
    };

    let mission_title = match db::missions::get(&pool, submission.mission_id).await {
        Ok(Some(mission)) => mission.title,
        _ => "your mission".to_string(),
    };

    let approved = submission.status == SubmissionStatus::Approved;
    if let Err(e) = notifier
        .email
        .send_review_decision(
            &user.email,
            &user.name,
            &mission_title,
            approved,
            submission.review_comment.as_deref(),
        )
        .await
    {
        warn!("Email delivery failed for {}: {}", user.email, e);
    }

    let (title, body) = if approved {
        (
            "Mission approved! 🌵",
            format!("Your submission for {} was approved.", mission_title),
        )
    } else {
        (
            "Submission reviewed",
            format!("Your submission for {} was not approved.", mission_title),
        )
    };
    notifier.push_to_user(&pool, user.id, title, &body).await;
}
