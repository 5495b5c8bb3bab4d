use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Submission;
use crate::db::types::SubmissionStatus;
use crate::repositories;
use crate::services::anthropic::ChatTurn;

const FEEDBACK_SYSTEM_PROMPT: &str = "\
You are an experienced instructor for an intensive web-development cohort. \
You review weekly assignment submissions and give encouraging, specific, \
actionable feedback.

Respond with strict JSON only, no prose around it, in exactly this shape:
{
  \"strengths\": [\"...\", \"...\"],
  \"improvements\": [\"...\", \"...\"],
  \"nextSteps\": [\"...\", \"...\"],
  \"overallScore\": <integer 1-10>
}";

/// Generates feedback for the submission and persists it. API or parse
/// failures degrade to the generic fallback object, so the operation only
/// errors on storage problems.
pub(crate) async fn generate_for_submission(
    state: &AppState,
    submission: &Submission,
) -> Result<Value> {
    let assignment = repositories::assignments::find_by_id(state.db(), &submission.assignment_id)
        .await
        .context("Failed to fetch assignment for feedback")?;

    let prompt = match assignment {
        Some(assignment) => {
            let requirements = assignment.requirements.0.join("\n- ");
            format!(
                "Assignment (week {}): {}\n\n{}\n\nRequirements:\n- {}\n\n\
                 Student submission:\n{}\n\nAttached files: {}",
                assignment.week_number,
                assignment.title,
                assignment.description,
                requirements,
                submission.content,
                file_listing(submission),
            )
        }
        None => format!(
            "Student submission:\n{}\n\nAttached files: {}",
            submission.content,
            file_listing(submission),
        ),
    };

    let feedback = match state
        .ai()
        .complete(FEEDBACK_SYSTEM_PROMPT, &[ChatTurn::user(prompt)])
        .await
    {
        Ok(completion) => match parse_feedback(&completion.text) {
            Some(parsed) => with_metadata(parsed, state.ai().model(), false),
            None => {
                tracing::warn!(
                    submission_id = %submission.id,
                    "Feedback response was not parseable JSON; using fallback"
                );
                with_metadata(fallback_feedback(), state.ai().model(), true)
            }
        },
        Err(err) => {
            tracing::warn!(
                submission_id = %submission.id,
                error = %err,
                "Feedback request failed; using fallback"
            );
            with_metadata(fallback_feedback(), state.ai().model(), true)
        }
    };

    let now = primitive_now_utc();
    repositories::submissions::set_ai_feedback(state.db(), &submission.id, feedback.clone(), now)
        .await
        .context("Failed to store feedback")?;

    if submission.status == SubmissionStatus::Submitted {
        repositories::progress::create_if_absent(state.db(), &submission.student_id, now)
            .await
            .context("Failed to ensure progress row")?;
        repositories::progress::touch_activity(state.db(), &submission.student_id, now)
            .await
            .context("Failed to touch progress activity")?;
    }

    Ok(feedback)
}

#[derive(Debug, Default)]
pub(crate) struct BackfillOutcome {
    pub(crate) processed: usize,
    pub(crate) failed: usize,
}

/// Works through submissions missing feedback, pausing between calls so the
/// remote API is not hammered. Individual failures are counted, not fatal.
pub(crate) async fn backfill_missing(state: &AppState, limit: i64) -> BackfillOutcome {
    let delay = Duration::from_millis(state.settings().ai().batch_delay_ms);
    let mut outcome = BackfillOutcome::default();

    let pending = match repositories::submissions::list_missing_feedback(state.db(), limit).await {
        Ok(pending) => pending,
        Err(err) => {
            tracing::error!(error = %err, "Failed to list submissions missing feedback");
            return outcome;
        }
    };

    for (index, submission) in pending.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(delay).await;
        }

        match generate_for_submission(state, submission).await {
            Ok(_) => outcome.processed += 1,
            Err(err) => {
                outcome.failed += 1;
                tracing::warn!(
                    submission_id = %submission.id,
                    error = %err,
                    "Feedback backfill item failed"
                );
            }
        }
    }

    outcome
}

fn file_listing(submission: &Submission) -> String {
    if submission.files.0.is_empty() {
        "none".to_string()
    } else {
        submission
            .files
            .0
            .iter()
            .map(|file| file.filename.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Extracts the feedback object from a model reply. Markdown fences and
/// surrounding prose are tolerated; shape violations return `None`.
pub(crate) fn parse_feedback(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end < start {
        return None;
    }

    let parsed: Value = serde_json::from_str(&trimmed[start..=end]).ok()?;

    let strengths = string_array(parsed.get("strengths")?)?;
    let improvements = string_array(parsed.get("improvements")?)?;
    let next_steps = string_array(parsed.get("nextSteps")?)?;
    let score = parsed.get("overallScore").and_then(numeric_score)?;

    Some(json!({
        "strengths": strengths,
        "improvements": improvements,
        "nextSteps": next_steps,
        "overallScore": score.clamp(1, 10),
    }))
}

pub(crate) fn fallback_feedback() -> Value {
    json!({
        "strengths": ["Your work was submitted and is queued for review."],
        "improvements": [
            "Automated feedback is temporarily unavailable; an instructor will take a look."
        ],
        "nextSteps": ["Carry on with the next week's material in the meantime."],
        "overallScore": 7,
    })
}

fn with_metadata(mut feedback: Value, model: &str, fallback: bool) -> Value {
    let generated_at = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
    feedback["_metadata"] = json!({
        "generatedAt": generated_at,
        "model": model,
        "fallback": fallback,
    });
    feedback
}

fn string_array(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::to_string)
            .collect(),
    )
}

fn numeric_score(value: &Value) -> Option<i64> {
    if let Some(score) = value.as_i64() {
        return Some(score);
    }
    value.as_f64().map(|score| score.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let raw = r#"{"strengths":["a"],"improvements":["b"],"nextSteps":["c"],"overallScore":8}"#;
        let parsed = parse_feedback(raw).unwrap();
        assert_eq!(parsed["overallScore"], 8);
        assert_eq!(parsed["strengths"][0], "a");
    }

    #[test]
    fn strips_markdown_fences_and_prose() {
        let raw = "Here you go:\n```json\n{\"strengths\": [\"solid\"], \"improvements\": [], \"nextSteps\": [], \"overallScore\": 5}\n```\nHope that helps!";
        let parsed = parse_feedback(raw).unwrap();
        assert_eq!(parsed["strengths"][0], "solid");
        assert_eq!(parsed["overallScore"], 5);
    }

    #[test]
    fn clamps_out_of_range_scores() {
        let raw = r#"{"strengths":[],"improvements":[],"nextSteps":[],"overallScore":42}"#;
        assert_eq!(parse_feedback(raw).unwrap()["overallScore"], 10);

        let raw = r#"{"strengths":[],"improvements":[],"nextSteps":[],"overallScore":-3}"#;
        assert_eq!(parse_feedback(raw).unwrap()["overallScore"], 1);
    }

    #[test]
    fn rounds_fractional_scores() {
        let raw = r#"{"strengths":[],"improvements":[],"nextSteps":[],"overallScore":7.6}"#;
        assert_eq!(parse_feedback(raw).unwrap()["overallScore"], 8);
    }

    #[test]
    fn rejects_missing_keys() {
        assert!(parse_feedback(r#"{"strengths":[]}"#).is_none());
        assert!(parse_feedback("not json at all").is_none());
        assert!(parse_feedback("").is_none());
    }

    #[test]
    fn fallback_shape_is_complete() {
        let fallback = fallback_feedback();
        assert!(fallback["strengths"].is_array());
        assert!(fallback["improvements"].is_array());
        assert!(fallback["nextSteps"].is_array());
        assert_eq!(fallback["overallScore"], 7);
    }
}
