use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};
use time::PrimitiveDateTime;

use crate::core::config::Settings;
use crate::core::state::AppState;
use crate::core::time::{days_between, format_primitive};
use crate::db::models::WatchRecord;
use crate::db::types::SubmissionStatus;
use crate::repositories;
use crate::services::badges::{self, Badge};

/// Point values fixed at startup from settings.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PointsConfig {
    pub(crate) completion: i64,
    pub(crate) on_time_bonus: i64,
    pub(crate) first_submission_bonus: i64,
    pub(crate) streak_daily_bonus: i64,
}

impl PointsConfig {
    pub(crate) fn from_settings(settings: &Settings) -> Self {
        let gamification = settings.gamification();
        Self {
            completion: gamification.completion_points,
            on_time_bonus: gamification.on_time_bonus,
            first_submission_bonus: gamification.first_submission_bonus,
            streak_daily_bonus: gamification.streak_daily_bonus,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum GamificationError {
    #[error("Submission not found")]
    SubmissionNotFound,
    #[error("Assignment not found")]
    AssignmentNotFound,
    #[error("Submission is not approved")]
    NotApproved,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PointAward {
    pub(crate) completion: i64,
    pub(crate) on_time_bonus: i64,
    pub(crate) first_submission_bonus: i64,
    pub(crate) awarded: i64,
    pub(crate) new_total: i64,
    pub(crate) already_completed: bool,
}

pub(crate) fn compute_award(
    config: &PointsConfig,
    already_completed: bool,
    on_time: bool,
    first_submission: bool,
    current_total: i64,
) -> PointAward {
    if already_completed {
        return PointAward {
            completion: 0,
            on_time_bonus: 0,
            first_submission_bonus: 0,
            awarded: 0,
            new_total: current_total,
            already_completed: true,
        };
    }

    let completion = config.completion;
    let on_time_bonus = if on_time { config.on_time_bonus } else { 0 };
    let first_submission_bonus = if first_submission { config.first_submission_bonus } else { 0 };
    let awarded = completion + on_time_bonus + first_submission_bonus;

    PointAward {
        completion,
        on_time_bonus,
        first_submission_bonus,
        awarded,
        new_total: current_total + awarded,
        already_completed: false,
    }
}

/// Awards completion points for an approved submission inside the caller's
/// transaction. Re-awarding an already-completed assignment is a no-op that
/// reports the current total.
pub(crate) async fn calculate_points(
    tx: &mut Transaction<'_, Postgres>,
    submission_id: &str,
    config: &PointsConfig,
    now: PrimitiveDateTime,
) -> Result<PointAward, GamificationError> {
    let submission = repositories::submissions::find_by_id(&mut **tx, submission_id)
        .await?
        .ok_or(GamificationError::SubmissionNotFound)?;

    if submission.status != SubmissionStatus::Approved {
        return Err(GamificationError::NotApproved);
    }

    let assignment = repositories::assignments::find_by_id(&mut **tx, &submission.assignment_id)
        .await?
        .ok_or(GamificationError::AssignmentNotFound)?;

    repositories::progress::create_if_absent(&mut **tx, &submission.student_id, now).await?;
    let progress = repositories::progress::lock(&mut **tx, &submission.student_id).await?;

    let already_completed = progress
        .assignments_completed
        .0
        .iter()
        .any(|id| id == &submission.assignment_id);
    let on_time = submission.submitted_at <= assignment.due_date;
    let first_submission = progress.assignments_completed.0.is_empty();

    let award =
        compute_award(config, already_completed, on_time, first_submission, progress.total_points);

    if !award.already_completed {
        let mut completed = progress.assignments_completed.0;
        completed.push(submission.assignment_id.clone());
        repositories::progress::apply_award(
            &mut **tx,
            &submission.student_id,
            award.new_total,
            json!(completed),
            now,
        )
        .await?;
    }

    Ok(award)
}

/// Evaluates the catalog against the student's progress and stores any new
/// badge ids. Runs inside the caller's transaction so it sees that
/// transaction's own writes.
pub(crate) async fn check_badges(
    tx: &mut Transaction<'_, Postgres>,
    student_id: &str,
    now: PrimitiveDateTime,
) -> Result<Vec<Badge>, GamificationError> {
    let Some(progress) = repositories::progress::find_by_student(&mut **tx, student_id).await?
    else {
        return Ok(Vec::new());
    };

    let newly = badges::newly_earned(&progress);
    if newly.is_empty() {
        return Ok(newly);
    }

    let mut held = progress.badges.0;
    held.extend(newly.iter().map(|badge| badge.id().to_string()));
    repositories::progress::set_badges(&mut **tx, student_id, json!(held), now).await?;

    Ok(newly)
}

#[derive(Debug)]
pub(crate) struct WatchOutcome {
    pub(crate) recorded: bool,
    pub(crate) new_badges: Vec<Badge>,
}

/// Records one video watch and immediately re-evaluates badges in the same
/// transaction. Watching the same video twice is a no-op.
pub(crate) async fn record_video_watch(
    state: &AppState,
    student_id: &str,
    video_id: &str,
    now: PrimitiveDateTime,
) -> Result<WatchOutcome, GamificationError> {
    let mut tx = state.db().begin().await?;

    repositories::progress::create_if_absent(&mut *tx, student_id, now).await?;
    let progress = repositories::progress::lock(&mut *tx, student_id).await?;

    if progress.videos_watched.0.iter().any(|record| record.video_id == video_id) {
        return Ok(WatchOutcome { recorded: false, new_badges: Vec::new() });
    }

    let mut watched = progress.videos_watched.0;
    watched.push(WatchRecord {
        video_id: video_id.to_string(),
        watched_at: format_primitive(now),
    });
    repositories::progress::record_watches(&mut *tx, student_id, json!(watched), now).await?;

    let new_badges = check_badges(&mut tx, student_id, now).await?;
    tx.commit().await?;

    Ok(WatchOutcome { recorded: true, new_badges })
}

#[derive(Debug, Default)]
pub(crate) struct StreakSweep {
    pub(crate) incremented: usize,
    pub(crate) reset: usize,
    pub(crate) unchanged: usize,
    pub(crate) failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreakChange {
    Incremented,
    Reset,
    Unchanged,
}

/// Next streak value given whole days since the last recorded activity.
pub(crate) fn evaluate_streak(days_elapsed: i64, current: i32) -> (i32, StreakChange) {
    match days_elapsed {
        1 => (current.saturating_add(1), StreakChange::Incremented),
        days if days > 1 => (0, StreakChange::Reset),
        _ => (current, StreakChange::Unchanged),
    }
}

/// Daily sweep over every progress record. Failures on individual rows are
/// counted and skipped; earlier rows stay updated.
pub(crate) async fn update_streaks(
    pool: &PgPool,
    config: &PointsConfig,
    now: PrimitiveDateTime,
) -> Result<StreakSweep, sqlx::Error> {
    let rows = repositories::progress::list_all(pool).await?;
    let mut sweep = StreakSweep::default();

    for row in rows {
        let days = days_between(row.last_activity_at, now);
        let (next_streak, change) = evaluate_streak(days, row.current_streak);

        let result = match change {
            StreakChange::Unchanged => {
                sweep.unchanged += 1;
                continue;
            }
            StreakChange::Incremented => {
                repositories::progress::set_streak(
                    pool,
                    &row.student_id,
                    next_streak,
                    row.total_points + config.streak_daily_bonus,
                    now,
                )
                .await
            }
            StreakChange::Reset => {
                repositories::progress::set_streak(pool, &row.student_id, 0, row.total_points, now)
                    .await
            }
        };

        match result {
            Ok(()) => match change {
                StreakChange::Incremented => sweep.incremented += 1,
                StreakChange::Reset => sweep.reset += 1,
                StreakChange::Unchanged => {}
            },
            Err(err) => {
                sweep.failed += 1;
                tracing::warn!(
                    student_id = %row.student_id,
                    error = %err,
                    "Streak update failed for student"
                );
            }
        }
    }

    Ok(sweep)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PointsConfig {
        PointsConfig {
            completion: 100,
            on_time_bonus: 20,
            first_submission_bonus: 50,
            streak_daily_bonus: 10,
        }
    }

    #[test]
    fn first_on_time_submission_awards_everything() {
        let award = compute_award(&config(), false, true, true, 0);
        assert_eq!(award.awarded, 170);
        assert_eq!(award.new_total, 170);
        assert_eq!(award.completion, 100);
        assert_eq!(award.on_time_bonus, 20);
        assert_eq!(award.first_submission_bonus, 50);
    }

    #[test]
    fn late_second_submission_awards_base_only() {
        let award = compute_award(&config(), false, false, false, 170);
        assert_eq!(award.awarded, 100);
        assert_eq!(award.new_total, 270);
    }

    #[test]
    fn already_completed_assignment_awards_nothing() {
        let award = compute_award(&config(), true, true, true, 300);
        assert!(award.already_completed);
        assert_eq!(award.awarded, 0);
        assert_eq!(award.new_total, 300);
    }

    #[test]
    fn streak_increments_after_exactly_one_day() {
        assert_eq!(evaluate_streak(1, 3), (4, StreakChange::Incremented));
    }

    #[test]
    fn streak_resets_after_a_gap() {
        assert_eq!(evaluate_streak(2, 9), (0, StreakChange::Reset));
        assert_eq!(evaluate_streak(30, 1), (0, StreakChange::Reset));
    }

    #[test]
    fn streak_unchanged_same_day_or_clock_skew() {
        assert_eq!(evaluate_streak(0, 5), (5, StreakChange::Unchanged));
        assert_eq!(evaluate_streak(-1, 5), (5, StreakChange::Unchanged));
    }
}
