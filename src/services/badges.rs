use crate::db::models::Progress;

/// The closed badge catalog. Adding a badge means adding a variant here and
/// wiring its predicate; stored progress rows only ever hold these ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Badge {
    FirstSteps,
    HalfwayThere,
    Finisher,
    WeekStreak,
    PointCollector,
    AiExplorer,
}

impl Badge {
    pub(crate) const ALL: [Badge; 6] = [
        Badge::FirstSteps,
        Badge::HalfwayThere,
        Badge::Finisher,
        Badge::WeekStreak,
        Badge::PointCollector,
        Badge::AiExplorer,
    ];

    pub(crate) fn id(self) -> &'static str {
        match self {
            Badge::FirstSteps => "first_steps",
            Badge::HalfwayThere => "halfway_there",
            Badge::Finisher => "finisher",
            Badge::WeekStreak => "week_streak",
            Badge::PointCollector => "point_collector",
            Badge::AiExplorer => "ai_explorer",
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Badge::FirstSteps => "First Steps",
            Badge::HalfwayThere => "Halfway There",
            Badge::Finisher => "Finisher",
            Badge::WeekStreak => "Week Streak",
            Badge::PointCollector => "Point Collector",
            Badge::AiExplorer => "AI Explorer",
        }
    }

    pub(crate) fn description(self) -> &'static str {
        match self {
            Badge::FirstSteps => "Completed your first assignment",
            Badge::HalfwayThere => "Completed four assignments",
            Badge::Finisher => "Completed all eight weekly assignments",
            Badge::WeekStreak => "Stayed active seven days in a row",
            Badge::PointCollector => "Collected 500 points",
            Badge::AiExplorer => "Watched ten course videos",
        }
    }

    pub(crate) fn icon(self) -> &'static str {
        match self {
            Badge::FirstSteps => "🚀",
            Badge::HalfwayThere => "🏔️",
            Badge::Finisher => "🏁",
            Badge::WeekStreak => "🔥",
            Badge::PointCollector => "💎",
            Badge::AiExplorer => "🤖",
        }
    }

    pub(crate) fn earned_by(self, progress: &Progress) -> bool {
        match self {
            Badge::FirstSteps => !progress.assignments_completed.0.is_empty(),
            Badge::HalfwayThere => progress.assignments_completed.0.len() >= 4,
            Badge::Finisher => progress.assignments_completed.0.len() >= 8,
            Badge::WeekStreak => progress.current_streak >= 7,
            Badge::PointCollector => progress.total_points >= 500,
            Badge::AiExplorer => progress.videos_watched.0.len() >= 10,
        }
    }
}

/// Badges the student qualifies for but does not hold yet.
pub(crate) fn newly_earned(progress: &Progress) -> Vec<Badge> {
    Badge::ALL
        .into_iter()
        .filter(|badge| !progress.badges.0.iter().any(|held| held == badge.id()))
        .filter(|badge| badge.earned_by(progress))
        .collect()
}

#[cfg(test)]
mod tests {
    use sqlx::types::Json;
    use time::macros::datetime;

    use super::*;
    use crate::db::models::{ForumStats, WatchRecord};

    fn progress() -> Progress {
        Progress {
            student_id: "student-1".to_string(),
            total_points: 0,
            current_streak: 0,
            last_activity_at: datetime!(2025-06-01 12:00),
            assignments_completed: Json(Vec::new()),
            videos_watched: Json(Vec::new()),
            badges: Json(Vec::new()),
            forum_stats: Json(ForumStats::default()),
            created_at: datetime!(2025-06-01 12:00),
            updated_at: datetime!(2025-06-01 12:00),
        }
    }

    fn watches(count: usize) -> Vec<WatchRecord> {
        (0..count)
            .map(|i| WatchRecord {
                video_id: format!("video-{i}"),
                watched_at: "2025-06-01T12:00:00Z".to_string(),
            })
            .collect()
    }

    #[test]
    fn ai_explorer_requires_exactly_ten_watches() {
        let mut p = progress();
        p.videos_watched = Json(watches(9));
        assert!(!Badge::AiExplorer.earned_by(&p));

        p.videos_watched = Json(watches(10));
        assert!(Badge::AiExplorer.earned_by(&p));
    }

    #[test]
    fn newly_earned_skips_held_badges() {
        let mut p = progress();
        p.assignments_completed = Json(vec!["week-1".to_string()]);
        p.badges = Json(vec!["first_steps".to_string()]);
        assert!(newly_earned(&p).is_empty());
    }

    #[test]
    fn newly_earned_reports_all_qualifying() {
        let mut p = progress();
        p.assignments_completed = Json(vec!["week-1".to_string()]);
        p.total_points = 520;
        let earned = newly_earned(&p);
        assert!(earned.contains(&Badge::FirstSteps));
        assert!(earned.contains(&Badge::PointCollector));
        assert!(!earned.contains(&Badge::WeekStreak));
    }

    #[test]
    fn catalog_ids_are_unique() {
        let mut ids: Vec<&str> = Badge::ALL.iter().map(|badge| badge.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), Badge::ALL.len());
    }
}
