use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::report::performance_trend;
use crate::engine::score_math::mean;
use crate::models::question::QuestionCategory;
use crate::models::report::PerformanceTrend;
use crate::utils::time::elapsed_seconds;

/// Number of most recent scores carried in a snapshot.
pub const RECENT_WINDOW: usize = 3;

/// Live view of an in-progress session, recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSnapshot {
    pub time_elapsed: f64,
    pub questions_answered: usize,
    pub average_score: f64,
    /// Mean score per lower-cased category name; unseen categories are absent.
    pub skill_breakdown: BTreeMap<String, f64>,
    pub last_scores: Vec<f64>,
    pub performance_trend: PerformanceTrend,
}

/// Aggregates `(category, score)` observations in the order they were answered.
pub fn performance_snapshot(
    observations: &[(QuestionCategory, f64)],
    start_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> PerformanceSnapshot {
    let scores: Vec<f64> = observations.iter().map(|(_, s)| *s).collect();

    let mut skill_breakdown = BTreeMap::new();
    for category in QuestionCategory::ALL {
        let in_category: Vec<f64> = observations
            .iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, s)| *s)
            .collect();
        if let Some(avg) = mean(&in_category) {
            skill_breakdown.insert(category.as_str().to_lowercase(), avg);
        }
    }

    let tail_start = scores.len().saturating_sub(RECENT_WINDOW);

    PerformanceSnapshot {
        time_elapsed: elapsed_seconds(start_time, now),
        questions_answered: scores.len(),
        average_score: mean(&scores).unwrap_or(0.0),
        skill_breakdown,
        last_scores: scores[tail_start..].to_vec(),
        performance_trend: performance_trend(&scores),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use QuestionCategory::*;

    #[test]
    fn empty_session_snapshot() {
        let start = Utc::now();
        let snapshot = performance_snapshot(&[], start, start + Duration::seconds(30));
        assert_eq!(snapshot.time_elapsed, 30.0);
        assert_eq!(snapshot.average_score, 0.0);
        assert!(snapshot.skill_breakdown.is_empty());
        assert!(snapshot.last_scores.is_empty());
        assert_eq!(snapshot.performance_trend, PerformanceTrend::Stable);
    }

    #[test]
    fn groups_by_category_and_keeps_last_three() {
        let start = Utc::now();
        let observations = [
            (Technical, 60.0),
            (Conceptual, 70.0),
            (Technical, 80.0),
            (Behavioral, 50.0),
        ];
        let snapshot = performance_snapshot(&observations, start, start);
        assert_eq!(snapshot.questions_answered, 4);
        assert_eq!(snapshot.average_score, 65.0);
        assert_eq!(snapshot.skill_breakdown.get("technical"), Some(&70.0));
        assert_eq!(snapshot.skill_breakdown.get("conceptual"), Some(&70.0));
        assert_eq!(snapshot.skill_breakdown.get("behavioral"), Some(&50.0));
        assert!(!snapshot.skill_breakdown.contains_key("scenario"));
        assert_eq!(snapshot.last_scores, vec![70.0, 80.0, 50.0]);
    }
}
