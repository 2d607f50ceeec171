use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::score_math::mean;
use crate::utils::time::elapsed_seconds;

/// Fewest and most questions an interview may run.
pub const MIN_QUESTIONS: i32 = 8;
pub const MAX_QUESTIONS: i32 = 12;

pub const MAX_INTERVIEW_SECS: f64 = 45.0 * 60.0;
pub const LOW_AVERAGE_MIN_ANSWERS: usize = 4;
pub const LOW_AVERAGE_THRESHOLD: f64 = 35.0;
pub const LOW_STREAK_LENGTH: usize = 3;
pub const LOW_STREAK_THRESHOLD: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationKind {
    UserRequested,
    MaxTimeExceeded,
    LowAverageScore,
    ConsecutiveLowScores,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Termination {
    pub kind: TerminationKind,
    pub reason: String,
}

/// First matching stop condition, checked in priority order, or `None`.
pub fn check_termination(
    scores: &[f64],
    start_time: DateTime<Utc>,
    now: DateTime<Utc>,
    explicit_stop: bool,
) -> Option<Termination> {
    if explicit_stop {
        return Some(Termination {
            kind: TerminationKind::UserRequested,
            reason: "Candidate requested termination".to_string(),
        });
    }

    if elapsed_seconds(start_time, now) > MAX_INTERVIEW_SECS {
        return Some(Termination {
            kind: TerminationKind::MaxTimeExceeded,
            reason: "Maximum interview time (45 minutes) exceeded".to_string(),
        });
    }

    if scores.len() >= LOW_AVERAGE_MIN_ANSWERS {
        if let Some(average) = mean(scores) {
            if average < LOW_AVERAGE_THRESHOLD {
                return Some(Termination {
                    kind: TerminationKind::LowAverageScore,
                    reason: format!(
                        "Average score ({:.1}) falls below {} threshold",
                        average, LOW_AVERAGE_THRESHOLD
                    ),
                });
            }
        }
    }

    if scores.len() >= LOW_STREAK_LENGTH {
        let tail = &scores[scores.len() - LOW_STREAK_LENGTH..];
        if tail.iter().all(|s| *s < LOW_STREAK_THRESHOLD) {
            return Some(Termination {
                kind: TerminationKind::ConsecutiveLowScores,
                reason: format!(
                    "Three consecutive answers scored below {}",
                    LOW_STREAK_THRESHOLD
                ),
            });
        }
    }

    None
}

/// Whether another question should be asked after `question_number` questions.
///
/// Stop conditions are only consulted between the minimum and maximum bounds.
pub fn should_continue(
    question_number: i32,
    scores: &[f64],
    start_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    if question_number >= MAX_QUESTIONS {
        return false;
    }
    if question_number < MIN_QUESTIONS {
        return true;
    }
    check_termination(scores, start_time, now, false).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn window(minutes: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc::now();
        (start, start + Duration::minutes(minutes))
    }

    #[test]
    fn low_average_after_four_answers() {
        let (start, now) = window(10);
        let result = check_termination(&[20.0, 25.0, 30.0, 15.0], start, now, false).unwrap();
        assert_eq!(result.kind, TerminationKind::LowAverageScore);
        assert!(result.reason.contains("22.5"));
    }

    #[test]
    fn three_low_answers_in_a_row() {
        let (start, now) = window(10);
        let result = check_termination(&[60.0, 30.0, 35.0, 38.0], start, now, false).unwrap();
        assert_eq!(result.kind, TerminationKind::ConsecutiveLowScores);
    }

    #[test]
    fn explicit_stop_wins_over_everything() {
        let (start, now) = window(60);
        let result = check_termination(&[10.0, 10.0, 10.0, 10.0], start, now, true).unwrap();
        assert_eq!(result.kind, TerminationKind::UserRequested);
        assert_eq!(result.reason, "Candidate requested termination");
    }

    #[test]
    fn time_cap_precedes_score_checks() {
        let (start, now) = window(46);
        let result = check_termination(&[10.0, 10.0, 10.0, 10.0], start, now, false).unwrap();
        assert_eq!(result.kind, TerminationKind::MaxTimeExceeded);
    }

    #[test]
    fn exactly_forty_five_minutes_is_allowed() {
        let (start, now) = window(45);
        assert!(check_termination(&[80.0], start, now, false).is_none());
    }

    #[test]
    fn healthy_scores_do_not_terminate() {
        let (start, now) = window(20);
        assert!(check_termination(&[70.0, 30.0, 80.0, 39.0], start, now, false).is_none());
        assert!(check_termination(&[], start, now, false).is_none());
    }

    #[test]
    fn bounds_override_scores() {
        let (start, now) = window(60);
        let awful = [5.0; 12];
        let great = [95.0; 12];
        for n in 0..MIN_QUESTIONS {
            assert!(should_continue(n, &awful[..n as usize], start, now));
        }
        for n in MAX_QUESTIONS..MAX_QUESTIONS + 3 {
            assert!(!should_continue(n, &great, start, start));
        }
    }

    #[test]
    fn between_bounds_defers_to_stop_conditions() {
        let (start, now) = window(20);
        assert!(should_continue(9, &[80.0; 9], start, now));
        assert!(!should_continue(9, &[60.0, 60.0, 60.0, 60.0, 60.0, 60.0, 30.0, 30.0, 30.0], start, now));
    }
}
