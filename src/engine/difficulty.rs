use crate::models::question::Difficulty;

/// Questions before this index are warm-up: difficulty may drop but never rise.
pub const WARM_UP_QUESTIONS: i32 = 3;
pub const UPGRADE_THRESHOLD: f64 = 75.0;
pub const DOWNGRADE_THRESHOLD: f64 = 50.0;

/// Difficulty for the next question after an answer scoring `score` on
/// question `question_number` (1-based). Moves at most one level.
pub fn next_difficulty(current: Difficulty, score: f64, question_number: i32) -> Difficulty {
    if score < DOWNGRADE_THRESHOLD {
        return current.easier();
    }
    if question_number >= WARM_UP_QUESTIONS && score >= UPGRADE_THRESHOLD {
        return current.harder();
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use Difficulty::*;

    #[test]
    fn strong_answer_after_warm_up_steps_up() {
        assert_eq!(next_difficulty(Medium, 80.0, 5), Hard);
        assert_eq!(next_difficulty(Easy, 75.0, 3), Medium);
    }

    #[test]
    fn warm_up_only_allows_downgrades() {
        assert_eq!(next_difficulty(Medium, 30.0, 1), Easy);
        assert_eq!(next_difficulty(Medium, 95.0, 2), Medium);
        assert_eq!(next_difficulty(Easy, 20.0, 1), Easy);
    }

    #[test]
    fn levels_are_capped_at_both_ends() {
        assert_eq!(next_difficulty(Hard, 90.0, 10), Hard);
        assert_eq!(next_difficulty(Easy, 10.0, 10), Easy);
    }

    #[test]
    fn moderate_scores_hold() {
        assert_eq!(next_difficulty(Medium, 50.0, 6), Medium);
        assert_eq!(next_difficulty(Hard, 74.9, 6), Hard);
    }

    #[test]
    fn weak_answer_steps_down_one_level_only() {
        assert_eq!(next_difficulty(Hard, 0.0, 7), Medium);
    }
}
