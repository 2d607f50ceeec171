use crate::models::question::QuestionCategory;

/// Deviations closer than this are treated as equal.
const TIE_EPSILON: f64 = 1e-9;

/// Picks the category most under-represented relative to its target weight.
///
/// `question_number` is the 1-based index of the question about to be asked.
/// Ties go to the earlier category in declared order, so the sequence is fully
/// determined by the history.
pub fn next_category(asked: &[QuestionCategory], question_number: u32) -> QuestionCategory {
    let mut best = QuestionCategory::Technical;
    let mut best_deviation = f64::NEG_INFINITY;

    for category in QuestionCategory::ALL {
        let expected = f64::from(question_number) * category.weight();
        let actual = asked.iter().filter(|c| **c == category).count() as f64;
        let deviation = expected - actual;
        if deviation > best_deviation + TIE_EPSILON {
            best = category;
            best_deviation = deviation;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use QuestionCategory::*;

    #[test]
    fn weights_sum_to_one() {
        let total: f64 = QuestionCategory::ALL.iter().map(|c| c.weight()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn first_question_is_technical() {
        assert_eq!(next_category(&[], 1), Technical);
    }

    #[test]
    fn eight_question_sequence_converges_on_weights() {
        let mut asked = Vec::new();
        for n in 1..=8 {
            let next = next_category(&asked, n);
            asked.push(next);
        }
        assert_eq!(
            asked,
            vec![
                Technical, Conceptual, Behavioral, Technical, Scenario, Conceptual, Technical,
                Behavioral
            ]
        );
    }

    #[test]
    fn equal_deviation_resolves_in_declared_order() {
        // Question 4 after T, C, B: Technical and Scenario both sit at +0.6.
        assert_eq!(next_category(&[Technical, Conceptual, Behavioral], 4), Technical);
    }

    #[test]
    fn over_represented_history_is_rebalanced() {
        let asked = vec![Technical; 5];
        assert_eq!(next_category(&asked, 6), Conceptual);
    }
}
