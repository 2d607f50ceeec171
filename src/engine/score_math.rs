//! Numeric helpers shared by answer scoring and report synthesis.

use crate::models::answer::RubricBreakdown;

/// Seconds of overtime that cost one penalty step.
pub const PENALTY_INTERVAL_SECS: f64 = 10.0;
/// Points lost per penalty step.
pub const PENALTY_PER_INTERVAL: f64 = 5.0;
/// The penalty never goes below this.
pub const MAX_PENALTY: f64 = -20.0;
/// Answers running past this multiple of the limit are auto-submitted.
pub const AUTO_SUBMIT_MULTIPLIER: f64 = 1.5;

pub fn normalize_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

pub fn round_score(score: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (score * factor).round() / factor
}

/// 100 inside the limit, then a linear decay to 0 at twice the limit.
pub fn time_efficiency_score(time_taken: i32, time_limit: i32) -> f64 {
    if time_taken <= time_limit {
        return 100.0;
    }
    let overtime = f64::from(time_taken - time_limit);
    let decay = (overtime / f64::from(time_limit.max(1)) * 100.0).min(100.0);
    (100.0 - decay).max(0.0)
}

/// Zero inside the limit, otherwise -5 per full 10 seconds over, floored at -20.
pub fn time_penalty(time_taken: i32, time_limit: i32) -> f64 {
    if time_taken <= time_limit {
        return 0.0;
    }
    let overtime = f64::from(time_taken - time_limit);
    let intervals = (overtime / PENALTY_INTERVAL_SECS).floor();
    (-(intervals * PENALTY_PER_INTERVAL)).clamp(MAX_PENALTY, 0.0)
}

pub fn should_auto_submit(time_taken: i32, time_limit: i32) -> bool {
    f64::from(time_taken) >= f64::from(time_limit) * AUTO_SUBMIT_MULTIPLIER
}

/// Weighted rubric total plus the time penalty, clamped to 0-100.
///
/// Weights: accuracy 30%, clarity 20%, depth 25%, relevance 15%, time efficiency 10%.
pub fn weighted_answer_score(breakdown: &RubricBreakdown, penalty: f64) -> f64 {
    let weighted = breakdown.accuracy * 0.30
        + breakdown.clarity * 0.20
        + breakdown.depth * 0.25
        + breakdown.relevance * 0.15
        + breakdown.time_efficiency * 0.10;
    normalize_score(weighted + penalty)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
