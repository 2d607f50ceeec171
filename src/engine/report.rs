//! End-of-session aggregation: trend, recommendation, strengths/weaknesses
//! and the weighted overall score.

use std::cmp::Ordering;

use crate::engine::score_math::{mean, round_score};
use crate::error::{Error, Result};
use crate::models::question::QuestionCategory;
use crate::models::report::{PerformanceTrend, Recommendation, SkillBreakdown, Weakness};

pub const TREND_MIN_SCORES: usize = 3;
pub const TREND_DELTA: f64 = 10.0;
pub const BASE_CONFIDENCE: f64 = 75.0;
pub const MIN_CONFIDENCE: f64 = 40.0;
pub const MAX_CONFIDENCE: f64 = 95.0;
/// Category mean used when a category was never asked.
pub const NEUTRAL_SKILL_SCORE: f64 = 50.0;
const HIGHLIGHT_COUNT: usize = 3;

/// One answered question as seen by the report.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRecord {
    pub category: QuestionCategory,
    pub score: f64,
    pub time_efficiency: f64,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillFeedback {
    pub skill: String,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedReport {
    pub overall_score: f64,
    pub skills: SkillBreakdown,
    pub performance_trend: PerformanceTrend,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<Weakness>,
    pub recommendation: Recommendation,
    pub recommendation_confidence: f64,
    pub question_count: i32,
    pub average_time_per_question: i32,
}

/// Compares the mean of the first half of `scores` with the second half.
///
/// The split index is `len / 2`, so with an odd count the later half holds
/// the extra score.
pub fn performance_trend(scores: &[f64]) -> PerformanceTrend {
    if scores.len() < TREND_MIN_SCORES {
        return PerformanceTrend::Stable;
    }
    let (first, second) = scores.split_at(scores.len() / 2);
    let (Some(first_avg), Some(second_avg)) = (mean(first), mean(second)) else {
        return PerformanceTrend::Stable;
    };
    let difference = second_avg - first_avg;
    if difference > TREND_DELTA {
        PerformanceTrend::Improving
    } else if difference < -TREND_DELTA {
        PerformanceTrend::Declining
    } else {
        PerformanceTrend::Stable
    }
}

pub fn recommendation(
    overall_score: f64,
    trend: PerformanceTrend,
    skill_scores: &[f64],
) -> (Recommendation, f64) {
    let mut confidence = BASE_CONFIDENCE;
    match trend {
        PerformanceTrend::Improving => confidence += 10.0,
        PerformanceTrend::Declining => confidence -= 10.0,
        PerformanceTrend::Stable => {}
    }

    let verdict = if overall_score >= 75.0 {
        confidence = confidence.min(95.0);
        Recommendation::Ready
    } else if overall_score >= 50.0 {
        confidence = confidence.min(90.0);
        Recommendation::NeedsPractice
    } else {
        confidence = confidence.min(85.0);
        Recommendation::NotReady
    };

    if let Some(avg_skill) = mean(skill_scores) {
        let max = skill_scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = skill_scores.iter().cloned().fold(f64::INFINITY, f64::min);
        if max - min > 30.0 {
            confidence -= 15.0;
        }
        if (avg_skill - overall_score).abs() > 15.0 {
            confidence -= 10.0;
        }
    }

    (verdict, confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE))
}

/// Top three skills by score, and the bottom three weakest-first with feedback.
pub fn strengths_and_weaknesses(
    skills: &[(&str, f64)],
    feedback: &[SkillFeedback],
) -> (Vec<String>, Vec<Weakness>) {
    let mut sorted: Vec<(&str, f64)> = skills.to_vec();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let strengths = sorted
        .iter()
        .take(HIGHLIGHT_COUNT)
        .map(|(name, _)| name.to_string())
        .collect();

    let tail_start = sorted.len().saturating_sub(HIGHLIGHT_COUNT);
    let weaknesses = sorted[tail_start..]
        .iter()
        .rev()
        .map(|(name, _)| {
            let matched = feedback
                .iter()
                .find(|f| f.skill.eq_ignore_ascii_case(name))
                .map(|f| f.feedback.clone())
                .filter(|f| !f.trim().is_empty());
            Weakness {
                skill: name.to_string(),
                feedback: matched
                    .unwrap_or_else(|| format!("Performance in {} needs improvement", name)),
                improvement: format!(
                    "Focus on improving {} skills through practice and learning",
                    name
                ),
            }
        })
        .collect();

    (strengths, weaknesses)
}

/// Categories whose answers feed each reported skill.
fn skill_sources(skill: &str) -> &'static [QuestionCategory] {
    match skill {
        SkillBreakdown::TECHNICAL => &[QuestionCategory::Technical],
        SkillBreakdown::BEHAVIORAL => &[QuestionCategory::Behavioral],
        SkillBreakdown::CONCEPTUAL => &[QuestionCategory::Conceptual],
        SkillBreakdown::COMMUNICATION => &[QuestionCategory::Behavioral, QuestionCategory::Scenario],
        _ => &[],
    }
}

/// Feedback of the lowest-scoring answer behind each skill, where one exists.
pub fn feedback_by_skill(answers: &[AnswerRecord], skills: &SkillBreakdown) -> Vec<SkillFeedback> {
    skills
        .entries()
        .iter()
        .filter_map(|(skill, _)| {
            let sources = skill_sources(skill);
            answers
                .iter()
                .filter(|a| sources.contains(&a.category) && !a.feedback.trim().is_empty())
                .min_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal))
                .map(|a| SkillFeedback {
                    skill: skill.to_string(),
                    feedback: a.feedback.clone(),
                })
        })
        .collect()
}

fn category_mean(answers: &[AnswerRecord], category: QuestionCategory) -> f64 {
    let scores: Vec<f64> = answers
        .iter()
        .filter(|a| a.category == category)
        .map(|a| a.score)
        .collect();
    mean(&scores).unwrap_or(NEUTRAL_SKILL_SCORE)
}

/// Builds the final report for a finished session.
///
/// `question_count` counts every question asked, answered or not.
pub fn synthesize_report(
    answers: &[AnswerRecord],
    question_count: i32,
    total_duration_secs: i32,
) -> Result<SynthesizedReport> {
    if answers.is_empty() {
        return Err(Error::InsufficientData(
            "No answers to evaluate; a report needs at least one answered question".to_string(),
        ));
    }

    let technical = category_mean(answers, QuestionCategory::Technical);
    let conceptual = category_mean(answers, QuestionCategory::Conceptual);
    let behavioral = category_mean(answers, QuestionCategory::Behavioral);
    let scenario = category_mean(answers, QuestionCategory::Scenario);
    let efficiencies: Vec<f64> = answers.iter().map(|a| a.time_efficiency).collect();
    let time_management = mean(&efficiencies).unwrap_or(NEUTRAL_SKILL_SCORE);

    let skills = SkillBreakdown {
        technical: round_score(technical, 1),
        behavioral: round_score(behavioral, 1),
        conceptual: round_score(conceptual, 1),
        communication: round_score(behavioral * 0.5 + scenario * 0.5, 1),
        time_management: round_score(time_management, 1),
    };

    let overall_score = round_score(
        technical * 0.35
            + behavioral * 0.20
            + conceptual * 0.20
            + scenario * 0.15
            + time_management * 0.10,
        1,
    );

    let scores: Vec<f64> = answers.iter().map(|a| a.score).collect();
    let performance_trend = performance_trend(&scores);
    let (recommendation, recommendation_confidence) =
        recommendation(overall_score, performance_trend, &skills.values());

    let feedback = feedback_by_skill(answers, &skills);
    let (strengths, weaknesses) = strengths_and_weaknesses(&skills.entries(), &feedback);

    let question_count = question_count.max(answers.len() as i32);
    let average_time_per_question =
        (f64::from(total_duration_secs) / f64::from(question_count)).round() as i32;

    Ok(SynthesizedReport {
        overall_score,
        skills,
        performance_trend,
        strengths,
        weaknesses,
        recommendation,
        recommendation_confidence,
        question_count,
        average_time_per_question,
    })
}
