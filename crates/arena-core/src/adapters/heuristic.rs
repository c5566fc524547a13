//! Deterministic fallback scorer.
//!
//! Up to 80 points for objective coverage (an objective counts as covered
//! when the answer mentions one of its key terms) and up to 20 for length,
//! one point per ten words.

use std::collections::HashSet;

use async_trait::async_trait;

use super::{ScoreCard, Scorer};
use crate::domain::Scenario;
use crate::error::ArenaResult;

const COVERAGE_POINTS: usize = 80;
const LENGTH_POINTS: usize = 20;
const WORDS_PER_LENGTH_POINT: usize = 10;
const MIN_TERM_LEN: usize = 5;

const STOP_WORDS: &[&str] = &[
    "about", "across", "after", "before", "being", "between", "could", "every", "their",
    "there", "these", "those", "under", "where", "which", "while", "within", "without",
    "would", "should", "must", "other",
];

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

fn key_terms(text: &str) -> HashSet<String> {
    words(text)
        .filter(|w| w.len() >= MIN_TERM_LEN && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    pub fn evaluate(scenario: &Scenario, answer: &str) -> ScoreCard {
        let answer_words: HashSet<String> = words(answer).collect();
        if answer_words.is_empty() {
            return ScoreCard::new(0, "Empty answer");
        }
        let word_count = words(answer).count();

        let total = scenario.objectives.len();
        let covered = scenario
            .objectives
            .iter()
            .filter(|objective| {
                key_terms(objective)
                    .iter()
                    .any(|term| answer_words.contains(term))
            })
            .count();

        let coverage = if total == 0 {
            COVERAGE_POINTS
        } else {
            covered * COVERAGE_POINTS / total
        };
        let length = (word_count / WORDS_PER_LENGTH_POINT).min(LENGTH_POINTS);

        ScoreCard::new(
            (coverage + length) as i64,
            format!("Addressed {covered} of {total} objectives in {word_count} words"),
        )
    }
}

#[async_trait]
impl Scorer for HeuristicScorer {
    async fn score(&self, scenario: &Scenario, answer: &str) -> ArenaResult<ScoreCard> {
        Ok(Self::evaluate(scenario, answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scenario::sample_scenario;

    #[test]
    fn empty_answer_scores_zero() {
        let card = HeuristicScorer::evaluate(&sample_scenario(), "   ");
        assert_eq!(card.score, 0);
    }

    #[test]
    fn coverage_drives_score() {
        let scenario = sample_scenario();
        let partial = HeuristicScorer::evaluate(&scenario, "I removed duplicated checks.");
        let full = HeuristicScorer::evaluate(
            &scenario,
            "I removed duplicated validation and added tests for refunds.",
        );
        assert_eq!(partial.score, 40);
        assert_eq!(full.score, 80);
        assert!(full.feedback.contains("2 of 2"));
    }

    #[test]
    fn deterministic_and_bounded() {
        let scenario = sample_scenario();
        let long = "duplicated refunds ".repeat(500);
        let a = HeuristicScorer::evaluate(&scenario, &long);
        let b = HeuristicScorer::evaluate(&scenario, &long);
        assert_eq!(a, b);
        assert_eq!(a.score, 100);
    }
}
