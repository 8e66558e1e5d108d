//! AWFA weighting — normalization-key dedup and heuristic relevance scoring.
//!
//! Pure computation over in-memory data: same categorized input, same
//! ordered output, every time. Scores follow a documented formula and are
//! not cross-validated against ground truth.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use esgscope_common::Category;

use crate::filter::CategorizedSentences;

static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

const BASE_WEIGHT: f64 = 0.4;
const LENGTH_BONUS_CAP: f64 = 0.6;
const LENGTH_DIVISOR: f64 = 200.0;
const KEYWORD_BONUS: f64 = 0.1;

// Salience-boost keywords, intentionally smaller than the filter's
// assignment sets. Each distinct hit adds KEYWORD_BONUS.
const BONUS_ENVIRONMENTAL: [&str; 6] = ["emission", "carbon", "climate", "energy", "water", "waste"];
const BONUS_SOCIAL: [&str; 6] = ["diversity", "inclusion", "safety", "labor", "community", "privacy"];
const BONUS_GOVERNANCE: [&str; 6] = ["governance", "board", "ethics", "compliance", "audit", "risk"];

/// A deduplicated sentence with its relevance weight, pre-truncation.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSentence {
    pub category: Category,
    pub text: String,
    pub weight: f64,
}

/// Dedup key: lowercase, strip everything outside `[a-z0-9\s]`, collapse
/// whitespace, trim. Two sentences with the same key are duplicates.
pub fn normalization_key(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_ALNUM_RE.replace_all(&lowered, "");
    WHITESPACE_RE.replace_all(&stripped, " ").trim().to_string()
}

fn bonus_keywords(category: Category) -> &'static [&'static str] {
    match category {
        Category::Environmental => &BONUS_ENVIRONMENTAL,
        Category::Social => &BONUS_SOCIAL,
        Category::Governance => &BONUS_GOVERNANCE,
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// weight = min(1.0, base + length bonus + keyword bonus), 3 decimals.
fn weigh(sentence: &str, category: Category) -> f64 {
    let length_bonus = (sentence.chars().count() as f64 / LENGTH_DIVISOR).min(LENGTH_BONUS_CAP);
    let lowered = sentence.to_lowercase();
    let hits = bonus_keywords(category)
        .iter()
        .filter(|k| lowered.contains(**k))
        .count();
    round3((BASE_WEIGHT + length_bonus + KEYWORD_BONUS * hits as f64).min(1.0))
}

/// Weight, dedup, and globally order categorized sentences.
///
/// Dedup is global and first-wins: categories are visited in E, S, G order
/// and sentences in input order, so a sentence keyword-matched under two
/// categories is credited as evidence exactly once, under the earlier
/// category. Sentences whose normalization key is empty are skipped.
pub fn apply_weighting(categorized: &CategorizedSentences) -> Vec<WeightedSentence> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut weighted = Vec::new();
    for (category, sentences) in categorized.iter() {
        for sentence in sentences {
            let key = normalization_key(sentence);
            if key.is_empty() || !seen.insert(key) {
                continue;
            }
            weighted.push(WeightedSentence {
                category,
                text: sentence.clone(),
                weight: weigh(sentence, category),
            });
        }
    }
    weighted.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.text.cmp(&b.text))
    });
    weighted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categorized(env: &[&str], soc: &[&str], gov: &[&str]) -> CategorizedSentences {
        CategorizedSentences {
            environmental: env.iter().map(|s| s.to_string()).collect(),
            social: soc.iter().map(|s| s.to_string()).collect(),
            governance: gov.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn exact_duplicates_collapse_to_one_entry() {
        let input = categorized(&["Carbon emissions fell.", "Carbon emissions fell."], &[], &[]);
        let weighted = apply_weighting(&input);
        assert_eq!(weighted.len(), 1);
        assert_eq!(weighted[0].text, "Carbon emissions fell.");
        assert_eq!(weighted[0].category, Category::Environmental);
    }

    #[test]
    fn dedup_is_global_across_categories_first_category_wins() {
        let input = categorized(
            &["Safety and carbon matter!"],
            &["Safety, and carbon... matter"],
            &[],
        );
        let weighted = apply_weighting(&input);
        // Same normalization key -> the Environmental occurrence is kept.
        assert_eq!(weighted.len(), 1);
        assert_eq!(weighted[0].category, Category::Environmental);
    }

    #[test]
    fn normalization_strips_punctuation_and_case() {
        assert_eq!(
            normalization_key("  Carbon, emissions FELL (12%)!  "),
            "carbon emissions fell 12"
        );
        assert_eq!(normalization_key("?!…"), "");
    }

    #[test]
    fn punctuation_only_sentences_are_skipped() {
        let input = categorized(&["?!"], &[], &[]);
        assert!(apply_weighting(&input).is_empty());
    }

    #[test]
    fn weight_formula_matches_documented_constants() {
        // 22 chars, one bonus keyword ("carbon"):
        // 0.4 + 22/200 + 0.1 = 0.61
        let input = categorized(&["Carbon emissions fell."], &[], &[]);
        let weighted = apply_weighting(&input);
        assert_eq!(weighted[0].weight, 0.61);
    }

    #[test]
    fn weight_counts_distinct_bonus_keywords_once_each() {
        // "energy energy water" repeats a keyword; only distinct hits count.
        let sentence = "Energy and energy and water use.";
        let input = categorized(&[sentence], &[], &[]);
        let weighted = apply_weighting(&input);
        // 32 chars: 0.4 + 0.16 + 2 * 0.1 = 0.76
        assert_eq!(weighted[0].weight, 0.76);
    }

    #[test]
    fn weight_is_capped_at_one_and_rounded_to_three_decimals() {
        let long = format!(
            "{} emission carbon climate energy water waste",
            "x".repeat(200)
        );
        let input = categorized(&[long.as_str()], &[], &[]);
        let weighted = apply_weighting(&input);
        assert_eq!(weighted[0].weight, 1.0);

        for sentence in ["Water.", "Carbon counts here.", "No keywords at all?"] {
            let weighted = apply_weighting(&categorized(&[sentence], &[], &[]));
            let w = weighted[0].weight;
            assert!((0.0..=1.0).contains(&w));
            assert_eq!(w, round3(w));
        }
    }

    #[test]
    fn output_is_sorted_by_weight_then_text() {
        let input = categorized(
            &[
                "Waste fell.",
                "A long account of carbon capture investments across operations.",
                "Water fell.",
            ],
            &[],
            &[],
        );
        let weighted = apply_weighting(&input);
        for pair in weighted.windows(2) {
            assert!(
                pair[0].weight > pair[1].weight
                    || (pair[0].weight == pair[1].weight && pair[0].text <= pair[1].text)
            );
        }
        // "Waste fell." and "Water fell." tie on weight; lexicographic order
        // breaks the tie deterministically.
        let tied: Vec<&str> = weighted
            .iter()
            .filter(|w| w.text.ends_with("fell."))
            .map(|w| w.text.as_str())
            .collect();
        assert_eq!(tied, vec!["Waste fell.", "Water fell."]);
    }

    #[test]
    fn weighting_is_idempotent() {
        let input = categorized(
            &["Carbon emissions fell.", "Water use dropped by half."],
            &["Employee safety improved."],
            &["The board met twice."],
        );
        assert_eq!(apply_weighting(&input), apply_weighting(&input));
    }

    #[test]
    fn empty_input_yields_empty_evidence() {
        assert!(apply_weighting(&CategorizedSentences::default()).is_empty());
    }
}
