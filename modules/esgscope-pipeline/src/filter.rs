//! Keyword-based category assignment.
//!
//! Classification is non-exclusive: a sentence joins every category whose
//! keyword set matches, and disappears entirely when none do. This is a
//! heuristic relevance gate, not a trained classifier.

use esgscope_common::config::parse_keywords;
use esgscope_common::{Category, Config};

use crate::segmenter::split_sentences;

pub const DEFAULT_ENVIRONMENTAL: [&str; 10] = [
    "emission",
    "carbon",
    "climate",
    "energy",
    "renewable",
    "water",
    "waste",
    "biodiversity",
    "pollution",
    "recycling",
];

pub const DEFAULT_SOCIAL: [&str; 10] = [
    "diversity",
    "inclusion",
    "labor",
    "health",
    "safety",
    "community",
    "human rights",
    "training",
    "employee",
    "privacy",
];

pub const DEFAULT_GOVERNANCE: [&str; 10] = [
    "board",
    "governance",
    "ethics",
    "compliance",
    "risk",
    "audit",
    "shareholder",
    "transparency",
    "anti-corruption",
    "policy",
];

/// Per-category lowercase keyword substrings. Never empty: blank overrides
/// fall back to the compiled-in defaults.
#[derive(Debug, Clone)]
pub struct KeywordSets {
    environmental: Vec<String>,
    social: Vec<String>,
    governance: Vec<String>,
}

impl Default for KeywordSets {
    fn default() -> Self {
        Self {
            environmental: DEFAULT_ENVIRONMENTAL.iter().map(|k| k.to_string()).collect(),
            social: DEFAULT_SOCIAL.iter().map(|k| k.to_string()).collect(),
            governance: DEFAULT_GOVERNANCE.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl KeywordSets {
    pub fn from_config(config: &Config) -> Self {
        Self {
            environmental: parse_keywords(&config.keywords_environmental, &DEFAULT_ENVIRONMENTAL),
            social: parse_keywords(&config.keywords_social, &DEFAULT_SOCIAL),
            governance: parse_keywords(&config.keywords_governance, &DEFAULT_GOVERNANCE),
        }
    }

    pub fn for_category(&self, category: Category) -> &[String] {
        match category {
            Category::Environmental => &self.environmental,
            Category::Social => &self.social,
            Category::Governance => &self.governance,
        }
    }
}

/// Sentences assigned to each category, preserving document order within
/// each list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorizedSentences {
    pub environmental: Vec<String>,
    pub social: Vec<String>,
    pub governance: Vec<String>,
}

impl CategorizedSentences {
    /// Total assignments across categories (a sentence matched twice counts
    /// twice) — this is the "total ESG sentences" aggregation figure.
    pub fn total(&self) -> usize {
        self.environmental.len() + self.social.len() + self.governance.len()
    }

    pub fn for_category(&self, category: Category) -> &[String] {
        match category {
            Category::Environmental => &self.environmental,
            Category::Social => &self.social,
            Category::Governance => &self.governance,
        }
    }

    fn for_category_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Environmental => &mut self.environmental,
            Category::Social => &mut self.social,
            Category::Governance => &mut self.governance,
        }
    }

    /// Append another document's assignments, keeping upload order.
    pub fn extend(&mut self, other: CategorizedSentences) {
        self.environmental.extend(other.environmental);
        self.social.extend(other.social);
        self.governance.extend(other.governance);
    }

    /// Iterate categories in the fixed Environmental, Social, Governance
    /// order the downstream dedup depends on.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[String])> + '_ {
        Category::ALL
            .into_iter()
            .map(move |category| (category, self.for_category(category)))
    }
}

/// Segment one document's text and assign each sentence to every category
/// with at least one keyword substring match.
pub fn filter_sentences(text: &str, keywords: &KeywordSets) -> CategorizedSentences {
    let mut result = CategorizedSentences::default();
    for sentence in split_sentences(text) {
        let lowered = sentence.to_lowercase();
        for category in Category::ALL {
            if keywords
                .for_category(category)
                .iter()
                .any(|k| lowered.contains(k.as_str()))
            {
                result.for_category_mut(category).push(sentence.clone());
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_default_keywords_to_expected_categories() {
        let text = "We reduced carbon emissions by 12%. Employee safety improved.";
        let result = filter_sentences(text, &KeywordSets::default());
        assert!(result
            .environmental
            .iter()
            .any(|s| s.to_lowercase().contains("carbon")));
        assert!(result
            .social
            .iter()
            .any(|s| s.to_lowercase().contains("safety")));
        assert!(result.governance.is_empty());
    }

    #[test]
    fn assignment_is_not_exclusive() {
        let text = "Board oversight of climate risk improved.";
        let result = filter_sentences(text, &KeywordSets::default());
        // "climate" -> E, "board"/"risk" -> G
        assert_eq!(result.environmental.len(), 1);
        assert_eq!(result.governance.len(), 1);
        assert_eq!(result.environmental[0], result.governance[0]);
    }

    #[test]
    fn unmatched_sentences_are_dropped() {
        let result = filter_sentences("The weather was nice today.", &KeywordSets::default());
        assert_eq!(result.total(), 0);
    }

    #[test]
    fn empty_text_yields_empty_lists() {
        let result = filter_sentences("", &KeywordSets::default());
        assert_eq!(result, CategorizedSentences::default());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let result = filter_sentences("CARBON NEUTRAL BY 2030.", &KeywordSets::default());
        assert_eq!(result.environmental.len(), 1);
    }

    #[test]
    fn config_override_replaces_defaults() {
        let mut config = Config::from_env();
        config.keywords_environmental = "solar".to_string();
        let keywords = KeywordSets::from_config(&config);
        let matched = filter_sentences("Solar output doubled.", &keywords);
        assert_eq!(matched.environmental.len(), 1);
        let unmatched = filter_sentences("Carbon fell.", &keywords);
        assert!(unmatched.environmental.is_empty());
    }

    #[test]
    fn iter_order_is_environmental_social_governance() {
        let categories: Vec<Category> = CategorizedSentences::default()
            .iter()
            .map(|(c, _)| c)
            .collect();
        assert_eq!(
            categories,
            vec![
                Category::Environmental,
                Category::Social,
                Category::Governance
            ]
        );
    }
}
