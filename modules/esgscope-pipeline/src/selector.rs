//! Evidence selection — bound the weighted list to a fixed budget and
//! resolve each span's originating document.

use esgscope_common::EvidenceSpan;

use crate::extract::ExtractedDocuments;
use crate::weighter::WeightedSentence;

/// Generation-stage input size stays predictable regardless of corpus size.
pub const EVIDENCE_BUDGET: usize = 60;

pub const UNKNOWN_SOURCE: &str = "unknown";

/// Truncate to the top `budget` entries, preserving the global order, and
/// attribute each sentence to the first uploaded document whose text
/// contains it. Attribution is best-effort substring search; a miss records
/// `"unknown"` rather than failing.
pub fn select_evidence(
    weighted: &[WeightedSentence],
    documents: &ExtractedDocuments,
    budget: usize,
) -> Vec<EvidenceSpan> {
    weighted
        .iter()
        .take(budget)
        .map(|entry| EvidenceSpan {
            text: entry.text.clone(),
            weight: entry.weight,
            category: entry.category,
            source_file: documents
                .documents
                .iter()
                .find(|d| d.text.contains(&entry.text))
                .map(|d| d.filename.clone())
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use esgscope_common::Category;
    use crate::extract::ExtractedDocument;

    fn weighted(text: &str, weight: f64) -> WeightedSentence {
        WeightedSentence {
            category: Category::Environmental,
            text: text.to_string(),
            weight,
        }
    }

    fn docs(entries: &[(&str, &str)]) -> ExtractedDocuments {
        ExtractedDocuments {
            documents: entries
                .iter()
                .map(|(filename, text)| ExtractedDocument {
                    filename: filename.to_string(),
                    text: text.to_string(),
                })
                .collect(),
            ocr_used: false,
        }
    }

    #[test]
    fn truncates_to_budget_preserving_order() {
        let weighted: Vec<WeightedSentence> = (0..5)
            .map(|i| weighted(&format!("Sentence {i}."), 0.9 - i as f64 * 0.1))
            .collect();
        let selected = select_evidence(&weighted, &docs(&[]), 3);
        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0].text, "Sentence 0.");
        assert_eq!(selected[2].text, "Sentence 2.");
    }

    #[test]
    fn attributes_to_first_containing_document() {
        let documents = docs(&[
            ("first.txt", "Nothing relevant here."),
            ("second.txt", "Carbon fell. More text."),
            ("third.txt", "Carbon fell. Same sentence again."),
        ]);
        let selected = select_evidence(&[weighted("Carbon fell.", 0.6)], &documents, 60);
        assert_eq!(selected[0].source_file, "second.txt");
    }

    #[test]
    fn unresolvable_source_is_unknown() {
        let documents = docs(&[("only.txt", "Different content.")]);
        let selected = select_evidence(&[weighted("Carbon fell.", 0.6)], &documents, 60);
        assert_eq!(selected[0].source_file, UNKNOWN_SOURCE);
    }
}
