use leadscan_common::{Candidate, KeywordMatch, KeywordWeight, ScoredCandidate};

/// Weighted keyword model for purchase intent.
///
/// A keyword contributes its weight once if it occurs anywhere in the
/// text, case-insensitively. Repeating a phrase never raises the score.
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    /// (lowercased needle, configured phrase, weight), in configuration order.
    keywords: Vec<(String, String, u32)>,
}

impl KeywordScorer {
    pub fn new(keywords: &[KeywordWeight]) -> Self {
        let keywords = keywords
            .iter()
            .map(|kw| (kw.phrase.to_lowercase(), kw.phrase.clone(), kw.weight))
            .collect();
        Self { keywords }
    }

    pub fn score(&self, text: &str) -> (u32, Vec<KeywordMatch>) {
        if text.is_empty() {
            return (0, Vec::new());
        }
        let haystack = text.to_lowercase();

        let matches: Vec<KeywordMatch> = self
            .keywords
            .iter()
            .filter(|(needle, _, _)| !needle.is_empty() && haystack.contains(needle.as_str()))
            .map(|(_, phrase, weight)| KeywordMatch::new(phrase.clone(), *weight))
            .collect();
        let total = matches.iter().map(|m| m.weight).sum();

        (total, matches)
    }

    pub fn score_candidate(&self, candidate: Candidate) -> ScoredCandidate {
        let (score, matches) = self.score(&candidate.text);
        ScoredCandidate {
            candidate,
            score,
            matches,
        }
    }
}

/// One-off scoring without building a scorer.
pub fn score(text: &str, keywords: &[KeywordWeight]) -> (u32, Vec<KeywordMatch>) {
    KeywordScorer::new(keywords).score(text)
}
