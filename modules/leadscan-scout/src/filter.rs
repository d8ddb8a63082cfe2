use std::fmt;

use leadscan_common::{Candidate, ScoringConfig};

/// Why a candidate was dropped before scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    IgnoredAuthor,
    NegativeKeyword(String),
    SellerSignals(usize),
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::IgnoredAuthor => write!(f, "ignored author"),
            Exclusion::NegativeKeyword(kw) => write!(f, "negative keyword '{kw}'"),
            Exclusion::SellerSignals(n) => write!(f, "{n} seller signals"),
        }
    }
}

/// Content exclusion applied ahead of the scorer: bot and deleted authors,
/// negative keywords, and posts that read like a seller's advert.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    ignored_authors: Vec<String>,
    negative_keywords: Vec<String>,
    seller_signals: Vec<String>,
    seller_signal_min_hits: usize,
}

impl CandidateFilter {
    pub fn from_config(config: &ScoringConfig) -> Self {
        let lower = |items: &[String]| -> Vec<String> {
            items
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        Self {
            ignored_authors: lower(&config.ignored_authors),
            negative_keywords: lower(&config.negative_keywords),
            seller_signals: lower(&config.seller_signals),
            seller_signal_min_hits: config.seller_signal_min_hits.max(1),
        }
    }

    /// `None` when the candidate should go on to scoring.
    pub fn check(&self, candidate: &Candidate) -> Option<Exclusion> {
        let author = candidate.author.to_lowercase();
        if self.ignored_authors.iter().any(|a| *a == author) {
            return Some(Exclusion::IgnoredAuthor);
        }

        let text = candidate.text.to_lowercase();
        if let Some(kw) = self.negative_keywords.iter().find(|kw| text.contains(kw.as_str())) {
            return Some(Exclusion::NegativeKeyword(kw.clone()));
        }

        let hits = self
            .seller_signals
            .iter()
            .filter(|signal| text.contains(signal.as_str()))
            .count();
        if hits >= self.seller_signal_min_hits {
            return Some(Exclusion::SellerSignals(hits));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use leadscan_common::{KeywordWeight, Source};

    use super::*;

    fn filter() -> CandidateFilter {
        let mut config = ScoringConfig::with_keywords(vec![KeywordWeight::new("buy gold", 8)]);
        config.negative_keywords = vec!["Gold Jewelry".to_string()];
        config.seller_signals = vec![
            "for sale".to_string(),
            "dm me".to_string(),
            "shipping included".to_string(),
        ];
        CandidateFilter::from_config(&config)
    }

    fn candidate(author: &str, text: &str) -> Candidate {
        Candidate {
            source: Source::Forum,
            source_ref: "t3_x".to_string(),
            origin_container: "Gold".to_string(),
            text: text.to_string(),
            author: author.to_string(),
            observed_at: Utc::now(),
            published_at: None,
            permalink: String::new(),
        }
    }

    #[test]
    fn ordinary_question_passes() {
        assert_eq!(filter().check(&candidate("stacker", "where do I buy gold?")), None);
    }

    #[test]
    fn bot_and_deleted_authors_are_excluded() {
        let f = filter();
        assert_eq!(
            f.check(&candidate("AutoModerator", "buy gold")),
            Some(Exclusion::IgnoredAuthor)
        );
        assert_eq!(
            f.check(&candidate("[deleted]", "buy gold")),
            Some(Exclusion::IgnoredAuthor)
        );
    }

    #[test]
    fn negative_keyword_excludes_case_insensitively() {
        assert_eq!(
            filter().check(&candidate("a", "Looking for GOLD JEWELRY gifts")),
            Some(Exclusion::NegativeKeyword("gold jewelry".to_string()))
        );
    }

    #[test]
    fn single_seller_signal_is_tolerated() {
        assert_eq!(filter().check(&candidate("a", "anyone selling? dm me")), None);
    }

    #[test]
    fn two_seller_signals_exclude() {
        assert_eq!(
            filter().check(&candidate("a", "1oz bars for sale, shipping included")),
            Some(Exclusion::SellerSignals(2))
        );
    }
}
