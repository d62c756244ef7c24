//! Keyword extraction for similar-job resolution.
//!
//! Frequency-based stopword filtering is inherently fuzzy, so the strategy
//! sits behind a one-method trait and can be swapped without touching the
//! ranking engine or the repositories.

/// Pluggable keyword extraction strategy.
pub trait KeywordExtractor: Send + Sync {
    /// Extract up to `max` keywords from `text`, most important first.
    fn extract(&self, text: &str, max: usize) -> Vec<String>;
}

/// Words carrying no search signal in job postings.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "can", "for", "from", "has", "have", "in", "is",
    "it", "its", "of", "on", "or", "our", "that", "the", "their", "them", "they", "this", "to", "was", "we", "were",
    "will", "with", "you", "your", "who", "what", "when", "where", "how", "all", "any", "both", "each", "more",
    "most", "other", "some", "such", "than", "too", "very", "job", "role", "work", "team", "join", "looking",
    "candidate", "experience", "years", "ability", "skills", "strong", "including", "etc", "plus", "must",
];

/// Default extractor: lowercase alphanumeric word split, stopwords removed,
/// ranked by frequency with first-occurrence order breaking ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyExtractor;

impl KeywordExtractor for FrequencyExtractor {
    fn extract(&self, text: &str, max: usize) -> Vec<String> {
        if max == 0 {
            return Vec::new();
        }

        // (count, first position) per word, insertion-ordered by first use.
        let mut order: Vec<String> = Vec::new();
        let mut stats: std::collections::HashMap<String, (usize, usize)> = std::collections::HashMap::new();

        for word in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
            if word.len() < 3 || STOPWORDS.contains(&word) {
                continue;
            }
            match stats.get_mut(word) {
                Some((count, _)) => *count += 1,
                None => {
                    stats.insert(word.to_string(), (1, order.len()));
                    order.push(word.to_string());
                }
            }
        }

        order.sort_by(|a, b| {
            let (count_a, seen_a) = stats[a];
            let (count_b, seen_b) = stats[b];
            count_b.cmp(&count_a).then(seen_a.cmp(&seen_b))
        });
        order.truncate(max);
        order
    }
}
