//! Word-frequency ranking of free-text case notes.

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use journey_core::models::RankedToken;
use journey_core::stopwords::StopwordSet;

/// Number of words kept for the treemap by default.
pub const DEFAULT_TOP_N: usize = 50;

// ── WordRanker ────────────────────────────────────────────────────────────────

/// Tokenises text, removes excluded and numeric tokens, and ranks the rest.
pub struct WordRanker {
    stopwords: StopwordSet,
    word_re: Regex,
    digit_re: Regex,
}

impl WordRanker {
    pub fn new(stopwords: StopwordSet) -> Self {
        Self {
            stopwords,
            word_re: Regex::new(r"\w+").expect("regex is valid"),
            digit_re: Regex::new(r"\d").expect("regex is valid"),
        }
    }

    /// Maximal runs of word characters (letters, digits, underscore).
    pub fn tokenize<'a>(&'a self, lowered: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.word_re.find_iter(lowered).map(|m| m.as_str())
    }

    /// Whether `token` survives filtering.
    pub fn keeps(&self, token: &str) -> bool {
        !self.stopwords.contains(token) && !self.digit_re.is_match(token)
    }

    /// Tokens of `text` that survive filtering, in text order.
    pub fn filtered_tokens(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.tokenize(&lowered)
            .filter(|t| self.keeps(t))
            .map(str::to_string)
            .collect()
    }

    /// Rank the surviving tokens of `text` by count, most frequent first.
    ///
    /// Ties keep the order in which the tokens first appeared. At most
    /// `top_n` entries are returned.
    pub fn rank_tokens(&self, text: &str, top_n: usize) -> Vec<RankedToken> {
        let tokens = self.filtered_tokens(text);
        let ranked = rank_counts(tokens.iter().map(String::as_str), top_n);
        debug!(
            "Ranked {} filtered tokens, kept top {}",
            tokens.len(),
            ranked.len()
        );
        ranked
    }
}

/// Count a token stream and rank it: count descending, then first occurrence.
pub fn rank_counts<'a>(tokens: impl IntoIterator<Item = &'a str>, top_n: usize) -> Vec<RankedToken> {
    // token -> (count, first position)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (pos, token) in tokens.into_iter().enumerate() {
        counts.entry(token).or_insert((0, pos)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(token, (count, first))| (token, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(top_n);

    ranked
        .into_iter()
        .map(|(token, count, _)| RankedToken {
            token: token.to_string(),
            count,
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
