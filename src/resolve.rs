//! Fuzzy resolution of free-text queries to canonical entities.
//!
//! Pure and stateless: the same query against the same candidate set always
//! yields the same result, which is what makes resolution testable.

use strsim::jaro_winkler;

/// Best scores below this are reported as not found instead of guessed.
pub const MIN_CONFIDENCE: f64 = 70.0;

/// Two scores closer than this are a tie and fall through to the
/// deterministic tie-breaks.
const SCORE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct Candidate {
    pub primary: String,
    pub aliases: Vec<String>,
}

impl Candidate {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            aliases: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Match(MatchResult),
    /// Nothing cleared the confidence threshold; carries how close the best
    /// candidate came, for error messages.
    NotFound { best_score: f64 },
}

pub fn resolve(query: &str, candidates: &[Candidate]) -> Resolution {
    match best_match(query, candidates) {
        Some(m) if m.score >= MIN_CONFIDENCE => Resolution::Match(m),
        Some(m) => Resolution::NotFound { best_score: m.score },
        None => Resolution::NotFound { best_score: 0.0 },
    }
}

/// Case- and punctuation-insensitive form used for all comparisons.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    out
}

fn best_match(query: &str, candidates: &[Candidate]) -> Option<MatchResult> {
    let query = normalize(query);
    if query.is_empty() {
        return None;
    }

    let mut best: Option<(f64, bool, &str)> = None;
    for candidate in candidates {
        let primary = normalize(&candidate.primary);
        let mut score = similarity(&query, &primary);
        for alias in &candidate.aliases {
            score = score.max(similarity(&query, &normalize(alias)));
        }
        let contains_query = primary.contains(&query);

        let better = match best {
            None => true,
            Some((best_score, best_contains, best_name)) => {
                if score > best_score + SCORE_EPSILON {
                    true
                } else if score < best_score - SCORE_EPSILON {
                    false
                } else if contains_query != best_contains {
                    // Tie: prefer the candidate the query is a literal part of.
                    contains_query
                } else {
                    candidate.primary.as_str() < best_name
                }
            }
        };
        if better {
            best = Some((score, contains_query, candidate.primary.as_str()));
        }
    }

    best.map(|(score, _, name)| MatchResult {
        name: name.to_string(),
        score,
    })
}

/// 0-100 similarity between two normalized strings. Exact equality
/// short-circuits at 100 before any fuzzy work.
fn similarity(query: &str, candidate: &str) -> f64 {
    if query == candidate {
        return 100.0;
    }
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    let fuzzy = jaro_winkler(query, candidate) * 100.0;
    fuzzy.max(token_score(query, candidate))
}

/// Containment scoring so a single-token query like "jordan" lands on
/// "michael jordan" even when edit distance alone would miss it.
fn token_score(query: &str, candidate: &str) -> f64 {
    let candidate_tokens: Vec<&str> = candidate.split(' ').collect();
    let mut total = 0usize;
    let mut full = 0usize;
    let mut prefix = 0usize;
    for token in query.split(' ') {
        total += 1;
        if candidate_tokens.iter().any(|c| *c == token) {
            full += 1;
        } else if token.len() >= 3 && candidate_tokens.iter().any(|c| c.starts_with(token)) {
            prefix += 1;
        }
    }
    if total == 0 || full + prefix < total {
        return 0.0;
    }
    if prefix == 0 { 90.0 } else { 80.0 }
}
