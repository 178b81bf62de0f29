use serde::{Deserialize, Serialize};

/// Best candidate for a query, scored in `[0, 100]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameMatch {
    pub name: String,
    pub score: u8,
}

/// Capability for matching a free-text query against known company names.
pub trait NameResolver: Send + Sync {
    /// Returns the best-scoring candidate, or `None` when there are no candidates.
    fn resolve(&self, query: &str, candidates: &[String]) -> Option<NameMatch>;
}

/// Length ratio from which substring matches are discounted
const PARTIAL_LENGTH_RATIO: f64 = 1.5;
const PARTIAL_SCALE: f64 = 0.9;
/// Length ratio above which substring matches are discounted harder
const DISTANT_LENGTH_RATIO: f64 = 8.0;
const DISTANT_PARTIAL_SCALE: f64 = 0.6;

/// Edit-distance based resolver built on `strsim`.
///
/// Scores a candidate as the best of a whole-string ratio, a token-sorted
/// ratio and a best-window substring ratio, so "infosys ltd" and
/// "ltd infosys" score alike and a prefix like "tata consultancy" still
/// finds "Tata Consultancy Services".
#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzyResolver;

impl FuzzyResolver {
    pub fn score(&self, query: &str, candidate: &str) -> u8 {
        let q = normalize(query);
        let c = normalize(candidate);
        if q.is_empty() || c.is_empty() {
            return 0;
        }

        let full = strsim::normalized_levenshtein(&q, &c);
        let token_sorted = strsim::normalized_levenshtein(&sort_tokens(&q), &sort_tokens(&c));

        let (shorter, longer) = if q.chars().count() <= c.chars().count() {
            (&q, &c)
        } else {
            (&c, &q)
        };
        let length_ratio = longer.chars().count() as f64 / shorter.chars().count() as f64;
        let partial_scale = if length_ratio > DISTANT_LENGTH_RATIO {
            DISTANT_PARTIAL_SCALE
        } else if length_ratio >= PARTIAL_LENGTH_RATIO {
            PARTIAL_SCALE
        } else {
            1.0
        };
        let partial = partial_ratio(shorter, longer) * partial_scale;

        let best = full.max(token_sorted).max(partial);
        (best * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

impl NameResolver for FuzzyResolver {
    fn resolve(&self, query: &str, candidates: &[String]) -> Option<NameMatch> {
        let mut best: Option<NameMatch> = None;
        for candidate in candidates {
            let score = self.score(query, candidate);
            // Earlier candidates win ties
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(NameMatch {
                    name: candidate.clone(),
                    score,
                });
            }
        }
        best
    }
}

fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|ch| if ch.is_alphanumeric() { ch } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Best ratio of `shorter` against every equally long window of `longer`
fn partial_ratio(shorter: &str, longer: &str) -> f64 {
    let window: Vec<char> = longer.chars().collect();
    let width = shorter.chars().count();
    if width == 0 || window.len() < width {
        return 0.0;
    }

    let mut best = 0.0_f64;
    for start in 0..=(window.len() - width) {
        let slice: String = window[start..start + width].iter().collect();
        let ratio = strsim::normalized_levenshtein(shorter, &slice);
        if ratio > best {
            best = ratio;
            if best >= 1.0 {
                break;
            }
        }
    }
    best
}
