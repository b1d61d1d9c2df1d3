// src/matching/name.rs - Name normalization, similarity scoring and distinctive-term extraction
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Maximum heuristic boost added on top of the base sequence ratio.
pub const MAX_REASONING_BOOST: f64 = 0.25;
const SUBSTRING_BOOST: f64 = 0.15;
const STRONG_OVERLAP_BOOST: f64 = 0.10;
const PARTIAL_OVERLAP_BOOST: f64 = 0.05;
const STRONG_OVERLAP_THRESHOLD: f64 = 0.7;
const PARTIAL_OVERLAP_THRESHOLD: f64 = 0.5;
const ABBREVIATION_BOOST: f64 = 0.03;

/// Short form / long form pairs that count as the same word.
pub const ABBREVIATION_PAIRS: [(&str, &str); 4] = [
    ("mgmt", "management"),
    ("hosp", "hospitality"),
    ("rest", "restaurant"),
    ("grp", "group"),
];

/// Tokens that never make a deal name distinctive: directions, NYC boroughs and
/// neighborhoods, street types, the city itself and generic hospitality words.
pub const TERM_STOPWORDS: &[&str] = &[
    "north", "south", "east", "west", "northeast", "northwest", "southeast", "southwest",
    "upper", "lower", "midtown", "downtown", "uptown", "manhattan", "brooklyn", "queens",
    "bronx", "staten", "island", "soho", "noho", "nolita", "tribeca", "chelsea", "harlem",
    "village", "greenwich", "flatiron", "nomad", "gramercy", "williamsburg", "bushwick",
    "astoria", "dumbo", "fidi", "les", "ues", "uws", "hells", "kitchen", "heights",
    "street", "avenue", "ave", "road", "boulevard", "blvd", "place", "plaza", "square",
    "broadway", "lane", "drive", "new", "york", "nyc", "city", "the", "and", "restaurant",
    "restaurants", "group", "hospitality", "concepts", "llc", "inc", "corp", "bar", "grill",
    "cafe", "tavern", "eatery", "bistro", "location", "deal",
];
const MIN_TERM_TOKEN_LENGTH: usize = 3;

static NORMALIZATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    // Suffixes must go before punctuation so "corp." is caught with its period.
    let patterns = [
        r"\s+(llc|inc|corp|corporation|ltd|limited|co\.?)\b",
        r"\s+(restaurant|restaurants|rest\.?)\b",
        r"\s+(group|hospitality|concepts?)\b",
        r"^\s*the\s+",
        r"\s+&\s+",
        r"[^\w\s]|_",
    ];
    patterns
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Invalid regex pattern: '{}'. Error: {}", pattern, e);
                None
            }
        })
        .collect()
});

/// Canonical form of a restaurant or deal name used for every comparison.
pub fn normalize_name(name: &str) -> String {
    if name.trim().is_empty() {
        return String::new();
    }
    let mut normalized = name.to_lowercase();
    for re in NORMALIZATION_PATTERNS.iter() {
        normalized = re.replace_all(&normalized, " ").into_owned();
    }
    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Ratcliff/Obershelp "gestalt" ratio: 2·M / T over characters.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = find_longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }
    matched
}

/// Longest common block in a[alo..ahi] x b[blo..bhi]; ties go to the earliest
/// start in `a`, then the earliest start in `b`.
fn find_longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut best = (alo, blo, 0);
    let mut previous = vec![0usize; width + 1];
    for i in alo..ahi {
        let mut current = vec![0usize; width + 1];
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = previous[j - blo] + 1;
                current[j - blo + 1] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        previous = current;
    }
    best
}

fn word_overlap(norm_a: &str, norm_b: &str) -> f64 {
    let words_a: HashSet<&str> = norm_a.split_whitespace().collect();
    let words_b: HashSet<&str> = norm_b.split_whitespace().collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    intersection as f64 / union as f64
}

/// Bounded boost for containment, word overlap and known abbreviations.
/// Both inputs must already be normalized.
pub fn reasoning_boost(norm_a: &str, norm_b: &str) -> f64 {
    if norm_a.is_empty() || norm_b.is_empty() {
        return 0.0;
    }
    let mut boost = 0.0;

    if norm_a.contains(norm_b) || norm_b.contains(norm_a) {
        boost += SUBSTRING_BOOST;
    }

    let overlap = word_overlap(norm_a, norm_b);
    if overlap >= STRONG_OVERLAP_THRESHOLD {
        boost += STRONG_OVERLAP_BOOST;
    } else if overlap >= PARTIAL_OVERLAP_THRESHOLD {
        boost += PARTIAL_OVERLAP_BOOST;
    }

    for (short, long) in ABBREVIATION_PAIRS {
        if (norm_a.contains(short) && norm_b.contains(long))
            || (norm_b.contains(short) && norm_a.contains(long))
        {
            boost += ABBREVIATION_BOOST;
        }
    }

    boost.min(MAX_REASONING_BOOST)
}

/// Lexical confidence that two names denote the same restaurant, in [0, 1].
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let norm_a = normalize_name(a);
    let norm_b = normalize_name(b);
    if norm_a.is_empty() || norm_b.is_empty() {
        return 0.0;
    }
    let base = sequence_ratio(&norm_a, &norm_b);
    (base + reasoning_boost(&norm_a, &norm_b)).min(1.0)
}

/// Distinctive phrases of a deal name, longest first: every 3-word window,
/// then every 2-word window, then the single tokens.
pub fn extract_terms(name: &str) -> Vec<String> {
    let stopwords: HashSet<&str> = TERM_STOPWORDS.iter().copied().collect();
    let lowered = name.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|token| token.chars().count() >= MIN_TERM_TOKEN_LENGTH)
        .filter(|token| !stopwords.contains(token))
        .collect();

    let mut seen = HashSet::new();
    let mut terms = Vec::new();
    for width in (1..=3).rev() {
        for window in tokens.windows(width) {
            let term = window.join(" ");
            if seen.insert(term.clone()) {
                terms.push(term);
            }
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_suffixes_articles_and_punctuation() {
        assert_eq!(normalize_name("The Smith Restaurant Group, LLC"), "smith");
        assert_eq!(normalize_name("Joe's Pizza"), "joe s pizza");
        assert_eq!(normalize_name("Carbone Hospitality Corp."), "carbone");
        assert_eq!(normalize_name("Rosa Mexicano Rest."), "rosa mexicano");
        assert_eq!(normalize_name("Balthazar & Co"), "balthazar");
        assert_eq!(normalize_name("Ruby's   Bar  &  Grill"), "ruby s bar grill");
        assert_eq!(normalize_name("Fish_Market"), "fish market");
    }

    #[test]
    fn test_normalize_only_drops_leading_article() {
        assert_eq!(normalize_name("The Odeon"), "odeon");
        assert_eq!(normalize_name("Tavern on the Green"), "tavern on the green");
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
        assert_eq!(normalize_name("!!!"), "");
    }

    #[test]
    fn test_equivalent_names_normalize_identically() {
        let a = normalize_name("Tony's Place, LLC");
        let b = normalize_name("tony's place");
        assert_eq!(a, b);
        assert_eq!(sequence_ratio(&a, &b), 1.0);
        assert_eq!(name_similarity("Tony's Place, LLC", "tony's place"), 1.0);
    }

    #[test]
    fn test_sequence_ratio_matches_gestalt_definition() {
        assert_eq!(sequence_ratio("", ""), 1.0);
        assert_eq!(sequence_ratio("abc", ""), 0.0);
        assert_eq!(sequence_ratio("abcd", "bcde"), 0.75);
        // "joe s pizza" is fully contained: 2 * 11 / (16 + 11)
        let ratio = sequence_ratio("joe s pizza soho", "joe s pizza");
        assert!((ratio - 22.0 / 27.0).abs() < 1e-12);
        // Blocks are found left and right of the longest one.
        assert!((sequence_ratio("abxcd", "abycd") - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_reasoning_boost_components() {
        // containment + full overlap of words
        assert!((reasoning_boost("carbone", "carbone") - 0.25).abs() < 1e-12);
        // no containment, Jaccard 2/4
        assert!((reasoning_boost("blue ribbon sushi", "blue ribbon brasserie") - 0.05).abs() < 1e-12);
        // containment, Jaccard 2/3
        assert!((reasoning_boost("blue ribbon", "blue ribbon brasserie") - 0.20).abs() < 1e-12);
        // abbreviation only
        assert!((reasoning_boost("acme mgmt", "acme management") - 0.03).abs() < 1e-12);
        assert_eq!(reasoning_boost("", "anything"), 0.0);
    }

    #[test]
    fn test_name_similarity_substring_containment() {
        let score = name_similarity("Joe's Pizza Soho", "Joe's Pizza");
        assert_eq!(score, 1.0);
        let unrelated = name_similarity("Joe's Pizza Soho", "Le Bernardin");
        assert!(unrelated < 0.5);
        assert_eq!(name_similarity("", "Le Bernardin"), 0.0);
    }

    #[test]
    fn test_extract_terms_orders_longest_first_and_drops_stopwords() {
        let terms = extract_terms("Bella Notte Trattoria Soho");
        assert_eq!(
            terms,
            vec![
                "bella notte trattoria",
                "bella notte",
                "notte trattoria",
                "bella",
                "notte",
                "trattoria",
            ]
        );
    }

    #[test]
    fn test_extract_terms_filters_short_and_location_tokens() {
        let terms = extract_terms("NYC - Upper West Side, Joe's Pizza NY");
        assert_eq!(terms, vec!["side joe's pizza", "side joe's", "joe's pizza", "side", "joe's", "pizza"]);
        assert!(extract_terms("New York NYC").is_empty());
        assert!(extract_terms("").is_empty());
    }
}
