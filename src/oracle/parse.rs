// src/oracle/parse.rs - Turning free-form model output into a Judgment
use anyhow::{anyhow, Result};
use log::debug;
use serde::Deserialize;

use crate::oracle::{ConfidenceTier, Decision, Judgment};

const ACCEPT_WORDS: [&str; 3] = ["ACCEPT", "YES", "SAME"];
const REJECT_WORDS: [&str; 3] = ["REJECT", "NO", "DIFFERENT"];
const HEDGE_WORD: &str = "MAYBE";

#[derive(Debug, Deserialize)]
struct RawVerdict {
    verdict: String,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default, alias = "rationale")]
    reason: Option<String>,
}

impl RawVerdict {
    fn into_judgment(self) -> Result<Judgment> {
        let (decision, hedged) = decision_from_word(&self.verdict)
            .ok_or_else(|| anyhow!("Unrecognised verdict '{}'", self.verdict))?;
        let tier = self
            .confidence
            .as_deref()
            .and_then(tier_from_word)
            .or(if hedged { Some(ConfidenceTier::Low) } else { None });
        Ok(Judgment {
            decision,
            tier,
            rationale: self.reason.unwrap_or_default(),
        })
    }
}

/// Parses an oracle reply, trying progressively looser strategies.
///
/// 1. the whole reply as a JSON verdict object
/// 2. the first balanced `{...}` block inside the reply
/// 3. the first verdict keyword in the reply
///
/// If none of them yields a decision the reply is an error.
pub fn parse_judgment(response: &str) -> Result<Judgment> {
    let response = response.trim();

    match serde_json::from_str::<RawVerdict>(response) {
        Ok(raw) => return raw.into_judgment(),
        Err(e) => debug!("Direct JSON parsing failed: {}", e),
    }

    if let Some(json_str) = extract_json_from_text(response) {
        match serde_json::from_str::<RawVerdict>(&json_str) {
            Ok(raw) => return raw.into_judgment(),
            Err(e) => debug!("Embedded JSON parsing failed: {}", e),
        }
    }

    parse_keywords(response)
}

/// First balanced JSON object in `text`, tolerating code fences around it.
fn extract_json_from_text(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Reads the first decision word in a free-text reply.
///
/// A bare YES/ACCEPT/SAME carries no tier of its own but is read as Medium, so
/// an unhedged accept still outranks a MAYBE (Low). An Accept with no tier only
/// arises from a JSON verdict that omits its confidence.
fn parse_keywords(text: &str) -> Result<Judgment> {
    let upper = text.to_uppercase();
    let word = upper
        .split(|c: char| !c.is_alphanumeric())
        .find_map(decision_from_word);

    match word {
        Some((decision, hedged)) => {
            let tier = if hedged {
                Some(ConfidenceTier::Low)
            } else if decision == Decision::Accept {
                Some(ConfidenceTier::Medium)
            } else {
                None
            };
            Ok(Judgment {
                decision,
                tier,
                rationale: String::new(),
            })
        }
        None => Err(anyhow!(
            "No verdict found in oracle response: '{}'",
            truncate(text, 80)
        )),
    }
}

/// Returns the decision and whether it was a hedge.
fn decision_from_word(word: &str) -> Option<(Decision, bool)> {
    let word = word.trim().to_uppercase();
    if word == HEDGE_WORD {
        Some((Decision::Accept, true))
    } else if ACCEPT_WORDS.contains(&word.as_str()) {
        Some((Decision::Accept, false))
    } else if REJECT_WORDS.contains(&word.as_str()) {
        Some((Decision::Reject, false))
    } else {
        None
    }
}

fn tier_from_word(word: &str) -> Option<ConfidenceTier> {
    match word.trim().to_uppercase().as_str() {
        "HIGH" => Some(ConfidenceTier::High),
        "MEDIUM" | "MED" => Some(ConfidenceTier::Medium),
        "LOW" => Some(ConfidenceTier::Low),
        _ => None,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
