//! Turn a free-text model reply into attributes.
//!
//! Never fails: anything unrecoverable becomes [`ExtractedAttributes::fallback`].

use ai_client::{strip_code_blocks, truncate_chars};
use persona_common::ExtractedAttributes;
use tracing::{error, info, warn};

use crate::repair::repair_json;

const REPLY_LOG_CHARS: usize = 200;
const CANDIDATE_LOG_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    EmptyReply,
    /// Parser message for the repaired candidate.
    InvalidJson(String),
    NotAnObject,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::EmptyReply => f.write_str("empty reply"),
            FallbackReason::InvalidJson(msg) => write!(f, "invalid JSON: {msg}"),
            FallbackReason::NotAnObject => f.write_str("top-level value is not an object"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The candidate parsed as-is.
    Parsed,
    /// The candidate parsed after [`repair_json`].
    Repaired,
    Fallback(FallbackReason),
}

#[derive(Debug, Clone)]
pub struct Recovered {
    pub attributes: ExtractedAttributes,
    pub outcome: RecoveryOutcome,
}

impl Recovered {
    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, RecoveryOutcome::Fallback(_))
    }

    fn fallback(reason: FallbackReason) -> Self {
        Self {
            attributes: ExtractedAttributes::fallback(),
            outcome: RecoveryOutcome::Fallback(reason),
        }
    }
}

/// Fence-stripped text narrowed to its outermost `{ … }` span.
///
/// Greedy: first `{` to last `}`. Without such a span the whole stripped text
/// is the candidate.
pub fn candidate(raw: &str) -> String {
    let stripped = strip_code_blocks(raw);
    match (stripped.find('{'), stripped.rfind('}')) {
        (Some(start), Some(end)) if end > start => stripped[start..=end].to_string(),
        _ => stripped,
    }
}

pub fn recover(raw: &str) -> Recovered {
    info!(reply = %truncate_chars(raw.trim(), REPLY_LOG_CHARS), "Raw model response");

    if raw.trim().is_empty() {
        warn!("Model reply was empty, using default attributes");
        return Recovered::fallback(FallbackReason::EmptyReply);
    }

    let candidate = candidate(raw);

    // Well-formed input is parsed untouched; repair only runs when it has to.
    let (value, outcome) = match serde_json::from_str::<serde_json::Value>(&candidate) {
        Ok(value) => (value, RecoveryOutcome::Parsed),
        Err(_) => {
            let repaired = repair_json(&candidate);
            match serde_json::from_str::<serde_json::Value>(&repaired) {
                Ok(value) => (value, RecoveryOutcome::Repaired),
                Err(e) => {
                    error!(error = %e, "JSON decode error in model response");
                    error!(
                        candidate = %truncate_chars(&repaired, CANDIDATE_LOG_CHARS),
                        "Problematic JSON"
                    );
                    return Recovered::fallback(FallbackReason::InvalidJson(e.to_string()));
                }
            }
        }
    };

    let Some(object) = value.as_object() else {
        warn!("Model response parsed but is not a JSON object, using default attributes");
        return Recovered::fallback(FallbackReason::NotAnObject);
    };

    let attributes = ExtractedAttributes::from_json_object(object);
    info!(
        fields = attributes.len(),
        repaired = outcome == RecoveryOutcome::Repaired,
        "Parsed model response"
    );

    Recovered { attributes, outcome }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_common::{AttributeField, AttributeValue};
    use serde_json::json;

    fn full_object() -> serde_json::Value {
        json!({
            "name": "Weekend Tinkerer",
            "age_range": "25-35",
            "location": "Ohio",
            "occupation": "Software developer",
            "interests": ["Python", "Rust"],
            "personality_traits": ["Curious"],
            "communication_style": "Direct",
            "goals_motivations": ["Ship a side project"],
            "pain_points": ["Slow builds"],
            "technical_proficiency": "Advanced",
            "social_behavior": "Helpful in threads",
            "content_preferences": ["Tutorials"],
            "activity_patterns": "Evenings"
        })
    }

    #[test]
    fn candidate_strips_fences_and_prose() {
        let raw = "Here you go:\n```json\n{\"a\": {\"b\": 1}}\n```\nHope that helps!";
        assert_eq!(candidate(raw), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn candidate_without_braces_is_whole_text() {
        assert_eq!(candidate("  ```nothing here```  "), "nothing here");
    }

    #[test]
    fn fenced_json_in_prose_recovers_inner_object() {
        let raw = format!(
            "Sure! Here is the persona.\n```json\n{}\n```\nLet me know if you need more.",
            serde_json::to_string_pretty(&full_object()).unwrap()
        );
        let recovered = recover(&raw);

        assert_eq!(recovered.outcome, RecoveryOutcome::Parsed);
        assert_eq!(recovered.attributes.to_json(), full_object());
    }

    #[test]
    fn refusal_falls_back_to_default() {
        let recovered = recover("I cannot analyze this.");
        assert!(recovered.is_fallback());
        assert_eq!(recovered.attributes, ExtractedAttributes::fallback());
    }

    #[test]
    fn well_formed_response_round_trips_unchanged() {
        let raw = full_object().to_string();
        let recovered = recover(&raw);
        assert_eq!(recovered.outcome, RecoveryOutcome::Parsed);
        assert!(recovered.attributes.is_complete());
        assert_eq!(recovered.attributes.to_json(), full_object());
    }

    #[test]
    fn single_quoted_response_is_repaired() {
        let raw = "{'name': 'Night Owl', 'interests': ['chess', 'go'],}";
        let recovered = recover(raw);
        assert_eq!(recovered.outcome, RecoveryOutcome::Repaired);
        assert_eq!(
            recovered.attributes.get(AttributeField::Interests),
            Some(&AttributeValue::List(vec!["chess".into(), "go".into()]))
        );
    }

    #[test]
    fn quoted_text_inside_values_does_not_block_repair() {
        let raw = r#"{"communication_style": "Opens with: 'hi', then rambles", "interests": ["Rust",],}"#;
        let recovered = recover(raw);
        assert_eq!(recovered.outcome, RecoveryOutcome::Repaired);
        assert_eq!(
            recovered.attributes.get(AttributeField::CommunicationStyle),
            Some(&AttributeValue::Text("Opens with: 'hi', then rambles".into()))
        );
        assert_eq!(
            recovered.attributes.get(AttributeField::Interests),
            Some(&AttributeValue::List(vec!["Rust".into()]))
        );
    }

    #[test]
    fn partial_object_keeps_only_present_keys() {
        let recovered = recover(r#"{"location": "Berlin"}"#);
        assert_eq!(recovered.outcome, RecoveryOutcome::Parsed);
        assert_eq!(recovered.attributes.len(), 1);
        assert!(!recovered.attributes.contains(AttributeField::Name));
    }

    #[test]
    fn empty_and_non_object_replies_fall_back() {
        assert_eq!(
            recover("   ").outcome,
            RecoveryOutcome::Fallback(FallbackReason::EmptyReply)
        );
        // No braces, so the candidate is the whole text: a JSON array.
        assert_eq!(
            recover("[1, 2, 3]").outcome,
            RecoveryOutcome::Fallback(FallbackReason::NotAnObject)
        );
    }

    #[test]
    fn truncated_json_falls_back() {
        let recovered = recover(r#"{"name": "Cut off", "interests": ["a", "#);
        assert!(matches!(
            recovered.outcome,
            RecoveryOutcome::Fallback(FallbackReason::InvalidJson(_))
        ));
        assert_eq!(recovered.attributes, ExtractedAttributes::fallback());
    }
}
