//! Cache key derivation.

use crate::intent::Intent;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Deterministic cache key for an intent's audio artifact.
///
/// Derived purely from the fields that affect the wording of the generated
/// script: the normalized goal text, the tone, and the weather / time-of-day
/// context. Day-of-week, calendar snippets and free-text notes vary per
/// occurrence without changing what gets spoken, so they stay out of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    hash: String,
}

impl Fingerprint {
    /// Compute the fingerprint for an intent.
    pub fn for_intent(intent: &Intent) -> Self {
        // BTreeMap keeps the canonical form ordered regardless of insertion.
        let mut parts: BTreeMap<&str, String> = BTreeMap::new();
        parts.insert("goal", normalize_goal(&intent.goal));
        parts.insert("tone", intent.tone.as_str().to_string());
        if let Some(weather) = &intent.context.weather {
            parts.insert("weather", weather.trim().to_lowercase());
        }
        if let Some(time_of_day) = &intent.context.time_of_day {
            parts.insert("time_of_day", time_of_day.trim().to_lowercase());
        }

        let canonical = serde_json::to_string(&parts).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        Self { hash }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self { hash: s.to_string() }
    }
}

impl From<String> for Fingerprint {
    fn from(s: String) -> Self {
        Self { hash: s }
    }
}

/// Lowercase, trim, and collapse runs of whitespace so that cosmetic
/// differences in the goal text do not fracture the cache.
fn normalize_goal(goal: &str) -> String {
    goal.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sanitize a cache key into a safe file name.
///
/// Strips path separators and characters reserved on common filesystems:
/// `/ \ : ? % * | " < >`.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '?' | '%' | '*' | '|' | '"' | '<' | '>'))
        .collect()
}
