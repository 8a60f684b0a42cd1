//! Generated content and its metadata.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Metadata describing one generation run.
///
/// The textual copy survives on the intent independent of cache lifetime, so
/// everything needed to describe the artifact lives here rather than on the
/// cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub word_count: usize,
    pub char_count: usize,
    /// Estimated spoken duration in seconds, at a 150 words-per-minute pace.
    pub estimated_duration_secs: f64,
    /// Wall-clock time of the full pipeline run, in milliseconds.
    pub generation_time_ms: u64,
    /// Identifier of the text generator that produced the script.
    pub text_service: String,
    /// Identifier of the speech synthesizer that produced the audio.
    pub speech_service: String,
    /// Attempts consumed by the text-generation call (1 = first try).
    pub text_attempts: u32,
    /// True when the artifact came from the audio cache instead of a fresh run.
    pub from_cache: bool,
}

/// The result of one successful generation: script, audio, and provenance.
///
/// Immutable once created. The audio bytes are also persisted in the audio
/// cache under `cache_path`; eviction removes the backing file but not this
/// in-memory copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub text: String,
    #[serde(skip, default)]
    pub audio: Bytes,
    /// Path of the cached audio file at generation time.
    pub cache_path: Option<String>,
    pub voice_id: String,
    pub metadata: ContentMetadata,
}

impl GeneratedContent {
    /// Words-per-minute pace used for duration estimates.
    pub const SPOKEN_WPM: f64 = 150.0;

    /// Derive word/char counts and a duration estimate from a script.
    pub fn measure(text: &str) -> (usize, usize, f64) {
        let word_count = text.split_whitespace().count();
        let char_count = text.chars().count();
        let estimated_duration_secs = word_count as f64 / Self::SPOKEN_WPM * 60.0;
        (word_count, char_count, estimated_duration_secs)
    }
}
