//! Generation orchestrator.
//!
//! Drives one intent through the full pipeline: fingerprint → cache probe →
//! text generation (retried) → validation → speech synthesis (retried) →
//! cache write. Progress is published on a broadcast channel as an ordered
//! status sequence; `Completed` or `Failed` is always the terminal event of a
//! run.

use crate::cache::{AudioCache, EntryMetadata, Fingerprint};
use crate::intent::{ContentMetadata, GeneratedContent, Intent, Tone};
use crate::retry::{RetryConfig, RetryPolicy};
use crate::services::{ContextMap, SpeechSynthesizer, TextGenerator};
use crate::validator::ContentValidator;
use crate::{Error, Result};
use bytes::Bytes;
use chrono::Local;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Progress of one orchestrator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    Idle,
    GeneratingText,
    ConvertingToSpeech,
    Caching,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Synthesis voice for a tone. One voice per tone, fixed.
pub fn voice_for_tone(tone: Tone) -> &'static str {
    match tone {
        Tone::Gentle => "gentle",
        Tone::Energetic => "energetic",
        Tone::ToughLove => "tough_love",
        Tone::Storyteller => "storyteller",
    }
}

/// Coarse motivation level implied by a tone, passed to the text generator.
fn motivation_level(tone: Tone) -> &'static str {
    match tone {
        Tone::Gentle => "calm",
        Tone::Energetic => "high",
        Tone::ToughLove => "intense",
        Tone::Storyteller => "steady",
    }
}

/// Category label derived from goal keywords.
fn goal_category(goal: &str) -> &'static str {
    let goal = goal.to_lowercase();
    const FITNESS: &[&str] = &["workout", "run", "gym", "exercise", "walk", "yoga", "stretch"];
    const LEARNING: &[&str] = &["study", "learn", "read", "practice", "course"];
    const PRODUCTIVITY: &[&str] = &["work", "project", "meeting", "report", "email", "deadline"];
    const WELLNESS: &[&str] = &["sleep", "meditat", "breath", "journal", "hydrate"];

    let contains_any = |terms: &[&str]| terms.iter().any(|t| goal.contains(t));
    if contains_any(FITNESS) {
        "fitness"
    } else if contains_any(LEARNING) {
        "learning"
    } else if contains_any(PRODUCTIVITY) {
        "productivity"
    } else if contains_any(WELLNESS) {
        "wellness"
    } else {
        "general"
    }
}

/// Orchestrates cache-aware generation of one audio artifact per run.
pub struct GenerationOrchestrator {
    text: Arc<dyn TextGenerator>,
    speech: Arc<dyn SpeechSynthesizer>,
    cache: Arc<AudioCache>,
    validator: ContentValidator,
    retry: RetryPolicy,
    status_tx: broadcast::Sender<GenerationStatus>,
}

impl GenerationOrchestrator {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        speech: Arc<dyn SpeechSynthesizer>,
        cache: Arc<AudioCache>,
        retry_config: RetryConfig,
    ) -> Self {
        let (status_tx, _) = broadcast::channel(16);
        Self {
            text,
            speech,
            cache,
            validator: ContentValidator::new(),
            retry: RetryPolicy::new(retry_config),
            status_tx,
        }
    }

    /// Subscribe to the ordered status sequence of subsequent runs.
    pub fn subscribe_status(&self) -> broadcast::Receiver<GenerationStatus> {
        self.status_tx.subscribe()
    }

    pub fn cache(&self) -> &Arc<AudioCache> {
        &self.cache
    }

    fn emit(&self, status: GenerationStatus) {
        // A send without receivers is fine; status observation is optional.
        let _ = self.status_tx.send(status);
    }

    /// Run the full pipeline for `intent`.
    ///
    /// The intent itself is not mutated here; lifecycle transitions belong to
    /// the manager that owns it.
    pub async fn run(&self, intent: &Intent) -> Result<GeneratedContent> {
        self.emit(GenerationStatus::Idle);
        match self.run_inner(intent).await {
            Ok(content) => {
                self.emit(GenerationStatus::Completed);
                Ok(content)
            }
            Err(err) => {
                self.emit(GenerationStatus::Failed);
                Err(err)
            }
        }
    }

    async fn run_inner(&self, intent: &Intent) -> Result<GeneratedContent> {
        let started = Instant::now();
        let fingerprint = Fingerprint::for_intent(intent);
        let voice_id = voice_for_tone(intent.tone);

        if let Some(lookup) = self.cache.fetch(fingerprint.as_str()).await {
            if lookup.fresh {
                debug!(intent_id = %intent.id, key = %fingerprint, "cache hit");
                return self.content_from_cache(intent, &lookup.entry, started).await;
            }
            debug!(intent_id = %intent.id, key = %fingerprint, "cache entry stale, regenerating");
        }

        self.emit(GenerationStatus::GeneratingText);
        let context = build_context_map(intent);
        let goal = intent.goal.clone();
        let tone = intent.tone;
        let text_outcome = self
            .retry
            .run("text_generation", || {
                let context = context.clone();
                let goal = goal.clone();
                let text = Arc::clone(&self.text);
                async move { text.generate(&goal, tone, &context).await }
            })
            .await?;
        let script = text_outcome.value;

        let report = self.validator.validate(&script);
        if !report.is_valid() {
            return Err(Error::ContentValidationFailed {
                issues: report.into_issues(),
            });
        }

        self.emit(GenerationStatus::ConvertingToSpeech);
        let speech_outcome = self
            .retry
            .run("speech_synthesis", || {
                let script = script.clone();
                let speech = Arc::clone(&self.speech);
                async move { speech.synthesize(&script, voice_id).await }
            })
            .await?;
        let audio: Bytes = speech_outcome.value;

        self.emit(GenerationStatus::Caching);
        let (word_count, char_count, estimated_duration_secs) = GeneratedContent::measure(&script);
        let cache_path = self
            .cache
            .store(
                &audio,
                fingerprint.as_str(),
                EntryMetadata {
                    intent_id: intent.id.clone(),
                    voice_id: voice_id.to_string(),
                    duration_secs: estimated_duration_secs,
                },
            )
            .await?;

        let generation_time_ms = started.elapsed().as_millis() as u64;
        info!(
            intent_id = %intent.id,
            words = word_count,
            attempts = text_outcome.attempts,
            elapsed_ms = generation_time_ms,
            "generated audio artifact"
        );
        Ok(GeneratedContent {
            text: script,
            audio,
            cache_path: Some(cache_path.display().to_string()),
            voice_id: voice_id.to_string(),
            metadata: ContentMetadata {
                word_count,
                char_count,
                estimated_duration_secs,
                generation_time_ms,
                text_service: self.text.name().to_string(),
                speech_service: self.speech.name().to_string(),
                text_attempts: text_outcome.attempts,
                from_cache: false,
            },
        })
    }

    /// Rebuild a result from a fresh cache entry, skipping generation.
    ///
    /// The script text is not part of the cache entry; it is recovered from
    /// the intent's own surviving copy when one exists.
    async fn content_from_cache(
        &self,
        intent: &Intent,
        entry: &crate::cache::CacheEntry,
        started: Instant,
    ) -> Result<GeneratedContent> {
        let audio = tokio::fs::read(&entry.path)
            .await
            .map(Bytes::from)
            .map_err(|e| {
                Error::CachingFailed(format!(
                    "cached audio missing at {}: {e}",
                    entry.path.display()
                ))
            })?;
        let text = intent
            .generated_content
            .as_ref()
            .map(|c| c.text.clone())
            .unwrap_or_default();
        let (word_count, char_count, _) = GeneratedContent::measure(&text);
        Ok(GeneratedContent {
            text,
            audio,
            cache_path: Some(entry.path.display().to_string()),
            voice_id: entry.metadata.voice_id.clone(),
            metadata: ContentMetadata {
                word_count,
                char_count,
                estimated_duration_secs: entry.metadata.duration_secs,
                generation_time_ms: started.elapsed().as_millis() as u64,
                text_service: self.text.name().to_string(),
                speech_service: self.speech.name().to_string(),
                text_attempts: 0,
                from_cache: true,
            },
        })
    }
}

/// Situational inputs forwarded to the text generator.
fn build_context_map(intent: &Intent) -> ContextMap {
    let now = Local::now();
    let mut map = ContextMap::new();
    map.insert(
        "current_time".into(),
        now.format("%H:%M").to_string().into(),
    );
    map.insert(
        "day_of_week".into(),
        now.format("%A").to_string().into(),
    );
    map.insert(
        "motivation_level".into(),
        motivation_level(intent.tone).into(),
    );
    map.insert("category".into(), goal_category(&intent.goal).into());
    if let Some(weather) = &intent.context.weather {
        map.insert("weather".into(), weather.clone().into());
    }
    if let Some(time_of_day) = &intent.context.time_of_day {
        map.insert("time_of_day".into(), time_of_day.clone().into());
    }
    if let Some(note) = &intent.context.note {
        map.insert("note".into(), note.clone().into());
    }
    if !intent.context.calendar.is_empty() {
        map.insert(
            "calendar".into(),
            serde_json::Value::Array(
                intent
                    .context
                    .calendar
                    .iter()
                    .map(|c| c.clone().into())
                    .collect(),
            ),
        );
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_voice_per_tone() {
        assert_eq!(voice_for_tone(Tone::Energetic), "energetic");
        assert_eq!(voice_for_tone(Tone::Gentle), "gentle");
        assert_eq!(voice_for_tone(Tone::ToughLove), "tough_love");
        assert_eq!(voice_for_tone(Tone::Storyteller), "storyteller");
    }

    #[test]
    fn goal_categories() {
        assert_eq!(goal_category("Complete a 45-minute morning workout"), "fitness");
        assert_eq!(goal_category("Study for the chemistry exam"), "learning");
        assert_eq!(goal_category("Finish the quarterly report"), "productivity");
        assert_eq!(goal_category("Meditate before breakfast"), "wellness");
        assert_eq!(goal_category("Call mom"), "general");
    }

    #[test]
    fn context_map_carries_required_keys() {
        let intent = Intent::new(
            "Complete a 45-minute morning workout",
            Tone::Energetic,
            chrono::Utc::now(),
        );
        let map = build_context_map(&intent);
        assert!(map.contains_key("current_time"));
        assert!(map.contains_key("day_of_week"));
        assert_eq!(map["motivation_level"], "high");
        assert_eq!(map["category"], "fitness");
    }

    #[test]
    fn terminal_statuses() {
        assert!(GenerationStatus::Completed.is_terminal());
        assert!(GenerationStatus::Failed.is_terminal());
        assert!(!GenerationStatus::Caching.is_terminal());
    }
}
