//! # motiva
//!
//! Motivational audio runtime: turns a user's declared intent (a goal, an
//! emotional tone, and situational context) into a cached, ready-to-play
//! spoken-audio artifact, by orchestrating two external generative services
//! behind a validating, retrying, cache-aware pipeline.
//!
//! ## Core Philosophy
//!
//! - **Explicit composition**: no globals; the manager, cache, and service
//!   clients are constructed and injected at an application composition root
//! - **Single-flight**: one generation in flight at a time, globally; a
//!   concurrent request is rejected immediately rather than queued
//! - **Cache-first**: semantically identical intents share one fingerprint
//!   and one artifact on disk
//! - **Bounded failure**: transient service errors are retried with
//!   exponential backoff; permanent ones surface immediately
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use motiva::cache::{AudioCache, AudioCacheConfig};
//! use motiva::intent::{Intent, MemoryIntentStore, Tone};
//! use motiva::manager::GenerationManager;
//! use motiva::orchestrator::GenerationOrchestrator;
//! use motiva::retry::RetryConfig;
//! use motiva::services::{HttpSpeechSynthesizer, HttpTextGenerator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> motiva::Result<()> {
//!     let text = Arc::new(HttpTextGenerator::builder().model("gpt-4o-mini").build()?);
//!     let speech = Arc::new(HttpSpeechSynthesizer::builder().model("tts-1").build()?);
//!     let cache = Arc::new(
//!         AudioCache::open(AudioCacheConfig::new("./audio-cache").with_max_size_mb(50)).await?,
//!     );
//!     let orchestrator = GenerationOrchestrator::new(text, speech, cache, RetryConfig::default());
//!     let manager = GenerationManager::new(Arc::new(MemoryIntentStore::new()), orchestrator);
//!
//!     let intent = Intent::new(
//!         "Complete a 45-minute morning workout",
//!         Tone::Energetic,
//!         chrono::Utc::now(),
//!     );
//!     let id = intent.id.clone();
//!     manager.submit(intent).await?;
//!     let content = manager.generate(&id).await?;
//!     println!("{} ({} words)", content.voice_id, content.metadata.word_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`intent`] | Intent data model, lifecycle states, persistence contract |
//! | [`manager`] | State machine, single-flight discipline, statistics |
//! | [`orchestrator`] | Cache-aware generation pipeline with status events |
//! | [`cache`] | Disk-backed audio cache with TTL/size-bounded eviction |
//! | [`retry`] | Bounded retries with exponential backoff |
//! | [`services`] | Text generator / speech synthesizer contracts + clients |
//! | [`validator`] | Length and appropriateness rules for generated scripts |

pub mod cache;
pub mod intent;
pub mod manager;
pub mod orchestrator;
pub mod retry;
pub mod services;
pub mod validator;

// Re-export main types for convenience
pub use cache::{AudioCache, AudioCacheConfig, CacheHealth, CacheStatistics, Fingerprint};
pub use intent::{GeneratedContent, Intent, IntentStatus, IntentStore, MemoryIntentStore, Tone};
pub use manager::{GenerationManager, GenerationStatistics};
pub use orchestrator::{GenerationOrchestrator, GenerationStatus};
pub use retry::{RetryConfig, RetryPolicy};
pub use services::{SpeechSynthesizer, TextGenerator};
pub use validator::ContentValidator;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, TransientKind};
