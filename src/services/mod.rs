//! External generative service contracts.
//!
//! The core orchestrates two collaborators it does not own: a text generator
//! and a speech synthesizer. Each is a narrow trait so test doubles can
//! implement it directly; [`HttpTextGenerator`] and [`HttpSpeechSynthesizer`]
//! are the reqwest-backed reference clients.
//!
//! Both services share the same transient-failure contract: timeouts, rate
//! limits, 5xx responses and network failures are typed transient errors
//! (retried by the caller's policy); an unparseable success response is the
//! caller's problem and surfaces as a permanent
//! [`MalformedResponse`](crate::Error::MalformedResponse).

mod http;

pub use http::{
    HttpSpeechSynthesizer, HttpSpeechSynthesizerBuilder, HttpTextGenerator,
    HttpTextGeneratorBuilder,
};

use crate::intent::Tone;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Situational inputs passed alongside the goal to the text generator.
pub type ContextMap = serde_json::Map<String, serde_json::Value>;

/// Generates a motivational script for a goal in a given tone.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, goal: &str, tone: Tone, context: &ContextMap) -> Result<String>;

    /// Stable identifier recorded in generation metadata.
    fn name(&self) -> &str;
}

/// Synthesizes a script into spoken audio with a given voice.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes>;

    /// Stable identifier recorded in generation metadata.
    fn name(&self) -> &str;
}
