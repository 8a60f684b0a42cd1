//! Intent data model.
//!
//! An [`Intent`] is a user's declared goal, emotional tone, and situational
//! context, awaiting motivational audio generation. Intents are owned by the
//! [`GenerationManager`](crate::manager::GenerationManager) once submitted and
//! are mutated only through its transition methods.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Intent`] | Goal + tone + context + schedule + lifecycle status |
//! | [`Tone`] | Fixed set of emotional styles selecting wording and voice |
//! | [`IntentContext`] | Situational inputs (weather, time of day, calendar) |
//! | [`IntentStatus`] | Lifecycle state with an explicit transition table |
//! | [`GeneratedContent`] | Immutable result of one successful generation |
//! | [`IntentStore`] | Persistence contract consumed by the manager |

mod content;
mod store;

pub use content::{ContentMetadata, GeneratedContent};
pub use store::{IntentStore, MemoryIntentStore};

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Emotional style of the generated content.
///
/// Each tone selects both the wording style requested from the text generator
/// and the synthesis voice (see the orchestrator's voice table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Gentle,
    Energetic,
    ToughLove,
    Storyteller,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gentle => "gentle",
            Self::Energetic => "energetic",
            Self::ToughLove => "tough_love",
            Self::Storyteller => "storyteller",
        }
    }

    /// All tones, in a stable order.
    pub fn all() -> [Tone; 4] {
        [
            Tone::Gentle,
            Tone::Energetic,
            Tone::ToughLove,
            Tone::Storyteller,
        ]
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Situational context attached to an intent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentContext {
    pub weather: Option<String>,
    pub time_of_day: Option<String>,
    pub day_of_week: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calendar: Vec<String>,
    pub note: Option<String>,
}

/// Lifecycle state of an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    Pending,
    Generating,
    Ready,
    Failed,
    Used,
}

impl IntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Generating => "generating",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Used => "used",
        }
    }

    /// The legal transition table.
    ///
    /// `pending -> generating -> ready | failed`, `failed -> generating`
    /// (retry), `ready -> used` (terminal). Everything else is rejected.
    pub fn can_transition_to(&self, next: IntentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Generating)
                | (Self::Generating, Self::Ready)
                | (Self::Generating, Self::Failed)
                | (Self::Failed, Self::Generating)
                | (Self::Ready, Self::Used)
        )
    }
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's declared goal awaiting motivational content generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub id: String,
    pub goal: String,
    pub tone: Tone,
    #[serde(default)]
    pub context: IntentContext,
    pub scheduled_at: DateTime<Utc>,
    pub status: IntentStatus,
    pub generated_content: Option<GeneratedContent>,
    pub failure_reason: Option<String>,
}

impl Intent {
    /// Create a pending intent with a fresh UUID.
    pub fn new(goal: impl Into<String>, tone: Tone, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            goal: goal.into(),
            tone,
            context: IntentContext::default(),
            scheduled_at,
            status: IntentStatus::Pending,
            generated_content: None,
            failure_reason: None,
        }
    }

    pub fn with_context(mut self, context: IntentContext) -> Self {
        self.context = context;
        self
    }

    /// Move the intent to `next`, enforcing the transition table.
    pub fn transition_to(&mut self, next: IntentStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                intent_id: self.id.clone(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}
