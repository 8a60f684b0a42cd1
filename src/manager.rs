//! Generation manager.
//!
//! Owns the intent lifecycle: submission, the generating/ready/failed state
//! machine, the single-flight discipline, the failure index, and aggregate
//! statistics. All intent mutation flows through this type; the orchestrator
//! only computes.

use crate::intent::{GeneratedContent, Intent, IntentStatus, IntentStore};
use crate::orchestrator::{GenerationOrchestrator, GenerationStatus};
use crate::{Error, Result};
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// How far ahead the queue sweep looks for imminent intents.
const QUEUE_LOOK_AHEAD_SECS: i64 = 3600;

/// How many recently completed intent ids are retained.
const RECENT_COMPLETED_CAP: usize = 20;

/// Aggregate view over every intent the manager has seen.
#[derive(Debug, Clone, Default)]
pub struct GenerationStatistics {
    pub total: usize,
    pub pending: usize,
    pub generating: usize,
    pub ready: usize,
    pub failed: usize,
    pub used: usize,
    /// ready + used, as a fraction of total.
    pub completion_rate: f64,
    pub failure_rate: f64,
    pub pending_rate: f64,
    /// Most recent successful generations, oldest first.
    pub recently_completed: Vec<String>,
    pub average_generation_time_ms: f64,
}

#[derive(Default)]
struct History {
    failures: HashMap<String, String>,
    recently_completed: VecDeque<String>,
    durations_ms: Vec<u64>,
}

/// Releases the single-flight slot when a generation attempt ends, however
/// it ends.
struct SlotGuard<'a> {
    slot: &'a Mutex<Option<String>>,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        *self.slot.lock().unwrap() = None;
    }
}

/// Coordinates intent generation.
///
/// The "currently generating" slot is intentionally global across all
/// intents, not per intent: a single foreground actor drives generation, and
/// a second request is rejected immediately rather than queued.
pub struct GenerationManager {
    store: Arc<dyn IntentStore>,
    orchestrator: GenerationOrchestrator,
    active: Mutex<Option<String>>,
    known: Mutex<HashSet<String>>,
    history: Mutex<History>,
}

impl GenerationManager {
    pub fn new(store: Arc<dyn IntentStore>, orchestrator: GenerationOrchestrator) -> Self {
        Self {
            store,
            orchestrator,
            active: Mutex::new(None),
            known: Mutex::new(HashSet::new()),
            history: Mutex::new(History::default()),
        }
    }

    /// Submit a new intent. Fails with [`Error::DuplicateIntent`] on id collision.
    pub async fn submit(&self, intent: Intent) -> Result<()> {
        let id = intent.id.clone();
        self.store.save(intent).await?;
        self.known.lock().unwrap().insert(id);
        Ok(())
    }

    /// Subscribe to the orchestrator's status sequence.
    pub fn subscribe_status(&self) -> broadcast::Receiver<GenerationStatus> {
        self.orchestrator.subscribe_status()
    }

    pub fn orchestrator(&self) -> &GenerationOrchestrator {
        &self.orchestrator
    }

    /// The id currently holding the single-flight slot, if any.
    pub fn active_intent(&self) -> Option<String> {
        self.active.lock().unwrap().clone()
    }

    /// Snapshot of the failure index: intent id → recorded reason.
    pub fn failure_index(&self) -> HashMap<String, String> {
        self.history.lock().unwrap().failures.clone()
    }

    fn acquire_slot(&self, intent_id: &str) -> Result<SlotGuard<'_>> {
        let mut active = self.active.lock().unwrap();
        if let Some(current) = active.as_ref() {
            return Err(Error::AlreadyGenerating {
                requested: intent_id.to_string(),
                active: current.clone(),
            });
        }
        *active = Some(intent_id.to_string());
        Ok(SlotGuard { slot: &self.active })
    }

    /// Generate content for a pending (or previously failed) intent.
    pub async fn generate(&self, intent_id: &str) -> Result<GeneratedContent> {
        let mut intent = self
            .store
            .get(intent_id)
            .await?
            .ok_or_else(|| Error::IntentNotFound(intent_id.to_string()))?;
        self.known.lock().unwrap().insert(intent.id.clone());

        let _slot = self.acquire_slot(intent_id)?;

        intent.transition_to(IntentStatus::Generating)?;
        self.store.update(intent.clone()).await?;

        match self.orchestrator.run(&intent).await {
            Ok(content) => {
                intent.transition_to(IntentStatus::Ready)?;
                intent.generated_content = Some(content.clone());
                intent.failure_reason = None;
                self.store.update(intent).await?;

                let mut history = self.history.lock().unwrap();
                history.failures.remove(intent_id);
                history.recently_completed.push_back(intent_id.to_string());
                while history.recently_completed.len() > RECENT_COMPLETED_CAP {
                    history.recently_completed.pop_front();
                }
                if !content.metadata.from_cache {
                    history.durations_ms.push(content.metadata.generation_time_ms);
                }
                info!(intent_id, from_cache = content.metadata.from_cache, "intent ready");
                Ok(content)
            }
            Err(err) => {
                let reason = err.to_string();
                intent.transition_to(IntentStatus::Failed)?;
                intent.failure_reason = Some(reason.clone());
                if let Err(update_err) = self.store.update(intent).await {
                    warn!(intent_id, error = %update_err, "failed to persist failure status");
                }
                self.history
                    .lock()
                    .unwrap()
                    .failures
                    .insert(intent_id.to_string(), reason);
                warn!(intent_id, error = %err, "generation failed");
                Err(err)
            }
        }
    }

    /// Retry a failed intent. A success clears its failure-index entry.
    pub async fn retry(&self, intent_id: &str) -> Result<GeneratedContent> {
        let intent = self
            .store
            .get(intent_id)
            .await?
            .ok_or_else(|| Error::IntentNotFound(intent_id.to_string()))?;
        if intent.status != IntentStatus::Failed {
            return Err(Error::InvalidTransition {
                intent_id: intent_id.to_string(),
                from: intent.status.to_string(),
                to: IntentStatus::Generating.to_string(),
            });
        }
        self.generate(intent_id).await
    }

    /// Mark a ready intent as consumed. Terminal.
    pub async fn mark_used(&self, intent_id: &str) -> Result<()> {
        let mut intent = self
            .store
            .get(intent_id)
            .await?
            .ok_or_else(|| Error::IntentNotFound(intent_id.to_string()))?;
        intent.transition_to(IntentStatus::Used)?;
        self.store.update(intent).await
    }

    /// Generate every pending intent whose scheduled time falls within the
    /// next hour. Farther-out intents are left untouched. Returns the ids
    /// that were generated successfully.
    pub async fn process_queued_intents(&self) -> Result<Vec<String>> {
        let deadline = Utc::now() + ChronoDuration::seconds(QUEUE_LOOK_AHEAD_SECS);
        let pending = self.store.list_pending().await?;
        let mut generated = Vec::new();
        for intent in pending {
            if intent.scheduled_at > deadline {
                continue;
            }
            match self.generate(&intent.id).await {
                Ok(_) => generated.push(intent.id),
                Err(err) => {
                    warn!(intent_id = %intent.id, error = %err, "queued generation failed")
                }
            }
        }
        Ok(generated)
    }

    /// Aggregate statistics over every intent this manager has seen.
    pub async fn generation_statistics(&self) -> Result<GenerationStatistics> {
        let ids: Vec<String> = self.known.lock().unwrap().iter().cloned().collect();
        let mut stats = GenerationStatistics::default();
        for id in &ids {
            let Some(intent) = self.store.get(id).await? else {
                continue;
            };
            stats.total += 1;
            match intent.status {
                IntentStatus::Pending => stats.pending += 1,
                IntentStatus::Generating => stats.generating += 1,
                IntentStatus::Ready => stats.ready += 1,
                IntentStatus::Failed => stats.failed += 1,
                IntentStatus::Used => stats.used += 1,
            }
        }
        if stats.total > 0 {
            let total = stats.total as f64;
            stats.completion_rate = (stats.ready + stats.used) as f64 / total;
            stats.failure_rate = stats.failed as f64 / total;
            stats.pending_rate = stats.pending as f64 / total;
        }

        let history = self.history.lock().unwrap();
        stats.recently_completed = history.recently_completed.iter().cloned().collect();
        if !history.durations_ms.is_empty() {
            stats.average_generation_time_ms = history.durations_ms.iter().sum::<u64>() as f64
                / history.durations_ms.len() as f64;
        }
        Ok(stats)
    }

    /// Reset the recently-completed list and the failure index. Persisted
    /// intents are untouched.
    pub fn clear_history(&self) {
        let mut history = self.history.lock().unwrap();
        history.recently_completed.clear();
        history.failures.clear();
    }
}
