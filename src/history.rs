//! Consultation history: load, aggregate, select and clear
//!
//! Loads and clears may overlap. Every request takes a new generation number
//! and its result is applied only if no later request has been issued since.

use crate::auth::AuthenticatedUser;
use crate::transport::{ConsultationHistoryEntry, HistoryTransport, TransportError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub const CLEAR_CONFIRMATION_PROMPT: &str =
    "Are you sure you want to clear all your medical history? This action cannot be undone.";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to load history: {0}")]
    Fetch(#[source] TransportError),
    #[error("Failed to clear history. Please try again. ({0})")]
    Clear(#[source] TransportError),
}

/// Gate in front of destructive operations
pub trait ConfirmPrompt {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> ConfirmPrompt for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// List replaced with `count` entries
    Loaded { count: usize },
    /// A newer load or clear was issued; result dropped
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared,
    /// The user declined; no request was sent
    Declined,
    /// Cleared on the backend, but a newer request owns the local list
    Superseded,
}

/// Aggregate figures over the loaded list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryStats {
    pub total_consultations: usize,
    pub unique_symptoms: usize,
}

/// Point-in-time copy of the aggregator state for rendering
#[derive(Debug, Clone, Default)]
pub struct HistorySnapshot {
    /// Most recent first
    pub entries: Vec<ConsultationHistoryEntry>,
    pub selected: Option<usize>,
}

impl HistorySnapshot {
    pub fn selected_entry(&self) -> Option<&ConsultationHistoryEntry> {
        self.selected.and_then(|index| self.entries.get(index))
    }
}

#[derive(Debug, Default)]
struct HistoryState {
    entries: Vec<ConsultationHistoryEntry>,
    selected: Option<usize>,
}

impl HistoryState {
    fn stats(&self) -> HistoryStats {
        let unique: HashSet<&str> = self
            .entries
            .iter()
            .flat_map(|entry| entry.symptoms.iter().map(String::as_str))
            .collect();
        HistoryStats {
            total_consultations: self.entries.len(),
            unique_symptoms: unique.len(),
        }
    }
}

pub struct HistoryAggregator<H> {
    transport: Arc<H>,
    state: Mutex<HistoryState>,
    generation: AtomicU64,
}

impl<H: HistoryTransport> HistoryAggregator<H> {
    pub fn new(transport: Arc<H>) -> Self {
        Self {
            transport,
            state: Mutex::new(HistoryState::default()),
            generation: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Fetch the user's history and store it most-recent-first.
    ///
    /// On failure the previously loaded list is left untouched.
    pub async fn load(&self, user: &AuthenticatedUser) -> Result<LoadOutcome, HistoryError> {
        let generation = self.next_generation();
        let result = self.transport.fetch_history(user.username()).await;

        let mut entries = match result {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(username = %user.username(), error = %e, "History fetch failed");
                return Err(HistoryError::Fetch(e));
            }
        };

        let mut state = self.lock();
        if !self.is_current(generation) {
            tracing::debug!(generation, "Discarding superseded history load");
            return Ok(LoadOutcome::Superseded);
        }
        entries.reverse();
        state.entries = entries;
        state.selected = None;
        Ok(LoadOutcome::Loaded {
            count: state.entries.len(),
        })
    }

    /// Delete all of the user's history after explicit confirmation.
    ///
    /// On failure the loaded list is left unchanged.
    pub async fn clear_all(
        &self,
        user: &AuthenticatedUser,
        confirmation: &impl ConfirmPrompt,
    ) -> Result<ClearOutcome, HistoryError> {
        if !confirmation.confirm(CLEAR_CONFIRMATION_PROMPT) {
            return Ok(ClearOutcome::Declined);
        }

        let generation = self.next_generation();
        if let Err(e) = self.transport.clear_history(user.username()).await {
            tracing::error!(username = %user.username(), error = %e, "History clear failed");
            return Err(HistoryError::Clear(e));
        }

        let mut state = self.lock();
        if !self.is_current(generation) {
            tracing::debug!(generation, "Clear completed after a newer request");
            return Ok(ClearOutcome::Superseded);
        }
        state.entries.clear();
        state.selected = None;
        tracing::info!(username = %user.username(), "History cleared");
        Ok(ClearOutcome::Cleared)
    }

    pub fn stats(&self) -> HistoryStats {
        self.lock().stats()
    }

    /// Select an entry for the detail view. Out-of-range indices are ignored.
    pub fn select(&self, index: usize) -> bool {
        let mut state = self.lock();
        if index < state.entries.len() {
            state.selected = Some(index);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&self) {
        self.lock().selected = None;
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        let state = self.lock();
        HistorySnapshot {
            entries: state.entries.clone(),
            selected: state.selected,
        }
    }
}

#[cfg(test)]
impl<H: HistoryTransport> HistoryAggregator<H> {
    pub fn selected(&self) -> Option<usize> {
        self.lock().selected
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}
