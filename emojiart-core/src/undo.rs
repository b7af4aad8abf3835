//! # Undo
//!
//! The document does not keep its own history. Every mutating intent hands a
//! pre-mutation snapshot to an [`UndoManager`], the host's undo facility.
//! Restoring a snapshot registers the inverse snapshot again, so the same
//! mechanism drives both undo and redo:
//!
//! ```text
//! intent:  register(before)        undo stack: [before]
//! undo:    restore(before)
//!          register(after)         redo stack: [after]
//! redo:    restore(after)
//!          register(before)        undo stack: [before]
//! ```
//!
//! [`UndoStack`] is an in-memory manager with those semantics for hosts that
//! have no platform undo facility.

use std::collections::VecDeque;

use crate::EmojiArt;

/// Default maximum number of undo steps kept by [`UndoStack`].
pub const DEFAULT_UNDO_LIMIT: usize = 100;

/// Host-side undo facility driven by the document.
pub trait UndoManager {
    /// Register a step that, when performed, restores `snapshot`.
    fn register_undo(&mut self, snapshot: EmojiArt);

    /// Label the most recently registered step for display.
    fn set_action_name(&mut self, name: &str);
}

/// Something an undo step can be performed against.
pub trait UndoTarget {
    /// Replace the current state with `snapshot`, registering the state being
    /// replaced with `undo` under the same `label`.
    fn restore(&mut self, snapshot: EmojiArt, label: &str, undo: &mut dyn UndoManager);
}

/// A recorded step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    /// Operation name shown to the user, e.g. "Move".
    pub label: String,
    /// Document state the step restores.
    pub snapshot: EmojiArt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Undoing,
    Redoing,
}

/// Bounded in-memory [`UndoManager`].
///
/// Registrations made while undoing go to the redo stack, registrations made
/// while redoing go to the undo stack, and any other registration starts a
/// new branch of history by clearing the redo stack.
#[derive(Debug, Clone)]
pub struct UndoStack {
    undo: VecDeque<UndoEntry>,
    redo: Vec<UndoEntry>,
    phase: Phase,
    limit: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    /// Create an empty stack holding up to [`DEFAULT_UNDO_LIMIT`] steps.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_UNDO_LIMIT)
    }

    /// Create an empty stack holding up to `limit` undo steps (at least one).
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            phase: Phase::Idle,
            limit: limit.max(1),
        }
    }

    /// Undo the most recent step. Returns its label, `None` if nothing to undo.
    pub fn undo(&mut self, target: &mut dyn UndoTarget) -> Option<String> {
        let entry = self.undo.pop_back()?;
        tracing::debug!("Undo {}", entry.label);
        self.perform(entry, Phase::Undoing, target)
    }

    /// Redo the most recently undone step. Returns its label.
    pub fn redo(&mut self, target: &mut dyn UndoTarget) -> Option<String> {
        let entry = self.redo.pop()?;
        tracing::debug!("Redo {}", entry.label);
        self.perform(entry, Phase::Redoing, target)
    }

    fn perform(
        &mut self,
        entry: UndoEntry,
        phase: Phase,
        target: &mut dyn UndoTarget,
    ) -> Option<String> {
        self.phase = phase;
        target.restore(entry.snapshot, &entry.label, self);
        self.phase = Phase::Idle;
        Some(entry.label)
    }

    /// Whether an undo step is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether a redo step is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Label of the next undo step.
    #[must_use]
    pub fn undo_label(&self) -> Option<&str> {
        self.undo.back().map(|e| e.label.as_str())
    }

    /// Label of the next redo step.
    #[must_use]
    pub fn redo_label(&self) -> Option<&str> {
        self.redo.last().map(|e| e.label.as_str())
    }

    /// Number of undo steps held.
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of redo steps held.
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    fn push_undo(&mut self, entry: UndoEntry) {
        if self.undo.len() >= self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(entry);
    }
}

impl UndoManager for UndoStack {
    fn register_undo(&mut self, snapshot: EmojiArt) {
        let entry = UndoEntry {
            label: String::new(),
            snapshot,
        };
        match self.phase {
            Phase::Idle => {
                self.redo.clear();
                self.push_undo(entry);
            }
            Phase::Undoing => self.redo.push(entry),
            Phase::Redoing => self.push_undo(entry),
        }
    }

    fn set_action_name(&mut self, name: &str) {
        let entry = match self.phase {
            Phase::Undoing => self.redo.last_mut(),
            Phase::Idle | Phase::Redoing => self.undo.back_mut(),
        };
        if let Some(entry) = entry {
            entry.label = name.to_string();
        }
    }
}
