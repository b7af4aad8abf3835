//! The EmojiArt document model.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Background, Emoji, EmojiArtError, EmojiArtResult, EmojiId, Position};

/// A complete EmojiArt composition: background, emoji and the id counter.
///
/// Mutations on a missing emoji id are silent no-ops so that undo/redo and
/// concurrent UI intents never fail on stale ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiArt {
    /// Current backdrop.
    #[serde(default)]
    background: Background,
    /// Emoji in insertion (paint) order.
    #[serde(default)]
    emojis: Vec<Emoji>,
    /// Last id handed out. Never decreases.
    #[serde(default)]
    emoji_id_counter: u64,
}

impl EmojiArt {
    /// Create an empty document with a blank background.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current background.
    #[must_use]
    pub const fn background(&self) -> &Background {
        &self.background
    }

    /// Replace the background wholesale, returning the previous one.
    pub fn set_background(&mut self, background: Background) -> Background {
        std::mem::replace(&mut self.background, background)
    }

    /// All emoji in paint order.
    #[must_use]
    pub fn emojis(&self) -> &[Emoji] {
        &self.emojis
    }

    /// The last id allocated by this document.
    #[must_use]
    pub const fn emoji_id_counter(&self) -> u64 {
        self.emoji_id_counter
    }

    /// Number of emoji on the canvas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.emojis.len()
    }

    /// Whether the canvas has no emoji.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emojis.is_empty()
    }

    /// Find the index of an emoji by id.
    #[must_use]
    pub fn index_of(&self, id: EmojiId) -> Option<usize> {
        self.emojis.iter().position(|e| e.id == id)
    }

    /// Get an emoji by id.
    #[must_use]
    pub fn emoji(&self, id: EmojiId) -> Option<&Emoji> {
        self.emojis.iter().find(|e| e.id == id)
    }

    /// Get an emoji by id, failing if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`EmojiArtError::NotFound`] if no emoji has this id.
    pub fn get(&self, id: EmojiId) -> EmojiArtResult<&Emoji> {
        self.emoji(id).ok_or(EmojiArtError::NotFound(id))
    }

    fn emoji_mut(&mut self, id: EmojiId) -> Option<&mut Emoji> {
        self.emojis.iter_mut().find(|e| e.id == id)
    }

    /// Append a new emoji and return its freshly allocated id.
    pub fn add_emoji(
        &mut self,
        text: impl Into<String>,
        position: impl Into<Position>,
        size: u32,
    ) -> EmojiId {
        self.emoji_id_counter += 1;
        let id = EmojiId::new(self.emoji_id_counter);
        self.emojis
            .push(Emoji::new(id, text.into(), position.into(), size));
        id
    }

    /// Remove an emoji by id. Returns the removed emoji, `None` if absent.
    pub fn remove_emoji(&mut self, id: EmojiId) -> Option<Emoji> {
        let index = self.index_of(id)?;
        Some(self.emojis.remove(index))
    }

    /// Move an emoji by the given deltas. Returns whether it was found.
    pub fn move_emoji(&mut self, id: EmojiId, dx: i64, dy: i64) -> bool {
        match self.emoji_mut(id) {
            Some(emoji) => {
                emoji.offset(dx, dy);
                true
            }
            None => false,
        }
    }

    /// Scale an emoji's size by `factor`, rounding half away from zero.
    ///
    /// Returns whether the emoji was changed. Non-finite and non-positive
    /// factors are ignored.
    pub fn scale_emoji(&mut self, id: EmojiId, factor: f64) -> bool {
        if !is_valid_factor(factor) {
            tracing::warn!("Ignoring invalid scale factor {factor} for emoji {id}");
            return false;
        }
        match self.emoji_mut(id) {
            Some(emoji) => {
                emoji.scale(factor);
                true
            }
            None => false,
        }
    }

    /// Serialize the document to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> EmojiArtResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(EmojiArtError::Serialization)
    }

    /// Deserialize and validate a document from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EmojiArtError::Serialization`] for malformed bytes and
    /// [`EmojiArtError::Corrupt`] if two emoji share an id, an id is 0, or the
    /// id counter is implausibly large.
    pub fn from_bytes(bytes: &[u8]) -> EmojiArtResult<Self> {
        let art: Self = serde_json::from_slice(bytes)?;
        art.validated()
    }

    /// Serialize the document to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> EmojiArtResult<String> {
        serde_json::to_string(self).map_err(EmojiArtError::Serialization)
    }

    /// Deserialize and validate a document from a JSON string.
    ///
    /// # Errors
    ///
    /// Same as [`EmojiArt::from_bytes`].
    pub fn from_json(json: &str) -> EmojiArtResult<Self> {
        Self::from_bytes(json.as_bytes())
    }

    fn validated(mut self) -> EmojiArtResult<Self> {
        let mut seen = HashSet::with_capacity(self.emojis.len());
        for emoji in &self.emojis {
            if emoji.id.get() == 0 {
                return Err(EmojiArtError::Corrupt("emoji id 0 is reserved".to_string()));
            }
            if !seen.insert(emoji.id) {
                return Err(EmojiArtError::Corrupt(format!(
                    "duplicate emoji id {}",
                    emoji.id
                )));
            }
        }

        // Older or hand-edited files may carry a stale counter.
        let max_id = self.emojis.iter().map(|e| e.id.get()).max().unwrap_or(0);
        if self.emoji_id_counter < max_id {
            tracing::warn!(
                "Raising emoji id counter from {} to {max_id}",
                self.emoji_id_counter
            );
            self.emoji_id_counter = max_id;
        }
        if self.emoji_id_counter > MAX_LOADED_COUNTER {
            return Err(EmojiArtError::Corrupt(
                "emoji id counter is exhausted".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Loaded counters above this are corrupt, leaving room for every id a
/// session could allocate.
const MAX_LOADED_COUNTER: u64 = i64::MAX.unsigned_abs();

fn is_valid_factor(factor: f64) -> bool {
    factor.is_finite() && factor > 0.0
}
