//! Emoji palettes and their persistence.
//!
//! A [`PaletteStore`] is a named, ordered list of [`Palette`]s persisted as
//! JSON under the key `PaletteStore:<name>` of an injected
//! [`KeyValueStore`]. Loading and saving are explicit.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{KeyValueStore, StoreError};

/// Palettes seeded into a store that has nothing saved yet.
pub const DEFAULT_PALETTES: &[(&str, &str)] = &[
    ("Vehicles", "🚙🚗🚘🚕🚖🏎🚚🛻🚛🚐🚓🚔🚑🚒🚀✈️🛫🛬🛩🚁🛸🚲🏍🛶⛵️🚤🛥🛳⛴🚢🚂🚝🚅🚆🚊🚉🚇🛺🚜"),
    ("Sports", "🏈⚾️🏀⚽️🎾🏐🥏🏓⛳️🥅🥌🏂⛷🎳"),
    ("Music", "🎼🎤🎹🪘🥁🎺🪗🪕🎻"),
    ("Animals", "🐥🐣🐂🐄🐎🐖🐏🐑🦙🐐🐓🐁🐀🐒🦆🦅🦉🦇🐢🐍🦎🦖🦕🐅🐆🦓🦍🦧🦣🐘🦛🦏🐪🐫🦒🦘🦬🐃🦌🐕🐩🦮🐈🦤🦢🦩🕊🦝🦨🦡🦫🦦🦥🐿🦔"),
    ("Animal Faces", "🐵🙈🙊🙉🐶🐱🐭🐹🐰🦊🐻🐼🐻‍❄️🐨🐯🦁🐮🐷🐸🐲"),
    ("Flora", "🌲🌴🌿☘️🍀🍁🍄🌾💐🌷🌹🥀🌺🌸🌼🌻"),
    ("Weather", "☀️🌤⛅️🌥☁️🌦🌧⛈🌩🌨❄️💨☔️💧💦🌊☂️🌫🌪"),
    ("COVID", "💉🦠😷🤧🤒"),
    ("Faces", "😀😃😄😁😆😅😂🤣🥲☺️😊😇🙂🙃😉😌😍🥰😘😗😙😚😋😛😝😜🤪🤨🧐🤓😎🥸🤩🥳😏😞😔😟😕🙁☹️😣😖😫😩🥺😢😭😤😠😡🤯😳🥶😥😓🤗🤔🤭🤫🤥😬🙄😯😧🥱😴🤮😷🤧🤒🤠"),
];

/// A named string of candidate emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// Identifier, unique within its store.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// The emoji, concatenated.
    pub emojis: String,
}

/// An ordered, persisted collection of palettes.
pub struct PaletteStore {
    name: String,
    palettes: Vec<Palette>,
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for PaletteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaletteStore")
            .field("name", &self.name)
            .field("palettes", &self.palettes)
            .finish_non_exhaustive()
    }
}

impl PaletteStore {
    /// Load the store called `name`, seeding the default palettes when
    /// nothing usable is saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the key-value store cannot be read.
    pub fn load(name: impl Into<String>, store: Arc<dyn KeyValueStore>) -> Result<Self, StoreError> {
        let mut palette_store = Self {
            name: name.into(),
            palettes: Vec::new(),
            store,
        };

        if let Some(bytes) = palette_store.store.get(&palette_store.key())? {
            match serde_json::from_slice::<Vec<Palette>>(&bytes) {
                Ok(palettes) => palette_store.palettes = palettes,
                Err(e) => tracing::warn!(
                    "Ignoring unreadable palettes for {}: {e}",
                    palette_store.name
                ),
            }
        }

        if palette_store.palettes.is_empty() {
            tracing::info!("Seeding default palettes for {}", palette_store.name);
            for &(name, emojis) in DEFAULT_PALETTES {
                palette_store.insert_palette(name, Some(emojis), 0);
            }
        } else {
            tracing::info!(
                "Loaded {} palettes for {}",
                palette_store.palettes.len(),
                palette_store.name
            );
        }
        Ok(palette_store)
    }

    /// Write the palettes back to the key-value store.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_vec(&self.palettes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.set(&self.key(), &json)
    }

    /// Storage key for this store.
    #[must_use]
    pub fn key(&self) -> String {
        format!("PaletteStore:{}", self.name)
    }

    /// Store name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All palettes in display order.
    #[must_use]
    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    /// Number of palettes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    /// Whether there are no palettes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }

    /// The palette at `index`, clamped into range.
    #[must_use]
    pub fn palette(&self, index: usize) -> Option<&Palette> {
        let last = self.palettes.len().checked_sub(1)?;
        self.palettes.get(index.min(last))
    }

    /// Insert a new palette at `index` (clamped) and return its id.
    pub fn insert_palette(
        &mut self,
        name: impl Into<String>,
        emojis: Option<&str>,
        index: usize,
    ) -> u64 {
        let id = self.palettes.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let palette = Palette {
            id,
            name: name.into(),
            emojis: emojis.unwrap_or_default().to_string(),
        };
        let index = index.min(self.palettes.len());
        self.palettes.insert(index, palette);
        id
    }

    /// Remove the palette at `index`, never removing the last one.
    ///
    /// Returns the index to show next.
    pub fn remove_palette(&mut self, index: usize) -> usize {
        if self.palettes.len() > 1 && index < self.palettes.len() {
            self.palettes.remove(index);
        }
        index % self.palettes.len().max(1)
    }

    /// Rename the palette at `index`. Returns whether it exists.
    pub fn rename_palette(&mut self, index: usize, name: impl Into<String>) -> bool {
        match self.palettes.get_mut(index) {
            Some(palette) => {
                palette.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Append the emoji found in `text` to the palette at `index`, dropping
    /// anything that is not an emoji and any repeats.
    pub fn add_emojis(&mut self, index: usize, text: &str) -> bool {
        let Some(palette) = self.palettes.get_mut(index) else {
            return false;
        };
        let mut combined = std::mem::take(&mut palette.emojis);
        combined.extend(emoji_clusters(text).into_iter().filter(|c| is_emoji(c)));
        palette.emojis = without_repeats(&combined);
        true
    }

    /// Remove every occurrence of `emoji` from the palette at `index`.
    pub fn remove_emoji(&mut self, index: usize, emoji: &str) -> bool {
        let Some(palette) = self.palettes.get_mut(index) else {
            return false;
        };
        palette.emojis = emoji_clusters(&palette.emojis)
            .into_iter()
            .filter(|c| *c != emoji)
            .collect();
        true
    }
}

const ZWJ: char = '\u{200D}';

fn is_extender(c: char) -> bool {
    matches!(c,
        '\u{FE0E}' | '\u{FE0F}'          // variation selectors
        | '\u{20E3}'                     // combining enclosing keycap
        | '\u{1F3FB}'..='\u{1F3FF}'      // skin tone modifiers
        | '\u{E0020}'..='\u{E007F}'      // tag sequences
    )
}

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

/// Split `text` into emoji-sized clusters.
///
/// Joins variation selectors, skin tones, keycaps, tags, zero-width-joiner
/// sequences and regional-indicator pairs onto their base character.
#[must_use]
pub fn emoji_clusters(text: &str) -> Vec<&str> {
    let mut clusters = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, base)) = chars.next() {
        let mut end = start + base.len_utf8();
        let mut pending_flag = is_regional_indicator(base);

        while let Some(&(i, c)) = chars.peek() {
            let joins = if is_extender(c) {
                true
            } else if c == ZWJ {
                // Swallow the joiner and the character it joins.
                chars.next();
                end = i + c.len_utf8();
                if let Some(&(j, next)) = chars.peek() {
                    end = j + next.len_utf8();
                    chars.next();
                }
                continue;
            } else if pending_flag && is_regional_indicator(c) {
                pending_flag = false;
                true
            } else {
                false
            };

            if !joins {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        clusters.push(&text[start..end]);
    }
    clusters
}

/// Whether a cluster looks like an emoji.
#[must_use]
pub fn is_emoji(cluster: &str) -> bool {
    let mut chars = cluster.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if cluster.contains('\u{20E3}') {
        return true;
    }
    matches!(first,
        '\u{00A9}' | '\u{00AE}' | '\u{203C}' | '\u{2049}' | '\u{2122}' | '\u{2139}'
        | '\u{2194}'..='\u{21AA}'
        | '\u{231A}'..='\u{23FF}'
        | '\u{24C2}'
        | '\u{25AA}'..='\u{25FE}'
        | '\u{2600}'..='\u{27BF}'
        | '\u{2934}' | '\u{2935}'
        | '\u{2B05}'..='\u{2B55}'
        | '\u{3030}' | '\u{303D}' | '\u{3297}' | '\u{3299}'
        | '\u{1F000}'..='\u{1FAFF}'
    )
}

/// `text` with repeated clusters removed, keeping first occurrences.
#[must_use]
pub fn without_repeats(text: &str) -> String {
    let mut seen = HashSet::new();
    emoji_clusters(text)
        .into_iter()
        .filter(|c| seen.insert(*c))
        .collect()
}
