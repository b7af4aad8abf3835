//! Emoji - the glyphs placed on a document canvas.

use serde::{Deserialize, Serialize};

/// Identifier of an emoji, unique within its document.
///
/// Ids are handed out by [`EmojiArt`](crate::EmojiArt) from a counter that is
/// part of the document, so they never repeat even after removal or reload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EmojiId(u64);

impl EmojiId {
    /// Wrap a raw id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw integer value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EmojiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EmojiId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// A position on the canvas, measured from its center.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal offset from the center (positive is right).
    pub x: i64,
    /// Vertical offset from the center (positive is down).
    pub y: i64,
}

impl Position {
    /// The canvas center.
    pub const CENTER: Self = Self { x: 0, y: 0 };

    /// Create a position from center offsets.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl From<(i64, i64)> for Position {
    fn from((x, y): (i64, i64)) -> Self {
        Self { x, y }
    }
}

/// An emoji placed on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Emoji {
    /// Unique identifier.
    pub id: EmojiId,
    /// The glyph, expected to be a single emoji grapheme.
    pub text: String,
    /// Offset from the canvas center, horizontally.
    pub x: i64,
    /// Offset from the canvas center, vertically.
    pub y: i64,
    /// Nominal font size.
    pub size: u32,
}

impl Emoji {
    // Only the document allocates ids.
    pub(crate) fn new(id: EmojiId, text: String, position: Position, size: u32) -> Self {
        Self {
            id,
            text,
            x: position.x,
            y: position.y,
            size,
        }
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Position {
        Position {
            x: self.x,
            y: self.y,
        }
    }

    /// Shift by the given deltas.
    pub(crate) fn offset(&mut self, dx: i64, dy: i64) {
        self.x = self.x.saturating_add(dx);
        self.y = self.y.saturating_add(dy);
    }

    /// Multiply the size by `factor`, rounding half away from zero.
    pub(crate) fn scale(&mut self, factor: f64) {
        self.size = scaled_size(self.size, factor);
    }
}

/// `size * factor` rounded to the nearest integer, ties away from zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped into u32 range first
pub fn scaled_size(size: u32, factor: f64) -> u32 {
    let scaled = (f64::from(size) * factor).round();
    scaled.clamp(0.0, f64::from(u32::MAX)) as u32
}
