//! The editable EmojiArt document: intents, undo coordination and the
//! resolved background image.

use crate::{
    Background, BackgroundResolver, DecodedImage, Emoji, EmojiArt, EmojiId, FetchStatus,
    Position, ResolveError, Selection, UndoManager, UndoTarget,
};

/// Undo label for [`EmojiArtDocument::set_background`].
pub const LABEL_SET_BACKGROUND: &str = "Set Background";
/// Undo label for [`EmojiArtDocument::add_emoji`].
pub const LABEL_ADD_EMOJI: &str = "Add Emoji";
/// Undo label for removals.
pub const LABEL_REMOVE: &str = "Remove";
/// Undo label for moves.
pub const LABEL_MOVE: &str = "Move";
/// Undo label for scaling.
pub const LABEL_SCALE: &str = "Scale";

/// An [`EmojiArt`] together with everything needed to edit it.
///
/// All mutation goes through the intent methods. Each one snapshots the
/// whole document first and, if anything changed, registers the snapshot with
/// the supplied [`UndoManager`] under a display label. Passing `None` skips
/// undo registration.
///
/// Whenever the background changes (by intent, undo or redo) the
/// [`BackgroundResolver`] is told, so the resolved image always follows the
/// document.
#[derive(Debug)]
pub struct EmojiArtDocument {
    art: EmojiArt,
    resolver: BackgroundResolver,
}

impl EmojiArtDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new(resolver: BackgroundResolver) -> Self {
        Self::with_art(EmojiArt::new(), resolver)
    }

    /// Wrap an existing (e.g. freshly loaded) composition and start resolving
    /// its background.
    #[must_use]
    pub fn with_art(art: EmojiArt, mut resolver: BackgroundResolver) -> Self {
        resolver.background_changed(art.background());
        Self { art, resolver }
    }

    /// The underlying composition.
    #[must_use]
    pub const fn art(&self) -> &EmojiArt {
        &self.art
    }

    /// Emoji in paint order.
    #[must_use]
    pub fn emojis(&self) -> &[Emoji] {
        self.art.emojis()
    }

    /// The current background.
    #[must_use]
    pub const fn background(&self) -> &Background {
        self.art.background()
    }

    /// The resolved background image, if any.
    #[must_use]
    pub const fn background_image(&self) -> Option<&DecodedImage> {
        self.resolver.image()
    }

    /// State of the background fetch.
    #[must_use]
    pub const fn fetch_status(&self) -> &FetchStatus {
        self.resolver.status()
    }

    /// Why the background could not be resolved, if it could not.
    #[must_use]
    pub const fn background_error(&self) -> Option<&ResolveError> {
        self.resolver.last_error()
    }

    // -----------------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------------

    /// Replace the background.
    pub fn set_background(&mut self, background: Background, undo: Option<&mut dyn UndoManager>) {
        self.undoably_perform(LABEL_SET_BACKGROUND, undo, |art| {
            art.set_background(background);
        });
    }

    /// Place a new emoji and return its id.
    pub fn add_emoji(
        &mut self,
        text: &str,
        position: impl Into<Position>,
        size: u32,
        undo: Option<&mut dyn UndoManager>,
    ) -> EmojiId {
        let position = position.into();
        self.undoably_perform(LABEL_ADD_EMOJI, undo, |art| {
            art.add_emoji(text, position, size)
        })
    }

    /// Remove an emoji. Missing ids are ignored.
    pub fn remove_emoji(&mut self, id: EmojiId, undo: Option<&mut dyn UndoManager>) {
        self.undoably_perform(LABEL_REMOVE, undo, |art| {
            art.remove_emoji(id);
        });
    }

    /// Move an emoji by the given offset. Missing ids are ignored.
    pub fn move_emoji(
        &mut self,
        id: EmojiId,
        dx: i64,
        dy: i64,
        undo: Option<&mut dyn UndoManager>,
    ) {
        self.undoably_perform(LABEL_MOVE, undo, |art| {
            art.move_emoji(id, dx, dy);
        });
    }

    /// Scale an emoji by `factor`. Missing ids and invalid factors are ignored.
    pub fn scale_emoji(&mut self, id: EmojiId, factor: f64, undo: Option<&mut dyn UndoManager>) {
        self.undoably_perform(LABEL_SCALE, undo, |art| {
            art.scale_emoji(id, factor);
        });
    }

    /// Remove every selected emoji as a single undo step.
    pub fn remove_emojis(&mut self, selection: &Selection, undo: Option<&mut dyn UndoManager>) {
        self.undoably_perform(LABEL_REMOVE, undo, |art| {
            for id in selection.ids() {
                art.remove_emoji(id);
            }
        });
    }

    /// Move every selected emoji as a single undo step.
    pub fn move_emojis(
        &mut self,
        selection: &Selection,
        dx: i64,
        dy: i64,
        undo: Option<&mut dyn UndoManager>,
    ) {
        self.undoably_perform(LABEL_MOVE, undo, |art| {
            for id in selection.ids() {
                art.move_emoji(id, dx, dy);
            }
        });
    }

    /// Scale every selected emoji as a single undo step.
    pub fn scale_emojis(
        &mut self,
        selection: &Selection,
        factor: f64,
        undo: Option<&mut dyn UndoManager>,
    ) {
        self.undoably_perform(LABEL_SCALE, undo, |art| {
            for id in selection.ids() {
                art.scale_emoji(id, factor);
            }
        });
    }

    fn undoably_perform<R>(
        &mut self,
        label: &str,
        undo: Option<&mut dyn UndoManager>,
        mutation: impl FnOnce(&mut EmojiArt) -> R,
    ) -> R {
        let before = self.art.clone();
        let result = mutation(&mut self.art);

        if self.art == before {
            tracing::debug!("{label}: nothing changed");
            return result;
        }

        let background_changed = before.background() != self.art.background();
        if let Some(undo) = undo {
            undo.register_undo(before);
            undo.set_action_name(label);
        }
        if background_changed {
            self.resolver.background_changed(self.art.background());
        }
        result
    }

    // -----------------------------------------------------------------------
    // Background resolution
    // -----------------------------------------------------------------------

    /// Apply any finished background fetches without waiting.
    ///
    /// Returns how many completions took effect.
    pub fn poll_background(&mut self) -> usize {
        let mut applied = 0;
        while let Some(completion) = self.resolver.try_next_completion() {
            if self.resolver.apply(completion, self.art.background()) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait until the background is no longer being fetched.
    pub async fn wait_for_background(&mut self) {
        while self.resolver.status().is_fetching() {
            let Some(completion) = self.resolver.next_completion().await else {
                break;
            };
            self.resolver.apply(completion, self.art.background());
        }
    }

    /// Consume the document, returning the composition.
    #[must_use]
    pub fn into_art(self) -> EmojiArt {
        self.art
    }
}

impl UndoTarget for EmojiArtDocument {
    fn restore(&mut self, snapshot: EmojiArt, label: &str, undo: &mut dyn UndoManager) {
        let replaced = std::mem::replace(&mut self.art, snapshot);
        let background_changed = replaced.background() != self.art.background();
        undo.register_undo(replaced);
        undo.set_action_name(label);
        if background_changed {
            self.resolver.background_changed(self.art.background());
        }
    }
}
