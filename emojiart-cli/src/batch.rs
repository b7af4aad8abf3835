//! Scripted edits.
//!
//! A batch file is a JSON array of [`EditCommand`]s, for example:
//!
//! ```json
//! [
//!   {"op": "add", "emoji": "😀", "x": 0, "y": 0, "size": 40},
//!   {"op": "move", "ids": [1], "dx": 10, "dy": -5},
//!   {"op": "undo"},
//!   {"op": "set_background", "background": {"url": "https://example.com/a.png"}}
//! ]
//! ```

use emojiart_core::palette::{emoji_clusters, is_emoji};
use emojiart_core::{Background, EmojiArtDocument, EmojiId, Selection, UndoStack};
use serde::{Deserialize, Serialize};

/// One scripted edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditCommand {
    /// Place an emoji.
    Add {
        /// The emoji.
        emoji: String,
        /// Horizontal offset from the center.
        #[serde(default)]
        x: i64,
        /// Vertical offset from the center.
        #[serde(default)]
        y: i64,
        /// Font size.
        size: u32,
    },
    /// Move emoji by an offset.
    Move {
        /// Emoji ids.
        ids: Vec<u64>,
        /// Horizontal offset.
        dx: i64,
        /// Vertical offset.
        dy: i64,
    },
    /// Scale emoji.
    Scale {
        /// Emoji ids.
        ids: Vec<u64>,
        /// Scale factor.
        factor: f64,
    },
    /// Remove emoji.
    Remove {
        /// Emoji ids.
        ids: Vec<u64>,
    },
    /// Replace the background.
    SetBackground {
        /// New background.
        background: Background,
    },
    /// Undo the last edit.
    Undo,
    /// Redo the last undone edit.
    Redo,
}

/// What happened when a command was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An edit ran; `added` holds the new id for `add`.
    Applied {
        /// Id assigned by an `add`.
        added: Option<EmojiId>,
    },
    /// Undo or redo ran the named action.
    Reverted(String),
    /// Nothing to undo or redo.
    Nothing,
    /// The command was skipped; holds the reason.
    Rejected(String),
}

/// Whether `text` is exactly one emoji grapheme.
#[must_use]
pub fn is_single_emoji(text: &str) -> bool {
    matches!(emoji_clusters(text).as_slice(), [cluster] if is_emoji(cluster))
}

fn selection(ids: &[u64]) -> Selection {
    ids.iter().copied().map(EmojiId::new).collect()
}

/// Apply `command` to `doc`, recording undo steps on `undo`.
pub fn apply(command: &EditCommand, doc: &mut EmojiArtDocument, undo: &mut UndoStack) -> Outcome {
    match command {
        EditCommand::Add { emoji, x, y, size } => {
            if !is_single_emoji(emoji) {
                return Outcome::Rejected(format!("{emoji:?} is not a single emoji"));
            }
            let id = doc.add_emoji(emoji, (*x, *y), *size, Some(undo));
            Outcome::Applied { added: Some(id) }
        }
        EditCommand::Move { ids, dx, dy } => {
            doc.move_emojis(&selection(ids), *dx, *dy, Some(undo));
            Outcome::Applied { added: None }
        }
        EditCommand::Scale { ids, factor } => {
            doc.scale_emojis(&selection(ids), *factor, Some(undo));
            Outcome::Applied { added: None }
        }
        EditCommand::Remove { ids } => {
            doc.remove_emojis(&selection(ids), Some(undo));
            Outcome::Applied { added: None }
        }
        EditCommand::SetBackground { background } => {
            doc.set_background(background.clone(), Some(undo));
            Outcome::Applied { added: None }
        }
        EditCommand::Undo => undo.undo(doc).map_or(Outcome::Nothing, Outcome::Reverted),
        EditCommand::Redo => undo.redo(doc).map_or(Outcome::Nothing, Outcome::Reverted),
    }
}

/// Apply every command in order.
pub fn apply_all(
    commands: &[EditCommand],
    doc: &mut EmojiArtDocument,
    undo: &mut UndoStack,
) -> Vec<Outcome> {
    commands
        .iter()
        .map(|command| {
            let outcome = apply(command, doc, undo);
            tracing::debug!(?command, ?outcome, "Applied batch command");
            outcome
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use emojiart_core::Position;
    use emojiart_fetch::{offline_resolver, RasterDecoder};

    fn document() -> EmojiArtDocument {
        EmojiArtDocument::new(offline_resolver(RasterDecoder::new()))
    }

    fn parse(json: &str) -> Vec<EditCommand> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        let commands = parse(
            r#"[
                {"op": "add", "emoji": "😀", "size": 40},
                {"op": "move", "ids": [1], "dx": 10, "dy": -5},
                {"op": "set_background", "background": "blank"},
                {"op": "undo"}
            ]"#,
        );
        assert_eq!(
            commands[0],
            EditCommand::Add {
                emoji: "😀".into(),
                x: 0,
                y: 0,
                size: 40
            }
        );
        assert_eq!(
            commands[2],
            EditCommand::SetBackground {
                background: Background::Blank
            }
        );
        assert_eq!(commands[3], EditCommand::Undo);
    }

    #[test]
    fn test_apply_with_undo_and_redo() {
        let commands = parse(
            r#"[
                {"op": "add", "emoji": "😀", "size": 40},
                {"op": "add", "emoji": "🐶", "x": 5, "y": 5, "size": 20},
                {"op": "move", "ids": [1, 2], "dx": 10, "dy": -5},
                {"op": "scale", "ids": [2], "factor": 2.0},
                {"op": "undo"},
                {"op": "redo"},
                {"op": "redo"}
            ]"#,
        );
        let mut doc = document();
        let mut undo = UndoStack::new();
        let outcomes = apply_all(&commands, &mut doc, &mut undo);

        assert_eq!(
            outcomes[0],
            Outcome::Applied {
                added: Some(EmojiId::new(1))
            }
        );
        assert_eq!(outcomes[4], Outcome::Reverted("Scale".into()));
        assert_eq!(outcomes[5], Outcome::Reverted("Scale".into()));
        assert_eq!(outcomes[6], Outcome::Nothing);

        let art = doc.art();
        assert_eq!(art.emoji(EmojiId::new(1)).unwrap().position(), Position::new(10, -5));
        assert_eq!(art.emoji(EmojiId::new(2)).unwrap().size, 40);
        assert_eq!(undo.undo_len(), 4);
    }

    #[test]
    fn test_remove_is_one_undo_step() {
        let commands = parse(
            r#"[
                {"op": "add", "emoji": "😀", "size": 40},
                {"op": "add", "emoji": "🐶", "size": 40},
                {"op": "remove", "ids": [1, 2, 99]},
                {"op": "undo"}
            ]"#,
        );
        let mut doc = document();
        let mut undo = UndoStack::new();
        apply_all(&commands, &mut doc, &mut undo);

        assert_eq!(doc.emojis().len(), 2);
        assert_eq!(undo.redo_label(), Some("Remove"));
    }

    #[test]
    fn test_add_rejects_non_emoji() {
        let commands = parse(
            r#"[
                {"op": "add", "emoji": "hello", "size": 40},
                {"op": "add", "emoji": "😀😀", "size": 40},
                {"op": "add", "emoji": "👍🏽", "size": 40}
            ]"#,
        );
        let mut doc = document();
        let mut undo = UndoStack::new();
        let outcomes = apply_all(&commands, &mut doc, &mut undo);

        assert!(matches!(&outcomes[0], Outcome::Rejected(r) if r.contains("hello")));
        assert!(matches!(outcomes[1], Outcome::Rejected(_)));
        assert_eq!(
            outcomes[2],
            Outcome::Applied {
                added: Some(EmojiId::new(1))
            }
        );
        assert_eq!(doc.emojis().len(), 1);
        assert_eq!(undo.undo_len(), 1);
    }
}
