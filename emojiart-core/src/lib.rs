//! # EmojiArt Core
//!
//! Toolkit-independent core of the EmojiArt canvas editor: place emoji on a
//! background, move and scale them, undo and redo every change, and persist
//! the result.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  EmojiArtDocument                    │
//! │   intents ──▶ snapshot ──▶ UndoManager (host)        │
//! ├──────────────────────────┬───────────────────────────┤
//! │  EmojiArt (model)        │  BackgroundResolver       │
//! │  - Background            │  - Idle/Fetching/Failed   │
//! │  - Emoji + id counter    │  - ImageFetcher (host)    │
//! │  - to_bytes/from_bytes   │  - ImageDecoder (host)    │
//! ├──────────────────────────┴───────────────────────────┤
//! │  Selection   │  PaletteStore ──▶ KeyValueStore (host) │
//! └──────────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod background;
pub mod document;
pub mod emoji;
pub mod error;
pub mod kv;
pub mod model;
pub mod palette;
pub mod resolver;
pub mod selection;
pub mod undo;

pub use background::Background;
pub use document::EmojiArtDocument;
pub use emoji::{Emoji, EmojiId, Position};
pub use error::{EmojiArtError, EmojiArtResult, ResolveError};
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StoreError};
pub use model::EmojiArt;
pub use palette::{Palette, PaletteStore};
pub use resolver::{
    BackgroundResolver, DecodedImage, FetchCompletion, FetchStatus, ImageDecoder, ImageFetcher,
};
pub use selection::Selection;
pub use undo::{UndoEntry, UndoManager, UndoStack, UndoTarget};

/// EmojiArt core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
