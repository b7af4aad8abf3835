//! # EmojiArt CLI
//!
//! Command-line host for EmojiArt documents.
//!
//! ## Usage
//!
//! ```bash
//! emojiart new art.json
//! emojiart add art.json 😀 --x 10 --y -5 --size 40
//! emojiart background art.json --url https://example.com/beach.png
//! emojiart resolve art.json
//! emojiart batch art.json edits.json
//! emojiart palettes list
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Data directory, palette store name and fetch settings
//! - `commands` - Executes one subcommand against a document file
//! - `batch` - JSON edit scripts applied through an `UndoStack`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

pub mod batch;
pub mod commands;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use url::Url;

pub use batch::EditCommand;
pub use commands::run;

/// Default data directory for palettes.
pub const DEFAULT_DATA_DIR: &str = ".emojiart";

/// Default palette store name.
pub const DEFAULT_PALETTE_STORE: &str = "Main";

/// Command-line arguments for emojiart.
#[derive(Debug, Clone, Parser)]
#[command(name = "emojiart")]
#[command(about = "Compose emoji on a background, with undo")]
#[command(version)]
pub struct CliArgs {
    /// Directory holding palette data
    #[arg(long, env = "EMOJIART_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Name of the palette store to use
    #[arg(long, env = "EMOJIART_PALETTE_STORE", default_value = DEFAULT_PALETTE_STORE)]
    pub palette_store: String,

    /// Timeout for background fetches, in seconds
    #[arg(long, env = "EMOJIART_FETCH_TIMEOUT", default_value = "30")]
    pub fetch_timeout_secs: u64,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create an empty document
    New {
        /// Document file
        file: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print a document
    Show {
        /// Document file
        file: PathBuf,
        /// Print the raw JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Place an emoji
    Add {
        /// Document file
        file: PathBuf,
        /// The emoji to place
        emoji: String,
        /// Horizontal offset from the center
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        x: i64,
        /// Vertical offset from the center
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        y: i64,
        /// Font size
        #[arg(long, default_value = "40")]
        size: u32,
    },
    /// Move emoji by an offset
    Move {
        /// Document file
        file: PathBuf,
        /// Horizontal offset
        #[arg(allow_negative_numbers = true)]
        dx: i64,
        /// Vertical offset
        #[arg(allow_negative_numbers = true)]
        dy: i64,
        /// Emoji ids
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Scale emoji by a factor
    Scale {
        /// Document file
        file: PathBuf,
        /// Scale factor
        factor: f64,
        /// Emoji ids
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Remove emoji
    Remove {
        /// Document file
        file: PathBuf,
        /// Emoji ids
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Replace the background
    Background {
        /// Document file
        file: PathBuf,
        /// New background
        #[command(flatten)]
        source: BackgroundSource,
    },
    /// Apply a JSON list of edits (with undo/redo) to a document
    Batch {
        /// Document file
        file: PathBuf,
        /// JSON file holding the edit commands
        commands: PathBuf,
    },
    /// Resolve the background and report the result
    Resolve {
        /// Document file
        file: PathBuf,
    },
    /// Manage emoji palettes
    Palettes {
        /// Palette action
        #[command(subcommand)]
        action: PaletteCommand,
    },
}

/// Where a new background comes from.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct BackgroundSource {
    /// Reference an image by URL (http, https, file or data)
    #[arg(long)]
    pub url: Option<Url>,
    /// Embed the bytes of a local image
    #[arg(long)]
    pub image: Option<PathBuf>,
    /// Clear the background
    #[arg(long)]
    pub blank: bool,
}

/// Palette subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum PaletteCommand {
    /// List all palettes
    List,
    /// Insert a new palette
    Insert {
        /// Palette name
        name: String,
        /// Initial emoji
        #[arg(long)]
        emojis: Option<String>,
        /// Position to insert at
        #[arg(long, default_value = "0")]
        index: usize,
    },
    /// Add emoji to a palette
    Add {
        /// Palette index
        index: usize,
        /// Emoji to add
        emojis: String,
    },
    /// Remove one emoji from a palette
    RemoveEmoji {
        /// Palette index
        index: usize,
        /// Emoji to remove
        emoji: String,
    },
    /// Remove a palette
    Remove {
        /// Palette index
        index: usize,
    },
    /// Rename a palette
    Rename {
        /// Palette index
        index: usize,
        /// New name
        name: String,
    },
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Directory holding palette data.
    pub data_dir: PathBuf,
    /// Palette store name.
    pub palette_store: String,
    /// Timeout for background fetches.
    pub fetch_timeout: Duration,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CliConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            palette_store: DEFAULT_PALETTE_STORE.to_string(),
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            data_dir: args.data_dir.clone(),
            palette_store: args.palette_store.clone(),
            fetch_timeout: Duration::from_secs(args.fetch_timeout_secs),
        }
    }
}
