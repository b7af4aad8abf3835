//! Subcommand execution.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use emojiart_core::{
    Background, EmojiArt, EmojiArtDocument, EmojiId, FetchStatus, FileKeyValueStore,
    PaletteStore, Selection, UndoStack,
};
use emojiart_fetch::{FetchConfig, RasterDecoder};

use crate::batch::{self, is_single_emoji, EditCommand, Outcome};
use crate::{BackgroundSource, CliConfig, Command, PaletteCommand};

/// Execute `command`, writing human-readable output to `out`.
///
/// # Errors
///
/// Returns an error if a file cannot be read or written, an argument is
/// invalid, or (for `resolve`) the background cannot be resolved.
pub async fn run(config: &CliConfig, command: Command, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        Command::New { file, force } => {
            if file.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", file.display());
            }
            save_art(&file, &EmojiArt::new())?;
            writeln!(out, "created {}", file.display())?;
        }
        Command::Show { file, json } => {
            let art = load_art(&file)?;
            if json {
                writeln!(out, "{}", art.to_json()?)?;
            } else {
                describe(&art, out)?;
            }
        }
        Command::Add {
            file,
            emoji,
            x,
            y,
            size,
        } => {
            if !is_single_emoji(&emoji) {
                bail!("{emoji:?} is not a single emoji");
            }
            let mut doc = edit_document(&file)?;
            let id = doc.add_emoji(&emoji, (x, y), size, None);
            save_art(&file, doc.art())?;
            writeln!(out, "added #{id}")?;
        }
        Command::Move { file, dx, dy, ids } => {
            let mut doc = edit_document(&file)?;
            doc.move_emojis(&selection(&doc, &ids, out)?, dx, dy, None);
            save_art(&file, doc.art())?;
        }
        Command::Scale { file, factor, ids } => {
            if !factor.is_finite() || factor <= 0.0 {
                bail!("scale factor must be positive, got {factor}");
            }
            let mut doc = edit_document(&file)?;
            doc.scale_emojis(&selection(&doc, &ids, out)?, factor, None);
            save_art(&file, doc.art())?;
        }
        Command::Remove { file, ids } => {
            let mut doc = edit_document(&file)?;
            doc.remove_emojis(&selection(&doc, &ids, out)?, None);
            save_art(&file, doc.art())?;
        }
        Command::Background { file, source } => {
            let background = background_from(source)?;
            let mut doc = open_document(config, &file)?;
            doc.set_background(background, None);
            if let Some(e) = doc.background_error() {
                writeln!(out, "warning: {e}")?;
            }
            save_art(&file, doc.art())?;
            writeln!(out, "background: {}", doc.background().describe())?;
        }
        Command::Batch { file, commands } => run_batch(&file, &commands, out)?,
        Command::Resolve { file } => {
            let mut doc = open_document(config, &file)?;
            doc.wait_for_background().await;
            report_background(&doc, out)?;
        }
        Command::Palettes { action } => palettes(config, action, out)?,
    }
    Ok(())
}

fn run_batch(
    file: &Path,
    script: &Path,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(script)
        .with_context(|| format!("reading {}", script.display()))?;
    let commands: Vec<EditCommand> =
        serde_json::from_str(&json).with_context(|| format!("parsing {}", script.display()))?;

    let mut doc = edit_document(file)?;
    let mut undo = UndoStack::new();
    for outcome in batch::apply_all(&commands, &mut doc, &mut undo) {
        match outcome {
            Outcome::Applied { added: Some(id) } => writeln!(out, "added #{id}")?,
            Outcome::Applied { added: None } => {}
            Outcome::Reverted(label) => writeln!(out, "reverted {label}")?,
            Outcome::Nothing => writeln!(out, "nothing to revert")?,
            Outcome::Rejected(reason) => writeln!(out, "skipping {reason}")?,
        }
    }
    save_art(file, doc.art())?;
    writeln!(
        out,
        "applied {} commands ({} undoable)",
        commands.len(),
        undo.undo_len()
    )?;
    Ok(())
}

/// Read a document file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid document.
pub fn load_art(path: &Path) -> anyhow::Result<EmojiArt> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let art = EmojiArt::from_bytes(&bytes).with_context(|| format!("loading {}", path.display()))?;
    tracing::info!(path = %path.display(), emojis = art.len(), "Loaded document");
    Ok(art)
}

/// Write a document file.
///
/// # Errors
///
/// Returns an error if the document cannot be encoded or written.
pub fn save_art(path: &Path, art: &EmojiArt) -> anyhow::Result<()> {
    let bytes = art.to_bytes()?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), emojis = art.len(), "Saved document");
    Ok(())
}

/// Open a document whose background is resolved over the network.
fn open_document(config: &CliConfig, path: &Path) -> anyhow::Result<EmojiArtDocument> {
    let art = load_art(path)?;
    let fetch = FetchConfig {
        timeout: config.fetch_timeout,
        ..FetchConfig::default()
    };
    let resolver = emojiart_fetch::resolver(fetch, RasterDecoder::new())?;
    Ok(EmojiArtDocument::with_art(art, resolver))
}

/// Open a document for edits that never look at the background image.
fn edit_document(path: &Path) -> anyhow::Result<EmojiArtDocument> {
    let art = load_art(path)?;
    Ok(EmojiArtDocument::with_art(
        art,
        emojiart_fetch::offline_resolver(RasterDecoder::new()),
    ))
}

fn selection(doc: &EmojiArtDocument, ids: &[u64], out: &mut dyn Write) -> anyhow::Result<Selection> {
    let mut selection = Selection::new();
    for &raw in ids {
        let id = EmojiId::new(raw);
        if doc.art().emoji(id).is_some() {
            selection.select(id);
        } else {
            writeln!(out, "skipping unknown emoji #{id}")?;
        }
    }
    Ok(selection)
}

fn background_from(source: BackgroundSource) -> anyhow::Result<Background> {
    match source {
        BackgroundSource { url: Some(url), .. } => Ok(Background::Url(url)),
        BackgroundSource {
            image: Some(path), ..
        } => {
            let bytes =
                std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            Ok(Background::ImageData(bytes))
        }
        BackgroundSource { blank: true, .. } => Ok(Background::Blank),
        BackgroundSource { .. } => bail!("one of --url, --image or --blank is required"),
    }
}

fn describe(art: &EmojiArt, out: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(out, "background: {}", art.background().describe())?;
    writeln!(out, "emoji_id_counter: {}", art.emoji_id_counter())?;
    for emoji in art.emojis() {
        writeln!(
            out,
            "#{} {} at ({}, {}) size {}",
            emoji.id, emoji.text, emoji.x, emoji.y, emoji.size
        )?;
    }
    Ok(())
}

fn report_background(doc: &EmojiArtDocument, out: &mut dyn Write) -> anyhow::Result<()> {
    if let Some(image) = doc.background_image() {
        writeln!(
            out,
            "background resolved: {}x{}",
            image.width(),
            image.height()
        )?;
        return Ok(());
    }
    if doc.background().is_blank() {
        writeln!(out, "background: blank")?;
        return Ok(());
    }

    let reason = doc
        .background_error()
        .map_or_else(|| "unknown error".to_string(), ToString::to_string);
    match doc.fetch_status() {
        FetchStatus::Failed(url) => bail!("background {url} could not be resolved: {reason}"),
        _ => bail!("background could not be resolved: {reason}"),
    }
}

fn palettes(config: &CliConfig, action: PaletteCommand, out: &mut dyn Write) -> anyhow::Result<()> {
    let kv = FileKeyValueStore::with_data_dir(&config.data_dir)
        .with_context(|| format!("opening {}", config.data_dir.display()))?;
    let mut store = PaletteStore::load(config.palette_store.clone(), Arc::new(kv))?;

    match action {
        PaletteCommand::List => {
            for (index, palette) in store.palettes().iter().enumerate() {
                writeln!(out, "{index}: {} {}", palette.name, palette.emojis)?;
            }
            return Ok(());
        }
        PaletteCommand::Insert {
            name,
            emojis,
            index,
        } => {
            let id = store.insert_palette(name, emojis.as_deref(), index);
            writeln!(out, "inserted palette {id}")?;
        }
        PaletteCommand::Add { index, emojis } => {
            if !store.add_emojis(index, &emojis) {
                bail!("no palette at index {index}");
            }
        }
        PaletteCommand::RemoveEmoji { index, emoji } => {
            if !store.remove_emoji(index, &emoji) {
                bail!("no palette at index {index}");
            }
        }
        PaletteCommand::Remove { index } => {
            let next = store.remove_palette(index);
            writeln!(out, "showing palette {next}")?;
        }
        PaletteCommand::Rename { index, name } => {
            if !store.rename_palette(index, name) {
                bail!("no palette at index {index}");
            }
        }
    }
    store.save()?;
    Ok(())
}
