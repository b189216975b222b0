use crate::script::{guess_mime, parse_script, ScriptCommand};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use quire_editor::{
    BackgroundStore, Change, Editor, EditorConfig, EditorResult, ExternalContent, FilePayload,
    FileStore,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Script file, one command per line
    pub script: PathBuf,

    /// Print the operations each command applied
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Default)]
struct Summary {
    commands: usize,
    operations: usize,
    tree_changes: usize,
    images_decoded: usize,
}

impl Summary {
    fn record(&mut self, change: &Change) {
        self.operations += change.operations.len();
        if change.tree_changed {
            self.tree_changes += 1;
        }
    }
}

pub async fn run(args: RunArgs, cwd: &Path, config: &EditorConfig) -> Result<()> {
    let source = fs::read_to_string(&args.script)
        .with_context(|| format!("Cannot read script {}", args.script.display()))?;
    let commands = parse_script(&source)?;
    info!(script = %args.script.display(), commands = commands.len(), "running script");

    println!("▶️  {} {}", "Running".green().bold(), args.script.display());
    println!();

    let storage_path = config.get_storage_path(cwd);
    let store = Arc::new(BackgroundStore::spawn(FileStore::new(&storage_path)));
    let mut editor = Editor::load(Arc::clone(&store), config);
    let base = args.script.parent().unwrap_or(cwd);

    let mut summary = Summary::default();
    let result = apply_all(&mut editor, &commands, base, args.verbose, &mut summary).await;

    // Saves already queued stay valid even when a later line fails
    store.flush().await;
    result?;

    println!();
    println!("✨ {} Script applied!", "Done".green().bold());
    println!("   Commands:      {}", summary.commands);
    println!("   Operations:    {}", summary.operations);
    println!("   Tree changes:  {}", summary.tree_changes);
    if summary.images_decoded > 0 {
        println!("   Images:        {}", summary.images_decoded);
    }
    println!("   Blocks:        {}", editor.document().children().len());
    println!("   Saved to:      {}", storage_path.display());

    Ok(())
}

async fn apply_all(
    editor: &mut Editor,
    commands: &[(usize, ScriptCommand)],
    base: &Path,
    verbose: bool,
    summary: &mut Summary,
) -> Result<()> {
    for (line, command) in commands {
        let change = apply(editor, command, base)
            .with_context(|| format!("line {}: {} failed", line, command.name()))?;

        println!(
            "   {} {:<13} {} ops",
            "✓".green(),
            command.name(),
            change.operations.len()
        );
        if verbose {
            for op in &change.operations {
                println!("       {}", op.name().dimmed());
            }
        }
        summary.commands += 1;
        summary.record(&change);
    }

    if editor.pending_decodes() > 0 {
        println!("   {} waiting for {} image decodes", "…".yellow(), editor.pending_decodes());
    }
    for change in editor.settle_decodes().await? {
        if change.tree_changed {
            summary.images_decoded += 1;
        }
        summary.record(&change);
    }
    Ok(())
}

fn apply(editor: &mut Editor, command: &ScriptCommand, base: &Path) -> Result<Change> {
    let change: EditorResult<Change> = match command {
        ScriptCommand::Select(range) => editor.select(range.clone()),
        ScriptCommand::Deselect => editor.deselect(),
        ScriptCommand::ToggleMark(mark) => editor.toggle_mark(*mark),
        ScriptCommand::ToggleBlock(format) => editor.toggle_block(*format),
        ScriptCommand::InsertImage(url) => editor.insert_image(url),
        ScriptCommand::Paste(text) => editor.insert_from_external_content(ExternalContent::text(text)),
        ScriptCommand::PasteFile(path) => {
            let path = base.join(path);
            let bytes = fs::read(&path)
                .with_context(|| format!("Cannot read {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let file = FilePayload::new(name, guess_mime(&path), bytes);
            editor.insert_from_external_content(ExternalContent::files(vec![file]))
        }
        ScriptCommand::Type(text) => editor.insert_text(text),
        ScriptCommand::Break => editor.insert_break(),
        ScriptCommand::Delete => editor.delete_fragment(),
    };
    Ok(change?)
}
