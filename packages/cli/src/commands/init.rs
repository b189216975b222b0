use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quire_document::Document;
use quire_editor::{DocumentStore, EditorConfig, FileStore, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Image URL to seed after the empty paragraph
    #[arg(long)]
    pub sample_image: Option<String>,

    /// Where to persist the document, relative to the project directory
    #[arg(short, long)]
    pub storage_path: Option<String>,

    /// Force overwrite existing config and document
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path, config: &EditorConfig) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Quire document...".bright_blue().bold());

    let mut config = config.clone();
    if let Some(url) = args.sample_image {
        quire_editor::validate_image_url(&url)?;
        config.sample_image = Some(url);
    }
    if let Some(path) = args.storage_path {
        config.storage_path = path.into();
    }

    fs::create_dir_all(cwd)?;
    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    let storage_path = config.get_storage_path(cwd);
    let document = Document::default_document(config.sample_image.as_deref());
    FileStore::new(&storage_path).save(&document)?;
    println!(
        "  {} Created {}",
        "✓".green(),
        config.storage_path.display()
    );

    println!();
    println!("{}", "✅ Document initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Write a script, one command per line (select 0.0:0, type Hello, ...)");
    println!("  2. Run: quire run <script>");
    println!("  3. Inspect: quire show");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_config_and_document() {
        let temp = TempDir::new().unwrap();
        let args = InitArgs {
            sample_image: Some("https://x/y.png".into()),
            storage_path: Some("docs/main.json".into()),
            force: false,
        };
        init(args, temp.path(), &EditorConfig::default()).unwrap();

        let config = EditorConfig::load(temp.path()).unwrap();
        assert_eq!(config.sample_image.as_deref(), Some("https://x/y.png"));

        let stored = FileStore::new(temp.path().join("docs/main.json"))
            .load()
            .unwrap()
            .unwrap();
        assert_eq!(stored, Document::default_document(Some("https://x/y.png")));
    }

    #[test]
    fn test_init_rejects_non_image_sample() {
        let temp = TempDir::new().unwrap();
        let args = InitArgs {
            sample_image: Some("https://x/page".into()),
            storage_path: None,
            force: false,
        };
        assert!(init(args, temp.path(), &EditorConfig::default()).is_err());
        assert!(!temp.path().join(DEFAULT_CONFIG_NAME).exists());
    }
}
