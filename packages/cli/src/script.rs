//! Command scripts for `quire run`
//!
//! One command per line; blank lines and `#` comments are skipped.
//!
//! ```text
//! select 0.0:0 0.0:5        # anchor [focus]
//! toggle-mark bold
//! toggle-block heading-one
//! insert-image https://example.com/photo.png
//! paste first line\nsecond line
//! paste-file ./diagram.png
//! type Hello
//! break
//! delete
//! deselect
//! ```

use quire_document::{InvalidPoint, Mark, Point, Range, UnknownFormat};
use quire_editor::BlockFormat;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: unknown command '{command}'")]
    UnknownCommand { line: usize, command: String },

    #[error("line {line}: '{command}' needs an argument")]
    MissingArgument { line: usize, command: String },

    #[error("line {line}: {source}")]
    Point {
        line: usize,
        #[source]
        source: InvalidPoint,
    },

    #[error("line {line}: {source}")]
    Format {
        line: usize,
        #[source]
        source: UnknownFormat,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    Select(Range),
    Deselect,
    ToggleMark(Mark),
    ToggleBlock(BlockFormat),
    InsertImage(String),
    Paste(String),
    PasteFile(PathBuf),
    Type(String),
    Break,
    Delete,
}

impl ScriptCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptCommand::Select(_) => "select",
            ScriptCommand::Deselect => "deselect",
            ScriptCommand::ToggleMark(_) => "toggle-mark",
            ScriptCommand::ToggleBlock(_) => "toggle-block",
            ScriptCommand::InsertImage(_) => "insert-image",
            ScriptCommand::Paste(_) => "paste",
            ScriptCommand::PasteFile(_) => "paste-file",
            ScriptCommand::Type(_) => "type",
            ScriptCommand::Break => "break",
            ScriptCommand::Delete => "delete",
        }
    }
}

/// Parse a whole script into `(line number, command)` pairs
pub fn parse_script(source: &str) -> Result<Vec<(usize, ScriptCommand)>, ScriptError> {
    let mut commands = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        if let Some(command) = parse_line(raw, line)? {
            commands.push((line, command));
        }
    }
    Ok(commands)
}

pub fn parse_line(raw: &str, line: usize) -> Result<Option<ScriptCommand>, ScriptError> {
    let trimmed = raw.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest),
        None => (trimmed, ""),
    };
    let argument = || -> Result<&str, ScriptError> {
        let argument = rest.trim();
        if argument.is_empty() {
            Err(ScriptError::MissingArgument {
                line,
                command: command.to_string(),
            })
        } else {
            Ok(argument)
        }
    };
    let point = |s: &str| s.parse::<Point>().map_err(|source| ScriptError::Point { line, source });

    let parsed = match command {
        "select" => {
            let mut points = argument()?.split_whitespace();
            let anchor = point(points.next().unwrap_or_default())?;
            let focus = match points.next() {
                Some(focus) => point(focus)?,
                None => anchor.clone(),
            };
            ScriptCommand::Select(Range::new(anchor, focus))
        }
        "deselect" => ScriptCommand::Deselect,
        "toggle-mark" => ScriptCommand::ToggleMark(
            argument()?
                .parse()
                .map_err(|source| ScriptError::Format { line, source })?,
        ),
        "toggle-block" => ScriptCommand::ToggleBlock(
            argument()?
                .parse()
                .map_err(|source| ScriptError::Format { line, source })?,
        ),
        "insert-image" => ScriptCommand::InsertImage(argument()?.to_string()),
        // Text arguments keep their spacing after the first separator
        "paste" => ScriptCommand::Paste(unescape(rest)),
        "paste-file" => ScriptCommand::PasteFile(PathBuf::from(argument()?)),
        "type" => {
            argument()?;
            ScriptCommand::Type(unescape(rest))
        }
        "break" => ScriptCommand::Break,
        "delete" => ScriptCommand::Delete,
        other => {
            return Err(ScriptError::UnknownCommand {
                line,
                command: other.to_string(),
            })
        }
    };
    Ok(Some(parsed))
}

/// Media type for a pasted file, guessed from its extension
pub fn guess_mime(path: &std::path::Path) -> String {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "tif" | "tiff" => "image/tiff",
        "avif" => "image/avif",
        "heic" => "image/heic",
        "txt" | "md" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    };
    mime.to_string()
}

/// `\n`, `\t` and `\\` escapes
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
