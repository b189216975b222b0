use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quire_document::{Document, Node};
use quire_editor::{DocumentStore, EditorConfig, FileStore};

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Print the persisted JSON instead of an outline
    #[arg(long)]
    pub json: bool,
}

pub fn show(args: ShowArgs, cwd: &std::path::Path, config: &EditorConfig) -> Result<()> {
    let storage_path = config.get_storage_path(cwd);
    let Some(document) = FileStore::new(&storage_path).load()? else {
        println!(
            "{} No document at {}",
            "⚠️".yellow(),
            storage_path.display().to_string().bright_white()
        );
        println!("Run: quire init");
        return Ok(());
    };

    if args.json {
        println!("{}", document.to_json_pretty()?);
        return Ok(());
    }

    println!("📄 {}", storage_path.display().to_string().bright_blue().bold());
    println!();
    for line in outline(&document) {
        println!("{}", line);
    }
    Ok(())
}

/// One line per element, indented by depth, with leaf text and marks
fn outline(document: &Document) -> Vec<String> {
    let mut lines = Vec::new();
    for (index, node) in document.children().iter().enumerate() {
        outline_node(node, &index.to_string(), 0, &mut lines);
    }
    lines
}

fn outline_node(node: &Node, label: &str, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    match node {
        Node::Element(element) => {
            let mut line = format!("{}{} {}", indent, label.dimmed(), element.kind.to_string().cyan());
            if let Some(align) = element.align {
                line.push_str(&format!(" ({})", align));
            }
            if let Some(url) = &element.url {
                line.push_str(&format!(" {}", preview(url, 48).underline()));
            }
            lines.push(line);

            if element.is_void() {
                return;
            }
            for (i, child) in element.children.iter().enumerate() {
                outline_node(child, &format!("{}.{}", label, i), depth + 1, lines);
            }
        }
        Node::Text(text) => {
            let marks: Vec<String> = text.marks().active().map(|m| m.to_string()).collect();
            let mut line = format!("{}{} {:?}", indent, label.dimmed(), text.text);
            if !marks.is_empty() {
                line.push_str(&format!(" [{}]", marks.join(", ")).yellow().to_string());
            }
            lines.push(line);
        }
    }
}

fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max).collect();
    format!("{}…", head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_document::{Element, ElementKind, Mark, Marks, Text};

    #[test]
    fn test_outline_lists_blocks_and_marks() {
        colored::control::set_override(false);
        let document = Document::new(vec![
            Element::paragraph("plain"),
            Element::with_children(
                ElementKind::BulletedList,
                vec![Element::with_children(
                    ElementKind::ListItem,
                    vec![Text::with_marks("item", Marks::default().with(Mark::Bold, true)).into()],
                )
                .into()],
            ),
            Element::image("https://x/y.png"),
        ]);

        assert_eq!(
            outline(&document),
            vec![
                "0 paragraph".to_string(),
                "  0.0 \"plain\"".to_string(),
                "1 bulleted-list".to_string(),
                "  1.0 list-item".to_string(),
                "    1.0.0 \"item\" [bold]".to_string(),
                "2 image https://x/y.png".to_string(),
            ]
        );
    }

    #[test]
    fn test_preview_truncates_long_urls() {
        assert_eq!(preview("abcdef", 3), "abc…");
        assert_eq!(preview("abc", 3), "abc");
    }
}
