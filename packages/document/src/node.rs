//! # Node Model
//!
//! Element and text node shapes.
//!
//! Elements are a closed set of kinds; marks are named boolean fields on
//! [`Text`]. The serialized shape matches the persisted document format:
//!
//! ```json
//! { "type": "paragraph", "align": "center", "children": [{ "text": "hi", "bold": true }] }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Structural kind of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Paragraph,
    HeadingOne,
    HeadingTwo,
    BlockQuote,
    BulletedList,
    NumberedList,
    ListItem,
    Image,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Paragraph => "paragraph",
            ElementKind::HeadingOne => "heading-one",
            ElementKind::HeadingTwo => "heading-two",
            ElementKind::BlockQuote => "block-quote",
            ElementKind::BulletedList => "bulleted-list",
            ElementKind::NumberedList => "numbered-list",
            ElementKind::ListItem => "list-item",
            ElementKind::Image => "image",
        }
    }

    /// Void kinds own a single empty text child that is never edited
    pub fn is_void(self) -> bool {
        matches!(self, ElementKind::Image)
    }

    /// List containers hold `list-item` children only
    pub fn is_list(self) -> bool {
        matches!(self, ElementKind::BulletedList | ElementKind::NumberedList)
    }

    /// Text blocks hold text leaves only
    pub fn is_text_block(self) -> bool {
        !self.is_void() && !self.is_list()
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "paragraph" => ElementKind::Paragraph,
            "heading-one" => ElementKind::HeadingOne,
            "heading-two" => ElementKind::HeadingTwo,
            "block-quote" => ElementKind::BlockQuote,
            "bulleted-list" => ElementKind::BulletedList,
            "numbered-list" => ElementKind::NumberedList,
            "list-item" => ElementKind::ListItem,
            "image" => ElementKind::Image,
            other => return Err(UnknownFormat(other.to_string())),
        })
    }
}

/// Horizontal text alignment of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
    Justify,
}

impl Align {
    pub fn as_str(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
            Align::Justify => "justify",
        }
    }
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Align {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "left" => Align::Left,
            "center" => Align::Center,
            "right" => Align::Right,
            "justify" => Align::Justify,
            other => return Err(UnknownFormat(other.to_string())),
        })
    }
}

/// A format identifier that does not name a known kind, alignment or mark
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown format: {0}")]
pub struct UnknownFormat(pub String);

/// Character-level formatting flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Code,
}

impl Mark {
    pub const ALL: [Mark; 4] = [Mark::Bold, Mark::Italic, Mark::Underline, Mark::Code];

    pub fn as_str(self) -> &'static str {
        match self {
            Mark::Bold => "bold",
            Mark::Italic => "italic",
            Mark::Underline => "underline",
            Mark::Code => "code",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mark {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bold" => Mark::Bold,
            "italic" => Mark::Italic,
            "underline" => Mark::Underline,
            "code" => Mark::Code,
            other => return Err(UnknownFormat(other.to_string())),
        })
    }
}

/// The full mark state of a leaf (or of the pending insertion format)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub code: bool,
}

impl Marks {
    pub fn get(&self, mark: Mark) -> bool {
        match mark {
            Mark::Bold => self.bold,
            Mark::Italic => self.italic,
            Mark::Underline => self.underline,
            Mark::Code => self.code,
        }
    }

    pub fn set(&mut self, mark: Mark, value: bool) {
        match mark {
            Mark::Bold => self.bold = value,
            Mark::Italic => self.italic = value,
            Mark::Underline => self.underline = value,
            Mark::Code => self.code = value,
        }
    }

    pub fn with(mut self, mark: Mark, value: bool) -> Self {
        self.set(mark, value);
        self
    }

    /// Marks that are switched on, in declaration order
    pub fn active(&self) -> impl Iterator<Item = Mark> + '_ {
        Mark::ALL.into_iter().filter(|m| self.get(*m))
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Text leaf
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub code: bool,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_marks(text: impl Into<String>, marks: Marks) -> Self {
        let mut leaf = Self::new(text);
        leaf.set_marks(marks);
        leaf
    }

    pub fn marks(&self) -> Marks {
        Marks {
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
            code: self.code,
        }
    }

    pub fn set_marks(&mut self, marks: Marks) {
        self.bold = marks.bold;
        self.italic = marks.italic;
        self.underline = marks.underline;
        self.code = marks.code;
    }

    /// Length in characters; point offsets count characters, not bytes
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte index of a character offset, clamped to the end of the text
    pub fn byte_index(&self, offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(offset)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }
}

/// Block element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub children: Vec<Node>,
}

impl Element {
    /// Element of `kind` holding a single empty leaf
    pub fn new(kind: ElementKind) -> Self {
        Self::with_children(kind, vec![Node::Text(Text::empty())])
    }

    pub fn with_children(kind: ElementKind, children: Vec<Node>) -> Self {
        Self {
            kind,
            align: None,
            url: None,
            children,
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::with_children(ElementKind::Paragraph, vec![Node::Text(Text::new(text))])
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::Image,
            align: None,
            url: Some(url.into()),
            children: vec![Node::Text(Text::empty())],
        }
    }

    pub fn aligned(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    pub fn is_void(&self) -> bool {
        self.kind.is_void()
    }

    /// Properties of this element without its children
    pub fn props(&self) -> ElementProps {
        ElementProps {
            kind: self.kind,
            align: self.align,
            url: self.url.clone(),
        }
    }

    /// Empty shell carrying the same properties
    pub fn shell(&self) -> Self {
        Self {
            kind: self.kind,
            align: self.align,
            url: self.url.clone(),
            children: Vec::new(),
        }
    }

    /// Concatenated text of all leaves below this element
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }
}

/// The properties an element carries besides its children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementProps {
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ElementProps {
    pub fn into_element(self, children: Vec<Node>) -> Element {
        Element {
            kind: self.kind,
            align: self.align,
            url: self.url,
            children,
        }
    }
}

/// A node in the document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Element(Element),
    Text(Text),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(Text::new(text))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Element(e) => Some(&e.children),
            Node::Text(_) => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Element(e) => Some(&mut e.children),
            Node::Text(_) => None,
        }
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(&t.text),
            Node::Element(e) => {
                for child in &e.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_serializes_slate_shape() {
        let element = Element::paragraph("hi").aligned(Align::Center);
        let json = serde_json::to_string(&element).unwrap();
        assert_eq!(
            json,
            r#"{"type":"paragraph","align":"center","children":[{"text":"hi"}]}"#
        );
    }

    #[test]
    fn test_untagged_node_picks_text_for_leaves() {
        let node: Node = serde_json::from_str(r#"{"text":"a","bold":true}"#).unwrap();
        let text = node.as_text().unwrap();
        assert!(text.bold);
        assert!(!text.italic);

        let node: Node =
            serde_json::from_str(r#"{"type":"image","url":"u","children":[{"text":""}]}"#).unwrap();
        assert!(node.as_element().unwrap().is_void());
    }

    #[test]
    fn test_kind_and_mark_identifiers() {
        assert_eq!("heading-one".parse::<ElementKind>().unwrap(), ElementKind::HeadingOne);
        assert_eq!(ElementKind::BlockQuote.to_string(), "block-quote");
        assert_eq!("underline".parse::<Mark>().unwrap(), Mark::Underline);
        assert!("strike".parse::<Mark>().is_err());
    }

    #[test]
    fn test_text_len_counts_chars() {
        let text = Text::new("héllo");
        assert_eq!(text.len(), 5);
        assert_eq!(text.byte_index(2), 3);
        assert_eq!(text.byte_index(10), text.text.len());
    }

    #[test]
    fn test_marks_roundtrip_through_text() {
        let marks = Marks::default().with(Mark::Bold, true).with(Mark::Code, true);
        let text = Text::with_marks("x", marks);
        assert_eq!(text.marks(), marks);
        assert_eq!(text.marks().active().collect::<Vec<_>>(), vec![Mark::Bold, Mark::Code]);
    }
}
