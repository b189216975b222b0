//! Block format identifiers accepted by `toggle_block`.

use quire_document::{Align, Element, ElementKind, UnknownFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A structural kind or an alignment value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockFormat {
    HeadingOne,
    HeadingTwo,
    BlockQuote,
    NumberedList,
    BulletedList,
    Left,
    Center,
    Right,
    Justify,
}

/// What a [`BlockFormat`] changes on a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTarget {
    Kind(ElementKind),
    Align(Align),
}

impl BlockFormat {
    pub const ALL: [BlockFormat; 9] = [
        BlockFormat::HeadingOne,
        BlockFormat::HeadingTwo,
        BlockFormat::BlockQuote,
        BlockFormat::NumberedList,
        BlockFormat::BulletedList,
        BlockFormat::Left,
        BlockFormat::Center,
        BlockFormat::Right,
        BlockFormat::Justify,
    ];

    /// The attribute this format sets and the value it sets it to
    pub fn target(self) -> BlockTarget {
        match self {
            BlockFormat::HeadingOne => BlockTarget::Kind(ElementKind::HeadingOne),
            BlockFormat::HeadingTwo => BlockTarget::Kind(ElementKind::HeadingTwo),
            BlockFormat::BlockQuote => BlockTarget::Kind(ElementKind::BlockQuote),
            BlockFormat::NumberedList => BlockTarget::Kind(ElementKind::NumberedList),
            BlockFormat::BulletedList => BlockTarget::Kind(ElementKind::BulletedList),
            BlockFormat::Left => BlockTarget::Align(Align::Left),
            BlockFormat::Center => BlockTarget::Align(Align::Center),
            BlockFormat::Right => BlockTarget::Align(Align::Right),
            BlockFormat::Justify => BlockTarget::Align(Align::Justify),
        }
    }

    /// Alignment value, for the four alignment formats
    pub fn align(self) -> Option<Align> {
        match self.target() {
            BlockTarget::Align(align) => Some(align),
            BlockTarget::Kind(_) => None,
        }
    }

    pub fn is_align(self) -> bool {
        self.align().is_some()
    }

    /// Structural kind, for the non-alignment formats
    pub fn kind(self) -> Option<ElementKind> {
        match self.target() {
            BlockTarget::Kind(kind) => Some(kind),
            BlockTarget::Align(_) => None,
        }
    }

    pub fn is_list(self) -> bool {
        self.kind().map(ElementKind::is_list).unwrap_or(false)
    }

    /// Whether `element` carries this format on the attribute it governs
    pub fn matches(self, element: &Element) -> bool {
        match self.target() {
            BlockTarget::Align(align) => element.align == Some(align),
            BlockTarget::Kind(kind) => element.kind == kind,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BlockFormat::HeadingOne => "heading-one",
            BlockFormat::HeadingTwo => "heading-two",
            BlockFormat::BlockQuote => "block-quote",
            BlockFormat::NumberedList => "numbered-list",
            BlockFormat::BulletedList => "bulleted-list",
            BlockFormat::Left => "left",
            BlockFormat::Center => "center",
            BlockFormat::Right => "right",
            BlockFormat::Justify => "justify",
        }
    }
}

impl fmt::Display for BlockFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_format_has_one_target() {
        for format in BlockFormat::ALL {
            assert_ne!(format.kind().is_some(), format.align().is_some(), "{}", format);
        }
        assert_eq!(BlockFormat::Center.target(), BlockTarget::Align(Align::Center));
        assert_eq!(
            BlockFormat::BulletedList.target(),
            BlockTarget::Kind(ElementKind::BulletedList)
        );
    }

    #[test]
    fn test_identifiers_roundtrip() {
        for format in BlockFormat::ALL {
            assert_eq!(format.as_str().parse::<BlockFormat>().unwrap(), format);
        }
        assert!("paragraph".parse::<BlockFormat>().is_err());
    }

    #[test]
    fn test_alignment_and_kind_axes_are_disjoint() {
        for format in BlockFormat::ALL {
            assert!(format.align().is_some() != format.kind().is_some());
        }
        assert!(BlockFormat::Center.is_align());
        assert!(BlockFormat::NumberedList.is_list());
        assert!(!BlockFormat::HeadingOne.is_list());
    }

    #[test]
    fn test_matches_uses_governed_attribute() {
        let centered = Element::paragraph("x").aligned(Align::Center);
        assert!(BlockFormat::Center.matches(&centered));
        assert!(!BlockFormat::Left.matches(&centered));
        assert!(!BlockFormat::HeadingOne.matches(&centered));
    }
}
