//! Points and ranges over leaves.

use crate::path::Path;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A character offset inside the leaf at `path`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }

    pub fn is_before(&self, other: &Point) -> bool {
        self < other
    }

    pub fn is_after(&self, other: &Point) -> bool {
        self > other
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Document order; points always address leaves so paths never nest
impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path
            .cmp(&other.path)
            .then(self.offset.cmp(&other.offset))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.offset)
    }
}

/// Error parsing a `path:offset` point
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid point '{0}', expected <path>:<offset> such as 0.0:3")]
pub struct InvalidPoint(pub String);

impl FromStr for Point {
    type Err = InvalidPoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, offset) = s.rsplit_once(':').ok_or_else(|| InvalidPoint(s.to_string()))?;
        let path = path.parse::<Path>().map_err(|_| InvalidPoint(s.to_string()))?;
        let offset = offset
            .trim()
            .parse::<usize>()
            .map_err(|_| InvalidPoint(s.to_string()))?;
        Ok(Point { path, offset })
    }
}

/// Directed selection; `anchor == focus` is a collapsed cursor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub anchor: Point,
    pub focus: Point,
}

impl Range {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    /// Anchor after focus
    pub fn is_backward(&self) -> bool {
        self.anchor.is_after(&self.focus)
    }

    /// `(start, end)` in document order
    pub fn edges(&self) -> (&Point, &Point) {
        if self.is_backward() {
            (&self.focus, &self.anchor)
        } else {
            (&self.anchor, &self.focus)
        }
    }

    pub fn start(&self) -> &Point {
        self.edges().0
    }

    pub fn end(&self) -> &Point {
        self.edges().1
    }

    /// Same range with direction preserved and both edges replaced
    pub fn with_edges(&self, start: Point, end: Point) -> Range {
        if self.is_backward() {
            Range::new(end, start)
        } else {
            Range::new(start, end)
        }
    }

    pub fn points(&self) -> [&Point; 2] {
        [&self.anchor, &self.focus]
    }

    pub fn points_mut(&mut self) -> [&mut Point; 2] {
        [&mut self.anchor, &mut self.focus]
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_collapsed() {
            write!(f, "{}", self.anchor)
        } else {
            write!(f, "{}..{}", self.anchor, self.focus)
        }
    }
}
