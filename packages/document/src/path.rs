//! Child-index paths from the document root.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Descending child indices identifying a node; empty addresses the document
///
/// `Ord` is plain lexicographic order (an ancestor sorts before its
/// descendants). [`Path::compare`] treats ancestors and descendants as equal,
/// which is what range intersection needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Index within the parent; `None` for the root
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn child(&self, index: usize) -> Path {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Following sibling (the root is its own sibling)
    pub fn next(&self) -> Path {
        self.with_last(|i| i + 1)
    }

    pub fn previous(&self) -> Option<Path> {
        match self.last() {
            Some(i) if i > 0 => Some(self.with_last(|i| i - 1)),
            _ => None,
        }
    }

    /// Same depth, last index replaced by `f(last)`
    pub fn with_last(&self, f: impl FnOnce(usize) -> usize) -> Path {
        let mut indices = self.0.clone();
        if let Some(last) = indices.last_mut() {
            *last = f(*last);
        }
        Self(indices)
    }

    /// Truncated to the first `depth` indices
    pub fn ancestor_at(&self, depth: usize) -> Path {
        Self(self.0[..depth.min(self.0.len())].to_vec())
    }

    /// Strict prefix test
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    pub fn is_ancestor_or_equal(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Compares common prefixes only: ancestors and descendants are `Equal`
    pub fn compare(&self, other: &Path) -> Ordering {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    pub fn is_before(&self, other: &Path) -> bool {
        self.compare(other) == Ordering::Less
    }

    pub fn is_after(&self, other: &Path) -> bool {
        self.compare(other) == Ordering::Greater
    }

    pub(crate) fn indices_mut(&mut self) -> &mut Vec<usize> {
        &mut self.0
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(indices: [usize; N]) -> Self {
        Self(indices.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "[{}]", parts.join(","))
    }
}

/// Parses `0.1.2` (or the display form `[0,1,2]`)
impl FromStr for Path {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('[').trim_end_matches(']');
        if trimmed.is_empty() {
            return Ok(Path::root());
        }
        trimmed
            .split(|c| c == '.' || c == ',')
            .map(|part| part.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map(Path)
    }
}
