//! Row and column identifiers
//!
//! A [`Path`] is an ordered sequence of [`PathElement`]s. Rows and columns are
//! both named by paths: a column derived from a nested value is the chain of
//! object keys and array indexes leading to its leaf.
//!
//! # Text Form
//!
//! | Path | Text |
//! |------|------|
//! | root (no elements) | `` |
//! | `[user, name]` | `user.name` |
//! | `[items, 0]` | `items.0` |
//! | `[a.b, c]` | `"a.b".c` |
//! | `[say "hi"]` | `"say ""hi"""` |
//!
//! Elements that are empty or contain `.` or `"` are double-quoted, with a
//! doubled quote standing for a literal one.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier naming a row within a target collection
pub type RowPath = Path;

/// Identifier naming a column/field within a row
pub type ColumnPath = Path;

/// Error type for path parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// Unquoted empty element (e.g. `a..b` or a trailing dot)
    #[error("empty path element at position {0}")]
    EmptyElement(usize),
    /// Quoted element without a closing quote
    #[error("unterminated quote starting at position {0}")]
    UnterminatedQuote(usize),
    /// Something other than `.` follows a closing quote
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
}

/// One component of a [`Path`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathElement(String);

impl PathElement {
    /// Create an element from any string, including empty ones
    pub fn new(s: impl Into<String>) -> Self {
        PathElement(s.into())
    }

    /// Element text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the element as an array index
    pub fn as_index(&self) -> Option<usize> {
        if self.0.is_empty() || (self.0.len() > 1 && self.0.starts_with('0')) {
            return None;
        }
        self.0.parse().ok()
    }

    fn needs_quoting(&self) -> bool {
        self.0.is_empty() || self.0.contains(['.', '"'])
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.needs_quoting() {
            write!(f, "\"{}\"", self.0.replace('"', "\"\""))
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for PathElement {
    fn from(s: &str) -> Self {
        PathElement(s.to_string())
    }
}

impl From<String> for PathElement {
    fn from(s: String) -> Self {
        PathElement(s)
    }
}

impl From<usize> for PathElement {
    fn from(i: usize) -> Self {
        PathElement(i.to_string())
    }
}

/// Ordered, comparable, immutable identifier for a row or column
///
/// Ordering is lexicographic over elements, so `a < a.b < b`.
///
/// # Examples
///
/// ```
/// use strata_core::Path;
///
/// let name = Path::root().with("user").with("name");
/// let parsed: Path = "user.name".parse().unwrap();
/// assert_eq!(name, parsed);
/// assert!(name.starts_with(&Path::new("user")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Path {
    elements: SmallVec<[PathElement; 4]>,
}

impl Path {
    /// The empty path
    pub fn root() -> Self {
        Path {
            elements: SmallVec::new(),
        }
    }

    /// Single-element path
    pub fn new(element: impl Into<PathElement>) -> Self {
        let mut path = Path::root();
        path.push(element);
        path
    }

    /// Build a path from its elements
    pub fn from_elements<I, E>(elements: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<PathElement>,
    {
        Path {
            elements: elements.into_iter().map(Into::into).collect(),
        }
    }

    /// Path elements
    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True for the root path
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// True for the root path
    pub fn is_root(&self) -> bool {
        self.elements.is_empty()
    }

    /// Append an element (mutating)
    pub fn push(&mut self, element: impl Into<PathElement>) {
        self.elements.push(element.into());
    }

    /// Remove the last element
    pub fn pop(&mut self) -> Option<PathElement> {
        self.elements.pop()
    }

    /// Append an element (builder pattern)
    pub fn with(mut self, element: impl Into<PathElement>) -> Self {
        self.push(element);
        self
    }

    /// Concatenate two paths
    pub fn join(&self, other: &Path) -> Path {
        let mut joined = self.clone();
        joined.elements.extend(other.elements.iter().cloned());
        joined
    }

    /// First element, if any
    pub fn head(&self) -> Option<&PathElement> {
        self.elements.first()
    }

    /// Everything after the first element
    pub fn tail(&self) -> Path {
        Path {
            elements: self.elements.iter().skip(1).cloned().collect(),
        }
    }

    /// True if `prefix` is an ancestor of (or equal to) this path
    pub fn starts_with(&self, prefix: &Path) -> bool {
        prefix.len() <= self.len()
            && self
                .elements
                .iter()
                .zip(prefix.elements.iter())
                .all(|(a, b)| a == b)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", element)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut path = Path::root();
        if s.is_empty() {
            return Ok(path);
        }

        let mut chars = s.char_indices().peekable();
        loop {
            let start = chars.peek().map(|&(i, _)| i).unwrap_or(s.len());
            let mut element = String::new();

            if let Some(&(_, '"')) = chars.peek() {
                chars.next();
                loop {
                    match chars.next() {
                        Some((_, '"')) => {
                            if let Some(&(_, '"')) = chars.peek() {
                                chars.next();
                                element.push('"');
                            } else {
                                break;
                            }
                        }
                        Some((_, c)) => element.push(c),
                        None => return Err(PathParseError::UnterminatedQuote(start)),
                    }
                }
                match chars.next() {
                    None => {
                        path.push(element);
                        return Ok(path);
                    }
                    Some((_, '.')) => path.push(element),
                    Some((i, c)) => return Err(PathParseError::UnexpectedChar(c, i)),
                }
            } else {
                loop {
                    match chars.next() {
                        Some((_, '.')) | None if element.is_empty() => {
                            return Err(PathParseError::EmptyElement(start));
                        }
                        None => {
                            path.push(element);
                            return Ok(path);
                        }
                        Some((_, '.')) => {
                            path.push(element);
                            break;
                        }
                        Some((i, '"')) => return Err(PathParseError::UnexpectedChar('"', i)),
                        Some((_, c)) => element.push(c),
                    }
                }
            }

            if chars.peek().is_none() {
                return Err(PathParseError::EmptyElement(s.len()));
            }
        }
    }
}

impl From<&str> for Path {
    /// Single-element path holding `s` verbatim (no parsing)
    fn from(s: &str) -> Self {
        Path::new(s)
    }
}

impl From<PathElement> for Path {
    fn from(element: PathElement) -> Self {
        Path::new(element)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
