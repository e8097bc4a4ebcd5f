//! Dotted namespace paths.
//!
//! Paths are the addresses the channel understands: segment names joined
//! with `.` (e.g. `_SB_.PCI0._HID`). The root is the empty path, and its
//! children are written without a leading dot.

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

/// Errors produced when building a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A segment was empty (e.g. `_SB_..PCI0`).
    #[error("empty path segment in {0:?}")]
    EmptySegment(String),
    /// A segment passed to [`Path::child`] contained a dot.
    #[error("path segment {0:?} contains '.'")]
    DottedSegment(String),
}

/// A location in the namespace.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// The root path.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parses a dotted path. A leading `\` is accepted and ignored, and the
    /// empty string (or a lone `\`) is the root.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::EmptySegment`] if any segment is empty.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let trimmed = s.strip_prefix('\\').unwrap_or(s);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let segments = trimmed
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// Returns the path of the child named `segment`.
    ///
    /// # Errors
    ///
    /// Returns an error if `segment` is empty or contains a dot.
    pub fn child(&self, segment: &str) -> Result<Self, PathError> {
        if segment.is_empty() {
            return Err(PathError::EmptySegment(self.to_string()));
        }
        if segment.contains('.') {
            return Err(PathError::DottedSegment(segment.to_string()));
        }
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// Returns the parent path, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// Returns the segments of this path.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the final segment, or `None` for the root.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the number of segments (depth) in this path.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path(\"\\{self}\")")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(seg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_children_have_no_leading_dot() {
        let sb = Path::root().child("_SB_").unwrap();
        assert_eq!(sb.to_string(), "_SB_");
        assert_eq!(sb.child("C139").unwrap().to_string(), "_SB_.C139");
    }

    #[test]
    fn parse_accepts_root_prefix() {
        let p = Path::parse("\\_SB_.PCI0._HID").unwrap();
        assert_eq!(p.segments(), ["_SB_", "PCI0", "_HID"]);
        assert_eq!(p.last(), Some("_HID"));
        assert!(Path::parse("").unwrap().is_root());
        assert!(Path::parse("\\").unwrap().is_root());
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert!(matches!(Path::parse("_SB_..PCI0"), Err(PathError::EmptySegment(_))));
        assert!(matches!(Path::parse("_SB_."), Err(PathError::EmptySegment(_))));
    }

    #[test]
    fn child_rejects_bad_segments() {
        let root = Path::root();
        assert!(matches!(root.child(""), Err(PathError::EmptySegment(_))));
        assert!(matches!(root.child("A.B"), Err(PathError::DottedSegment(_))));
    }

    #[test]
    fn parent_walks_up() {
        let p: Path = "_SB_.PCI0.GFX0".parse().unwrap();
        assert_eq!(p.depth(), 3);
        assert_eq!(p.parent().unwrap().to_string(), "_SB_.PCI0");
        assert!(Path::root().parent().is_none());
        assert!(Path::parse("_SB_").unwrap().parent().unwrap().is_root());
    }
}
