//! Lexical path normalisation for the virtual file tree.

use crate::PathError;

/// Deepest path the file tree accepts, counted in components below `/`.
///
/// Snapshots nest three JSON levels per directory; at this depth a tree
/// stays inside `serde_json`'s default recursion limit of 128.
pub const MAX_DEPTH: usize = 32;

/// A normalised absolute path in the virtual file tree.
///
/// Empty segments and `.` are dropped; `..` pops the previous segment.
/// Normalisation is purely lexical and never consults the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VPath {
    segments: Vec<String>,
}

impl VPath {
    /// The root path `/`.
    #[must_use]
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse and normalise an absolute `/`-delimited path.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NotAbsolute`] if the path does not start with `/`,
    /// [`PathError::EscapesRoot`] if `..` would climb above the root, or
    /// [`PathError::TooDeep`] past [`MAX_DEPTH`] components.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if !raw.starts_with('/') {
            return Err(PathError::NotAbsolute(raw.to_string()));
        }

        let mut segments: Vec<String> = Vec::new();
        for part in raw.split('/') {
            match part {
                "" | "." => {},
                ".." => {
                    if segments.pop().is_none() {
                        return Err(PathError::EscapesRoot(raw.to_string()));
                    }
                },
                name => segments.push(name.to_string()),
            }
        }

        if segments.len() > MAX_DEPTH {
            return Err(PathError::TooDeep {
                path: raw.to_string(),
                max: MAX_DEPTH,
            });
        }
        Ok(Self { segments })
    }

    /// Number of components below the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path components, root first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Final component, or `None` for the root.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Parent path, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, head) = self.segments.split_last()?;
        Some(Self {
            segments: head.to_vec(),
        })
    }

    /// Append a single component.
    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// Whether `self` equals `other` or lies beneath it.
    #[must_use]
    pub fn starts_with(&self, other: &Self) -> bool {
        self.segments.starts_with(&other.segments)
    }
}

impl std::fmt::Display for VPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for VPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalises_segments() {
        let path = VPath::parse("//home/./guest//Desktop/").unwrap();
        assert_eq!(path.to_string(), "/home/guest/Desktop");
        assert_eq!(path.file_name(), Some("Desktop"));
    }

    #[test]
    fn test_parent_dir_pops() {
        let path = VPath::parse("/a/b/../c").unwrap();
        assert_eq!(path.to_string(), "/a/c");
    }

    #[test]
    fn test_traversal_above_root_rejected() {
        let res = VPath::parse("/a/../../etc");
        assert!(matches!(res, Err(PathError::EscapesRoot(_))));
    }

    #[test]
    fn test_relative_rejected() {
        let res = VPath::parse("a/b");
        assert!(matches!(res, Err(PathError::NotAbsolute(_))));
    }

    #[test]
    fn test_depth_limit() {
        let deepest = "/d".repeat(MAX_DEPTH);
        assert_eq!(VPath::parse(&deepest).unwrap().depth(), MAX_DEPTH);

        let res = VPath::parse(&format!("{deepest}/f.txt"));
        assert!(matches!(res, Err(PathError::TooDeep { max: MAX_DEPTH, .. })));

        // Normalisation happens before the check.
        let popped = format!("{deepest}/f.txt/..");
        assert!(VPath::parse(&popped).is_ok());
    }

    #[test]
    fn test_root() {
        let root = VPath::parse("/").unwrap();
        assert!(root.is_root());
        assert_eq!(root.parent(), None);
        assert_eq!(root.to_string(), "/");
        assert_eq!(root.join("x").to_string(), "/x");
    }

    #[test]
    fn test_starts_with() {
        let a = VPath::parse("/a").unwrap();
        let ab = VPath::parse("/a/b").unwrap();
        let abc = VPath::parse("/abc").unwrap();
        assert!(ab.starts_with(&a));
        assert!(a.starts_with(&a));
        assert!(!abc.starts_with(&a));
    }
}
