use std::borrow::Cow;
use std::fmt;

/// Error for malformed dot-notation paths.
#[derive(Debug, Clone, PartialEq)]
pub struct PathError(pub String);

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid path: {}", self.0)
    }
}

impl std::error::Error for PathError {}

/// One step of a dot-notation path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Field(String),
    /// Canonical decimal integer segment (`"0"`, `"12"`, never `"01"`).
    Index(usize),
}

impl Segment {
    fn parse(raw: &str) -> Segment {
        let canonical =
            raw.bytes().all(|b| b.is_ascii_digit()) && (raw == "0" || !raw.starts_with('0'));
        if canonical && let Ok(i) = raw.parse::<usize>() {
            return Segment::Index(i);
        }
        Segment::Field(raw.to_string())
    }

    /// The key this segment names when applied to a document.
    pub fn key(&self) -> Cow<'_, str> {
        match self {
            Segment::Field(name) => Cow::Borrowed(name),
            Segment::Index(i) => Cow::Owned(i.to_string()),
        }
    }
}

/// A parsed dot-notation field path, e.g. `doneProjects.0.name`.
///
/// Keeps the original string so error messages and logs can show the path as
/// the caller wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    raw: String,
    segments: Vec<Segment>,
}

impl Path {
    pub fn parse(raw: &str) -> Result<Path, PathError> {
        if raw.is_empty() {
            return Err(PathError("empty path".into()));
        }
        let mut segments = Vec::new();
        for part in raw.split('.') {
            if part.is_empty() {
                return Err(PathError(format!("empty segment in '{raw}'")));
            }
            segments.push(Segment::parse(part));
        }
        Ok(Path {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// `true` if every segment of `self` leads `other` (a path is its own prefix).
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.key() == b.key())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
