//! Path globs whose wildcards stay inside one path segment

use glob::{MatchOptions, Pattern};
use pkgmend_errors::CatalogError;
use std::fmt;

/// Longest path segment a wildcard is tested against; longer segments never
/// match. Bounds the matcher's work on pathological names.
pub const MAX_SEGMENT_LEN: usize = 255;

const SEGMENT_BOUND: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Shell-like glob over `/`-separated paths.
///
/// `*` matches any run of characters within one segment and `?` exactly one
/// character; neither crosses a `/`, so the pattern and the path must have
/// the same number of segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glob {
    pattern: Pattern,
}

impl Glob {
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidPattern` for relative patterns, for the
    /// unsupported `**` and for anything the glob syntax rejects.
    pub fn new(pattern: &str) -> Result<Self, CatalogError> {
        let invalid = |message: String| CatalogError::InvalidPattern {
            pattern: pattern.to_string(),
            message,
        };
        if !pattern.starts_with('/') {
            return Err(invalid("glob must be an absolute path".to_string()));
        }
        if pattern.contains("**") {
            return Err(invalid(
                "'**' is not supported; '*' stays within one segment".to_string(),
            ));
        }
        let pattern = Pattern::new(pattern).map_err(|e| invalid(e.msg.to_string()))?;
        Ok(Self { pattern })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        if path.split('/').any(|segment| segment.len() > MAX_SEGMENT_LEN) {
            return false;
        }
        self.pattern.matches_with(path, SEGMENT_BOUND)
    }
}

impl fmt::Display for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern.as_str())
    }
}
