//! Watch patterns
//!
//! A watch request such as `src/*.c` is split into the directory that gets
//! registered with the OS (`src`) and a shell pattern for the names inside it
//! (`*.c`). Watching the directory instead of the file keeps notifications
//! flowing when an editor saves by deleting and recreating the file.
//!
//! Matching runs against the canonical directory, since that is what the OS
//! reports. Matched paths are handed back under the directory as the caller
//! wrote it.

use crate::error::WatchError;
use glob::{MatchOptions, Pattern};
use observer_core::Set;
use std::path::{Path, PathBuf};

/// `*` and `?` never match a path separator
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A directory plus a shell pattern for names inside it
#[derive(Debug, Clone)]
pub struct WatchPattern {
    /// Canonical directory to register
    dir: PathBuf,
    /// Directory as the caller wrote it; empty for a bare name
    requested_dir: PathBuf,
    /// `dir/base` as written, used for exact matches
    literal: String,
    /// `escape(dir)/base`, used for glob matches
    pattern: Pattern,
}

impl WatchPattern {
    /// Split and resolve a watch request
    ///
    /// The directory part is canonicalised, so it must exist. An empty
    /// directory part means the working directory.
    pub fn parse(path: &Path) -> Result<Self, WatchError> {
        let base = path
            .file_name()
            .ok_or_else(|| WatchError::InvalidPath(path.to_path_buf()))?;

        let requested_dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
        let dir = if requested_dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            requested_dir.as_path()
        };

        let dir = dir.canonicalize().map_err(|e| WatchError::Register {
            path: dir.to_path_buf(),
            source: notify::Error::io(e),
        })?;

        let mut pattern = Self::in_dir(dir, &base.to_string_lossy())?;
        pattern.requested_dir = requested_dir;
        Ok(pattern)
    }

    /// Build a pattern for `base` inside `dir`, taking `dir` as already resolved
    pub fn in_dir(dir: PathBuf, base: &str) -> Result<Self, WatchError> {
        let literal = dir.join(base).to_string_lossy().into_owned();

        // Only the base name is a pattern; metacharacters in the directory are literal
        let escaped = Path::new(&Pattern::escape(&dir.to_string_lossy()))
            .join(base)
            .to_string_lossy()
            .into_owned();

        let pattern = Pattern::new(&escaped).map_err(|source| WatchError::Pattern {
            pattern: literal.clone(),
            source,
        })?;

        Ok(Self {
            requested_dir: dir.clone(),
            dir,
            literal,
            pattern,
        })
    }

    /// Directory that must be registered with the OS
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The pattern as written, rooted at the canonical directory
    pub fn as_str(&self) -> &str {
        &self.literal
    }

    /// Spell a matched path the way this pattern was requested
    ///
    /// `changed` is a path under the canonical directory. The result keeps
    /// its name under the caller's directory, so watching `main.c` reports
    /// `main.c`.
    pub fn reported_path(&self, changed: &Path) -> PathBuf {
        match changed.file_name() {
            Some(name) => self.requested_dir.join(name),
            None => changed.to_path_buf(),
        }
    }
}

/// Registered patterns, in registration order
///
/// Patterns are only ever added.
#[derive(Debug, Default)]
pub struct PatternSet {
    index: Set,
    patterns: Vec<WatchPattern>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern
    ///
    /// Returns false if an identical pattern is already registered.
    pub fn insert(&mut self, pattern: WatchPattern) -> bool {
        if self.index.add(pattern.as_str()).is_err() {
            return false;
        }

        self.patterns.push(pattern);
        true
    }

    /// Find the pattern a changed path belongs to
    ///
    /// Exact names are looked up first, then each pattern is tried as a glob
    /// in registration order until one matches.
    pub fn find(&self, path: &Path) -> Option<&WatchPattern> {
        let key = path.to_string_lossy();
        if self.index.has(&key) {
            return self.patterns.iter().find(|p| p.literal == key);
        }

        self.patterns
            .iter()
            .find(|p| p.pattern.matches_path_with(path, MATCH_OPTIONS))
    }

    /// Check if a changed path is relevant
    pub fn matches(&self, path: &Path) -> bool {
        self.find(path).is_some()
    }

    /// Registered patterns, in registration order
    pub fn values(&self) -> Vec<String> {
        self.patterns.iter().map(|p| p.literal.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
