//! Linker map file scanning.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::core::errors::VerifyError;
use crate::util::fs::read_lines_lossy;

/// Build the pattern matching an object file placed at a non-zero address
/// from one of `dirs`.
///
/// Capture group 1 is the matched directory name. Both path separators are
/// accepted. The object path must end in `.o`, so `x.o.d` is not an object.
pub fn object_pattern<I, S>(dirs: I) -> Result<Regex, regex::Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let alternation = dirs
        .into_iter()
        .map(|dir| regex::escape(dir.as_ref()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"0x0*[1-9a-f][0-9a-f]*\s+0x[0-9a-f]+\s+\S+[/\\]({})[/\\]\S+\.o(?:$|[\s)])",
        alternation
    ))
}

/// Lines of a linker map file.
#[derive(Debug, Clone, Default)]
pub struct MapFile {
    path: Option<PathBuf>,
    lines: Vec<String>,
}

impl MapFile {
    /// Read a map file from disk. A missing file means the link step did not run.
    pub fn read(path: &Path) -> Result<Self, VerifyError> {
        if !path.exists() {
            return Err(VerifyError::MapFileNotFound {
                path: path.to_path_buf(),
            });
        }
        let lines = read_lines_lossy(path).map_err(|source| VerifyError::MapFileUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("read {} lines from {}", lines.len(), path.display());
        Ok(MapFile {
            path: Some(path.to_path_buf()),
            lines,
        })
    }

    /// Wrap map text that is already in memory.
    pub fn from_lines(lines: Vec<String>) -> Self {
        MapFile { path: None, lines }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The subset of `dirs` that contributed at least one linked object file.
    pub fn linked_dirs<I, S>(&self, dirs: I) -> Result<BTreeSet<String>, VerifyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let dirs: Vec<S> = dirs.into_iter().collect();
        if dirs.is_empty() {
            return Ok(BTreeSet::new());
        }

        let pattern = object_pattern(&dirs)?;
        let mut found = BTreeSet::new();
        for line in &self.lines {
            for captures in pattern.captures_iter(line) {
                if let Some(dir) = captures.get(1) {
                    found.insert(dir.as_str().to_string());
                }
            }
        }
        Ok(found)
    }

    /// Number of lines mentioning `marker`.
    pub fn count_marker(&self, marker: &str) -> usize {
        self.lines.iter().filter(|line| line.contains(marker)).count()
    }
}
