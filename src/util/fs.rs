//! Filesystem utilities.

use std::fs;
use std::path::{Component, Path, PathBuf};

/// Read a text artifact line by line, dropping invalid UTF-8 instead of failing.
///
/// Linker map files routinely contain mangled or binary-ish section names, so
/// decoding is lossy.
pub fn read_lines_lossy(path: &Path) -> std::io::Result<Vec<String>> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(|line| line.to_string())
        .collect())
}

/// Lexically normalize a path: drop `.` components and fold `..` into
/// their parent. Does not touch the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve `path` against `base` unless it is already absolute, then normalize.
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

/// Final path component as a string, or the empty string for roots.
pub fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Search `start` and its ancestors for a file called `name`.
pub fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
