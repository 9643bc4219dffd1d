//! Lexical path helpers for transcript paths
//!
//! Transcript paths are POSIX strings recorded by a build that already ran,
//! so none of these touch the file system.

use std::path::{Component, Path};

pub fn is_absolute(path: &str) -> bool {
    Path::new(path).is_absolute()
}

/// Directory part of `path`; empty for a bare filename.
pub fn dirname(path: &str) -> String {
    Path::new(path)
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

/// Collapses `.` and `..` segments and duplicate separators.
///
/// An empty relative result is returned as `.`.
pub fn normalize(path: &str) -> String {
    let absolute = is_absolute(path);
    let mut parts: Vec<&str> = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().unwrap_or_default()),
            Component::ParentDir => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

pub fn segments(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Joins `relative` onto `base` and normalizes the result.
pub fn join(base: &str, relative: &str) -> String {
    normalize(&Path::new(base).join(relative).to_string_lossy())
}

/// Expresses `path` relative to `base`, walking up with `..` as needed.
pub fn relative_to(path: &str, base: &str) -> String {
    let path = normalize(path);
    let base = normalize(base);
    let path_parts = segments(&path);
    let base_parts = segments(&base);

    let shared = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; base_parts.len() - shared];
    parts.extend(&path_parts[shared..]);

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Character-wise longest common prefix. May split a path component.
pub fn common_prefix<'a, I>(paths: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut iter = paths.into_iter();
    let Some(first) = iter.next() else {
        return String::new();
    };

    let mut len = first.len();
    for path in iter {
        len = first
            .char_indices()
            .zip(path.chars())
            .take_while(|((_, a), b)| a == b)
            .map(|((i, a), _)| i + a.len_utf8())
            .last()
            .unwrap_or(0)
            .min(len);
    }
    first[..len].to_string()
}

/// Deepest directory containing every path, compared segment by segment.
pub fn common_ancestor<'a, I>(paths: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut iter = paths.into_iter();
    let Some(first) = iter.next() else {
        return String::new();
    };

    let first = normalize(first);
    let mut shared: Vec<&str> = segments(&first);
    for path in iter {
        let path = normalize(path);
        let parts = segments(&path);
        let keep = shared
            .iter()
            .zip(parts.iter())
            .take_while(|(a, b)| a == b)
            .count();
        shared.truncate(keep);
    }

    if is_absolute(&first) {
        format!("/{}", shared.join("/"))
    } else if shared.is_empty() {
        ".".to_string()
    } else {
        shared.join("/")
    }
}
