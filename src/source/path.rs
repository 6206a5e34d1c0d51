//! Logical path handling shared by every source variant.
//!
//! Logical paths use `/` as separator regardless of platform, carry no
//! leading or trailing separator, and the empty string names the root.

/// Normalize a logical path.
///
/// Empty segments and `.` are dropped, `..` removes the previous segment
/// (never escaping the root), and leading/trailing separators are removed.
#[must_use]
pub fn clean_logical_path(name: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in name.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Join a logical directory and a child name.
#[must_use]
pub fn join_logical(dir: &str, child: &str) -> String {
    if dir.is_empty() {
        child.to_string()
    } else {
        format!("{dir}/{child}")
    }
}

/// Last segment of a logical path.
#[must_use]
pub fn base_name(name: &str) -> &str {
    let trimmed = name.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Remove leading `./` segments that some archivers write.
pub(crate) fn normalize_entry_name(raw: &str) -> &str {
    let mut name = raw;
    while let Some(rest) = name.strip_prefix("./") {
        name = rest;
    }
    name
}

/// Strip the archive root prefix from an entry name.
///
/// Returns `None` for entries outside the prefix, including the prefix
/// directory entry itself.
pub(crate) fn strip_root_prefix<'a>(prefix: &str, entry: &'a str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(entry);
    }
    entry.strip_prefix(prefix)?.strip_prefix('/')
}

/// Name of the immediate child of `dir` that `rel` is or lies beneath.
///
/// Deeper entries report the subdirectory that contains them, so archives
/// without directory placeholders still list their subdirectories.
pub(crate) fn immediate_child<'a>(dir: &str, rel: &'a str) -> Option<&'a str> {
    let rest = if dir.is_empty() {
        rel
    } else {
        rel.strip_prefix(dir)?.strip_prefix('/')?
    };
    let child = rest.split('/').next().unwrap_or(rest);
    if child.is_empty() {
        return None;
    }
    Some(child)
}

/// Whether `rel` is `dir` itself or lies somewhere below it.
pub(crate) fn is_within(dir: &str, rel: &str) -> bool {
    if dir.is_empty() {
        return true;
    }
    match rel.strip_prefix(dir) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Marker suffix used to detect the archive root prefix.
pub(crate) fn marker_prefix(entry: &str) -> Option<&str> {
    if entry == super::MARKER_ENTRY {
        return Some("");
    }
    entry
        .strip_suffix(super::MARKER_ENTRY)
        .and_then(|head| head.strip_suffix('/'))
}
