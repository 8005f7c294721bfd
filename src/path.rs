//! String helpers for `/`-separated archive paths.
//!
//! These operate on raw archive paths, not on [`std::path::Path`]: archive
//! separators are always `/` regardless of host platform.

/// Everything before the final `/`, or `""` if there is none.
///
/// `"a/b/c.txt"` gives `"a/b"`, and the directory marker `"a/b/"` gives `"a/b"`.
pub fn folder(path: &str) -> &str {
    match path.rfind('/') {
        Some(slash) => &path[..slash],
        None => "",
    }
}

/// The final `/`-delimited component; empty for directory markers.
pub fn name(path: &str) -> &str {
    match path.rfind('/') {
        Some(slash) => &path[slash + 1..],
        None => path,
    }
}

/// Substring from the last `.` to the end, dot included; `""` if none.
pub fn extension(path: &str) -> &str {
    match path.rfind('.') {
        Some(dot) => &path[dot..],
        None => "",
    }
}

/// Whether `path` ends in `wanted`, compared ASCII case-insensitively.
///
/// A `wanted` without a leading dot gets one, so `"txt"`, `".txt"` and
/// `".TXT"` are equivalent. Only the text after the last `.` of `path` is
/// considered, so `"a.tar.gz"` matches `"gz"` but not `"tar.gz"`.
pub fn has_extension(path: &str, wanted: &str) -> bool {
    let ext = extension(path);
    let wanted = wanted.strip_prefix('.').unwrap_or(wanted);
    ext.len() == wanted.len() + 1 && ext[1..].eq_ignore_ascii_case(wanted)
}

/// Visibility predicate that hides dot files and anything inside a dot
/// folder, as well as macOS resource fork folders.
pub fn is_hidden(path: &str) -> bool {
    path.split('/')
        .any(|component| component.starts_with('.') || component == "__MACOSX")
}

/// Visibility predicate built on [`is_hidden`].
pub fn is_not_hidden(path: &str) -> bool {
    !is_hidden(path)
}

/// Default visibility predicate: every entry is visible.
pub fn always_visible(_path: &str) -> bool {
    true
}
