//! Forward-slash path helpers.
//!
//! Every path that crosses a [`StorageSource`](crate::storage::StorageSource)
//! or a provider is a plain `/`-delimited string. Virtual paths inside the game
//! filesystem are additionally absolute (leading `/`). No case folding or
//! platform canonicalization happens here.

/// Normalize a virtual path: backslashes become `/`, a leading `/` is forced,
/// repeated separators collapse and the trailing `/` is dropped (except for
/// the root itself).
///
/// `.` and `..` are ordinary segments here.
///
/// # Example
///
/// ```
/// use vpkfs::vpath::normalize;
///
/// assert_eq!(normalize("materials//models\\x.vmt"), "/materials/models/x.vmt");
/// assert_eq!(normalize("/a/b/../c/"), "/a/b/../c");
/// assert_eq!(normalize(""), "/");
/// ```
pub fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Join a backing path with a relative or virtual path.
///
/// The base keeps its own form (it may be a drive-letter path on Windows or
/// carry no leading `/`). `.` and `..` in either part are resolved, since
/// search path expressions such as `|gameinfo_path|.` rely on it.
///
/// # Example
///
/// ```
/// use vpkfs::vpath::join;
///
/// assert_eq!(join("/games/hl2/", "/materials/x.vmt"), "/games/hl2/materials/x.vmt");
/// assert_eq!(join("C:/Steam", "steamapps"), "C:/Steam/steamapps");
/// assert_eq!(join("/mods/demo", "."), "/mods/demo");
/// assert_eq!(join("/mods/demo", "/"), "/mods/demo");
/// ```
pub fn join(base: &str, tail: &str) -> String {
    let base = base.replace('\\', "/");
    let mut segments = collapse(&base);
    let absolute = base.starts_with('/');
    for segment in tail.replace('\\', "/").split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other.to_string()),
        }
    }
    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Parent of a backing or virtual path, without a trailing `/`.
///
/// Returns `None` for the root or a single bare segment.
pub fn parent(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    let idx = trimmed.rfind('/')?;
    if idx == 0 {
        return Some("/".to_string());
    }
    Some(trimmed[..idx].to_string())
}

/// Final segment of a path.
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Does `path` end with `suffix`, ignoring ASCII case?
pub(crate) fn ends_with_ignore_case(path: &str, suffix: &str) -> bool {
    path.len() >= suffix.len()
        && path.is_char_boundary(path.len() - suffix.len())
        && path[path.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

fn collapse(path: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    for segment in path.replace('\\', "/").split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other.to_string()),
        }
    }
    segments
}
