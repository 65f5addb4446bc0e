//! Pure POSIX path string helpers behind the `os.path` module and import resolution.
//!
//! Nothing here touches a filesystem: module files are registry keys, not real files.

/// Joins path segments. An absolute segment discards everything before it.
#[must_use]
pub fn join(first: &str, rest: &[&str]) -> String {
    let mut path = first.to_owned();
    for part in rest {
        if isabs(part) {
            (*part).clone_into(&mut path);
        } else if path.is_empty() || path.ends_with(['/', '\\', ':']) {
            path.push_str(part);
        } else {
            path.push('/');
            path.push_str(part);
        }
    }
    path
}

#[must_use]
pub fn isabs(path: &str) -> bool {
    path.starts_with('/')
}

/// Splits a path into `(head, tail)` around the last separator.
///
/// `head` loses its trailing separators unless it consists only of separators.
#[must_use]
pub fn split(path: &str) -> (&str, &str) {
    let idx = path.rfind('/').map_or(0, |i| i + 1);
    let (head, tail) = path.split_at(idx);
    let trimmed = head.trim_end_matches('/');
    if trimmed.is_empty() { (head, tail) } else { (trimmed, tail) }
}

/// Directory part of a path: `dirname("a/b.py") == "a"`, `dirname("b.py") == ""`.
#[must_use]
pub fn dirname(path: &str) -> &str {
    split(path).0
}

#[must_use]
pub fn basename(path: &str) -> &str {
    split(path).1
}

/// Collapses `.`, `..` and repeated separators. An empty path normalizes to `"."`.
///
/// One or two leading slashes are kept as written; three or more collapse to one.
#[must_use]
pub fn normpath(path: &str) -> String {
    if path.is_empty() {
        return ".".to_owned();
    }
    let leading = path.len() - path.trim_start_matches('/').len();
    let prefix = match leading {
        0 => "",
        2 => "//",
        _ => "/",
    };
    let mut components: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." if !prefix.is_empty() => {
                components.pop();
            }
            ".." if components.last().is_some_and(|last| *last != "..") => {
                components.pop();
            }
            other => components.push(other),
        }
    }
    let joined = components.join("/");
    if prefix.is_empty() && joined.is_empty() {
        ".".to_owned()
    } else {
        format!("{prefix}{joined}")
    }
}
