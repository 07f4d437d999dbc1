//! Path utilities.
//!
//! Every function here is a pure string transformation: no I/O, no state.
//! Paths are forward-slash separated; backslashes are treated as separators
//! when normalizing.

use std::sync::LazyLock;

use regex::Regex;

/// Scheme prefix of canonical package references.
pub const PACKAGE_SCHEME: &str = "package://";

/// Scheme prefix of ephemeral handles minted for local content.
pub const HANDLE_SCHEME: &str = "blob:";

static FIND_MACRO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\(\s*find\s+([^)\s]+)\s*\)").expect("find-macro pattern is valid")
});

/// Options for relative resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Urdf-sibling heuristic: a reference made from a document inside a
    /// `urdf/` directory is resolved against the package root (the parent of
    /// `urdf/`) unless it already starts with `..`.
    ///
    /// This assumes the conventional `<pkg>/urdf`, `<pkg>/meshes` layout. It
    /// is a named exception, not a general rule.
    pub urdf_sibling: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { urdf_sibling: true }
    }
}

/// Whether `path` is a full remote URL.
pub fn is_remote(path: &str) -> bool {
    let lower = path.get(..8).unwrap_or(path).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("file://")
}

/// Whether `path` is an ephemeral handle.
pub fn is_handle(path: &str) -> bool {
    path.starts_with(HANDLE_SCHEME)
}

/// Whether `path` is a canonical package reference.
pub fn is_package(path: &str) -> bool {
    path.starts_with(PACKAGE_SCHEME)
}

/// Whether `path` must never be re-based.
pub fn is_anchored(path: &str) -> bool {
    path.starts_with('/') || is_remote(path) || is_handle(path)
}

/// Collapse `.` and `..` segments.
///
/// A `..` that would climb above the root is clamped (dropped). Empty
/// segments and a leading `./` disappear; a leading `/` is preserved.
///
/// ```
/// use robot_assembly::path::normalize;
///
/// assert_eq!(normalize("./pkg/urdf/../meshes//arm.stl"), "pkg/meshes/arm.stl");
/// assert_eq!(normalize("../../x.stl"), "x.stl");
/// ```
pub fn normalize(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            s => stack.push(s),
        }
    }
    let joined = stack.join("/");
    if path.starts_with('/') {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Directory part of `path` (everything before the last `/`).
pub fn parent(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

/// File name part of `path` (everything after the last `/`).
pub fn file_name(path: &str) -> &str {
    path.rfind('/').map_or(path, |i| &path[i + 1..])
}

/// First segment of `path`, if the path has more than one segment.
pub fn first_segment(path: &str) -> Option<&str> {
    let path = path.trim_start_matches("./").trim_start_matches('/');
    path.find('/').map(|i| &path[..i])
}

/// Join a directory and a reference without normalizing.
pub fn join(dir: &str, reference: &str) -> String {
    if dir.is_empty() {
        reference.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), reference)
    }
}

/// Join a base (path or URL prefix) and a relative key.
///
/// Unlike [`join`], this never drops the base's leading `/` or scheme.
pub fn join_base(base: &str, key: &str) -> String {
    let key = key.trim_start_matches('/');
    if base.is_empty() {
        return key.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), key)
}

/// Resolve `reference` against the directory of `base` with the default
/// options (urdf-sibling heuristic enabled).
///
/// ```
/// use robot_assembly::path::resolve_relative;
///
/// assert_eq!(resolve_relative("pkg/urdf/robot.urdf", "meshes/arm.stl"), "pkg/meshes/arm.stl");
/// assert_eq!(resolve_relative("pkg/robot.urdf", "meshes/arm.stl"), "pkg/meshes/arm.stl");
/// ```
pub fn resolve_relative(base: &str, reference: &str) -> String {
    resolve_relative_with(base, reference, ResolveOptions::default())
}

/// Resolve `reference` against the directory of `base`.
///
/// Absolute paths, remote URLs and ephemeral handles are returned unchanged.
pub fn resolve_relative_with(base: &str, reference: &str, options: ResolveOptions) -> String {
    if is_anchored(reference) {
        return reference.to_string();
    }
    let mut dir = parent(base);
    if options.urdf_sibling && is_urdf_dir(dir) && !reference.starts_with("..") {
        dir = parent(dir);
    }
    normalize(&join(dir, reference))
}

/// Plain relative resolution, never applying the urdf-sibling heuristic.
pub fn join_relative(base: &str, reference: &str) -> String {
    resolve_relative_with(base, reference, ResolveOptions { urdf_sibling: false })
}

/// Resolution candidates for `reference`, most likely first and deduplicated.
///
/// With `prefer_sibling` the heuristic result leads (asset lookups);
/// otherwise the plain directory join leads (include lookups, where sibling
/// macro files inside `urdf/` are the norm).
pub fn relative_candidates(
    base: &str,
    reference: &str,
    options: ResolveOptions,
    prefer_sibling: bool,
) -> Vec<String> {
    let plain = join_relative(base, reference);
    let sibling = resolve_relative_with(base, reference, options);
    let mut out = if prefer_sibling {
        vec![sibling, plain]
    } else {
        vec![plain, sibling]
    };
    out.dedup();
    out
}

fn is_urdf_dir(dir: &str) -> bool {
    dir == "urdf" || dir.ends_with("/urdf")
}

/// Rewrite ROS-style package forms into a canonical `package://` reference.
///
/// - `package://...` passes through unchanged
/// - `$(find <name>)` anywhere in the string becomes `package://<name>`,
///   dropping anything before it
/// - anything else is returned unchanged and treated as relative
///
/// ```
/// use robot_assembly::path::substitute_package_macros;
///
/// assert_eq!(
///     substitute_package_macros("$(find my_pkg)/meshes/x.stl"),
///     "package://my_pkg/meshes/x.stl",
/// );
/// ```
pub fn substitute_package_macros(raw: &str) -> String {
    let raw = raw.trim();
    if is_package(raw) {
        return raw.to_string();
    }
    match FIND_MACRO.captures(raw) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            let name = caps.get(1).map_or("", |m| m.as_str());
            let rest = &raw[whole.end..];
            format!("{PACKAGE_SCHEME}{name}/{}", rest.trim_start_matches('/'))
        }
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("a/b/../c"), "a/c");
        assert_eq!(normalize("./a/./b"), "a/b");
        assert_eq!(normalize("/a/../../b"), "/b");
        assert_eq!(normalize("a\\b\\c.stl"), "a/b/c.stl");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_clamps_escape() {
        assert_eq!(normalize("../x"), "x");
        assert_eq!(normalize("a/../../../x"), "x");
    }

    #[test]
    fn test_parent_and_file_name() {
        assert_eq!(parent("pkg/urdf/robot.urdf"), "pkg/urdf");
        assert_eq!(parent("robot.urdf"), "");
        assert_eq!(file_name("pkg/urdf/robot.urdf"), "robot.urdf");
        assert_eq!(file_name("robot.urdf"), "robot.urdf");
    }

    #[test]
    fn test_first_segment() {
        assert_eq!(first_segment("pkg/urdf/robot.urdf"), Some("pkg"));
        assert_eq!(first_segment("./pkg/robot.urdf"), Some("pkg"));
        assert_eq!(first_segment("robot.urdf"), None);
    }

    #[test]
    fn test_resolve_relative_urdf_sibling() {
        assert_eq!(
            resolve_relative("pkg/urdf/robot.urdf", "meshes/arm.stl"),
            "pkg/meshes/arm.stl"
        );
        // Already climbing out: heuristic does not apply.
        assert_eq!(
            resolve_relative("pkg/urdf/robot.urdf", "../meshes/arm.stl"),
            "pkg/meshes/arm.stl"
        );
        assert_eq!(resolve_relative("urdf/robot.urdf", "meshes/a.stl"), "meshes/a.stl");
    }

    #[test]
    fn test_resolve_relative_heuristic_disabled() {
        let opts = ResolveOptions { urdf_sibling: false };
        assert_eq!(
            resolve_relative_with("pkg/urdf/robot.urdf", "meshes/arm.stl", opts),
            "pkg/urdf/meshes/arm.stl"
        );
    }

    #[test]
    fn test_resolve_relative_anchored_unchanged() {
        assert_eq!(resolve_relative("pkg/robot.urdf", "/abs/x.stl"), "/abs/x.stl");
        assert_eq!(
            resolve_relative("pkg/robot.urdf", "https://host/x.stl"),
            "https://host/x.stl"
        );
        assert_eq!(resolve_relative("pkg/robot.urdf", "blob:3-1/x.stl"), "blob:3-1/x.stl");
    }

    #[test]
    fn test_relative_candidates_order() {
        let opts = ResolveOptions::default();
        assert_eq!(
            relative_candidates("pkg/urdf/r.xacro", "arm.xacro", opts, false),
            vec!["pkg/urdf/arm.xacro".to_string(), "pkg/arm.xacro".to_string()]
        );
        assert_eq!(
            relative_candidates("pkg/urdf/r.urdf", "meshes/a.stl", opts, true),
            vec!["pkg/meshes/a.stl".to_string(), "pkg/urdf/meshes/a.stl".to_string()]
        );
        assert_eq!(
            relative_candidates("pkg/r.urdf", "a.stl", opts, true),
            vec!["pkg/a.stl".to_string()]
        );
    }

    #[test]
    fn test_substitute_package_macros() {
        assert_eq!(
            substitute_package_macros("$(find my_pkg)/meshes/x.stl"),
            "package://my_pkg/meshes/x.stl"
        );
        assert_eq!(
            substitute_package_macros("package://my_pkg/meshes/x.stl"),
            "package://my_pkg/meshes/x.stl"
        );
        assert_eq!(
            substitute_package_macros("prefix/$(find  other )/urdf/arm.xacro"),
            "package://other/urdf/arm.xacro"
        );
        assert_eq!(substitute_package_macros("meshes/x.stl"), "meshes/x.stl");
    }

    #[test]
    fn test_join_base() {
        assert_eq!(join_base("/", "meshes/a.stl"), "/meshes/a.stl");
        assert_eq!(join_base("https://h/r/", "/meshes/a.stl"), "https://h/r/meshes/a.stl");
        assert_eq!(join_base("", "a.stl"), "a.stl");
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://host/a"));
        assert!(is_remote("HTTP://host/a"));
        assert!(!is_remote("package://pkg/a"));
        assert!(!is_remote("meshes/a"));
    }
}
