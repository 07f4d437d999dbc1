//! Package-style references.
//!
//! Robot descriptions address meshes and included fragments as
//! `package://<name>/<path>` (or `$(find <name>)/<path>`, which
//! [`substitute_package_macros`](crate::path::substitute_package_macros)
//! rewrites into that form). A package has no location of its own here: it
//! is re-based under a [`PackageRoot`] derived from how the model was loaded.

use std::fmt;

use crate::path::{first_segment, join_base, normalize, PACKAGE_SCHEME};

/// A parsed `package://<name>/<path>` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRef {
    name: String,
    path: String,
}

impl PackageRef {
    /// Parse a canonical package reference. Returns `None` for anything else.
    ///
    /// ```
    /// use robot_assembly::resource::package::PackageRef;
    ///
    /// let pkg = PackageRef::parse("package://arm_description/meshes/base.stl").unwrap();
    /// assert_eq!(pkg.name(), "arm_description");
    /// assert_eq!(pkg.path(), "meshes/base.stl");
    /// ```
    pub fn parse(canonical: &str) -> Option<Self> {
        let rest = canonical.strip_prefix(PACKAGE_SCHEME)?;
        let (name, path) = rest.split_once('/').unwrap_or((rest, ""));
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            path: normalize(path),
        })
    }

    /// Package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized path inside the package.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Re-base the package path under `root`.
    pub fn rebase(&self, root: &PackageRoot) -> String {
        match root {
            PackageRoot::Hierarchical(dir) => normalize(&format!("{dir}/{}", self.path)),
            PackageRoot::Flat(base) => join_base(base, &self.path),
        }
    }

    /// Index keys worth trying for this reference, most likely first.
    ///
    /// After the re-based key come `<name>/<path>` (a workspace holding
    /// several packages side by side) and the bare `<path>`.
    pub fn lookup_keys(&self, root: &PackageRoot) -> Vec<String> {
        let mut keys = vec![
            self.rebase(root),
            normalize(&format!("{}/{}", self.name, self.path)),
            self.path.clone(),
        ];
        let mut seen = rustc_hash::FxHashSet::default();
        keys.retain(|k| seen.insert(k.clone()));
        keys
    }

    /// Suffix that identifies this file anywhere in a deeper tree.
    pub fn nested_suffix(&self) -> String {
        format!("/{}/{}", self.name, self.path)
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PACKAGE_SCHEME}{}/{}", self.name, self.path)
    }
}

/// Where package references are re-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageRoot {
    /// Hierarchical source: the first path segment of the entry document.
    Hierarchical(String),
    /// Flat source: the configured static base path or URL.
    Flat(String),
}

impl PackageRoot {
    /// Derive the package root for an entry document.
    ///
    /// An entry inside a directory uses its first segment; a root-level
    /// entry falls back to `static_base`.
    pub fn for_entry(entry: &str, static_base: &str) -> Self {
        match first_segment(entry) {
            Some(segment) => Self::Hierarchical(segment.to_string()),
            None => Self::Flat(static_base.to_string()),
        }
    }
}

/// Strip the `package://` scheme from `canonical` and re-base the remainder
/// under `root`. Non-package references are returned unchanged.
///
/// ```
/// use robot_assembly::resource::package::{package_to_index_key_or_url, PackageRoot};
///
/// let root = PackageRoot::Hierarchical("my_robot".into());
/// assert_eq!(
///     package_to_index_key_or_url("package://my_robot/meshes/a.stl", &root),
///     "my_robot/meshes/a.stl",
/// );
/// ```
pub fn package_to_index_key_or_url(canonical: &str, root: &PackageRoot) -> String {
    match PackageRef::parse(canonical) {
        Some(pkg) => pkg.rebase(root),
        None => canonical.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let pkg = PackageRef::parse("package://pkg/./meshes/../meshes/a.stl").unwrap();
        assert_eq!(pkg.name(), "pkg");
        assert_eq!(pkg.path(), "meshes/a.stl");
        assert_eq!(pkg.to_string(), "package://pkg/meshes/a.stl");

        assert!(PackageRef::parse("package:///meshes/a.stl").is_none());
        assert!(PackageRef::parse("meshes/a.stl").is_none());
    }

    #[test]
    fn test_rebase_hierarchical() {
        let root = PackageRoot::for_entry("upload/urdf/robot.urdf", "/");
        assert_eq!(root, PackageRoot::Hierarchical("upload".into()));
        assert_eq!(
            package_to_index_key_or_url("package://robot_pkg/meshes/a.stl", &root),
            "upload/meshes/a.stl"
        );
    }

    #[test]
    fn test_rebase_flat() {
        let root = PackageRoot::for_entry("robot.urdf", "https://host/static/");
        assert_eq!(root, PackageRoot::Flat("https://host/static/".into()));
        assert_eq!(
            package_to_index_key_or_url("package://robot_pkg/meshes/a.stl", &root),
            "https://host/static/meshes/a.stl"
        );
    }

    #[test]
    fn test_non_package_unchanged() {
        let root = PackageRoot::Flat("/".into());
        assert_eq!(package_to_index_key_or_url("meshes/a.stl", &root), "meshes/a.stl");
    }

    #[test]
    fn test_lookup_keys() {
        let pkg = PackageRef::parse("package://arm/meshes/a.stl").unwrap();
        let root = PackageRoot::Hierarchical("ws".into());
        assert_eq!(
            pkg.lookup_keys(&root),
            vec!["ws/meshes/a.stl", "arm/meshes/a.stl", "meshes/a.stl"]
        );
        assert_eq!(pkg.nested_suffix(), "/arm/meshes/a.stl");

        let same = PackageRoot::Hierarchical("arm".into());
        assert_eq!(pkg.lookup_keys(&same), vec!["arm/meshes/a.stl", "meshes/a.stl"]);
    }
}
