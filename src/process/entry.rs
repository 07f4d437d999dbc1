//! Entry point selection.
//!
//! A folder of descriptions usually holds one top-level model plus parts it
//! includes. The selector picks the top-level one by name, then by depth:
//!
//! 1. file name contains `main` (case-insensitive)
//! 2. file name contains `robot` (case-insensitive)
//! 3. a root-level candidate, i.e. one directly inside the deepest directory
//!    shared by every candidate
//! 4. the first candidate
//!
//! Within a rule the earliest candidate in enumeration order wins.

use crate::diagnostic::NoEntryFound;
use crate::path::{file_name, parent};

/// Pick the entry document among `candidates`.
///
/// ```
/// use robot_assembly::process::select_entry;
///
/// let candidates = ["a/robot.urdf", "a/main.xacro", "b/other.urdf"];
/// assert_eq!(select_entry(&candidates).unwrap(), "a/main.xacro");
/// ```
pub fn select_entry<S: AsRef<str>>(candidates: &[S]) -> Result<&str, NoEntryFound> {
    let paths: Vec<&str> = candidates.iter().map(AsRef::as_ref).collect();
    let first = *paths.first().ok_or(NoEntryFound)?;

    let by_name = |needle: &str| {
        paths
            .iter()
            .copied()
            .find(|p| file_name(p).to_ascii_lowercase().contains(needle))
    };

    let chosen = by_name("main")
        .or_else(|| by_name("robot"))
        .or_else(|| {
            let root = common_dir(&paths);
            paths.iter().copied().find(|p| parent(p) == root)
        })
        .unwrap_or(first);

    log::debug!("selected entry {chosen} among {} candidate(s)", paths.len());
    Ok(chosen)
}

/// Deepest directory that contains every path.
fn common_dir<'a>(paths: &[&'a str]) -> &'a str {
    let Some(first) = paths.first() else {
        return "";
    };
    let mut dir = parent(first);
    while !dir.is_empty() && !paths.iter().all(|p| p.starts_with(dir) && p[dir.len()..].starts_with('/')) {
        dir = parent(dir);
    }
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fails() {
        let none: [&str; 0] = [];
        assert_eq!(select_entry(&none), Err(NoEntryFound));
    }

    #[test]
    fn test_main_wins() {
        let c = ["a/robot.urdf", "a/main.xacro", "b/other.urdf"];
        assert_eq!(select_entry(&c).unwrap(), "a/main.xacro");
    }

    #[test]
    fn test_robot_wins_over_depth() {
        let c = ["sub/robot.xacro", "sub/part.xacro"];
        assert_eq!(select_entry(&c).unwrap(), "sub/robot.xacro");
        let c = ["top.urdf", "sub/Robot_Arm.urdf"];
        assert_eq!(select_entry(&c).unwrap(), "sub/Robot_Arm.urdf");
    }

    #[test]
    fn test_case_insensitive() {
        let c = ["x/part.urdf", "x/MAIN_assembly.xacro"];
        assert_eq!(select_entry(&c).unwrap(), "x/MAIN_assembly.xacro");
    }

    #[test]
    fn test_root_level() {
        let c = ["sub/deep.urdf", "top.urdf"];
        assert_eq!(select_entry(&c).unwrap(), "top.urdf");
        let c = ["top.urdf", "sub/deep.urdf"];
        assert_eq!(select_entry(&c).unwrap(), "top.urdf");
    }

    #[test]
    fn test_root_level_under_selected_folder() {
        let c = ["bot/urdf/parts/leg.xacro", "bot/urdf/base.xacro", "bot/urdf/parts/arm.xacro"];
        assert_eq!(select_entry(&c).unwrap(), "bot/urdf/base.xacro");
    }

    #[test]
    fn test_name_only_matches_file_name() {
        let c = ["robot_pkg/a/leg.urdf", "robot_pkg/body.urdf"];
        assert_eq!(select_entry(&c).unwrap(), "robot_pkg/body.urdf");
    }

    #[test]
    fn test_single_and_stable() {
        assert_eq!(select_entry(&["only.urdf"]).unwrap(), "only.urdf");
        let c = vec!["p/a.urdf".to_string(), "q/b.urdf".to_string()];
        assert_eq!(select_entry(c.as_slice()).unwrap(), select_entry(c.as_slice()).unwrap());
    }

    #[test]
    fn test_common_dir() {
        assert_eq!(common_dir(&["a/b/c.urdf", "a/b/d/e.urdf"]), "a/b");
        assert_eq!(common_dir(&["ab/c.urdf", "a/d.urdf"]), "");
        assert_eq!(common_dir(&["c.urdf"]), "");
    }
}
