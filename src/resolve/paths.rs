//! Lexical path handling against the project root
//!
//! Paths are normalized without touching the filesystem so that a plan
//! never depends on symlinks or the current directory.

use std::path::{Component, Path, PathBuf};

/// Remove `.` components and fold `..` into its parent.
///
/// `..` at the filesystem root is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

/// Join a descriptor-relative path onto the root and normalize it
pub fn join_root(root: &Path, relative: &str) -> PathBuf {
    normalize(&root.join(relative))
}

/// Whether `path` is `root` or lies beneath it (both normalized)
pub fn is_within(root: &Path, path: &Path) -> bool {
    path.starts_with(root)
}

pub fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dots() {
        assert_eq!(
            normalize(Path::new("/app/./src/../src/components/")),
            PathBuf::from("/app/src/components")
        );
    }

    #[test]
    fn test_normalize_parent_at_root() {
        assert_eq!(normalize(Path::new("/../etc")), PathBuf::from("/etc"));
    }

    #[test]
    fn test_join_root() {
        let root = Path::new("/work/app");
        assert_eq!(join_root(root, "src/utils/"), PathBuf::from("/work/app/src/utils"));
        assert_eq!(join_root(root, "./dist"), PathBuf::from("/work/app/dist"));
    }

    #[test]
    fn test_is_within() {
        let root = Path::new("/work/app");
        assert!(is_within(root, &join_root(root, "src")));
        assert!(is_within(root, &join_root(root, ".")));
        assert!(!is_within(root, &join_root(root, "../other")));
        assert!(!is_within(root, Path::new("/work/application")));
    }
}
