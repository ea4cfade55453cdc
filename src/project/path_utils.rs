// src/project/path_utils.rs

//! Path helpers shared by the manifest, checkpoint and cache layers.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// `path == root` yields an empty string. Returns `None` if the path cannot
/// be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_posix(rel));
    }

    // macOS hands out /private/var/... and /var/... for the same directory.
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_posix(rel));
        }
    }

    None
}

fn to_posix(rel: &Path) -> String {
    let s = rel.to_string_lossy().replace('\\', "/");
    s.strip_prefix("./").unwrap_or(&s).trim_end_matches('/').to_string()
}

/// Fold a root-relative directory into a single flat key segment.
///
/// Separators become `_`, so `"packages/web"` becomes `"packages_web"`, and
/// the root itself maps to `"root"`. Literal `_` and `%` are percent-escaped
/// (as is a directory literally named `root`), which keeps distinct
/// directories on distinct keys.
pub fn directory_key(rel_dir: &str) -> String {
    let trimmed = rel_dir.trim_matches(['/', '\\']);
    if trimmed.is_empty() || trimmed == "." {
        return "root".to_string();
    }
    if trimmed == "root" {
        return "%72oot".to_string();
    }

    let mut key = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        match c {
            '/' | '\\' => key.push('_'),
            '_' => key.push_str("%5F"),
            '%' => key.push_str("%25"),
            c => key.push(c),
        }
    }
    key
}

/// Slug used to give every project its own cache directory:
/// every non-alphanumeric character becomes `-`.
pub fn project_slug(root: &Path) -> String {
    root.to_string_lossy()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_str_strips_root() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_str(root, Path::new("/repo/packages/a/x.ts")).as_deref(),
            Some("packages/a/x.ts")
        );
        assert_eq!(relative_str(root, root).as_deref(), Some(""));
        assert_eq!(relative_str(root, Path::new("/elsewhere/x.ts")), None);
    }

    #[test]
    fn directory_key_folds_separators() {
        assert_eq!(directory_key(""), "root");
        assert_eq!(directory_key("."), "root");
        assert_eq!(directory_key("packages/web"), "packages_web");
        assert_eq!(directory_key("apps/v1.2"), "apps_v1.2");
        assert_eq!(directory_key("apps/v1_2"), "apps_v1%5F2");
    }

    #[test]
    fn look_alike_directories_get_distinct_keys() {
        let dirs = ["apps/v1.2", "apps/v1_2", "apps/v1/2", "apps/v1%5F2", "root", ""];
        let keys: std::collections::HashSet<_> = dirs.iter().map(|d| directory_key(d)).collect();
        assert_eq!(keys.len(), dirs.len());
    }

    #[test]
    fn project_slug_replaces_non_alphanumerics() {
        assert_eq!(project_slug(Path::new("/home/me/my.app")), "-home-me-my-app");
    }
}
