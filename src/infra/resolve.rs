use dirs::home_dir;
use glob::{MatchOptions, glob_with};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const SESSION_LOG_EXTENSION: &str = "jsonl";

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: true,
};

/// Expands a leading `~` or `~/` to the current user's home. `~name` is left untouched.
pub fn expand_tilde(target: &str) -> PathBuf {
    let rest = if target == "~" {
        Some("")
    } else {
        target
            .strip_prefix("~/")
            .or_else(|| target.strip_prefix("~\\"))
    };
    match (rest, home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(target),
    }
}

/// Lexical cleanup: drops `.` segments, repeated and trailing separators. `..` is kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let normalized: PathBuf = path
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect();
    if normalized.as_os_str().is_empty() && !path.as_os_str().is_empty() {
        return PathBuf::from(".");
    }
    normalized
}

/// Expands files, directories and glob patterns into a deduplicated list of canonical paths.
///
/// Targets are processed in order; matches within one directory or glob come out in
/// lexicographic order. A target that matches nothing contributes nothing.
pub fn resolve_session_files(targets: &[String]) -> Vec<PathBuf> {
    let mut resolved = ResolvedFiles::default();

    for target in targets {
        let expanded = expand_tilde(target);
        if expanded.is_file() {
            resolved.record(&expanded);
        } else if expanded.is_dir() {
            for candidate in collect_dir_logs(&expanded) {
                resolved.record(&candidate);
            }
        } else if expanded.exists() {
            tracing::debug!(path = %target, "skipping target that is neither file nor directory");
        } else {
            for candidate in collect_glob_matches(&expanded) {
                resolved.record(&candidate);
            }
        }
    }

    resolved.files
}

#[derive(Default)]
struct ResolvedFiles {
    files: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl ResolvedFiles {
    fn record(&mut self, path: &Path) {
        let canonical = match fs::canonicalize(path) {
            Ok(canonical) => canonical,
            Err(error) => match std::path::absolute(path) {
                Ok(absolute) => {
                    tracing::debug!(path = %path.display(), %error, "canonicalize failed; using absolute path");
                    absolute
                }
                Err(_) => return,
            },
        };
        if self.seen.insert(canonical.clone()) {
            self.files.push(canonical);
        }
    }
}

fn collect_dir_logs(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                tracing::debug!(%error, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| {
            entry.path().extension().and_then(|ext| ext.to_str()) == Some(SESSION_LOG_EXTENSION)
        })
        .filter(|entry| {
            // Symlinked logs count when their target is a regular file.
            entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
        })
        .map(|entry| entry.into_path())
        .collect();
    found.sort();
    found
}

fn collect_glob_matches(pattern: &Path) -> Vec<PathBuf> {
    let pattern = pattern.to_string_lossy();
    let paths = match glob_with(&pattern, GLOB_OPTIONS) {
        Ok(paths) => paths,
        Err(error) => {
            tracing::debug!(pattern = %pattern, %error, "invalid glob pattern");
            return Vec::new();
        }
    };
    let mut found: Vec<PathBuf> = paths
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
        .collect();
    found.sort_by(|left, right| left.as_os_str().cmp(right.as_os_str()));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, "{}\n").expect("write");
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|path| path.file_name().expect("name").to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn directory_targets_collect_jsonl_in_path_order() {
        let dir = tempdir().expect("tempdir");
        touch(&dir.path().join("2025/02/b.jsonl"));
        touch(&dir.path().join("2025/01/c.jsonl"));
        touch(&dir.path().join("a.jsonl"));
        touch(&dir.path().join("notes.txt"));

        let files = resolve_session_files(&[dir.path().display().to_string()]);
        assert_eq!(names(&files), vec!["c.jsonl", "b.jsonl", "a.jsonl"]);
        assert!(files.iter().all(|path| path.is_absolute()));
    }

    #[test]
    fn glob_targets_support_recursive_patterns() {
        let dir = tempdir().expect("tempdir");
        touch(&dir.path().join("x/deep/one.jsonl"));
        touch(&dir.path().join("two.jsonl"));
        touch(&dir.path().join("skip.json"));
        fs::create_dir_all(dir.path().join("dir.jsonl")).expect("mkdir");

        let pattern = format!("{}/**/*.jsonl", dir.path().display());
        let files = resolve_session_files(&[pattern]);
        assert_eq!(names(&files), vec!["two.jsonl", "one.jsonl"]);
    }

    #[test]
    fn duplicates_are_dropped_and_target_order_is_kept() {
        let dir = tempdir().expect("tempdir");
        let later = dir.path().join("z.jsonl");
        let earlier = dir.path().join("a.jsonl");
        touch(&later);
        touch(&earlier);

        let files = resolve_session_files(&[
            later.display().to_string(),
            dir.path().display().to_string(),
            later.display().to_string(),
        ]);
        assert_eq!(names(&files), vec!["z.jsonl", "a.jsonl"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_resolve_to_one_canonical_entry() {
        let dir = tempdir().expect("tempdir");
        let real = dir.path().join("real.jsonl");
        touch(&real);
        let link_dir = tempdir().expect("tempdir");
        let link = link_dir.path().join("link.jsonl");
        std::os::unix::fs::symlink(&real, &link).expect("symlink");

        let files = resolve_session_files(&[
            real.display().to_string(),
            link.display().to_string(),
        ]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0], fs::canonicalize(&real).expect("canonical"));
    }

    #[cfg(unix)]
    #[test]
    fn directory_targets_include_symlinked_logs() {
        let real_dir = tempdir().expect("tempdir");
        let real = real_dir.path().join("real.jsonl");
        touch(&real);
        let scan_dir = tempdir().expect("tempdir");
        std::os::unix::fs::symlink(&real, scan_dir.path().join("linked.jsonl")).expect("symlink");
        std::os::unix::fs::symlink(real_dir.path(), scan_dir.path().join("dir.jsonl"))
            .expect("symlink");

        let files = resolve_session_files(&[scan_dir.path().display().to_string()]);
        assert_eq!(files, vec![fs::canonicalize(&real).expect("canonical")]);
    }

    #[test]
    fn glob_targets_skip_hidden_entries() {
        let dir = tempdir().expect("tempdir");
        touch(&dir.path().join("visible.jsonl"));
        touch(&dir.path().join(".dotfile.jsonl"));
        touch(&dir.path().join(".hidden/inner.jsonl"));
        touch(&dir.path().join("nested/.also-hidden.jsonl"));

        let pattern = format!("{}/**/*.jsonl", dir.path().display());
        let files = resolve_session_files(&[pattern]);
        assert_eq!(names(&files), vec!["visible.jsonl"]);
    }

    #[test]
    fn unmatched_targets_yield_nothing() {
        let dir = tempdir().expect("tempdir");
        let files = resolve_session_files(&[
            dir.path().join("missing.jsonl").display().to_string(),
            format!("{}/**/*.jsonl", dir.path().display()),
        ]);
        assert!(files.is_empty());
    }

    #[test]
    fn normalize_path_drops_redundant_segments() {
        assert_eq!(normalize_path(Path::new("/srv/api/")), PathBuf::from("/srv/api"));
        assert_eq!(normalize_path(Path::new("/srv//./api/.")), PathBuf::from("/srv/api"));
        assert_eq!(normalize_path(Path::new("./proj")), PathBuf::from("proj"));
        assert_eq!(normalize_path(Path::new("/srv/../api")), PathBuf::from("/srv/../api"));
        assert_eq!(normalize_path(Path::new(".")), PathBuf::from("."));
    }

    #[test]
    fn tilde_expands_to_home() {
        let Some(home) = home_dir() else {
            return;
        };
        assert_eq!(expand_tilde("~"), home);
        assert_eq!(expand_tilde("~/x/y"), home.join("x/y"));
        assert_eq!(expand_tilde("/abs/~"), PathBuf::from("/abs/~"));
        assert_eq!(expand_tilde("~other/x"), PathBuf::from("~other/x"));
    }
}
