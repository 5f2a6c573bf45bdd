use crate::domain::SessionSummary;
use std::path::Path;
use std::time::{Duration, SystemTime};

const DISPLAY_ID_MAX_CHARS: usize = 28;
pub const SNIPPET_MAX_CHARS: usize = 280;

impl SessionSummary {
    pub fn short_path(&self) -> String {
        short_path_from(&self.source_path, dirs::home_dir().as_deref())
    }

    pub fn display_id(&self) -> String {
        let identifier = self
            .session_id
            .strip_prefix("rollout-")
            .unwrap_or(&self.session_id);
        truncate_chars(identifier, DISPLAY_ID_MAX_CHARS)
    }

    pub fn display_cwd(&self) -> &str {
        self.primary_working_directory
            .as_deref()
            .or_else(|| self.working_directories.first().map(String::as_str))
            .unwrap_or("—")
    }

    /// Known working directories, sorted, with the primary one first.
    pub fn ordered_cwds(&self) -> Vec<&str> {
        let primary = self
            .primary_working_directory
            .as_deref()
            .filter(|primary| self.working_directories.contains(*primary));
        let mut ordered: Vec<&str> = Vec::with_capacity(self.working_directories.len());
        ordered.extend(primary);
        ordered.extend(
            self.working_directories
                .iter()
                .map(String::as_str)
                .filter(|cwd| Some(*cwd) != primary),
        );
        ordered
    }

    pub fn relative_time(&self) -> String {
        relative_time_between(self.modified_at, SystemTime::now())
    }

    pub fn resume_target(&self) -> String {
        if self.session_id.is_empty() {
            self.source_path.display().to_string()
        } else {
            self.session_id.clone()
        }
    }
}

pub fn short_path_from(path: &Path, home: Option<&Path>) -> String {
    match home.and_then(|home| path.strip_prefix(home).ok()) {
        Some(relative) => relative.display().to_string(),
        None => path.display().to_string(),
    }
}

pub fn relative_time_between(moment: SystemTime, now: SystemTime) -> String {
    let elapsed = now.duration_since(moment).unwrap_or(Duration::ZERO);
    humanize_elapsed(elapsed.as_secs())
}

fn humanize_elapsed(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s ago");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{days}d ago");
    }
    let weeks = days / 7;
    if weeks < 5 {
        return format!("{weeks}w ago");
    }
    let months = days / 30;
    if months < 12 {
        return format!("{months}mo ago");
    }
    format!("{}y ago", days / 365)
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

/// Collapses whitespace runs to single spaces and caps the length.
pub fn format_snippet(text: &str, limit: usize) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match cleaned.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}…", cleaned[..cut].trim_end()),
        None => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;
    use std::time::UNIX_EPOCH;

    fn summary(id: &str, primary: Option<&str>, cwds: &[&str]) -> SessionSummary {
        SessionSummary {
            session_id: id.to_string(),
            source_path: PathBuf::from("/var/logs/s.jsonl"),
            modified_at: UNIX_EPOCH,
            file_size_bytes: 0,
            working_directories: cwds.iter().map(|cwd| cwd.to_string()).collect::<BTreeSet<_>>(),
            primary_working_directory: primary.map(str::to_string),
            first_message: None,
            last_message: None,
            search_corpus: String::new(),
        }
    }

    #[test]
    fn display_id_strips_rollout_and_truncates() {
        let session = summary("rollout-2025-01-01T10-00-00-0123456789abcdef", None, &[]);
        assert_eq!(session.display_id(), "2025-01-01T10-00-00-01234567…");
        assert_eq!(summary("short", None, &[]).display_id(), "short");
    }

    #[test]
    fn cwd_accessors_prefer_primary() {
        let session = summary("s", Some("/z"), &["/a", "/z", "/m"]);
        assert_eq!(session.display_cwd(), "/z");
        assert_eq!(session.ordered_cwds(), vec!["/z", "/a", "/m"]);

        let session = summary("s", None, &["/m", "/a"]);
        assert_eq!(session.display_cwd(), "/a");
        assert_eq!(session.ordered_cwds(), vec!["/a", "/m"]);

        assert_eq!(summary("s", None, &[]).display_cwd(), "—");
    }

    #[test]
    fn short_path_is_home_relative() {
        let home = Path::new("/home/me");
        assert_eq!(
            short_path_from(Path::new("/home/me/.codex/s.jsonl"), Some(home)),
            ".codex/s.jsonl"
        );
        assert_eq!(
            short_path_from(Path::new("/tmp/s.jsonl"), Some(home)),
            "/tmp/s.jsonl"
        );
        assert_eq!(short_path_from(Path::new("/tmp/s.jsonl"), None), "/tmp/s.jsonl");
    }

    #[test]
    fn relative_time_buckets() {
        let now = UNIX_EPOCH + Duration::from_secs(10 * 365 * 86_400);
        let ago = |secs: u64| relative_time_between(now - Duration::from_secs(secs), now);
        assert_eq!(ago(5), "5s ago");
        assert_eq!(ago(120), "2m ago");
        assert_eq!(ago(3 * 3600), "3h ago");
        assert_eq!(ago(2 * 86_400), "2d ago");
        assert_eq!(ago(14 * 86_400), "2w ago");
        assert_eq!(ago(40 * 86_400), "1mo ago");
        assert_eq!(ago(800 * 86_400), "2y ago");
        assert_eq!(relative_time_between(now + Duration::from_secs(30), now), "0s ago");
    }

    #[test]
    fn snippet_collapses_whitespace_and_truncates() {
        assert_eq!(format_snippet("  a\n\n b\tc ", 280), "a b c");
        assert_eq!(format_snippet("abcdef", 3), "abc…");
        assert_eq!(format_snippet("ab cd", 3), "ab…");
    }

    #[test]
    fn resume_target_prefers_id() {
        assert_eq!(summary("sid", None, &[]).resume_target(), "sid");
        assert_eq!(summary("", None, &[]).resume_target(), "/var/logs/s.jsonl");
    }
}
