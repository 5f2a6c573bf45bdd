use crate::domain::{SessionFold, SessionSummary};
use dirs::home_dir;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to open session file {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to read session file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ResolveSessionsDirError {
    #[error("home directory not found")]
    HomeDirNotFound,
}

pub fn resolve_sessions_dir() -> Result<PathBuf, ResolveSessionsDirError> {
    if let Some(override_dir) = std::env::var_os("CODEX_SESSIONS_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let Some(home) = home_dir() else {
        return Err(ResolveSessionsDirError::HomeDirNotFound);
    };

    Ok(home.join(".codex").join("sessions"))
}

pub fn default_session_glob(sessions_dir: &Path) -> String {
    sessions_dir.join("**").join("*.jsonl").display().to_string()
}

/// Reads one log file line by line and folds it into a summary.
///
/// Undecodable lines are skipped inside the fold; only I/O failures surface here.
pub fn parse_session_file(path: &Path) -> Result<SessionSummary, ScanError> {
    let file = File::open(path).map_err(|source| ScanError::Open {
        path: path.display().to_string(),
        source,
    })?;

    let mut reader = BufReader::new(file);
    let mut fold = SessionFold::new(path);
    let mut line: Vec<u8> = Vec::new();
    loop {
        line.clear();
        let bytes = reader
            .read_until(b'\n', &mut line)
            .map_err(|source| ScanError::Read {
                path: path.display().to_string(),
                source,
            })?;
        if bytes == 0 {
            break;
        }
        fold.ingest_line(&line);
    }

    let (modified_at, file_size_bytes) = match path.metadata() {
        Ok(metadata) => (
            metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            metadata.len(),
        ),
        Err(_) => (SystemTime::UNIX_EPOCH, 0),
    };

    Ok(fold.finish(modified_at, file_size_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{FileTime, set_file_mtime};
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn parses_file_and_reads_metadata() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("rollout-abc.jsonl");
        let body = concat!(
            r#"{"timestamp":"2025-06-01T10:00:00Z","type":"session_meta","payload":{"id":"0199-abc","cwd":"/tmp/proj"}}"#,
            "\n",
            r#"{"type":"response_item","payload":{"type":"message","role":"user","content":[{"type":"input_text","text":"<environment_context>\n  <cwd>/tmp/proj</cwd>\n</environment_context>"}]}}"#,
            "\n",
            r#"{"type":"response_item","payload":{"type":"message","role":"user","content":[{"type":"input_text","text":"fix the flaky test"}]}}"#,
            "\n",
            r#"{"type":"response_item","payload":{"type":"message","role":"assistant","content":[{"type":"output_text","text":"Done."}]}}"#,
            "\n",
        );
        fs::write(&path, body).expect("write");
        set_file_mtime(&path, FileTime::from_unix_time(1_700_000_000, 0)).expect("mtime");

        let summary = parse_session_file(&path).expect("parse");
        assert_eq!(summary.session_id, "0199-abc");
        assert_eq!(summary.primary_working_directory.as_deref(), Some("/tmp/proj"));
        let first = summary.first_message.expect("first");
        assert_eq!(first.role.as_deref(), Some("user"));
        assert_eq!(first.text, "fix the flaky test");
        assert_eq!(summary.last_message.expect("last").text, "Done.");
        assert_eq!(summary.file_size_bytes, body.len() as u64);
        assert_eq!(
            summary.modified_at,
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
        );
    }

    #[test]
    fn invalid_utf8_line_is_skipped_not_fatal() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("s.jsonl");
        let mut body: Vec<u8> = b"{\"role\":\"user\",\"content\":\"".to_vec();
        body.extend_from_slice(&[0xff, 0xfe]);
        body.extend_from_slice(b"\"}\n{\"role\":\"user\",\"content\":\"ok\"}");
        fs::write(&path, body).expect("write");

        let summary = parse_session_file(&path).expect("parse");
        assert_eq!(summary.first_message.expect("first").text, "ok");
        assert_eq!(summary.session_id, "s");
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let dir = tempdir().expect("tempdir");
        let error = parse_session_file(&dir.path().join("gone.jsonl")).expect_err("missing");
        assert!(matches!(error, ScanError::Open { .. }));
    }

    #[test]
    fn default_glob_targets_jsonl_recursively() {
        let glob = default_session_glob(Path::new("/home/me/.codex/sessions"));
        assert_eq!(glob, "/home/me/.codex/sessions/**/*.jsonl");
    }
}
