use crate::domain::{QueryConfig, SessionSummary, SessionView, evaluate, filter_session_indices};
use crate::infra::{ScanError, parse_session_file};
use std::path::PathBuf;
#[cfg(test)]
use std::path::Path;

/// Ordered summaries keyed by source path, plus every path the index was asked to track.
///
/// Files that failed to parse stay tracked so a later refresh can pick them back up.
#[derive(Clone, Debug, Default)]
pub struct SessionIndex {
    known_paths: Vec<PathBuf>,
    sessions: Vec<SessionSummary>,
}

#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: ScanError,
}

#[derive(Debug)]
pub struct IndexBuild {
    pub index: SessionIndex,
    pub skipped: Vec<SkippedFile>,
}

impl SessionIndex {
    /// Parses every path in order. Unreadable files are reported, not fatal.
    pub fn build(paths: Vec<PathBuf>) -> IndexBuild {
        let mut sessions = Vec::with_capacity(paths.len());
        let mut skipped = Vec::new();
        for path in &paths {
            match parse_session_file(path) {
                Ok(summary) => sessions.push(summary),
                Err(error) => skipped.push(SkippedFile {
                    path: path.clone(),
                    error,
                }),
            }
        }

        IndexBuild {
            index: SessionIndex {
                known_paths: paths,
                sessions,
            },
            skipped,
        }
    }

    /// Full rebuild from the tracked paths. Vanished or unreadable files drop out.
    pub fn refresh(&self) -> IndexBuild {
        Self::build(self.known_paths.clone())
    }

    pub fn sessions(&self) -> &[SessionSummary] {
        &self.sessions
    }

    #[cfg(test)]
    pub fn known_paths(&self) -> &[PathBuf] {
        &self.known_paths
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, source_path: &Path) -> Option<&SessionSummary> {
        self.sessions
            .iter()
            .find(|session| session.source_path == source_path)
    }

    pub fn evaluate(&self, query: &str, config: &QueryConfig) -> SessionView<'_> {
        evaluate(&self.sessions, query, config)
    }

    pub fn filtered_positions(&self, query: &str, config: &QueryConfig) -> Vec<usize> {
        filter_session_indices(&self.sessions, query, config)
    }
}
