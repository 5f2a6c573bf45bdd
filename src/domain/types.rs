use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::SystemTime;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionMessage {
    pub role: Option<String>,
    pub text: String,
}

impl SessionMessage {
    pub fn role_label(&self) -> &str {
        self.role.as_deref().unwrap_or("unknown")
    }
}

/// Digest of one session log. Built once by the parser and never mutated; a refresh replaces
/// it wholesale.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionSummary {
    pub session_id: String,
    pub source_path: PathBuf,
    pub modified_at: SystemTime,
    pub file_size_bytes: u64,
    pub working_directories: BTreeSet<String>,
    pub primary_working_directory: Option<String>,
    pub first_message: Option<SessionMessage>,
    pub last_message: Option<SessionMessage>,
    pub search_corpus: String,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MatchMode {
    #[default]
    All,
    Any,
}

impl MatchMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::All => Self::Any,
            Self::Any => Self::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Any => "ANY",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortKey {
    #[default]
    Time,
    Path,
    Id,
}

impl SortKey {
    pub fn next(self) -> Self {
        match self {
            Self::Time => Self::Path,
            Self::Path => Self::Id,
            Self::Id => Self::Time,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Time => "Time",
            Self::Path => "Path",
            Self::Id => "ID",
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryConfig {
    pub working_directory_filter: Option<String>,
    pub match_mode: MatchMode,
    pub sort_key: SortKey,
    pub sort_ascending: bool,
}

impl QueryConfig {
    /// Filter value that actually constrains results; a blank filter means "any".
    pub fn active_cwd_filter(&self) -> Option<&str> {
        self.working_directory_filter
            .as_deref()
            .filter(|value| !value.is_empty())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResumeRequest {
    pub session_path: PathBuf,
    pub session_id: Option<String>,
}

impl ResumeRequest {
    pub fn for_session(session: &SessionSummary) -> Self {
        Self {
            session_path: session.source_path.clone(),
            session_id: Some(session.session_id.clone()).filter(|id| !id.is_empty()),
        }
    }

    pub fn target(&self) -> String {
        match &self.session_id {
            Some(id) => id.clone(),
            None => self.session_path.display().to_string(),
        }
    }
}
