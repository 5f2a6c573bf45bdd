use crate::domain::{MatchMode, QueryConfig, SessionSummary, SortKey};
use crate::infra::{expand_tilde, normalize_path};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Search Codex CLI session logs and resume one.
#[derive(Parser, Debug, Clone)]
#[command(name = "codexer", version, about, long_about = None)]
pub struct Cli {
    /// Session files, directories or glob patterns [default: <sessions dir>/**/*.jsonl]
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Initial search keyword (repeatable; joined with spaces)
    #[arg(short = 'k', long = "keyword", value_name = "TEXT")]
    pub keywords: Vec<String>,

    /// Working-directory filter [default: current directory; "" disables]
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<String>,

    /// Match sessions containing any keyword instead of all
    #[arg(long)]
    pub match_any: bool,

    /// Sort key
    #[arg(long, value_enum, default_value_t = SortArg::Time)]
    pub sort_by: SortArg,

    /// Sort ascending instead of descending
    #[arg(long)]
    pub ascending: bool,

    /// Print matching sessions and exit instead of starting the browser
    #[arg(long)]
    pub list: bool,

    /// With --list, print one JSON object per line
    #[arg(long, requires = "list")]
    pub json: bool,

    /// With --list, print at most N sessions
    #[arg(long, value_name = "N", requires = "list")]
    pub limit: Option<usize>,

    /// Enable debug diagnostics on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SortArg {
    Time,
    Path,
    Id,
}

impl From<SortArg> for SortKey {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Time => SortKey::Time,
            SortArg::Path => SortKey::Path,
            SortArg::Id => SortKey::Id,
        }
    }
}

impl Cli {
    pub fn initial_query(&self) -> String {
        self.keywords.join(" ")
    }

    /// `launch_dir` stands in for a missing `--cwd`; an explicit empty value means no filter.
    pub fn query_config(&self, launch_dir: Option<&Path>) -> QueryConfig {
        let working_directory_filter = match self.cwd.as_deref() {
            Some("") => None,
            Some(cwd) => Some(normalize_path(&expand_tilde(cwd)).display().to_string()),
            None => launch_dir.map(|dir| dir.display().to_string()),
        };
        QueryConfig {
            working_directory_filter,
            match_mode: if self.match_any {
                MatchMode::Any
            } else {
                MatchMode::All
            },
            sort_key: self.sort_by.into(),
            sort_ascending: self.ascending,
        }
    }
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct ListRow<'a> {
    modified_at: String,
    session_id: &'a str,
    cwd: Option<&'a str>,
    working_directories: Vec<&'a str>,
    file_size_bytes: u64,
    source_path: String,
}

impl<'a> ListRow<'a> {
    fn new(session: &'a SessionSummary) -> Self {
        Self {
            modified_at: format_rfc3339(session.modified_at),
            session_id: &session.session_id,
            cwd: session.primary_working_directory.as_deref(),
            working_directories: session.ordered_cwds(),
            file_size_bytes: session.file_size_bytes,
            source_path: session.source_path.display().to_string(),
        }
    }
}

/// Prints the evaluated view, one session per line. Stops quietly when the reader goes away.
pub fn run_list(
    sessions: &[&SessionSummary],
    limit: Option<usize>,
    json: bool,
    out: &mut impl Write,
) -> Result<(), CliRunError> {
    let limit = limit.unwrap_or(usize::MAX);
    for session in sessions.iter().take(limit) {
        let line = if json {
            serde_json::to_string(&ListRow::new(session))?
        } else {
            format!(
                "{}\t{}\t{}\t{}",
                format_rfc3339(session.modified_at),
                session.session_id,
                session.display_cwd(),
                session.source_path.display()
            )
        };
        if !write_line(out, &line)? {
            break;
        }
    }
    Ok(())
}

fn format_rfc3339(moment: SystemTime) -> String {
    OffsetDateTime::from(moment)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

fn write_line(out: &mut impl Write, line: &str) -> io::Result<bool> {
    match writeln!(out, "{line}") {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(error) => Err(error),
    }
}
