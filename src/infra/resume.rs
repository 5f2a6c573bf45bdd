use crate::domain::ResumeRequest;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

pub const RESUME_EXECUTABLE: &str = "codex";

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("`codex` executable not found on PATH")]
    ExecutableNotFound,

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },
}

pub fn locate_resume_executable() -> Option<PathBuf> {
    which::which(RESUME_EXECUTABLE).ok()
}

/// The process the browser turns into when a session is resumed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResumeCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ResumeCommand {
    pub fn new(program: PathBuf, request: &ResumeRequest) -> Self {
        Self {
            program,
            args: vec![OsString::from("resume"), OsString::from(request.target())],
        }
    }

    pub fn display(&self) -> String {
        let mut parts = vec![RESUME_EXECUTABLE.to_string()];
        parts.extend(self.args.iter().map(|arg| arg.to_string_lossy().to_string()));
        parts.join(" ")
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }

    /// Replaces the current process. Only returns on failure.
    #[cfg(unix)]
    pub fn exec(self) -> ResumeError {
        use std::os::unix::process::CommandExt;

        let mut command = self.command();
        command.arg0(RESUME_EXECUTABLE);
        let source = command.exec();
        ResumeError::Launch {
            program: self.program.display().to_string(),
            source,
        }
    }

    /// No `exec` here: run the child to completion and exit with its status.
    #[cfg(not(unix))]
    pub fn exec(self) -> ResumeError {
        match self.command().status() {
            Ok(status) => std::process::exit(status.code().unwrap_or(1)),
            Err(source) => ResumeError::Launch {
                program: self.program.display().to_string(),
                source,
            },
        }
    }
}

/// Looks the executable up again at hand-off time; the UI may have run for a while.
pub fn prepare_resume(request: &ResumeRequest) -> Result<ResumeCommand, ResumeError> {
    let program = locate_resume_executable().ok_or(ResumeError::ExecutableNotFound)?;
    Ok(ResumeCommand::new(program, request))
}
