mod app;
mod cli;
mod domain;
mod infra;
mod ui;

use crate::app::{AppCommand, AppEvent, AppModel};
use crate::cli::{Cli, run_list};
use crate::domain::ResumeRequest;
use crate::infra::{
    ResolveSessionsDirError, ResumeError, SessionIndex, SkippedFile, default_session_glob,
    locate_resume_executable, prepare_resume, resolve_session_files, resolve_sessions_dir,
};
use clap::Parser;
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::size as terminal_size;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{ExecutableCommand, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const MISSING_EXECUTABLE_NOTICE: &str = "codex CLI not found on PATH";

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    App(#[from] crate::app::AppError),

    #[error(transparent)]
    Cli(#[from] crate::cli::CliRunError),

    #[error("unable to locate the sessions directory: {0}")]
    SessionsDir(#[from] ResolveSessionsDirError),

    #[error("No session files found for the given targets.")]
    NoSessionFiles,

    #[error("No parsable sessions found.")]
    NoParsableSessions,

    #[error("Unable to resume session: {0}.")]
    Resume(ResumeError),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(error) = run_main(cli) {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "codexer=debug" } else { "codexer=warn" };
    let filter = EnvFilter::try_from_env("CODEXER_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run_main(cli: Cli) -> Result<(), MainError> {
    let targets = if cli.targets.is_empty() {
        vec![default_session_glob(&resolve_sessions_dir()?)]
    } else {
        cli.targets.clone()
    };

    let files = resolve_session_files(&targets);
    if files.is_empty() {
        return Err(MainError::NoSessionFiles);
    }
    tracing::debug!(count = files.len(), "resolved session files");

    let build = SessionIndex::build(files);
    for skipped in &build.skipped {
        report_skipped(skipped);
    }
    let index = build.index;
    if index.is_empty() {
        return Err(MainError::NoParsableSessions);
    }

    let launch_dir = std::env::current_dir().ok();
    let config = cli.query_config(launch_dir.as_deref());
    let query = cli.initial_query();

    if cli.list {
        let view = index.evaluate(&query, &config);
        tracing::debug!(matched = view.len(), indexed = view.indexed, "evaluated listing");
        let mut out = io::stdout().lock();
        run_list(&view.sessions, cli.limit, cli.json, &mut out)?;
        return Ok(());
    }

    let model = AppModel::new(Arc::new(index), &query, config)
        .with_launch_dir(launch_dir.map(|dir| dir.display().to_string()));
    let Some(request) = run_tui(model)? else {
        return Ok(());
    };

    let command = prepare_resume(&request).map_err(MainError::Resume)?;
    tracing::debug!(command = %command.display(), "handing off to resume");
    Err(MainError::Resume(command.exec()))
}

fn report_skipped(skipped: &SkippedFile) {
    tracing::warn!(
        path = %skipped.path.display(),
        error = %skipped.error,
        "failed to read session file"
    );
}

/// Runs the browser until the user quits or picks a session to resume.
fn run_tui(mut model: AppModel) -> Result<Option<ResumeRequest>, crate::app::AppError> {
    let mut terminal = setup_terminal()?;
    if let Ok((width, height)) = terminal_size() {
        model = model.with_terminal_size(width, height);
    }
    let result = run(&mut terminal, &mut model);
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, crate::app::AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let _ = stdout.execute(EnableBracketedPaste);
    let keyboard_flags = KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
    let _ = stdout.execute(PushKeyboardEnhancementFlags(keyboard_flags));
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<(), crate::app::AppError> {
    disable_raw_mode()?;
    let _ = execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        PopKeyboardEnhancementFlags
    );
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    model: &mut AppModel,
) -> Result<Option<ResumeRequest>, crate::app::AppError> {
    loop {
        terminal.draw(|frame| ui::render(frame, model))?;

        // Redraw at least once a second so relative times stay current.
        if !event::poll(Duration::from_secs(1))? {
            continue;
        }
        let app_event = match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => AppEvent::Key(key),
            Event::Paste(text) => AppEvent::Paste(text),
            Event::Resize(width, height) => AppEvent::Resize(width, height),
            _ => continue,
        };

        let (next, command) = app::update(model.clone(), app_event);
        *model = next;
        match command {
            AppCommand::None => {}
            AppCommand::Quit => return Ok(None),
            AppCommand::Refresh => refresh_index(model),
            AppCommand::Resume(request) => {
                if locate_resume_executable().is_some() {
                    return Ok(Some(request));
                }
                tracing::debug!(target_session = %request.target(), "resume executable missing");
                *model = model
                    .clone()
                    .with_notice(Some(MISSING_EXECUTABLE_NOTICE.to_string()));
            }
        }
    }
}

fn refresh_index(model: &mut AppModel) {
    let build = model.index.refresh();
    for skipped in &build.skipped {
        tracing::debug!(
            path = %skipped.path.display(),
            error = %skipped.error,
            "session file skipped during refresh"
        );
    }
    let notice = match build.skipped.len() {
        0 => "Refreshed".to_string(),
        count => format!("Refreshed · {count} skipped"),
    };
    *model = model
        .clone()
        .with_index(Arc::new(build.index))
        .with_notice(Some(notice));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_targets_are_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pattern = dir.path().join("missing/**/*.jsonl");
        let cli = Cli::try_parse_from(["codexer".to_string(), pattern.display().to_string()])
            .expect("parse");

        let error = run_main(cli).expect_err("no files");
        assert!(matches!(error, MainError::NoSessionFiles));
        assert!(!error.to_string().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_logs_are_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("locked.jsonl");
        fs::write(&path, "{\"id\":\"locked\"}\n").expect("write log");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).expect("chmod");
        if fs::File::open(&path).is_ok() {
            // Permission bits do not bind this user (root).
            return;
        }

        let cli = Cli::try_parse_from(["codexer".to_string(), path.display().to_string()])
            .expect("parse");
        let error = run_main(cli).expect_err("nothing parsable");
        assert!(matches!(error, MainError::NoParsableSessions));
        assert!(!error.to_string().is_empty());

        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).expect("restore");
    }
}
