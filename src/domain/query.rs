use crate::domain::{MatchMode, QueryConfig, SessionSummary, SortKey};
use std::cmp::Ordering;

/// Whitespace-delimited, lower-cased query tokens.
pub fn tokenize_query(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

pub fn session_matches(session: &SessionSummary, tokens: &[String], config: &QueryConfig) -> bool {
    if let Some(filter) = config.active_cwd_filter() {
        if !session.working_directories.contains(filter) {
            return false;
        }
    }
    if tokens.is_empty() {
        return true;
    }
    let corpus = session.search_corpus.as_str();
    match config.match_mode {
        MatchMode::All => tokens.iter().all(|token| corpus.contains(token.as_str())),
        MatchMode::Any => tokens.iter().any(|token| corpus.contains(token.as_str())),
    }
}

fn compare_by_key(left: &SessionSummary, right: &SessionSummary, key: SortKey) -> Ordering {
    match key {
        SortKey::Time => left.modified_at.cmp(&right.modified_at),
        SortKey::Path => left
            .source_path
            .as_os_str()
            .cmp(right.source_path.as_os_str()),
        SortKey::Id => left.session_id.cmp(&right.session_id),
    }
}

/// Positions into `sessions` that pass the filters, in view order.
///
/// The sort is stable in both directions: entries with equal keys keep their index order.
pub fn filter_session_indices(
    sessions: &[SessionSummary],
    query: &str,
    config: &QueryConfig,
) -> Vec<usize> {
    let tokens = tokenize_query(query);
    let mut indices: Vec<usize> = sessions
        .iter()
        .enumerate()
        .filter_map(|(index, session)| session_matches(session, &tokens, config).then_some(index))
        .collect();

    indices.sort_by(|&left, &right| {
        let ordering = compare_by_key(&sessions[left], &sessions[right], config.sort_key);
        if config.sort_ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
    indices
}

/// One evaluation of the query engine.
#[derive(Clone, Debug)]
pub struct SessionView<'a> {
    pub sessions: Vec<&'a SessionSummary>,
    pub indexed: usize,
}

impl<'a> SessionView<'a> {
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// True when the index itself held nothing, as opposed to nothing matching.
    pub fn nothing_loaded(&self) -> bool {
        self.indexed == 0
    }
}

pub fn evaluate<'a>(
    sessions: &'a [SessionSummary],
    query: &str,
    config: &QueryConfig,
) -> SessionView<'a> {
    let sessions_view = filter_session_indices(sessions, query, config)
        .into_iter()
        .map(|index| &sessions[index])
        .collect();
    SessionView {
        sessions: sessions_view,
        indexed: sessions.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;
    use std::time::{Duration, UNIX_EPOCH};

    fn session(id: &str, path: &str, secs: u64, corpus: &str, cwds: &[&str]) -> SessionSummary {
        SessionSummary {
            session_id: id.to_string(),
            source_path: PathBuf::from(path),
            modified_at: UNIX_EPOCH + Duration::from_secs(secs),
            file_size_bytes: 0,
            working_directories: cwds.iter().map(|cwd| cwd.to_string()).collect::<BTreeSet<_>>(),
            primary_working_directory: cwds.first().map(|cwd| cwd.to_string()),
            first_message: None,
            last_message: None,
            search_corpus: corpus.to_string(),
        }
    }

    fn ids(view: &SessionView<'_>) -> Vec<String> {
        view.sessions
            .iter()
            .map(|session| session.session_id.clone())
            .collect()
    }

    fn sample() -> Vec<SessionSummary> {
        vec![
            session("b", "/logs/2.jsonl", 20, "deploy started", &["/srv/app"]),
            session("a", "/logs/1.jsonl", 30, "deploy error trace", &["/srv/app"]),
            session("c", "/logs/3.jsonl", 10, "unrelated error", &["/home/me"]),
        ]
    }

    #[test]
    fn tokenizes_on_whitespace_and_lowercases() {
        assert_eq!(tokenize_query("  Deploy\tERROR \n"), vec!["deploy", "error"]);
        assert!(tokenize_query("   ").is_empty());
    }

    #[test]
    fn all_and_any_modes() {
        let sessions = sample();
        let mut config = QueryConfig::default();
        let view = evaluate(&sessions, "Deploy error", &config);
        assert_eq!(ids(&view), vec!["a"]);

        config.match_mode = MatchMode::Any;
        let view = evaluate(&sessions, "deploy error", &config);
        assert_eq!(ids(&view), vec!["a", "b", "c"]);
    }

    #[test]
    fn cwd_filter_is_exact_membership() {
        let sessions = sample();
        let config = QueryConfig {
            working_directory_filter: Some("/srv/app".to_string()),
            ..QueryConfig::default()
        };
        assert_eq!(ids(&evaluate(&sessions, "", &config)), vec!["a", "b"]);

        let config = QueryConfig {
            working_directory_filter: Some("/srv".to_string()),
            ..QueryConfig::default()
        };
        assert!(evaluate(&sessions, "", &config).is_empty());

        let config = QueryConfig {
            working_directory_filter: Some(String::new()),
            ..QueryConfig::default()
        };
        assert_eq!(evaluate(&sessions, "", &config).len(), 3);
    }

    #[test]
    fn sorts_by_each_key() {
        let sessions = sample();
        let mut config = QueryConfig::default();
        assert_eq!(ids(&evaluate(&sessions, "", &config)), vec!["a", "b", "c"]);

        config.sort_key = SortKey::Path;
        config.sort_ascending = true;
        assert_eq!(ids(&evaluate(&sessions, "", &config)), vec!["a", "b", "c"]);

        config.sort_key = SortKey::Id;
        config.sort_ascending = false;
        assert_eq!(ids(&evaluate(&sessions, "", &config)), vec!["c", "b", "a"]);
    }

    #[test]
    fn time_ascending_is_reverse_of_descending() {
        let sessions = sample();
        let mut config = QueryConfig::default();
        let descending = ids(&evaluate(&sessions, "", &config));
        config.sort_ascending = true;
        let mut ascending = ids(&evaluate(&sessions, "", &config));
        ascending.reverse();
        assert_eq!(descending, ascending);
    }

    #[test]
    fn equal_keys_keep_index_order_in_both_directions() {
        let sessions = vec![
            session("x", "/l/x", 5, "", &[]),
            session("y", "/l/y", 5, "", &[]),
            session("z", "/l/z", 5, "", &[]),
        ];
        let mut config = QueryConfig::default();
        assert_eq!(ids(&evaluate(&sessions, "", &config)), vec!["x", "y", "z"]);
        config.sort_ascending = true;
        assert_eq!(ids(&evaluate(&sessions, "", &config)), vec!["x", "y", "z"]);
    }

    #[test]
    fn more_tokens_shrink_all_and_grow_any() {
        let sessions = sample();
        let queries = ["deploy", "deploy error", "deploy error trace"];
        let mut config = QueryConfig::default();

        let sizes: Vec<usize> = queries
            .iter()
            .map(|query| evaluate(&sessions, query, &config).len())
            .collect();
        assert!(sizes.windows(2).all(|pair| pair[1] <= pair[0]));

        config.match_mode = MatchMode::Any;
        let sizes: Vec<usize> = queries
            .iter()
            .map(|query| evaluate(&sessions, query, &config).len())
            .collect();
        assert!(sizes.windows(2).all(|pair| pair[1] >= pair[0]));
    }

    #[test]
    fn empty_result_is_distinct_from_empty_index() {
        let sessions = sample();
        let view = evaluate(&sessions, "nothing-matches-this", &QueryConfig::default());
        assert!(view.is_empty());
        assert!(!view.nothing_loaded());

        let view = evaluate(&[], "", &QueryConfig::default());
        assert!(view.nothing_loaded());
    }
}
