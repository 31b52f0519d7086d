//! Text search over task lists.
//!
//! Two modes: plain case-insensitive substring search, and a power-user regex
//! mode that must never fail the caller. Both look at title, tag and due date.
//! Highlighting is literal: the query is escaped before it is compiled.

use std::ops::Range;

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crate::task::Task;

/// Substring search. A blank query returns every task in the original order.
///
/// The term is trimmed and lower-cased; title and tag match case-insensitively,
/// the due date matches verbatim since it is already canonical digits.
pub fn search_tasks<'a, I>(tasks: I, query: &str) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let tasks = tasks.into_iter();
    if query.trim().is_empty() {
        return tasks.collect();
    }

    let term = query.to_lowercase();
    let term = term.trim();

    let hits: Vec<&Task> = tasks
        .filter(|task| {
            task.title.to_lowercase().contains(term)
                || task
                    .tag
                    .as_ref()
                    .is_some_and(|tag| tag.to_lowercase().contains(term))
                || task.due_date.contains(term)
        })
        .collect();
    debug!(query = term, hits = hits.len(), "substring search");
    hits
}

/// Regex search that swallows compile errors: an invalid pattern yields the
/// unfiltered input.
pub fn regex_search<'a, I>(tasks: I, pattern: &str) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let tasks: Vec<&Task> = tasks.into_iter().collect();
    match try_regex_search(tasks.iter().copied(), pattern) {
        Ok(hits) => hits,
        Err(err) => {
            warn!(pattern, error = %err, "invalid search pattern, returning all tasks");
            tasks
        }
    }
}

/// Regex search with the compile step exposed, so callers can choose their own
/// fallback. A blank pattern returns every task.
pub fn try_regex_search<'a, I>(tasks: I, pattern: &str) -> Result<Vec<&'a Task>, regex::Error>
where
    I: IntoIterator<Item = &'a Task>,
{
    let tasks = tasks.into_iter();
    if pattern.trim().is_empty() {
        return Ok(tasks.collect());
    }

    let re = compile_pattern(pattern)?;
    let hits: Vec<&Task> = tasks
        .filter(|task| {
            re.is_match(&task.title)
                || task.tag.as_ref().is_some_and(|tag| re.is_match(tag))
                || re.is_match(&task.due_date)
        })
        .collect();
    debug!(pattern, hits = hits.len(), "regex search");
    Ok(hits)
}

/// Compile a user pattern case-insensitively.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Wrap every case-insensitive literal occurrence of `query` in `<mark>` tags,
/// keeping the original casing inside the marker.
pub fn highlight_matches(text: &str, query: &str) -> String {
    let spans = highlight_spans(text, query);
    if spans.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + spans.len() * 13);
    let mut last = 0;
    for span in spans {
        out.push_str(&text[last..span.start]);
        out.push_str("<mark>");
        out.push_str(&text[span.clone()]);
        out.push_str("</mark>");
        last = span.end;
    }
    out.push_str(&text[last..]);
    out
}

/// Byte ranges of the literal matches `highlight_matches` would mark.
pub fn highlight_spans(text: &str, query: &str) -> Vec<Range<usize>> {
    let term = query.trim();
    if text.is_empty() || term.is_empty() {
        return Vec::new();
    }

    match compile_pattern(&regex::escape(term)) {
        Ok(re) => re.find_iter(text).map(|m| m.range()).collect(),
        // An escaped literal only fails on size limits.
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: &str, title: &str, due: &str, tag: Option<&str>) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            title: title.to_string(),
            duration: 30.0,
            due_date: due.to_string(),
            tag: tag.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample() -> Vec<Task> {
        vec![
            task("1", "Team Meeting", "2025-03-10", Some("Work")),
            task("2", "Read chapter 4", "2025-03-11", Some("Study")),
            task("3", "Gym", "2025-04-01", None),
        ]
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_blank_query_returns_everything_in_order() {
        let tasks = sample();
        assert_eq!(ids(&search_tasks(&tasks, "")), vec!["1", "2", "3"]);
        assert_eq!(ids(&search_tasks(&tasks, "   ")), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_substring_matches_title_tag_and_date() {
        let tasks = sample();
        assert_eq!(ids(&search_tasks(&tasks, "  MEET ")), vec!["1"]);
        assert_eq!(ids(&search_tasks(&tasks, "study")), vec!["2"]);
        assert_eq!(ids(&search_tasks(&tasks, "2025-03")), vec!["1", "2"]);
        assert!(search_tasks(&tasks, "nothing").is_empty());
    }

    #[test]
    fn test_search_is_idempotent_on_its_output() {
        let tasks = sample();
        let once = search_tasks(&tasks, "e");
        let twice = search_tasks(once.iter().copied(), "e");
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn test_regex_search_matches_case_insensitively() {
        let tasks = sample();
        assert_eq!(ids(&regex_search(&tasks, "^team")), vec!["1"]);
        assert_eq!(ids(&regex_search(&tasks, r"-04-\d{2}$")), vec!["3"]);
        assert_eq!(ids(&regex_search(&tasks, "work|study")), vec!["1", "2"]);
    }

    #[test]
    fn test_invalid_regex_returns_input_unchanged() {
        let tasks = sample();
        assert_eq!(ids(&regex_search(&tasks, "[")), vec!["1", "2", "3"]);
        assert!(try_regex_search(&tasks, "[").is_err());
    }

    #[test]
    fn test_highlight_preserves_case() {
        assert_eq!(highlight_matches("Team Meeting", "team"), "<mark>Team</mark> Meeting");
        assert_eq!(
            highlight_matches("aa Aa", "a"),
            "<mark>a</mark><mark>a</mark> <mark>A</mark><mark>a</mark>"
        );
    }

    #[test]
    fn test_highlight_is_literal() {
        assert_eq!(highlight_matches("cost (est.)", "(est.)"), "cost <mark>(est.)</mark>");
        assert_eq!(highlight_matches("a.b", "."), "a<mark>.</mark>b");
    }

    #[test]
    fn test_highlight_empty_inputs() {
        assert_eq!(highlight_matches("", "x"), "");
        assert_eq!(highlight_matches("Team", ""), "Team");
        assert_eq!(highlight_matches("Team", "  "), "Team");
        assert_eq!(highlight_spans("Team Meeting", "ee"), vec![6..8]);
    }
}
