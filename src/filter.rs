//! List filtering and sorting used by the list views.
//!
//! Filters are applied in a fixed order: tag, then due-date range, then search.
//! All of them keep the relative order of the input.

use std::cmp::Ordering;

use chrono::{Datelike, Duration, NaiveDate};

use crate::fields::{DateRange, SortDirection, SortKey};
use crate::search::{search_tasks, try_regex_search};
use crate::task::Task;

/// The filter controls of a list view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub tag: Option<String>,
    pub date_range: DateRange,
    pub query: String,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.date_range == DateRange::All && self.query.trim().is_empty()
    }

    pub fn apply<'a, I>(&self, tasks: I, today: NaiveDate) -> Vec<&'a Task>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let by_tag = filter_by_tag(tasks, self.tag.as_deref());
        let by_date = filter_by_date(by_tag, self.date_range, today);
        apply_search(by_date, &self.query)
    }
}

/// Keep tasks whose tag equals `tag` exactly. No tag keeps everything.
pub fn filter_by_tag<'a, I>(tasks: I, tag: Option<&str>) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    match tag.filter(|t| !t.is_empty()) {
        None => tasks.into_iter().collect(),
        Some(tag) => tasks
            .into_iter()
            .filter(|t| t.tag.as_deref() == Some(tag))
            .collect(),
    }
}

/// Keep tasks whose due date falls in `range`, relative to `today`.
pub fn filter_by_date<'a, I>(tasks: I, range: DateRange, today: NaiveDate) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let tasks = tasks.into_iter();
    let today_str = format_date(today);
    match range {
        DateRange::All => tasks.collect(),
        DateRange::Today => tasks.filter(|t| t.due_date == today_str).collect(),
        DateRange::Tomorrow => {
            let tomorrow = format_date(today + Duration::days(1));
            tasks.filter(|t| t.due_date == tomorrow).collect()
        }
        DateRange::Week => {
            let week_end = format_date(today + Duration::days(7));
            tasks
                .filter(|t| t.due_date >= today_str && t.due_date <= week_end)
                .collect()
        }
        DateRange::Month => tasks
            .filter(|t| {
                // Digit-range dates like Feb 30 are not calendar days and never match.
                NaiveDate::parse_from_str(&t.due_date, "%Y-%m-%d")
                    .map(|d| d.year() == today.year() && d.month() == today.month())
                    .unwrap_or(false)
            })
            .collect(),
    }
}

/// The list view's search step: regex first, substring search when the
/// pattern does not compile.
pub fn apply_search<'a, I>(tasks: I, query: &str) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let query = query.trim();
    let tasks: Vec<&Task> = tasks.into_iter().collect();
    if query.is_empty() {
        return tasks;
    }
    match try_regex_search(tasks.iter().copied(), query) {
        Ok(hits) => hits,
        Err(_) => search_tasks(tasks, query),
    }
}

/// Stable sort by `key` in `direction`.
pub fn sort_tasks(tasks: &mut [&Task], key: SortKey, direction: SortDirection) {
    tasks.sort_by(|a, b| {
        let ord = compare(a, b, key);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

fn compare(a: &Task, b: &Task, key: SortKey) -> Ordering {
    match key {
        SortKey::Title => a
            .title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.title.cmp(&b.title)),
        SortKey::Duration => a.duration.total_cmp(&b.duration),
        SortKey::DueDate => a.due_date.cmp(&b.due_date),
    }
}

/// Unique tags in first-seen order.
pub fn distinct_tags<'a, I>(tasks: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut tags: Vec<String> = Vec::new();
    for task in tasks {
        if let Some(tag) = task.tag.as_ref().filter(|t| !t.is_empty()) {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
    }
    tags
}

/// Canonical `YYYY-MM-DD` form of a date.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: &str, title: &str, duration: f64, due: &str, tag: Option<&str>) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            title: title.to_string(),
            duration,
            due_date: due.to_string(),
            tag: tag.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 28).unwrap()
    }

    fn sample() -> Vec<Task> {
        vec![
            task("1", "essay draft", 90.0, "2025-03-28", Some("Study")),
            task("2", "Gym", 45.0, "2025-03-29", Some("Health")),
            task("3", "Budget", 20.0, "2025-04-04", None),
            task("4", "Apply", 30.0, "2025-04-05", Some("Study")),
            task("5", "Leap", 10.0, "2025-03-30", Some("Study")),
            task("6", "Old", 10.0, "2025-02-30", None),
        ]
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_filter_by_tag_is_exact() {
        let tasks = sample();
        assert_eq!(ids(&filter_by_tag(&tasks, Some("Study"))), vec!["1", "4", "5"]);
        assert!(filter_by_tag(&tasks, Some("study")).is_empty());
        assert_eq!(filter_by_tag(&tasks, None).len(), 6);
        assert_eq!(filter_by_tag(&tasks, Some("")).len(), 6);
    }

    #[test]
    fn test_date_ranges() {
        let tasks = sample();
        assert_eq!(ids(&filter_by_date(&tasks, DateRange::Today, today())), vec!["1"]);
        assert_eq!(ids(&filter_by_date(&tasks, DateRange::Tomorrow, today())), vec!["2"]);
        assert_eq!(
            ids(&filter_by_date(&tasks, DateRange::Week, today())),
            vec!["1", "2", "3", "5"]
        );
        assert_eq!(
            ids(&filter_by_date(&tasks, DateRange::Month, today())),
            vec!["1", "2", "5"]
        );
        assert_eq!(filter_by_date(&tasks, DateRange::All, today()).len(), 6);
    }

    #[test]
    fn test_apply_search_falls_back_to_substring() {
        let tasks = vec![task("1", "Fix [draft", 10.0, "2025-01-01", None), task("2", "Other", 5.0, "2025-01-01", None)];
        assert_eq!(ids(&apply_search(&tasks, "[draft")), vec!["1"]);
        assert_eq!(ids(&apply_search(&tasks, "^oth")), vec!["2"]);
        assert_eq!(apply_search(&tasks, "  ").len(), 2);
    }

    #[test]
    fn test_filter_chain() {
        let tasks = sample();
        let filter = TaskFilter {
            tag: Some("Study".into()),
            date_range: DateRange::Week,
            query: "e".into(),
        };
        assert_eq!(ids(&filter.apply(&tasks, today())), vec!["1", "5"]);
        assert!(TaskFilter::default().is_empty());
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_sorting() {
        let tasks = sample();
        let mut list: Vec<&Task> = tasks.iter().collect();

        sort_tasks(&mut list, SortKey::Title, SortDirection::Asc);
        assert_eq!(ids(&list), vec!["4", "3", "1", "2", "5", "6"]);

        sort_tasks(&mut list, SortKey::Duration, SortDirection::Desc);
        assert_eq!(ids(&list), vec!["1", "2", "4", "3", "5", "6"]);

        sort_tasks(&mut list, SortKey::DueDate, SortDirection::Asc);
        assert_eq!(ids(&list), vec!["6", "1", "2", "5", "3", "4"]);
    }

    #[test]
    fn test_distinct_tags_first_seen_order() {
        let tasks = sample();
        assert_eq!(distinct_tags(&tasks), vec!["Study", "Health"]);
    }
}
