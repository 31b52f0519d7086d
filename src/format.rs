//! Display and input helpers shared by the CLI and the TUI.

use chrono::{Datelike, Duration, NaiveDate};

use crate::filter::format_date;
use crate::task::Task;

/// Characters of an id shown in tables: `task_` plus seven hex digits.
pub const SHORT_ID_LEN: usize = 12;

/// Leading part of an id, enough to address a task from the command line.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Due date relative to today ("today", "in 3d", "2d late"). Dates that are
/// not calendar days are shown as stored.
pub fn due_relative(due: &str, today: NaiveDate) -> String {
    let Ok(date) = NaiveDate::parse_from_str(due, "%Y-%m-%d") else {
        return due.to_string();
    };
    match (date - today).num_days() {
        0 => "today".into(),
        1 => "tomorrow".into(),
        n if n > 1 => format!("in {n}d"),
        n => format!("{}d late", -n),
    }
}

/// Expand a due-date shorthand into `YYYY-MM-DD`.
///
/// Accepts "today", "tomorrow", "yesterday", "eow", "eom" and "in Nd". Any
/// other input is returned unchanged for the validator to judge.
pub fn parse_due_input(s: &str, today: NaiveDate) -> String {
    let lowered = s.trim().to_lowercase();
    let date = match lowered.as_str() {
        "today" => Some(today),
        "tomorrow" => Some(today + Duration::days(1)),
        "yesterday" => Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let days_to_sunday = 6 - i64::from(today.weekday().num_days_from_monday());
            Some(today + Duration::days(days_to_sunday))
        }
        "end of month" | "eom" => end_of_month(today),
        other => other
            .strip_prefix("in ")
            .and_then(|rest| rest.strip_suffix('d'))
            .and_then(|n| n.trim().parse::<i64>().ok())
            .map(|days| today + Duration::days(days)),
    };
    match date {
        Some(d) => format_date(d),
        None => s.to_string(),
    }
}

fn end_of_month(today: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).map(|first| first - Duration::days(1))
}

/// Resolve a command-line task reference: an exact id, a unique id prefix, or
/// a unique case-insensitive title.
pub fn resolve_task_id(identifier: &str, tasks: &[Task]) -> Result<String, String> {
    if let Some(task) = tasks.iter().find(|t| t.id == identifier) {
        return Ok(task.id.clone());
    }

    let by_prefix: Vec<&Task> = tasks.iter().filter(|t| t.id.starts_with(identifier)).collect();
    if by_prefix.len() == 1 {
        return Ok(by_prefix[0].id.clone());
    }

    let lowered = identifier.to_lowercase();
    let by_title: Vec<&Task> = tasks.iter().filter(|t| t.title.to_lowercase() == lowered).collect();
    let matches = if by_title.is_empty() { by_prefix } else { by_title };

    match matches.len() {
        0 => Err(format!("No task found matching '{}'", identifier)),
        1 => Ok(matches[0].id.clone()),
        _ => {
            let mut msg = format!("Multiple tasks match '{}':\n", identifier);
            for task in matches {
                msg.push_str(&format!("  {}: {} (due {})\n", short_id(&task.id), task.title, task.due_date));
            }
            msg.push_str("Please use a longer id instead.");
            Err(msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: &str, title: &str) -> Task {
        let now = Utc::now();
        Task {
            id: id.into(),
            title: title.into(),
            duration: 10.0,
            due_date: "2025-03-10".into(),
            tag: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn today() -> NaiveDate {
        // A Wednesday.
        NaiveDate::from_ymd_opt(2025, 2, 12).unwrap()
    }

    #[test]
    fn test_short_id_and_truncate() {
        assert_eq!(short_id("task_0123456789abcdef"), "task_0123456");
        assert_eq!(short_id("17"), "17");
        assert_eq!(truncate("hello world", 6), "hello…");
        assert_eq!(truncate("hi", 6), "hi");
    }

    #[test]
    fn test_due_relative() {
        assert_eq!(due_relative("2025-02-12", today()), "today");
        assert_eq!(due_relative("2025-02-13", today()), "tomorrow");
        assert_eq!(due_relative("2025-02-15", today()), "in 3d");
        assert_eq!(due_relative("2025-02-10", today()), "2d late");
        assert_eq!(due_relative("2025-02-30", today()), "2025-02-30");
    }

    #[test]
    fn test_parse_due_input() {
        assert_eq!(parse_due_input("today", today()), "2025-02-12");
        assert_eq!(parse_due_input("Tomorrow", today()), "2025-02-13");
        assert_eq!(parse_due_input("in 5d", today()), "2025-02-17");
        assert_eq!(parse_due_input("eow", today()), "2025-02-16");
        assert_eq!(parse_due_input("eom", today()), "2025-02-28");
        assert_eq!(parse_due_input("2025-13-01", today()), "2025-13-01");
    }

    #[test]
    fn test_resolve_task_id() {
        let tasks = vec![
            task("task_aaa111", "Read"),
            task("task_aab222", "Write"),
            task("task_bbb333", "write"),
        ];
        assert_eq!(resolve_task_id("task_aaa111", &tasks).unwrap(), "task_aaa111");
        assert_eq!(resolve_task_id("task_aab", &tasks).unwrap(), "task_aab222");
        assert_eq!(resolve_task_id("read", &tasks).unwrap(), "task_aaa111");
        assert!(resolve_task_id("task_aa", &tasks).unwrap_err().starts_with("Multiple"));
        assert!(resolve_task_id("WRITE", &tasks).unwrap_err().starts_with("Multiple"));
        assert!(resolve_task_id("nothing", &tasks).unwrap_err().starts_with("No task"));
    }
}
