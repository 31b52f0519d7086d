//! Task data structure and related functionality.
//!
//! This module defines the `Task` record kept by the store, the raw `TaskInput`
//! a form or command line hands over, and the number coercion helpers shared by
//! the validator, the import path and the display code.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

static FLOAT_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?").expect("valid float prefix regex")
});

/// A single planner entry.
///
/// The due date is kept as the canonical `YYYY-MM-DD` string rather than a
/// `NaiveDate`: the validator only checks digit ranges, so `2025-02-30` is a
/// legal due date even though it is not a calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(serialize_with = "serialize_duration")]
    pub duration: f64,
    pub due_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw field values as typed by the user, before numeric coercion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskInput {
    pub title: String,
    pub duration: String,
    pub due_date: String,
    pub tag: Option<String>,
}

impl TaskInput {
    pub fn new(
        title: impl Into<String>,
        duration: impl Into<String>,
        due_date: impl Into<String>,
        tag: Option<&str>,
    ) -> Self {
        Self {
            title: title.into(),
            duration: duration.into(),
            due_date: due_date.into(),
            tag: tag.map(str::to_string),
        }
    }

    /// Prefill an input from an existing task (edit forms).
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            duration: format_number(task.duration),
            due_date: task.due_date.clone(),
            tag: task.tag.clone(),
        }
    }

    /// The tag as stored: an empty string means no tag.
    pub fn normalized_tag(&self) -> Option<String> {
        self.tag.as_ref().filter(|t| !t.is_empty()).cloned()
    }

    /// The tag as the form validator sees it.
    pub fn tag_str(&self) -> &str {
        self.tag.as_deref().unwrap_or("")
    }

    /// Numeric duration. Unparsable input coerces to zero so a stored record
    /// always carries a finite number.
    pub fn duration_value(&self) -> f64 {
        parse_float(&self.duration).filter(|d| d.is_finite()).unwrap_or(0.0)
    }
}

impl Task {
    /// Decode one element of an imported array.
    ///
    /// Callers run `validate_task_object` first; this only does the shape
    /// conversion. Numeric ids are stringified, string durations are parsed,
    /// and missing or unparsable timestamps default to `now`.
    pub fn from_import(value: &Value, now: DateTime<Utc>) -> Option<Task> {
        let obj = value.as_object()?;
        let id = match obj.get("id")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => format_number(n.as_f64()?),
            _ => return None,
        };
        let title = obj.get("title")?.as_str()?.to_string();
        let duration = match obj.get("duration")? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => parse_float(s)?,
            _ => return None,
        };
        let due_date = obj.get("dueDate")?.as_str()?.to_string();
        let tag = obj
            .get("tag")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let timestamp = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or(now)
        };

        Some(Task {
            id,
            title,
            duration,
            due_date,
            tag,
            created_at: timestamp("createdAt"),
            updated_at: timestamp("updatedAt"),
        })
    }

    /// Compare everything except the generated id and timestamps.
    #[cfg(test)]
    pub fn same_content(&self, other: &Task) -> bool {
        self.title == other.title
            && self.duration == other.duration
            && self.due_date == other.due_date
            && self.tag == other.tag
    }
}

/// Parse the longest leading decimal literal, ignoring leading whitespace and
/// any trailing garbage (`"2.5h"` is 2.5). Returns `None` when there is no
/// numeric prefix at all.
pub fn parse_float(s: &str) -> Option<f64> {
    let trimmed = s.trim_start();
    let m = FLOAT_PREFIX_RE.find(trimmed)?;
    m.as_str().parse::<f64>().ok()
}

/// Format a number the way a user typed it: integral values carry no
/// fractional part (`2`, not `2.0`).
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        "0".to_string()
    } else if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

fn serialize_duration<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float("2.5"), Some(2.5));
        assert_eq!(parse_float("  42abc"), Some(42.0));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("1e3"), Some(1000.0));
        assert_eq!(parse_float("abc"), None);
        assert_eq!(parse_float(""), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn test_serialized_shape_uses_camel_case() {
        let now = Utc::now();
        let task = Task {
            id: "task_1".into(),
            title: "Read".into(),
            duration: 90.0,
            due_date: "2025-03-10".into(),
            tag: None,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["dueDate"], json!("2025-03-10"));
        assert_eq!(value["duration"], json!(90));
        assert!(value.get("tag").is_none());
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_from_import_coerces_fields() {
        let now = Utc::now();
        let value = json!({
            "id": 17,
            "title": "Lab report",
            "duration": "1.5",
            "dueDate": "2025-04-01",
            "tag": "",
            "createdAt": "2025-01-01T10:00:00Z"
        });
        let task = Task::from_import(&value, now).unwrap();
        assert_eq!(task.id, "17");
        assert_eq!(task.duration, 1.5);
        assert_eq!(task.tag, None);
        assert_eq!(task.created_at.to_rfc3339(), "2025-01-01T10:00:00+00:00");
        assert_eq!(task.updated_at, now);
    }

    #[test]
    fn test_from_import_rejects_non_objects() {
        assert!(Task::from_import(&json!([1, 2]), Utc::now()).is_none());
        assert!(Task::from_import(&json!({"id": "a"}), Utc::now()).is_none());
    }

    #[test]
    fn test_input_tag_and_duration() {
        let input = TaskInput::new("Gym", "abc", "2025-01-01", Some(""));
        assert_eq!(input.normalized_tag(), None);
        assert_eq!(input.duration_value(), 0.0);
        assert_eq!(input.tag_str(), "");
    }
}
