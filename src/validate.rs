//! Field and record validation.
//!
//! The patterns here are the planner's business rules. Form entry goes through
//! [`validate_task_form`], which reports every failing field at once; bulk import
//! goes through [`validate_task_object`], which answers yes/no per record and
//! does not apply the duplicate-word rule.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::fields::Unit;
use crate::task::format_number;

/// No leading or trailing whitespace.
static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S(?:.*\S)?$").expect("valid title regex"));
/// Non-negative decimal, at most two fractional digits, no leading zeros.
static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0|[1-9][0-9]*)(\.[0-9]{1,2})?$").expect("valid duration regex"));
/// YYYY-MM-DD with month 01-12 and day 01-31.
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$").expect("valid date regex")
});
/// Letters, single spaces and hyphens.
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]+(?:[ -][A-Za-z]+)*$").expect("valid tag regex"));
/// ASCII word runs, for the duplicate-word scan.
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9_]+").expect("valid word regex"));
/// Plain decimal literal accepted by numeric coercion of settings values.
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$").expect("valid number regex")
});

/// Unsigned hex, octal or binary integer literal (`0x10`, `0o17`, `0b101`).
static RADIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^0([xXoObB])([0-9a-zA-Z]+)$").expect("valid radix regex")
});

/// Form fields that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Title,
    Duration,
    DueDate,
    Tag,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Duration => "Duration",
            Field::DueDate => "Due date",
            Field::Tag => "Tag",
        }
    }
}

/// Outcome of a form validation: one message per failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: BTreeMap<Field, String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }
}

pub fn is_valid_title(title: &str) -> bool {
    TITLE_RE.is_match(title)
}

pub fn is_valid_duration(duration: &str) -> bool {
    DURATION_RE.is_match(duration)
}

pub fn is_valid_date(date: &str) -> bool {
    DATE_RE.is_match(date)
}

pub fn is_valid_tag(tag: &str) -> bool {
    TAG_RE.is_match(tag)
}

/// True when some word is immediately repeated, separated only by whitespace.
///
/// Equivalent to `\b(\w+)\s+\1\b` over ASCII word characters, case-sensitive.
/// Word runs are maximal, so comparing neighbouring runs covers every match.
pub fn has_duplicate_words(text: &str) -> bool {
    let mut previous: Option<regex::Match<'_>> = None;
    for word in WORD_RE.find_iter(text) {
        if let Some(prev) = previous {
            let gap = &text[prev.end()..word.start()];
            if !gap.is_empty()
                && gap.chars().all(char::is_whitespace)
                && prev.as_str() == word.as_str()
            {
                return true;
            }
        }
        previous = Some(word);
    }
    false
}

/// Validate raw form input. Every field is checked; errors accumulate.
pub fn validate_task_form(title: &str, duration: &str, due_date: &str, tag: &str) -> ValidationReport {
    let mut errors = BTreeMap::new();

    if title.is_empty() {
        errors.insert(Field::Title, "Title is required".to_string());
    } else if !is_valid_title(title) {
        errors.insert(Field::Title, "Title cannot have leading or trailing spaces".to_string());
    } else if has_duplicate_words(title) {
        errors.insert(Field::Title, "Title contains duplicate words".to_string());
    }

    if duration.is_empty() {
        errors.insert(Field::Duration, "Duration is required".to_string());
    } else if !is_valid_duration(duration) {
        errors.insert(Field::Duration, "Duration must be a valid number".to_string());
    }

    if due_date.is_empty() {
        errors.insert(Field::DueDate, "Due date is required".to_string());
    } else if !is_valid_date(due_date) {
        errors.insert(Field::DueDate, "Due date must be in YYYY-MM-DD format".to_string());
    }

    if !tag.is_empty() && !is_valid_tag(tag) {
        errors.insert(
            Field::Tag,
            "Tag must contain only letters, spaces, and hyphens".to_string(),
        );
    }

    ValidationReport { errors }
}

/// Structural and format check for one imported record.
///
/// `duration` only has to be present: zero is a legal duration, so presence is
/// tested on the key rather than on the value's truthiness. The title gets the
/// whitespace check only, not the duplicate-word rule.
pub fn validate_task_object(record: &Value) -> bool {
    let Some(obj) = record.as_object() else {
        return false;
    };

    let title = obj.get("title");
    let due_date = obj.get("dueDate");
    let Some(duration) = obj.get("duration") else {
        return false;
    };
    if !truthy(obj.get("id")) || !truthy(title) || !truthy(due_date) {
        return false;
    }

    if !title.map(coerce_str).is_some_and(|t| is_valid_title(&t)) {
        return false;
    }
    if !is_valid_duration(&coerce_str(duration)) {
        return false;
    }
    if !due_date.map(coerce_str).is_some_and(|d| is_valid_date(&d)) {
        return false;
    }
    if let Some(tag) = obj.get("tag").filter(|t| truthy(Some(t))) {
        if !is_valid_tag(&coerce_str(tag)) {
            return false;
        }
    }

    true
}

/// Check a settings record: a present unit must be one of the known names and
/// a present daily target must coerce to a non-negative number.
pub fn validate_settings(record: &Value) -> bool {
    let obj = match record {
        Value::Object(obj) => obj,
        // An array is an object without any of the checked keys.
        Value::Array(_) => return true,
        _ => return false,
    };

    if let Some(unit) = obj.get("defaultUnit").filter(|u| truthy(Some(u))) {
        if unit.as_str().and_then(Unit::parse).is_none() {
            return false;
        }
    }

    if let Some(target) = obj.get("dailyTarget") {
        let n = coerce_number(target);
        // An infinite target would be stored as null.
        if !n.is_finite() || n < 0.0 {
            return false;
        }
    }

    true
}

/// Loose truthiness: absent, null, false, zero and "" are false.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// String coercion used before pattern tests.
fn coerce_str(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => coerce_str(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Numeric coercion: blank strings and null are zero, anything unparsable NaN.
/// Arrays go through their string form, so `[5]` is 5 and `[1, 2]` is NaN.
fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => number_from_str(s),
        Value::Array(_) => number_from_str(&coerce_str(value)),
        Value::Object(_) => f64::NAN,
    }
}

fn number_from_str(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    if NUMBER_RE.is_match(s) {
        return s.parse().unwrap_or(f64::NAN);
    }
    if let Some(caps) = RADIX_RE.captures(s) {
        let radix: u32 = match &caps[1] {
            "x" | "X" => 16,
            "o" | "O" => 8,
            _ => 2,
        };
        return caps[2]
            .chars()
            .try_fold(0.0_f64, |acc, c| c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d)))
            .unwrap_or(f64::NAN);
    }
    match s {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_form_passes() {
        let report = validate_task_form("Study for exam", "2.5", "2025-03-10", "Academic");
        assert!(report.is_valid(), "{:?}", report);
    }

    #[test]
    fn test_duplicate_words_flagged() {
        let report = validate_task_form("Study Study", "2", "2025-03-10", "");
        assert!(!report.is_valid());
        assert_eq!(report.error(Field::Title), Some("Title contains duplicate words"));
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_month_out_of_range() {
        let report = validate_task_form("Study", "2.5", "2025-13-40", "");
        assert!(!report.is_valid());
        assert_eq!(report.error(Field::DueDate), Some("Due date must be in YYYY-MM-DD format"));
        assert!(report.error(Field::Title).is_none());
        assert!(report.error(Field::Duration).is_none());
    }

    #[test]
    fn test_errors_accumulate() {
        let report = validate_task_form(" padded", "1.234", "", "bad_tag");
        assert_eq!(
            report.error(Field::Title),
            Some("Title cannot have leading or trailing spaces")
        );
        assert_eq!(report.error(Field::Duration), Some("Duration must be a valid number"));
        assert_eq!(report.error(Field::DueDate), Some("Due date is required"));
        assert_eq!(
            report.error(Field::Tag),
            Some("Tag must contain only letters, spaces, and hyphens")
        );
    }

    #[test]
    fn test_required_fields() {
        let report = validate_task_form("", "", "", "");
        assert_eq!(report.error(Field::Title), Some("Title is required"));
        assert_eq!(report.error(Field::Duration), Some("Duration is required"));
        assert!(report.error(Field::Tag).is_none());
    }

    #[test]
    fn test_duration_format() {
        assert!(is_valid_duration("0"));
        assert!(is_valid_duration("10.25"));
        assert!(!is_valid_duration("01"));
        assert!(!is_valid_duration("-1"));
        assert!(!is_valid_duration("1."));
        assert!(!is_valid_duration("1.123"));
    }

    #[test]
    fn test_date_accepts_digit_ranges_only() {
        assert!(is_valid_date("2025-02-30"));
        assert!(is_valid_date("2025-12-31"));
        assert!(!is_valid_date("2025-00-10"));
        assert!(!is_valid_date("2025-1-10"));
        assert!(!is_valid_date("2025-01-32"));
    }

    #[test]
    fn test_tag_format() {
        assert!(is_valid_tag("Study"));
        assert!(is_valid_tag("Self-care"));
        assert!(is_valid_tag("Group work"));
        assert!(!is_valid_tag("Group  work"));
        assert!(!is_valid_tag("-lead"));
        assert!(!is_valid_tag("tag1"));
    }

    #[test]
    fn test_duplicate_word_scan() {
        assert!(has_duplicate_words("the the end"));
        assert!(has_duplicate_words("a b\tb"));
        assert!(!has_duplicate_words("Study study"));
        assert!(!has_duplicate_words("the theory"));
        assert!(!has_duplicate_words("go, go"));
        assert!(!has_duplicate_words("single"));
    }

    #[test]
    fn test_task_object_allows_zero_duration() {
        let record = json!({"id": "t1", "title": "Rest", "duration": 0, "dueDate": "2025-01-01"});
        assert!(validate_task_object(&record));
    }

    #[test]
    fn test_task_object_skips_duplicate_word_rule() {
        let record = json!({"id": "t1", "title": "Study Study", "duration": 2, "dueDate": "2025-01-01"});
        assert!(validate_task_object(&record));
    }

    #[test]
    fn test_task_object_rejections() {
        assert!(!validate_task_object(&json!("nope")));
        assert!(!validate_task_object(&json!({"title": "A", "duration": 1, "dueDate": "2025-01-01"})));
        assert!(!validate_task_object(&json!({"id": "x", "title": "A", "dueDate": "2025-01-01"})));
        assert!(!validate_task_object(&json!({"id": "x", "title": "A", "duration": -1, "dueDate": "2025-01-01"})));
        assert!(!validate_task_object(&json!({"id": "x", "title": "A", "duration": 1.555, "dueDate": "2025-01-01"})));
        assert!(!validate_task_object(&json!({"id": "x", "title": "A", "duration": 1, "dueDate": "01/02/2025"})));
        assert!(!validate_task_object(&json!({"id": "x", "title": "A ", "duration": 1, "dueDate": "2025-01-01"})));
        assert!(!validate_task_object(
            &json!({"id": "x", "title": "A", "duration": 1, "dueDate": "2025-01-01", "tag": "a_b"})
        ));
    }

    #[test]
    fn test_task_object_accepts_string_duration_and_empty_tag() {
        let record = json!({"id": 3, "title": "Read", "duration": "1.5", "dueDate": "2025-01-01", "tag": ""});
        assert!(validate_task_object(&record));
    }

    #[test]
    fn test_settings_validation() {
        assert!(validate_settings(&json!({"defaultUnit": "hours", "dailyTarget": 60})));
        assert!(validate_settings(&json!({"dailyTarget": "90"})));
        assert!(validate_settings(&json!({})));
        assert!(!validate_settings(&json!({"defaultUnit": "days"})));
        assert!(!validate_settings(&json!({"dailyTarget": -5})));
        assert!(!validate_settings(&json!({"dailyTarget": "lots"})));
        assert!(!validate_settings(&json!(null)));
    }

    #[test]
    fn test_settings_reject_non_finite_target() {
        use crate::settings::SettingsPatch;

        for target in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let patch = SettingsPatch { default_unit: Some(Unit::Hours), daily_target: Some(target) };
            assert!(!validate_settings(&patch.to_value()), "accepted {target}");
        }
        assert!(!validate_settings(&json!({"dailyTarget": "Infinity"})));
        assert!(validate_settings(&json!({"dailyTarget": null})));
    }

    #[test]
    fn test_settings_target_number_coercion() {
        assert!(validate_settings(&json!({"dailyTarget": "0x10"})));
        assert!(validate_settings(&json!({"dailyTarget": "0b101"})));
        assert!(validate_settings(&json!({"dailyTarget": [5]})));
        assert!(validate_settings(&json!({"dailyTarget": []})));
        assert!(!validate_settings(&json!({"dailyTarget": [1, 2]})));
        assert!(!validate_settings(&json!({"dailyTarget": "0x1g"})));
        assert!(!validate_settings(&json!({"dailyTarget": "-0x10"})));
        assert_eq!(coerce_number(&json!("0o17")), 15.0);
        assert_eq!(coerce_number(&json!(["7"])), 7.0);
    }
}
