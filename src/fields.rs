//! Enumerations and field types for the planner.
//!
//! This module defines the small closed sets the planner works with: display
//! units, sort keys and directions, due-date range filters and daily-target status.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Unit used when displaying durations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Minutes,
    Hours,
}

impl Unit {
    /// The wire name, as stored in settings.
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Minutes => "minutes",
            Unit::Hours => "hours",
        }
    }

    /// Parse a wire name. Only the exact lowercase names are accepted.
    pub fn parse(s: &str) -> Option<Unit> {
        match s {
            "minutes" => Some(Unit::Minutes),
            "hours" => Some(Unit::Hours),
            _ => None,
        }
    }

    /// Render a duration stored in minutes in this unit.
    pub fn format(self, minutes: f64) -> String {
        match self {
            Unit::Minutes => format!("{:.1} min", minutes),
            Unit::Hours => format!("{:.1} h", minutes / 60.0),
        }
    }
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum SortKey {
    Title,
    Duration,
    #[default]
    DueDate,
}

impl SortKey {
    /// Cycle to the next key (TUI sort control).
    pub fn next(self) -> SortKey {
        match self {
            SortKey::Title => SortKey::Duration,
            SortKey::Duration => SortKey::DueDate,
            SortKey::DueDate => SortKey::Title,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Title => "Title",
            SortKey::Duration => "Duration",
            SortKey::DueDate => "Due date",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggle(self) -> SortDirection {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Arrow glyph shown next to the sort control.
    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        }
    }
}

/// Filtering options for tasks based on due dates.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum DateRange {
    #[default]
    All,
    Today,
    Tomorrow,
    Week,
    Month,
}

impl DateRange {
    /// Cycle to the next range (TUI filter control).
    pub fn next(self) -> DateRange {
        match self {
            DateRange::All => DateRange::Today,
            DateRange::Today => DateRange::Tomorrow,
            DateRange::Tomorrow => DateRange::Week,
            DateRange::Week => DateRange::Month,
            DateRange::Month => DateRange::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DateRange::All => "All",
            DateRange::Today => "Today",
            DateRange::Tomorrow => "Tomorrow",
            DateRange::Week => "Next 7 days",
            DateRange::Month => "This month",
        }
    }
}

/// How close today's scheduled duration is to the daily target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    /// Today's total reached the target.
    Met,
    /// At least 70% of the target.
    Close,
    Far,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_wire_names() {
        assert_eq!(Unit::parse("minutes"), Some(Unit::Minutes));
        assert_eq!(Unit::parse("hours"), Some(Unit::Hours));
        assert_eq!(Unit::parse("Hours"), None);
        assert_eq!(serde_json::to_string(&Unit::Hours).unwrap(), "\"hours\"");
        assert_eq!(Unit::Hours.format(90.0), "1.5 h");
        assert_eq!(Unit::Minutes.format(90.0), "90.0 min");
    }

    #[test]
    fn test_cycles_return_to_start() {
        let mut key = SortKey::Title;
        for _ in 0..3 {
            key = key.next();
        }
        assert_eq!(key, SortKey::Title);

        let mut range = DateRange::All;
        for _ in 0..5 {
            range = range.next();
        }
        assert_eq!(range, DateRange::All);
        assert_eq!(SortDirection::Asc.toggle(), SortDirection::Desc);
    }
}
