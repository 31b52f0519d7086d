//! Dashboard statistics derived from the task list.
//!
//! Nothing here is stored: every figure is recomputed from the current tasks
//! and settings on demand. `today` is passed in so the numbers are testable.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::fields::TargetStatus;
use crate::filter::format_date;
use crate::settings::Settings;
use crate::task::Task;

/// Number of days in the trend window, ending today.
pub const TREND_DAYS: i64 = 7;
/// Smallest bar height so empty days stay visible.
const MIN_BAR_PERCENT: f64 = 5.0;
/// Share of the target that counts as close.
const CLOSE_RATIO: f64 = 0.7;

/// Count and total duration of an arbitrary (possibly filtered) list.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TaskStats {
    pub count: usize,
    pub total_duration: f64,
}

impl TaskStats {
    pub fn of<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        tasks.into_iter().fold(TaskStats::default(), |acc, t| TaskStats {
            count: acc.count + 1,
            total_duration: acc.total_duration + t.duration,
        })
    }
}

/// One day of the trend chart.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    /// Short weekday name ("Mon").
    pub label: String,
    pub count: usize,
    pub duration: f64,
    /// Bar height relative to the busiest day, floored at 5%.
    pub bar_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub total_tasks: usize,
    pub total_duration: f64,
    pub average_duration: f64,
    pub top_tag: Option<String>,
    /// Oldest first; the last bucket is today.
    pub week: Vec<DayBucket>,
    pub today_duration: f64,
    pub daily_target: f64,
    /// Clamped to 0..=100.
    pub completion_percent: f64,
    pub remaining: f64,
    pub target_status: TargetStatus,
}

impl Dashboard {
    pub fn compute(tasks: &[Task], settings: &Settings, today: NaiveDate) -> Self {
        let totals = TaskStats::of(tasks);
        let average_duration = if totals.count > 0 {
            totals.total_duration / totals.count as f64
        } else {
            0.0
        };

        let week = week_trend(tasks, today);
        let today_duration = week.last().map(|d| d.duration).unwrap_or(0.0);
        let daily_target = settings.daily_target;

        Dashboard {
            total_tasks: totals.count,
            total_duration: totals.total_duration,
            average_duration,
            top_tag: top_tag(tasks),
            week,
            today_duration,
            daily_target,
            completion_percent: completion_percent(today_duration, daily_target),
            remaining: (daily_target - today_duration).max(0.0),
            target_status: target_status(today_duration, daily_target),
        }
    }
}

/// Most frequent tag. On a tie the tag that reached the top count first wins.
pub fn top_tag(tasks: &[Task]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut best: Option<&str> = None;
    let mut max = 0;

    for tag in tasks.iter().filter_map(|t| t.tag.as_deref()).filter(|t| !t.is_empty()) {
        let count = counts.entry(tag).or_default();
        *count += 1;
        if *count > max {
            max = *count;
            best = Some(tag);
        }
    }
    best.map(str::to_string)
}

/// Per-day count and duration for the seven days ending `today`.
pub fn week_trend(tasks: &[Task], today: NaiveDate) -> Vec<DayBucket> {
    let mut week: Vec<DayBucket> = (0..TREND_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let key = format_date(date);
            let day = TaskStats::of(tasks.iter().filter(|t| t.due_date == key));
            DayBucket {
                date,
                label: date.format("%a").to_string(),
                count: day.count,
                duration: day.total_duration,
                bar_percent: 0.0,
            }
        })
        .collect();

    let busiest = week.iter().map(|d| d.count).max().unwrap_or(0).max(1) as f64;
    for day in &mut week {
        day.bar_percent = (day.count as f64 / busiest * 100.0).max(MIN_BAR_PERCENT);
    }
    week
}

/// Today's share of the daily target, clamped to 0..=100. A non-positive
/// target reports 0.
pub fn completion_percent(today_duration: f64, daily_target: f64) -> f64 {
    if daily_target > 0.0 {
        (today_duration / daily_target * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub fn target_status(today_duration: f64, daily_target: f64) -> TargetStatus {
    if today_duration >= daily_target {
        TargetStatus::Met
    } else if today_duration >= daily_target * CLOSE_RATIO {
        TargetStatus::Close
    } else {
        TargetStatus::Far
    }
}
