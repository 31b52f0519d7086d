//! Command implementations for the CLI interface.
//!
//! Each handler takes the opened store, performs one operation and prints the
//! result. Failures are reported on stderr and end the process with status 1.

use std::fmt::Display;
use std::fs;
use std::io::IsTerminal;
use std::path::Path;

use chrono::Local;
use clap::Subcommand;
use clap_complete::{generate, Shell};
use tracing::info;

use crate::fields::{DateRange, SortDirection, SortKey, TargetStatus, Unit};
use crate::filter::{distinct_tags, sort_tasks, TaskFilter};
use crate::format::{due_relative, parse_due_input, resolve_task_id, short_id, truncate};
use crate::search::{compile_pattern, highlight_matches, highlight_spans, regex_search, search_tasks};
use crate::settings::SettingsPatch;
use crate::stats::TaskStats;
use crate::store::PlannerStore;
use crate::task::{format_number, Task, TaskInput};
use crate::tui::run::run_tui;
use crate::validate::{validate_settings, validate_task_form, ValidationReport};

const BAR_WIDTH: f64 = 20.0;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI interface.
    Ui,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Duration in minutes, up to two decimals.
        #[arg(long)]
        duration: String,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "eow", "eom" or "in Nd".
        #[arg(long, default_value = "today")]
        due: String,
        /// Optional tag (letters, spaces and hyphens).
        #[arg(long)]
        tag: Option<String>,
    },

    /// Update fields on a task.
    Update {
        /// Task id, id prefix or title.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long, conflicts_with = "clear_tag")]
        tag: Option<String>,
        /// Remove the tag.
        #[arg(long)]
        clear_tag: bool,
    },

    /// Delete a task.
    Delete {
        /// Task id, id prefix or title.
        id: String,
    },

    /// View a single task.
    View {
        /// Task id, id prefix or title.
        id: String,
    },

    /// List tasks with optional filters.
    List {
        /// Only tasks with exactly this tag.
        #[arg(long)]
        tag: Option<String>,
        /// Due-date range.
        #[arg(long, value_enum, default_value_t = DateRange::All)]
        range: DateRange,
        /// Search query (regex, falling back to plain text).
        #[arg(long)]
        search: Option<String>,
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::DueDate)]
        sort: SortKey,
        /// Sort descending.
        #[arg(long)]
        desc: bool,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Search titles, tags and due dates.
    Search {
        query: String,
        /// Treat the query as a case-insensitive regular expression.
        #[arg(long)]
        regex: bool,
        /// Emit <mark> markup instead of terminal highlighting.
        #[arg(long)]
        mark: bool,
    },

    /// Show planning statistics and today's progress.
    Dashboard,

    /// Show or change settings.
    Settings {
        /// Unit used to display durations.
        #[arg(long, value_enum)]
        unit: Option<Unit>,
        /// Daily target in minutes.
        #[arg(long, allow_hyphen_values = true)]
        daily_target: Option<f64>,
    },

    /// Show or toggle the dark theme used by the UI.
    Theme {
        #[arg(long)]
        toggle: bool,
    },

    /// Export tasks as JSON.
    Export {
        /// Output file path (default: tasks.json)
        #[arg(long, short)]
        output: Option<String>,
        /// Write the stored array verbatim instead of pretty-printing it.
        #[arg(long)]
        raw: bool,
    },

    /// Replace all tasks with the valid ones from a JSON file.
    Import {
        /// Input JSON file path
        input: String,
        /// Skip creating backup before import
        #[arg(long)]
        no_backup: bool,
    },

    /// List distinct tags and counts.
    Tags,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Print an error and exit.
fn fail(msg: impl Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

fn resolve_or_exit(store: &PlannerStore, identifier: &str) -> String {
    resolve_task_id(identifier, store.tasks()).unwrap_or_else(|e| fail(e))
}

fn exit_on_invalid(report: &ValidationReport) {
    if report.is_valid() {
        return;
    }
    for (field, msg) in &report.errors {
        eprintln!("{:<9} {}", format!("{}:", field.label()), msg);
    }
    std::process::exit(1);
}

/// Launch the terminal user interface.
pub fn cmd_ui(store: PlannerStore) {
    if let Err(e) = run_tui(store) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

/// Validate and add a new task.
pub fn cmd_add(store: &mut PlannerStore, title: String, duration: String, due: String, tag: Option<String>) {
    let due = parse_due_input(&due, Local::now().date_naive());
    let input = TaskInput::new(title, duration, due, tag.as_deref());
    exit_on_invalid(&validate_task_form(&input.title, &input.duration, &input.due_date, input.tag_str()));

    match store.add_task(&input) {
        Ok(task) => {
            let unit = store.settings().default_unit;
            println!("Added {} {} ({}, due {})", short_id(&task.id), task.title, unit.format(task.duration), task.due_date);
        }
        Err(e) => fail(e),
    }
}

/// Merge the given fields into a task, validate the result as a form and save.
pub fn cmd_update(
    store: &mut PlannerStore,
    id: String,
    title: Option<String>,
    duration: Option<String>,
    due: Option<String>,
    tag: Option<String>,
    clear_tag: bool,
) {
    let id = resolve_or_exit(store, &id);
    let Some(current) = store.get_task_by_id(&id) else {
        fail(format!("Task {} not found", id));
    };

    let mut input = TaskInput::from_task(current);
    if let Some(title) = title {
        input.title = title;
    }
    if let Some(duration) = duration {
        input.duration = duration;
    }
    if let Some(due) = due {
        input.due_date = parse_due_input(&due, Local::now().date_naive());
    }
    if clear_tag {
        input.tag = None;
    } else if let Some(tag) = tag {
        input.tag = Some(tag);
    }
    exit_on_invalid(&validate_task_form(&input.title, &input.duration, &input.due_date, input.tag_str()));

    match store.update_task(&id, &input) {
        Ok(Some(task)) => println!("Updated {} {}", short_id(&task.id), task.title),
        Ok(None) => fail(format!("Task {} not found", id)),
        Err(e) => fail(e),
    }
}

/// Delete a task.
pub fn cmd_delete(store: &mut PlannerStore, id: String) {
    let id = resolve_or_exit(store, &id);
    let title = store.get_task_by_id(&id).map(|t| t.title.clone()).unwrap_or_default();
    match store.delete_task(&id) {
        Ok(_) => println!("Deleted {} {}", short_id(&id), title),
        Err(e) => fail(e),
    }
}

/// View detailed information about a specific task.
pub fn cmd_view(store: &PlannerStore, id: String) {
    let id = resolve_or_exit(store, &id);
    let Some(t) = store.get_task_by_id(&id) else {
        fail(format!("Task {} not found", id));
    };
    let unit = store.settings().default_unit;
    let today = Local::now().date_naive();

    println!("ID:       {}", t.id);
    println!("Title:    {}", t.title);
    println!("Duration: {} ({} min)", unit.format(t.duration), format_number(t.duration));
    println!("Due:      {} ({})", t.due_date, due_relative(&t.due_date, today));
    println!("Tag:      {}", t.tag.as_deref().unwrap_or("-"));
    println!("Created:  {}", t.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    println!("Updated:  {}", t.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
}

/// List tasks through the same filter chain as the UI.
pub fn cmd_list(
    store: &PlannerStore,
    tag: Option<String>,
    range: DateRange,
    search: Option<String>,
    sort: SortKey,
    desc: bool,
    limit: Option<usize>,
) {
    let filter = TaskFilter { tag, date_range: range, query: search.unwrap_or_default() };
    let today = Local::now().date_naive();
    let mut tasks = filter.apply(store.tasks(), today);
    let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
    sort_tasks(&mut tasks, sort, direction);

    let stats = TaskStats::of(tasks.iter().copied());
    if let Some(n) = limit {
        tasks.truncate(n);
    }

    let unit = store.settings().default_unit;
    print_table(&tasks, unit, |s| s.to_string());
    println!();
    let count = if filter.is_empty() {
        stats.count.to_string()
    } else {
        format!("{} of {}", stats.count, store.tasks().len())
    };
    println!("{} task(s), {} total", count, unit.format(stats.total_duration));
}

/// Search tasks and print matches with the query highlighted.
pub fn cmd_search(store: &PlannerStore, query: String, regex: bool, mark: bool) {
    let hits = if regex {
        if let Err(e) = compile_pattern(&query) {
            eprintln!("Warning: invalid pattern ({e}); showing all tasks");
        }
        regex_search(store.tasks(), &query)
    } else {
        search_tasks(store.tasks(), &query)
    };

    let styled = std::io::stdout().is_terminal();
    let highlight = |text: &str| {
        if mark {
            highlight_matches(text, &query)
        } else if styled {
            ansi_highlight(text, &query)
        } else {
            text.to_string()
        }
    };

    print_table(&hits, store.settings().default_unit, highlight);
    println!();
    println!("{} match(es)", hits.len());
}

/// Print totals, the 7-day trend and today's progress.
pub fn cmd_dashboard(store: &PlannerStore) {
    let d = store.dashboard_today();
    let unit = store.settings().default_unit;

    println!("Total tasks:    {}", d.total_tasks);
    println!("Total duration: {}", unit.format(d.total_duration));
    println!("Average:        {}", unit.format(d.average_duration));
    println!("Top tag:        {}", d.top_tag.as_deref().unwrap_or("None"));
    println!();
    println!("Last 7 days");
    for day in &d.week {
        let width = (day.bar_percent / 100.0 * BAR_WIDTH).round() as usize;
        println!(
            "  {} {} {:<20} {} ({:.0}m)",
            day.label,
            day.date.format("%m-%d"),
            "█".repeat(width.max(1)),
            day.count,
            day.duration
        );
    }
    println!();
    println!(
        "Today: {} / {} ({:.0}%)",
        unit.format(d.today_duration),
        unit.format(d.daily_target),
        d.completion_percent
    );
    match d.target_status {
        TargetStatus::Met => println!("Daily target achieved!"),
        TargetStatus::Close | TargetStatus::Far => {
            println!("{} remaining to reach target", unit.format(d.remaining))
        }
    }
}

/// Show settings, or validate and apply changes.
pub fn cmd_settings(store: &mut PlannerStore, unit: Option<Unit>, daily_target: Option<f64>) {
    let patch = SettingsPatch { default_unit: unit, daily_target };
    if !patch.is_empty() {
        if !validate_settings(&patch.to_value()) {
            fail("Invalid settings. Please check your inputs.");
        }
        if let Err(e) = store.update_settings(patch) {
            fail(e);
        }
        println!("Settings saved successfully!");
    }

    let s = store.settings();
    println!("Unit:         {}", s.default_unit.as_str());
    println!("Daily target: {} min", format_number(s.daily_target));
}

pub fn cmd_theme(store: &mut PlannerStore, toggle: bool) {
    if toggle {
        if let Err(e) = store.toggle_dark_mode() {
            fail(e);
        }
    }
    println!("Theme: {}", if store.is_dark_mode() { "dark" } else { "light" });
}

/// Export tasks to a JSON file.
pub fn cmd_export(store: &PlannerStore, output: Option<String>, raw: bool) {
    let output = output.unwrap_or_else(|| "tasks.json".to_string());
    let text = if raw { store.export_tasks() } else { store.export_pretty() };
    let text = text.unwrap_or_else(|e| fail(e));

    if let Err(e) = fs::write(&output, text) {
        fail(format!("Failed to write {}: {}", output, e));
    }
    println!("Exported {} tasks to {}", store.tasks().len(), output);
}

/// Save the current task array under `<data-dir>/backup`.
pub fn create_backup(store: &PlannerStore, data_dir: &Path) -> Result<String, std::io::Error> {
    let backup_dir = data_dir.join("backup");
    fs::create_dir_all(&backup_dir)?;

    let text = store
        .export_tasks()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let backup_path = backup_dir.join(format!("{}_tasks.json", timestamp));
    fs::write(&backup_path, text)?;

    Ok(backup_path.to_string_lossy().to_string())
}

/// Import tasks from a JSON file, keeping only the valid records.
pub fn cmd_import(store: &mut PlannerStore, data_dir: &Path, input: String, no_backup: bool) {
    let text = match fs::read_to_string(&input) {
        Ok(text) => text,
        Err(e) => fail(format!("Failed to read '{}': {}", input, e)),
    };

    if !no_backup {
        match create_backup(store, data_dir) {
            Ok(path) => println!("Created backup: {}", path),
            Err(e) => fail(format!("Failed to create backup ({e}); rerun with --no-backup to skip it")),
        }
    }

    match store.import_validated(&text) {
        Ok(summary) => {
            if summary.is_partial() {
                println!(
                    "Warning: Only {} out of {} tasks were valid and imported.",
                    summary.imported, summary.total
                );
            }
            info!(file = %input, imported = summary.imported, "import finished");
            println!("Successfully imported {} tasks!", summary.imported);
        }
        Err(e) => fail(format!("Error importing tasks: {e}")),
    }
}

/// List all distinct tags with their usage counts, in first-seen order.
pub fn cmd_tags(store: &PlannerStore) {
    println!("{:<16} {}", "Tag", "Count");
    for tag in distinct_tags(store.tasks()) {
        let count = store.tasks().iter().filter(|t| t.tag.as_deref() == Some(tag.as_str())).count();
        println!("{:<16} {}", truncate(&tag, 16), count);
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Print tasks as a table. `style` decorates the title and tag cells.
fn print_table<F>(tasks: &[&Task], unit: Unit, style: F)
where
    F: Fn(&str) -> String,
{
    println!("{:<12} {:<10} {:<10} {:<12} {}", "ID", "Due", "When", "Duration", "Title [tag]");
    let today = Local::now().date_naive();
    for t in tasks {
        let tag = t.tag.as_deref().map(|tag| format!(" [{}]", style(tag))).unwrap_or_default();
        println!(
            "{:<12} {:<10} {:<10} {:<12} {}{}",
            short_id(&t.id),
            t.due_date,
            due_relative(&t.due_date, today),
            unit.format(t.duration),
            style(&t.title),
            tag
        );
    }
}

/// Wrap literal matches in bold yellow escape codes.
fn ansi_highlight(text: &str, query: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for span in highlight_spans(text, query) {
        out.push_str(&text[last..span.start]);
        out.push_str("\x1b[1;33m");
        out.push_str(&text[span.clone()]);
        out.push_str("\x1b[0m");
        last = span.end;
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ansi_highlight_wraps_matches() {
        assert_eq!(ansi_highlight("Team Meeting", "team"), "\x1b[1;33mTeam\x1b[0m Meeting");
        assert_eq!(ansi_highlight("Gym", "x"), "Gym");
    }
}
