//! Dashboard view: totals, the 7-day trend and daily target progress.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::fields::{TargetStatus, Unit};
use crate::stats::Dashboard;
use crate::tui::colors::Palette;

pub fn render_dashboard(f: &mut Frame, area: Rect, d: &Dashboard, unit: Unit, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(8), Constraint::Length(4)])
        .split(area);

    render_totals(f, chunks[0], d, unit, palette);
    render_week(f, chunks[1], d, palette);
    render_target(f, chunks[2], d, unit, palette);
}

fn render_totals(f: &mut Frame, area: Rect, d: &Dashboard, unit: Unit, palette: &Palette) {
    let label = Style::default().fg(palette.muted);
    let value = Style::default().fg(palette.fg).add_modifier(Modifier::BOLD);
    let row = |name: &'static str, text: String| {
        Line::from(vec![Span::styled(format!("{name:<16}"), label), Span::styled(text, value)])
    };

    let lines = vec![
        row("Total tasks", d.total_tasks.to_string()),
        row("Total duration", unit.format(d.total_duration)),
        row("Average", unit.format(d.average_duration)),
        row("Top tag", d.top_tag.clone().unwrap_or_else(|| "None".to_string())),
    ];
    let block = Block::default().borders(Borders::ALL).title("Overview");
    f.render_widget(Paragraph::new(lines).block(block).style(Style::default().bg(palette.bg)), area);
}

fn render_week(f: &mut Frame, area: Rect, d: &Dashboard, palette: &Palette) {
    let bars: Vec<Bar> = d
        .week
        .iter()
        .map(|day| {
            Bar::default()
                .value(day.bar_percent.round() as u64)
                .text_value(format!("{} ({:.0}m)", day.count, day.duration))
                .label(Line::from(day.label.clone()))
                .style(Style::default().fg(palette.accent))
                .value_style(Style::default().fg(palette.on_accent).bg(palette.accent))
        })
        .collect();

    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title("Last 7 days"))
        .data(BarGroup::default().bars(&bars))
        .bar_width(9)
        .bar_gap(2)
        .max(100);
    f.render_widget(chart, area);
}

fn render_target(f: &mut Frame, area: Rect, d: &Dashboard, unit: Unit, palette: &Palette) {
    let color = palette.target(d.target_status);
    let status = match d.target_status {
        TargetStatus::Met => "Daily target achieved!".to_string(),
        TargetStatus::Close | TargetStatus::Far => {
            format!("{} remaining to reach target", unit.format(d.remaining))
        }
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Today {} / {}  {}",
            unit.format(d.today_duration),
            unit.format(d.daily_target),
            status
        )))
        .gauge_style(Style::default().fg(color).bg(palette.bg))
        .percent(d.completion_percent.round().clamp(0.0, 100.0) as u16)
        .label(format!("{:.0}%", d.completion_percent));
    f.render_widget(gauge, area);
}
