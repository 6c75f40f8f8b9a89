//! Layout and rendering for the terminal dashboard.
//!
//! Each tab has its own rendering function:
//! - System: four live charts (cpu, memory, disk, network) plus the raw
//!   metric table
//! - Performance: flattened statistics table with a focus chart for the
//!   selected metric
//! - Alerts: severity counters, the active list and recent history
//! - Logs: filter summary and the visible slice of the log buffer

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph, Tabs},
    Frame,
};

use crate::alerts::Severity;
use crate::app::{App, InputMode};
use crate::charts::ChartRegistry;
use crate::dashboard::Tab;
use crate::format;
use crate::logs::LogLevel;
use crate::notify::NoticeKind;

const SERIES_COLORS: &[Color] = &[Color::Cyan, Color::Magenta, Color::Green, Color::Yellow];

/// Top-level rendering: tab bar, active tab body, status bar.
pub fn draw<A>(f: &mut Frame, app: &mut App<A>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);

    match app.dash.state.current_tab {
        Tab::System => draw_system(f, app, chunks[1]),
        Tab::Performance => draw_performance(f, app, chunks[1]),
        Tab::Alerts => draw_alerts(f, app, chunks[1]),
        Tab::Logs => draw_logs(f, app, chunks[1]),
    }

    draw_status_bar(f, app, chunks[2]);
}

fn draw_tabs<A>(f: &mut Frame, app: &App<A>, area: Rect) {
    let titles: Vec<Line> = Tab::all()
        .iter()
        .map(|t| {
            let style = if *t == app.dash.state.current_tab {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(Span::styled(t.name(), style))
        })
        .collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(" opsdash "))
        .select(app.dash.state.current_tab.index())
        .highlight_style(Style::default().fg(Color::Cyan));
    f.render_widget(tabs, area);
}

fn draw_status_bar<A>(f: &mut Frame, app: &App<A>, area: Rect) {
    let state = &app.dash.state;
    let mut spans = vec![
        if state.monitoring_active {
            Span::styled(" ● monitoring ", Style::default().fg(Color::Green))
        } else {
            Span::styled(" ○ stopped ", Style::default().fg(Color::Red))
        },
        Span::raw("| refresh: "),
        Span::raw(if state.refresh_interval_secs == 0 {
            "off".to_string()
        } else {
            format!("{}s", state.refresh_interval_secs)
        }),
        Span::raw(" | updated: "),
        Span::raw(
            state
                .last_refresh
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "never".to_string()),
        ),
        Span::raw(" "),
    ];

    if let Some(notice) = app.dash.notices.latest() {
        let style = match notice.kind {
            NoticeKind::Success => Style::default().fg(Color::Green),
            NoticeKind::Error => Style::default().fg(Color::Red),
        };
        spans.push(Span::raw("| "));
        spans.push(Span::styled(notice.message.clone(), style));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ── System tab ──────────────────────────────────────────────────────────────

fn draw_system<A>(f: &mut Frame, app: &App<A>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Min(0)])
        .split(area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    draw_slot_chart(f, &app.dash.charts, "system.cpu", " CPU Usage ", top[0]);
    draw_slot_chart(f, &app.dash.charts, "system.memory", " Memory Usage ", top[1]);
    draw_slot_chart(f, &app.dash.charts, "system.disk", " Disk I/O ", bottom[0]);
    draw_slot_chart(f, &app.dash.charts, "system.network", " Network I/O ", bottom[1]);

    draw_metric_table(f, app, chunks[1]);
}

fn draw_metric_table<A>(f: &mut Frame, app: &App<A>, area: Rect) {
    let title = match &app.dash.system_info {
        Some(info) if !info.hostname.is_empty() => {
            let mut parts = vec![info.hostname.clone()];
            if !info.platform.is_empty() {
                parts.push(info.platform.clone());
            }
            if let Some(cpus) = info.cpu_count {
                parts.push(format!("{cpus} cpus"));
            }
            if let Some(memory) = info.memory_total {
                parts.push(format::bytes(memory));
            }
            format!(" Metrics ({}) ", parts.join(", "))
        }
        _ => " Metrics ".to_string(),
    };

    let items: Vec<ListItem> = match &app.dash.system {
        Some(snapshot) => snapshot
            .series
            .values()
            .map(|series| {
                let latest = series
                    .latest()
                    .map(|v| format::metric_value(&series.name, v))
                    .unwrap_or_else(|| "-".to_string());
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<44}", series.name),
                        Style::default().fg(Color::Gray),
                    ),
                    Span::raw(latest),
                ]))
            })
            .collect(),
        None => vec![ListItem::new("waiting for data")],
    };

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}

// ── Performance tab ─────────────────────────────────────────────────────────

fn draw_performance<A>(f: &mut Frame, app: &App<A>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Min(0)])
        .split(area);

    let focus_title = match &app.dash.focused_metric {
        Some(name) => format!(" {name} (seconds) "),
        None => " Press Enter on a row to chart it ".to_string(),
    };
    draw_slot_chart(f, &app.dash.charts, "performance.focus", &focus_title, chunks[0]);

    let header = format!(
        "{:<16} {:<28} {:>10} {:>10} {:>10} {:>10} {:>8}",
        "category", "metric", "latest", "avg", "min", "max", "count"
    );
    let mut items = vec![ListItem::new(Span::styled(
        header,
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    items.extend(app.dash.perf_rows.iter().enumerate().map(|(i, row)| {
        let line = format!(
            "{:<16} {:<28} {:>9.4}s {:>9.4}s {:>9.4}s {:>9.4}s {:>8}",
            row.category,
            row.metric,
            row.stat.latest,
            row.stat.average,
            row.stat.min,
            row.stat.max,
            row.stat.count
        );
        let style = if i == app.perf_selected {
            Style::default().bg(Color::DarkGray).fg(Color::White)
        } else {
            Style::default()
        };
        ListItem::new(Span::styled(line, style))
    }));

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Performance Statistics "),
    );
    f.render_widget(list, chunks[1]);
}

// ── Alerts tab ──────────────────────────────────────────────────────────────

pub(crate) fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::Error => Color::LightRed,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::Blue,
    }
}

fn draw_alerts<A>(f: &mut Frame, app: &mut App<A>, area: Rect) {
    let input_height = if app.input_mode == InputMode::NewAlert { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(input_height),
        ])
        .split(area);

    let counts = app.dash.alert_counts;
    let counters = Line::from(vec![
        Span::styled(
            format!(" critical: {} ", counts.critical),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" error: {} ", counts.error),
            Style::default().fg(Color::LightRed),
        ),
        Span::styled(
            format!(" warning: {} ", counts.warning),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!(" info: {} ", counts.info),
            Style::default().fg(Color::Blue),
        ),
    ]);
    f.render_widget(
        Paragraph::new(counters).block(Block::default().borders(Borders::ALL).title(" Active ")),
        chunks[0],
    );

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    let now = chrono::Utc::now().timestamp() as f64;
    let items: Vec<ListItem> = if app.dash.alerts.is_empty() {
        vec![ListItem::new(Span::styled(
            "no active alerts",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        app.dash
            .alerts
            .iter()
            .map(|alert| {
                let mut spans = vec![
                    Span::styled(
                        format!("{:<9}", alert.severity.name()),
                        Style::default()
                            .fg(severity_color(alert.severity))
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!("{:<28}", alert.name)),
                    Span::styled(
                        format!("{:<13}", alert.status.name()),
                        Style::default().fg(Color::Gray),
                    ),
                ];
                if let Some(open_for) = alert.open_for(now) {
                    spans.push(Span::styled(
                        format!("open {}", format::human_duration(open_for)),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                if alert.trigger_count > 1 {
                    spans.push(Span::styled(
                        format!("  x{}", alert.trigger_count),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                if alert.silenced {
                    spans.push(Span::styled(
                        "  [silenced]",
                        Style::default().fg(Color::DarkGray),
                    ));
                }

                let mut detail = format!("  {} | {}", alert.category, alert.description);
                if let Some(by) = &alert.acknowledged_by {
                    detail.push_str(&format!(" | ack by {by}"));
                }
                if let Some(details) = &alert.details {
                    for (key, value) in details.iter().take(3) {
                        detail.push_str(&format!(" | {key}: {value}"));
                    }
                }
                ListItem::new(vec![
                    Line::from(spans),
                    Line::from(Span::styled(detail, Style::default().fg(Color::DarkGray))),
                ])
            })
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Alerts (a ack / x resolve / s silence / n new) "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray));
    f.render_stateful_widget(list, body[0], &mut app.alert_list);

    let history: Vec<ListItem> = app
        .dash
        .alert_history
        .iter()
        .rev()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format::date_time(entry.timestamp),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(format!("  {:<12}", entry.action)),
                Span::raw(entry.alert.clone()),
            ]))
        })
        .collect();
    f.render_widget(
        List::new(history).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Recent Activity "),
        ),
        body[1],
    );

    if app.input_mode == InputMode::NewAlert {
        let input = Paragraph::new(format!("> {}", app.input)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" New alert: name | description [| severity] "),
        );
        f.render_widget(input, chunks[2]);
    }
}

// ── Logs tab ────────────────────────────────────────────────────────────────

pub(crate) fn level_color(level: LogLevel) -> Color {
    match level {
        LogLevel::Debug => Color::DarkGray,
        LogLevel::Info => Color::Gray,
        LogLevel::Warning => Color::Yellow,
        LogLevel::Error => Color::LightRed,
        LogLevel::Critical => Color::Red,
    }
}

fn draw_logs<A>(f: &mut Frame, app: &App<A>, area: Rect) {
    let input_height = if app.input_mode == InputMode::Search { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(input_height),
        ])
        .split(area);

    let filter = &app.dash.logs.filter;
    let summary = format!(
        " level={} component={} search={:?}  ({}/{} shown)  f level / c component / C clear / / search",
        filter.level.map(|l| l.name()).unwrap_or("*"),
        if filter.component.is_empty() { "*" } else { &filter.component },
        filter.search,
        app.dash.logs.visible_count(),
        app.dash.logs.entries().len(),
    );
    f.render_widget(
        Paragraph::new(Span::styled(summary, Style::default().fg(Color::Gray))),
        chunks[0],
    );

    let items: Vec<ListItem> = app
        .dash
        .logs
        .visible()
        .map(|entry| {
            ListItem::new(Span::styled(
                entry.rendered(),
                Style::default().fg(level_color(entry.level)),
            ))
        })
        .collect();
    f.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title(" Logs ")),
        chunks[1],
    );

    if app.input_mode == InputMode::Search {
        let input = Paragraph::new(format!("> {}", app.input))
            .block(Block::default().borders(Borders::ALL).title(" Search "));
        f.render_widget(input, chunks[2]);
    }
}

// ── Charts ──────────────────────────────────────────────────────────────────

/// Draw one reconciled chart slot, or a placeholder until its first data.
fn draw_slot_chart(f: &mut Frame, charts: &ChartRegistry, id: &str, title: &str, area: Rect) {
    let Some(slot) = charts.get(id) else {
        let placeholder = Paragraph::new(Span::styled(
            "waiting for data",
            Style::default().fg(Color::DarkGray),
        ))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
        f.render_widget(placeholder, area);
        return;
    };

    let point_data: Vec<Vec<(f64, f64)>> =
        (0..slot.datasets.len()).map(|i| slot.points(i)).collect();
    let datasets: Vec<Dataset> = slot
        .datasets
        .iter()
        .zip(&point_data)
        .enumerate()
        .map(|(i, (ds, data))| {
            Dataset::default()
                .name(ds.label.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
                .data(data)
        })
        .collect();

    let x_labels: Vec<Span> = slot
        .tick_labels()
        .into_iter()
        .map(|l| Span::styled(l.to_string(), Style::default().fg(Color::DarkGray)))
        .collect();
    let x_max = (slot.len().saturating_sub(1)).max(1) as f64;

    let [y_min, y_max] = slot.y_bounds();
    let y_labels = vec![
        Span::raw(format!("{y_min:.0}")),
        Span::raw(format!("{:.1}", (y_min + y_max) / 2.0)),
        Span::raw(format!("{y_max:.1}")),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels(x_labels)
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .title(slot.kind.axis_title())
                .bounds([y_min, y_max])
                .labels(y_labels)
                .style(Style::default().fg(Color::DarkGray)),
        );
    f.render_widget(chart, area);
}
