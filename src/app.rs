//! Application state and main event loop for the terminal dashboard.
//!
//! # Keyboard shortcuts
//!
//! - `q` quit
//! - `1`-`4` / `Tab` switch tabs (System, Performance, Alerts, Logs)
//! - `r` manual refresh
//! - `m` start/stop monitoring on the backend
//! - `i` cycle the auto-refresh interval (off/5s/10s/30s/1m/5m)
//! - Alerts tab: `j`/`k` select, `a` acknowledge, `x` resolve, `s` silence,
//!   `n` create (input `name | description [| severity]`)
//! - Performance tab: `j`/`k` select, `Enter` chart the selected metric
//! - Logs tab: `/` search, `f` cycle level filter, `c` cycle component
//!   filter, `C` clear filters

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, widgets::ListState, Terminal};
use tokio::sync::mpsc;

use crate::alerts::NewAlert;
use crate::client::MonitorApi;
use crate::config::AppConfig;
use crate::dashboard::{Dashboard, Tab};
use crate::logs::LogLevel;
use crate::ui;

const EVENT_POLL: Duration = Duration::from_millis(200);

/// Input mode for the terminal front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Collecting `name | description` for a new alert.
    NewAlert,
    /// Collecting free-text log search.
    Search,
}

/// Operations that need an await after key handling.
#[derive(Debug)]
enum Action {
    None,
    SwitchTab(Tab),
    Refresh,
    ToggleMonitoring,
    Acknowledge(String),
    Resolve(String),
    ToggleSilence(String),
    CreateAlert(NewAlert),
    FocusMetric(String),
}

/// All front-end state: the engine plus selection and input buffers.
pub struct App<A> {
    pub dash: Dashboard<A>,
    pub input_mode: InputMode,
    pub input: String,
    pub alert_list: ListState,
    pub perf_selected: usize,
    pub should_quit: bool,
}

impl<A: MonitorApi> App<A> {
    pub fn new(dash: Dashboard<A>) -> Self {
        let mut alert_list = ListState::default();
        alert_list.select(Some(0));
        Self {
            dash,
            input_mode: InputMode::Normal,
            input: String::new(),
            alert_list,
            perf_selected: 0,
            should_quit: false,
        }
    }

    pub fn selected_alert(&self) -> Option<&str> {
        let index = self.alert_list.selected().unwrap_or(0);
        self.dash.alerts.get(index).map(|a| a.name.as_str())
    }

    fn handle_key(&mut self, key: KeyCode) -> Action {
        match self.input_mode {
            InputMode::NewAlert => return self.handle_new_alert_input(key),
            InputMode::Search => return self.handle_search_input(key),
            InputMode::Normal => {}
        }

        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return Action::None;
            }
            KeyCode::Char('1') => return Action::SwitchTab(Tab::System),
            KeyCode::Char('2') => return Action::SwitchTab(Tab::Performance),
            KeyCode::Char('3') => return Action::SwitchTab(Tab::Alerts),
            KeyCode::Char('4') => return Action::SwitchTab(Tab::Logs),
            KeyCode::Tab => return Action::SwitchTab(self.dash.state.current_tab.next()),
            KeyCode::Char('r') => return Action::Refresh,
            KeyCode::Char('m') => return Action::ToggleMonitoring,
            KeyCode::Char('i') => {
                self.dash.cycle_auto_refresh();
                return Action::None;
            }
            _ => {}
        }

        match self.dash.state.current_tab {
            Tab::Alerts => self.handle_alerts_key(key),
            Tab::Performance => self.handle_performance_key(key),
            Tab::Logs => self.handle_logs_key(key),
            Tab::System => Action::None,
        }
    }

    fn handle_alerts_key(&mut self, key: KeyCode) -> Action {
        match key {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_alert_selection(1);
                Action::None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_alert_selection(-1);
                Action::None
            }
            KeyCode::Char('a') => self
                .selected_alert()
                .map(|name| Action::Acknowledge(name.to_string()))
                .unwrap_or(Action::None),
            KeyCode::Char('x') => self
                .selected_alert()
                .map(|name| Action::Resolve(name.to_string()))
                .unwrap_or(Action::None),
            KeyCode::Char('s') => self
                .selected_alert()
                .map(|name| Action::ToggleSilence(name.to_string()))
                .unwrap_or(Action::None),
            KeyCode::Char('n') => {
                self.input_mode = InputMode::NewAlert;
                self.input.clear();
                Action::None
            }
            _ => Action::None,
        }
    }

    fn handle_performance_key(&mut self, key: KeyCode) -> Action {
        match key {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.perf_selected + 1 < self.dash.perf_rows.len() {
                    self.perf_selected += 1;
                }
                Action::None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.perf_selected = self.perf_selected.saturating_sub(1);
                Action::None
            }
            KeyCode::Enter => self
                .dash
                .perf_rows
                .get(self.perf_selected)
                .map(|row| Action::FocusMetric(row.full_name()))
                .unwrap_or(Action::None),
            _ => Action::None,
        }
    }

    fn handle_logs_key(&mut self, key: KeyCode) -> Action {
        match key {
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
                self.input = self.dash.logs.filter.search.clone();
            }
            KeyCode::Char('f') => self.cycle_log_level(),
            KeyCode::Char('c') => self.cycle_log_component(),
            KeyCode::Char('C') => self.dash.logs.clear_filter(),
            _ => {}
        }
        Action::None
    }

    fn handle_new_alert_input(&mut self, key: KeyCode) -> Action {
        match key {
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                let draft = parse_alert_input(&self.input);
                self.input.clear();
                Action::CreateAlert(draft)
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.input.clear();
                Action::None
            }
            KeyCode::Backspace => {
                self.input.pop();
                Action::None
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                Action::None
            }
            _ => Action::None,
        }
    }

    fn handle_search_input(&mut self, key: KeyCode) -> Action {
        match key {
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                let search = std::mem::take(&mut self.input);
                self.dash.logs.set_search(&search);
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.input.clear();
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => {
                self.input.push(c);
            }
            _ => {}
        }
        Action::None
    }

    fn move_alert_selection(&mut self, delta: i64) {
        let len = self.dash.alerts.len();
        if len == 0 {
            self.alert_list.select(Some(0));
            return;
        }
        let current = self.alert_list.selected().unwrap_or(0) as i64;
        let next = (current + delta).clamp(0, len as i64 - 1);
        self.alert_list.select(Some(next as usize));
    }

    /// Cycle the level filter through off and each level in turn.
    fn cycle_log_level(&mut self) {
        let next = match self.dash.logs.filter.level {
            None => Some(LogLevel::Debug),
            Some(level) => {
                let levels = LogLevel::all();
                let index = levels.iter().position(|l| *l == level).unwrap_or(0);
                levels.get(index + 1).copied()
            }
        };
        self.dash.logs.set_level(next);
    }

    /// Cycle the component filter through off and each loaded component.
    fn cycle_log_component(&mut self) {
        let components = self.dash.logs.components().to_vec();
        if components.is_empty() {
            return;
        }
        let current = self.dash.logs.filter.component.clone();
        let next = if current.is_empty() {
            components[0].clone()
        } else {
            match components.iter().position(|c| *c == current) {
                Some(i) if i + 1 < components.len() => components[i + 1].clone(),
                _ => String::new(),
            }
        };
        self.dash.logs.set_component(&next);
    }

    async fn perform(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::SwitchTab(tab) => self.dash.switch_tab(tab).await,
            Action::Refresh => self.dash.refresh().await,
            Action::ToggleMonitoring => self.dash.toggle_monitoring().await,
            Action::Acknowledge(name) => self.dash.acknowledge_alert(&name).await,
            Action::Resolve(name) => self.dash.resolve_alert(&name).await,
            Action::ToggleSilence(name) => self.dash.toggle_silence(&name).await,
            Action::CreateAlert(draft) => self.dash.create_alert(draft).await,
            Action::FocusMetric(name) => self.dash.focus_metric(&name).await,
        }
    }
}

/// Parse the new-alert entry line: `name | description [| severity]`.
/// Validation of the required fields happens in the controller.
fn parse_alert_input(input: &str) -> NewAlert {
    let mut parts = input.splitn(3, '|').map(str::trim);
    let name = parts.next().unwrap_or_default();
    let description = parts.next().unwrap_or_default();
    let mut draft = NewAlert::new(name, description);
    if let Some(severity) = parts.next().and_then(crate::alerts::Severity::parse) {
        draft.severity = severity;
    }
    draft
}

/// Entry point for the terminal dashboard: builds the controller, arms the
/// configured auto-refresh schedule and runs the event loop until quit.
pub async fn run<A: MonitorApi>(api: A, config: &AppConfig, initial_tab: Option<Tab>) -> Result<()> {
    let (tick_tx, mut tick_rx) = mpsc::channel(4);
    let mut dash = Dashboard::new(
        api,
        config.actor.clone(),
        config.ui.history_points,
        tick_tx,
    );
    dash.set_auto_refresh(config.refresh.interval.as_secs());
    if let Some(tab) = initial_tab {
        dash.state.current_tab = tab;
    }
    dash.refresh().await;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(dash);
    let result = event_loop(&mut terminal, &mut app, &mut tick_rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop<A: MonitorApi>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<A>,
    tick_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(EVENT_POLL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let action = app.handle_key(key.code);
                    app.perform(action).await;
                }
            }
        }

        // scheduled refreshes share the manual refresh path
        while tick_rx.try_recv().is_ok() {
            app.dash.refresh().await;
        }

        app.dash.notices.prune();

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::alerts::Severity;

    #[test]
    fn new_alert_input_splits_on_pipe() {
        let draft = parse_alert_input("disk_full | root volume above 90%");
        assert_eq!(draft.name, "disk_full");
        assert_eq!(draft.description, "root volume above 90%");
        assert_eq!(draft.severity, Severity::Warning);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn new_alert_input_accepts_an_optional_severity() {
        let draft = parse_alert_input("disk_full | root volume above 90% | critical");
        assert_eq!(draft.severity, Severity::Critical);
        // unknown severities fall back to the default
        let draft = parse_alert_input("disk_full | desc | urgent");
        assert_eq!(draft.severity, Severity::Warning);
    }

    #[test]
    fn new_alert_input_without_description_fails_validation() {
        let draft = parse_alert_input("disk_full");
        assert!(draft.validate().is_err());
    }
}
