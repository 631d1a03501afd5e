mod ui;
mod widgets;

use std::io;
use std::time::Duration;

use chrono::Utc;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::models::TopicRecord;
use crate::state::{Dashboard, StudyState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Topics,
    TopicDetail,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Topics,
            View::Topics => View::Dashboard,
            View::TopicDetail => View::Topics,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Dashboard => View::Topics,
            View::Topics => View::Dashboard,
            View::TopicDetail => View::Topics,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        });
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        });
    }

    fn first(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(0);
        }
    }

    fn last(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(self.items.len() - 1);
        }
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

pub struct App {
    db: Database,
    config: Config,
    pub state: StudyState,
    pub view: View,
    /// Record ids in display order.
    pub topics: StatefulList<i64>,
    pub selected_topic: Option<i64>,
    /// Cycle positions of the open topic, newest first.
    pub cycles: StatefulList<usize>,
    pub dashboard: Dashboard,
    pub filter_input: String,
    pub filter_mode: bool,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(db: Database, state: StudyState, config: Config) -> Self {
        let mut app = Self {
            db,
            config,
            state,
            view: View::Dashboard,
            topics: StatefulList::with_items(Vec::new()),
            selected_topic: None,
            cycles: StatefulList::with_items(Vec::new()),
            dashboard: Dashboard::default(),
            filter_input: String::new(),
            filter_mode: false,
            status: None,
            should_quit: false,
        };
        app.rebuild();
        app
    }

    pub fn topic(&self) -> Option<&TopicRecord> {
        self.selected_topic.and_then(|id| self.state.find(id))
    }

    pub fn displayed(&self) -> Vec<&TopicRecord> {
        self.topics
            .items
            .iter()
            .filter_map(|id| self.state.find(*id))
            .collect()
    }

    fn rebuild(&mut self) {
        let selected = self.topics.selected;
        self.topics = StatefulList::with_items(self.state.displayed().iter().map(|r| r.id).collect());
        if let Some(i) = selected.filter(|i| *i < self.topics.items.len()) {
            self.topics.selected = Some(i);
        }
        self.dashboard =
            self.state
                .dashboard(Utc::now(), self.config.focus_limit, self.config.heatmap_days);
        self.rebuild_cycles();
    }

    fn rebuild_cycles(&mut self) {
        let positions = self
            .topic()
            .map(|r| (0..r.history.len()).rev().collect())
            .unwrap_or_default();
        self.cycles = StatefulList::with_items(positions);
    }

    pub fn refresh_data(&mut self) -> Result<()> {
        self.state.reload(&self.db)?;
        self.rebuild();
        log::debug!("refreshed {} topics", self.state.records.len());
        Ok(())
    }

    fn apply_filter(&mut self) {
        let tag = Some(self.filter_input.trim().to_string()).filter(|t| !t.is_empty());
        self.state.filter(tag, None);
        self.topics.selected = None;
        self.rebuild();
    }

    fn select_topic(&mut self) {
        if let Some(id) = self.topics.selected_item().copied() {
            self.selected_topic = Some(id);
            self.rebuild_cycles();
            self.view = View::TopicDetail;
        }
    }

    fn close_topic(&mut self) {
        self.view = View::Topics;
        self.selected_topic = None;
    }

    fn delete_selected_cycle(&mut self) -> Result<()> {
        let (Some(id), Some(index)) = (self.selected_topic, self.cycles.selected_item().copied())
        else {
            return Ok(());
        };
        self.status = Some(if self.state.delete_cycle(id, index, &self.db)? {
            format!("Deleted cycle {}", index)
        } else {
            format!("No cycle {} to delete", index)
        });
        self.rebuild();
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Result<()> {
        if self.filter_mode {
            match key {
                KeyCode::Esc => {
                    self.filter_mode = false;
                    self.filter_input.clear();
                }
                KeyCode::Enter => {
                    self.filter_mode = false;
                    self.apply_filter();
                }
                KeyCode::Backspace => {
                    self.filter_input.pop();
                }
                KeyCode::Char(c) => {
                    self.filter_input.push(c);
                }
                _ => {}
            }
            return Ok(());
        }

        self.status = None;

        match key {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data()?;
            }

            KeyCode::Char('/') if self.view == View::Topics => {
                self.filter_mode = true;
                self.filter_input.clear();
            }

            KeyCode::Esc => match self.view {
                View::TopicDetail => self.close_topic(),
                View::Topics if self.state.tag_filter().is_some() => {
                    self.filter_input.clear();
                    self.apply_filter();
                }
                View::Topics | View::Dashboard => {}
            },

            KeyCode::Char('h') | KeyCode::Left => match self.view {
                View::TopicDetail => self.close_topic(),
                _ => self.view = self.view.prev(),
            },
            KeyCode::Char('l') | KeyCode::Right => match self.view {
                View::Topics => self.select_topic(),
                View::TopicDetail => {}
                _ => self.view = self.view.next(),
            },

            KeyCode::Tab => {
                if modifiers.contains(KeyModifiers::SHIFT) {
                    self.view = self.view.prev();
                } else {
                    self.view = self.view.next();
                }
            }
            KeyCode::BackTab => {
                self.view = self.view.prev();
            }

            KeyCode::Char('j') | KeyCode::Down => match self.view {
                View::Topics => self.topics.next(),
                View::TopicDetail => self.cycles.next(),
                View::Dashboard => {}
            },
            KeyCode::Char('k') | KeyCode::Up => match self.view {
                View::Topics => self.topics.previous(),
                View::TopicDetail => self.cycles.previous(),
                View::Dashboard => {}
            },

            KeyCode::Char('g') => match self.view {
                View::Topics => self.topics.first(),
                View::TopicDetail => self.cycles.first(),
                View::Dashboard => {}
            },
            KeyCode::Char('G') => match self.view {
                View::Topics => self.topics.last(),
                View::TopicDetail => self.cycles.last(),
                View::Dashboard => {}
            },

            KeyCode::Char('x') if self.view == View::TopicDetail => {
                self.delete_selected_cycle()?;
            }

            KeyCode::Enter if self.view == View::Topics => self.select_topic(),

            _ => {}
        }
        Ok(())
    }
}

pub fn run(db: Database, state: StudyState, config: Config) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(db, state, config);

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
