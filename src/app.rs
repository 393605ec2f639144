use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use sysinfo::{Signal, System};

use crate::action::{Action, Direction};
use crate::config::{Config, KeybindsConfig, parse_key};
use crate::sampler::dimension::Dimension;
use crate::sampler::group::{GroupBy, TrackedKey};
use crate::sampler::tracker::RankedEntry;
use crate::sampler::{CycleReport, SamplerConfig};
use crate::system::kill::{KillResult, kill_process};
use crate::ui::theme::Theme;

const STATUS_TTL_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Help,
}

#[derive(Debug, Clone)]
pub struct ResolvedKeybinds {
    pub quit: KeyCode,
    pub kill: KeyCode,
    pub force_kill: KeyCode,
    pub help: KeyCode,
    pub next_tab: KeyCode,
    pub prev_tab: KeyCode,
}

impl ResolvedKeybinds {
    pub fn from_config(kb: &KeybindsConfig) -> Self {
        Self {
            quit: parse_key(&kb.quit).unwrap_or(KeyCode::Char('q')),
            kill: parse_key(&kb.kill).unwrap_or(KeyCode::Char('k')),
            force_kill: parse_key(&kb.force_kill).unwrap_or(KeyCode::Char('K')),
            help: parse_key(&kb.help).unwrap_or(KeyCode::Char('?')),
            next_tab: parse_key(&kb.next_tab).unwrap_or(KeyCode::Tab),
            prev_tab: parse_key(&kb.prev_tab).unwrap_or(KeyCode::BackTab),
        }
    }

    /// Returns (key_label, description) pairs for all configurable keybinds.
    pub fn help_entries(&self) -> Vec<(String, &'static str)> {
        let mut entries = vec![
            (key_label(self.quit), "Quit"),
            (key_label(self.next_tab), "Next tab"),
            (key_label(self.prev_tab), "Previous tab"),
            (key_label(self.kill), "Kill process (SIGTERM)"),
            (key_label(self.force_kill), "Force kill (SIGKILL)"),
            (key_label(self.help), "Toggle help"),
        ];
        entries.push(("1-4".to_string(), "Jump to tab"));
        entries.push(("\u{2190}\u{2192}".to_string(), "Switch tab"));
        entries.push(("\u{2191}\u{2193}".to_string(), "Select row"));
        entries.push(("Ctrl+C".to_string(), "Quit (always)"));
        entries
    }
}

pub fn key_label(code: KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "S-Tab".to_string(),
        KeyCode::Left => "\u{2190}".to_string(),
        KeyCode::Right => "\u{2192}".to_string(),
        _ => "?".to_string(),
    }
}

pub struct App {
    pub running: bool,
    pub tabs: Vec<Dimension>,
    pub tab: Dimension,
    pub report: Option<CycleReport>,
    pub selected_index: usize,
    selected_key: Option<TrackedKey>,
    pub input_mode: InputMode,
    pub status_message: Option<(String, Instant)>,
    pub theme: Theme,
    pub keybinds: ResolvedKeybinds,
    pub group_by: GroupBy,
    pub window: usize,
    system: System,
}

impl App {
    pub fn new(config: &Config, sampler: &SamplerConfig) -> Self {
        let tabs = sampler.dimensions.clone();
        let wanted = Dimension::from_str_config(&config.general.default_tab);
        let tab = if tabs.contains(&wanted) {
            wanted
        } else {
            tabs.first().copied().unwrap_or(Dimension::Cpu)
        };

        App {
            running: true,
            tabs,
            tab,
            report: None,
            selected_index: 0,
            selected_key: None,
            input_mode: InputMode::Normal,
            status_message: None,
            theme: Theme::from_config(&config.colors.theme),
            keybinds: ResolvedKeybinds::from_config(&config.keybinds),
            group_by: sampler.group_by,
            window: sampler.window,
            system: System::new(),
        }
    }

    /// Takes a fresh cycle report, keeping the selection on the same key
    /// when it is still ranked.
    pub fn apply_report(&mut self, report: CycleReport) {
        self.report = Some(report);
        self.restore_selection();
        self.expire_status();
    }

    pub fn on_tick(&mut self) {
        self.expire_status();
    }

    fn expire_status(&mut self) {
        if let Some((_, created)) = &self.status_message
            && created.elapsed().as_secs() >= STATUS_TTL_SECS
        {
            self.status_message = None;
        }
    }

    pub fn entries(&self) -> &[RankedEntry] {
        self.report
            .as_ref()
            .and_then(|r| r.board(self.tab))
            .map(|b| b.entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected_entry(&self) -> Option<&RankedEntry> {
        self.entries().get(self.selected_index)
    }

    pub fn selected_pid(&self) -> Option<u32> {
        self.selected_entry().map(|e| e.pid)
    }

    fn restore_selection(&mut self) {
        let found = self.selected_key.as_ref().and_then(|key| {
            self.entries().iter().position(|e| &e.key == key)
        });
        let len = self.entries().len();
        self.selected_index = match found {
            Some(index) => index,
            None if len == 0 => 0,
            None => self.selected_index.min(len - 1),
        };
        self.remember_selection();
    }

    fn remember_selection(&mut self) {
        self.selected_key = self.selected_entry().map(|e| e.key.clone());
    }

    pub fn map_key(&self, key: KeyEvent) -> Action {
        // Ctrl+C always quits (hardwired safety)
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }

        match self.input_mode {
            InputMode::Normal => self.map_key_normal(key),
            InputMode::Help => self.map_key_help(key),
        }
    }

    fn map_key_normal(&self, key: KeyEvent) -> Action {
        let code = key.code;
        let kb = &self.keybinds;

        // Arrow keys are hardwired (not configurable)
        match code {
            KeyCode::Up => return Action::Navigate(Direction::Up),
            KeyCode::Down => return Action::Navigate(Direction::Down),
            KeyCode::Right => return Action::NextTab,
            KeyCode::Left => return Action::PrevTab,
            KeyCode::Char(c @ '1'..='4') => {
                return Action::SelectTab(c as usize - '1' as usize);
            }
            _ => {}
        }

        if code == kb.quit {
            return Action::Quit;
        }
        if code == kb.next_tab {
            return Action::NextTab;
        }
        if code == kb.prev_tab {
            return Action::PrevTab;
        }
        if code == kb.kill {
            return self.selected_pid().map_or(Action::None, Action::Kill);
        }
        if code == kb.force_kill {
            return self.selected_pid().map_or(Action::None, Action::ForceKill);
        }
        if code == kb.help {
            return Action::ToggleHelp;
        }

        Action::None
    }

    fn map_key_help(&self, key: KeyEvent) -> Action {
        let code = key.code;
        // In help mode, only the help key and Esc dismiss, everything else is ignored
        if code == self.keybinds.help || code == KeyCode::Esc {
            return Action::ToggleHelp;
        }
        Action::None
    }

    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::Navigate(dir) => self.navigate(dir),
            Action::NextTab => self.switch_tab(1),
            Action::PrevTab => self.switch_tab(self.tabs.len().saturating_sub(1)),
            Action::SelectTab(index) => {
                if let Some(&tab) = self.tabs.get(index) {
                    self.set_tab(tab);
                }
            }
            Action::Kill(pid) => self.signal(pid, Signal::Term),
            Action::ForceKill(pid) => self.signal(pid, Signal::Kill),
            Action::ToggleHelp => {
                self.input_mode = if self.input_mode == InputMode::Help {
                    InputMode::Normal
                } else {
                    InputMode::Help
                };
            }
            Action::None => {}
        }
    }

    fn switch_tab(&mut self, step: usize) {
        if self.tabs.is_empty() {
            return;
        }
        let current = self.tabs.iter().position(|&t| t == self.tab).unwrap_or(0);
        let next = self.tabs[(current + step) % self.tabs.len()];
        self.set_tab(next);
    }

    fn set_tab(&mut self, tab: Dimension) {
        if tab != self.tab {
            self.tab = tab;
            self.selected_index = 0;
            self.remember_selection();
        }
    }

    fn navigate(&mut self, direction: Direction) {
        let len = self.entries().len();
        if len == 0 {
            return;
        }
        self.selected_index = match direction {
            Direction::Up => self.selected_index.saturating_sub(1),
            Direction::Down => (self.selected_index + 1).min(len - 1),
        };
        self.remember_selection();
    }

    fn signal(&mut self, pid: u32, signal: Signal) {
        if pid == 0 {
            return;
        }
        let result = kill_process(&mut self.system, pid, signal);
        match &result {
            KillResult::Success(..) => tracing::info!(pid, "signal sent"),
            _ => tracing::warn!(pid, result = %result.message(), "signal not delivered"),
        }
        self.status_message = Some((result.message(), Instant::now()));
    }

    pub fn show_help(&self) -> bool {
        self.input_mode == InputMode::Help
    }

    pub fn help_entries(&self) -> Vec<(String, &'static str)> {
        self.keybinds.help_entries()
    }
}
