use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::client::TimingReport;
use crate::errors::AppError;
use crate::market::{build_view, seed_selection, FilterState, RankedRow, SortKey, ViewModel};

pub mod materia;
pub mod settings;
pub mod timing_panel;

pub use materia::{format_gil, MateriaEntry, ScripType};
pub use settings::{AppSettings, SettingsField};
pub use timing_panel::TimingPanel;

/// Identifies one issued materia request. Ids grow monotonically per session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub request_id: u64,
    pub world: String,
}

#[derive(Debug)]
pub enum AppEvent {
    MateriaLoaded {
        request_id: u64,
        world: String,
        entries: Vec<MateriaEntry>,
    },
    MateriaFailed {
        request_id: u64,
        world: String,
        error: AppError,
    },
    TimingsLoaded {
        report: TimingReport,
    },
    TimingsFailed {
        error: AppError,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Stats,
    Tables,
}

#[derive(Debug, Default)]
pub struct AppState {
    /// World whose snapshot is on screen.
    pub world: String,
    /// World of the in-flight request, committed to `world` only on success.
    pub pending_world: Option<String>,
    pub entries: Vec<MateriaEntry>,
    pub filter: FilterState,
    pub view: ViewModel,
    pub loading: bool,
    pub latest_request: u64,
    pub last_updated: Option<DateTime<Local>>,
    pub last_error: Option<AppError>,
    pub timing: TimingPanel,
    pub show_settings: bool,
    pub settings_cursor: SettingsField,
    pub show_listings: bool,
    pub world_input: Option<String>,
    pub focus: Focus,
    pub stat_cursor: usize,
    pub column_cursor: usize,
    pub row_cursor: usize,
}

impl AppState {
    pub fn new(settings: &AppSettings) -> Self {
        let mut state = Self {
            world: settings.world.clone(),
            filter: settings.initial_filter(),
            ..Self::default()
        };
        state.recompute();
        state
    }

    /// Re-runs the whole pipeline on the current snapshot and filter.
    pub fn recompute(&mut self) {
        self.view = build_view(&self.entries, &self.filter);
        self.clamp_cursors();
    }

    /// Issues a new request id for `world`; any older in-flight result becomes stale.
    pub fn begin_fetch(&mut self, world: &str) -> FetchTicket {
        self.latest_request += 1;
        self.pending_world = Some(world.to_string());
        self.loading = true;
        FetchTicket {
            request_id: self.latest_request,
            world: world.to_string(),
        }
    }

    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::MateriaLoaded {
                request_id,
                world,
                entries,
            } => {
                if request_id != self.latest_request {
                    debug!(request_id, latest = self.latest_request, world = %world, "Dropping stale materia snapshot");
                    return;
                }
                info!(world = %world, count = entries.len(), "Materia snapshot applied");
                self.world = world;
                self.pending_world = None;
                self.entries = entries;
                seed_selection(&mut self.filter, &self.entries);
                self.loading = false;
                self.last_error = None;
                self.last_updated = Some(Local::now());
                self.recompute();
            }
            AppEvent::MateriaFailed {
                request_id,
                world,
                error,
            } => {
                if request_id != self.latest_request {
                    debug!(request_id, world = %world, "Ignoring failure of superseded request");
                    return;
                }
                warn!(world = %world, error = %error, "Materia fetch failed; keeping previous data");
                self.loading = false;
                self.pending_world = None;
                self.last_error = Some(error);
            }
            AppEvent::TimingsLoaded { report } => {
                self.timing.loaded(report);
            }
            AppEvent::TimingsFailed { error } => {
                warn!(error = %error, "Timing fetch failed");
                self.timing.failed(error.to_string());
            }
        }
    }

    pub fn toggle_stat(&mut self, stat: &str) {
        self.filter.toggle_stat(stat);
        self.recompute();
    }

    pub fn toggle_stat_at_cursor(&mut self) {
        if let Some(stat) = self.filter.all_stats.get(self.stat_cursor).cloned() {
            self.toggle_stat(&stat);
        }
    }

    pub fn set_sort(&mut self, key: SortKey) {
        self.filter.set_sort(key);
        debug!(sort = key.key(), order = self.filter.sort_order.label(), "Sort changed");
        self.recompute();
    }

    pub fn move_stat_cursor(&mut self, delta: i32) {
        let len = self.filter.all_stats.len();
        self.stat_cursor = step(self.stat_cursor, delta, len);
    }

    pub fn cycle_column(&mut self, delta: i32) {
        let len = self.view.columns.len();
        self.column_cursor = wrap(self.column_cursor, delta, len);
        self.row_cursor = 0;
        self.clamp_cursors();
    }

    pub fn move_row(&mut self, delta: i32) {
        let len = self
            .view
            .columns
            .get(self.column_cursor)
            .map_or(0, |c| c.rows.len());
        self.row_cursor = step(self.row_cursor, delta, len);
    }

    pub fn selected_row(&self) -> Option<&RankedRow> {
        self.view.row(self.column_cursor, self.row_cursor)
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Stats => Focus::Tables,
            Focus::Tables => Focus::Stats,
        };
    }

    pub fn next_setting(&mut self) {
        self.settings_cursor = self.settings_cursor.next();
    }

    pub fn prev_setting(&mut self) {
        self.settings_cursor = self.settings_cursor.prev();
    }

    pub fn adjust_selected_setting(&mut self, forward: bool) {
        match self.settings_cursor {
            SettingsField::HighlightThreshold => {
                self.filter
                    .adjust_highlight_threshold(if forward { 1 } else { -1 });
            }
            SettingsField::SortColumn => {
                let key = if forward {
                    self.filter.sort_key.next()
                } else {
                    self.filter.sort_key.prev()
                };
                self.filter.set_sort(key);
            }
            SettingsField::SortDirection => {
                let key = self.filter.sort_key;
                self.filter.set_sort(key);
            }
        }
        self.recompute();
    }

    pub fn begin_world_input(&mut self) {
        self.world_input = Some(self.world.clone());
    }

    /// Finishes the world prompt; returns the new world when it differs and is non-empty.
    pub fn submit_world_input(&mut self) -> Option<String> {
        let input = self.world_input.take()?;
        let world = input.trim();
        if world.is_empty() || world == self.world {
            return None;
        }
        Some(world.to_string())
    }

    pub fn clone_snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            world: self.world.clone(),
            pending_world: self.pending_world.clone(),
            view: self.view.clone(),
            all_stats: self.filter.all_stats.clone(),
            loading: self.loading,
            entry_count: self.entries.len(),
            last_updated: self.last_updated,
            last_error: self.last_error.clone(),
            timing: self.timing.clone(),
            show_settings: self.show_settings,
            settings_cursor: self.settings_cursor,
            show_listings: self.show_listings,
            world_input: self.world_input.clone(),
            focus: self.focus,
            stat_cursor: self.stat_cursor,
            column_cursor: self.column_cursor,
            row_cursor: self.row_cursor,
        }
    }

    fn clamp_cursors(&mut self) {
        let stats = self.filter.all_stats.len();
        self.stat_cursor = self.stat_cursor.min(stats.saturating_sub(1));
        let columns = self.view.columns.len();
        self.column_cursor = self.column_cursor.min(columns.saturating_sub(1));
        let rows = self
            .view
            .columns
            .get(self.column_cursor)
            .map_or(0, |c| c.rows.len());
        self.row_cursor = self.row_cursor.min(rows.saturating_sub(1));
    }
}

/// Read-only copy handed to the renderer.
#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub world: String,
    pub pending_world: Option<String>,
    pub view: ViewModel,
    pub all_stats: Vec<String>,
    pub loading: bool,
    pub entry_count: usize,
    pub last_updated: Option<DateTime<Local>>,
    pub last_error: Option<AppError>,
    pub timing: TimingPanel,
    pub show_settings: bool,
    pub settings_cursor: SettingsField,
    pub show_listings: bool,
    pub world_input: Option<String>,
    pub focus: Focus,
    pub stat_cursor: usize,
    pub column_cursor: usize,
    pub row_cursor: usize,
}

impl AppSnapshot {
    pub fn selected_row(&self) -> Option<&RankedRow> {
        self.view.row(self.column_cursor, self.row_cursor)
    }
}

fn step(current: usize, delta: i32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let max = len as i64 - 1;
    (current as i64 + i64::from(delta)).clamp(0, max) as usize
}

fn wrap(current: usize, delta: i32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current as i64 + i64::from(delta)).rem_euclid(len as i64) as usize
}
