use super::ranking::SortKey;

pub const THRESHOLD_MIN: i32 = 80;
pub const THRESHOLD_MAX: i32 = 120;
pub const THRESHOLD_DEFAULT: i32 = 105;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortOrder::Ascending => "↑",
            SortOrder::Descending => "↓",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

/// Which stats are visible, how tables are ordered and when rows are flagged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterState {
    pub selected_stats: Vec<String>,
    pub all_stats: Vec<String>,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    highlight_threshold: i32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            selected_stats: Vec::new(),
            all_stats: Vec::new(),
            sort_key: SortKey::default(),
            sort_order: SortOrder::Ascending,
            highlight_threshold: THRESHOLD_DEFAULT,
        }
    }
}

impl FilterState {
    pub fn with_defaults(sort_key: SortKey, threshold: i32) -> Self {
        let mut filter = Self {
            sort_key,
            ..Self::default()
        };
        filter.set_highlight_threshold(threshold);
        filter
    }

    pub fn toggle_stat(&mut self, stat: &str) {
        if let Some(pos) = self.selected_stats.iter().position(|s| s == stat) {
            self.selected_stats.remove(pos);
        } else {
            self.selected_stats.push(stat.to_string());
        }
    }

    pub fn is_selected(&self, stat: &str) -> bool {
        self.selected_stats.iter().any(|s| s == stat)
    }

    /// Selected stats that exist in the current snapshot, in discovery order.
    pub fn visible_stats(&self) -> impl Iterator<Item = &String> {
        self.all_stats.iter().filter(|stat| self.is_selected(stat))
    }

    /// Click-to-sort: the active column flips direction, a new column starts ascending.
    pub fn set_sort(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.sort_order = self.sort_order.flipped();
        } else {
            self.sort_key = key;
            self.sort_order = SortOrder::Ascending;
        }
    }

    pub fn highlight_threshold(&self) -> i32 {
        self.highlight_threshold
    }

    pub fn set_highlight_threshold(&mut self, pct: i32) {
        self.highlight_threshold = clamp_threshold(pct);
    }

    pub fn adjust_highlight_threshold(&mut self, delta: i32) {
        self.set_highlight_threshold(self.highlight_threshold.saturating_add(delta));
    }
}

pub fn clamp_threshold(pct: i32) -> i32 {
    pct.clamp(THRESHOLD_MIN, THRESHOLD_MAX)
}
