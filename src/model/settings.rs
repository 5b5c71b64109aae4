use tracing::warn;

use crate::config::AppConfig;
use crate::market::filter::clamp_threshold;
use crate::market::{FilterState, SortKey};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum SettingsField {
    #[default]
    HighlightThreshold,
    SortColumn,
    SortDirection,
}

impl SettingsField {
    pub fn next(self) -> Self {
        match self {
            SettingsField::HighlightThreshold => SettingsField::SortColumn,
            SettingsField::SortColumn => SettingsField::SortDirection,
            SettingsField::SortDirection => SettingsField::HighlightThreshold,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            SettingsField::HighlightThreshold => SettingsField::SortDirection,
            SettingsField::SortColumn => SettingsField::HighlightThreshold,
            SettingsField::SortDirection => SettingsField::SortColumn,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::HighlightThreshold => "Highlight threshold",
            SettingsField::SortColumn => "Sort column",
            SettingsField::SortDirection => "Sort direction",
        }
    }
}

/// Startup values derived from the config file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppSettings {
    pub world: String,
    pub highlight_threshold: i32,
    pub sort_key: SortKey,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            world: "Aether".to_string(),
            highlight_threshold: 105,
            sort_key: SortKey::AverageGil,
        }
    }
}

impl AppSettings {
    pub fn initial_filter(&self) -> FilterState {
        FilterState::with_defaults(self.sort_key, self.highlight_threshold)
    }
}

impl From<AppConfig> for AppSettings {
    fn from(value: AppConfig) -> Self {
        let defaults = AppSettings::default();
        let world = value.default_world.trim();
        Self {
            world: if world.is_empty() {
                defaults.world
            } else {
                world.to_string()
            },
            highlight_threshold: clamp_threshold(value.highlight_threshold),
            sort_key: match SortKey::from_key(&value.default_sort_key) {
                Some(key) => key,
                None => {
                    warn!(
                        key = %value.default_sort_key,
                        "Unknown default_sort_key in config; using the default column"
                    );
                    defaults.sort_key
                }
            },
        }
    }
}
