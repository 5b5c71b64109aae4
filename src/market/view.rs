use crate::model::MateriaEntry;

use super::filter::{FilterState, SortOrder};
use super::grouping::partition_by_stat;
use super::highlight::is_highlighted;
use super::ranking::{rank_stat, SortKey};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankedRow {
    pub entry: MateriaEntry,
    pub highlighted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatColumn {
    pub stat: String,
    /// Colour hint of the first ranked row.
    pub color: Option<String>,
    pub rows: Vec<RankedRow>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatChip {
    pub stat: String,
    pub selected: bool,
    pub count: usize,
}

/// Everything the renderer needs, derived from `(entries, filter)` in one pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewModel {
    pub chips: Vec<StatChip>,
    pub columns: Vec<StatColumn>,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    pub threshold: i32,
}

impl ViewModel {
    /// Arrow for the active column, empty for the rest.
    pub fn sort_indicator(&self, key: SortKey) -> &'static str {
        if key == self.sort_key {
            self.sort_order.arrow()
        } else {
            ""
        }
    }

    pub fn highlighted_count(&self) -> usize {
        self.columns
            .iter()
            .flat_map(|column| column.rows.iter())
            .filter(|row| row.highlighted)
            .count()
    }

    pub fn row(&self, column: usize, row: usize) -> Option<&RankedRow> {
        self.columns.get(column).and_then(|c| c.rows.get(row))
    }
}

pub fn build_view(entries: &[MateriaEntry], filter: &FilterState) -> ViewModel {
    let threshold = filter.highlight_threshold();

    let chips = partition_by_stat(entries)
        .into_iter()
        .map(|(stat, members)| StatChip {
            selected: filter.is_selected(&stat),
            count: members.len(),
            stat,
        })
        .collect();

    let columns = filter
        .visible_stats()
        .map(|stat| {
            let rows: Vec<RankedRow> = rank_stat(entries, stat, filter.sort_key, filter.sort_order)
                .into_iter()
                .map(|entry| RankedRow {
                    highlighted: is_highlighted(entry, threshold),
                    entry: entry.clone(),
                })
                .collect();
            StatColumn {
                stat: stat.clone(),
                color: rows.first().and_then(|row| row.entry.color.clone()),
                rows,
            }
        })
        .collect();

    ViewModel {
        chips,
        columns,
        sort_key: filter.sort_key,
        sort_order: filter.sort_order,
        threshold,
    }
}

#[cfg(test)]
mod tests {
    use crate::market::grouping::seed_selection;

    use super::*;

    fn entry(id: u64, stat: &str, average_gil: i64, historical_avg: Option<i64>) -> MateriaEntry {
        MateriaEntry {
            id,
            name: format!("{stat} {id}"),
            stat: stat.to_string(),
            average_gil: Some(average_gil),
            historical_avg,
            color: Some("Blue".into()),
            ..Default::default()
        }
    }

    fn snapshot() -> Vec<MateriaEntry> {
        vec![
            entry(1, "CP", 900, Some(1000)),
            entry(2, "Piety", 10, Some(1000)),
            entry(3, "CP", 300, None),
            entry(4, "Control", 2000, Some(1000)),
            entry(5, "CP", 1100, Some(1000)),
        ]
    }

    #[test]
    fn builds_one_column_per_visible_stat() {
        let entries = snapshot();
        let mut filter = FilterState::default();
        seed_selection(&mut filter, &entries);
        let view = build_view(&entries, &filter);

        let stats: Vec<&str> = view.columns.iter().map(|c| c.stat.as_str()).collect();
        assert_eq!(stats, vec!["CP", "Control"]);

        let cp_ids: Vec<u64> = view.columns[0].rows.iter().map(|r| r.entry.id).collect();
        assert_eq!(cp_ids, vec![3, 1, 5]);
        let flags: Vec<bool> = view.columns[0].rows.iter().map(|r| r.highlighted).collect();
        assert_eq!(flags, vec![false, true, false]);
        assert_eq!(view.columns[0].color.as_deref(), Some("Blue"));
        assert_eq!(view.highlighted_count(), 1);
    }

    #[test]
    fn chips_cover_every_stat_with_counts() {
        let entries = snapshot();
        let mut filter = FilterState::default();
        seed_selection(&mut filter, &entries);
        let view = build_view(&entries, &filter);
        let chips: Vec<(&str, bool, usize)> = view
            .chips
            .iter()
            .map(|c| (c.stat.as_str(), c.selected, c.count))
            .collect();
        assert_eq!(
            chips,
            vec![("CP", true, 3), ("Piety", false, 1), ("Control", true, 1)]
        );
    }

    #[test]
    fn threshold_change_only_moves_flags() {
        let entries = snapshot();
        let mut filter = FilterState::default();
        seed_selection(&mut filter, &entries);
        filter.set_highlight_threshold(120);
        let view = build_view(&entries, &filter);
        let flags: Vec<bool> = view.columns[0].rows.iter().map(|r| r.highlighted).collect();
        assert_eq!(flags, vec![false, true, true]);
    }

    #[test]
    fn double_click_restores_initial_order() {
        let entries = snapshot();
        let mut filter = FilterState::default();
        seed_selection(&mut filter, &entries);
        let initial = build_view(&entries, &filter);
        filter.set_sort(SortKey::AverageGil);
        assert_eq!(filter.sort_order, SortOrder::Descending);
        let reversed = build_view(&entries, &filter);
        assert_eq!(reversed.sort_indicator(SortKey::AverageGil), "↓");
        filter.set_sort(SortKey::AverageGil);
        let restored = build_view(&entries, &filter);
        assert_eq!(initial, restored);
        assert_eq!(restored.sort_indicator(SortKey::AverageGil), "↑");
        assert_eq!(restored.sort_indicator(SortKey::Name), "");
    }

    #[test]
    fn empty_snapshot_yields_empty_view() {
        let view = build_view(&[], &FilterState::default());
        assert!(view.columns.is_empty());
        assert!(view.chips.is_empty());
        assert!(view.row(0, 0).is_none());
    }
}
