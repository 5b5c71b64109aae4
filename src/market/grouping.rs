use crate::model::MateriaEntry;

use super::filter::FilterState;

/// Stats that start selected when the user has not picked any yet.
pub const DEFAULT_STATS: [&str; 3] = ["CP", "Control", "Craftsmanship"];

/// Distinct stat keys in the order they are first seen.
pub fn discover_stats(entries: &[MateriaEntry]) -> Vec<String> {
    let mut stats: Vec<String> = Vec::new();
    for entry in entries {
        if !stats.iter().any(|stat| stat == &entry.stat) {
            stats.push(entry.stat.clone());
        }
    }
    stats
}

pub fn default_selection(all_stats: &[String]) -> Vec<String> {
    all_stats
        .iter()
        .filter(|stat| DEFAULT_STATS.contains(&stat.as_str()))
        .cloned()
        .collect()
}

/// Refreshes the discovered stat set for a new snapshot and seeds the
/// selection only while it is still empty.
pub fn seed_selection(filter: &mut FilterState, entries: &[MateriaEntry]) {
    filter.all_stats = discover_stats(entries);
    if filter.selected_stats.is_empty() {
        filter.selected_stats = default_selection(&filter.all_stats);
    }
}

/// Entries grouped per stat, groups in discovery order, entries in input order.
pub fn partition_by_stat(entries: &[MateriaEntry]) -> Vec<(String, Vec<&MateriaEntry>)> {
    let mut groups: Vec<(String, Vec<&MateriaEntry>)> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|(stat, _)| stat == &entry.stat) {
            Some((_, members)) => members.push(entry),
            None => groups.push((entry.stat.clone(), vec![entry])),
        }
    }
    groups
}
