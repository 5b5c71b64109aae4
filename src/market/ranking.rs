use std::cmp::Ordering;

use crate::model::MateriaEntry;

use super::filter::SortOrder;

/// Sortable table columns. Each key maps to one typed accessor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum SortKey {
    Name,
    StatIncrease,
    #[default]
    AverageGil,
    ScripCost,
    CheapestListing,
    TotalQuantity,
    ListingCount,
    HistoricalAvg,
}

/// Column value used for ordering. Absent numbers read as 0, absent text as "".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue<'a> {
    Number(i64),
    Text(&'a str),
}

impl SortKey {
    pub const ALL: [SortKey; 8] = [
        SortKey::Name,
        SortKey::StatIncrease,
        SortKey::AverageGil,
        SortKey::ScripCost,
        SortKey::CheapestListing,
        SortKey::TotalQuantity,
        SortKey::ListingCount,
        SortKey::HistoricalAvg,
    ];

    /// Parses the wire/config name of a column. Unknown names are rejected.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "name" => Some(SortKey::Name),
            "stat_increase" => Some(SortKey::StatIncrease),
            "average_gil" => Some(SortKey::AverageGil),
            "scrip_cost" => Some(SortKey::ScripCost),
            "cheapest_listings" => Some(SortKey::CheapestListing),
            "total_quantity" => Some(SortKey::TotalQuantity),
            "listing_count" => Some(SortKey::ListingCount),
            "historical_avg" => Some(SortKey::HistoricalAvg),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::StatIncrease => "stat_increase",
            SortKey::AverageGil => "average_gil",
            SortKey::ScripCost => "scrip_cost",
            SortKey::CheapestListing => "cheapest_listings",
            SortKey::TotalQuantity => "total_quantity",
            SortKey::ListingCount => "listing_count",
            SortKey::HistoricalAvg => "historical_avg",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Name => "Name",
            SortKey::StatIncrease => "+Stat",
            SortKey::AverageGil => "Avg Price",
            SortKey::ScripCost => "Scrip",
            SortKey::CheapestListing => "Cheapest",
            SortKey::TotalQuantity => "Qty",
            SortKey::ListingCount => "Listings",
            SortKey::HistoricalAvg => "Hist Avg",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn value(self, entry: &MateriaEntry) -> SortValue<'_> {
        match self {
            SortKey::Name => SortValue::Text(&entry.name),
            SortKey::StatIncrease => SortValue::Number(entry.stat_increase.unwrap_or(0)),
            SortKey::AverageGil => SortValue::Number(entry.average_gil.unwrap_or(0)),
            SortKey::ScripCost => SortValue::Number(entry.scrip_cost.unwrap_or(0)),
            SortKey::CheapestListing => {
                SortValue::Number(entry.cheapest_price().map_or(0, saturating_i64))
            }
            SortKey::TotalQuantity => SortValue::Number(saturating_i64(entry.total_quantity)),
            SortKey::ListingCount => SortValue::Number(saturating_i64(entry.listing_count)),
            SortKey::HistoricalAvg => SortValue::Number(entry.historical_avg.unwrap_or(0)),
        }
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

pub fn compare_entries(
    a: &MateriaEntry,
    b: &MateriaEntry,
    key: SortKey,
    order: SortOrder,
) -> Ordering {
    let ordering = key.value(a).cmp(&key.value(b));
    match order {
        SortOrder::Ascending => ordering,
        SortOrder::Descending => ordering.reverse(),
    }
}

/// Entries of one stat, ordered by the active column. The sort is stable so
/// equal values keep their snapshot order.
pub fn rank_stat<'a>(
    entries: &'a [MateriaEntry],
    stat: &str,
    key: SortKey,
    order: SortOrder,
) -> Vec<&'a MateriaEntry> {
    let mut ranked: Vec<&MateriaEntry> = entries.iter().filter(|e| e.stat == stat).collect();
    ranked.sort_by(|a, b| compare_entries(a, b, key, order));
    ranked
}
