use crate::model::MateriaEntry;

/// True when the current price is at or below `threshold_pct` percent of the
/// historical average. Entries without both prices, or with no positive
/// history, are never flagged.
pub fn is_highlighted(entry: &MateriaEntry, threshold_pct: i32) -> bool {
    match (entry.average_gil, entry.historical_avg) {
        (Some(current), Some(history)) if history > 0 => {
            within_threshold(current, history, threshold_pct)
        }
        _ => false,
    }
}

// Integer form of `current <= history * pct / 100`.
fn within_threshold(current: i64, history: i64, threshold_pct: i32) -> bool {
    let lhs = i128::from(current) * 100;
    let rhs = i128::from(history) * i128::from(threshold_pct);
    lhs <= rhs
}
