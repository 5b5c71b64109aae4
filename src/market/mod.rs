//! Pure transformation from a materia snapshot to the grouped, ranked and
//! highlighted tables the board renders.

pub mod filter;
pub mod grouping;
pub mod highlight;
pub mod ranking;
pub mod view;

pub use filter::{FilterState, THRESHOLD_MAX, THRESHOLD_MIN};
pub use grouping::seed_selection;
pub use ranking::SortKey;
pub use view::{build_view, RankedRow, StatColumn, ViewModel};
