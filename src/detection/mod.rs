pub mod color_matcher;
pub mod line_scanner;
pub mod name_finder;
pub mod name_grouper;
pub mod npc_names;
pub mod npc_position;

pub use color_matcher::{ColorMatcher, ColorThresholds, FuzzyMetric, SearchMode};
pub use line_scanner::{LineOfNpcName, NameLineScanner};
pub use name_finder::{DetectionOutcome, NpcNameFinder, NpcSnapshot};
pub use name_grouper::NameGrouper;
pub use npc_names::NpcNames;
pub use npc_position::{NpcPosition, ScreenGeometry};
