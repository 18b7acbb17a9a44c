pub mod blacklist;
pub mod npc_targeting;

pub use blacklist::{
    Blacklist, BlacklistReason, MouseOverBlacklist, MouseOverContext, NoBlacklist,
    UnitClassification,
};
pub use npc_targeting::{CursorClassifier, CursorType, MouseInput, MouseOverReader, NpcNameTargeting};
