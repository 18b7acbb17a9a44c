use std::fmt;

use serde::Deserialize;
use tracing::{info, warn};

use crate::config::BlacklistConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitClassification {
    #[default]
    Normal,
    Trivial,
    Minus,
    Rare,
    Elite,
    RareElite,
    WorldBoss,
}

/// State of the unit under the mouse cursor, as reported by the addon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MouseOverContext {
    pub has_mouse_over: bool,
    pub id: i32,
    pub guid: i32,
    pub name: String,
    pub level: i32,
    pub classification: UnitClassification,
    pub player_level: i32,
    /// The unit is in the combat log as having damaged us.
    pub damaged_us: bool,
    /// The unit is our own pet and the pet has a target.
    pub is_own_pet: bool,
    pub targets_player_or_pet: bool,
    pub is_player: bool,
    pub player_controlled: bool,
    pub dead: bool,
    pub tagged: bool,
    pub hostile: bool,
    pub trivial: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlacklistReason {
    OwnPet,
    Classification,
    Player,
    Tagged,
    LevelTooHigh,
    NoExperience,
    LevelTooLow,
    NameMatch,
}

impl fmt::Display for BlacklistReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BlacklistReason::OwnPet => "is our pet",
            BlacklistReason::Classification => "not defined in the target mask",
            BlacklistReason::Player => "is player",
            BlacklistReason::Tagged => "is tagged",
            BlacklistReason::LevelTooHigh => "too high level",
            BlacklistReason::NoExperience => "not yield experience",
            BlacklistReason::LevelTooLow => "too low level",
            BlacklistReason::NameMatch => "name match",
        };
        f.write_str(text)
    }
}

/// Decides whether a unit under the cursor should be left alone.
pub trait Blacklist: Send {
    fn is_blacklisted(&mut self, mouse_over: &MouseOverContext) -> bool;
}

/// Accepts every unit.
#[derive(Debug, Default)]
pub struct NoBlacklist;

impl Blacklist for NoBlacklist {
    fn is_blacklisted(&mut self, _mouse_over: &MouseOverContext) -> bool {
        false
    }
}

pub struct MouseOverBlacklist {
    config: BlacklistConfig,
    names: Vec<String>,
    last_guid: i32,
}

impl MouseOverBlacklist {
    pub fn new(config: BlacklistConfig) -> Self {
        info!("[MouseOverBlacklist] target mask: {:?}", config.target_mask);
        if !config.names.is_empty() {
            info!("[MouseOverBlacklist] names: {}", config.names.join(", "));
        }

        let names = config.names.iter().map(|n| n.to_lowercase()).collect();
        Self {
            config,
            names,
            last_guid: 0,
        }
    }

    /// First rule the unit breaks, if any. Rules are checked in a fixed order.
    pub fn check(&mut self, mo: &MouseOverContext) -> Option<BlacklistReason> {
        if !mo.has_mouse_over {
            self.last_guid = 0;
            return None;
        }
        if mo.damaged_us {
            return None;
        }
        if mo.is_own_pet {
            return Some(BlacklistReason::OwnPet);
        }
        // it is already fighting us
        if mo.targets_player_or_pet {
            return None;
        }

        let reason = self.rejection(mo)?;
        if self.last_guid != mo.guid {
            warn!("({},{},{}) {}!", mo.id, mo.guid, mo.name, reason);
            self.last_guid = mo.guid;
        }
        Some(reason)
    }

    fn rejection(&self, mo: &MouseOverContext) -> Option<BlacklistReason> {
        let config = &self.config;

        if !config.target_mask.contains(&mo.classification) {
            return Some(BlacklistReason::Classification);
        }
        if !config.allow_pvp && (mo.is_player || mo.player_controlled) {
            return Some(BlacklistReason::Player);
        }
        if !mo.dead && mo.tagged {
            return Some(BlacklistReason::Tagged);
        }
        if mo.hostile && mo.level > mo.player_level + config.levels_above {
            return Some(BlacklistReason::LevelTooHigh);
        }
        if config.check_target_gives_exp {
            if mo.trivial {
                return Some(BlacklistReason::NoExperience);
            }
        } else if mo.hostile && mo.level < mo.player_level - config.levels_below {
            return Some(BlacklistReason::LevelTooLow);
        }

        if !self.names.is_empty() {
            let name = mo.name.to_lowercase();
            if self.names.iter().any(|n| name.contains(n.as_str())) {
                return Some(BlacklistReason::NameMatch);
            }
        }
        None
    }
}

impl Blacklist for MouseOverBlacklist {
    fn is_blacklisted(&mut self, mouse_over: &MouseOverContext) -> bool {
        self.check(mouse_over).is_some()
    }
}
