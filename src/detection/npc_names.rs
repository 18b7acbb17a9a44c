use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Which kinds of unit name plates the finder is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NpcNames(u8);

impl NpcNames {
    pub const NONE: NpcNames = NpcNames(0);
    pub const ENEMY: NpcNames = NpcNames(1);
    pub const FRIENDLY: NpcNames = NpcNames(2);
    pub const NEUTRAL: NpcNames = NpcNames(4);
    pub const CORPSE: NpcNames = NpcNames(8);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: NpcNames) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for NpcNames {
    type Output = NpcNames;

    fn bitor(self, rhs: NpcNames) -> NpcNames {
        NpcNames(self.0 | rhs.0)
    }
}

impl BitOrAssign for NpcNames {
    fn bitor_assign(&mut self, rhs: NpcNames) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for NpcNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let names = [
            (NpcNames::ENEMY, "Enemy"),
            (NpcNames::FRIENDLY, "Friendly"),
            (NpcNames::NEUTRAL, "Neutral"),
            (NpcNames::CORPSE, "Corpse"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}
