use serde::Deserialize;

use super::npc_names::NpcNames;
use crate::config::NpcFinderConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Per channel threshold tests.
    #[default]
    Simple,
    /// Distance to a reference color, within `color_fuzziness`.
    Fuzzy,
}

/// Distance used by the fuzzy search.
///
/// `Legacy` multiplies the green delta by `(reference red - sample green)`, which is
/// what the name finder has always shipped with. The cross term can go negative, in
/// which case the square root is NaN and the pixel never matches. `Euclidean` is the
/// plain RGB distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuzzyMetric {
    #[default]
    Legacy,
    Euclidean,
}

/// Color rules of the name plates. Immutable once a matcher is built.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ColorThresholds {
    pub enemy_r_min: u8,
    pub enemy_g_max: u8,
    pub enemy_b_max: u8,
    pub friendly_g_min: u8,
    pub neutral_rg_min: u8,
    pub corpse_gray: u8,
    pub fuzzy_enemy: [u8; 3],
    pub fuzzy_friendly: [u8; 3],
    pub fuzzy_neutral: [u8; 3],
    pub fuzzy_corpse: [u8; 3],
}

impl Default for ColorThresholds {
    fn default() -> Self {
        Self {
            enemy_r_min: 240,
            enemy_g_max: 35,
            enemy_b_max: 35,
            friendly_g_min: 250,
            neutral_rg_min: 250,
            corpse_gray: 128,
            fuzzy_enemy: [250, 5, 5],
            fuzzy_friendly: [5, 250, 5],
            fuzzy_neutral: [250, 250, 5],
            fuzzy_corpse: [128, 128, 128],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Predicate {
    NoMatch,
    Enemy,
    Friendly,
    Neutral,
    Corpse,
    EnemyOrNeutral,
    FriendlyOrNeutral,
}

impl Predicate {
    fn from_names(names: NpcNames) -> Option<Predicate> {
        let enemy_or_neutral = NpcNames::ENEMY | NpcNames::NEUTRAL;
        let friendly_or_neutral = NpcNames::FRIENDLY | NpcNames::NEUTRAL;
        match names {
            n if n == NpcNames::NONE => Some(Predicate::NoMatch),
            n if n == NpcNames::ENEMY => Some(Predicate::Enemy),
            n if n == NpcNames::FRIENDLY => Some(Predicate::Friendly),
            n if n == NpcNames::NEUTRAL => Some(Predicate::Neutral),
            n if n == NpcNames::CORPSE => Some(Predicate::Corpse),
            n if n == enemy_or_neutral => Some(Predicate::EnemyOrNeutral),
            n if n == friendly_or_neutral => Some(Predicate::FriendlyOrNeutral),
            _ => None,
        }
    }
}

/// Per pixel "is this name-plate colored" test.
///
/// A matcher is a small `Copy` value; switching the searched names builds a new one
/// instead of mutating shared state.
#[derive(Debug, Clone, Copy)]
pub struct ColorMatcher {
    predicate: Predicate,
    mode: SearchMode,
    metric: FuzzyMetric,
    fuzziness: f32,
    colors: ColorThresholds,
}

impl ColorMatcher {
    pub fn new(
        names: NpcNames,
        mode: SearchMode,
        metric: FuzzyMetric,
        fuzziness: f32,
        colors: ColorThresholds,
    ) -> Self {
        let predicate = Predicate::from_names(names).unwrap_or_else(|| {
            tracing::warn!("Unsupported name combination {}, nothing will match", names);
            Predicate::NoMatch
        });

        Self {
            predicate,
            mode,
            metric,
            fuzziness,
            colors,
        }
    }

    pub fn from_config(names: NpcNames, config: &NpcFinderConfig) -> Self {
        Self::new(
            names,
            config.search_mode,
            config.fuzzy_metric,
            config.color_fuzziness,
            config.colors,
        )
    }

    /// `false` for every pixel, regardless of its color.
    pub fn is_no_match(&self) -> bool {
        self.predicate == Predicate::NoMatch
    }

    #[inline]
    pub fn matches(&self, r: u8, g: u8, b: u8) -> bool {
        match self.mode {
            SearchMode::Simple => self.simple(r, g, b),
            SearchMode::Fuzzy => self.fuzzy(r, g, b),
        }
    }

    #[inline]
    fn simple(&self, r: u8, g: u8, b: u8) -> bool {
        match self.predicate {
            Predicate::NoMatch => false,
            Predicate::Enemy => self.simple_enemy(r, g, b),
            Predicate::Friendly => self.simple_friendly(r, g, b),
            Predicate::Neutral => self.simple_neutral(r, g, b),
            Predicate::Corpse => self.simple_corpse(r, g, b),
            Predicate::EnemyOrNeutral => {
                self.simple_enemy(r, g, b) || self.simple_neutral(r, g, b)
            }
            Predicate::FriendlyOrNeutral => {
                self.simple_friendly(r, g, b) || self.simple_neutral(r, g, b)
            }
        }
    }

    #[inline]
    fn simple_enemy(&self, r: u8, g: u8, b: u8) -> bool {
        r > self.colors.enemy_r_min && g <= self.colors.enemy_g_max && b <= self.colors.enemy_b_max
    }

    #[inline]
    fn simple_friendly(&self, r: u8, g: u8, b: u8) -> bool {
        r == 0 && g > self.colors.friendly_g_min && b == 0
    }

    #[inline]
    fn simple_neutral(&self, r: u8, g: u8, b: u8) -> bool {
        r > self.colors.neutral_rg_min && g > self.colors.neutral_rg_min && b == 0
    }

    #[inline]
    fn simple_corpse(&self, r: u8, g: u8, b: u8) -> bool {
        let gray = self.colors.corpse_gray;
        r == gray && g == gray && b == gray
    }

    fn fuzzy(&self, r: u8, g: u8, b: u8) -> bool {
        let near = |reference: [u8; 3]| self.fuzzy_distance(reference, r, g, b) <= self.fuzziness;
        match self.predicate {
            Predicate::NoMatch => false,
            Predicate::Enemy => near(self.colors.fuzzy_enemy),
            Predicate::Friendly => near(self.colors.fuzzy_friendly),
            Predicate::Neutral => near(self.colors.fuzzy_neutral),
            Predicate::Corpse => near(self.colors.fuzzy_corpse),
            Predicate::EnemyOrNeutral => {
                near(self.colors.fuzzy_enemy) || near(self.colors.fuzzy_neutral)
            }
            Predicate::FriendlyOrNeutral => {
                near(self.colors.fuzzy_friendly) || near(self.colors.fuzzy_neutral)
            }
        }
    }

    fn fuzzy_distance(&self, reference: [u8; 3], r: u8, g: u8, b: u8) -> f32 {
        let [rr, gg, bb] = reference.map(f32::from);
        let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
        let dr = rr - r;
        let dg = gg - g;
        let db = bb - b;
        match self.metric {
            FuzzyMetric::Legacy => (dr * dr + dg * (rr - g) + db * db).sqrt(),
            FuzzyMetric::Euclidean => (dr * dr + dg * dg + db * db).sqrt(),
        }
    }
}
