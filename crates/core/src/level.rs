//! Experience points to level mapping.
//!
//! Levels are linear: every 100 XP is one level, starting at level 1 with 0 XP.

use serde::Serialize;

/// XP span of every level.
pub const XP_PER_LEVEL: u64 = 100;

/// Level reached with `xp` accumulated experience points.
#[must_use]
pub fn level_for_xp(xp: u64) -> u32 {
    let level = xp / XP_PER_LEVEL + 1;
    u32::try_from(level).unwrap_or(u32::MAX)
}

/// Minimum XP required to be at `level`. Level 0 is treated as level 1.
#[must_use]
pub fn xp_floor_for_level(level: u32) -> u64 {
    u64::from(level.saturating_sub(1)) * XP_PER_LEVEL
}

/// Display values derived from a total XP amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelProgress {
    pub level: u32,
    pub total_xp: u64,
    pub xp_into_level: u64,
    pub xp_for_next_level: u64,
    /// Fraction of the current level completed, in `[0, 1]`.
    pub fraction: f64,
}

impl LevelProgress {
    #[must_use]
    pub fn from_total_xp(total_xp: u64) -> Self {
        let level = level_for_xp(total_xp);
        let floor = xp_floor_for_level(level);
        let next = xp_floor_for_level(level.saturating_add(1));
        let xp_into_level = total_xp.saturating_sub(floor);
        let xp_for_next_level = next.saturating_sub(floor);

        #[allow(clippy::cast_precision_loss)]
        let fraction = if xp_for_next_level == 0 {
            1.0
        } else {
            (xp_into_level as f64 / xp_for_next_level as f64).clamp(0.0, 1.0)
        };

        Self {
            level,
            total_xp,
            xp_into_level,
            xp_for_next_level,
            fraction,
        }
    }

    /// Whole-number percentage for progress bars.
    #[must_use]
    pub fn percent(&self) -> u8 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pct = (self.fraction * 100.0).round() as u8;
        pct.min(100)
    }
}
