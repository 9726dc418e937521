use serde::Serialize;

/// Where a user's XP sits within their level band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelInfo {
    pub level: u8,
    pub title: &'static str,
    /// Inclusive lower XP bound of the band
    pub min: u64,
    /// Upper XP bound of the band
    pub max: u64,
    pub current: u64,
    /// Percent of the band completed, 0-100
    pub progress: f64,
}

struct LevelBand {
    level: u8,
    title: &'static str,
    min: u64,
    max: u64,
}

const LEVEL_BANDS: [LevelBand; 4] = [
    LevelBand {
        level: 1,
        title: "Novice",
        min: 0,
        max: 500,
    },
    LevelBand {
        level: 2,
        title: "Apprentice",
        min: 500,
        max: 1500,
    },
    LevelBand {
        level: 3,
        title: "Scholar",
        min: 1500,
        max: 3000,
    },
    LevelBand {
        level: 4,
        title: "Master",
        min: 3000,
        max: 10000,
    },
];

/// Map an XP total onto its level band.
///
/// The top band is open-ended: XP past its upper bound stays at level 4 with
/// progress clamped to 100%.
pub fn level_info(xp: u64) -> LevelInfo {
    let band = LEVEL_BANDS
        .iter()
        .find(|band| xp < band.max)
        .unwrap_or(&LEVEL_BANDS[LEVEL_BANDS.len() - 1]);

    let span = (band.max - band.min) as f64;
    let progress = ((xp - band.min) as f64 / span * 100.0).min(100.0);

    LevelInfo {
        level: band.level,
        title: band.title,
        min: band.min,
        max: band.max,
        current: xp,
        progress,
    }
}
