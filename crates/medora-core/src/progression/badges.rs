//! Badge registry and unlock rules.

use serde::Serialize;

/// Cards studied in a single day needed for [`Badge::Crammer`].
pub const CRAMMER_DAILY_CARDS: u32 = 500;

/// A permanent achievement. Each badge is held at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    /// Any study activity
    FirstStep,
    /// Studying between 22:00 and 04:00 local time
    NightOwl,
    /// [`CRAMMER_DAILY_CARDS`] cards in one day
    Crammer,
    /// A perfect quiz
    QuizMaster,
}

impl Badge {
    /// Evaluation order of the unlock rules.
    pub const ALL: [Self; 4] = [Self::FirstStep, Self::NightOwl, Self::Crammer, Self::QuizMaster];

    /// Stable id stored in the profile.
    pub const fn id(self) -> &'static str {
        match self {
            Self::FirstStep => "first_step",
            Self::NightOwl => "night_owl",
            Self::Crammer => "crammer",
            Self::QuizMaster => "quiz_master",
        }
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstStep => "First Step",
            Self::NightOwl => "Night Owl",
            Self::Crammer => "Crammer",
            Self::QuizMaster => "Quiz Master",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::FirstStep => "Complete your first study activity",
            Self::NightOwl => "Study between 10 PM and 4 AM",
            Self::Crammer => "Review 500 cards in a single day",
            Self::QuizMaster => "Get a perfect score on a quiz",
        }
    }

    /// Inverse of [`Self::id`].
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|badge| badge.id() == id)
    }
}

/// Outcome of a study activity, as seen by the badge rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BadgeStats {
    /// Cards rated in a finished deck review
    pub cards_reviewed: Option<u32>,
    pub quiz_score: Option<u32>,
    pub quiz_total: Option<u32>,
}

impl BadgeStats {
    pub const fn cards(reviewed: u32) -> Self {
        Self {
            cards_reviewed: Some(reviewed),
            quiz_score: None,
            quiz_total: None,
        }
    }

    pub const fn quiz(score: u32, total: u32) -> Self {
        Self {
            cards_reviewed: None,
            quiz_score: Some(score),
            quiz_total: Some(total),
        }
    }
}

const fn is_night(hour: u32) -> bool {
    hour >= 22 || hour < 4
}

/// Badges earned by this activity that are not held yet, in rule order.
///
/// `cards_studied_today` already includes `stats.cards_reviewed`.
pub(crate) fn newly_unlocked(
    held: &[String],
    stats: &BadgeStats,
    cards_studied_today: u32,
    hour: u32,
) -> Vec<Badge> {
    Badge::ALL
        .into_iter()
        .filter(|badge| !held.iter().any(|id| id == badge.id()))
        .filter(|badge| match badge {
            Badge::FirstStep => true,
            Badge::NightOwl => is_night(hour),
            Badge::Crammer => cards_studied_today >= CRAMMER_DAILY_CARDS,
            Badge::QuizMaster => matches!(
                (stats.quiz_score, stats.quiz_total),
                (Some(score), Some(total)) if total > 0 && score == total
            ),
        })
        .collect()
}
