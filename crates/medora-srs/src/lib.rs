//! SRS (Spaced Repetition System) library for Medora
//!
//! This crate provides the review scheduler used by flashcard study sessions:
//! a simplified SM-2 variant driven by four rating buttons
//! (again / hard / good / easy).
//!
//! Everything here is pure. The caller supplies `now`, so the scheduler is
//! deterministic under test.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Ease factor of a card that has never been rated.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Ease factor never goes below this value.
pub const MIN_EASE_FACTOR: f64 = 1.3;

const HARD_EASE_PENALTY: f64 = 0.2;
const EASY_EASE_BONUS: f64 = 0.15;

/// Interval (days) after a lapse or the first successful recall.
const FIRST_INTERVAL_DAYS: u32 = 1;
/// Interval (days) after the second consecutive successful recall.
const SECOND_INTERVAL_DAYS: u32 = 6;

/// Longest interval the scheduler hands out (about a century).
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Rejected rating input. Ratings must be validated before scheduling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    /// Not one of `again`, `hard`, `good`, `easy`
    #[error("unknown rating: {0:?}")]
    UnknownName(String),
    /// Button index outside 1-4
    #[error("rating button out of range: {0} (expected 1-4)")]
    ButtonOutOfRange(u8),
}

/// Self-assessed recall quality for a single review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// Forgotten; the card starts over
    Again,
    /// Recalled with effort
    Hard,
    /// Recalled correctly
    Good,
    /// Recalled instantly
    Easy,
}

impl Rating {
    /// All ratings in button order.
    pub const ALL: [Self; 4] = [Self::Again, Self::Hard, Self::Good, Self::Easy];

    /// Map a UI button (1-4: Again, Hard, Good, Easy) to a rating.
    pub const fn from_button(button: u8) -> Result<Self, RatingError> {
        match button {
            1 => Ok(Self::Again),
            2 => Ok(Self::Hard),
            3 => Ok(Self::Good),
            4 => Ok(Self::Easy),
            other => Err(RatingError::ButtonOutOfRange(other)),
        }
    }

    /// Lowercase name, as stored and parsed.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Again => "again",
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Easy => "easy",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = RatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "again" => Ok(Self::Again),
            "hard" => Ok(Self::Hard),
            "good" => Ok(Self::Good),
            "easy" => Ok(Self::Easy),
            _ => Err(RatingError::UnknownName(s.to_string())),
        }
    }
}

/// Learning stage of a card, derived from its last rating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Never rated
    #[default]
    New,
    /// Last rated "again"
    Learning,
    /// Last rated "hard" or "good"
    Review,
    /// Last rated "easy"
    Mastered,
}

/// Scheduling state carried by every flashcard.
///
/// Fields missing from stored data fall back to the values of a brand-new
/// card, so legacy cards can be scheduled without a separate backfill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    /// Stage derived from the last rating
    #[serde(default)]
    pub difficulty: Difficulty,
    /// When the card is next due
    #[serde(
        default = "unix_epoch",
        deserialize_with = "deserialize_review_date"
    )]
    pub next_review: DateTime<Utc>,
    /// Days between the last review and `next_review`
    #[serde(default)]
    pub interval: u32,
    /// Interval multiplier, never below [`MIN_EASE_FACTOR`]
    #[serde(default = "default_ease_factor")]
    pub ease_factor: f64,
    /// Consecutive ratings other than "again"
    #[serde(default)]
    pub repetitions: u32,
}

const fn default_ease_factor() -> f64 {
    DEFAULT_EASE_FACTOR
}

const fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Accepts RFC 3339 timestamps as well as bare `YYYY-MM-DD` dates (midnight UTC).
fn deserialize_review_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
        .map_err(serde::de::Error::custom)
}

impl ReviewState {
    /// State of a freshly created card, due immediately.
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            difficulty: Difficulty::New,
            next_review: now,
            interval: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            repetitions: 0,
        }
    }
}

/// Apply the ease delta for a rating, respecting the floor.
pub fn adjust_ease(ease_factor: f64, rating: Rating) -> f64 {
    let adjusted = match rating {
        Rating::Hard => ease_factor - HARD_EASE_PENALTY,
        Rating::Easy => ease_factor + EASY_EASE_BONUS,
        Rating::Again | Rating::Good => ease_factor,
    };
    adjusted.max(MIN_EASE_FACTOR)
}

/// Compute the next scheduling state for one card.
///
/// # Algorithm
///
/// * `again`: repetitions reset to 0, interval 1 day, stage `learning`
/// * otherwise the interval grows 1 day → 6 days → `ceil(interval * ease)`
///   and repetitions increase by one
/// * `hard` lowers ease by 0.2 (floored at 1.3), `easy` raises it by 0.15;
///   the adjusted ease is the one used for the interval multiplication
/// * `easy` marks the card `mastered`, `hard`/`good` mark it `review`
///
/// Intervals are capped at [`MAX_INTERVAL_DAYS`]. `next_review` is `now`
/// plus whole days, keeping the time of day of `now`.
pub fn schedule(state: &ReviewState, rating: Rating, now: DateTime<Utc>) -> ReviewState {
    let ease_factor = adjust_ease(state.ease_factor, rating);

    let (interval, repetitions) = match rating {
        Rating::Again => (FIRST_INTERVAL_DAYS, 0),
        Rating::Hard | Rating::Good | Rating::Easy => {
            let interval = match state.repetitions {
                0 => FIRST_INTERVAL_DAYS,
                1 => SECOND_INTERVAL_DAYS,
                // Legacy cards may carry interval 0 with repetitions >= 2
                _ => ((f64::from(state.interval) * ease_factor).ceil() as u32)
                    .clamp(1, MAX_INTERVAL_DAYS),
            };
            (interval, state.repetitions.saturating_add(1))
        }
    };

    let difficulty = match rating {
        Rating::Again => Difficulty::Learning,
        Rating::Hard | Rating::Good => Difficulty::Review,
        Rating::Easy => Difficulty::Mastered,
    };

    ReviewState {
        difficulty,
        next_review: now
            .checked_add_signed(Duration::days(i64::from(interval)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
        interval,
        ease_factor,
        repetitions,
    }
}

/// Intervals (days) each rating would produce, in button order.
///
/// Used to label the rating buttons before the user picks one.
pub fn preview_intervals(state: &ReviewState) -> [u32; 4] {
    Rating::ALL.map(|rating| schedule(state, rating, state.next_review).interval)
}

/// Whether the card should be shown in a review session at `now`.
pub fn is_due(state: &ReviewState, now: DateTime<Utc>) -> bool {
    state.next_review <= now
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 14, 30, 0).unwrap()
    }

    fn card(interval: u32, ease_factor: f64, repetitions: u32) -> ReviewState {
        ReviewState {
            difficulty: Difficulty::Review,
            next_review: fixed_now(),
            interval,
            ease_factor,
            repetitions,
        }
    }

    #[test]
    fn test_again_resets_progress() {
        let next = schedule(&card(15, 2.5, 4), Rating::Again, fixed_now());
        assert_eq!(next.repetitions, 0);
        assert_eq!(next.interval, 1);
        assert_eq!(next.difficulty, Difficulty::Learning);
        // Ease is untouched by "again"
        assert!((next.ease_factor - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_good_progression() {
        let now = fixed_now();
        let first = schedule(&ReviewState::new(now), Rating::Good, now);
        assert_eq!(first.interval, 1);
        assert_eq!(first.repetitions, 1);

        let second = schedule(&first, Rating::Good, now);
        assert_eq!(second.interval, 6);
        assert_eq!(second.repetitions, 2);

        let third = schedule(&second, Rating::Good, now);
        assert_eq!(third.interval, 15); // ceil(6 * 2.5)
        assert_eq!(third.repetitions, 3);
        assert_eq!(third.difficulty, Difficulty::Review);
    }

    #[test]
    fn test_good_good_easy_scenario() {
        let now = fixed_now();
        let mut state = ReviewState::new(now);
        let mut intervals = Vec::new();
        for rating in [Rating::Good, Rating::Good, Rating::Easy] {
            state = schedule(&state, rating, now);
            intervals.push(state.interval);
        }

        assert_eq!(intervals, vec![1, 6, 16]); // ceil(6 * 2.65)
        assert_eq!(state.repetitions, 3);
        assert!((state.ease_factor - 2.65).abs() < 1e-9);
        assert_eq!(state.difficulty, Difficulty::Mastered);
    }

    #[test]
    fn test_easy_on_new_card_bumps_ease() {
        let now = fixed_now();
        let next = schedule(&ReviewState::new(now), Rating::Easy, now);
        assert_eq!(next.interval, 1);
        assert!((next.ease_factor - 2.65).abs() < 1e-9);
        assert_eq!(next.difficulty, Difficulty::Mastered);
    }

    #[test]
    fn test_ease_floor() {
        for rating in Rating::ALL {
            let next = schedule(&card(10, 1.3, 3), rating, fixed_now());
            assert!(next.ease_factor >= MIN_EASE_FACTOR, "{rating} broke the floor");
        }

        // A legacy ease below the floor is lifted back up
        let next = schedule(&card(10, 1.0, 3), Rating::Good, fixed_now());
        assert!((next.ease_factor - MIN_EASE_FACTOR).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hard_lowers_ease() {
        let next = schedule(&card(6, 2.5, 2), Rating::Hard, fixed_now());
        assert!((next.ease_factor - 2.3).abs() < 1e-9);
        assert_eq!(next.interval, 14); // ceil(6 * 2.3)
        assert_eq!(next.difficulty, Difficulty::Review);
    }

    #[test]
    fn test_next_review_keeps_time_of_day() {
        let now = fixed_now();
        let next = schedule(&card(6, 2.5, 1), Rating::Good, now);
        assert_eq!(next.next_review, now + Duration::days(6));
        assert_eq!(next.next_review.time(), now.time());
    }

    #[test]
    fn test_interval_positive_for_legacy_zero_interval() {
        let next = schedule(&card(0, 2.5, 5), Rating::Good, fixed_now());
        assert!(next.interval >= 1);
    }

    #[test]
    fn test_interval_is_capped_under_repeated_easy() {
        let now = fixed_now();
        let mut state = ReviewState::new(now);
        for _ in 0..50 {
            state = schedule(&state, Rating::Easy, now);
            assert!(state.interval <= MAX_INTERVAL_DAYS);
        }

        assert_eq!(state.interval, MAX_INTERVAL_DAYS);
        assert_eq!(state.repetitions, 50);
        assert_eq!(
            state.next_review,
            now + Duration::days(i64::from(MAX_INTERVAL_DAYS))
        );
    }

    #[test]
    fn test_next_review_saturates_at_the_end_of_time() {
        let next = schedule(&card(30, 2.5, 3), Rating::Good, DateTime::<Utc>::MAX_UTC);
        assert_eq!(next.next_review, DateTime::<Utc>::MAX_UTC);
        assert_eq!(next.interval, 75);
    }

    #[test]
    fn test_preview_intervals() {
        assert_eq!(preview_intervals(&card(6, 2.5, 2)), [1, 14, 15, 16]);
        assert_eq!(preview_intervals(&ReviewState::new(fixed_now())), [1, 1, 1, 1]);
    }

    #[test]
    fn test_is_due() {
        let now = fixed_now();
        let state = ReviewState::new(now);
        assert!(is_due(&state, now));
        assert!(!is_due(&schedule(&state, Rating::Good, now), now));
    }

    #[test]
    fn test_rating_parsing() {
        assert_eq!("Easy".parse::<Rating>(), Ok(Rating::Easy));
        assert_eq!(" again ".parse::<Rating>(), Ok(Rating::Again));
        assert!("perfect".parse::<Rating>().is_err());
        assert_eq!(Rating::from_button(2), Ok(Rating::Hard));
        assert_eq!(
            Rating::from_button(5),
            Err(RatingError::ButtonOutOfRange(5))
        );
    }

    #[test]
    fn test_review_state_defaults_from_legacy_json() {
        let state: ReviewState =
            serde_json::from_str(r#"{"difficulty":"learning","nextReview":"2023-10-27"}"#)
                .unwrap();
        assert_eq!(state.difficulty, Difficulty::Learning);
        assert_eq!(state.interval, 0);
        assert_eq!(state.repetitions, 0);
        assert!((state.ease_factor - DEFAULT_EASE_FACTOR).abs() < f64::EPSILON);
        assert_eq!(
            state.next_review,
            Utc.with_ymd_and_hms(2023, 10, 27, 0, 0, 0).unwrap()
        );
    }
}
