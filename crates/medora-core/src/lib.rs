//! Medora study core.
//!
//! Spaced-repetition sessions, streaks, XP, badges and daily quests for one
//! user, driven by discrete user actions against an injectable [`Clock`].
//! Persistence is fire-and-forget through a [`PersistenceSink`].

pub mod analytics;
pub mod clock;
pub mod config;
pub mod error;
pub mod ingest;
pub mod persistence;
pub mod progression;
pub mod session;
pub mod tracing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Environment, ProgressionConfig};
pub use error::{IngestError, SessionError};
pub use ingest::{ContentGenerator, StudyPack};
pub use persistence::{BackgroundSink, DirectSink, PersistenceSink};
pub use progression::{Badge, BadgeStats, LevelInfo, ProgressionEngine};
pub use session::{
    FlashcardSummary, QuizSummary, RateOutcome, SessionOrchestrator, SubmitOutcome,
};

pub use medora_srs::Rating;
