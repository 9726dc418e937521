//! Study session orchestration.
//!
//! [`SessionOrchestrator`] owns the user's [`ProgressionEngine`], an
//! in-memory snapshot of the user's courses and at most one open session.
//! Each user action (flip, rate, select, submit, next) runs its state
//! transition in memory, feeds the outcome to the scheduler and the engine,
//! then dispatches the resulting writes to the [`PersistenceSink`]: card and
//! material fields first, then one folded profile patch.
//!
//! Material writes land in the snapshot before they are dispatched, and
//! sessions are always opened from the snapshot. A later session therefore
//! starts from the schedules of an earlier one even while a background sink
//! is still catching up.

mod flashcard;
mod quiz;

use std::sync::Arc;

use medora_srs::Rating;
use medora_store::{
    MaterialPatch, MaterialStore, StoreError,
    models::{Course, Flashcard, LectureMaterial, QuestType, QuizResult},
};
use serde::Serialize;

use crate::{
    clock::Clock,
    config::ProgressionConfig,
    error::SessionError,
    persistence::PersistenceSink,
    progression::{Badge, BadgeStats, ProgressionEngine},
};

pub use flashcard::{CardRated, CardSide, FlashcardSession};
pub use quiz::{AnswerFeedback, QuizSession};

#[derive(Debug)]
enum ActiveSession {
    Flashcards(FlashcardSession),
    Quiz(QuizSession),
}

/// Payload emitted when the last card of a deck is rated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSummary {
    pub minutes: f64,
    pub cards_reviewed: u32,
    /// Badges unlocked by finishing the deck
    pub new_badges: Vec<Badge>,
}

/// Effects of rating one card.
#[derive(Debug, Clone, PartialEq)]
pub struct RateOutcome {
    /// The rated card with its new schedule
    pub card: Flashcard,
    /// The streak was extended by this rating
    pub streak_extended: bool,
    pub xp_awarded: u64,
    /// Set when this was the last card
    pub completion: Option<FlashcardSummary>,
}

/// Effects of submitting one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub feedback: AnswerFeedback,
    pub streak_extended: bool,
    pub xp_awarded: u64,
}

/// Payload emitted when the last quiz question is passed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub score: u32,
    pub total: u32,
    pub minutes: f64,
    pub new_badges: Vec<Badge>,
}

/// Drives flashcard and quiz sessions for one user and persists their effects.
pub struct SessionOrchestrator<S> {
    engine: ProgressionEngine,
    sink: S,
    clock: Arc<dyn Clock>,
    config: ProgressionConfig,
    courses: Vec<Course>,
    active: Option<ActiveSession>,
}

impl<S> std::fmt::Debug for SessionOrchestrator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOrchestrator")
            .field("engine", &self.engine)
            .field("courses", &self.courses.len())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

fn find_material_mut<'a>(
    courses: &'a mut [Course],
    course_id: &str,
    material_id: &str,
) -> Option<&'a mut LectureMaterial> {
    courses
        .iter_mut()
        .find(|c| c.id == course_id)?
        .material_mut(material_id)
}

/// Apply a material change to the snapshot, then dispatch it.
fn commit_material<S: PersistenceSink>(
    courses: &mut [Course],
    sink: &S,
    course_id: &str,
    material_id: &str,
    patch: MaterialPatch,
) {
    if let Some(material) = find_material_mut(courses, course_id, material_id) {
        patch.apply(material);
    }
    sink.update_material(course_id, material_id, patch);
}

impl<S: PersistenceSink> SessionOrchestrator<S> {
    /// Load the course snapshot from `materials` and open the orchestrator.
    ///
    /// Uses the engine's clock for session timing.
    pub fn new<M: MaterialStore + ?Sized>(
        mut engine: ProgressionEngine,
        materials: &M,
        sink: S,
        config: ProgressionConfig,
    ) -> Result<Self, StoreError> {
        let courses = materials.list_courses()?;
        // Rollover changes made while loading go out before anything else
        engine.flush(&sink);
        let clock = Arc::clone(engine.clock());
        Ok(Self {
            engine,
            sink,
            clock,
            config,
            courses,
            active: None,
        })
    }

    pub const fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    pub const fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// Courses as of the latest write made through this orchestrator.
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn material(&self, course_id: &str, material_id: &str) -> Option<&LectureMaterial> {
        self.courses
            .iter()
            .find(|c| c.id == course_id)?
            .material(material_id)
    }

    pub(crate) fn has_course(&self, course_id: &str) -> bool {
        self.courses.iter().any(|c| c.id == course_id)
    }

    /// Prepend a material to a course, in the snapshot and in the store.
    pub(crate) fn insert_material(&mut self, course_id: &str, material: LectureMaterial) {
        if let Some(course) = self.courses.iter_mut().find(|c| c.id == course_id) {
            course.materials.insert(0, material.clone());
        }
        self.sink.insert_material(course_id, material);
    }

    pub(crate) fn update_material(
        &mut self,
        course_id: &str,
        material_id: &str,
        patch: MaterialPatch,
    ) {
        commit_material(&mut self.courses, &self.sink, course_id, material_id, patch);
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Run engine operations outside a session, then flush once.
    pub fn with_engine<R>(&mut self, f: impl FnOnce(&mut ProgressionEngine) -> R) -> R {
        let result = f(&mut self.engine);
        self.engine.flush(&self.sink);
        result
    }

    pub(crate) fn flush(&mut self) {
        self.engine.flush(&self.sink);
    }

    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn flashcard_session(&self) -> Option<&FlashcardSession> {
        match &self.active {
            Some(ActiveSession::Flashcards(session)) => Some(session),
            _ => None,
        }
    }

    pub fn quiz_session(&self) -> Option<&QuizSession> {
        match &self.active {
            Some(ActiveSession::Quiz(session)) => Some(session),
            _ => None,
        }
    }

    fn lookup(&self, course_id: &str, material_id: &str) -> Result<&LectureMaterial, SessionError> {
        self.material(course_id, material_id)
            .ok_or_else(|| SessionError::MaterialNotFound {
                course_id: course_id.to_string(),
                material_id: material_id.to_string(),
            })
    }

    /// Open a deck review. Returns the number of cards.
    pub fn start_flashcards(
        &mut self,
        course_id: &str,
        material_id: &str,
    ) -> Result<usize, SessionError> {
        if self.active.is_some() {
            return Err(SessionError::AlreadyOpen);
        }
        let material = self.lookup(course_id, material_id)?;
        let session = FlashcardSession::new(course_id, material, self.clock.now_utc())?;
        tracing::info!(
            %course_id,
            %material_id,
            cards = session.len(),
            "Flashcard session started"
        );

        let cards = session.len();
        self.active = Some(ActiveSession::Flashcards(session));
        Ok(cards)
    }

    /// Open a quiz. Returns the number of questions.
    pub fn start_quiz(
        &mut self,
        course_id: &str,
        material_id: &str,
    ) -> Result<usize, SessionError> {
        if self.active.is_some() {
            return Err(SessionError::AlreadyOpen);
        }
        let material = self.lookup(course_id, material_id)?;
        let session = QuizSession::new(course_id, material, self.clock.now_utc())?;
        tracing::info!(
            %course_id,
            %material_id,
            questions = session.len(),
            "Quiz session started"
        );

        let questions = session.len();
        self.active = Some(ActiveSession::Quiz(session));
        Ok(questions)
    }

    /// Close the open session. Ratings and answers already committed stay persisted.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(ActiveSession::Flashcards(session)) => {
                tracing::info!(
                    material_id = %session.material_id(),
                    rated = session.index(),
                    "Flashcard session cancelled"
                );
                true
            }
            Some(ActiveSession::Quiz(session)) => {
                tracing::info!(
                    material_id = %session.material_id(),
                    answered = session.index(),
                    "Quiz session cancelled"
                );
                true
            }
            None => false,
        }
    }

    /// Turn the current card over. Returns the side now showing.
    pub fn flip(&mut self) -> Result<CardSide, SessionError> {
        match &mut self.active {
            Some(ActiveSession::Flashcards(session)) => session.flip(),
            _ => Err(SessionError::NoFlashcardSession),
        }
    }

    /// Rate the current card, persist the deck and move on.
    ///
    /// The first rating of a session credits the streak. Rating the last
    /// card closes the session and reports its completion.
    pub fn rate(&mut self, rating: Rating) -> Result<RateOutcome, SessionError> {
        let Some(ActiveSession::Flashcards(session)) = &mut self.active else {
            return Err(SessionError::NoFlashcardSession);
        };

        let now = self.clock.now_utc();
        let rated = session.rate(rating, now)?;
        tracing::debug!(card_id = %rated.card.id, %rating, interval = rated.card.review.interval, "Card rated");

        let streak_extended = rated.first_rating && self.engine.record_study_activity();
        let xp_awarded = self.config.xp_per_card;
        self.engine.add_xp(xp_awarded);

        commit_material(
            &mut self.courses,
            &self.sink,
            session.course_id(),
            session.material_id(),
            MaterialPatch::flashcards(session.cards().to_vec()),
        );

        let completion = if rated.finished {
            let cards_reviewed = u32::try_from(session.len()).unwrap_or(u32::MAX);
            let minutes = session.elapsed_minutes(now);
            commit_material(
                &mut self.courses,
                &self.sink,
                session.course_id(),
                session.material_id(),
                MaterialPatch::study_minutes(session.prior_study_minutes() + minutes),
            );
            tracing::info!(
                material_id = %session.material_id(),
                cards_reviewed,
                minutes,
                "Flashcard session complete"
            );

            self.engine
                .update_quest_progress(QuestType::ReviewCards, cards_reviewed);
            let new_badges = self.engine.check_badges(&BadgeStats::cards(cards_reviewed));
            self.active = None;

            Some(FlashcardSummary {
                minutes,
                cards_reviewed,
                new_badges,
            })
        } else {
            None
        };

        self.engine.flush(&self.sink);
        Ok(RateOutcome {
            card: rated.card,
            streak_extended,
            xp_awarded,
            completion,
        })
    }

    /// Choose an option for the current question without committing it.
    pub fn select(&mut self, option: usize) -> Result<(), SessionError> {
        match &mut self.active {
            Some(ActiveSession::Quiz(session)) => session.select(option),
            _ => Err(SessionError::NoQuizSession),
        }
    }

    /// Commit the selected option and reveal the answer.
    pub fn submit(&mut self) -> Result<SubmitOutcome, SessionError> {
        let Some(ActiveSession::Quiz(session)) = &mut self.active else {
            return Err(SessionError::NoQuizSession);
        };

        let feedback = session.submit()?;
        let streak_extended = feedback.first_answer && self.engine.record_study_activity();
        let xp_awarded = if feedback.correct {
            self.config.xp_per_correct_answer
        } else {
            0
        };
        self.engine.add_xp(xp_awarded);

        self.engine.flush(&self.sink);
        Ok(SubmitOutcome {
            feedback,
            streak_extended,
            xp_awarded,
        })
    }

    /// Move past the submitted question. Returns the summary once the quiz ends.
    pub fn next(&mut self) -> Result<Option<QuizSummary>, SessionError> {
        let Some(ActiveSession::Quiz(session)) = &mut self.active else {
            return Err(SessionError::NoQuizSession);
        };

        if !session.next()? {
            return Ok(None);
        }

        let now = self.clock.now_utc();
        let score = session.score();
        let total = u32::try_from(session.len()).unwrap_or(u32::MAX);
        let minutes = session.elapsed_minutes(now);

        let result = QuizResult {
            date: now,
            score,
            total,
        };
        if let Some(material) =
            find_material_mut(&mut self.courses, session.course_id(), session.material_id())
        {
            material.quiz_history.push(result.clone());
        }
        self.sink
            .append_quiz_result(session.course_id(), session.material_id(), result);
        commit_material(
            &mut self.courses,
            &self.sink,
            session.course_id(),
            session.material_id(),
            MaterialPatch::study_minutes(session.prior_study_minutes() + minutes),
        );
        tracing::info!(
            material_id = %session.material_id(),
            score,
            total,
            minutes,
            "Quiz session complete"
        );
        self.active = None;

        if self.config.is_ace(score, total) {
            self.engine.update_quest_progress(QuestType::AceQuiz, 1);
        }
        let new_badges = self.engine.check_badges(&BadgeStats::quiz(score, total));
        self.engine.flush(&self.sink);

        Ok(Some(QuizSummary {
            score,
            total,
            minutes,
            new_badges,
        }))
    }
}
