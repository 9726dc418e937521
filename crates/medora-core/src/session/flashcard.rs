//! Flashcard review session over one material's deck.

use chrono::{DateTime, Utc};
use medora_srs::{Rating, schedule};
use medora_store::models::{Flashcard, LectureMaterial};

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSide {
    Front,
    Back,
}

/// Result of rating the current card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardRated {
    /// The card with its new schedule
    pub card: Flashcard,
    /// First rating of the session
    pub first_rating: bool,
    /// The rated card was the last one
    pub finished: bool,
}

/// Walks a deck in stored order, front then back, each card rated once.
#[derive(Debug, Clone)]
pub struct FlashcardSession {
    course_id: String,
    material_id: String,
    cards: Vec<Flashcard>,
    index: usize,
    side: CardSide,
    started_at: DateTime<Utc>,
    prior_study_minutes: f64,
    rated_any: bool,
    complete: bool,
}

impl FlashcardSession {
    pub fn new(
        course_id: &str,
        material: &LectureMaterial,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if material.flashcards.is_empty() {
            return Err(SessionError::NoFlashcards(material.id.clone()));
        }

        Ok(Self {
            course_id: course_id.to_string(),
            material_id: material.id.clone(),
            cards: material.flashcards.clone(),
            index: 0,
            side: CardSide::Front,
            started_at: now,
            prior_study_minutes: material.study_minutes,
            rated_any: false,
            complete: false,
        })
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub fn material_id(&self) -> &str {
        &self.material_id
    }

    pub fn current(&self) -> &Flashcard {
        &self.cards[self.index]
    }

    pub const fn side(&self) -> CardSide {
        self.side
    }

    /// Zero-based position of the current card.
    pub const fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// The whole deck, including every schedule committed so far.
    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    /// Study minutes the material had before this session started.
    pub const fn prior_study_minutes(&self) -> f64 {
        self.prior_study_minutes
    }

    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> f64 {
        (now - self.started_at).num_milliseconds() as f64 / 60_000.0
    }

    pub fn flip(&mut self) -> Result<CardSide, SessionError> {
        if self.complete {
            return Err(SessionError::Completed);
        }
        self.side = match self.side {
            CardSide::Front => CardSide::Back,
            CardSide::Back => CardSide::Front,
        };
        Ok(self.side)
    }

    /// Reschedule the current card and move on. Only valid with the back showing.
    pub fn rate(&mut self, rating: Rating, now: DateTime<Utc>) -> Result<CardRated, SessionError> {
        if self.complete {
            return Err(SessionError::Completed);
        }
        if self.side != CardSide::Back {
            return Err(SessionError::NotFlipped);
        }

        let card = &mut self.cards[self.index];
        card.review = schedule(&card.review, rating, now);
        let card = card.clone();

        let first_rating = !self.rated_any;
        self.rated_any = true;

        let finished = self.index + 1 == self.cards.len();
        if finished {
            self.complete = true;
        } else {
            self.index += 1;
            self.side = CardSide::Front;
        }

        Ok(CardRated {
            card,
            first_rating,
            finished,
        })
    }
}
