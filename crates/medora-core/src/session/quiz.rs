//! Multiple choice quiz session.

use chrono::{DateTime, Utc};
use medora_store::models::{LectureMaterial, Mcq};

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unanswered { pending: Option<usize> },
    Submitted { chosen: usize, correct: bool },
}

/// What the UI reveals once an answer is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub chosen: usize,
    pub correct_index: usize,
    pub correct: bool,
    pub explanation: String,
    /// First answer submitted in this session
    pub first_answer: bool,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    course_id: String,
    material_id: String,
    questions: Vec<Mcq>,
    index: usize,
    phase: Phase,
    score: u32,
    started_at: DateTime<Utc>,
    prior_study_minutes: f64,
    answered_any: bool,
    complete: bool,
}

impl QuizSession {
    pub fn new(
        course_id: &str,
        material: &LectureMaterial,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if material.mcqs.is_empty() {
            return Err(SessionError::NoQuestions(material.id.clone()));
        }

        Ok(Self {
            course_id: course_id.to_string(),
            material_id: material.id.clone(),
            questions: material.mcqs.clone(),
            index: 0,
            phase: Phase::Unanswered { pending: None },
            score: 0,
            started_at: now,
            prior_study_minutes: material.study_minutes,
            answered_any: false,
            complete: false,
        })
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub fn material_id(&self) -> &str {
        &self.material_id
    }

    pub fn current(&self) -> &Mcq {
        &self.questions[self.index]
    }

    pub const fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Correct answers so far.
    pub const fn score(&self) -> u32 {
        self.score
    }

    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// Option chosen but not yet submitted.
    pub const fn pending(&self) -> Option<usize> {
        match self.phase {
            Phase::Unanswered { pending } => pending,
            Phase::Submitted { .. } => None,
        }
    }

    /// Committed answer for the current question and whether it was right.
    pub const fn submitted(&self) -> Option<(usize, bool)> {
        match self.phase {
            Phase::Submitted { chosen, correct } => Some((chosen, correct)),
            Phase::Unanswered { .. } => None,
        }
    }

    pub const fn prior_study_minutes(&self) -> f64 {
        self.prior_study_minutes
    }

    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> f64 {
        (now - self.started_at).num_milliseconds() as f64 / 60_000.0
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.complete {
            Err(SessionError::Completed)
        } else {
            Ok(())
        }
    }

    /// Pick an option without committing to it. May be called repeatedly.
    pub fn select(&mut self, option: usize) -> Result<(), SessionError> {
        self.ensure_open()?;
        let Phase::Unanswered { .. } = self.phase else {
            return Err(SessionError::AlreadySubmitted);
        };

        let count = self.current().options.len();
        if option >= count {
            return Err(SessionError::OptionOutOfRange { option, count });
        }
        self.phase = Phase::Unanswered {
            pending: Some(option),
        };
        Ok(())
    }

    /// Commit the pending choice and score it.
    pub fn submit(&mut self) -> Result<AnswerFeedback, SessionError> {
        self.ensure_open()?;
        let chosen = match self.phase {
            Phase::Submitted { .. } => return Err(SessionError::AlreadySubmitted),
            Phase::Unanswered { pending: None } => return Err(SessionError::NothingSelected),
            Phase::Unanswered {
                pending: Some(chosen),
            } => chosen,
        };

        let question = &self.questions[self.index];
        let correct = chosen == question.correct_index;
        if correct {
            self.score += 1;
        }
        self.phase = Phase::Submitted { chosen, correct };

        let first_answer = !self.answered_any;
        self.answered_any = true;

        Ok(AnswerFeedback {
            chosen,
            correct_index: question.correct_index,
            correct,
            explanation: question.explanation.clone(),
            first_answer,
        })
    }

    /// Advance past a submitted question. Returns `true` when the quiz is over.
    pub fn next(&mut self) -> Result<bool, SessionError> {
        self.ensure_open()?;
        if let Phase::Unanswered { .. } = self.phase {
            return Err(SessionError::NotSubmitted);
        }

        if self.index + 1 == self.questions.len() {
            self.complete = true;
            return Ok(true);
        }
        self.index += 1;
        self.phase = Phase::Unanswered { pending: None };
        Ok(false)
    }
}
