//! Read-only study statistics across all courses.

use chrono::{DateTime, Utc};
use medora_srs::is_due;
use medora_store::models::{Course, Flashcard};
use serde::Serialize;

/// A topic the user struggles with, tagged with its course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeakTopic {
    pub topic: String,
    pub course_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyOverview {
    pub total_materials: usize,
    pub total_flashcards: usize,
    pub mastered_flashcards: usize,
    pub due_flashcards: usize,
    pub quizzes_taken: usize,
    pub study_minutes: f64,
    pub weak_topics: Vec<WeakTopic>,
}

impl StudyOverview {
    pub fn from_courses(courses: &[Course], now: DateTime<Utc>) -> Self {
        let mut overview = Self::default();
        for course in courses {
            for material in &course.materials {
                overview.total_materials += 1;
                overview.total_flashcards += material.flashcards.len();
                overview.mastered_flashcards +=
                    material.flashcards.iter().filter(|c| c.is_mastered()).count();
                overview.due_flashcards += material
                    .flashcards
                    .iter()
                    .filter(|c| is_due(&c.review, now))
                    .count();
                overview.quizzes_taken += material.quiz_history.len();
                overview.study_minutes += material.study_minutes;
                overview
                    .weak_topics
                    .extend(material.weak_topics.iter().map(|topic| WeakTopic {
                        topic: topic.clone(),
                        course_name: course.name.clone(),
                    }));
            }
        }
        overview
    }

    /// Share of flashcards mastered, 0-100. Zero without any cards.
    pub fn mastery_percent(&self) -> f64 {
        if self.total_flashcards == 0 {
            return 0.0;
        }
        self.mastered_flashcards as f64 / self.total_flashcards as f64 * 100.0
    }
}

/// Cards from one course that are due, with their material id.
pub fn due_cards(course: &Course, now: DateTime<Utc>) -> Vec<(&str, &Flashcard)> {
    course
        .materials
        .iter()
        .flat_map(|m| {
            m.flashcards
                .iter()
                .filter(move |c| is_due(&c.review, now))
                .map(move |c| (m.id.as_str(), c))
        })
        .collect()
}
