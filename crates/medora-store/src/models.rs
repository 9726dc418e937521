use chrono::{DateTime, NaiveDate, Utc};
use medora_srs::{Difficulty, ReviewState};
use serde::{Deserialize, Serialize};

/// Current shape of a persisted [`UserProfile`].
pub const PROFILE_SCHEMA_VERSION: u32 = 1;

/// Course model - groups lecture materials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Unique course identifier
    pub id: String,
    /// Course name as shown to the user
    pub name: String,
    /// Lecturer, if the user entered one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    /// Day of the final exam
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<NaiveDate>,
    /// Display color tag
    #[serde(default)]
    pub color: String,
    /// Newest first
    #[serde(default)]
    pub materials: Vec<LectureMaterial>,
}

impl Course {
    pub fn material(&self, material_id: &str) -> Option<&LectureMaterial> {
        self.materials.iter().find(|m| m.id == material_id)
    }

    pub fn material_mut(&mut self, material_id: &str) -> Option<&mut LectureMaterial> {
        self.materials.iter_mut().find(|m| m.id == material_id)
    }

    /// Whole days until the exam. `None` when no exam is scheduled.
    pub fn days_until_exam(&self, today: NaiveDate) -> Option<i64> {
        self.exam_date.map(|exam| (exam - today).num_days())
    }
}

/// Processing state of an uploaded lecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialStatus {
    /// Waiting for the content generator
    Processing,
    /// Flashcards and questions are available
    Ready,
    /// Generation failed; the user may upload again
    Error,
}

/// Lecture material model - owns its flashcards, questions and quiz log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureMaterial {
    /// Unique material identifier
    pub id: String,
    /// Lecture title
    pub title: String,
    /// Upload day
    pub date_added: NaiveDate,
    /// Generation state
    pub status: MaterialStatus,
    /// Generated summary of the lecture
    #[serde(default)]
    pub summary: String,
    /// Deck, in review order
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
    /// Quiz questions, in quiz order
    #[serde(default)]
    pub mcqs: Vec<Mcq>,
    /// Topics the lecture covers
    #[serde(default)]
    pub topics: Vec<String>,
    /// Topics the user keeps getting wrong
    #[serde(default)]
    pub weak_topics: Vec<String>,
    /// Append-only quiz log
    #[serde(default)]
    pub quiz_history: Vec<QuizResult>,
    /// Accumulated minutes spent in sessions on this material
    #[serde(default)]
    pub study_minutes: f64,
}

impl LectureMaterial {
    /// Empty material waiting for generated content.
    pub fn placeholder(id: String, title: String, date_added: NaiveDate) -> Self {
        Self {
            id,
            title,
            date_added,
            status: MaterialStatus::Processing,
            summary: String::new(),
            flashcards: Vec::new(),
            mcqs: Vec::new(),
            topics: Vec::new(),
            weak_topics: Vec::new(),
            quiz_history: Vec::new(),
            study_minutes: 0.0,
        }
    }

    /// Best recorded quiz score as a percentage.
    pub fn best_quiz_percent(&self) -> Option<f64> {
        self.quiz_history
            .iter()
            .filter_map(QuizResult::percent)
            .fold(None, |best, p| Some(best.map_or(p, |b: f64| b.max(p))))
    }
}

/// Flashcard model - a front/back pair plus its scheduling state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    /// `{material_id}-f{index}` for generated cards
    pub id: String,
    /// Prompt side
    pub front: String,
    /// Answer side
    pub back: String,
    /// Scheduling state, stored inline with the card
    #[serde(flatten)]
    pub review: ReviewState,
}

impl Flashcard {
    pub const fn new(id: String, front: String, back: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            front,
            back,
            review: ReviewState::new(now),
        }
    }

    pub fn is_mastered(&self) -> bool {
        self.review.difficulty == Difficulty::Mastered
    }
}

/// Multiple choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mcq {
    /// `{material_id}-q{index}` for generated questions
    pub id: String,
    /// Question text
    pub question: String,
    /// Answer options, four for generated questions
    pub options: Vec<String>,
    /// Index of the right option
    pub correct_index: usize,
    /// Shown once the answer is submitted
    pub explanation: String,
}

/// One finished quiz. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    /// When the quiz was finished
    pub date: DateTime<Utc>,
    /// Correct answers
    pub score: u32,
    /// Questions asked
    pub total: u32,
}

impl QuizResult {
    /// Score as a percentage. `None` for an empty quiz.
    pub fn percent(&self) -> Option<f64> {
        (self.total > 0).then(|| f64::from(self.score) / f64::from(self.total) * 100.0)
    }
}

/// Cards studied today, reset when the calendar day changes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// Day the counters belong to
    pub date: NaiveDate,
    /// Cards rated in finished deck reviews
    pub cards_studied: u32,
}

impl DailyStats {
    pub const fn fresh(date: NaiveDate) -> Self {
        Self {
            date,
            cards_studied: 0,
        }
    }
}

/// Kind of action that advances a quest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestType {
    /// Cards rated in finished deck reviews
    ReviewCards,
    /// Quizzes at or above the ace threshold
    AceQuiz,
    /// Lectures ingested successfully
    UploadLecture,
}

/// A daily, target-bounded goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    /// `{date}-{index}` within the daily batch
    pub id: String,
    /// What advances the quest
    #[serde(rename = "type")]
    pub quest_type: QuestType,
    /// Shown to the user
    pub description: String,
    /// Progress needed to complete
    pub target: u32,
    /// Progress so far; frozen once completed
    pub progress: u32,
    /// Latched once `progress` reaches `target`
    pub completed: bool,
    /// XP paid once on completion
    pub xp_reward: u64,
    /// Icon name for the UI
    pub icon: String,
}

/// User profile - progression state, persisted separately from course data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Shape version, see [`PROFILE_SCHEMA_VERSION`]
    pub schema_version: u32,
    /// Display name
    pub name: String,
    /// Sign-up email
    pub email: String,
    /// Onboarding answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    /// Onboarding answer
    #[serde(default)]
    pub majors: Vec<String>,
    /// Onboarding answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_goal: Option<String>,
    /// Set once the onboarding form was submitted
    #[serde(default)]
    pub onboarding_complete: bool,
    /// Consecutive calendar days with study activity
    pub streak: u32,
    /// Last day credited to the streak
    pub last_study_date: Option<NaiveDate>,
    /// Lifetime experience points
    pub xp: u64,
    /// Unlocked badge ids, in unlock order, without duplicates
    pub badges: Vec<String>,
    /// Counters for the current day
    pub daily_stats: DailyStats,
    /// Today's quest batch
    pub daily_quests: Vec<Quest>,
    /// Day the current quest batch was drawn
    pub last_quest_generation_date: Option<NaiveDate>,
}

impl UserProfile {
    /// Profile for a freshly signed-up user. Quests are generated on first access.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            schema_version: PROFILE_SCHEMA_VERSION,
            name: name.into(),
            email: email.into(),
            university: None,
            majors: Vec::new(),
            study_goal: None,
            onboarding_complete: false,
            streak: 0,
            last_study_date: None,
            xp: 0,
            badges: Vec::new(),
            daily_stats: DailyStats::default(),
            daily_quests: Vec::new(),
            last_quest_generation_date: None,
        }
    }
}
