use thiserror::Error;

/// A transition the open session does not allow. These are caller contract
/// violations; the session state is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("a study session is already open")]
    AlreadyOpen,
    /// A card action with no deck review open
    #[error("no flashcard session is open")]
    NoFlashcardSession,
    /// A quiz action with no quiz open
    #[error("no quiz session is open")]
    NoQuizSession,
    #[error("material {material_id} not found in course {course_id}")]
    MaterialNotFound {
        /// Requested course
        course_id: String,
        /// Requested material
        material_id: String,
    },
    #[error("material {0} has no flashcards")]
    NoFlashcards(String),
    #[error("material {0} has no questions")]
    NoQuestions(String),
    #[error("the card must be flipped before it can be rated")]
    NotFlipped,
    #[error("option {option} is out of range ({count} options)")]
    OptionOutOfRange {
        /// Selected index
        option: usize,
        /// Options on the question
        count: usize,
    },
    #[error("the answer has already been submitted")]
    AlreadySubmitted,
    #[error("no option selected")]
    NothingSelected,
    #[error("the answer has not been submitted yet")]
    NotSubmitted,
    /// Any action on a bare session after its last step
    #[error("the session is already complete")]
    Completed,
}

/// Lecture ingestion failure. The affected material is marked `Error`.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("course {0} not found")]
    CourseNotFound(String),
    /// The generator gave up
    #[error("content generation failed: {0}")]
    Generation(String),
    /// The pack has the wrong shape
    #[error("malformed study pack: {0}")]
    Malformed(String),
    #[error("study pack is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
