use thiserror::Error;

use crate::migration::MigrationError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("course not found: {0}")]
    CourseNotFound(String),
    #[error("material {material_id} not found in course {course_id}")]
    MaterialNotFound {
        course_id: String,
        material_id: String,
    },
    #[error("profile not found: {0}")]
    ProfileNotFound(String),
    #[error("profile already exists: {0}")]
    ProfileExists(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("store lock poisoned")]
    Poisoned,
}
