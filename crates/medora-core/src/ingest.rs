//! Lecture ingestion boundary.
//!
//! Turning lecture text into a study pack is delegated to a
//! [`ContentGenerator`]. This module only places the pending material, checks
//! the returned pack is well formed and files the result under the material.

use std::future::Future;

use medora_store::{
    MaterialPatch,
    models::{Flashcard, LectureMaterial, MaterialStatus, Mcq, QuestType},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::IngestError, persistence::PersistenceSink, session::SessionOrchestrator};

/// Lecture text past this many characters is not sent to the generator.
pub const MAX_LECTURE_CHARS: usize = 30_000;

/// Options every generated question must carry.
pub const MCQ_OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCard {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedMcq {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
}

/// Generator output for one lecture.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPack {
    pub summary: String,
    pub flashcards: Vec<GeneratedCard>,
    pub mcqs: Vec<GeneratedMcq>,
    pub topics: Vec<String>,
}

impl StudyPack {
    /// Shape checks only. Content quality is the generator's business.
    pub fn validate(&self) -> Result<(), IngestError> {
        for (i, mcq) in self.mcqs.iter().enumerate() {
            if mcq.options.len() != MCQ_OPTION_COUNT {
                return Err(IngestError::Malformed(format!(
                    "question {i} has {} options, expected {MCQ_OPTION_COUNT}",
                    mcq.options.len()
                )));
            }
            if mcq.correct_index >= MCQ_OPTION_COUNT {
                return Err(IngestError::Malformed(format!(
                    "question {i} has correct index {}",
                    mcq.correct_index
                )));
            }
        }
        Ok(())
    }
}

/// Parse and validate a study pack returned as raw JSON.
pub fn parse_study_pack(raw: &str) -> Result<StudyPack, IngestError> {
    let pack: StudyPack = serde_json::from_str(raw)?;
    pack.validate()?;
    Ok(pack)
}

/// Produces a study pack from lecture text.
pub trait ContentGenerator {
    fn generate(&self, text: &str) -> impl Future<Output = Result<StudyPack, IngestError>> + Send;
}

fn truncate_chars(text: &str, max: usize) -> &str {
    text.char_indices()
        .nth(max)
        .map_or(text, |(end, _)| &text[..end])
}

impl<S: PersistenceSink> SessionOrchestrator<S> {
    /// Add a lecture to a course and fill it from the generator.
    ///
    /// The material is stored as `Processing` before generation starts and
    /// ends up `Ready` or `Error`. A failed generation is not retried.
    pub async fn ingest_lecture<G: ContentGenerator>(
        &mut self,
        generator: &G,
        course_id: &str,
        title: &str,
        text: &str,
    ) -> Result<LectureMaterial, IngestError> {
        if !self.has_course(course_id) {
            return Err(IngestError::CourseNotFound(course_id.to_string()));
        }

        let material_id = Uuid::new_v4().to_string();
        let mut material =
            LectureMaterial::placeholder(material_id.clone(), title.to_string(), self.clock().today());
        self.insert_material(course_id, material.clone());
        tracing::info!(%course_id, %material_id, "Lecture queued for generation");

        let pack = generator
            .generate(truncate_chars(text, MAX_LECTURE_CHARS))
            .await
            .and_then(|pack| pack.validate().map(|()| pack));
        let pack = match pack {
            Ok(pack) => pack,
            Err(e) => {
                tracing::warn!(%course_id, %material_id, "Lecture generation failed: {e}");
                self.update_material(
                    course_id,
                    &material_id,
                    MaterialPatch::status(MaterialStatus::Error),
                );
                return Err(e);
            }
        };

        let now = self.clock().now_utc();
        let patch = MaterialPatch {
            status: Some(MaterialStatus::Ready),
            summary: Some(pack.summary),
            flashcards: Some(
                pack.flashcards
                    .into_iter()
                    .enumerate()
                    .map(|(i, card)| {
                        Flashcard::new(format!("{material_id}-f{i}"), card.front, card.back, now)
                    })
                    .collect(),
            ),
            mcqs: Some(
                pack.mcqs
                    .into_iter()
                    .enumerate()
                    .map(|(i, mcq)| Mcq {
                        id: format!("{material_id}-q{i}"),
                        question: mcq.question,
                        options: mcq.options,
                        correct_index: mcq.correct_index,
                        explanation: mcq.explanation,
                    })
                    .collect(),
            ),
            topics: Some(pack.topics),
            study_minutes: None,
        };
        patch.apply(&mut material);
        self.update_material(course_id, &material_id, patch);
        tracing::info!(
            %course_id,
            %material_id,
            flashcards = material.flashcards.len(),
            mcqs = material.mcqs.len(),
            "Lecture ready"
        );

        self.with_engine(|engine| engine.update_quest_progress(QuestType::UploadLecture, 1));
        Ok(material)
    }
}
