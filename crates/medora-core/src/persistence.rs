//! Fire-and-forget persistence.
//!
//! The study core computes every transition in memory first and then hands
//! the changed fields to a [`PersistenceSink`]. Sinks never report failures
//! back: a failed write is logged and the in-memory state stays authoritative
//! for the rest of the session.

use std::sync::Arc;

use medora_store::{
    MaterialPatch, MaterialStore, ProfilePatch, ProfileStore,
    models::{LectureMaterial, QuizResult},
};
use tokio::{sync::mpsc, task::JoinHandle};

/// Destination for the writes produced by study actions.
///
/// Calls return immediately and never fail from the caller's point of view.
pub trait PersistenceSink {
    /// Write the changed profile fields.
    fn save_profile_fields(&self, user_id: &str, patch: ProfilePatch);

    /// Prepend a new material to a course.
    fn insert_material(&self, course_id: &str, material: LectureMaterial);

    /// Replace the fields set in `patch`.
    fn update_material(&self, course_id: &str, material_id: &str, patch: MaterialPatch);

    /// Add a finished quiz to the material's history.
    fn append_quiz_result(&self, course_id: &str, material_id: &str, result: QuizResult);
}

impl<T: PersistenceSink + ?Sized> PersistenceSink for Arc<T> {
    fn save_profile_fields(&self, user_id: &str, patch: ProfilePatch) {
        (**self).save_profile_fields(user_id, patch);
    }

    fn insert_material(&self, course_id: &str, material: LectureMaterial) {
        (**self).insert_material(course_id, material);
    }

    fn update_material(&self, course_id: &str, material_id: &str, patch: MaterialPatch) {
        (**self).update_material(course_id, material_id, patch);
    }

    fn append_quiz_result(&self, course_id: &str, material_id: &str, result: QuizResult) {
        (**self).append_quiz_result(course_id, material_id, result);
    }
}

/// Writes straight through to the stores on the calling thread.
#[derive(Debug)]
pub struct DirectSink<M, P> {
    materials: M,
    profiles: P,
}

impl<M, P> DirectSink<M, P>
where
    M: MaterialStore,
    P: ProfileStore,
{
    pub const fn new(materials: M, profiles: P) -> Self {
        Self {
            materials,
            profiles,
        }
    }

    fn apply(&self, command: PersistCommand) {
        match command {
            PersistCommand::Profile { user_id, patch } => {
                if let Err(e) = self.profiles.save_profile_fields(&user_id, &patch) {
                    tracing::error!(%user_id, "Failed to save profile fields: {e}");
                }
            }
            PersistCommand::InsertMaterial {
                course_id,
                material,
            } => {
                let material_id = material.id.clone();
                if let Err(e) = self.materials.insert_material(&course_id, material) {
                    tracing::error!(%course_id, %material_id, "Failed to insert material: {e}");
                }
            }
            PersistCommand::UpdateMaterial {
                course_id,
                material_id,
                patch,
            } => {
                if let Err(e) = self
                    .materials
                    .update_material(&course_id, &material_id, &patch)
                {
                    tracing::error!(%course_id, %material_id, "Failed to update material: {e}");
                }
            }
            PersistCommand::AppendQuizResult {
                course_id,
                material_id,
                result,
            } => {
                if let Err(e) = self
                    .materials
                    .append_quiz_result(&course_id, &material_id, result)
                {
                    tracing::error!(%course_id, %material_id, "Failed to append quiz result: {e}");
                }
            }
        }
    }
}

impl<M, P> PersistenceSink for DirectSink<M, P>
where
    M: MaterialStore,
    P: ProfileStore,
{
    fn save_profile_fields(&self, user_id: &str, patch: ProfilePatch) {
        self.apply(PersistCommand::Profile {
            user_id: user_id.to_string(),
            patch,
        });
    }

    fn insert_material(&self, course_id: &str, material: LectureMaterial) {
        self.apply(PersistCommand::InsertMaterial {
            course_id: course_id.to_string(),
            material,
        });
    }

    fn update_material(&self, course_id: &str, material_id: &str, patch: MaterialPatch) {
        self.apply(PersistCommand::UpdateMaterial {
            course_id: course_id.to_string(),
            material_id: material_id.to_string(),
            patch,
        });
    }

    fn append_quiz_result(&self, course_id: &str, material_id: &str, result: QuizResult) {
        self.apply(PersistCommand::AppendQuizResult {
            course_id: course_id.to_string(),
            material_id: material_id.to_string(),
            result,
        });
    }
}

#[derive(Debug)]
enum PersistCommand {
    Profile {
        user_id: String,
        patch: ProfilePatch,
    },
    InsertMaterial {
        course_id: String,
        material: LectureMaterial,
    },
    UpdateMaterial {
        course_id: String,
        material_id: String,
        patch: MaterialPatch,
    },
    AppendQuizResult {
        course_id: String,
        material_id: String,
        result: QuizResult,
    },
}

/// Queues writes for a background task, so the caller never waits on a store.
///
/// Commands are applied in the order they were dispatched. Dropping every
/// clone of the sink closes the queue; the writer task finishes once the
/// remaining commands are applied.
#[derive(Debug, Clone)]
pub struct BackgroundSink {
    tx: mpsc::UnboundedSender<PersistCommand>,
}

impl BackgroundSink {
    /// Spawn the writer task. Must be called from within a Tokio runtime.
    pub fn spawn<M, P>(materials: M, profiles: P) -> (Self, JoinHandle<()>)
    where
        M: MaterialStore + Send + 'static,
        P: ProfileStore + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_writer(rx, DirectSink::new(materials, profiles)));
        (Self { tx }, handle)
    }

    fn dispatch(&self, command: PersistCommand) {
        if let Err(e) = self.tx.send(command) {
            tracing::error!("Persistence writer is gone, dropping {:?}", e.0);
        }
    }
}

async fn run_writer<M, P>(mut rx: mpsc::UnboundedReceiver<PersistCommand>, sink: DirectSink<M, P>)
where
    M: MaterialStore,
    P: ProfileStore,
{
    let mut applied = 0usize;
    while let Some(command) = rx.recv().await {
        sink.apply(command);
        applied += 1;
    }
    tracing::debug!("Persistence writer stopped after {applied} commands");
}

impl PersistenceSink for BackgroundSink {
    fn save_profile_fields(&self, user_id: &str, patch: ProfilePatch) {
        self.dispatch(PersistCommand::Profile {
            user_id: user_id.to_string(),
            patch,
        });
    }

    fn insert_material(&self, course_id: &str, material: LectureMaterial) {
        self.dispatch(PersistCommand::InsertMaterial {
            course_id: course_id.to_string(),
            material,
        });
    }

    fn update_material(&self, course_id: &str, material_id: &str, patch: MaterialPatch) {
        self.dispatch(PersistCommand::UpdateMaterial {
            course_id: course_id.to_string(),
            material_id: material_id.to_string(),
            patch,
        });
    }

    fn append_quiz_result(&self, course_id: &str, material_id: &str, result: QuizResult) {
        self.dispatch(PersistCommand::AppendQuizResult {
            course_id: course_id.to_string(),
            material_id: material_id.to_string(),
            result,
        });
    }
}
