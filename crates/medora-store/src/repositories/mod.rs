// Stores take `&self` and synchronize internally, so one instance can be
// shared between the study core and a background persistence writer.

mod material;
mod profile;

use std::sync::Arc;

use crate::{
    MaterialPatch, ProfilePatch, StoreError,
    models::{Course, LectureMaterial, QuizResult, UserProfile},
};

pub use material::InMemoryMaterialStore;
pub use profile::{InMemoryProfileStore, JsonFileProfileStore};

/// Owner of courses and their lecture materials.
pub trait MaterialStore {
    fn list_courses(&self) -> Result<Vec<Course>, StoreError>;

    fn insert_course(&self, course: Course) -> Result<(), StoreError>;

    /// Prepend a material to a course.
    fn insert_material(&self, course_id: &str, material: LectureMaterial)
    -> Result<(), StoreError>;

    fn update_material(
        &self,
        course_id: &str,
        material_id: &str,
        patch: &MaterialPatch,
    ) -> Result<(), StoreError>;

    fn append_quiz_result(
        &self,
        course_id: &str,
        material_id: &str,
        result: QuizResult,
    ) -> Result<(), StoreError>;
}

/// Owner of user profiles.
pub trait ProfileStore {
    /// Load a profile, migrated to the current schema.
    fn load_profile(&self, user_id: &str) -> Result<UserProfile, StoreError>;

    fn create_profile(&self, user_id: &str, profile: &UserProfile) -> Result<(), StoreError>;

    fn save_profile_fields(&self, user_id: &str, patch: &ProfilePatch) -> Result<(), StoreError>;
}

impl<T: MaterialStore + ?Sized> MaterialStore for Arc<T> {
    fn list_courses(&self) -> Result<Vec<Course>, StoreError> {
        (**self).list_courses()
    }

    fn insert_course(&self, course: Course) -> Result<(), StoreError> {
        (**self).insert_course(course)
    }

    fn insert_material(
        &self,
        course_id: &str,
        material: LectureMaterial,
    ) -> Result<(), StoreError> {
        (**self).insert_material(course_id, material)
    }

    fn update_material(
        &self,
        course_id: &str,
        material_id: &str,
        patch: &MaterialPatch,
    ) -> Result<(), StoreError> {
        (**self).update_material(course_id, material_id, patch)
    }

    fn append_quiz_result(
        &self,
        course_id: &str,
        material_id: &str,
        result: QuizResult,
    ) -> Result<(), StoreError> {
        (**self).append_quiz_result(course_id, material_id, result)
    }
}

impl<T: ProfileStore + ?Sized> ProfileStore for Arc<T> {
    fn load_profile(&self, user_id: &str) -> Result<UserProfile, StoreError> {
        (**self).load_profile(user_id)
    }

    fn create_profile(&self, user_id: &str, profile: &UserProfile) -> Result<(), StoreError> {
        (**self).create_profile(user_id, profile)
    }

    fn save_profile_fields(&self, user_id: &str, patch: &ProfilePatch) -> Result<(), StoreError> {
        (**self).save_profile_fields(user_id, patch)
    }
}
