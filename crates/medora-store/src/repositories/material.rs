use std::sync::RwLock;

use crate::{
    MaterialPatch, StoreError,
    models::{Course, LectureMaterial, QuizResult},
};

use super::MaterialStore;

/// Course data held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryMaterialStore {
    courses: RwLock<Vec<Course>>,
}

impl InMemoryMaterialStore {
    pub fn new(courses: Vec<Course>) -> Self {
        Self {
            courses: RwLock::new(courses),
        }
    }

    fn with_material<T>(
        &self,
        course_id: &str,
        material_id: &str,
        f: impl FnOnce(&mut LectureMaterial) -> T,
    ) -> Result<T, StoreError> {
        let mut courses = self.courses.write().map_err(|_| StoreError::Poisoned)?;
        let course = courses
            .iter_mut()
            .find(|c| c.id == course_id)
            .ok_or_else(|| StoreError::CourseNotFound(course_id.to_string()))?;
        let material =
            course
                .material_mut(material_id)
                .ok_or_else(|| StoreError::MaterialNotFound {
                    course_id: course_id.to_string(),
                    material_id: material_id.to_string(),
                })?;
        Ok(f(material))
    }
}

impl MaterialStore for InMemoryMaterialStore {
    fn list_courses(&self) -> Result<Vec<Course>, StoreError> {
        let courses = self.courses.read().map_err(|_| StoreError::Poisoned)?;
        Ok(courses.clone())
    }

    fn insert_course(&self, course: Course) -> Result<(), StoreError> {
        let mut courses = self.courses.write().map_err(|_| StoreError::Poisoned)?;
        courses.push(course);
        Ok(())
    }

    fn insert_material(
        &self,
        course_id: &str,
        material: LectureMaterial,
    ) -> Result<(), StoreError> {
        let mut courses = self.courses.write().map_err(|_| StoreError::Poisoned)?;
        let course = courses
            .iter_mut()
            .find(|c| c.id == course_id)
            .ok_or_else(|| StoreError::CourseNotFound(course_id.to_string()))?;
        course.materials.insert(0, material);
        Ok(())
    }

    fn update_material(
        &self,
        course_id: &str,
        material_id: &str,
        patch: &MaterialPatch,
    ) -> Result<(), StoreError> {
        tracing::debug!(course_id, material_id, "Updating material");
        self.with_material(course_id, material_id, |material| patch.apply(material))
    }

    fn append_quiz_result(
        &self,
        course_id: &str,
        material_id: &str,
        result: QuizResult,
    ) -> Result<(), StoreError> {
        self.with_material(course_id, material_id, |material| {
            material.quiz_history.push(result);
        })
    }
}
