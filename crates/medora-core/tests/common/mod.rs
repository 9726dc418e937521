use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use medora_core::{
    Clock, DirectSink, ManualClock, PersistenceSink, ProgressionConfig, ProgressionEngine,
    SessionOrchestrator,
};
use medora_store::{
    InMemoryMaterialStore, InMemoryProfileStore, MaterialPatch, ProfilePatch, ProfileStore,
    models::{Course, DailyStats, Flashcard, LectureMaterial, Mcq, Quest, QuestType, QuizResult, UserProfile},
};
use rand::{SeedableRng, rngs::StdRng};

pub const USER_ID: &str = "student-1";
pub const COURSE_ID: &str = "course-bio";

/// Every dispatched write, in dispatch order
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Profile(ProfilePatch),
    InsertMaterial(String),
    UpdateMaterial {
        material_id: String,
        patch: MaterialPatch,
    },
    QuizResult {
        material_id: String,
        result: QuizResult,
    },
}

/// Records writes, then applies them to in-memory stores
pub struct RecordingSink {
    pub materials: Arc<InMemoryMaterialStore>,
    pub profiles: Arc<InMemoryProfileStore>,
    direct: DirectSink<Arc<InMemoryMaterialStore>, Arc<InMemoryProfileStore>>,
    log: Mutex<Vec<Recorded>>,
}

impl RecordingSink {
    pub fn new(courses: Vec<Course>) -> Self {
        let materials = Arc::new(InMemoryMaterialStore::new(courses));
        let profiles = Arc::new(InMemoryProfileStore::default());
        Self {
            direct: DirectSink::new(materials.clone(), profiles.clone()),
            materials,
            profiles,
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn log(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn profile_patches(&self) -> Vec<ProfilePatch> {
        self.log()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Profile(patch) => Some(patch),
                _ => None,
            })
            .collect()
    }

    pub fn stored_profile(&self) -> UserProfile {
        self.profiles.load_profile(USER_ID).unwrap()
    }

    pub fn stored_material(&self, material_id: &str) -> LectureMaterial {
        use medora_store::MaterialStore;

        self.materials
            .list_courses()
            .unwrap()
            .into_iter()
            .flat_map(|c| c.materials)
            .find(|m| m.id == material_id)
            .expect("Material should be stored")
    }

    fn record(&self, entry: Recorded) {
        self.log.lock().unwrap().push(entry);
    }
}

impl PersistenceSink for RecordingSink {
    fn save_profile_fields(&self, user_id: &str, patch: ProfilePatch) {
        self.record(Recorded::Profile(patch.clone()));
        self.direct.save_profile_fields(user_id, patch);
    }

    fn insert_material(&self, course_id: &str, material: LectureMaterial) {
        self.record(Recorded::InsertMaterial(material.id.clone()));
        self.direct.insert_material(course_id, material);
    }

    fn update_material(&self, course_id: &str, material_id: &str, patch: MaterialPatch) {
        self.record(Recorded::UpdateMaterial {
            material_id: material_id.to_string(),
            patch: patch.clone(),
        });
        self.direct.update_material(course_id, material_id, patch);
    }

    fn append_quiz_result(&self, course_id: &str, material_id: &str, result: QuizResult) {
        self.record(Recorded::QuizResult {
            material_id: material_id.to_string(),
            result: result.clone(),
        });
        self.direct.append_quiz_result(course_id, material_id, result);
    }
}

pub fn clock_at(rfc3339: &str) -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        DateTime::parse_from_rfc3339(rfc3339).expect("Invalid test timestamp"),
    ))
}

pub fn quest(id: &str, quest_type: QuestType, target: u32, xp_reward: u64) -> Quest {
    Quest {
        id: id.to_string(),
        quest_type,
        description: format!("{quest_type:?} x{target}"),
        target,
        progress: 0,
        completed: false,
        xp_reward,
        icon: "Brain".to_string(),
    }
}

/// A profile whose daily batch is already generated for `today`, with one
/// quest of each type so rewards are predictable.
pub fn profile_for(today: NaiveDate) -> UserProfile {
    let mut profile = UserProfile::new("Demo Student", "demo@example.com");
    profile.daily_quests = vec![
        quest(&format!("{today}-0"), QuestType::ReviewCards, 10, 50),
        quest(&format!("{today}-1"), QuestType::AceQuiz, 1, 75),
        quest(&format!("{today}-2"), QuestType::UploadLecture, 1, 50),
    ];
    profile.last_quest_generation_date = Some(today);
    profile.daily_stats = DailyStats::fresh(today);
    profile
}

pub fn deck(material_id: &str, cards: usize, now: DateTime<Utc>) -> LectureMaterial {
    let mut material = LectureMaterial::placeholder(
        material_id.to_string(),
        format!("Lecture {material_id}"),
        now.date_naive(),
    );
    material.status = medora_store::models::MaterialStatus::Ready;
    material.flashcards = (0..cards)
        .map(|i| {
            Flashcard::new(
                format!("{material_id}-f{i}"),
                format!("Front {i}"),
                format!("Back {i}"),
                now,
            )
        })
        .collect();
    material
}

/// Questions whose correct answers are `answers`, four options each.
pub fn quiz(material_id: &str, answers: &[usize]) -> LectureMaterial {
    let mut material = LectureMaterial::placeholder(
        material_id.to_string(),
        format!("Quiz {material_id}"),
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
    );
    material.status = medora_store::models::MaterialStatus::Ready;
    material.mcqs = answers
        .iter()
        .enumerate()
        .map(|(i, &correct_index)| Mcq {
            id: format!("{material_id}-q{i}"),
            question: format!("Question {i}"),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_index,
            explanation: format!("Explanation {i}"),
        })
        .collect();
    material
}

pub fn course(materials: Vec<LectureMaterial>) -> Course {
    Course {
        id: COURSE_ID.to_string(),
        name: "Cell Biology".to_string(),
        instructor: Some("Dr. Hooke".to_string()),
        exam_date: None,
        color: "bg-emerald-500".to_string(),
        materials,
    }
}

pub struct TestStudy {
    pub orchestrator: SessionOrchestrator<Arc<RecordingSink>>,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
}

impl TestStudy {
    /// Flip and rate every card of the open deck, `step` apart.
    pub fn rate_all(
        &mut self,
        rating: medora_core::Rating,
        step: chrono::Duration,
    ) -> Vec<medora_core::RateOutcome> {
        let mut outcomes = Vec::new();
        while self.orchestrator.flashcard_session().is_some() {
            self.clock.advance(step);
            self.orchestrator.flip().unwrap();
            outcomes.push(self.orchestrator.rate(rating).unwrap());
        }
        outcomes
    }

    /// Answer every question of the open quiz with `choices`.
    pub fn answer_all(&mut self, choices: &[usize]) -> Option<medora_core::QuizSummary> {
        let mut summary = None;
        for &choice in choices {
            self.orchestrator.select(choice).unwrap();
            self.orchestrator.submit().unwrap();
            summary = self.orchestrator.next().unwrap();
        }
        summary
    }
}

/// Test study builder for wiring an orchestrator to recording stores
pub struct TestStudyBuilder {
    now: String,
    profile: Option<UserProfile>,
    courses: Vec<Course>,
    store_courses: bool,
    config: ProgressionConfig,
    seed: u64,
}

impl TestStudyBuilder {
    pub fn new() -> Self {
        Self {
            now: "2024-03-10T09:00:00+00:00".to_string(),
            profile: None,
            courses: Vec::new(),
            store_courses: true,
            config: ProgressionConfig::default(),
            seed: 42,
        }
    }

    pub fn at(mut self, rfc3339: &str) -> Self {
        self.now = rfc3339.to_string();
        self
    }

    pub fn profile(mut self, profile: UserProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn course(mut self, course: Course) -> Self {
        self.courses.push(course);
        self
    }

    /// The orchestrator sees the courses but the sink's store does not, so
    /// every material write fails.
    pub fn without_stored_courses(mut self) -> Self {
        self.store_courses = false;
        self
    }

    pub fn config(mut self, config: ProgressionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> TestStudy {
        let clock = clock_at(&self.now);
        let profile = self.profile.unwrap_or_else(|| profile_for(clock.today()));

        let source = InMemoryMaterialStore::new(self.courses.clone());
        let stored = if self.store_courses { self.courses } else { Vec::new() };
        let sink = Arc::new(RecordingSink::new(stored));
        sink.profiles
            .create_profile(USER_ID, &profile)
            .expect("Failed to seed profile");

        let engine = ProgressionEngine::new(
            USER_ID,
            profile,
            clock.clone(),
            Box::new(StdRng::seed_from_u64(self.seed)),
        );
        let orchestrator = SessionOrchestrator::new(engine, &source, sink.clone(), self.config)
            .expect("Failed to open orchestrator");

        TestStudy {
            orchestrator,
            sink,
            clock,
        }
    }
}

impl Default for TestStudyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
