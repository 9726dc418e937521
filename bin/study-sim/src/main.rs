use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use chrono::Duration;
use medora_core::{
    BackgroundSink, Badge, Clock, ContentGenerator, Environment, IngestError, ProgressionConfig,
    ProgressionEngine, Rating, SessionOrchestrator, StudyPack, SystemClock,
    analytics::{StudyOverview, due_cards},
    ingest::{GeneratedCard, GeneratedMcq},
};
use medora_store::{
    InMemoryMaterialStore, JsonFileProfileStore, StoreError,
    models::{Course, Flashcard, LectureMaterial, MaterialStatus, Mcq},
};
use rand::{SeedableRng, rngs::StdRng};
use serde::Deserialize;

const COURSE_ID: &str = "demo-course";

#[derive(Debug, Deserialize)]
struct SimConfig {
    #[serde(default = "default_profile_dir")]
    profile_dir: PathBuf,
    #[serde(default = "default_user_id")]
    user_id: String,
    #[serde(default)]
    env: Environment,
}

fn default_profile_dir() -> PathBuf {
    PathBuf::from("profiles")
}

fn default_user_id() -> String {
    "demo-student".to_string()
}

/// Builds a study pack from `front :: back` lines, one card per line.
struct LineGenerator;

impl ContentGenerator for LineGenerator {
    async fn generate(&self, text: &str) -> Result<StudyPack, IngestError> {
        let flashcards: Vec<_> = text
            .lines()
            .filter_map(|line| line.split_once("::"))
            .map(|(front, back)| GeneratedCard {
                front: front.trim().to_string(),
                back: back.trim().to_string(),
            })
            .collect();
        if flashcards.is_empty() {
            return Err(IngestError::Generation("no `front :: back` lines".to_string()));
        }

        let mcqs = flashcards
            .iter()
            .take(1)
            .map(|card| GeneratedMcq {
                question: card.front.clone(),
                options: vec![
                    card.back.clone(),
                    "None of the above".to_string(),
                    "All of the above".to_string(),
                    "Not covered".to_string(),
                ],
                correct_index: 0,
                explanation: card.back.clone(),
            })
            .collect();

        Ok(StudyPack {
            summary: format!("{} key facts", flashcards.len()),
            flashcards,
            mcqs,
            topics: vec!["Imported notes".to_string()],
        })
    }
}

fn sample_course(clock: &dyn Clock) -> Course {
    let now = clock.now_utc();
    let cards = [
        ("What is the powerhouse of the cell?", "Mitochondria"),
        ("Which organelle synthesizes proteins?", "Ribosome"),
        ("What encloses the nucleus?", "Nuclear envelope"),
        ("Where are lipids synthesized?", "Smooth endoplasmic reticulum"),
    ];

    let mut material = LectureMaterial::placeholder(
        "demo-lecture".to_string(),
        "Organelles".to_string(),
        clock.today(),
    );
    material.status = MaterialStatus::Ready;
    material.summary = "Structure and function of eukaryotic organelles.".to_string();
    material.topics = vec!["Organelles".to_string()];
    material.flashcards = cards
        .iter()
        .enumerate()
        .map(|(i, (front, back))| {
            Flashcard::new(
                format!("demo-lecture-f{i}"),
                (*front).to_string(),
                (*back).to_string(),
                now,
            )
        })
        .collect();
    material.mcqs = cards
        .iter()
        .enumerate()
        .map(|(i, (front, back))| Mcq {
            id: format!("demo-lecture-q{i}"),
            question: (*front).to_string(),
            options: vec![
                (*back).to_string(),
                "Golgi apparatus".to_string(),
                "Lysosome".to_string(),
                "Vacuole".to_string(),
            ],
            correct_index: 0,
            explanation: format!("The answer is {back}."),
        })
        .collect();

    Course {
        id: COURSE_ID.to_string(),
        name: "Cell Biology".to_string(),
        instructor: Some("Dr. Hooke".to_string()),
        exam_date: Some(clock.today() + Duration::days(21)),
        color: "bg-emerald-500".to_string(),
        materials: vec![material],
    }
}

fn open_profile(
    store: &JsonFileProfileStore,
    user_id: &str,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<ProgressionEngine> {
    match ProgressionEngine::load(store, user_id, clock.clone(), Box::new(StdRng::from_entropy())) {
        Ok(engine) => Ok(engine),
        Err(StoreError::ProfileNotFound(_)) => ProgressionEngine::sign_up(
            store,
            user_id,
            "Demo Student",
            "demo@example.com",
            clock,
            Box::new(StdRng::from_entropy()),
        )
        .context("Failed to create profile"),
        Err(e) => Err(e).context("Failed to load profile"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment variables
    dotenvy::dotenv().ok();
    let config: SimConfig = envy::prefixed("MEDORA_")
        .from_env()
        .context("Invalid MEDORA_* configuration")?;
    medora_core::tracing::init_tracing(&config.env).context("Failed to initialize tracing")?;
    let progression = ProgressionConfig::from_env().context("Invalid progression settings")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let profiles = Arc::new(JsonFileProfileStore::new(&config.profile_dir));
    let engine = open_profile(&profiles, &config.user_id, clock.clone())?;

    let course = sample_course(clock.as_ref());
    let material_id = course.materials[0].id.clone();
    let materials = Arc::new(InMemoryMaterialStore::new(vec![course]));

    let (sink, writer) = BackgroundSink::spawn(materials.clone(), profiles.clone());
    let mut orchestrator =
        SessionOrchestrator::new(engine, materials.as_ref(), sink, progression)
            .context("Failed to load courses")?;

    // Flashcards
    orchestrator.start_flashcards(COURSE_ID, &material_id)?;
    let ratings = [Rating::Good, Rating::Easy, Rating::Hard, Rating::Again];
    let mut rating_index = 0;
    while let Some(session) = orchestrator.flashcard_session() {
        let preview = medora_srs::preview_intervals(&session.current().review);
        tracing::debug!(card = %session.current().id, ?preview, "Showing card");

        orchestrator.flip()?;
        let outcome = orchestrator.rate(ratings[rating_index % ratings.len()])?;
        rating_index += 1;
        if outcome.streak_extended {
            println!("Streak extended to {}", orchestrator.engine().profile().streak);
        }
        if let Some(summary) = outcome.completion {
            println!(
                "Reviewed {} cards in {:.2} minutes",
                summary.cards_reviewed, summary.minutes
            );
        }
    }

    // Quiz, missing the last question on purpose
    let questions = orchestrator.start_quiz(COURSE_ID, &material_id)?;
    for i in 0..questions {
        let Some(session) = orchestrator.quiz_session() else {
            break;
        };
        let correct = session.current().correct_index;
        let choice = if i + 1 == questions {
            (correct + 1) % session.current().options.len()
        } else {
            correct
        };
        orchestrator.select(choice)?;
        orchestrator.submit()?;
        if let Some(summary) = orchestrator.next()? {
            println!("Quiz score {}/{}", summary.score, summary.total);
            for badge in summary.new_badges {
                println!("Unlocked badge: {}", badge.name());
            }
        }
    }

    // Ingestion
    let notes = "ATP synthase location :: Inner mitochondrial membrane\n\
                 Site of photosynthesis :: Chloroplast";
    match orchestrator
        .ingest_lecture(&LineGenerator, COURSE_ID, "Energy organelles", notes)
        .await
    {
        Ok(lecture) => println!("Imported '{}' with {} cards", lecture.title, lecture.flashcards.len()),
        Err(e) => tracing::warn!("Import failed: {e}"),
    }

    let profile = orchestrator.engine().profile().clone();
    let level = orchestrator.engine().level_info();
    let now = clock.now_utc();
    let overview = StudyOverview::from_courses(orchestrator.courses(), now);
    for course in orchestrator.courses() {
        let due = due_cards(course, now);
        match course.days_until_exam(clock.today()) {
            Some(days) => println!("{}: {} card(s) due, exam in {days} day(s)", course.name, due.len()),
            None => println!("{}: {} card(s) due", course.name, due.len()),
        }
    }
    drop(orchestrator);
    writer.await.context("Persistence writer panicked")?;

    println!(
        "Level {} ({}) - {} XP, {:.0}% to next level",
        level.level, level.title, profile.xp, level.progress
    );
    println!("Streak: {} day(s)", profile.streak);
    let badges: Vec<_> = profile
        .badges
        .iter()
        .filter_map(|id| Badge::from_id(id))
        .map(Badge::name)
        .collect();
    if !badges.is_empty() {
        println!("Badges: {}", badges.join(", "));
    }
    for quest in &profile.daily_quests {
        let mark = if quest.completed { "x" } else { " " };
        println!(
            "[{mark}] {} ({}/{}) +{} XP",
            quest.description, quest.progress, quest.target, quest.xp_reward
        );
    }

    println!(
        "{} materials, {}/{} cards mastered ({:.0}%), {} due",
        overview.total_materials,
        overview.mastered_flashcards,
        overview.total_flashcards,
        overview.mastery_percent(),
        overview.due_flashcards
    );

    Ok(())
}
