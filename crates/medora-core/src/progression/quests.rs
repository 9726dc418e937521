//! Daily quest templates and sampling.

use chrono::NaiveDate;
use medora_store::models::{Quest, QuestType};
use rand::{Rng, seq::SliceRandom};

/// Quests handed out per day.
pub const DAILY_QUEST_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestTemplate {
    pub quest_type: QuestType,
    pub description: &'static str,
    pub target: u32,
    pub xp_reward: u64,
    pub icon: &'static str,
}

impl QuestTemplate {
    fn instantiate(&self, id: String) -> Quest {
        Quest {
            id,
            quest_type: self.quest_type,
            description: self.description.to_string(),
            target: self.target,
            progress: 0,
            completed: false,
            xp_reward: self.xp_reward,
            icon: self.icon.to_string(),
        }
    }
}

pub const QUEST_TEMPLATES: [QuestTemplate; 5] = [
    QuestTemplate {
        quest_type: QuestType::ReviewCards,
        description: "Review 10 Flashcards",
        target: 10,
        xp_reward: 50,
        icon: "Brain",
    },
    QuestTemplate {
        quest_type: QuestType::ReviewCards,
        description: "Review 25 Flashcards",
        target: 25,
        xp_reward: 100,
        icon: "Layers",
    },
    QuestTemplate {
        quest_type: QuestType::AceQuiz,
        description: "Score 80%+ on a Quiz",
        target: 1,
        xp_reward: 75,
        icon: "Award",
    },
    QuestTemplate {
        quest_type: QuestType::UploadLecture,
        description: "Upload a New Lecture",
        target: 1,
        xp_reward: 50,
        icon: "Upload",
    },
    QuestTemplate {
        quest_type: QuestType::AceQuiz,
        description: "Get a Perfect Quiz Score",
        target: 1,
        xp_reward: 150,
        icon: "Star",
    },
];

/// Draw the day's quests from the template pool without replacement.
///
/// Ids are `{date}-{index}`, so the batch for a given day is stable once stored.
pub fn sample_daily_quests<R: Rng + ?Sized>(rng: &mut R, date: NaiveDate) -> Vec<Quest> {
    QUEST_TEMPLATES
        .choose_multiple(rng, DAILY_QUEST_COUNT)
        .enumerate()
        .map(|(index, template)| template.instantiate(format!("{date}-{index}")))
        .collect()
}
