use serde::Deserialize;

/// Deployment environment, selects the logging format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Pretty logs, study crates at `debug`
    #[default]
    Development,
    /// JSON logs, study crates at `info`
    Production,
}

impl Environment {
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Tunable rewards for study sessions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgressionConfig {
    /// XP awarded for every rated flashcard, whatever the rating
    #[serde(default = "default_xp_per_card")]
    pub xp_per_card: u64,
    /// XP awarded for every correctly answered quiz question
    #[serde(default = "default_xp_per_correct_answer")]
    pub xp_per_correct_answer: u64,
    /// Minimum quiz score (percent) that counts towards ACE_QUIZ quests
    #[serde(default = "default_ace_quiz_percent")]
    pub ace_quiz_percent: u32,
}

const fn default_xp_per_card() -> u64 {
    10
}

const fn default_xp_per_correct_answer() -> u64 {
    20
}

const fn default_ace_quiz_percent() -> u32 {
    80
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            xp_per_card: default_xp_per_card(),
            xp_per_correct_answer: default_xp_per_correct_answer(),
            ace_quiz_percent: default_ace_quiz_percent(),
        }
    }
}

impl ProgressionConfig {
    /// Read `MEDORA_XP_PER_CARD`, `MEDORA_XP_PER_CORRECT_ANSWER` and
    /// `MEDORA_ACE_QUIZ_PERCENT`, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("MEDORA_").from_env()
    }

    /// Whether a quiz result qualifies as "aced".
    pub const fn is_ace(&self, score: u32, total: u32) -> bool {
        total > 0 && (score as u64) * 100 >= (self.ace_quiz_percent as u64) * (total as u64)
    }
}
