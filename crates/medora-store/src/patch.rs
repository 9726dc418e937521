//! Partial-field updates sent to the stores.
//!
//! Every field is a whole-value replacement. `None` means "unchanged"; there
//! are no deltas.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{
    DailyStats, Flashcard, LectureMaterial, MaterialStatus, Mcq, Quest, UserProfile,
};

/// Changed fields of a [`UserProfile`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    /// `Some(None)` clears the university
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub majors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_goal: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding_complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak: Option<u32>,
    /// `Some(None)` clears the date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_study_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badges: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_stats: Option<DailyStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_quests: Option<Vec<Quest>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_quest_generation_date: Option<NaiveDate>,
}

impl ProfilePatch {
    /// Write the set fields into `profile`.
    pub fn apply(&self, profile: &mut UserProfile) {
        if let Some(university) = &self.university {
            profile.university.clone_from(university);
        }
        if let Some(majors) = &self.majors {
            profile.majors.clone_from(majors);
        }
        if let Some(goal) = &self.study_goal {
            profile.study_goal.clone_from(goal);
        }
        if let Some(done) = self.onboarding_complete {
            profile.onboarding_complete = done;
        }
        if let Some(streak) = self.streak {
            profile.streak = streak;
        }
        if let Some(date) = self.last_study_date {
            profile.last_study_date = date;
        }
        if let Some(xp) = self.xp {
            profile.xp = xp;
        }
        if let Some(badges) = &self.badges {
            profile.badges.clone_from(badges);
        }
        if let Some(stats) = &self.daily_stats {
            profile.daily_stats = stats.clone();
        }
        if let Some(quests) = &self.daily_quests {
            profile.daily_quests.clone_from(quests);
        }
        if let Some(date) = self.last_quest_generation_date {
            profile.last_quest_generation_date = Some(date);
        }
    }
}

/// Changed fields of a [`LectureMaterial`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MaterialStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Full replacement of the card list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flashcards: Option<Vec<Flashcard>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcqs: Option<Vec<Mcq>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_minutes: Option<f64>,
}

impl MaterialPatch {
    pub fn status(status: MaterialStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn flashcards(cards: Vec<Flashcard>) -> Self {
        Self {
            flashcards: Some(cards),
            ..Self::default()
        }
    }

    pub fn study_minutes(minutes: f64) -> Self {
        Self {
            study_minutes: Some(minutes),
            ..Self::default()
        }
    }

    pub fn apply(&self, material: &mut LectureMaterial) {
        if let Some(status) = self.status {
            material.status = status;
        }
        if let Some(summary) = &self.summary {
            material.summary.clone_from(summary);
        }
        if let Some(cards) = &self.flashcards {
            material.flashcards.clone_from(cards);
        }
        if let Some(mcqs) = &self.mcqs {
            material.mcqs.clone_from(mcqs);
        }
        if let Some(topics) = &self.topics {
            material.topics.clone_from(topics);
        }
        if let Some(minutes) = self.study_minutes {
            material.study_minutes = minutes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_only_touches_set_fields() {
        let mut profile = UserProfile::new("Ada", "ada@example.com");
        profile.streak = 4;
        ProfilePatch {
            xp: Some(500),
            last_study_date: Some(None),
            ..ProfilePatch::default()
        }
        .apply(&mut profile);

        assert_eq!(profile.xp, 500);
        assert_eq!(profile.streak, 4);
        assert_eq!(profile.last_study_date, None);
    }

    #[test]
    fn test_apply_clears_onboarding_answers() {
        let mut profile = UserProfile::new("Ada", "ada@example.com");
        profile.university = Some("MIT".to_string());
        profile.study_goal = Some("Pass boards".to_string());
        ProfilePatch {
            university: Some(None),
            study_goal: Some(None),
            ..ProfilePatch::default()
        }
        .apply(&mut profile);

        assert_eq!(profile.university, None);
        assert_eq!(profile.study_goal, None);
    }

    #[test]
    fn test_empty_patch_serializes_to_empty_object() {
        let patch = ProfilePatch::default();
        assert_eq!(serde_json::to_string(&patch).unwrap(), "{}");
    }
}
