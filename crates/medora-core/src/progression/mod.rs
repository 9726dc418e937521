//! Gamification layer: streaks, XP, levels, badges and daily quests.
//!
//! [`ProgressionEngine`] owns one user's [`UserProfile`] and is the only
//! thing that mutates it. State is evaluated per local calendar day and the
//! day rollover is lazy: the first operation of a new day regenerates quests,
//! resets daily stats and decays a broken streak before doing anything else.
//!
//! Mutations mark the fields they touched. [`ProgressionEngine::flush`]
//! folds all marked fields into a single [`ProfilePatch`] built from the
//! latest in-memory values, so an XP award and a quest reward made by the
//! same user action reach the store as one write.

mod badges;
mod level;
mod quests;

use std::{collections::BTreeSet, sync::Arc};

use chrono::NaiveDate;
use medora_store::{
    ProfilePatch, ProfileStore, StoreError,
    models::{DailyStats, QuestType, UserProfile},
};
use rand::RngCore;

use crate::{clock::Clock, persistence::PersistenceSink};

pub use badges::{Badge, BadgeStats, CRAMMER_DAILY_CARDS};
pub use level::{LevelInfo, level_info};
pub use quests::{DAILY_QUEST_COUNT, QUEST_TEMPLATES, QuestTemplate, sample_daily_quests};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ProfileField {
    Onboarding,
    Streak,
    LastStudyDate,
    Xp,
    Badges,
    DailyStats,
    DailyQuests,
    LastQuestGenerationDate,
}

/// Owner of one user's profile and the only code that mutates it.
pub struct ProgressionEngine {
    user_id: String,
    profile: UserProfile,
    clock: Arc<dyn Clock>,
    rng: Box<dyn RngCore + Send>,
    dirty: BTreeSet<ProfileField>,
}

impl std::fmt::Debug for ProgressionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressionEngine")
            .field("user_id", &self.user_id)
            .field("profile", &self.profile)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl ProgressionEngine {
    /// Wrap an already migrated profile. Runs the day rollover immediately.
    pub fn new(
        user_id: impl Into<String>,
        profile: UserProfile,
        clock: Arc<dyn Clock>,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        let mut engine = Self {
            user_id: user_id.into(),
            profile,
            clock,
            rng,
            dirty: BTreeSet::new(),
        };
        engine.roll_over();
        engine
    }

    /// Load a profile from the store. The store migrates legacy documents.
    pub fn load<P: ProfileStore + ?Sized>(
        store: &P,
        user_id: &str,
        clock: Arc<dyn Clock>,
        rng: Box<dyn RngCore + Send>,
    ) -> Result<Self, StoreError> {
        let profile = store.load_profile(user_id)?;
        tracing::debug!(user_id, "Loaded profile");
        Ok(Self::new(user_id, profile, clock, rng))
    }

    /// Create and persist a new profile, then open it.
    pub fn sign_up<P: ProfileStore + ?Sized>(
        store: &P,
        user_id: &str,
        name: &str,
        email: &str,
        clock: Arc<dyn Clock>,
        rng: Box<dyn RngCore + Send>,
    ) -> Result<Self, StoreError> {
        let mut engine = Self::new(user_id, UserProfile::new(name, email), clock, rng);
        store.create_profile(user_id, &engine.profile)?;
        // The created document already holds the rolled-over state
        engine.dirty.clear();
        tracing::info!(user_id, "Signed up new user");
        Ok(engine)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub const fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub const fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Bring day-scoped state up to date with the clock.
    ///
    /// Idempotent within a day. Called at the start of every mutating operation.
    fn roll_over(&mut self) {
        let today = self.clock.today();

        if self.profile.last_quest_generation_date != Some(today) {
            self.profile.daily_quests = sample_daily_quests(&mut *self.rng, today);
            self.profile.last_quest_generation_date = Some(today);
            self.profile.daily_stats = DailyStats::fresh(today);
            self.mark(&[
                ProfileField::DailyQuests,
                ProfileField::LastQuestGenerationDate,
                ProfileField::DailyStats,
            ]);
            tracing::info!(user_id = %self.user_id, %today, "Generated daily quests");
        }

        if self.profile.daily_stats.date != today {
            self.profile.daily_stats = DailyStats::fresh(today);
            self.mark(&[ProfileField::DailyStats]);
        }

        if let Some(last) = self.profile.last_study_date {
            let yesterday = today.pred_opt();
            if last != today && Some(last) != yesterday && self.profile.streak != 0 {
                tracing::info!(
                    user_id = %self.user_id,
                    %last,
                    streak = self.profile.streak,
                    "Streak broken"
                );
                self.profile.streak = 0;
                self.mark(&[ProfileField::Streak]);
            }
        }
    }

    fn mark(&mut self, fields: &[ProfileField]) {
        self.dirty.extend(fields.iter().copied());
    }

    /// Store the optional onboarding answers and mark onboarding done.
    pub fn complete_onboarding(
        &mut self,
        university: Option<String>,
        majors: Vec<String>,
        study_goal: Option<String>,
    ) {
        self.roll_over();
        self.profile.university = university;
        self.profile.majors = majors;
        self.profile.study_goal = study_goal;
        self.profile.onboarding_complete = true;
        self.mark(&[ProfileField::Onboarding]);
    }

    /// Credit today's study towards the streak.
    ///
    /// Returns `true` only for the first call of a calendar day, when the
    /// streak was extended (or restarted at 1 after a gap).
    pub fn record_study_activity(&mut self) -> bool {
        self.roll_over();
        let today = self.clock.today();

        if self.profile.last_study_date == Some(today) {
            return false;
        }

        let studied_yesterday = matches!(
            (self.profile.last_study_date, today.pred_opt()),
            (Some(last), Some(yesterday)) if last == yesterday
        );
        self.profile.streak = if studied_yesterday {
            self.profile.streak.saturating_add(1)
        } else {
            1
        };
        self.profile.last_study_date = Some(today);
        self.mark(&[ProfileField::Streak, ProfileField::LastStudyDate]);

        tracing::info!(user_id = %self.user_id, streak = self.profile.streak, "Streak extended");
        true
    }

    /// Award XP. There is no upper bound.
    pub fn add_xp(&mut self, amount: u64) {
        self.roll_over();
        if amount == 0 {
            return;
        }
        self.profile.xp = self.profile.xp.saturating_add(amount);
        self.mark(&[ProfileField::Xp]);
    }

    /// Advance every open quest of `quest_type` by `amount`.
    ///
    /// A quest reaching its target is latched complete and pays its XP reward
    /// exactly once. Completed quests are never touched again.
    pub fn update_quest_progress(&mut self, quest_type: QuestType, amount: u32) {
        self.roll_over();

        let mut changed = false;
        let mut xp_gained = 0u64;
        for quest in self
            .profile
            .daily_quests
            .iter_mut()
            .filter(|q| q.quest_type == quest_type && !q.completed)
        {
            let progress = quest.progress.saturating_add(amount);
            if progress != quest.progress {
                quest.progress = progress;
                changed = true;
            }
            if quest.progress >= quest.target {
                quest.completed = true;
                xp_gained += quest.xp_reward;
                changed = true;
                tracing::info!(
                    user_id = %self.user_id,
                    quest_id = %quest.id,
                    reward = quest.xp_reward,
                    "Quest completed"
                );
            }
        }

        if !changed {
            return;
        }
        self.mark(&[ProfileField::DailyQuests]);
        if xp_gained > 0 {
            self.profile.xp = self.profile.xp.saturating_add(xp_gained);
            self.mark(&[ProfileField::Xp]);
        }
    }

    /// Count reviewed cards towards today's stats and unlock earned badges.
    ///
    /// Returns only the badges unlocked by this call.
    pub fn check_badges(&mut self, stats: &BadgeStats) -> Vec<Badge> {
        self.roll_over();

        if let Some(reviewed) = stats.cards_reviewed.filter(|&n| n > 0) {
            self.profile.daily_stats.cards_studied =
                self.profile.daily_stats.cards_studied.saturating_add(reviewed);
            self.mark(&[ProfileField::DailyStats]);
        }

        let unlocked = badges::newly_unlocked(
            &self.profile.badges,
            stats,
            self.profile.daily_stats.cards_studied,
            self.clock.hour(),
        );
        if !unlocked.is_empty() {
            self.profile
                .badges
                .extend(unlocked.iter().map(|b| b.id().to_string()));
            self.mark(&[ProfileField::Badges]);
            for badge in &unlocked {
                tracing::info!(user_id = %self.user_id, badge = badge.id(), "Badge unlocked");
            }
        }
        unlocked
    }

    /// Level band for the current XP.
    pub fn level_info(&self) -> LevelInfo {
        level_info(self.profile.xp)
    }

    /// Fields changed since the last call, with their current values.
    pub fn take_patch(&mut self) -> Option<ProfilePatch> {
        if self.dirty.is_empty() {
            return None;
        }

        let p = &self.profile;
        let mut patch = ProfilePatch::default();
        for field in std::mem::take(&mut self.dirty) {
            match field {
                ProfileField::Onboarding => {
                    patch.university = Some(p.university.clone());
                    patch.majors = Some(p.majors.clone());
                    patch.study_goal = Some(p.study_goal.clone());
                    patch.onboarding_complete = Some(p.onboarding_complete);
                }
                ProfileField::Streak => patch.streak = Some(p.streak),
                ProfileField::LastStudyDate => patch.last_study_date = Some(p.last_study_date),
                ProfileField::Xp => patch.xp = Some(p.xp),
                ProfileField::Badges => patch.badges = Some(p.badges.clone()),
                ProfileField::DailyStats => patch.daily_stats = Some(p.daily_stats.clone()),
                ProfileField::DailyQuests => patch.daily_quests = Some(p.daily_quests.clone()),
                ProfileField::LastQuestGenerationDate => {
                    patch.last_quest_generation_date = p.last_quest_generation_date;
                }
            }
        }
        Some(patch)
    }

    /// Dispatch pending changes as one profile update.
    pub fn flush<S: PersistenceSink + ?Sized>(&mut self, sink: &S) {
        if let Some(patch) = self.take_patch() {
            sink.save_profile_fields(&self.user_id, patch);
        }
    }
}
