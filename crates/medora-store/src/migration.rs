//! Versioned profile migration.
//!
//! Stored profiles are converted into the current [`UserProfile`] shape once,
//! at load, before any engine operation touches them. Engine code can then
//! rely on every field being present.
//!
//! Versions:
//! * 0 - unversioned documents; `xp`, `badges`, `dailyStats`, `dailyQuests`
//!   and `lastQuestGenerationDate` may be missing, dates may be `""`
//! * 1 - current shape ([`PROFILE_SCHEMA_VERSION`])

use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::models::{PROFILE_SCHEMA_VERSION, UserProfile};

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("profile document is not a JSON object")]
    NotAnObject,
    #[error("profile schema version {0} is newer than supported version {PROFILE_SCHEMA_VERSION}")]
    UnsupportedVersion(u64),
    #[error("malformed profile: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Convert a stored profile document of any known version to the current shape.
pub fn migrate_profile(document: Value) -> Result<UserProfile, MigrationError> {
    let Value::Object(mut fields) = document else {
        return Err(MigrationError::NotAnObject);
    };

    let version = fields
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    if version > u64::from(PROFILE_SCHEMA_VERSION) {
        return Err(MigrationError::UnsupportedVersion(version));
    }

    if version == 0 {
        tracing::info!("Migrating unversioned profile to schema version 1");
        v0_to_v1(&mut fields);
    }

    Ok(serde_json::from_value(Value::Object(fields))?)
}

fn v0_to_v1(fields: &mut Map<String, Value>) {
    let defaults = [
        ("name", json!("")),
        ("email", json!("")),
        ("streak", json!(0)),
        ("xp", json!(0)),
        ("badges", json!([])),
        ("dailyQuests", json!([])),
        ("dailyStats", json!({ "date": "1970-01-01", "cardsStudied": 0 })),
    ];
    for (key, default) in defaults {
        match fields.get(key) {
            None | Some(Value::Null) => {
                fields.insert(key.to_string(), default);
            }
            Some(_) => {}
        }
    }

    // Legacy documents store "no date" as an empty string
    for key in ["lastStudyDate", "lastQuestGenerationDate"] {
        let empty = match fields.get(key) {
            None => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        if empty {
            fields.insert(key.to_string(), Value::Null);
        }
    }

    if let Some(Value::Array(badges)) = fields.get_mut("badges") {
        let mut seen = Vec::with_capacity(badges.len());
        badges.retain(|badge| {
            if seen.contains(badge) {
                false
            } else {
                seen.push(badge.clone());
                true
            }
        });
    }

    fields.insert(
        "schemaVersion".to_string(),
        json!(PROFILE_SCHEMA_VERSION),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_migrates_legacy_profile() {
        let legacy = json!({
            "name": "Demo Student",
            "email": "demo@example.com",
            "university": "MIT",
            "onboardingComplete": true,
            "streak": 3,
            "lastStudyDate": "",
            "badges": ["first_step", "first_step", "night_owl"]
        });

        let profile = migrate_profile(legacy).unwrap();
        assert_eq!(profile.schema_version, PROFILE_SCHEMA_VERSION);
        assert_eq!(profile.xp, 0);
        assert_eq!(profile.streak, 3);
        assert_eq!(profile.last_study_date, None);
        assert_eq!(profile.last_quest_generation_date, None);
        assert_eq!(profile.badges, vec!["first_step", "night_owl"]);
        assert!(profile.daily_quests.is_empty());
        assert_eq!(profile.daily_stats.cards_studied, 0);
        assert_eq!(profile.university.as_deref(), Some("MIT"));
    }

    #[test]
    fn test_keeps_present_legacy_values() {
        let legacy = json!({
            "name": "Ada",
            "email": "ada@example.com",
            "streak": 1,
            "xp": 740,
            "lastStudyDate": "2024-02-01",
            "dailyStats": { "date": "2024-02-01", "cardsStudied": 12 }
        });

        let profile = migrate_profile(legacy).unwrap();
        assert_eq!(profile.xp, 740);
        assert_eq!(profile.last_study_date, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(profile.daily_stats.cards_studied, 12);
    }

    #[test]
    fn test_current_version_passes_through() {
        let profile = UserProfile::new("Ada", "ada@example.com");
        let document = serde_json::to_value(&profile).unwrap();
        assert_eq!(migrate_profile(document).unwrap(), profile);
    }

    #[test]
    fn test_rejects_future_version() {
        let err = migrate_profile(json!({ "schemaVersion": 99 })).unwrap_err();
        assert!(matches!(err, MigrationError::UnsupportedVersion(99)));
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(
            migrate_profile(json!([1, 2, 3])),
            Err(MigrationError::NotAnObject)
        ));
    }
}
