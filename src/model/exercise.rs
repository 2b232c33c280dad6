//! Exercise and per-exercise tracking state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DomainType, FatigueProfile};

/// Canonical exercise definition (static reference data).
///
/// Links to techniques and overload dimensions through many-to-many edges;
/// owns at most one [`ExerciseState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    /// Exercise name (e.g., "Chromatic Scale"), unique
    pub name: String,
    /// Applicable domains
    pub domains: Vec<DomainType>,
    /// Technique categories (e.g., ["alternate-picking"])
    pub technique_tags: Vec<String>,
    /// Required instrument features, if any
    pub instrument_compatibility: Option<Vec<String>>,
}

/// Per-exercise rolling metrics, exactly one row per tracked exercise.
///
/// All fields are set directly by the caller; nothing here is derived or
/// recomputed in the background. `exercise_id` is unique at the storage
/// layer, so a second state for the same exercise fails the insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseState {
    pub id: i64,
    pub exercise_id: i64,
    pub last_practiced_date: Option<NaiveDate>,
    pub rolling_minutes_7d: u32,
    pub rolling_minutes_28d: u32,
    /// Skill level: 0.0 = novice, 1.0 = mastery
    pub mastery_estimate: f64,
    pub last_fatigue_profile: Option<FatigueProfile>,
}

/// Partial update for an exercise; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExerciseUpdate {
    pub name: Option<String>,
    pub domains: Option<Vec<DomainType>>,
    pub technique_tags: Option<Vec<String>>,
    /// `Some(None)` clears the stored value; an absent field leaves it alone.
    #[serde(default, deserialize_with = "crate::model::nullable_field")]
    pub instrument_compatibility: Option<Option<Vec<String>>>,
}

/// Partial update for an exercise state; absent fields are left unchanged,
/// an explicit null clears the nullable ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExerciseStateUpdate {
    #[serde(default, deserialize_with = "crate::model::nullable_field")]
    pub last_practiced_date: Option<Option<NaiveDate>>,
    pub rolling_minutes_7d: Option<u32>,
    pub rolling_minutes_28d: Option<u32>,
    pub mastery_estimate: Option<f64>,
    #[serde(default, deserialize_with = "crate::model::nullable_field")]
    pub last_fatigue_profile: Option<Option<FatigueProfile>>,
}
