//! Practice sessions, exercise instances and completion logs.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{CompletionStatus, QualityRating, SessionType};

/// Scalar value of an exercise parameter (tempo, key, pattern, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    String(String),
}

/// Free-form exercise parameters, keyed by name.
pub type Parameters = BTreeMap<String, ParamValue>;

/// A practice session on one instrument.
///
/// Owns ordered [`ExerciseInstance`] children; deleting a practice deletes
/// them (and their logs) in one atomic operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Practice {
    pub id: i64,
    pub instrument_id: i64,
    pub session_date: NaiveDate,
    pub session_type: SessionType,
    pub total_minutes: u32,
}

/// A parameterized occurrence of an exercise within a practice session.
///
/// `sequence_order` is the 1-indexed position within the practice; reads
/// come back ordered by it. Owns zero-or-one [`ExerciseLog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseInstance {
    pub id: i64,
    pub practice_id: i64,
    pub exercise_id: i64,
    pub sequence_order: u32,
    pub parameters: Parameters,
}

/// Completion record for an exercise instance (1:1, unique FK).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLog {
    pub id: i64,
    pub exercise_instance_id: i64,
    pub completion_status: CompletionStatus,
    pub quality_rating: QualityRating,
    pub notes: Option<String>,
}

/// Partial update for a practice session. `instrument_id` is intentionally
/// absent - a practice never moves between instruments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PracticeUpdate {
    pub session_date: Option<NaiveDate>,
    pub session_type: Option<SessionType>,
    pub total_minutes: Option<u32>,
}

/// Partial update for an exercise instance.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExerciseInstanceUpdate {
    pub sequence_order: Option<u32>,
    pub parameters: Option<Parameters>,
}

/// Partial update for an exercise log.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExerciseLogUpdate {
    pub completion_status: Option<CompletionStatus>,
    pub quality_rating: Option<QualityRating>,
    /// `Some(None)` clears the stored value; an absent field leaves it alone.
    #[serde(default, deserialize_with = "crate::model::nullable_field")]
    pub notes: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_value_serde_is_untagged() {
        let mut params = Parameters::new();
        params.insert("tempo".to_string(), ParamValue::Int(120));
        params.insert("key".to_string(), ParamValue::String("A minor".to_string()));
        params.insert("swing".to_string(), ParamValue::Float(0.62));

        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"tempo\":120"));
        assert!(json.contains("\"key\":\"A minor\""));

        let back: Parameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_log_update_distinguishes_null_from_absent() {
        let cleared: ExerciseLogUpdate = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(cleared.notes, Some(None));

        let untouched: ExerciseLogUpdate = serde_json::from_str("{}").unwrap();
        assert_eq!(untouched.notes, None);
    }
}
