//! Tuning hierarchy.
//!
//! Structurally the same joined-table pattern as the instrument hierarchy:
//! base `tuning` table with a `tuning_type` discriminator, one variant
//! table per concrete kind. Tunings reuse [`InstrumentKind`] as the
//! discriminator vocabulary since the two hierarchies are parallel.

use serde::{Deserialize, Serialize};

use super::instrument::InstrumentKind;

/// Kind-specific tuning attributes.
///
/// Only the stringed variant carries data today; keyboard, wind and
/// percussion tunings are placeholders (pitch reference, temperament etc.
/// would land there).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tuning_type", rename_all = "lowercase")]
pub enum TuningDetail {
    Stringed {
        /// String pitches from lowest to highest
        /// (e.g., ["E2", "A2", "D3", "G3", "B3", "E4"])
        pitch_sequence: Vec<String>,
    },
    Keyboard,
    Wind,
    Percussion,
}

impl TuningDetail {
    pub fn kind(&self) -> InstrumentKind {
        match self {
            TuningDetail::Stringed { .. } => InstrumentKind::Stringed,
            TuningDetail::Keyboard => InstrumentKind::Keyboard,
            TuningDetail::Wind => InstrumentKind::Wind,
            TuningDetail::Percussion => InstrumentKind::Percussion,
        }
    }
}

/// A named tuning (e.g., "Standard", "Drop D", "A440").
///
/// Stringed tunings link to stringed instruments through a many-to-many
/// edge managed by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub id: i64,
    pub name: String,
    #[serde(flatten)]
    pub detail: TuningDetail,
}

impl Tuning {
    pub fn kind(&self) -> InstrumentKind {
        self.detail.kind()
    }
}

/// Partial update for a tuning; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TuningUpdate {
    pub name: Option<String>,
    pub pitch_sequence: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_reports_kind() {
        let standard = TuningDetail::Stringed {
            pitch_sequence: vec![
                "E2".into(),
                "A2".into(),
                "D3".into(),
                "G3".into(),
                "B3".into(),
                "E4".into(),
            ],
        };
        assert_eq!(standard.kind(), InstrumentKind::Stringed);
        assert_eq!(TuningDetail::Keyboard.kind(), InstrumentKind::Keyboard);
    }
}
