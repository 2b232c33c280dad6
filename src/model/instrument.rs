//! Instrument hierarchy.
//!
//! The relational shape is joined-table inheritance: a base `instrument`
//! table carrying the discriminator, plus one table per concrete kind
//! sharing the base primary key. At the application layer the hierarchy is
//! a single tagged variant, so a caller can never hold a "raw base"
//! instrument - every read joins the variant table and dispatches on the
//! discriminator.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Discriminator for the instrument hierarchy.
///
/// The string values are stored in the `instrument_type` column and are
/// part of the on-disk contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    Stringed,
    Keyboard,
    Wind,
    Percussion,
}

impl InstrumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentKind::Stringed => "stringed",
            InstrumentKind::Keyboard => "keyboard",
            InstrumentKind::Wind => "wind",
            InstrumentKind::Percussion => "percussion",
        }
    }

    /// All instrument kinds
    pub fn all() -> &'static [InstrumentKind] {
        &[
            InstrumentKind::Stringed,
            InstrumentKind::Keyboard,
            InstrumentKind::Wind,
            InstrumentKind::Percussion,
        ]
    }
}

impl FromStr for InstrumentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stringed" => Ok(InstrumentKind::Stringed),
            "keyboard" => Ok(InstrumentKind::Keyboard),
            "wind" => Ok(InstrumentKind::Wind),
            "percussion" => Ok(InstrumentKind::Percussion),
            _ => Err(Error::Decoding(format!("Unknown instrument type: {}", s))),
        }
    }
}

impl std::fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind-specific attributes, one variant per joined table.
///
/// Keyboard, wind and percussion are attribute-free placeholders reserved
/// for future extension; their tables carry only the shared key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "instrument_type", rename_all = "lowercase")]
pub enum InstrumentDetail {
    Stringed {
        string_count: u32,
        /// Scale length in inches (e.g., 25.5)
        scale_length: Option<f64>,
    },
    Keyboard,
    Wind,
    Percussion,
}

impl InstrumentDetail {
    /// The discriminator this variant stores.
    pub fn kind(&self) -> InstrumentKind {
        match self {
            InstrumentDetail::Stringed { .. } => InstrumentKind::Stringed,
            InstrumentDetail::Keyboard => InstrumentKind::Keyboard,
            InstrumentDetail::Wind => InstrumentKind::Wind,
            InstrumentDetail::Percussion => InstrumentKind::Percussion,
        }
    }
}

/// An instrument profile.
///
/// Owns zero-or-more practices (cascade-delete) and links to techniques
/// through a many-to-many edge; both live in the store, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: i64,
    /// Instrument identifier (e.g., "Strat 6-string"), unique
    pub name: String,
    #[serde(flatten)]
    pub detail: InstrumentDetail,
}

impl Instrument {
    pub fn kind(&self) -> InstrumentKind {
        self.detail.kind()
    }
}

/// Partial update for an instrument; absent fields are left unchanged.
/// The discriminator is never mutable - variant-specific fields only apply
/// when the instrument already is that variant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstrumentUpdate {
    pub name: Option<String>,
    pub string_count: Option<u32>,
    /// `Some(None)` clears the stored value; an absent field leaves it alone.
    #[serde(default, deserialize_with = "crate::model::nullable_field")]
    pub scale_length: Option<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in InstrumentKind::all() {
            assert_eq!(InstrumentKind::from_str(kind.as_str()).unwrap(), *kind);
        }
    }

    #[test]
    fn test_unknown_discriminator_fails() {
        assert!(InstrumentKind::from_str("brass").is_err());
        assert!(InstrumentKind::from_str("Stringed").is_err());
    }

    #[test]
    fn test_detail_reports_kind() {
        let detail = InstrumentDetail::Stringed {
            string_count: 6,
            scale_length: Some(25.5),
        };
        assert_eq!(detail.kind(), InstrumentKind::Stringed);
        assert_eq!(InstrumentDetail::Percussion.kind(), InstrumentKind::Percussion);
    }
}
