//! Entity models and shared enum vocabularies.
//!
//! The stored string value of every enum here is part of the on-disk
//! contract; `as_str` returns exactly what goes into the database and
//! `FromStr` accepts exactly that string back (anything else is a
//! decoding failure, not a coercion).

use crate::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub mod connector;
pub mod exercise;
pub mod instrument;
pub mod practice;
pub mod tuning;

/// Deserializer for nullable update fields: the outer `Option` is field
/// presence, the inner is the new value. An absent field deserializes to
/// `None` (leave unchanged) while an explicit null becomes `Some(None)`
/// (clear the stored value). Requires `#[serde(default)]` on the field.
pub(crate) fn nullable_field<'de, T, D>(
    deserializer: D,
) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Exercise domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DomainType {
    Technique,
    Harmony,
    Rhythm,
    Musicianship,
}

impl DomainType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainType::Technique => "Technique",
            DomainType::Harmony => "Harmony",
            DomainType::Rhythm => "Rhythm",
            DomainType::Musicianship => "Musicianship",
        }
    }
}

impl FromStr for DomainType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Technique" => Ok(DomainType::Technique),
            "Harmony" => Ok(DomainType::Harmony),
            "Rhythm" => Ok(DomainType::Rhythm),
            "Musicianship" => Ok(DomainType::Musicianship),
            _ => Err(Error::Decoding(format!("Unknown domain: {}", s))),
        }
    }
}

impl std::fmt::Display for DomainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fatigue states for exercise tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FatigueProfile {
    /// Fresh
    F0,
    /// Light fatigue
    F1,
    /// Heavy fatigue
    F2,
}

impl FatigueProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            FatigueProfile::F0 => "F0",
            FatigueProfile::F1 => "F1",
            FatigueProfile::F2 => "F2",
        }
    }
}

impl FromStr for FatigueProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "F0" => Ok(FatigueProfile::F0),
            "F1" => Ok(FatigueProfile::F1),
            "F2" => Ok(FatigueProfile::F2),
            _ => Err(Error::Decoding(format!("Unknown fatigue profile: {}", s))),
        }
    }
}

impl std::fmt::Display for FatigueProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Practice session intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Normal,
    Light,
    Heavy,
    Deload,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Normal => "normal",
            SessionType::Light => "light",
            SessionType::Heavy => "heavy",
            SessionType::Deload => "deload",
        }
    }
}

impl FromStr for SessionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(SessionType::Normal),
            "light" => Ok(SessionType::Light),
            "heavy" => Ok(SessionType::Heavy),
            "deload" => Ok(SessionType::Deload),
            _ => Err(Error::Decoding(format!("Unknown session type: {}", s))),
        }
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Exercise completion states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    Yes,
    Partial,
    No,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Yes => "yes",
            CompletionStatus::Partial => "partial",
            CompletionStatus::No => "no",
        }
    }
}

impl FromStr for CompletionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(CompletionStatus::Yes),
            "partial" => Ok(CompletionStatus::Partial),
            "no" => Ok(CompletionStatus::No),
            _ => Err(Error::Decoding(format!("Unknown completion status: {}", s))),
        }
    }
}

impl std::fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Practice quality assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityRating {
    Clean,
    Acceptable,
    Sloppy,
}

impl QualityRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityRating::Clean => "clean",
            QualityRating::Acceptable => "acceptable",
            QualityRating::Sloppy => "sloppy",
        }
    }
}

impl FromStr for QualityRating {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clean" => Ok(QualityRating::Clean),
            "acceptable" => Ok(QualityRating::Acceptable),
            "sloppy" => Ok(QualityRating::Sloppy),
            _ => Err(Error::Decoding(format!("Unknown quality rating: {}", s))),
        }
    }
}

impl std::fmt::Display for QualityRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_strings_are_verbatim() {
        assert_eq!(DomainType::Musicianship.as_str(), "Musicianship");
        assert_eq!(SessionType::Deload.as_str(), "deload");
        assert_eq!(CompletionStatus::Partial.as_str(), "partial");
        assert_eq!(QualityRating::Sloppy.as_str(), "sloppy");
        assert_eq!(FatigueProfile::F2.as_str(), "F2");
    }

    #[test]
    fn test_from_str_is_strict() {
        assert!(DomainType::from_str("technique").is_err());
        assert!(SessionType::from_str("NORMAL").is_err());
        assert!(CompletionStatus::from_str("done").is_err());
        assert!(QualityRating::from_str("").is_err());
    }

    #[test]
    fn test_round_trip() {
        for s in ["normal", "light", "heavy", "deload"] {
            assert_eq!(SessionType::from_str(s).unwrap().as_str(), s);
        }
        for s in ["yes", "partial", "no"] {
            assert_eq!(CompletionStatus::from_str(s).unwrap().as_str(), s);
        }
    }
}
