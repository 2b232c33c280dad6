//! Connector entities: techniques and overload dimensions.
//!
//! Both are pure link targets with no owned state - deleting one removes
//! its association rows, never the entities on the other side.

use serde::{Deserialize, Serialize};

/// A musical technique (e.g., "string skipping", "alternate picking").
///
/// Technique mastery is inferred from exercise performance elsewhere, not
/// tracked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technique {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// An axis along which an exercise gets progressively harder
/// (e.g., "tempo", "duration", "complexity").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverloadDimension {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Partial update shared by both connector entities.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectorUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the stored value; an absent field leaves it alone.
    #[serde(default, deserialize_with = "crate::model::nullable_field")]
    pub description: Option<Option<String>>,
}
