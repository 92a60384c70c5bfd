//! Contextual modifiers and the precedence rule that decides which one a
//! mention keeps for each modifier type.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Mention, Span, Spannable};

/// Modifier types used throughout the system.
pub const POLARITY: &str = "Polarity";
pub const EXPERIENCER: &str = "Experiencer";
pub const TEMPORALITY: &str = "Temporality";
pub const CERTAINTY: &str = "Certainty";
pub const CONTEXTUAL_ASPECT: &str = "ContextualAspect";
pub const CONTEXTUAL_MODALITY: &str = "ContextualModality";
pub const DEGREE: &str = "Degree";
pub const PERMANENCE: &str = "Permanence";

pub const MODIFIER_TYPES: [&str; 8] = [
    CERTAINTY,
    CONTEXTUAL_ASPECT,
    CONTEXTUAL_MODALITY,
    DEGREE,
    EXPERIENCER,
    PERMANENCE,
    POLARITY,
    TEMPORALITY,
];

pub const POSITIVE_POLARITY: &str = "Positive_Polarity";
pub const NEGATIVE_POLARITY: &str = "Negative_Polarity";
pub const HEDGED_MODALITY: &str = "Hedged_ContextualModality";
pub const FAMILY_MEMBER_EXPERIENCER: &str = "FamilyMember_Experiencer";
pub const HISTORICAL_TEMPORALITY: &str = "Before_DocTimeRel";

/// A contextual attribute (negation, certainty, experiencer, ...) attached to a mention.
///
/// Every target gets its own `Modifier` value, even when several targets share a cue;
/// only the snapshot of the cue mention is shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    /// Modifier category id (`Polarity`, `Experiencer`, ...)
    pub modifier_type: String,
    /// Value category id (`Negative_Polarity`, ...)
    pub value: String,
    /// True when the value equals the configured default for the type
    pub is_default: bool,
    /// The cue phrase that produced this modifier; `None` for configured defaults
    pub source: Option<Arc<Mention>>,
}

impl Modifier {
    /// A configured default with no backing cue.
    pub fn default_value(modifier_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            modifier_type: modifier_type.into(),
            value: value.into(),
            is_default: true,
            source: None,
        }
    }

    /// A modifier produced by a cue mention.
    pub fn from_cue(
        modifier_type: impl Into<String>,
        value: impl Into<String>,
        is_default: bool,
        cue: Arc<Mention>,
    ) -> Self {
        Self {
            modifier_type: modifier_type.into(),
            value: value.into(),
            is_default,
            source: Some(cue),
        }
    }

    /// Backing spans of the cue, empty for defaults.
    pub fn spans(&self) -> &[Span] {
        self.source
            .as_deref()
            .map(|m| m.spans.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `candidate` should replace `self` for the same type.
    pub fn is_superseded_by(&self, candidate: &Modifier) -> bool {
        if self.is_default && !candidate.is_default {
            return true;
        }
        match (&candidate.source, &self.source) {
            (Some(new), Some(old)) => new.contains(old.as_ref()),
            _ => false,
        }
    }
}

/// Outcome of [`merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Merge {
    /// Nothing recorded for the type yet
    Accept,
    /// The candidate supersedes the recorded modifier
    Replace,
    /// The recorded modifier stays
    Keep,
}

impl Merge {
    /// Whether the candidate ends up stored.
    pub fn takes_candidate(self) -> bool {
        !matches!(self, Merge::Keep)
    }
}

/// Pure precedence rule deciding which modifier a mention keeps for one type.
///
/// 1. nothing recorded yet: the candidate is accepted
/// 2. a default loses to a non-default, and a shorter cue loses to a cue that contains it
/// 3. otherwise the existing entry stays
pub fn merge(existing: Option<&Modifier>, candidate: &Modifier) -> Merge {
    match existing {
        None => Merge::Accept,
        Some(old) if old.is_superseded_by(candidate) => Merge::Replace,
        Some(_) => Merge::Keep,
    }
}
