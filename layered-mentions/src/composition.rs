//! Per-document collection of accepted and rejected annotation variables.
//!
//! Accepted variables are keyed by span signature. When two satisfied
//! variables cover the same spans, the one whose category is a strict
//! subclass of the other's wins; otherwise the first one offered stays.

use std::collections::BTreeMap;

use layered_context::Span;
use layered_schema::Schema;
use log::debug;
use serde::Serialize;

use crate::AnnotationVariable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RejectionReason {
    /// The category's definition did not hold
    Unsatisfied,
    /// Another variable over the same spans was kept
    Superseded { by: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedVariable {
    pub variable: AnnotationVariable,
    pub reason: RejectionReason,
}

/// Outcome of [`Composition::offer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Accepted,
    /// Accepted, pushing out the previous holder of the signature
    Replaced,
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Composition {
    pub document: String,
    /// Span signature key -> accepted variable
    pub accepted: BTreeMap<String, AnnotationVariable>,
    pub rejected: Vec<RejectedVariable>,
}

/// `start-end` pairs joined by commas.
pub fn signature_key(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|s| format!("{}-{}", s.start, s.end))
        .collect::<Vec<_>>()
        .join(",")
}

impl Composition {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            ..Self::default()
        }
    }

    pub fn offer(&mut self, schema: &Schema, variable: AnnotationVariable) -> Offer {
        if !variable.satisfied {
            self.rejected.push(RejectedVariable {
                variable,
                reason: RejectionReason::Unsatisfied,
            });
            return Offer::Rejected;
        }

        let key = signature_key(&variable.span_signature());
        let kept = match self.accepted.get(&key) {
            None => {
                self.accepted.insert(key, variable);
                return Offer::Accepted;
            }
            Some(kept) => kept,
        };

        if schema.is_strict_subclass(&variable.category, &kept.category) {
            debug!("{} supersedes {} at {}", variable.category, kept.category, key);
            let by = variable.category.clone();
            if let Some(previous) = self.accepted.insert(key, variable) {
                self.rejected.push(RejectedVariable {
                    variable: previous,
                    reason: RejectionReason::Superseded { by },
                });
            }
            Offer::Replaced
        } else {
            let by = kept.category.clone();
            self.rejected.push(RejectedVariable {
                variable,
                reason: RejectionReason::Superseded { by },
            });
            Offer::Rejected
        }
    }

    /// Accepted variables in signature-key order.
    pub fn variables(&self) -> impl Iterator<Item = &AnnotationVariable> {
        self.accepted.values()
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
