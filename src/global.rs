//! Cross-sentence modifiers: cues that act on a whole paragraph or section.
//!
//! The scope resolver hands these cues back instead of applying them. Once
//! every sentence is resolved, each target asks [`GlobalModifierResolver`] for
//! the modifiers that reach it from earlier in its section.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Document, GlobalScope, Mention, Modifier, ModifierValidator, ScopeLevel, Spannable};

/// Which of several qualifying cues of the same type wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SelectionPolicy {
    /// Earliest cue in the scope
    FirstMention,
    /// Closest cue preceding the target
    NearestMention,
}

impl SelectionPolicy {
    /// Order candidates given in document order for consideration.
    pub fn order<T>(self, mut candidates: Vec<T>) -> Vec<T> {
        if self == SelectionPolicy::NearestMention {
            candidates.reverse();
        }
        candidates
    }
}

/// A paragraph or section level cue surfaced by the scope resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalCue {
    pub mention: Arc<Mention>,
    pub modifier: Modifier,
    pub scope: GlobalScope,
}

#[derive(Clone, Default)]
pub struct GlobalModifierResolver {
    validator: Option<Arc<dyn ModifierValidator>>,
}

impl std::fmt::Debug for GlobalModifierResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalModifierResolver")
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl GlobalModifierResolver {
    pub fn new(validator: Option<Arc<dyn ModifierValidator>>) -> Self {
        Self { validator }
    }

    /// Modifiers reaching `target` from cues earlier in its section.
    ///
    /// At most one modifier per (type, scope) bucket, in bucket order.
    pub fn resolve(&self, cues: &[GlobalCue], target: &Mention, document: &Document) -> Vec<Modifier> {
        let validator = match &self.validator {
            Some(v) if !cues.is_empty() => v,
            _ => return Vec::new(),
        };
        let section = match document.section_of(target) {
            Some(section) => section.span,
            None => return Vec::new(),
        };
        let paragraph = document
            .paragraph_of(target)
            .map_or(section, |p| p.span);

        let mut surviving: Vec<&GlobalCue> = cues
            .iter()
            .filter(|cue| {
                let scope = match cue.scope.level {
                    ScopeLevel::Paragraph => paragraph,
                    ScopeLevel::Section => section,
                };
                section.contains(cue.mention.as_ref())
                    && scope.contains(cue.mention.as_ref())
                    && cue.mention.before(target)
            })
            .collect();
        surviving.sort_by(|a, b| a.mention.compare_span(b.mention.as_ref()));

        let mut buckets: BTreeMap<(&str, GlobalScope), Vec<&GlobalCue>> = BTreeMap::new();
        for cue in surviving {
            buckets
                .entry((cue.modifier.modifier_type.as_str(), cue.scope))
                .or_default()
                .push(cue);
        }

        buckets
            .into_iter()
            .filter_map(|((_, scope), bucket)| {
                scope
                    .policy
                    .order(bucket)
                    .into_iter()
                    .find(|cue| validator.is_applicable(&cue.mention, target))
                    .map(|cue| cue.modifier.clone())
            })
            .collect()
    }
}
