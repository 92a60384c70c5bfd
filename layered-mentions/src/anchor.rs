//! Anchors and compound-anchor assembly.
//!
//! Every mention whose class descends from `Anchor` becomes an [`Anchor`].
//! Compound categories (a laterality and a finding, say) are then built to a
//! fixed point: each attempt is made in the arena after a checkpoint and
//! rolled back when the compound's definition does not hold.
//!
//! ```text
//! left   breast   mass
//! ╰──╯Left        ╰──╯Mass
//! ╰──────────────────╯LeftMass (hasCompoundArgument1: Left, hasCompoundArgument2: Mass)
//! ```

use std::collections::BTreeMap;

use layered_context::{Concept, Mention, Span, Spannable};
use layered_schema::{InstanceArena, InstanceId};
use log::{debug, warn};
use serde::Serialize;

use crate::domain::{
    CompoundCategory, DomainModel, ANCHOR, COMPOUND_SLOTS, HAS_COMPOUND_ARGUMENT,
};
use crate::{MentionsError, MentionsResult};

/// A mention that annotation variables hang off.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anchor {
    pub mention: Mention,
    /// Schema class of the anchor
    pub class: String,
    /// Arena instance standing for the anchor
    pub instance: InstanceId,
    /// Classes of the anchors a compound was built from, in document order
    pub components: Vec<String>,
}

impl Anchor {
    pub fn is_compound(&self) -> bool {
        !self.components.is_empty()
    }

    pub fn spans(&self) -> &[Span] {
        &self.mention.spans
    }
}

/// Finds the anchors of one sentence.
#[derive(Debug, Clone, Copy)]
pub struct AnchorBuilder<'d> {
    domain: &'d DomainModel,
}

impl<'d> AnchorBuilder<'d> {
    pub fn new(domain: &'d DomainModel) -> Self {
        Self { domain }
    }

    /// Simple anchors in mention order, followed by every compound that could be built.
    pub fn build(&self, arena: &mut InstanceArena, mentions: &[Mention]) -> MentionsResult<Vec<Anchor>> {
        let mut anchors: Vec<Anchor> = Vec::new();
        let mut by_class: BTreeMap<String, usize> = BTreeMap::new();

        for mention in mentions {
            let class = match self.domain.concept_class(mention) {
                Some(class) if self.domain.schema().is_a(class, ANCHOR) => class,
                _ => continue,
            };
            if mention.spans.is_empty() {
                return Err(MentionsError::Terminology {
                    concept: mention.code().to_string(),
                    reason: "anchor mention has no spans".to_string(),
                });
            }
            let instance = arena.create(class, format!("{}_{}", class, arena.len()));
            if let Some(previous) = by_class.insert(class.to_string(), anchors.len()) {
                warn!(
                    "two anchors of class {} in one sentence; keeping {:?} over {:?}",
                    class,
                    mention.spans,
                    anchors[previous].mention.spans
                );
            }
            anchors.push(Anchor {
                mention: mention.clone(),
                class: class.to_string(),
                instance,
                components: Vec::new(),
            });
        }

        if anchors.is_empty() {
            return Ok(anchors);
        }

        loop {
            let mut progress = false;
            for compound in self.domain.compound_categories() {
                if by_class.contains_key(&compound.class) {
                    continue;
                }
                if let Some(anchor) = self.try_compound(arena, compound, &anchors, &by_class) {
                    debug!("built compound {} from {:?}", anchor.class, anchor.components);
                    by_class.insert(compound.class.clone(), anchors.len());
                    anchors.push(anchor);
                    progress = true;
                }
            }
            if !progress {
                break;
            }
        }
        Ok(anchors)
    }

    fn try_compound(
        &self,
        arena: &mut InstanceArena,
        compound: &CompoundCategory,
        anchors: &[Anchor],
        by_class: &BTreeMap<String, usize>,
    ) -> Option<Anchor> {
        let schema = self.domain.schema();
        let admits = |slot: usize, class: &str| {
            compound.slots[slot]
                .classes
                .iter()
                .any(|c| schema.is_a(class, c))
        };

        let mut candidates: Vec<&Anchor> = by_class
            .values()
            .map(|&i| &anchors[i])
            .filter(|a| (0..compound.slots.len()).any(|slot| admits(slot, &a.class)))
            .collect();
        if candidates.len() < compound.slots.len() {
            return None;
        }
        candidates.sort_by(|a, b| a.mention.compare_span(&b.mention));

        let checkpoint = arena.checkpoint();
        let instance = arena.create(
            compound.class.as_str(),
            format!("{}_{}", compound.class, arena.len()),
        );
        let mut taken = vec![false; compound.slots.len()];
        for (bound, candidate) in candidates.iter().enumerate() {
            let slot = (0..compound.slots.len())
                .find(|&slot| !taken[slot] && admits(slot, &candidate.class))
                .filter(|_| bound < COMPOUND_SLOTS);
            let property = match slot {
                Some(slot) => {
                    taken[slot] = true;
                    compound.slots[slot].property.as_str()
                }
                None => HAS_COMPOUND_ARGUMENT,
            };
            arena.add_value(instance, property, candidate.instance);
        }

        if !schema.satisfies(&compound.class, arena, instance) {
            arena.rollback(checkpoint);
            return None;
        }

        let spans = Span::union_sorted(candidates.iter().flat_map(|a| a.mention.spans.iter()));
        let mut concept = Concept::new(compound.class.as_str());
        if let Some(category) = schema.category(&compound.class) {
            for parent in &category.parents {
                concept = concept.with_parent(parent.as_str());
            }
            for ancestor in &category.ancestors {
                concept = concept.with_ancestor(ancestor.as_str());
            }
        }
        let mut mention = Mention::new(spans, concept);
        mention.sentence = candidates.first().and_then(|a| a.mention.sentence);
        for candidate in &candidates {
            for modifier in candidate.mention.modifiers.values() {
                mention.add_modifier(modifier.clone());
            }
        }

        Some(Anchor {
            mention,
            class: compound.class.clone(),
            instance,
            components: candidates.iter().map(|a| a.class.clone()).collect(),
        })
    }
}
