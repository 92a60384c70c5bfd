//! Annotation variables: one candidate annotation per (anchor, category).
//!
//! Assembly materializes the anchor's modifiers as arena instances, attaches
//! each one under every restricted `hasModifier` property whose range admits
//! its value, and evaluates the category definition against the result.

use std::collections::{BTreeMap, HashMap};

use layered_context::{Mention, Modifier, Span};
use layered_schema::{InstanceArena, InstanceId};
use log::trace;
use serde::Serialize;

use crate::anchor::Anchor;
use crate::domain::{
    DomainModel, HAS_ANCHOR, HAS_ANNOTATION_TYPE, HAS_MODIFIER, LINGUISTIC_MODIFIER,
    MENTION_ANNOTATION, MODIFIER,
};
use crate::{MentionsError, MentionsResult};

/// A modifier instance recorded under one property of a variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyValue {
    pub modifier_type: String,
    /// Class of the materialized instance (the modifier value)
    pub value: String,
    pub is_default: bool,
    pub instance: InstanceId,
    /// Spans of the cue backing the value; empty for defaults
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationVariable {
    pub category: String,
    pub anchor: Anchor,
    pub instance: InstanceId,
    /// Property name -> values attached under it
    pub properties: BTreeMap<String, Vec<PropertyValue>>,
    pub satisfied: bool,
}

impl AnnotationVariable {
    /// Ordered union of the anchor's spans and every attached modifier's spans.
    pub fn span_signature(&self) -> Vec<Span> {
        span_signature(self.anchor.spans(), self.properties.values().flatten())
    }

    pub fn values(&self, property: &str) -> &[PropertyValue] {
        self.properties.get(property).map(Vec::as_slice).unwrap_or(&[])
    }
}

pub fn span_signature<'a>(
    anchor: &'a [Span],
    values: impl IntoIterator<Item = &'a PropertyValue>,
) -> Vec<Span> {
    let attached = values.into_iter().flat_map(|v| v.spans.iter());
    Span::union_sorted(anchor.iter().chain(attached))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    modifier_type: String,
    value: String,
    spans: Vec<(usize, usize)>,
}

impl MemoKey {
    fn new(modifier: &Modifier) -> Self {
        Self {
            modifier_type: modifier.modifier_type.clone(),
            value: modifier.value.clone(),
            spans: modifier.spans().iter().map(|s| (s.start, s.end)).collect(),
        }
    }
}

/// Builds [`AnnotationVariable`]s against a shared arena.
///
/// Modifier instances are memoised per cue and value, so an anchor offered to
/// several categories reuses them. The memo is dropped whenever the arena's
/// generation moves.
#[derive(Debug)]
pub struct VariableAssembler<'d> {
    domain: &'d DomainModel,
    memo: HashMap<MemoKey, InstanceId>,
    generation: u64,
}

impl<'d> VariableAssembler<'d> {
    pub fn new(domain: &'d DomainModel) -> Self {
        Self {
            domain,
            memo: HashMap::new(),
            generation: 0,
        }
    }

    /// Assemble `category` over `anchor`, with `global` modifiers merged in first.
    pub fn assemble(
        &mut self,
        arena: &mut InstanceArena,
        anchor: &Anchor,
        category: &str,
        global: &[Modifier],
    ) -> MentionsResult<AnnotationVariable> {
        let domain = self.domain;
        let schema = domain.schema();
        schema.require(category)?;
        if schema.category(&anchor.class).is_none() || !arena.contains(anchor.instance) {
            return Err(MentionsError::Terminology {
                concept: anchor.class.clone(),
                reason: "anchor has no schema instance".to_string(),
            });
        }
        if arena.generation() != self.generation {
            self.memo.clear();
            self.generation = arena.generation();
        }

        let mut anchor = anchor.clone();
        for modifier in global {
            anchor.mention.add_modifier(modifier.clone());
        }

        let instance = arena.create(category, format!("{}_{}", category, arena.len()));
        arena.add_value(instance, HAS_ANCHOR, anchor.instance);
        let marker = match arena.named(MENTION_ANNOTATION) {
            Some(marker) => marker,
            None => arena.create(MENTION_ANNOTATION, MENTION_ANNOTATION),
        };
        arena.add_value(instance, HAS_ANNOTATION_TYPE, marker);

        let materialized: Vec<(&Modifier, InstanceId)> = anchor
            .mention
            .modifiers
            .values()
            .filter_map(|m| self.materialize(arena, m).map(|id| (m, id)))
            .collect();

        let mut properties: BTreeMap<String, Vec<PropertyValue>> = BTreeMap::new();
        for restriction in schema.restrictions_on(category, HAS_MODIFIER) {
            for (modifier, id) in &materialized {
                let attached = properties
                    .get(restriction.property)
                    .map_or(false, |values| values.iter().any(|v| v.instance == *id));
                // any value in range attaches; `satisfies` checks the fillers
                if attached || !schema.range_admits(restriction.property, &modifier.value) {
                    continue;
                }
                arena.add_value(instance, restriction.property, *id);
                properties
                    .entry(restriction.property.to_string())
                    .or_default()
                    .push(PropertyValue {
                        modifier_type: modifier.modifier_type.clone(),
                        value: modifier.value.clone(),
                        is_default: modifier.is_default,
                        instance: *id,
                        spans: modifier.spans().to_vec(),
                    });
            }
        }

        let satisfied = schema.satisfies(category, arena, instance);
        trace!(
            "{} over {}: {}",
            category,
            anchor.class,
            if satisfied { "satisfied" } else { "unsatisfied" }
        );

        Ok(AnnotationVariable {
            category: category.to_string(),
            anchor,
            instance,
            properties,
            satisfied,
        })
    }

    /// Arena instance for a modifier value, shared per cue (or per value for defaults).
    fn materialize(&mut self, arena: &mut InstanceArena, modifier: &Modifier) -> Option<InstanceId> {
        let domain = self.domain;
        let schema = domain.schema();
        if schema.category(&modifier.value).is_none() {
            trace!("no schema class for modifier value {}", modifier.value);
            return None;
        }

        if modifier.is_default {
            let name = format!("{}_default", modifier.value);
            return Some(match arena.named(&name) {
                Some(id) => id,
                None => arena.create(modifier.value.as_str(), name),
            });
        }

        let key = MemoKey::new(modifier);
        if let Some(id) = self.memo.get(&key) {
            return Some(*id);
        }
        let id = arena.create(
            modifier.value.as_str(),
            format!("{}_{}", modifier.value, arena.len()),
        );
        if let Some(cue) = &modifier.source {
            self.attach_nested(arena, id, &modifier.value, cue);
        }
        self.memo.insert(key, id);
        Some(id)
    }

    /// Carry the cue's own asserted modifiers onto the modifier instance, one level deep.
    fn attach_nested(&self, arena: &mut InstanceArena, id: InstanceId, value: &str, cue: &Mention) {
        let schema = self.domain.schema();
        let nested_allowed = self
            .domain
            .concept_class(cue)
            .map_or(false, |class| {
                schema.is_a(class, MODIFIER) && !schema.is_a(class, LINGUISTIC_MODIFIER)
            });
        if !nested_allowed {
            return;
        }

        for nested in cue.asserted_modifiers() {
            if schema.category(&nested.value).is_none() {
                continue;
            }
            let property = schema
                .subproperties(HAS_MODIFIER)
                .into_iter()
                .filter(|p| *p != HAS_MODIFIER)
                .find(|p| {
                    schema.property(p).map_or(false, |def| !def.domain.is_empty())
                        && schema.domain_admits(p, value)
                        && schema.range_admits(p, &nested.value)
                });
            if let Some(property) = property {
                let nested_id = arena.create(
                    nested.value.as_str(),
                    format!("{}_{}", nested.value, arena.len()),
                );
                arena.add_value(id, property, nested_id);
            }
        }
    }
}
