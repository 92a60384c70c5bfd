//! The schema and context rules for one annotation domain.
//!
//! A [`DomainModel`] is read-only after construction and shared by every
//! document the pipeline processes. Derived tables, such as the argument
//! slots of each compound category, are computed on first use.

use std::fs;
use std::path::Path;

use layered_context::{ContextConfig, Mention};
use layered_schema::{Schema, SchemaDef};
use log::debug;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::{MentionsError, MentionsResult};

// ============================================================================
// Schema vocabulary
// ============================================================================

pub const ANCHOR: &str = "Anchor";
pub const COMPOUND_ANCHOR: &str = "CompoundAnchor";
pub const ANNOTATION: &str = "Annotation";
pub const MODIFIER: &str = "Modifier";
pub const LINGUISTIC_MODIFIER: &str = "LinguisticModifier";
/// Marker class every assembled variable points at through [`HAS_ANNOTATION_TYPE`]
pub const MENTION_ANNOTATION: &str = "MentionAnnotation";

pub const HAS_ANCHOR: &str = "hasAnchor";
pub const HAS_MODIFIER: &str = "hasModifier";
pub const HAS_ANNOTATION_TYPE: &str = "hasAnnotationType";
/// Generic argument slot; the numbered slots are its sub-properties
pub const HAS_COMPOUND_ARGUMENT: &str = "hasCompoundArgument";
/// Number of numbered argument slots a compound binds before overflowing
pub const COMPOUND_SLOTS: usize = 5;

/// One argument slot of a compound category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSlot {
    pub property: String,
    /// Classes the slot's restrictions name
    pub classes: Vec<String>,
}

/// A category under [`COMPOUND_ANCHOR`] with its argument slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundCategory {
    pub class: String,
    pub slots: Vec<CompoundSlot>,
}

/// Authored form of a domain, loadable from RON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainDef {
    pub schema: SchemaDef,
    pub context: ContextConfig,
}

#[derive(Debug)]
pub struct DomainModel {
    schema: Schema,
    context: ContextConfig,
    anchor_of: String,
    compounds: OnceCell<Vec<CompoundCategory>>,
}

impl DomainModel {
    /// Check that the roots the pipeline depends on are present.
    pub fn new(schema: Schema, context: ContextConfig) -> MentionsResult<Self> {
        for root in [ANCHOR, ANNOTATION, MODIFIER] {
            schema.require(root)?;
        }
        if schema.property(HAS_ANCHOR).is_none() {
            return Err(MentionsError::Terminology {
                concept: HAS_ANCHOR.to_string(),
                reason: "property is not declared".to_string(),
            });
        }
        context.validate()?;

        let anchor_of = schema
            .inverse_of(HAS_ANCHOR)
            .ok_or_else(|| MentionsError::Terminology {
                concept: HAS_ANCHOR.to_string(),
                reason: "no inverse property name".to_string(),
            })?;

        Ok(Self {
            schema,
            context,
            anchor_of,
            compounds: OnceCell::new(),
        })
    }

    pub fn from_def(def: DomainDef) -> MentionsResult<Self> {
        let schema = Schema::compile(def.schema)?;
        Self::new(schema, def.context)
    }

    pub fn from_ron_str(text: &str) -> MentionsResult<Self> {
        let def: DomainDef = ron::from_str(text)?;
        Self::from_def(def)
    }

    pub fn load(path: &Path) -> MentionsResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| MentionsError::Load {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_ron_str(&text)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn context(&self) -> &ContextConfig {
        &self.context
    }

    /// Name of the inverse of [`HAS_ANCHOR`], normally `isAnchorOf`.
    pub fn anchor_of(&self) -> &str {
        &self.anchor_of
    }

    /// Schema class of a mention: its concept code when declared, else its first declared parent.
    pub fn concept_class<'m>(&self, mention: &'m Mention) -> Option<&'m str> {
        let concept = &mention.concept;
        if self.schema.category(&concept.code).is_some() {
            return Some(&concept.code);
        }
        concept
            .parents
            .iter()
            .find(|p| self.schema.category(p).is_some())
            .map(String::as_str)
    }

    pub fn is_anchor(&self, mention: &Mention) -> bool {
        self.concept_class(mention)
            .map_or(false, |class| self.schema.is_a(class, ANCHOR))
    }

    /// Annotation categories an anchor of `class` can produce.
    ///
    /// These are the targets of the class's `isAnchorOf` restrictions. A class
    /// without any falls back to the annotation categories whose `hasAnchor`
    /// restrictions admit it.
    pub fn annotation_categories(&self, class: &str) -> Vec<&str> {
        let schema = &self.schema;
        let mut out: Vec<&str> = Vec::new();
        for restriction in schema.restrictions_on(class, &self.anchor_of) {
            for target in restriction.filler_classes() {
                if schema.is_a(target, ANNOTATION) && !out.contains(&target) {
                    out.push(target);
                }
            }
        }
        if !out.is_empty() {
            return out;
        }

        schema
            .categories()
            .filter(|c| schema.is_strict_subclass(&c.name, ANNOTATION))
            .filter(|c| {
                schema
                    .restrictions_on(&c.name, HAS_ANCHOR)
                    .iter()
                    .any(|r| r.filler_classes().iter().any(|f| *f != ANCHOR && schema.is_a(class, f)))
            })
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Compound categories in declaration order, computed once.
    pub fn compound_categories(&self) -> &[CompoundCategory] {
        self.compounds.get_or_init(|| {
            let schema = &self.schema;
            let compounds: Vec<CompoundCategory> = schema
                .subclasses(COMPOUND_ANCHOR)
                .into_iter()
                .filter_map(|class| {
                    let mut slots: Vec<CompoundSlot> = Vec::new();
                    for r in schema.restrictions_on(class, HAS_COMPOUND_ARGUMENT) {
                        let classes = r.filler_classes().into_iter().map(String::from);
                        match slots.iter_mut().find(|s| s.property == r.property) {
                            Some(slot) => {
                                for c in classes {
                                    if !slot.classes.contains(&c) {
                                        slot.classes.push(c);
                                    }
                                }
                            }
                            None => slots.push(CompoundSlot {
                                property: r.property.to_string(),
                                classes: classes.collect(),
                            }),
                        }
                    }
                    if slots.is_empty() {
                        None
                    } else {
                        Some(CompoundCategory {
                            class: class.to_string(),
                            slots,
                        })
                    }
                })
                .collect();
            debug!("{} compound categories", compounds.len());
            compounds
        })
    }
}
