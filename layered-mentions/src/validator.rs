//! Schema-backed [`ModifierValidator`].

use std::sync::Arc;

use layered_context::{Mention, ModifierValidator};
use log::trace;

use crate::domain::{DomainModel, HAS_MODIFIER};

/// Admits a cue for a target when the schema gives the cue somewhere to go.
///
/// That is either a `hasModifier` restriction on one of the annotation
/// categories the target anchors, or a `hasModifier` property declared on
/// the target's own class.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    domain: Arc<DomainModel>,
}

impl SchemaValidator {
    pub fn new(domain: Arc<DomainModel>) -> Self {
        Self { domain }
    }

    /// Classes a cue can be matched on: its own class and the values it asserts.
    fn cue_classes<'m>(&self, cue: &'m Mention) -> Vec<&'m str> {
        let mut out: Vec<&str> = self.domain.concept_class(cue).into_iter().collect();
        for value in cue.concept.values.values() {
            if self.domain.schema().category(value).is_some() && !out.contains(&value.as_str()) {
                out.push(value);
            }
        }
        out
    }

    fn admits_via_annotations(&self, cue_classes: &[&str], target_class: &str) -> bool {
        let schema = self.domain.schema();
        self.domain
            .annotation_categories(target_class)
            .into_iter()
            .any(|category| {
                schema
                    .restrictions_on(category, HAS_MODIFIER)
                    .iter()
                    .filter(|r| schema.domain_admits(r.property, category))
                    .any(|r| {
                        r.filler_classes()
                            .iter()
                            .any(|filler| cue_classes.iter().any(|c| schema.is_a(c, filler)))
                    })
            })
    }

    fn admits_via_own_properties(&self, cue_classes: &[&str], target_class: &str) -> bool {
        let schema = self.domain.schema();
        schema
            .subproperties(HAS_MODIFIER)
            .into_iter()
            .filter_map(|name| schema.property(name))
            .filter(|p| !p.domain.is_empty() && !p.range.is_empty())
            .filter(|p| p.domain.iter().any(|d| schema.is_a(target_class, d)))
            .any(|p| cue_classes.iter().any(|c| schema.range_admits(&p.name, c)))
    }
}

impl ModifierValidator for SchemaValidator {
    fn is_applicable(&self, cue: &Mention, target: &Mention) -> bool {
        let target_class = match self.domain.concept_class(target) {
            Some(class) => class,
            None => return false,
        };
        let cue_classes = self.cue_classes(cue);
        if cue_classes.is_empty() {
            return false;
        }
        let admitted = self.admits_via_annotations(&cue_classes, target_class)
            || self.admits_via_own_properties(&cue_classes, target_class);
        trace!(
            "{} -> {}: {}",
            cue.code(),
            target.code(),
            if admitted { "applicable" } else { "not applicable" }
        );
        admitted
    }
}
