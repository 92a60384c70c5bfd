use std::sync::Arc;

use crate::modifier::{HISTORICAL_TEMPORALITY, TEMPORALITY};
use crate::{
    AcceptAll, Concept, ContextConfig, ContextResolver, Document, GlobalModifierResolver, Mention,
    Modifier, ModifierRule, RejectAll, ScopeLevel, SelectionPolicy, Sentence, Span,
};

fn history_cue(start: usize, code: &str, value: &str) -> Mention {
    Mention::new(
        vec![Span::new(start, start + code.len())],
        Concept::new(code)
            .with_parent("TemporalModifier")
            .with_ancestor("Modifier")
            .with_value(TEMPORALITY, value),
    )
}

// HISTORY: remote history. recent history. mass noted.
// 0        9              25             41
fn document() -> Document {
    let mut doc = Document::new("note");
    let section = doc.add_section(Span::new(0, 52), Some("HISTORY"));
    doc.push_sentence(
        Sentence::new(9, "remote history.")
            .with_section(section)
            .with_mentions([history_cue(9, "remote history", HISTORICAL_TEMPORALITY)]),
    );
    doc.push_sentence(
        Sentence::new(25, "recent history.")
            .with_section(section)
            .with_mentions([history_cue(25, "recent history", "Overlap_DocTimeRel")]),
    );
    doc.push_sentence(
        Sentence::new(41, "mass noted.")
            .with_section(section)
            .with_mentions([Mention::new(
                vec![Span::new(41, 45)],
                Concept::new("mass").with_parent("Finding"),
            )]),
    );
    doc
}

fn config(policy: SelectionPolicy) -> ContextConfig {
    ContextConfig::new()
        .with_default(TEMPORALITY, "Overlap_DocTimeRel")
        .with_rule(
            TEMPORALITY,
            ModifierRule::forward().with_global(ScopeLevel::Section, policy),
        )
}

/// Global modifiers found for the mass, and the mass after merging them.
fn resolve_target(policy: SelectionPolicy) -> (Vec<Modifier>, Mention) {
    let mut doc = document();
    let resolver = ContextResolver::new(config(policy)).with_validator(AcceptAll);
    let cues = resolver.resolve_document(&mut doc);
    assert_eq!(cues.len(), 2);

    let mut target = doc.sentences[2].mentions[0].clone();
    let global = GlobalModifierResolver::new(resolver.validator().cloned());
    let found = global.resolve(&cues, &target, &doc);
    for modifier in found.iter().cloned() {
        target.add_modifier(modifier);
    }
    (found, target)
}

#[test]
fn first_mention_takes_earliest_cue() {
    let (found, target) = resolve_target(SelectionPolicy::FirstMention);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].spans(), &[Span::new(9, 23)]);
    assert!(target.is_historical());
    assert!(!target.modifier(TEMPORALITY).unwrap().is_default);
}

#[test]
fn nearest_mention_takes_closest_cue() {
    let (found, target) = resolve_target(SelectionPolicy::NearestMention);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].spans(), &[Span::new(25, 39)]);
    // the cue's value equals the default, so the seeded default is kept
    assert!(found[0].is_default);
    assert!(!target.is_historical());
    assert!(target.modifier(TEMPORALITY).unwrap().source.is_none());
}

#[test]
fn policies_disagree_on_two_preceding_cues() {
    let (first, _) = resolve_target(SelectionPolicy::FirstMention);
    let (nearest, _) = resolve_target(SelectionPolicy::NearestMention);
    assert_ne!(first[0].value, nearest[0].value);
}

#[test]
fn global_cues_do_not_apply_locally() {
    let mut doc = document();
    ContextResolver::new(config(SelectionPolicy::FirstMention))
        .with_validator(AcceptAll)
        .resolve_document(&mut doc);
    let target = &doc.sentences[2].mentions[0];
    assert_eq!(target.modifier_value(TEMPORALITY), Some("Overlap_DocTimeRel"));
    assert!(target.modifier(TEMPORALITY).unwrap().source.is_none());
}

#[test]
fn rejected_by_validator() {
    let mut doc = document();
    let cues = ContextResolver::new(config(SelectionPolicy::FirstMention)).resolve_document(&mut doc);
    let target = &doc.sentences[2].mentions[0];
    let global = GlobalModifierResolver::new(Some(Arc::new(RejectAll)));
    assert!(global.resolve(&cues, target, &doc).is_empty());
}
