use crate::modifier::{NEGATIVE_POLARITY, POLARITY, POSITIVE_POLARITY};
use crate::{Concept, ContextConfig, ContextResolver, Mention, ModifierRule, Sentence, Span};

// "no increase in size; no effusion"
//  0 2         12  15   21 24      32
fn sentence() -> Sentence {
    let no = || {
        Concept::new("no")
            .with_parent("LinguisticModifier")
            .with_ancestor("Modifier")
            .with_value(POLARITY, NEGATIVE_POLARITY)
    };
    let pseudo = Concept::new("no increase")
        .with_parent("PseudoNegation")
        .with_ancestor("Pseudo")
        .with_ancestor("Modifier");

    Sentence::new(0, "no increase in size; no effusion").with_mentions([
        Mention::new(vec![Span::new(0, 2)], no()),
        Mention::new(vec![Span::new(0, 11)], pseudo),
        Mention::new(vec![Span::new(15, 19)], Concept::new("size").with_parent("Finding")),
        Mention::new(vec![Span::new(21, 23)], no()),
        Mention::new(vec![Span::new(24, 32)], Concept::new("effusion").with_parent("Finding")),
    ])
}

fn config(pseudo: &str) -> ContextConfig {
    ContextConfig::new()
        .with_default(POLARITY, POSITIVE_POLARITY)
        .with_rule(POLARITY, ModifierRule::forward().with_window(5).suppressed_by(pseudo))
}

fn find<'a>(sentence: &'a Sentence, code: &str) -> &'a Mention {
    sentence.mentions.iter().find(|m| m.code() == code).unwrap()
}

#[test]
fn intersecting_pseudo_trigger_silences_cue() {
    let mut s = sentence();
    ContextResolver::new(config("PseudoNegation")).resolve_sentence(&mut s);

    assert!(!find(&s, "size").is_negated());
    assert!(find(&s, "effusion").is_negated(), "second cue does not touch the pseudo-trigger");
}

#[test]
fn suppressed_cue_contributes_nothing() {
    let mut s = sentence();
    ContextResolver::new(config("PseudoNegation")).resolve_sentence(&mut s);

    let from_first_cue = s
        .mentions
        .iter()
        .flat_map(|m| m.modifiers.values())
        .filter(|m| m.spans() == [Span::new(0, 2)])
        .count();
    assert_eq!(from_first_cue, 0);
}

#[test]
fn unrelated_pseudo_category_does_not_suppress() {
    let mut s = sentence();
    ContextResolver::new(config("PseudoHistory")).resolve_sentence(&mut s);
    assert!(find(&s, "size").is_negated());
}

#[test]
fn pseudo_trigger_is_not_a_cue() {
    let mut s = sentence();
    ContextResolver::new(ContextConfig::new().with_default(POLARITY, POSITIVE_POLARITY))
        .resolve_sentence(&mut s);
    let pseudo = find(&s, "no increase");
    assert_eq!(pseudo.modifier_value(POLARITY), Some(POSITIVE_POLARITY));
}
