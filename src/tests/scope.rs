use crate::modifier::{
    HISTORICAL_TEMPORALITY, NEGATIVE_POLARITY, POLARITY, POSITIVE_POLARITY, TEMPORALITY,
};
use crate::{
    AcceptAll, Concept, ContextConfig, ContextResolver, Mention, ModifierRule, Sentence,
    SentenceDisplay, Span,
};

fn phrase(text: &str, offset: usize, words: &str, concept: Concept) -> Mention {
    let start = text.find(words).unwrap();
    Mention::new(vec![Span::new(offset + start, offset + start + words.len())], concept)
}

fn negation(code: &str) -> Concept {
    Concept::new(code)
        .with_parent("LinguisticModifier")
        .with_ancestor("Modifier")
        .with_value(POLARITY, NEGATIVE_POLARITY)
}

fn finding(code: &str) -> Concept {
    Concept::new(code).with_parent("Finding")
}

fn conjunction(code: &str) -> Concept {
    Concept::new(code).with_parent("Conjunction").with_action("terminate")
}

fn polarity_config() -> ContextConfig {
    ContextConfig::new()
        .with_default(POLARITY, POSITIVE_POLARITY)
        .with_rule(
            POLARITY,
            ModifierRule::forward().with_window(5).terminated_by("Conjunction"),
        )
}

fn resolve(config: ContextConfig, offset: usize, text: &str, mentions: Vec<(&str, Concept)>) -> Sentence {
    let mentions = mentions
        .into_iter()
        .map(|(words, concept)| phrase(text, offset, words, concept));
    let mut sentence = Sentence::new(offset, text).with_mentions(mentions);
    ContextResolver::new(config).resolve_sentence(&mut sentence);
    sentence
}

fn test_resolved(config: ContextConfig, text: &str, mentions: Vec<(&str, Concept)>) -> String {
    let sentence = resolve(config, 0, text, mentions);
    SentenceDisplay::new(&sentence)
        .with_mentions()
        .with_modifiers()
        .to_string()
}

#[test]
fn terminator_stops_negation() {
    insta::assert_snapshot!(test_resolved(
        polarity_config(),
        "no evidence of effusion but edema noted",
        vec![
            ("no", negation("no")),
            ("effusion", finding("effusion")),
            ("but", conjunction("but")),
            ("edema", finding("edema")),
        ],
    ), @r###"
    no evidence of effusion but edema noted
    ╰╯no
                   ╰──────╯effusion(Negative_Polarity)
                            ╰─╯but
                                ╰───╯edema
    "###);
}

#[test]
fn without_terminator_window_reaches_fifth_word() {
    let sentence = resolve(
        polarity_config(),
        0,
        "no evidence of effusion or edema noted",
        vec![
            ("no", negation("no")),
            ("effusion", finding("effusion")),
            ("edema", finding("edema")),
        ],
    );
    assert!(sentence.mentions[1].is_negated());
    assert!(sentence.mentions[2].is_negated());
}

#[test]
fn terminator_for_other_type_is_ignored() {
    let config = ContextConfig::new()
        .with_default(POLARITY, POSITIVE_POLARITY)
        .with_rule(POLARITY, ModifierRule::forward().with_window(5).terminated_by("Experiencer"));
    let sentence = resolve(
        config,
        0,
        "no effusion but edema",
        vec![
            ("no", negation("no")),
            ("effusion", finding("effusion")),
            ("but", conjunction("but")),
            ("edema", finding("edema")),
        ],
    );
    assert!(sentence.mentions[3].is_negated());
}

#[test]
fn sentence_offset_is_respected() {
    let sentence = resolve(
        polarity_config(),
        250,
        "no evidence of effusion but edema noted",
        vec![
            ("no", negation("no")),
            ("effusion", finding("effusion")),
            ("but", conjunction("but")),
            ("edema", finding("edema")),
        ],
    );
    assert_eq!(sentence.mention_text(&sentence.mentions[1]), "effusion");
    assert!(sentence.mentions[1].is_negated());
    assert!(!sentence.mentions[3].is_negated());
}

#[test]
fn every_target_gets_its_own_modifier() {
    let sentence = resolve(
        polarity_config(),
        0,
        "no effusion or edema",
        vec![
            ("no", negation("no")),
            ("effusion", finding("effusion")),
            ("edema", finding("edema")),
        ],
    );
    let a = sentence.mentions[1].modifier(POLARITY).unwrap();
    let b = sentence.mentions[2].modifier(POLARITY).unwrap();
    assert_eq!(a, b);
    assert!(!std::ptr::eq(a, b));
    assert_eq!(a.spans(), &[Span::new(0, 2)]);
}

#[test]
fn longer_cue_supersedes_contained_cue() {
    let config = ContextConfig::new().with_rule(POLARITY, ModifierRule::forward());
    let sentence = resolve(
        config,
        0,
        "cannot exclude pneumonia",
        vec![
            (
                "cannot exclude",
                Concept::new("cannot exclude")
                    .with_parent("LinguisticModifier")
                    .with_ancestor("Modifier")
                    .with_value(POLARITY, POSITIVE_POLARITY),
            ),
            ("exclude", negation("exclude")),
            ("pneumonia", finding("pneumonia")),
        ],
    );
    let pneumonia = &sentence.mentions[2];
    assert_eq!(pneumonia.code(), "pneumonia");
    assert!(!pneumonia.is_negated());
    assert_eq!(pneumonia.modifier(POLARITY).unwrap().spans(), &[Span::new(0, 14)]);
}

#[test]
fn bidirectional_cue_reaches_both_sides() {
    let config = ContextConfig::new()
        .with_default(POLARITY, POSITIVE_POLARITY)
        .with_cue_rule("negative for", ModifierRule::bidirectional().with_window(2));
    let sentence = resolve(
        config,
        0,
        "biopsy was negative for malignancy today",
        vec![
            ("biopsy", finding("biopsy")),
            ("negative for", negation("negative for")),
            ("malignancy", finding("malignancy")),
        ],
    );
    assert!(sentence.mentions[0].is_negated());
    assert!(sentence.mentions[2].is_negated());
}

#[test]
fn cue_source_reflects_resolved_cue() {
    let config = polarity_config().with_rule(TEMPORALITY, ModifierRule::forward());
    let history = Concept::new("history")
        .with_parent("Modifier")
        .with_value(TEMPORALITY, HISTORICAL_TEMPORALITY);
    let mentions = vec![
        ("no", negation("no")),
        ("history", history),
        ("mass", finding("mass")),
    ];
    let text = "no history of mass";
    let mentions = mentions
        .into_iter()
        .map(|(words, concept)| phrase(text, 0, words, concept));
    let mut sentence = Sentence::new(0, text).with_mentions(mentions);
    ContextResolver::new(config)
        .with_validator(AcceptAll)
        .resolve_sentence(&mut sentence);

    let mass = &sentence.mentions[2];
    assert!(mass.is_historical());
    let source = mass.modifier(TEMPORALITY).unwrap().source.as_ref().unwrap();
    assert_eq!(source.code(), "history");
    assert!(source.is_negated());
}
