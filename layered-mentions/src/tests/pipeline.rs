use std::fmt::Write;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use layered_context::modifier::{FAMILY_MEMBER_EXPERIENCER, POSITIVE_POLARITY};
use layered_context::{Concept, Document, Mention, Sentence};

use super::fixtures::{anchor, clinical_domain, document, family, negation};
use crate::{signature_key, Composition, MentionPipeline, MentionsError, RejectionReason};

fn pipeline() -> MentionPipeline {
    MentionPipeline::new(Arc::new(clinical_domain()))
}

/// Accepted variables with their attached values, then the rejections.
fn summary(composition: &Composition) -> String {
    let mut out = String::new();
    for (key, variable) in &composition.accepted {
        writeln!(out, "{} {}", key, variable.category).unwrap();
        for (property, values) in &variable.properties {
            for value in values {
                let source = if value.is_default {
                    "default".to_string()
                } else {
                    signature_key(&value.spans)
                };
                writeln!(out, "  {} = {} ({})", property, value.value, source).unwrap();
            }
        }
    }
    for rejected in &composition.rejected {
        let reason = match &rejected.reason {
            RejectionReason::Unsatisfied => "unsatisfied".to_string(),
            RejectionReason::Superseded { by } => format!("superseded by {}", by),
        };
        writeln!(out, "rejected {}: {}", rejected.variable.category, reason).unwrap();
    }
    out.trim_end().to_string()
}

#[test]
fn one_variable_per_category_without_modifiers() {
    let mut doc = document(
        "plain",
        "effusion noted",
        vec![("effusion", anchor("Effusion", "Finding"))],
    );
    let composition = pipeline().process(&mut doc).unwrap();

    let total = composition.len() + composition.rejected.len();
    assert_eq!(total, pipeline().domain().annotation_categories("Effusion").len());
    // only the category that needs a non-default value fails
    assert_eq!(composition.accepted["0-8"].category, "FindingAnnotation");
    assert_eq!(composition.rejected.len(), 1);
    assert_eq!(composition.rejected[0].variable.category, "NegatedFinding");
    assert_eq!(composition.rejected[0].reason, RejectionReason::Unsatisfied);
}

#[test]
fn negated_finding_supersedes_broad_category() {
    let mut doc = document(
        "negated",
        "no evidence of effusion",
        vec![
            ("no", negation()),
            ("effusion", anchor("Effusion", "Finding")),
        ],
    );
    let composition = pipeline().process(&mut doc).unwrap();

    assert!(doc.sentences[0].mentions[1].is_negated());
    assert_eq!(composition.len(), 1);
    let kept = &composition.accepted["0-2,15-23"];
    assert_eq!(kept.category, "NegatedFinding");
    assert_eq!(kept.values("hasPolarity")[0].spans, [layered_context::Span::new(0, 2)]);
    assert_eq!(
        composition.rejected[0].reason,
        RejectionReason::Superseded {
            by: "NegatedFinding".to_string()
        }
    );
}

#[test]
fn experiencer_recorded_on_variable() {
    let mut doc = document(
        "family",
        "mass found in her mother",
        vec![
            ("mass", anchor("Mass", "Finding")),
            ("mother", family()),
        ],
    );
    let composition = pipeline().process(&mut doc).unwrap();

    let kept = composition.variables().next().unwrap();
    assert_eq!(kept.category, "FindingAnnotation");
    let experiencer = kept.values("hasExperiencer");
    assert_eq!(experiencer.len(), 1);
    assert_eq!(experiencer[0].value, FAMILY_MEMBER_EXPERIENCER);
    assert!(!experiencer[0].is_default);
}

#[test]
fn compound_anchor_gets_its_own_variables() {
    let mut doc = document(
        "compound",
        "left breast mass",
        vec![
            ("left", anchor("Left", "Laterality")),
            ("mass", anchor("Mass", "Finding")),
        ],
    );
    let composition = pipeline().process(&mut doc).unwrap();

    let keys: Vec<&str> = composition.accepted.keys().map(String::as_str).collect();
    assert_eq!(keys, ["0-4,12-16", "12-16"]);
    let compound = &composition.accepted["0-4,12-16"];
    assert!(compound.anchor.is_compound());
    assert_eq!(compound.anchor.class, "LeftMass");
}

#[test]
fn negated_effusion_composition() {
    let mut doc = document(
        "negated",
        "no evidence of effusion",
        vec![
            ("no", negation()),
            ("effusion", anchor("Effusion", "Finding")),
        ],
    );
    let composition = pipeline().process(&mut doc).unwrap();

    insta::assert_snapshot!(summary(&composition), @r###"
    0-2,15-23 NegatedFinding
      hasExperiencer = Patient_Experiencer (default)
      hasPolarity = Negative_Polarity (0-2)
    rejected FindingAnnotation: superseded by NegatedFinding
    "###);
}

#[test]
fn unnegated_effusion_keeps_rejected_values() {
    let mut doc = document(
        "plain",
        "effusion noted",
        vec![("effusion", anchor("Effusion", "Finding"))],
    );
    let composition = pipeline().process(&mut doc).unwrap();

    insta::assert_snapshot!(summary(&composition), @r###"
    0-8 FindingAnnotation
      hasExperiencer = Patient_Experiencer (default)
      hasPolarity = Positive_Polarity (default)
    rejected NegatedFinding: unsatisfied
    "###);
    let rejected = &composition.rejected[0].variable;
    assert_eq!(rejected.values("hasPolarity")[0].value, POSITIVE_POLARITY);
}

#[test]
fn output_serializes_to_json() {
    let mut doc = document(
        "json",
        "no effusion",
        vec![
            ("no", negation()),
            ("effusion", anchor("Effusion", "Finding")),
        ],
    );
    let composition = pipeline().process(&mut doc).unwrap();
    let json = composition.to_json().unwrap();
    assert!(json.contains("\"document\": \"json\""));
    assert!(json.contains("\"category\": \"NegatedFinding\""));
    assert!(json.contains("\"Superseded\""));
}

#[test]
fn same_document_same_composition() {
    let source = document(
        "repeat",
        "no mass in the left breast",
        vec![
            ("no", negation()),
            ("mass", anchor("Mass", "Finding")),
            ("left", anchor("Left", "Laterality")),
        ],
    );
    let first = pipeline().process(&mut source.clone()).unwrap();
    let second = pipeline().process(&mut source.clone()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn failing_document_does_not_affect_batch() {
    let good = || {
        document(
            "good",
            "effusion noted",
            vec![("effusion", anchor("Effusion", "Finding"))],
        )
    };
    let mut bad = Document::new("bad");
    bad.push_sentence(Sentence::new(0, "mass").with_mentions(vec![Mention::new(
        Vec::new(),
        Concept::new("Mass").with_parent("Finding"),
    )]));

    let mut batch = vec![good(), bad, good()];
    let results = pipeline().process_batch(&mut batch);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().len(), 1);
    assert!(matches!(results[1], Err(MentionsError::Terminology { .. })));
    assert_eq!(results[2].as_ref().unwrap(), results[0].as_ref().unwrap());
}

#[test]
fn cancelled_before_start() {
    let mut doc = document(
        "cancelled",
        "effusion noted",
        vec![("effusion", anchor("Effusion", "Finding"))],
    );
    let cancel = AtomicBool::new(true);
    let result = pipeline().process_with_cancel(&mut doc, &cancel);
    match result {
        Err(e) => {
            assert!(matches!(e, MentionsError::Cancelled));
            assert!(!e.is_model_error());
        }
        Ok(_) => panic!("expected cancellation"),
    }
}
