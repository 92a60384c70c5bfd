//! Concept mentions: the units that cues, targets and anchors are made of.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::modifier::{
    merge, Merge, CONTEXTUAL_MODALITY, EXPERIENCER, FAMILY_MEMBER_EXPERIENCER, HEDGED_MODALITY,
    HISTORICAL_TEMPORALITY, NEGATIVE_POLARITY, POLARITY, TEMPORALITY,
};
use crate::{ContextConfig, Modifier, Span, Spannable};

/// A schema concept as reported by the lexical matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    /// Concept code (the schema class id for the concept)
    pub code: String,
    /// Direct parent categories
    #[serde(default)]
    pub parents: BTreeSet<String>,
    /// Every ancestor category, parents included
    #[serde(default)]
    pub ancestors: BTreeSet<String>,
    /// Modifier type -> value this concept asserts when used as a cue
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    /// Sentence-level action tag, e.g. `terminate`
    #[serde(default)]
    pub action: Option<String>,
}

impl Concept {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            parents: BTreeSet::new(),
            ancestors: BTreeSet::new(),
            values: BTreeMap::new(),
            action: None,
        }
    }

    /// Add a direct parent, which is also an ancestor.
    pub fn with_parent(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.ancestors.insert(category.clone());
        self.parents.insert(category);
        self
    }

    pub fn with_ancestor(mut self, category: impl Into<String>) -> Self {
        self.ancestors.insert(category.into());
        self
    }

    /// Declare the value this concept asserts for a modifier type.
    pub fn with_value(mut self, modifier_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(modifier_type.into(), value.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// True for the concept itself or any of its ancestors.
    pub fn is_type_of(&self, category: &str) -> bool {
        self.code == category || self.ancestors.contains(category)
    }
}

/// A concept occurrence backed by one or more disjoint spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    /// Ordered, non-overlapping spans
    pub spans: Vec<Span>,
    pub concept: Concept,
    /// Index of the owning sentence within its document
    pub sentence: Option<usize>,
    /// At most one accepted modifier per type
    pub modifiers: BTreeMap<String, Modifier>,
}

impl Mention {
    pub fn new(mut spans: Vec<Span>, concept: Concept) -> Self {
        spans.sort();
        spans.dedup();
        Self {
            spans,
            concept,
            sentence: None,
            modifiers: BTreeMap::new(),
        }
    }

    pub fn with_sentence(mut self, sentence: usize) -> Self {
        self.sentence = Some(sentence);
        self
    }

    /// Group the spans of one matcher hit into mentions.
    ///
    /// `search` is the sentence text starting at document offset `base`, and
    /// `matched_terms` are the words of the dictionary term that matched. A
    /// hit that repeats term words is split into one mention per window of
    /// `(max_word_gap + 1) * (terms - 1) + 1` words that holds every term word.
    /// When no window qualifies, all spans stay together in one mention.
    pub fn from_match(
        concept: &Concept,
        spans: &[Span],
        search: &str,
        base: usize,
        matched_terms: &[&str],
        max_word_gap: usize,
    ) -> Vec<Mention> {
        let all = || vec![Mention::new(spans.to_vec(), concept.clone())];

        let term_words: BTreeSet<String> =
            matched_terms.iter().map(|w| w.to_lowercase()).collect();
        if spans.len() <= 1 || term_words.len() <= 1 || spans.len() == matched_terms.len() {
            return all();
        }

        let words: Vec<(Span, String)> = search
            .unicode_word_indices()
            .map(|(i, w)| (Span::new(base + i, base + i + w.len()), w.to_lowercase()))
            .collect();
        let window = (max_word_gap + 1) * (matched_terms.len() - 1) + 1;

        let mut found: Vec<Mention> = Vec::new();
        for (i, (word_span, word)) in words.iter().enumerate() {
            if !term_words.contains(word) || !spans.contains(word_span) {
                continue;
            }
            let last = (i + window).min(words.len());
            let in_window = &words[i..last];
            if !term_words
                .iter()
                .all(|t| in_window.iter().any(|(_, w)| w == t))
            {
                continue;
            }

            let range = Span::new(word_span.start, in_window[in_window.len() - 1].0.end);
            let grouped: Vec<Span> = spans.iter().filter(|s| range.contains(*s)).copied().collect();
            if grouped.is_empty() || found.iter().any(|m| m.spans == grouped) {
                continue;
            }
            found.push(Mention::new(grouped, concept.clone()));
        }

        if found.is_empty() {
            all()
        } else {
            found
        }
    }

    /// Text of each span joined by single spaces, trimmed.
    ///
    /// `source` is the text beginning at document offset `base`.
    pub fn text(&self, source: &str, base: usize) -> String {
        let parts: Vec<&str> = self
            .spans
            .iter()
            .filter_map(|s| s.slice(source, base))
            .collect();
        parts.join(" ").trim().to_string()
    }

    pub fn code(&self) -> &str {
        &self.concept.code
    }

    pub fn is_type_of(&self, category: &str) -> bool {
        self.concept.is_type_of(category)
    }

    pub fn has_parent(&self, category: &str) -> bool {
        self.concept.parents.contains(category)
    }

    /// Merge `modifier` in through the precedence rule.
    pub fn add_modifier(&mut self, modifier: Modifier) -> Merge {
        let outcome = merge(self.modifiers.get(&modifier.modifier_type), &modifier);
        if outcome.takes_candidate() {
            self.modifiers.insert(modifier.modifier_type.clone(), modifier);
        }
        outcome
    }

    pub fn modifier(&self, modifier_type: &str) -> Option<&Modifier> {
        self.modifiers.get(modifier_type)
    }

    pub fn modifier_value(&self, modifier_type: &str) -> Option<&str> {
        self.modifier(modifier_type).map(|m| m.value.as_str())
    }

    /// Non-default modifiers only.
    pub fn asserted_modifiers(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.values().filter(|m| !m.is_default)
    }

    pub fn is_negated(&self) -> bool {
        self.modifier_value(POLARITY) == Some(NEGATIVE_POLARITY)
    }

    pub fn is_hedged(&self) -> bool {
        self.modifier_value(CONTEXTUAL_MODALITY) == Some(HEDGED_MODALITY)
    }

    pub fn is_historical(&self) -> bool {
        self.modifier_value(TEMPORALITY) == Some(HISTORICAL_TEMPORALITY)
    }

    pub fn is_family_member(&self) -> bool {
        self.modifier_value(EXPERIENCER) == Some(FAMILY_MEMBER_EXPERIENCER)
    }

    /// The cue part of a mention: spans and concept without resolved modifiers.
    pub fn snapshot(&self) -> Arc<Mention> {
        Arc::new(Mention {
            spans: self.spans.clone(),
            concept: self.concept.clone(),
            sentence: self.sentence,
            modifiers: BTreeMap::new(),
        })
    }

    /// Modifiers this mention asserts when acting as a cue, one per declared type.
    ///
    /// Each shares the same `cue` snapshot as its source.
    pub fn cue_modifiers(cue: &Arc<Mention>, config: &ContextConfig) -> Vec<Modifier> {
        cue.concept
            .values
            .iter()
            .map(|(modifier_type, value)| {
                let is_default = config.default_value(modifier_type) == Some(value.as_str());
                Modifier::from_cue(modifier_type, value, is_default, Arc::clone(cue))
            })
            .collect()
    }
}

impl Spannable for Mention {
    fn start(&self) -> usize {
        self.spans.first().map_or(0, |s| s.start)
    }

    fn end(&self) -> usize {
        self.spans.last().map_or(0, |s| s.end)
    }
}
