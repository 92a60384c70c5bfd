//! Per-sentence modifier propagation.
//!
//! Cues (mentions under the modifier root) push their modifier values onto
//! the mentions inside a word-count window. Windows are cut short by
//! terminators and a cue that overlaps a matching pseudo-trigger does nothing.
//!
//! ```text
//! no   evidence   of   effusion   but   edema   noted
//! ╰╯ cue
//! ╰───────────────────────────╯ forward window (cut at "but")
//!                      ╰──────╯ Negative_Polarity
//! ```

use std::sync::Arc;

use log::{debug, trace};
use unicode_segmentation::UnicodeSegmentation;

use crate::config::ResolvedRule;
use crate::{
    ContextConfig, Document, GlobalCue, Mention, Modifier, Sentence, Span, Spannable,
};

/// Decides whether a cue may modify a target.
///
/// Implementations are usually backed by the schema; they must be shareable
/// across sentences resolved in parallel.
pub trait ModifierValidator: Send + Sync {
    fn is_applicable(&self, cue: &Mention, target: &Mention) -> bool;
}

/// Admits every cue/target pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ModifierValidator for AcceptAll {
    fn is_applicable(&self, _cue: &Mention, _target: &Mention) -> bool {
        true
    }
}

/// Admits nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl ModifierValidator for RejectAll {
    fn is_applicable(&self, _cue: &Mention, _target: &Mention) -> bool {
        false
    }
}

/// Resolved reach of one cue for one modifier type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    cue: Span,
    /// Targets starting in `[cue.start, end)`
    forward: Option<usize>,
    /// Targets starting in `[start, cue.start]`
    backward: Option<usize>,
}

impl Window {
    fn admits(&self, target: &Mention) -> bool {
        let at = target.start();
        let ahead = self
            .forward
            .map_or(false, |end| self.cue.start <= at && at < end);
        let behind = self
            .backward
            .map_or(false, |start| start <= at && at <= self.cue.start);
        ahead || behind
    }
}

/// Runs the per-sentence modifier propagation.
#[derive(Clone)]
pub struct ContextResolver {
    config: ContextConfig,
    validator: Option<Arc<dyn ModifierValidator>>,
}

impl std::fmt::Debug for ContextResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextResolver")
            .field("config", &self.config)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl ContextResolver {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            validator: None,
        }
    }

    pub fn with_validator(self, validator: impl ModifierValidator + 'static) -> Self {
        self.with_shared_validator(Arc::new(validator))
    }

    pub fn with_shared_validator(mut self, validator: Arc<dyn ModifierValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn validator(&self) -> Option<&Arc<dyn ModifierValidator>> {
        self.validator.as_ref()
    }

    /// Resolve every sentence in order, collecting cross-sentence cues.
    pub fn resolve_document(&self, document: &mut Document) -> Vec<GlobalCue> {
        document
            .sentences
            .iter_mut()
            .flat_map(|sentence| self.resolve_sentence(sentence))
            .collect()
    }

    /// Seed defaults, then merge each cue's modifiers into the mentions in its window.
    ///
    /// Cues whose rule is paragraph or section level are returned instead of
    /// applied. Only this sentence's mentions are modified. Modifier sources
    /// are refreshed afterwards so they carry the cue's resolved modifiers.
    pub fn resolve_sentence(&self, sentence: &mut Sentence) -> Vec<GlobalCue> {
        let config = &self.config;
        for mention in sentence.mentions.iter_mut() {
            for (modifier_type, value) in &config.defaults {
                mention.add_modifier(Modifier::default_value(modifier_type, value));
            }
        }

        let bounds = sentence.as_span();
        let words: Vec<Span> = sentence
            .text
            .unicode_word_indices()
            .map(|(i, w)| {
                let start = sentence.offset + i;
                Span::new(start, start + w.len())
            })
            .collect();

        let mentions = &sentence.mentions;
        let mut merges: Vec<(usize, Modifier)> = Vec::new();
        let mut globals = Vec::new();
        let mut snapshots: Vec<(usize, Arc<Mention>)> = Vec::new();

        for (cue_idx, cue) in mentions.iter().enumerate() {
            if !self.is_cue(cue) {
                continue;
            }
            let snapshot = cue.snapshot();
            snapshots.push((cue_idx, Arc::clone(&snapshot)));

            for modifier in Mention::cue_modifiers(&snapshot, config) {
                let rule = config.rule_for(cue.code(), &modifier.modifier_type);
                if self.is_suppressed(cue, cue_idx, &rule, mentions) {
                    debug!(
                        "cue {:?} suppressed for {} by pseudo-trigger",
                        sentence.mention_text(cue),
                        modifier.modifier_type
                    );
                    continue;
                }

                if let Some(scope) = rule.global {
                    globals.push(GlobalCue {
                        mention: Arc::clone(&snapshot),
                        modifier,
                        scope,
                    });
                    continue;
                }

                let window = self.window(cue, cue_idx, &rule, bounds, &words, mentions);
                for (target_idx, target) in mentions.iter().enumerate() {
                    if target_idx == cue_idx || !window.admits(target) {
                        continue;
                    }
                    if self.is_applicable(cue, target) {
                        merges.push((target_idx, modifier.clone()));
                    }
                }
            }
        }

        for (target_idx, modifier) in merges {
            sentence.mentions[target_idx].add_modifier(modifier);
        }

        // point sources at each cue's resolved state (one level deep)
        let resolved: Vec<(Arc<Mention>, Arc<Mention>)> = snapshots
            .into_iter()
            .map(|(idx, snapshot)| (snapshot, Arc::new(sentence.mentions[idx].clone())))
            .collect();
        let refresh = |source: &mut Arc<Mention>| {
            if let Some((_, cue)) = resolved.iter().find(|(s, _)| Arc::ptr_eq(s, source)) {
                *source = Arc::clone(cue);
            }
        };
        for mention in sentence.mentions.iter_mut() {
            for modifier in mention.modifiers.values_mut() {
                if let Some(source) = modifier.source.as_mut() {
                    refresh(source);
                }
            }
        }
        for global in globals.iter_mut() {
            refresh(&mut global.mention);
            if let Some(source) = global.modifier.source.as_mut() {
                refresh(source);
            }
        }
        globals
    }

    fn is_cue(&self, mention: &Mention) -> bool {
        let roots = &self.config.roots;
        mention.is_type_of(&roots.modifier)
            && !mention.is_type_of(&roots.pseudo)
            && !mention.concept.values.is_empty()
    }

    fn is_terminator(&self, mention: &Mention, rule: &ResolvedRule<'_>) -> bool {
        mention.concept.action.as_deref() == Some(self.config.roots.terminate_action.as_str())
            && mention.concept.parents.iter().any(|p| rule.terminated_by(p))
    }

    /// A pseudo-trigger overlapping the cue, with a parent the rule lists, silences it.
    fn is_suppressed(
        &self,
        cue: &Mention,
        cue_idx: usize,
        rule: &ResolvedRule<'_>,
        mentions: &[Mention],
    ) -> bool {
        let pseudo_root = &self.config.roots.pseudo;
        mentions.iter().enumerate().any(|(i, p)| {
            i != cue_idx
                && p.is_type_of(pseudo_root)
                && p.intersects(cue)
                && p.concept.parents.iter().any(|parent| rule.suppressed_by(parent))
        })
    }

    fn is_applicable(&self, cue: &Mention, target: &Mention) -> bool {
        let roots = &self.config.roots;
        if cue.is_type_of(&roots.linguistic_modifier) && !target.is_type_of(&roots.modifier) {
            return true;
        }
        self.validator
            .as_ref()
            .map_or(false, |v| v.is_applicable(cue, target))
    }

    fn window(
        &self,
        cue: &Mention,
        cue_idx: usize,
        rule: &ResolvedRule<'_>,
        bounds: Span,
        words: &[Span],
        mentions: &[Mention],
    ) -> Window {
        let size = rule.window_size;
        let terminators: Vec<&Mention> = mentions
            .iter()
            .enumerate()
            .filter(|(i, m)| *i != cue_idx && self.is_terminator(m, rule))
            .map(|(_, m)| m)
            .collect();

        let forward = rule.direction.forward().then(|| {
            let mut end = words
                .iter()
                .filter(|w| w.start >= cue.end())
                .nth(size.saturating_sub(1))
                .map_or(bounds.end, |w| w.end);
            for t in &terminators {
                if cue.before(*t) && t.start() < end {
                    trace!("forward window of {} cut at {}", cue.code(), t.start());
                    end = t.start();
                }
            }
            end
        });

        let backward = rule.direction.backward().then(|| {
            let mut start = words
                .iter()
                .rev()
                .filter(|w| w.end <= cue.start())
                .nth(size.saturating_sub(1))
                .map_or(bounds.start, |w| w.start);
            for t in &terminators {
                if cue.after(*t) && t.end() > start {
                    trace!("backward window of {} cut at {}", cue.code(), t.end());
                    start = t.end();
                }
            }
            start
        });

        Window {
            cue: cue.as_span(),
            forward,
            backward,
        }
    }
}
