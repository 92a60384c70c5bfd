//! Document driver: context resolution, then anchors and annotation variables.
//!
//! Sentences are resolved independently (in parallel with the `parallel`
//! feature). Assembly starts only after every sentence is resolved, so
//! cross-sentence cues see the final state of the whole document.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use layered_context::{ContextResolver, Document, GlobalCue, GlobalModifierResolver, ModifierValidator};
use layered_schema::InstanceArena;
use log::{debug, info, warn};

use crate::{
    AnchorBuilder, Composition, DomainModel, MentionsError, MentionsResult, SchemaValidator,
    VariableAssembler,
};

#[derive(Debug, Clone)]
pub struct MentionPipeline {
    domain: Arc<DomainModel>,
    resolver: ContextResolver,
    global: GlobalModifierResolver,
}

impl MentionPipeline {
    /// A pipeline validating modifiers against the domain's schema.
    pub fn new(domain: Arc<DomainModel>) -> Self {
        let validator: Arc<dyn ModifierValidator> = Arc::new(SchemaValidator::new(Arc::clone(&domain)));
        Self::with_validator(domain, validator)
    }

    pub fn with_validator(domain: Arc<DomainModel>, validator: Arc<dyn ModifierValidator>) -> Self {
        let resolver = ContextResolver::new(domain.context().clone()).with_shared_validator(Arc::clone(&validator));
        Self {
            domain,
            resolver,
            global: GlobalModifierResolver::new(Some(validator)),
        }
    }

    pub fn domain(&self) -> &DomainModel {
        &self.domain
    }

    pub fn process(&self, document: &mut Document) -> MentionsResult<Composition> {
        self.process_with_cancel(document, &AtomicBool::new(false))
    }

    /// Like [`MentionPipeline::process`], checking `cancel` between sentences.
    pub fn process_with_cancel(&self, document: &mut Document, cancel: &AtomicBool) -> MentionsResult<Composition> {
        let globals = self.resolve_sentences(document, cancel)?;
        let document: &Document = document;

        let schema = self.domain.schema();
        let builder = AnchorBuilder::new(&self.domain);
        let mut assembler = VariableAssembler::new(&self.domain);
        let mut arena = InstanceArena::new();
        let mut composition = Composition::new(document.name.as_str());

        for sentence in &document.sentences {
            if cancel.load(Ordering::Relaxed) {
                return Err(MentionsError::Cancelled);
            }
            let anchors = builder.build(&mut arena, &sentence.mentions)?;
            for anchor in &anchors {
                let global = self.global.resolve(&globals, &anchor.mention, document);
                for category in self.domain.annotation_categories(&anchor.class) {
                    let variable = assembler.assemble(&mut arena, anchor, category, &global)?;
                    composition.offer(schema, variable);
                }
            }
        }

        info!(
            "{}: {} accepted, {} rejected",
            document.name,
            composition.len(),
            composition.rejected.len()
        );
        Ok(composition)
    }

    #[cfg(not(feature = "parallel"))]
    fn resolve_sentences(&self, document: &mut Document, cancel: &AtomicBool) -> MentionsResult<Vec<GlobalCue>> {
        let mut globals = Vec::new();
        for sentence in document.sentences.iter_mut() {
            if cancel.load(Ordering::Relaxed) {
                return Err(MentionsError::Cancelled);
            }
            globals.extend(self.resolver.resolve_sentence(sentence));
        }
        debug!("{}: {} cross-sentence cues", document.name, globals.len());
        Ok(globals)
    }

    #[cfg(feature = "parallel")]
    fn resolve_sentences(&self, document: &mut Document, cancel: &AtomicBool) -> MentionsResult<Vec<GlobalCue>> {
        use rayon::prelude::*;

        let per_sentence: Vec<Vec<GlobalCue>> = document
            .sentences
            .par_iter_mut()
            .map(|sentence| {
                if cancel.load(Ordering::Relaxed) {
                    return Err(MentionsError::Cancelled);
                }
                Ok(self.resolver.resolve_sentence(sentence))
            })
            .collect::<MentionsResult<_>>()?;
        let globals: Vec<GlobalCue> = per_sentence.into_iter().flatten().collect();
        debug!("{}: {} cross-sentence cues", document.name, globals.len());
        Ok(globals)
    }

    /// Process each document on its own; a failure is logged and does not affect the others.
    pub fn process_batch(&self, documents: &mut [Document]) -> Vec<MentionsResult<Composition>> {
        documents
            .iter_mut()
            .map(|document| {
                let result = self.process(document);
                if let Err(e) = &result {
                    warn!("document {} aborted: {}", document.name, e);
                }
                result
            })
            .collect()
    }
}
