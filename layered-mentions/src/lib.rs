#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Annotation assembly over context-resolved mentions.
//!
//! Runs `layered-context` scope resolution on a [`Document`], then turns the
//! anchor mentions of each sentence into annotation variables whose categories
//! come from a `layered-schema` [`Schema`]. Each variable is either accepted
//! into the document's [`Composition`] or rejected with a reason.
//!
//! ```text
//! no   evidence   of   effusion
//! ╰╯NegationCue        ╰──────╯Effusion(Negative_Polarity)
//!
//! signature 0-2,15-23: NegatedFinding accepted, FindingAnnotation superseded
//! ```
//!
//! ## Core Types
//!
//! - [`DomainModel`] - Schema plus context rules, loadable from RON
//! - [`SchemaValidator`] - Decides which cues may modify which targets
//! - [`AnchorBuilder`] / [`Anchor`] - Anchors, including compound anchors
//! - [`VariableAssembler`] / [`AnnotationVariable`] - One candidate annotation per anchor and category
//! - [`Composition`] - Accepted variables by span signature, plus rejections
//! - [`MentionPipeline`] - Runs all of the above per document
//!
//! [`Document`]: layered_context::Document
//! [`Schema`]: layered_schema::Schema

mod anchor;
mod composition;
pub mod domain;
mod errors;
mod pipeline;
mod validator;
mod variable;

pub use anchor::{Anchor, AnchorBuilder};
pub use composition::{signature_key, Composition, Offer, RejectedVariable, RejectionReason};
pub use domain::{CompoundCategory, CompoundSlot, DomainDef, DomainModel};
pub use errors::{MentionsError, MentionsResult};
pub use pipeline::MentionPipeline;
pub use validator::SchemaValidator;
pub use variable::{span_signature, AnnotationVariable, PropertyValue, VariableAssembler};
