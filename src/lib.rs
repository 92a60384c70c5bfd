#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Contextual modifier resolution over concept mentions.
//!
//! Given the mentions a lexical matcher found in each sentence, this crate
//! decides which of them are negated, hedged, historical, about a family
//! member, and so on.
//!
//! ## Core Types
//!
//! - [`Span`] / [`Spannable`] - Offset ranges and the interval contract
//! - [`Mention`] / [`Concept`] - Concept occurrences with their modifiers
//! - [`Modifier`] / [`merge`] - Modifier values and the precedence rule
//! - [`ContextConfig`] - Defaults and propagation rules per modifier type
//! - [`Document`] / [`Sentence`] - Structure delivered by the segmenter
//!
//! ## Resolution
//!
//! - [`ContextResolver`] - Per-sentence directional propagation within a word window
//! - [`GlobalModifierResolver`] - Paragraph and section level cues across sentences
//! - [`SentenceDisplay`] - Underlined rendering of a resolved sentence
//!
//! ## Example
//!
//! ```
//! use layered_context::{Concept, ContextConfig, ContextResolver, Mention, ModifierRule, Sentence, Span};
//!
//! let config = ContextConfig::new()
//!     .with_default("Polarity", "Positive_Polarity")
//!     .with_rule("Polarity", ModifierRule::forward().with_window(5));
//!
//! let no = Concept::new("no")
//!     .with_parent("LinguisticModifier")
//!     .with_ancestor("Modifier")
//!     .with_value("Polarity", "Negative_Polarity");
//! let mass = Concept::new("mass").with_parent("Finding");
//!
//! let mut sentence = Sentence::new(0, "no mass").with_mentions([
//!     Mention::new(vec![Span::new(0, 2)], no),
//!     Mention::new(vec![Span::new(3, 7)], mass),
//! ]);
//! ContextResolver::new(config).resolve_sentence(&mut sentence);
//! assert!(sentence.mentions[1].is_negated());
//! ```

mod config;
mod display;
mod document;
mod errors;
mod global;
mod mention;
pub mod modifier;
mod scope;
mod span;

pub use config::{
    ContextConfig, ContextRoots, Direction, GlobalScope, ModifierRule, ResolvedRule, ScopeLevel,
    DEFAULT_WINDOW_SIZE,
};
pub use display::SentenceDisplay;
pub use document::{Document, Paragraph, Section, Sentence, SentenceKind};
pub use errors::{ContextError, ContextResult};
pub use global::{GlobalCue, GlobalModifierResolver, SelectionPolicy};
pub use mention::{Concept, Mention};
pub use modifier::{merge, Merge, Modifier};
pub use scope::{AcceptAll, ContextResolver, ModifierValidator, RejectAll};
pub use span::{Span, Spannable};
