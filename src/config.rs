//! Modifier propagation tables: defaults, per-type rules and per-cue overrides.
//!
//! Configuration is opaque lookup data produced from the schema. It can be
//! built in code with the `with_*` methods or loaded from RON:
//!
//! ```text
//! (
//!     defaults: { "Polarity": "Positive_Polarity" },
//!     rules: {
//!         "Polarity": (direction: Forward, window_size: Some(5), termination: ["Conjunction"]),
//!     },
//! )
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ContextError, ContextResult, SelectionPolicy};

/// Window size used when neither the cue nor the type rule declares one.
pub const DEFAULT_WINDOW_SIZE: usize = 8;

/// Direction a cue propagates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
    Bidirectional,
}

impl Direction {
    pub fn forward(self) -> bool {
        matches!(self, Direction::Forward | Direction::Bidirectional)
    }

    pub fn backward(self) -> bool {
        matches!(self, Direction::Backward | Direction::Bidirectional)
    }
}

/// Structural unit a cross-sentence cue reaches over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScopeLevel {
    Paragraph,
    Section,
}

/// Marks a cue as acting on a paragraph or section instead of its sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlobalScope {
    pub level: ScopeLevel,
    pub policy: SelectionPolicy,
}

/// How a cue of one modifier type propagates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierRule {
    pub direction: Direction,
    /// Window in words; `None` inherits
    pub window_size: Option<usize>,
    /// Parent categories of terminators that cut this cue's window
    pub termination: BTreeSet<String>,
    /// Parent categories of pseudo-triggers that suppress this cue
    pub pseudo: BTreeSet<String>,
    /// Present for paragraph or section level cues
    pub global: Option<GlobalScope>,
}

impl ModifierRule {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            ..Default::default()
        }
    }

    pub fn forward() -> Self {
        Self::new(Direction::Forward)
    }

    pub fn backward() -> Self {
        Self::new(Direction::Backward)
    }

    pub fn bidirectional() -> Self {
        Self::new(Direction::Bidirectional)
    }

    pub fn with_window(mut self, words: usize) -> Self {
        self.window_size = Some(words);
        self
    }

    pub fn terminated_by(mut self, category: impl Into<String>) -> Self {
        self.termination.insert(category.into());
        self
    }

    pub fn suppressed_by(mut self, category: impl Into<String>) -> Self {
        self.pseudo.insert(category.into());
        self
    }

    pub fn with_global(mut self, level: ScopeLevel, policy: SelectionPolicy) -> Self {
        self.global = Some(GlobalScope { level, policy });
        self
    }
}

/// Names of the schema roots the resolver tests categories against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextRoots {
    /// Every cue descends from this
    pub modifier: String,
    /// Cues under this apply to any non-modifier target without validation
    pub linguistic_modifier: String,
    /// Pseudo-trigger phrases descend from this
    pub pseudo: String,
    /// Concept action that marks a terminator
    pub terminate_action: String,
}

impl Default for ContextRoots {
    fn default() -> Self {
        Self {
            modifier: "Modifier".to_string(),
            linguistic_modifier: "LinguisticModifier".to_string(),
            pseudo: "Pseudo".to_string(),
            terminate_action: "terminate".to_string(),
        }
    }
}

/// A rule after per-cue overrides and window inheritance are applied.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRule<'a> {
    pub direction: Direction,
    pub window_size: usize,
    pub global: Option<GlobalScope>,
    rule: Option<&'a ModifierRule>,
}

impl ResolvedRule<'_> {
    /// Whether a terminator with this parent category cuts the window.
    pub fn terminated_by(&self, category: &str) -> bool {
        self.rule.map_or(false, |r| r.termination.contains(category))
    }

    /// Whether a pseudo-trigger with this parent category suppresses the cue.
    pub fn suppressed_by(&self, category: &str) -> bool {
        self.rule.map_or(false, |r| r.pseudo.contains(category))
    }
}

/// Defaults and propagation rules for every modifier type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Modifier type -> default value
    pub defaults: BTreeMap<String, String>,
    /// Modifier type -> propagation rule
    pub rules: BTreeMap<String, ModifierRule>,
    /// Cue concept code -> rule overriding the type rule for that cue
    pub cue_rules: BTreeMap<String, ModifierRule>,
    pub roots: ContextRoots,
    pub default_window: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            defaults: BTreeMap::new(),
            rules: BTreeMap::new(),
            cue_rules: BTreeMap::new(),
            roots: ContextRoots::default(),
            default_window: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl ContextConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, modifier_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(modifier_type.into(), value.into());
        self
    }

    pub fn with_rule(mut self, modifier_type: impl Into<String>, rule: ModifierRule) -> Self {
        self.rules.insert(modifier_type.into(), rule);
        self
    }

    pub fn with_cue_rule(mut self, cue_code: impl Into<String>, rule: ModifierRule) -> Self {
        self.cue_rules.insert(cue_code.into(), rule);
        self
    }

    pub fn with_roots(mut self, roots: ContextRoots) -> Self {
        self.roots = roots;
        self
    }

    pub fn with_default_window(mut self, words: usize) -> Self {
        self.default_window = words;
        self
    }

    /// Parse and validate RON configuration text.
    pub fn from_ron_str(text: &str) -> ContextResult<Self> {
        let config: ContextConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a RON configuration file.
    pub fn load(path: &Path) -> ContextResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| ContextError::Load {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_ron_str(&text)
    }

    /// Reject windows that could never reach a target.
    pub fn validate(&self) -> ContextResult<()> {
        if self.default_window == 0 {
            return Err(ContextError::InvalidRule {
                modifier_type: "*".to_string(),
                message: "default window must be at least one word".to_string(),
            });
        }
        for (name, rule) in self.rules.iter().chain(self.cue_rules.iter()) {
            if rule.window_size == Some(0) {
                return Err(ContextError::InvalidRule {
                    modifier_type: name.clone(),
                    message: "window must be at least one word".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn default_value(&self, modifier_type: &str) -> Option<&str> {
        self.defaults.get(modifier_type).map(String::as_str)
    }

    /// The rule a cue follows for one of its modifier types.
    ///
    /// A per-cue rule replaces the type rule; the window comes from the cue
    /// rule, else the type rule, else `default_window`. Types with no rule at
    /// all propagate forward with no terminators.
    pub fn rule_for(&self, cue_code: &str, modifier_type: &str) -> ResolvedRule<'_> {
        let type_rule = self.rules.get(modifier_type);
        let cue_rule = self.cue_rules.get(cue_code);
        let rule = cue_rule.or(type_rule);
        let window_size = cue_rule
            .and_then(|r| r.window_size)
            .or_else(|| type_rule.and_then(|r| r.window_size))
            .unwrap_or(self.default_window);

        ResolvedRule {
            direction: rule.map(|r| r.direction).unwrap_or_default(),
            window_size,
            global: rule.and_then(|r| r.global),
            rule,
        }
    }
}
