//! Restriction expression trees.
//!
//! Category definitions are closed trees of class membership, boolean and
//! property-quantifier nodes, evaluated by [`crate::Schema::evaluate`].

use serde::{Deserialize, Serialize};

/// A class expression over instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// The instance belongs to this class or a subclass
    Class(String),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    /// Closed-world negation
    Not(Box<Expr>),
    /// At least one value of `property` satisfies `filler`
    Exists { property: String, filler: Box<Expr> },
    /// Every value of `property` satisfies `filler`
    Forall { property: String, filler: Box<Expr> },
    AtLeast { property: String, count: usize, filler: Box<Expr> },
    AtMost { property: String, count: usize, filler: Box<Expr> },
    Exactly { property: String, count: usize, filler: Box<Expr> },
}

/// Quantifier of a property restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    Exists,
    Forall,
    AtLeast(usize),
    AtMost(usize),
    Exactly(usize),
}

/// Borrowed view of one property restriction inside an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restriction<'a> {
    pub property: &'a str,
    pub quantifier: Quantifier,
    pub filler: &'a Expr,
}

impl<'a> Restriction<'a> {
    /// Classes named anywhere in the filler.
    pub fn filler_classes(&self) -> Vec<&'a str> {
        self.filler.contained_classes()
    }
}

impl Expr {
    pub fn class(name: impl Into<String>) -> Self {
        Expr::Class(name.into())
    }

    pub fn exists(property: impl Into<String>, filler: Expr) -> Self {
        Expr::Exists {
            property: property.into(),
            filler: Box::new(filler),
        }
    }

    pub fn forall(property: impl Into<String>, filler: Expr) -> Self {
        Expr::Forall {
            property: property.into(),
            filler: Box::new(filler),
        }
    }

    pub fn at_least(property: impl Into<String>, count: usize, filler: Expr) -> Self {
        Expr::AtLeast {
            property: property.into(),
            count,
            filler: Box::new(filler),
        }
    }

    pub fn at_most(property: impl Into<String>, count: usize, filler: Expr) -> Self {
        Expr::AtMost {
            property: property.into(),
            count,
            filler: Box::new(filler),
        }
    }

    pub fn exactly(property: impl Into<String>, count: usize, filler: Expr) -> Self {
        Expr::Exactly {
            property: property.into(),
            count,
            filler: Box::new(filler),
        }
    }

    pub fn negate(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    /// This node as a property restriction, if it is one.
    pub fn as_restriction(&self) -> Option<Restriction<'_>> {
        let (property, quantifier, filler) = match self {
            Expr::Exists { property, filler } => (property, Quantifier::Exists, filler),
            Expr::Forall { property, filler } => (property, Quantifier::Forall, filler),
            Expr::AtLeast { property, count, filler } => (property, Quantifier::AtLeast(*count), filler),
            Expr::AtMost { property, count, filler } => (property, Quantifier::AtMost(*count), filler),
            Expr::Exactly { property, count, filler } => (property, Quantifier::Exactly(*count), filler),
            _ => return None,
        };
        Some(Restriction {
            property,
            quantifier,
            filler,
        })
    }

    /// Restrictions reachable through `And`/`Or`, without descending into fillers or `Not`.
    pub fn restrictions(&self) -> Vec<Restriction<'_>> {
        let mut out = Vec::new();
        self.collect_restrictions(&mut out);
        out
    }

    fn collect_restrictions<'a>(&'a self, out: &mut Vec<Restriction<'a>>) {
        match self {
            Expr::And(items) | Expr::Or(items) => {
                for item in items {
                    item.collect_restrictions(out);
                }
            }
            other => out.extend(other.as_restriction()),
        }
    }

    /// Every class named in the expression, fillers included, in first-seen order.
    pub fn contained_classes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_classes(&mut out);
        out
    }

    fn collect_classes<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Class(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::And(items) | Expr::Or(items) => {
                for item in items {
                    item.collect_classes(out);
                }
            }
            Expr::Not(inner) => inner.collect_classes(out),
            Expr::Exists { filler, .. }
            | Expr::Forall { filler, .. }
            | Expr::AtLeast { filler, .. }
            | Expr::AtMost { filler, .. }
            | Expr::Exactly { filler, .. } => filler.collect_classes(out),
        }
    }

    /// Every property named in the expression.
    pub fn contained_properties(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_properties(&mut out);
        out
    }

    fn collect_properties<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Class(_) => {}
            Expr::And(items) | Expr::Or(items) => {
                for item in items {
                    item.collect_properties(out);
                }
            }
            Expr::Not(inner) => inner.collect_properties(out),
            other => {
                if let Some(r) = other.as_restriction() {
                    if !out.contains(&r.property) {
                        out.push(r.property);
                    }
                    r.filler.collect_properties(out);
                }
            }
        }
    }
}
