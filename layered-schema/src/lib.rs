#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Category schema and restriction reasoning for layered-context.
//!
//! The schema is compiled once at load time into a closed set of categories
//! and properties. Restrictions are plain expression trees evaluated by a
//! pure recursive function against an explicit [`InstanceArena`], so callers
//! control where tentative instances live and when they are undone.
//!
//! ## Core Types
//!
//! - [`SchemaDef`] / [`CategoryDef`] / [`PropertyDef`] - Authored schema, loadable from RON
//! - [`Schema`] - Compiled schema with hierarchy and restriction queries
//! - [`Expr`] / [`Restriction`] - Restriction expression trees
//! - [`InstanceArena`] - Instance store with checkpoint and rollback
//!
//! ## Example
//!
//! ```
//! use layered_schema::{CategoryDef, Expr, InstanceArena, PropertyDef, Schema, SchemaDef};
//!
//! let schema = Schema::compile(
//!     SchemaDef::new()
//!         .with_category(CategoryDef::new("Finding"))
//!         .with_category(CategoryDef::new("Negative_Polarity"))
//!         .with_category(CategoryDef::new("NegatedFinding").with_equivalent(Expr::And(vec![
//!             Expr::exists("hasAnchor", Expr::class("Finding")),
//!             Expr::exists("hasPolarity", Expr::class("Negative_Polarity")),
//!         ])))
//!         .with_property(PropertyDef::new("hasAnchor"))
//!         .with_property(PropertyDef::new("hasPolarity")),
//! )
//! .unwrap();
//!
//! let mut arena = InstanceArena::new();
//! let finding = arena.create("Finding", "effusion");
//! let var = arena.create("NegatedFinding", "var");
//! arena.add_value(var, "hasAnchor", finding);
//!
//! let checkpoint = arena.checkpoint();
//! let negated = arena.create("Negative_Polarity", "no");
//! arena.add_value(var, "hasPolarity", negated);
//! assert!(schema.satisfies("NegatedFinding", &arena, var));
//!
//! arena.rollback(checkpoint);
//! assert!(!schema.satisfies("NegatedFinding", &arena, var));
//! ```

mod arena;
mod errors;
mod expr;
mod schema;

pub use arena::{Checkpoint, InstanceArena, InstanceId};
pub use errors::{SchemaError, SchemaResult};
pub use expr::{Expr, Quantifier, Restriction};
pub use schema::{inverse_name, Category, CategoryDef, Property, PropertyDef, Schema, SchemaDef};
