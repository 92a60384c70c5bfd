//! Schema definitions and the compiled, read-only [`Schema`].
//!
//! A [`SchemaDef`] is what gets authored or exported (RON or built in code).
//! [`Schema::compile`] checks every reference once, precomputes ancestor sets,
//! and from then on every query is a map lookup.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Expr, InstanceArena, InstanceId, Restriction, SchemaError, SchemaResult};

// ============================================================================
// Definitions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDef {
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
    /// Necessary conditions (subclass-of restrictions)
    #[serde(default)]
    pub restrictions: Vec<Expr>,
    /// Necessary and sufficient definition
    #[serde(default)]
    pub equivalent: Option<Expr>,
}

impl CategoryDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            restrictions: Vec::new(),
            equivalent: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    pub fn with_restriction(mut self, restriction: Expr) -> Self {
        self.restrictions.push(restriction);
        self
    }

    pub fn with_equivalent(mut self, definition: Expr) -> Self {
        self.equivalent = Some(definition);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    /// Super-properties
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub domain: Vec<String>,
    #[serde(default)]
    pub range: Vec<String>,
    /// Explicit inverse; otherwise derived from the `hasX`/`isXOf` naming
    #[serde(default)]
    pub inverse: Option<String>,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            domain: Vec::new(),
            range: Vec::new(),
            inverse: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    pub fn with_domain(mut self, class: impl Into<String>) -> Self {
        self.domain.push(class.into());
        self
    }

    pub fn with_range(mut self, class: impl Into<String>) -> Self {
        self.range.push(class.into());
        self
    }

    pub fn with_inverse(mut self, inverse: impl Into<String>) -> Self {
        self.inverse = Some(inverse.into());
        self
    }
}

/// Authored form of a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaDef {
    pub categories: Vec<CategoryDef>,
    pub properties: Vec<PropertyDef>,
    /// Categories that must be declared for compilation to succeed
    pub required: Vec<String>,
}

impl SchemaDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: CategoryDef) -> Self {
        self.categories.push(category);
        self
    }

    pub fn with_property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    pub fn require(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }
}

// ============================================================================
// Compiled schema
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub parents: Vec<String>,
    /// Transitive parents, excluding the category itself
    pub ancestors: BTreeSet<String>,
    pub restrictions: Vec<Expr>,
    pub equivalent: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub parents: Vec<String>,
    pub ancestors: BTreeSet<String>,
    pub domain: Vec<String>,
    pub range: Vec<String>,
    pub inverse: Option<String>,
}

/// `hasX` <-> `isXOf`.
pub fn inverse_name(property: &str) -> Option<String> {
    if let Some(rest) = property.strip_prefix("has") {
        if !rest.is_empty() {
            return Some(format!("is{}Of", rest));
        }
    }
    property
        .strip_prefix("is")
        .and_then(|rest| rest.strip_suffix("Of"))
        .filter(|core| !core.is_empty())
        .map(|core| format!("has{}", core))
}

/// A closed set of categories and properties, validated once.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    categories: BTreeMap<String, Category>,
    /// Category names in declaration order
    order: Vec<String>,
    properties: BTreeMap<String, Property>,
}

impl Schema {
    /// Validate references and precompute ancestor sets.
    pub fn compile(def: SchemaDef) -> SchemaResult<Self> {
        let mut schema = Schema::default();

        for cat in def.categories {
            if schema.categories.contains_key(&cat.name) {
                return Err(SchemaError::Duplicate(cat.name));
            }
            schema.order.push(cat.name.clone());
            schema.categories.insert(
                cat.name.clone(),
                Category {
                    name: cat.name,
                    parents: cat.parents,
                    ancestors: BTreeSet::new(),
                    restrictions: cat.restrictions,
                    equivalent: cat.equivalent,
                },
            );
        }

        for prop in def.properties {
            if schema.properties.contains_key(&prop.name) {
                return Err(SchemaError::Duplicate(prop.name));
            }
            schema.properties.insert(
                prop.name.clone(),
                Property {
                    name: prop.name,
                    parents: prop.parents,
                    ancestors: BTreeSet::new(),
                    domain: prop.domain,
                    range: prop.range,
                    inverse: prop.inverse,
                },
            );
        }

        schema.check_references()?;

        let category_parents: BTreeMap<&str, &[String]> = schema
            .categories
            .values()
            .map(|c| (c.name.as_str(), c.parents.as_slice()))
            .collect();
        let category_ancestors: Vec<(String, BTreeSet<String>)> = schema
            .order
            .iter()
            .map(|name| ancestors_of(name, &category_parents).map(|a| (name.clone(), a)))
            .collect::<SchemaResult<_>>()?;

        let property_parents: BTreeMap<&str, &[String]> = schema
            .properties
            .values()
            .map(|p| (p.name.as_str(), p.parents.as_slice()))
            .collect();
        let property_ancestors: Vec<(String, BTreeSet<String>)> = schema
            .properties
            .keys()
            .map(|name| ancestors_of(name, &property_parents).map(|a| (name.clone(), a)))
            .collect::<SchemaResult<_>>()?;

        for (name, ancestors) in category_ancestors {
            if let Some(cat) = schema.categories.get_mut(&name) {
                cat.ancestors = ancestors;
            }
        }
        for (name, ancestors) in property_ancestors {
            if let Some(prop) = schema.properties.get_mut(&name) {
                prop.ancestors = ancestors;
            }
        }

        for name in &def.required {
            schema.require(name)?;
        }

        debug!(
            "compiled schema: {} categories, {} properties",
            schema.categories.len(),
            schema.properties.len()
        );
        Ok(schema)
    }

    /// Parse RON schema text and compile it.
    pub fn from_ron_str(text: &str) -> SchemaResult<Self> {
        let def: SchemaDef = ron::from_str(text)?;
        Self::compile(def)
    }

    /// Load a RON schema file and compile it.
    pub fn load(path: &Path) -> SchemaResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| SchemaError::Load {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_ron_str(&text)
    }

    fn check_references(&self) -> SchemaResult<()> {
        let category = |name: &str, by: &str| {
            if self.categories.contains_key(name) {
                Ok(())
            } else {
                Err(SchemaError::UnknownCategory {
                    name: name.to_string(),
                    referenced_by: by.to_string(),
                })
            }
        };
        let property = |name: &str, by: &str| {
            if self.properties.contains_key(name) {
                Ok(())
            } else {
                Err(SchemaError::UnknownProperty {
                    name: name.to_string(),
                    referenced_by: by.to_string(),
                })
            }
        };

        for cat in self.categories.values() {
            for parent in &cat.parents {
                category(parent, &cat.name)?;
            }
            for expr in cat.restrictions.iter().chain(cat.equivalent.iter()) {
                for class in expr.contained_classes() {
                    category(class, &cat.name)?;
                }
                for prop in expr.contained_properties() {
                    property(prop, &cat.name)?;
                }
            }
        }
        for prop in self.properties.values() {
            for parent in &prop.parents {
                property(parent, &prop.name)?;
            }
            for class in prop.domain.iter().chain(prop.range.iter()) {
                category(class, &prop.name)?;
            }
        }
        Ok(())
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    /// Like [`Schema::category`], for concepts the caller cannot do without.
    pub fn require(&self, name: &str) -> SchemaResult<&Category> {
        self.categories
            .get(name)
            .ok_or_else(|| SchemaError::MissingConcept(name.to_string()))
    }

    /// Categories in declaration order.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.order.iter().filter_map(|name| self.categories.get(name))
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// `class` is `ancestor` or descends from it.
    pub fn is_a(&self, class: &str, ancestor: &str) -> bool {
        class == ancestor
            || self
                .categories
                .get(class)
                .map_or(false, |c| c.ancestors.contains(ancestor))
    }

    pub fn is_strict_subclass(&self, class: &str, ancestor: &str) -> bool {
        class != ancestor && self.is_a(class, ancestor)
    }

    /// Every strict descendant of `name`, in declaration order.
    pub fn subclasses(&self, name: &str) -> Vec<&str> {
        self.categories()
            .filter(|c| c.ancestors.contains(name))
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn is_subproperty(&self, property: &str, ancestor: &str) -> bool {
        property == ancestor
            || self
                .properties
                .get(property)
                .map_or(false, |p| p.ancestors.contains(ancestor))
    }

    /// `property` and every property below it.
    pub fn subproperties(&self, name: &str) -> Vec<&str> {
        self.properties
            .values()
            .filter(|p| self.is_subproperty(&p.name, name))
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Explicit inverse, else the naming convention.
    pub fn inverse_of(&self, property: &str) -> Option<String> {
        self.properties
            .get(property)
            .and_then(|p| p.inverse.clone())
            .or_else(|| inverse_name(property))
    }

    /// Restrictions on `class`: its own (necessary, then definition), then inherited ones.
    pub fn restrictions(&self, class: &str) -> Vec<Restriction<'_>> {
        let category = match self.categories.get(class) {
            Some(c) => c,
            None => return Vec::new(),
        };
        let own = std::iter::once(category);
        let inherited = category
            .ancestors
            .iter()
            .filter_map(|a| self.categories.get(a));

        let mut out: Vec<Restriction<'_>> = Vec::new();
        for cat in own.chain(inherited) {
            for expr in cat.restrictions.iter().chain(cat.equivalent.iter()) {
                for r in expr.restrictions() {
                    if !out.contains(&r) {
                        out.push(r);
                    }
                }
            }
        }
        out
    }

    /// Restrictions on `class` whose property is `property` or a sub-property of it.
    pub fn restrictions_on(&self, class: &str, property: &str) -> Vec<Restriction<'_>> {
        self.restrictions(class)
            .into_iter()
            .filter(|r| self.is_subproperty(r.property, property))
            .collect()
    }

    /// Unknown properties admit nothing; an empty range admits everything.
    pub fn range_admits(&self, property: &str, class: &str) -> bool {
        self.properties
            .get(property)
            .map_or(false, |p| p.range.is_empty() || p.range.iter().any(|r| self.is_a(class, r)))
    }

    /// Unknown properties admit nothing; an empty domain admits everything.
    pub fn domain_admits(&self, property: &str, class: &str) -> bool {
        self.properties
            .get(property)
            .map_or(false, |p| p.domain.is_empty() || p.domain.iter().any(|d| self.is_a(class, d)))
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Values of `property` and its sub-properties, without duplicates.
    pub fn property_values(&self, arena: &InstanceArena, instance: InstanceId, property: &str) -> Vec<InstanceId> {
        let mut out: Vec<InstanceId> = Vec::new();
        for (name, values) in arena.properties(instance) {
            if self.is_subproperty(name, property) {
                for v in values {
                    if !out.contains(v) {
                        out.push(*v);
                    }
                }
            }
        }
        out
    }

    /// Closed-world evaluation of `expr` against `instance`.
    pub fn evaluate(&self, expr: &Expr, arena: &InstanceArena, instance: InstanceId) -> bool {
        match expr {
            Expr::Class(class) => arena
                .class_of(instance)
                .map_or(false, |c| self.is_a(c, class)),
            Expr::And(items) => items.iter().all(|e| self.evaluate(e, arena, instance)),
            Expr::Or(items) => items.iter().any(|e| self.evaluate(e, arena, instance)),
            Expr::Not(inner) => !self.evaluate(inner, arena, instance),
            Expr::Exists { property, filler } => self
                .property_values(arena, instance, property)
                .into_iter()
                .any(|v| self.evaluate(filler, arena, v)),
            Expr::Forall { property, filler } => self
                .property_values(arena, instance, property)
                .into_iter()
                .all(|v| self.evaluate(filler, arena, v)),
            Expr::AtLeast { property, count, filler } => {
                self.count_matching(arena, instance, property, filler) >= *count
            }
            Expr::AtMost { property, count, filler } => {
                self.count_matching(arena, instance, property, filler) <= *count
            }
            Expr::Exactly { property, count, filler } => {
                self.count_matching(arena, instance, property, filler) == *count
            }
        }
    }

    fn count_matching(&self, arena: &InstanceArena, instance: InstanceId, property: &str, filler: &Expr) -> usize {
        self.property_values(arena, instance, property)
            .into_iter()
            .filter(|v| self.evaluate(filler, arena, *v))
            .count()
    }

    /// Whether `instance` meets the definition of `class`.
    ///
    /// Uses the equivalent-class definition when there is one, else the
    /// conjunction of the class's own necessary restrictions. A class with
    /// neither is trivially satisfied; an unknown class never is.
    pub fn satisfies(&self, class: &str, arena: &InstanceArena, instance: InstanceId) -> bool {
        match self.categories.get(class) {
            Some(Category {
                equivalent: Some(definition),
                ..
            }) => self.evaluate(definition, arena, instance),
            Some(category) => category
                .restrictions
                .iter()
                .all(|e| self.evaluate(e, arena, instance)),
            None => false,
        }
    }
}

/// Transitive parents of `start`, failing on a cycle through it.
fn ancestors_of(start: &str, parents: &BTreeMap<&str, &[String]>) -> SchemaResult<BTreeSet<String>> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut stack: Vec<&str> = parents.get(start).map_or(Vec::new(), |ps| {
        ps.iter().map(String::as_str).collect()
    });
    while let Some(next) = stack.pop() {
        if next == start {
            return Err(SchemaError::InheritanceCycle(start.to_string()));
        }
        if seen.insert(next.to_string()) {
            if let Some(ps) = parents.get(next) {
                stack.extend(ps.iter().map(String::as_str));
            }
        }
    }
    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clinical() -> SchemaDef {
        SchemaDef::new()
            .with_category(CategoryDef::new("Thing"))
            .with_category(CategoryDef::new("Anchor").with_parent("Thing"))
            .with_category(CategoryDef::new("Finding").with_parent("Anchor"))
            .with_category(CategoryDef::new("Mass").with_parent("Finding"))
            .with_category(CategoryDef::new("Modifier").with_parent("Thing"))
            .with_category(CategoryDef::new("Polarity").with_parent("Modifier"))
            .with_category(CategoryDef::new("Positive_Polarity").with_parent("Polarity"))
            .with_category(CategoryDef::new("Negative_Polarity").with_parent("Polarity"))
            .with_category(
                CategoryDef::new("Annotation")
                    .with_parent("Thing")
                    .with_restriction(Expr::exists("hasAnchor", Expr::class("Anchor"))),
            )
            .with_category(
                CategoryDef::new("FindingAnnotation")
                    .with_parent("Annotation")
                    .with_restriction(Expr::forall("hasPolarity", Expr::class("Polarity"))),
            )
            .with_category(
                CategoryDef::new("NegatedFinding")
                    .with_parent("FindingAnnotation")
                    .with_equivalent(Expr::And(vec![
                        Expr::exists("hasAnchor", Expr::class("Finding")),
                        Expr::exists("hasPolarity", Expr::class("Negative_Polarity")),
                    ])),
            )
            .with_property(PropertyDef::new("hasAnchor").with_range("Anchor"))
            .with_property(PropertyDef::new("hasModifier").with_range("Modifier"))
            .with_property(
                PropertyDef::new("hasPolarity")
                    .with_parent("hasModifier")
                    .with_domain("FindingAnnotation")
                    .with_range("Polarity"),
            )
            .require("Anchor")
    }

    fn schema() -> Schema {
        Schema::compile(clinical()).unwrap()
    }

    #[test]
    fn test_ancestors_and_subclasses() {
        let s = schema();
        assert!(s.is_a("Mass", "Anchor"));
        assert!(s.is_a("Mass", "Mass"));
        assert!(!s.is_a("Anchor", "Mass"));
        assert!(s.is_strict_subclass("NegatedFinding", "Annotation"));
        assert!(!s.is_strict_subclass("Annotation", "Annotation"));
        assert_eq!(s.subclasses("Polarity"), ["Positive_Polarity", "Negative_Polarity"]);
    }

    #[test]
    fn test_properties() {
        let s = schema();
        assert!(s.is_subproperty("hasPolarity", "hasModifier"));
        assert_eq!(s.subproperties("hasModifier"), ["hasModifier", "hasPolarity"]);
        assert!(s.range_admits("hasPolarity", "Negative_Polarity"));
        assert!(!s.range_admits("hasPolarity", "Mass"));
        assert!(s.domain_admits("hasPolarity", "NegatedFinding"));
        assert!(s.domain_admits("hasAnchor", "Mass"));
        assert!(!s.range_admits("hasNothing", "Mass"));
    }

    #[test]
    fn test_inverse_naming() {
        assert_eq!(inverse_name("hasAnchor").as_deref(), Some("isAnchorOf"));
        assert_eq!(inverse_name("isAnchorOf").as_deref(), Some("hasAnchor"));
        assert_eq!(inverse_name("has"), None);
        assert_eq!(inverse_name("isOf"), None);
        assert_eq!(inverse_name("location"), None);
    }

    #[test]
    fn test_restrictions_include_inherited() {
        let s = schema();
        let props: Vec<&str> = s.restrictions("NegatedFinding").iter().map(|r| r.property).collect();
        // own definition first, then Annotation and FindingAnnotation
        assert_eq!(props, ["hasAnchor", "hasPolarity", "hasAnchor", "hasPolarity"]);
        assert_eq!(s.restrictions_on("NegatedFinding", "hasModifier").len(), 2);
        assert!(s.restrictions("Unknown").is_empty());
    }

    #[test]
    fn test_evaluate_and_satisfies() {
        let s = schema();
        let mut arena = InstanceArena::new();
        let mass = arena.create("Mass", "mass");
        let positive = arena.create("Positive_Polarity", "Positive_Polarity_default");
        let negative = arena.create("Negative_Polarity", "neg");

        let var = arena.create("NegatedFinding", "var");
        arena.add_value(var, "hasAnchor", mass);
        arena.add_value(var, "hasPolarity", positive);
        assert!(!s.satisfies("NegatedFinding", &arena, var));
        assert!(s.satisfies("FindingAnnotation", &arena, var));

        arena.add_value(var, "hasPolarity", negative);
        assert!(s.satisfies("NegatedFinding", &arena, var));
        assert!(s.evaluate(
            &Expr::at_least("hasModifier", 2, Expr::class("Polarity")),
            &arena,
            var
        ));
        assert!(!s.evaluate(
            &Expr::forall("hasPolarity", Expr::class("Negative_Polarity")),
            &arena,
            var
        ));
        assert!(!s.satisfies("Unknown", &arena, var));
    }

    #[test]
    fn test_unknown_references_fail() {
        let def = clinical().with_category(CategoryDef::new("Lesion").with_parent("Abnormality"));
        assert!(matches!(
            Schema::compile(def),
            Err(SchemaError::UnknownCategory { name, .. }) if name == "Abnormality"
        ));

        let def = clinical().with_category(
            CategoryDef::new("Lesion").with_restriction(Expr::exists("hasSize", Expr::class("Thing"))),
        );
        assert!(matches!(Schema::compile(def), Err(SchemaError::UnknownProperty { .. })));
    }

    #[test]
    fn test_cycle_and_duplicate_fail() {
        let def = SchemaDef::new()
            .with_category(CategoryDef::new("A").with_parent("B"))
            .with_category(CategoryDef::new("B").with_parent("A"));
        assert!(matches!(Schema::compile(def), Err(SchemaError::InheritanceCycle(_))));

        let def = clinical().with_category(CategoryDef::new("Mass"));
        assert!(matches!(Schema::compile(def), Err(SchemaError::Duplicate(_))));
    }

    #[test]
    fn test_missing_required_concept() {
        let def = clinical().require("CompoundAnchor");
        assert!(matches!(
            Schema::compile(def),
            Err(SchemaError::MissingConcept(name)) if name == "CompoundAnchor"
        ));
    }

    #[test]
    fn test_load_from_ron_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"(
                categories: [
                    (name: "Anchor"),
                    (name: "Mass", parents: ["Anchor"]),
                ],
                properties: [(name: "hasAnchor", range: ["Anchor"])],
            )"#
        )
        .unwrap();
        let s = Schema::load(file.path()).unwrap();
        assert!(s.is_a("Mass", "Anchor"));
        assert!(s.range_admits("hasAnchor", "Mass"));
    }
}
