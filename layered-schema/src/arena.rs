//! Instance store for tentative and accepted bindings.
//!
//! Instances are only ever appended. Tentative work is undone by rolling back
//! to a [`Checkpoint`], which truncates the instances and property values
//! added since and bumps the arena's generation.

use std::collections::{BTreeMap, HashMap};

use log::trace;
use serde::{Deserialize, Serialize};

/// Handle to an instance in an [`InstanceArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(usize);

impl InstanceId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Instance {
    name: String,
    class: String,
    values: BTreeMap<String, Vec<InstanceId>>,
}

/// Arena state to return to with [`InstanceArena::rollback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    instances: usize,
    journal: usize,
}

#[derive(Debug, Clone, Default)]
pub struct InstanceArena {
    instances: Vec<Instance>,
    names: HashMap<String, InstanceId>,
    /// Every `add_value` in order, for undo
    journal: Vec<(InstanceId, String)>,
    generation: u64,
}

impl InstanceArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an instance of `class`. A later instance with the same name shadows earlier ones.
    pub fn create(&mut self, class: impl Into<String>, name: impl Into<String>) -> InstanceId {
        let id = InstanceId(self.instances.len());
        let name = name.into();
        self.names.insert(name.clone(), id);
        self.instances.push(Instance {
            name,
            class: class.into(),
            values: BTreeMap::new(),
        });
        id
    }

    /// Link `subject --property--> object`. Returns false for unknown handles.
    pub fn add_value(&mut self, subject: InstanceId, property: impl Into<String>, object: InstanceId) -> bool {
        if !self.contains(object) {
            return false;
        }
        let property = property.into();
        match self.instances.get_mut(subject.0) {
            Some(instance) => {
                instance.values.entry(property.clone()).or_default().push(object);
                self.journal.push((subject, property));
                true
            }
            None => false,
        }
    }

    /// Values recorded under exactly `property`.
    pub fn values(&self, subject: InstanceId, property: &str) -> &[InstanceId] {
        self.instances
            .get(subject.0)
            .and_then(|i| i.values.get(property))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every property of `subject` with its values.
    pub fn properties(&self, subject: InstanceId) -> impl Iterator<Item = (&str, &[InstanceId])> {
        self.instances
            .get(subject.0)
            .into_iter()
            .flat_map(|i| i.values.iter().map(|(p, v)| (p.as_str(), v.as_slice())))
    }

    pub fn class_of(&self, id: InstanceId) -> Option<&str> {
        self.instances.get(id.0).map(|i| i.class.as_str())
    }

    pub fn name_of(&self, id: InstanceId) -> Option<&str> {
        self.instances.get(id.0).map(|i| i.name.as_str())
    }

    pub fn named(&self, name: &str) -> Option<InstanceId> {
        self.names.get(name).copied()
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        id.0 < self.instances.len()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Incremented by every rollback; handles cached across a change of generation may be stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            instances: self.instances.len(),
            journal: self.journal.len(),
        }
    }

    /// Undo every instance and value added since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        while self.journal.len() > checkpoint.journal {
            let (subject, property) = match self.journal.pop() {
                Some(entry) => entry,
                None => break,
            };
            if let Some(instance) = self.instances.get_mut(subject.0) {
                if let Some(values) = instance.values.get_mut(&property) {
                    values.pop();
                    if values.is_empty() {
                        instance.values.remove(&property);
                    }
                }
            }
        }

        let keep = checkpoint.instances.min(self.instances.len());
        for dropped in self.instances.drain(keep..) {
            if self.names.get(&dropped.name).map_or(false, |id| id.0 >= keep) {
                self.names.remove(&dropped.name);
            }
        }
        // names shadowed by a dropped instance point at the newest survivor again
        for (index, instance) in self.instances.iter().enumerate() {
            self.names
                .entry(instance.name.clone())
                .and_modify(|id| *id = InstanceId(index.max(id.0)))
                .or_insert(InstanceId(index));
        }

        self.generation += 1;
        trace!(
            "arena rolled back to {} instances (generation {})",
            keep,
            self.generation
        );
    }
}
