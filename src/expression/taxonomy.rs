//! Background taxonomy collaborator.
//!
//! The taxonomy answers three questions for the engine: which class or
//! relation an identifier or label denotes, what a term's parents are, and
//! which classes are declared disjoint. Everything else (subsumption
//! closure, descendants) is derived from those answers.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::TermId;

/// Id and label of a term, as listed to clients.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TermInfo {
    /// Term id.
    pub id: TermId,
    /// Human readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Read-only view of the background taxonomy.
///
/// Implementations must be safe for concurrent use across models.
pub trait Taxonomy: Send + Sync {
    /// Resolves a class by id, falling back to an exact label match.
    fn class(&self, identifier: &str) -> Option<TermId>;

    /// Resolves a relation by id, falling back to an exact label match.
    fn relation(&self, identifier: &str) -> Option<TermId>;

    /// Label of a class or relation.
    fn label(&self, id: &TermId) -> Option<String>;

    /// Direct superclasses.
    fn parents(&self, id: &TermId) -> Vec<TermId>;

    /// All classes.
    fn classes(&self) -> Vec<TermInfo>;

    /// All relations.
    fn relations(&self) -> Vec<TermInfo>;

    /// Returns true if the two classes are declared disjoint.
    fn disjoint(&self, _a: &TermId, _b: &TermId) -> bool {
        false
    }

    /// Proper ancestors of a class (transitive parents, excluding itself).
    fn ancestors(&self, id: &TermId) -> BTreeSet<TermId> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<TermId> = self.parents(id).into();
        while let Some(next) = queue.pop_front() {
            if &next == id || !seen.insert(next.clone()) {
                continue;
            }
            queue.extend(self.parents(&next));
        }
        seen
    }

    /// Returns true if `ancestor` is a proper ancestor of `descendant`.
    fn is_proper_ancestor(&self, ancestor: &TermId, descendant: &TermId) -> bool {
        ancestor != descendant && self.ancestors(descendant).contains(ancestor)
    }

    /// Classes strictly below `root`.
    fn descendants(&self, root: &TermId) -> Vec<TermInfo> {
        self.classes()
            .into_iter()
            .filter(|c| self.is_proper_ancestor(root, &c.id))
            .collect()
    }
}

/// Serializable class definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    /// Class id.
    pub id: TermId,
    /// Label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Direct superclasses.
    #[serde(default)]
    pub parents: Vec<TermId>,
}

/// Serializable taxonomy snapshot, e.g. loaded from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyDocument {
    /// Classes.
    #[serde(default)]
    pub classes: Vec<ClassDef>,
    /// Relations.
    #[serde(default)]
    pub relations: Vec<TermInfo>,
    /// Pairs of disjoint classes.
    #[serde(default)]
    pub disjoint: Vec<(TermId, TermId)>,
}

#[derive(Debug, Clone)]
struct ClassEntry {
    label: Option<String>,
    parents: Vec<TermId>,
}

/// Immutable in-memory taxonomy snapshot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaxonomy {
    classes: HashMap<TermId, ClassEntry>,
    class_labels: HashMap<String, TermId>,
    relations: HashMap<TermId, Option<String>>,
    relation_labels: HashMap<String, TermId>,
    disjoint: HashSet<(TermId, TermId)>,
}

impl InMemoryTaxonomy {
    /// Creates an empty taxonomy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class.
    #[must_use]
    pub fn with_class(mut self, id: &str, label: &str, parents: &[&str]) -> Self {
        self.insert_class(ClassDef {
            id: TermId::from(id),
            label: Some(label.to_string()),
            parents: parents.iter().map(|p| TermId::from(*p)).collect(),
        });
        self
    }

    /// Adds a relation.
    #[must_use]
    pub fn with_relation(mut self, id: &str, label: &str) -> Self {
        self.insert_relation(TermInfo {
            id: TermId::from(id),
            label: Some(label.to_string()),
        });
        self
    }

    /// Declares two classes disjoint.
    #[must_use]
    pub fn with_disjoint(mut self, a: &str, b: &str) -> Self {
        self.insert_disjoint(TermId::from(a), TermId::from(b));
        self
    }

    /// Builds a taxonomy from a document.
    #[must_use]
    pub fn from_document(doc: TaxonomyDocument) -> Self {
        let mut out = Self::new();
        for class in doc.classes {
            out.insert_class(class);
        }
        for relation in doc.relations {
            out.insert_relation(relation);
        }
        for (a, b) in doc.disjoint {
            out.insert_disjoint(a, b);
        }
        out
    }

    /// Parses a JSON [`TaxonomyDocument`].
    ///
    /// # Errors
    /// Returns the serde error for malformed input.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<TaxonomyDocument>(json).map(Self::from_document)
    }

    fn insert_class(&mut self, def: ClassDef) {
        if let Some(label) = &def.label {
            self.class_labels.insert(label.trim().to_string(), def.id.clone());
        }
        self.classes.insert(
            def.id,
            ClassEntry {
                label: def.label,
                parents: def.parents,
            },
        );
    }

    fn insert_relation(&mut self, info: TermInfo) {
        if let Some(label) = &info.label {
            self.relation_labels.insert(label.trim().to_string(), info.id.clone());
        }
        self.relations.insert(info.id, info.label);
    }

    fn insert_disjoint(&mut self, a: TermId, b: TermId) {
        self.disjoint.insert((a.clone(), b.clone()));
        self.disjoint.insert((b, a));
    }
}

impl Taxonomy for InMemoryTaxonomy {
    fn class(&self, identifier: &str) -> Option<TermId> {
        let key = identifier.trim();
        let id = TermId::from(key);
        if self.classes.contains_key(&id) {
            return Some(id);
        }
        self.class_labels.get(key).cloned()
    }

    fn relation(&self, identifier: &str) -> Option<TermId> {
        let key = identifier.trim();
        let id = TermId::from(key);
        if self.relations.contains_key(&id) {
            return Some(id);
        }
        self.relation_labels.get(key).cloned()
    }

    fn label(&self, id: &TermId) -> Option<String> {
        self.classes
            .get(id)
            .and_then(|c| c.label.clone())
            .or_else(|| self.relations.get(id).cloned().flatten())
    }

    fn parents(&self, id: &TermId) -> Vec<TermId> {
        self.classes
            .get(id)
            .map(|c| c.parents.clone())
            .unwrap_or_default()
    }

    fn classes(&self) -> Vec<TermInfo> {
        let mut out: Vec<TermInfo> = self
            .classes
            .iter()
            .map(|(id, c)| TermInfo {
                id: id.clone(),
                label: c.label.clone(),
            })
            .collect();
        out.sort();
        out
    }

    fn relations(&self) -> Vec<TermInfo> {
        let mut out: Vec<TermInfo> = self
            .relations
            .iter()
            .map(|(id, label)| TermInfo {
                id: id.clone(),
                label: label.clone(),
            })
            .collect();
        out.sort();
        out
    }

    fn disjoint(&self, a: &TermId, b: &TermId) -> bool {
        self.disjoint.contains(&(a.clone(), b.clone()))
    }
}
