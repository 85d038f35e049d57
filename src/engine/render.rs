//! JSON rendering of models for batch responses.

use serde_json::{json, Map, Value};

use crate::expression::{Expression, Taxonomy, TermId};
use crate::inference::Reconciliation;
use crate::model::{Annotation, Entity, EntityId, Model, Relation};

pub(crate) const KEY_ID: &str = "id";
pub(crate) const KEY_INDIVIDUALS: &str = "individuals";
pub(crate) const KEY_FACTS: &str = "facts";
pub(crate) const KEY_ANNOTATIONS: &str = "annotations";
pub(crate) const KEY_INCONSISTENT: &str = "inconsistent_p";

pub(crate) struct Renderer<'a> {
    taxonomy: &'a dyn Taxonomy,
    reconciliation: Option<&'a Reconciliation>,
}

impl<'a> Renderer<'a> {
    pub(crate) fn new(taxonomy: &'a dyn Taxonomy, reconciliation: Option<&'a Reconciliation>) -> Self {
        Self {
            taxonomy,
            reconciliation,
        }
    }

    /// The whole model.
    pub(crate) fn model(&self, model: &Model) -> Map<String, Value> {
        let mut data = self.header(model);
        data.insert(
            KEY_INDIVIDUALS.to_string(),
            model.entities().map(|e| self.individual(e)).collect(),
        );
        data.insert(KEY_FACTS.to_string(), model.relations().map(|r| self.fact(&r)).collect());
        data.insert(KEY_ANNOTATIONS.to_string(), annotations(model.annotations()));
        data
    }

    /// Only the given individuals and the facts touching them.
    pub(crate) fn individuals(&self, model: &Model, ids: &[EntityId]) -> Map<String, Value> {
        let mut data = self.header(model);
        data.insert(
            KEY_INDIVIDUALS.to_string(),
            ids.iter()
                .filter_map(|id| model.entity(id))
                .map(|e| self.individual(e))
                .collect(),
        );
        data.insert(
            KEY_FACTS.to_string(),
            model
                .relations()
                .filter(|r| ids.iter().any(|id| r.key.touches(id)))
                .map(|r| self.fact(&r))
                .collect(),
        );
        data
    }

    fn header(&self, model: &Model) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert(KEY_ID.to_string(), Value::from(model.id().as_str()));
        if let Some(reconciliation) = self.reconciliation {
            data.insert(KEY_INCONSISTENT.to_string(), Value::Bool(reconciliation.inconsistent));
        }
        data
    }

    pub(crate) fn individual(&self, entity: &Entity) -> Value {
        let mut obj = Map::new();
        obj.insert(KEY_ID.to_string(), Value::from(entity.id.as_str()));
        obj.insert(
            "type".to_string(),
            entity.types.iter().map(|t| self.expression(t)).collect(),
        );
        if let Some(inferred) = self.reconciliation.and_then(|r| r.inferred_for(&entity.id)) {
            obj.insert(
                "inferred-type".to_string(),
                inferred.iter().map(|c| self.class(c)).collect(),
            );
        }
        obj.insert(KEY_ANNOTATIONS.to_string(), annotations(&entity.annotations));
        Value::Object(obj)
    }

    pub(crate) fn fact(&self, relation: &Relation) -> Value {
        json!({
            "subject": relation.key.subject.as_str(),
            "property": relation.key.predicate.as_str(),
            "property-label": self.taxonomy.label(&relation.key.predicate),
            "object": relation.key.object.as_str(),
            "annotations": annotations(&relation.annotations),
        })
    }

    pub(crate) fn expression(&self, expression: &Expression) -> Value {
        match expression {
            Expression::Class { id } => self.class(id),
            Expression::Restriction { relation, filler } => json!({
                "type": "svf",
                "property": self.term(relation),
                "filler": self.expression(filler),
            }),
            Expression::Intersection { operands } => json!({
                "type": "intersection",
                "expressions": operands.iter().map(|o| self.expression(o)).collect::<Vec<_>>(),
            }),
            Expression::Union { operands } => json!({
                "type": "union",
                "expressions": operands.iter().map(|o| self.expression(o)).collect::<Vec<_>>(),
            }),
        }
    }

    fn class(&self, id: &TermId) -> Value {
        let mut obj = self.term_map(id);
        obj.insert("type".to_string(), Value::from("class"));
        Value::Object(obj)
    }

    fn term(&self, id: &TermId) -> Value {
        Value::Object(self.term_map(id))
    }

    fn term_map(&self, id: &TermId) -> Map<String, Value> {
        let mut obj = Map::new();
        obj.insert(KEY_ID.to_string(), Value::from(id.as_str()));
        if let Some(label) = self.taxonomy.label(id) {
            obj.insert("label".to_string(), Value::from(label));
        }
        obj
    }
}

pub(crate) fn annotations<'a>(set: impl IntoIterator<Item = &'a Annotation>) -> Value {
    set.into_iter()
        .map(|a| json!({"key": a.key, "value": a.value}))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    use crate::expression::InMemoryTaxonomy;
    use crate::model::{ModelId, RelationKey};
    use crate::undo::{Change, ChangeSet};

    fn taxonomy() -> InMemoryTaxonomy {
        InMemoryTaxonomy::new()
            .with_class("GO:0003674", "molecular_function", &[])
            .with_class("GO:0005623", "cell", &[])
            .with_relation("BFO:0000066", "occurs in")
    }

    fn model() -> Model {
        let mut model = Model::new(ModelId::new("gomodel:r"));
        let mut set = ChangeSet::new();
        let mut a = Entity::new(EntityId::new("a"));
        a.types.insert(Expression::class("GO:0003674"));
        a.types
            .insert(Expression::restriction("BFO:0000066", Expression::class("GO:0005623")));
        a.annotations.insert(Annotation::new("comment", "x"));
        set.record(&mut model, Change::AddEntity { entity: a });
        set.record(&mut model, Change::AddEntity { entity: Entity::new(EntityId::new("b")) });
        set.record(&mut model, Change::AddEntity { entity: Entity::new(EntityId::new("c")) });
        set.record(
            &mut model,
            Change::AddRelation {
                relation: Relation::new(RelationKey::new(
                    EntityId::new("a"),
                    TermId::from("BFO:0000066"),
                    EntityId::new("b"),
                )),
            },
        );
        model
    }

    #[test]
    fn individual_renders_types_with_labels() {
        let taxonomy = taxonomy();
        let model = model();
        let renderer = Renderer::new(&taxonomy, None);
        let value = renderer.individual(model.entity(&EntityId::new("a")).unwrap());

        let types = value["type"].as_array().unwrap();
        assert_eq!(types.len(), 2);
        assert!(types.iter().any(|t| t["label"] == "molecular_function"));
        let svf = types.iter().find(|t| t["type"] == "svf").unwrap();
        assert_eq!(svf["property"]["label"], "occurs in");
        assert_eq!(svf["filler"]["id"], "GO:0005623");
        assert_eq!(value["annotations"].as_array().unwrap().len(), 1);
        assert!(value.get("inferred-type").is_none());
    }

    #[test]
    fn partial_rendering_limits_individuals_and_facts() {
        let taxonomy = taxonomy();
        let model = model();
        let renderer = Renderer::new(&taxonomy, None);
        let data = renderer.individuals(&model, &[EntityId::new("c")]);
        assert_eq!(data[KEY_INDIVIDUALS].as_array().unwrap().len(), 1);
        assert!(data[KEY_FACTS].as_array().unwrap().is_empty());

        let all = renderer.model(&model);
        assert_eq!(all[KEY_INDIVIDUALS].as_array().unwrap().len(), 3);
        assert_eq!(all[KEY_FACTS].as_array().unwrap().len(), 1);
        assert!(all.get(KEY_INCONSISTENT).is_none());
    }

    #[test]
    fn reconciliation_adds_flag_and_inferred_types() {
        let taxonomy = taxonomy();
        let model = model();
        let mut inferred = BTreeMap::new();
        inferred.insert(EntityId::new("a"), BTreeSet::from([TermId::from("GO:0003674")]));
        let reconciliation = Reconciliation {
            inconsistent: false,
            inferred: Some(inferred),
        };
        let data = Renderer::new(&taxonomy, Some(&reconciliation)).model(&model);
        assert_eq!(data[KEY_INCONSISTENT], Value::Bool(false));
        let a = &data[KEY_INDIVIDUALS][0];
        assert_eq!(a["inferred-type"][0]["id"], "GO:0003674");
    }
}
