//! Handlers for individual, edge and model requests of edit batches.
//!
//! Handlers apply changes to the working copy through the batch's
//! [`ChangeSet`] so the caller can record the whole batch as one undo entry.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;

use crate::batch::plan::PlannedRequest;
use crate::batch::validation::{annotations, optional, require, require_document, require_list};
use crate::batch::{EntityKind, Operation, ValuePair};
use crate::error::{EditError, EditResult, ExecutionError, ValidationError};
use crate::expression::{Expression, ExpressionNode, Resolver, TermId};
use crate::model::{keys, Annotation, Entity, EntityId, Model, Relation, RelationKey};
use crate::store::{SeedGraph, StorageError};
use crate::undo::{Change, ChangeSet};

use super::{parse_document, Actor, EditEngine, Session};

const ARG_INDIVIDUAL: &str = "request.arguments.individual";
const ARG_SUBJECT: &str = "request.arguments.subject";
const ARG_OBJECT: &str = "request.arguments.object";
const ARG_PREDICATE: &str = "request.arguments.predicate";
const ARG_EXPRESSIONS: &str = "request.arguments.expressions";
const ARG_VALUES: &str = "request.arguments.values";

pub(super) fn unsupported(entity: EntityKind, operation: Operation) -> EditError {
    ValidationError::UnsupportedOperation {
        entity: entity.label().to_string(),
        operation: operation.label().to_string(),
    }
    .into()
}

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

impl EditEngine {
    pub(super) fn individual(
        &self,
        request: &PlannedRequest,
        model: &mut Model,
        changes: &mut ChangeSet,
        session: &mut Session,
        actor: &Actor,
    ) -> EditResult<()> {
        let args = &request.arguments;
        match request.operation {
            Operation::Get => {
                let id = session.individual(model, ARG_INDIVIDUAL, args.individual.as_deref())?;
                session.touch(id);
            }
            Operation::Create => {
                let subject = require(ARG_SUBJECT, args.subject.as_deref())?;
                let types = self.new_types(model, subject, args.expressions.as_deref())?;
                let stamp = self.stamped(actor, args.values.as_deref(), true)?;
                let id = create_individual(model, changes, types, &stamp);
                self.touch_model(model, changes, actor);
                session.bind(args.assign_to_variable.as_deref(), &id)?;
                session.touch(id);
            }
            Operation::CreateComposite => {
                let subject = require(ARG_SUBJECT, args.subject.as_deref())?;
                let predicate = require(ARG_PREDICATE, args.predicate.as_deref())?;
                let object = require(ARG_OBJECT, args.object.as_deref())?;
                let subject_types = self.new_types(model, subject, args.expressions.as_deref())?;
                let object_types = self.new_types(model, object, None)?;
                let predicate = self.relation_term(predicate)?;
                let stamp = self.stamped(actor, args.values.as_deref(), true)?;

                let s = create_individual(model, changes, subject_types, &stamp);
                let o = create_individual(model, changes, object_types, &stamp);
                let mut fact = Relation::new(RelationKey::new(s.clone(), predicate, o.clone()));
                fact.annotations.extend(stamp);
                changes.record(model, Change::AddRelation { relation: fact });
                self.touch_model(model, changes, actor);
                session.bind(args.assign_to_variable.as_deref(), &s)?;
                session.touch(s);
                session.touch(o);
            }
            Operation::AddType | Operation::RemoveType => {
                let id = session.individual(model, ARG_INDIVIDUAL, args.individual.as_deref())?;
                let nodes = require_list(ARG_EXPRESSIONS, args.expressions.as_deref())?;
                let expressions = self.resolver(model).resolve_all(nodes)?;
                for expression in expressions {
                    let entity = id.clone();
                    let change = if request.operation == Operation::AddType {
                        Change::AddType { entity, expression }
                    } else {
                        Change::RemoveType { entity, expression }
                    };
                    changes.record(model, change);
                }
                self.touch_model(model, changes, actor);
                session.touch(id);
            }
            Operation::Remove => {
                let id = session.individual(model, ARG_INDIVIDUAL, args.individual.as_deref())?;
                for relation in model.relations_touching(&id) {
                    changes.record(model, Change::RemoveRelation { relation });
                }
                if let Some(entity) = model.entity(&id).cloned() {
                    changes.record(model, Change::RemoveEntity { entity });
                }
                self.touch_model(model, changes, actor);
                session.forget(&id);
                session.rebuild = true;
            }
            Operation::AddAnnotation | Operation::RemoveAnnotation => {
                let id = session.individual(model, ARG_INDIVIDUAL, args.individual.as_deref())?;
                let values = require_list(ARG_VALUES, args.values.as_deref())?;
                let mut pairs = annotations(values)?;
                let adding = request.operation == Operation::AddAnnotation;
                if adding {
                    self.add_contributor(actor, &mut pairs);
                }
                for annotation in pairs {
                    let entity = id.clone();
                    let change = if adding {
                        Change::AddEntityAnnotation { entity, annotation }
                    } else {
                        Change::RemoveEntityAnnotation { entity, annotation }
                    };
                    changes.record(model, change);
                }
                self.touch_model(model, changes, actor);
                session.touch(id);
            }
            other => return Err(unsupported(EntityKind::Individual, other)),
        }
        Ok(())
    }

    pub(super) fn edge(
        &self,
        request: &PlannedRequest,
        model: &mut Model,
        changes: &mut ChangeSet,
        session: &mut Session,
        actor: &Actor,
    ) -> EditResult<()> {
        let args = &request.arguments;
        let subject = require(ARG_SUBJECT, args.subject.as_deref())?;
        let predicate = require(ARG_PREDICATE, args.predicate.as_deref())?;
        let object = require(ARG_OBJECT, args.object.as_deref())?;
        let key = RelationKey::new(
            session.lookup(model, subject)?,
            self.relation_term(predicate)?,
            session.lookup(model, object)?,
        );

        match request.operation {
            Operation::Add => {
                let stamp = self.stamped(actor, args.values.as_deref(), true)?;
                if model.relation(&key).is_some() {
                    for annotation in stamp {
                        changes.record(
                            model,
                            Change::AddRelationAnnotation {
                                key: key.clone(),
                                annotation,
                            },
                        );
                    }
                } else {
                    let mut relation = Relation::new(key.clone());
                    relation.annotations.extend(stamp);
                    changes.record(model, Change::AddRelation { relation });
                }
                self.touch_model(model, changes, actor);
            }
            Operation::Remove => {
                if let Some(relation) = model.relation(&key) {
                    changes.record(model, Change::RemoveRelation { relation });
                }
                self.touch_model(model, changes, actor);
            }
            Operation::AddAnnotation | Operation::RemoveAnnotation => {
                let values = require_list(ARG_VALUES, args.values.as_deref())?;
                if model.relation(&key).is_none() {
                    return Err(EditError::unknown(key.to_string()));
                }
                let mut pairs = annotations(values)?;
                let adding = request.operation == Operation::AddAnnotation;
                if adding {
                    self.add_contributor(actor, &mut pairs);
                }
                for annotation in pairs {
                    let key = key.clone();
                    let change = if adding {
                        Change::AddRelationAnnotation { key, annotation }
                    } else {
                        Change::RemoveRelationAnnotation { key, annotation }
                    };
                    changes.record(model, change);
                }
                self.touch_model(model, changes, actor);
            }
            other => return Err(unsupported(EntityKind::Edge, other)),
        }
        session.touch(key.subject);
        session.touch(key.object);
        Ok(())
    }

    pub(super) fn model_request(
        &self,
        request: &PlannedRequest,
        model: &mut Model,
        changes: &mut ChangeSet,
        session: &mut Session,
        actor: &Actor,
    ) -> EditResult<()> {
        let args = &request.arguments;
        match request.operation {
            Operation::Get => session.rebuild = true,
            Operation::GenerateBlank => {
                if let Some(taxon) = optional("request.arguments.taxonId", args.taxon_id.as_deref())? {
                    model.set_taxon(Some(taxon.to_string()));
                }
                self.bootstrap(model, changes, actor, args.values.as_deref())?;
                session.rebuild = true;
            }
            Operation::Generate => {
                let db = require("request.arguments.db", args.db.as_deref())?;
                let subject = require(ARG_SUBJECT, args.subject.as_deref())?;
                let corpus = self.seeds.as_ref().ok_or_else(|| ValidationError::InvalidField {
                    field: "request.arguments.db".to_string(),
                    reason: "no seed corpus is configured".to_string(),
                })?;
                let class = self
                    .taxonomy
                    .class(subject)
                    .ok_or_else(|| EditError::unknown(subject))?;
                let graph = corpus.seed(db, &class)?;
                if let Some(taxon) = optional("request.arguments.taxonId", args.taxon_id.as_deref())? {
                    model.set_taxon(Some(taxon.to_string()));
                }
                self.bootstrap(model, changes, actor, args.values.as_deref())?;
                self.seed(model, changes, actor, &graph)?;
                session.rebuild = true;
            }
            Operation::Import => {
                let text = require_document("request.arguments.importModel", args.import_model.as_deref())?;
                let document = parse_document(text)?;
                model.set_taxon(document.taxon.clone());
                document.build_into(model, changes)?;
                self.touch_model(model, changes, actor);
                session.rebuild = true;
            }
            Operation::AddAnnotation | Operation::RemoveAnnotation => {
                let values = require_list(ARG_VALUES, args.values.as_deref())?;
                let mut pairs = annotations(values)?;
                let adding = request.operation == Operation::AddAnnotation;
                if adding {
                    self.add_contributor(actor, &mut pairs);
                }
                for annotation in pairs {
                    let change = if adding {
                        Change::AddModelAnnotation { annotation }
                    } else {
                        Change::RemoveModelAnnotation { annotation }
                    };
                    changes.record(model, change);
                }
                session.model_annotations = true;
            }
            Operation::Undo => {
                let Some(inverse) = model.history_mut().undo() else {
                    return Err(ExecutionError::EmptyUndo {
                        model: model.id().clone(),
                    }
                    .into());
                };
                inverse.replay(model)?;
                session.rebuild = true;
            }
            Operation::Redo => {
                let Some(forward) = model.history_mut().redo() else {
                    return Err(ExecutionError::EmptyRedo {
                        model: model.id().clone(),
                    }
                    .into());
                };
                forward.replay(model)?;
                session.rebuild = true;
            }
            other => return Err(unsupported(EntityKind::Model, other)),
        }
        Ok(())
    }

    fn resolver<'a>(&'a self, model: &'a Model) -> Resolver<'a> {
        Resolver::new(self.taxonomy.as_ref(), self.lookup.as_ref()).for_model(model)
    }

    /// Asserted class of a new individual plus any extra expressions.
    fn new_types(
        &self,
        model: &Model,
        class: &str,
        expressions: Option<&[ExpressionNode]>,
    ) -> EditResult<BTreeSet<Expression>> {
        let resolver = self.resolver(model);
        let mut types = BTreeSet::new();
        types.insert(resolver.resolve(&ExpressionNode::class(class))?);
        if let Some(nodes) = expressions {
            types.extend(resolver.resolve_all(nodes)?);
        }
        Ok(types)
    }

    fn relation_term(&self, identifier: &str) -> EditResult<TermId> {
        self.taxonomy
            .relation(identifier)
            .ok_or_else(|| EditError::unknown(identifier))
    }

    pub(super) fn add_contributor(&self, actor: &Actor, annotations: &mut Vec<Annotation>) {
        if !self.config.use_user_id {
            return;
        }
        if let Some(user) = &actor.user_id {
            annotations.push(Annotation::new(keys::CONTRIBUTOR, user.as_str()));
        }
    }

    /// Supplied annotations plus contributor and, optionally, creation date.
    fn stamped(&self, actor: &Actor, values: Option<&[ValuePair]>, with_date: bool) -> EditResult<Vec<Annotation>> {
        let mut out = match values {
            Some(values) => annotations(values)?,
            None => Vec::new(),
        };
        self.add_contributor(actor, &mut out);
        if with_date && self.config.use_creation_date {
            out.push(Annotation::new(keys::DATE, today()));
        }
        Ok(out)
    }

    /// Marks the caller as a contributor of the model.
    fn touch_model(&self, model: &mut Model, changes: &mut ChangeSet, actor: &Actor) {
        let mut contributor = Vec::with_capacity(1);
        self.add_contributor(actor, &mut contributor);
        for annotation in contributor {
            changes.record(model, Change::AddModelAnnotation { annotation });
        }
    }

    fn bootstrap(
        &self,
        model: &mut Model,
        changes: &mut ChangeSet,
        actor: &Actor,
        values: Option<&[ValuePair]>,
    ) -> EditResult<()> {
        for annotation in self.stamped(actor, values, true)? {
            changes.record(model, Change::AddModelAnnotation { annotation });
        }
        Ok(())
    }

    fn seed(&self, model: &mut Model, changes: &mut ChangeSet, actor: &Actor, graph: &SeedGraph) -> EditResult<()> {
        let stamp = self.stamped(actor, None, true)?;
        let mut created: HashMap<&str, EntityId> = HashMap::with_capacity(graph.entities.len());
        for seed in &graph.entities {
            let class = self
                .taxonomy
                .class(seed.class.as_str())
                .ok_or_else(|| EditError::unknown(seed.class.as_str()))?;
            let mut annotations = seed.annotations.clone();
            annotations.extend(stamp.iter().cloned());
            let id = create_individual(model, changes, BTreeSet::from([Expression::class(class)]), &annotations);
            created.insert(seed.key.as_str(), id);
        }
        for link in &graph.links {
            let (Some(subject), Some(object)) = (created.get(link.subject.as_str()), created.get(link.object.as_str()))
            else {
                return Err(StorageError::SerializationError(format!(
                    "seed link {} {} {} references an unknown seed entity",
                    link.subject, link.predicate, link.object
                ))
                .into());
            };
            let predicate = self.relation_term(link.predicate.as_str())?;
            let mut relation = Relation::new(RelationKey::new(subject.clone(), predicate, object.clone()));
            relation.annotations.extend(stamp.iter().cloned());
            changes.record(model, Change::AddRelation { relation });
        }
        Ok(())
    }
}

fn create_individual(
    model: &mut Model,
    changes: &mut ChangeSet,
    types: BTreeSet<Expression>,
    annotations: &[Annotation],
) -> EntityId {
    let mut entity = Entity::new(EntityId::generate(model.id()));
    entity.types = types;
    entity.annotations.extend(annotations.iter().cloned());
    let id = entity.id.clone();
    changes.record(model, Change::AddEntity { entity });
    id
}
