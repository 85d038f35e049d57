use std::sync::Arc;

use causal_edit::expression::PatternLookup;
use causal_edit::store::{InMemorySeedCorpus, SeedEntity, SeedGraph, SeedLink};
use causal_edit::{
    Arguments, BatchCall, BatchRequest, BatchResponse, EditEngine, EngineConfig, EntityKind,
    ExpressionNode, InMemoryPersistence, InMemoryTaxonomy, MessageType, Operation, Signal,
    TaxonomyOracle, TermId,
};
use serde_json::{json, Value};

const USER: &str = "orcid:0000-0002-1234";

fn taxonomy() -> InMemoryTaxonomy {
    InMemoryTaxonomy::new()
        .with_class("GO:0003674", "molecular_function", &[])
        .with_class("GO:0003824", "catalytic activity", &["GO:0003674"])
        .with_class("GO:0008150", "biological_process", &[])
        .with_class("GO:0005623", "cell", &[])
        .with_class("ECO:0000000", "evidence", &[])
        .with_class("ECO:0000314", "direct assay evidence", &["ECO:0000000"])
        .with_relation("BFO:0000066", "occurs in")
        .with_relation("RO:0002333", "enabled by")
        .with_relation("BFO:0000051", "has part")
        .with_disjoint("GO:0003674", "GO:0008150")
}

fn engine_with(config: EngineConfig) -> EditEngine {
    EditEngine::new(
        config,
        Arc::new(taxonomy()),
        Arc::new(PatternLookup::new(["^UniProtKB:"]).unwrap()),
        Arc::new(TaxonomyOracle),
        Arc::new(InMemoryPersistence::new()),
    )
}

fn engine() -> EditEngine {
    engine_with(EngineConfig::default())
}

fn run(engine: &EditEngine, requests: Vec<BatchRequest>) -> BatchResponse {
    engine.process_batch(Some(USER), Some("action"), Some("packet-1"), requests, true)
}

fn req(entity: EntityKind, operation: Operation, args: Arguments) -> BatchRequest {
    BatchRequest::new(entity, operation).with_arguments(args)
}

fn blank(engine: &EditEngine, args: Arguments) -> String {
    let response = run(engine, vec![req(EntityKind::Model, Operation::GenerateBlank, args)]);
    assert!(response.is_success(), "{response:?}");
    response.field("id").and_then(Value::as_str).unwrap().to_string()
}

fn array<'a>(response: &'a BatchResponse, key: &str) -> &'a Vec<Value> {
    response
        .field(key)
        .and_then(Value::as_array)
        .unwrap_or_else(|| panic!("missing array {key} in {response:?}"))
}

fn get_model(engine: &EditEngine, model: &str) -> BatchResponse {
    let response = run(
        engine,
        vec![req(EntityKind::Model, Operation::Get, Arguments::new().model(model))],
    );
    assert!(response.is_success(), "{response:?}");
    response
}

fn create(engine: &EditEngine, model: &str, class: &str) -> String {
    let response = run(
        engine,
        vec![req(
            EntityKind::Individual,
            Operation::Create,
            Arguments::new().model(model).subject(class),
        )],
    );
    assert!(response.is_success(), "{response:?}");
    array(&response, "individuals")[0]["id"].as_str().unwrap().to_string()
}

#[test]
fn create_individual_with_restrictions_renders_types_and_annotations() {
    let engine = engine_with(EngineConfig::default().with_user_id(false).with_creation_date(false));
    let model = blank(&engine, Arguments::new());

    let args = Arguments::new()
        .model(&model)
        .subject("GO:0003674")
        .expression(ExpressionNode::svf("occurs in", "GO:0005623"))
        .expression(ExpressionNode::svf("RO:0002333", "UniProtKB:P1"))
        .value("comment", "first")
        .value("comment", "second")
        .variable("mf");
    let response = run(&engine, vec![req(EntityKind::Individual, Operation::Create, args)]);

    assert_eq!(response.message_type, MessageType::Success);
    assert_eq!(response.message, "success");
    assert_eq!(response.signal, Some(Signal::Merge));
    let individuals = array(&response, "individuals");
    assert_eq!(individuals.len(), 1);
    let individual = &individuals[0];
    assert_eq!(individual["annotations"].as_array().unwrap().len(), 2);
    assert!(individual["type"].as_array().unwrap().len() >= 3);
    assert_eq!(individual["inferred-type"][0]["id"], "GO:0003674");
    assert_eq!(response.field("inconsistent_p"), Some(&Value::Bool(false)));
}

#[test]
fn remove_type_then_undo_moves_entry_to_redo() {
    let engine = engine();
    let model = blank(&engine, Arguments::new());
    let restriction = ExpressionNode::svf("occurs in", "GO:0005623");
    let response = run(
        &engine,
        vec![req(
            EntityKind::Individual,
            Operation::Create,
            Arguments::new()
                .model(&model)
                .subject("GO:0003674")
                .expression(restriction.clone())
                .expression(ExpressionNode::svf("enabled by", "UniProtKB:P1")),
        )],
    );
    let individual = array(&response, "individuals")[0].clone();
    let id = individual["id"].as_str().unwrap();
    let before = individual["type"].as_array().unwrap().len();

    let response = run(
        &engine,
        vec![req(
            EntityKind::Individual,
            Operation::RemoveType,
            Arguments::new().model(&model).individual(id).expression(restriction),
        )],
    );
    assert!(response.is_success(), "{response:?}");
    let after = array(&response, "individuals")[0]["type"].as_array().unwrap().len();
    assert_eq!(after, before - 1);

    let history = |engine: &EditEngine| {
        run(
            engine,
            vec![req(EntityKind::Model, Operation::GetUndoRedo, Arguments::new().model(&model))],
        )
    };
    let response = history(&engine);
    assert_eq!(response.signal, Some(Signal::Meta));
    assert!(array(&response, "undo").len() > 1);
    assert!(array(&response, "redo").is_empty());
    assert_eq!(array(&response, "undo")[0]["user-id"], USER);

    let undo = run(
        &engine,
        vec![req(EntityKind::Model, Operation::Undo, Arguments::new().model(&model))],
    );
    assert_eq!(undo.signal, Some(Signal::Rebuild));
    let restored = array(&undo, "individuals")[0]["type"].as_array().unwrap().len();
    assert_eq!(restored, before);
    assert_eq!(array(&history(&engine), "redo").len(), 1);
}

#[test]
fn store_without_title_fails_validation() {
    let engine = engine();
    let model = blank(&engine, Arguments::new());
    let response = run(
        &engine,
        vec![req(EntityKind::Model, Operation::Store, Arguments::new().model(&model))],
    );
    assert_eq!(response.message_type, MessageType::Error);
    assert!(response.commentary.as_deref().unwrap().contains("title"));
    assert!(response.message.contains("failed validation"));
    assert!(response.data.is_empty());
    assert!(response.signal.is_none());
    assert!(engine.store().persistence().list_ids().unwrap().is_empty());
}

#[test]
fn store_persists_a_valid_model() {
    let engine = engine();
    let model = blank(&engine, Arguments::new());
    create(&engine, &model, "GO:0003824");
    let response = run(
        &engine,
        vec![req(
            EntityKind::Model,
            Operation::Store,
            Arguments::new().model(&model).value("title", "Kinase activity"),
        )],
    );
    assert!(response.is_success(), "{response:?}");
    assert_eq!(response.signal, Some(Signal::Meta));

    let persisted = engine.store().persistence().list_ids().unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].as_str(), model);
    let title = get_model(&engine, &model);
    let annotations = array(&title, "annotations");
    assert!(annotations.iter().any(|a| a["key"] == "title" && a["value"] == "Kinase activity"));
}

#[test]
fn one_unresolvable_branch_rejects_a_union() {
    let engine = engine();
    let model = blank(&engine, Arguments::new());
    let individual = create(&engine, &model, "GO:0003674");

    for known in ["GO:0005623", "GO:7777777"] {
        let union = ExpressionNode::group(
            "union",
            vec![
                ExpressionNode::svf("has part", known),
                ExpressionNode::svf("has part", "GO:9999999"),
            ],
        );
        let response = run(
            &engine,
            vec![req(
                EntityKind::Individual,
                Operation::AddType,
                Arguments::new().model(&model).individual(&individual).expression(union),
            )],
        );
        assert_eq!(response.message_type, MessageType::Error);
        assert!(response.commentary.as_deref().unwrap().contains("GO:9999999"));
    }
}

#[test]
fn embedded_expression_text_resolves_labels() {
    let engine = engine();
    let model = blank(&engine, Arguments::new());
    let individual = create(&engine, &model, "GO:0003674");
    let response = run(
        &engine,
        vec![req(
            EntityKind::Individual,
            Operation::AddType,
            Arguments::new()
                .model(&model)
                .individual(&individual)
                .expression(ExpressionNode::class(
                    "('has part' some GO:0005623) or ('has part' some 'catalytic activity')",
                )),
        )],
    );
    assert!(response.is_success(), "{response:?}");
    let types = array(&response, "individuals")[0]["type"].as_array().unwrap().clone();
    assert!(types.iter().any(|t| t["type"] == "union"));
}

#[test]
fn unprivileged_mutation_leaves_model_unchanged() {
    let engine = engine();
    let model = blank(&engine, Arguments::new());
    let response = engine.process_batch(
        Some(USER),
        None,
        None,
        vec![req(
            EntityKind::Individual,
            Operation::Create,
            Arguments::new().model(&model).subject("GO:0003674"),
        )],
        false,
    );
    assert_eq!(response.message_type, MessageType::Error);
    assert!(response.commentary.as_deref().unwrap().contains("Insufficient"));
    assert!(array(&get_model(&engine, &model), "individuals").is_empty());

    let read = engine.process_batch(
        None,
        None,
        None,
        vec![req(EntityKind::Model, Operation::Get, Arguments::new().model(&model))],
        false,
    );
    assert!(read.is_success());
}

#[test]
fn failing_request_rolls_back_the_whole_batch() {
    let engine = engine();
    let model = blank(&engine, Arguments::new());
    let undo_before = engine
        .store()
        .read(&model.as_str().into(), |m| Ok(m.history().counts().0))
        .unwrap();

    let response = run(
        &engine,
        vec![
            req(
                EntityKind::Individual,
                Operation::Create,
                Arguments::new().model(&model).subject("GO:0003674").variable("mf"),
            ),
            req(
                EntityKind::Edge,
                Operation::Add,
                Arguments::new()
                    .model(&model)
                    .subject("mf")
                    .predicate("enabled by")
                    .object("no-such-individual"),
            ),
        ],
    );
    assert_eq!(response.message_type, MessageType::Error);
    assert!(response.commentary.as_deref().unwrap().contains("no-such-individual"));

    let after = get_model(&engine, &model);
    assert!(array(&after, "individuals").is_empty());
    assert!(array(&after, "facts").is_empty());
    let undo_after = engine
        .store()
        .read(&model.as_str().into(), |m| Ok(m.history().counts().0))
        .unwrap();
    assert_eq!(undo_before, undo_after);
}

#[test]
fn failed_creation_registers_no_model() {
    let engine = engine();
    let response = run(
        &engine,
        vec![
            req(EntityKind::Model, Operation::GenerateBlank, Arguments::new()),
            req(EntityKind::Individual, Operation::Create, Arguments::new().subject("GO:0000000")),
        ],
    );
    assert_eq!(response.message_type, MessageType::Error);
    assert!(engine.store().live_ids().unwrap().is_empty());
}

#[test]
fn batches_are_bound_to_one_model() {
    let engine = engine();
    let a = blank(&engine, Arguments::new());
    let b = blank(&engine, Arguments::new());
    let response = run(
        &engine,
        vec![
            req(EntityKind::Model, Operation::Get, Arguments::new().model(&a)),
            req(EntityKind::Model, Operation::Get, Arguments::new().model(&b)),
        ],
    );
    assert_eq!(response.message_type, MessageType::Error);
    assert!(response.commentary.as_deref().unwrap().contains("multiple modelIds"));

    let response = run(
        &engine,
        vec![req(EntityKind::Individual, Operation::Create, Arguments::new().subject("GO:0003674"))],
    );
    assert!(response.commentary.as_deref().unwrap().contains("request.arguments.modelId"));
}

#[test]
fn meta_and_edit_requests_do_not_mix() {
    let engine = engine();
    let model = blank(&engine, Arguments::new());
    let response = run(
        &engine,
        vec![
            req(EntityKind::Model, Operation::GetUndoRedo, Arguments::new().model(&model)),
            req(
                EntityKind::Individual,
                Operation::Create,
                Arguments::new().model(&model).subject("GO:0003674"),
            ),
        ],
    );
    assert_eq!(response.message_type, MessageType::Error);
    assert!(response.commentary.as_deref().unwrap().contains("combined"));
}

#[test]
fn variables_link_individuals_within_a_batch() {
    let engine = engine();
    let model = blank(&engine, Arguments::new());
    let response = run(
        &engine,
        vec![
            req(
                EntityKind::Individual,
                Operation::Create,
                Arguments::new().model(&model).subject("GO:0003824").variable("mf"),
            ),
            req(
                EntityKind::Individual,
                Operation::Create,
                Arguments::new().model(&model).subject("GO:0005623").variable("cell"),
            ),
            req(
                EntityKind::Edge,
                Operation::Add,
                Arguments::new()
                    .model(&model)
                    .subject("mf")
                    .predicate("occurs in")
                    .object("cell")
                    .value("evidence", "ECO:0000314"),
            ),
        ],
    );
    assert!(response.is_success(), "{response:?}");
    assert_eq!(array(&response, "individuals").len(), 2);
    let facts = array(&response, "facts");
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0]["property"], "BFO:0000066");
    assert_eq!(facts[0]["property-label"], "occurs in");
    let annotations = facts[0]["annotations"].as_array().unwrap();
    assert!(annotations.iter().any(|a| a["key"] == "evidence"));
    assert!(annotations.iter().any(|a| a["key"] == "contributor" && a["value"] == USER));

    // Variables do not outlive their batch.
    let response = run(
        &engine,
        vec![req(
            EntityKind::Individual,
            Operation::Get,
            Arguments::new().model(&model).individual("mf"),
        )],
    );
    assert_eq!(response.message_type, MessageType::Error);
}

#[test]
fn create_composite_then_remove_cascades_edges() {
    let engine = engine();
    let model = blank(&engine, Arguments::new());
    let response = run(
        &engine,
        vec![req(
            EntityKind::Individual,
            Operation::CreateComposite,
            Arguments::new()
                .model(&model)
                .subject("GO:0003824")
                .predicate("enabled by")
                .object("UniProtKB:P1"),
        )],
    );
    assert!(response.is_success(), "{response:?}");
    assert_eq!(array(&response, "individuals").len(), 2);
    let facts = array(&response, "facts");
    assert_eq!(facts.len(), 1);
    let subject = facts[0]["subject"].as_str().unwrap().to_string();

    let response = run(
        &engine,
        vec![req(
            EntityKind::Individual,
            Operation::Remove,
            Arguments::new().model(&model).individual(&subject),
        )],
    );
    assert_eq!(response.signal, Some(Signal::Rebuild));
    assert_eq!(array(&response, "individuals").len(), 1);
    assert!(array(&response, "facts").is_empty());
}

#[test]
fn edge_annotation_requires_existing_edge() {
    let engine = engine();
    let model = blank(&engine, Arguments::new());
    let a = create(&engine, &model, "GO:0003824");
    let b = create(&engine, &model, "GO:0005623");
    let response = run(
        &engine,
        vec![req(
            EntityKind::Edge,
            Operation::AddAnnotation,
            Arguments::new()
                .model(&model)
                .subject(&a)
                .predicate("occurs in")
                .object(&b)
                .value("comment", "x"),
        )],
    );
    assert_eq!(response.message_type, MessageType::Error);
    assert!(response.commentary.as_deref().unwrap().contains("Could not validate"));
}

#[test]
fn edge_annotators_become_model_contributors() {
    let engine = engine();
    let model = blank(&engine, Arguments::new());
    let a = create(&engine, &model, "GO:0003824");
    let b = create(&engine, &model, "GO:0005623");
    let edge = || {
        Arguments::new()
            .model(&model)
            .subject(&a)
            .predicate("occurs in")
            .object(&b)
    };
    assert!(run(&engine, vec![req(EntityKind::Edge, Operation::Add, edge())]).is_success());

    let reviewer = json!({"key": "contributor", "value": "orcid:reviewer"});
    for operation in [Operation::AddAnnotation, Operation::RemoveAnnotation] {
        let response = engine.process_batch(
            Some("orcid:reviewer"),
            None,
            None,
            vec![req(EntityKind::Edge, operation, edge().value("comment", "checked"))],
            true,
        );
        assert!(response.is_success(), "{response:?}");
        assert!(array(&get_model(&engine, &model), "annotations").contains(&reviewer));
        assert!(undo_last(&engine, &model).is_success());
        assert!(!array(&get_model(&engine, &model), "annotations").contains(&reviewer));
    }
}

fn undo_last(engine: &EditEngine, model: &str) -> BatchResponse {
    run(engine, vec![req(EntityKind::Model, Operation::Undo, Arguments::new().model(model))])
}

#[test]
fn disjoint_types_make_the_model_inconsistent() {
    let engine = engine();
    let model = blank(&engine, Arguments::new());
    let response = run(
        &engine,
        vec![req(
            EntityKind::Individual,
            Operation::Create,
            Arguments::new()
                .model(&model)
                .subject("GO:0003674")
                .expression(ExpressionNode::class("GO:0008150")),
        )],
    );
    assert!(response.is_success(), "{response:?}");
    assert_eq!(response.field("inconsistent_p"), Some(&Value::Bool(true)));
    assert!(array(&response, "individuals")[0].get("inferred-type").is_none());

    let quiet = engine_with(EngineConfig::default().with_inferences(false));
    let model = blank(&quiet, Arguments::new());
    let response = run(
        &quiet,
        vec![req(
            EntityKind::Individual,
            Operation::Create,
            Arguments::new().model(&model).subject("GO:0003674"),
        )],
    );
    assert!(response.field("inconsistent_p").is_none());
}

#[test]
fn anonymous_callers_are_not_recorded_as_contributors() {
    let engine = engine();
    let response = engine.process_batch(
        Some("Anonymous"),
        None,
        None,
        vec![
            req(EntityKind::Model, Operation::GenerateBlank, Arguments::new()),
            req(EntityKind::Individual, Operation::Create, Arguments::new().subject("GO:0003674")),
        ],
        true,
    );
    assert!(response.is_success(), "{response:?}");
    assert_eq!(response.uid.as_deref(), Some("Anonymous"));
    let individual = &array(&response, "individuals")[0];
    let keys: Vec<&str> = individual["annotations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["date"]);
}

#[test]
fn search_finds_models_mentioning_an_id() {
    let engine = engine();
    let kinase = blank(&engine, Arguments::new());
    create(&engine, &kinase, "GO:0003824");
    let other = blank(&engine, Arguments::new());
    create(&engine, &other, "GO:0005623");

    let response = run(
        &engine,
        vec![req(EntityKind::Model, Operation::Search, Arguments::new().value("id", "GO:0003824"))],
    );
    assert_eq!(response.signal, Some(Signal::Meta));
    assert_eq!(response.field("model_ids"), Some(&json!([kinase])));

    let response = run(
        &engine,
        vec![req(EntityKind::Model, Operation::Search, Arguments::new().value("title", "x"))],
    );
    assert!(response.commentary.as_deref().unwrap().contains("request.arguments.values"));
}

#[test]
fn export_then_import_makes_an_independent_copy() {
    let engine = engine();
    let model = blank(&engine, Arguments::new().value("title", "Original"));
    let response = run(
        &engine,
        vec![req(
            EntityKind::Individual,
            Operation::CreateComposite,
            Arguments::new()
                .model(&model)
                .subject("GO:0003824")
                .predicate("occurs in")
                .object("GO:0005623"),
        )],
    );
    assert!(response.is_success());

    let exported = run(
        &engine,
        vec![req(EntityKind::Model, Operation::Export, Arguments::new().model(&model))],
    );
    let text = exported.field("export").and_then(Value::as_str).unwrap().to_string();

    let imported = run(
        &engine,
        vec![req(EntityKind::Model, Operation::Import, Arguments {
            import_model: Some(text),
            ..Arguments::default()
        })],
    );
    assert!(imported.is_success(), "{imported:?}");
    assert_eq!(imported.signal, Some(Signal::Rebuild));
    let copy = imported.field("id").and_then(Value::as_str).unwrap();
    assert_ne!(copy, model);
    assert_eq!(array(&imported, "individuals").len(), 2);
    assert_eq!(array(&imported, "facts").len(), 1);

    let bad = run(
        &engine,
        vec![req(EntityKind::Model, Operation::Import, Arguments {
            import_model: Some("{not a model".to_string()),
            ..Arguments::default()
        })],
    );
    assert!(bad.commentary.as_deref().unwrap().contains("importModel"));
}

#[test]
fn legacy_export_lists_types_and_facts() {
    let engine = engine();
    let model = blank(&engine, Arguments::new());
    create(&engine, &model, "GO:0003824");
    let response = run(
        &engine,
        vec![req(EntityKind::Model, Operation::ExportLegacy, Arguments::new().model(&model))],
    );
    let text = response.field("export").and_then(Value::as_str).unwrap();
    assert!(text.starts_with("type\t"));
    assert!(text.trim_end().ends_with("GO:0003824"));

    let response = run(
        &engine,
        vec![req(EntityKind::Model, Operation::ExportLegacy, Arguments {
            model_id: Some(model),
            format: Some("gaf".to_string()),
            ..Arguments::default()
        })],
    );
    assert_eq!(response.message_type, MessageType::Error);
}

#[test]
fn model_listings_report_ids_and_metadata() {
    let engine = engine();
    let titled = blank(&engine, Arguments::new().value("title", "Signalling").value("state", "development"));
    let untitled = blank(&engine, Arguments::new());

    let response = run(
        &engine,
        vec![
            req(EntityKind::Model, Operation::AllModelIds, Arguments::new()),
            req(EntityKind::Model, Operation::AllModelMeta, Arguments::new()),
        ],
    );
    assert!(response.is_success(), "{response:?}");
    let ids = array(&response, "model_ids");
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&json!(titled)) && ids.contains(&json!(untitled)));

    let meta = response.field("models_meta").unwrap();
    assert_eq!(meta[&titled]["title"], "Signalling");
    assert_eq!(meta[&titled]["state"], "development");
    assert_eq!(meta[&titled]["contributor"], USER);
    assert!(meta[&untitled].get("title").is_none());
}

#[test]
fn taxonomy_listings() {
    let engine = engine();
    let response = run(
        &engine,
        vec![
            req(EntityKind::Relations, Operation::Get, Arguments::new()),
            req(EntityKind::Evidence, Operation::Get, Arguments::new()),
        ],
    );
    assert!(response.is_success(), "{response:?}");
    let relations = array(&response, "relations");
    assert_eq!(relations.len(), 3);
    assert!(relations.contains(&json!({"id": "RO:0002333", "label": "enabled by"})));
    assert_eq!(
        response.field("evidence"),
        Some(&json!([{"id": "ECO:0000314", "label": "direct assay evidence"}]))
    );
}

#[test]
fn generate_seeds_individuals_from_the_corpus() {
    let corpus = InMemorySeedCorpus::new().with_seed(
        "goa",
        "GO:0003824",
        SeedGraph {
            entities: vec![
                SeedEntity {
                    key: "mf".to_string(),
                    class: TermId::from("GO:0003824"),
                    annotations: Vec::new(),
                },
                SeedEntity {
                    key: "loc".to_string(),
                    class: TermId::from("GO:0005623"),
                    annotations: Vec::new(),
                },
            ],
            links: vec![SeedLink {
                subject: "mf".to_string(),
                predicate: TermId::from("BFO:0000066"),
                object: "loc".to_string(),
            }],
        },
    );
    let engine = engine().with_seed_corpus(Arc::new(corpus));
    let response = run(
        &engine,
        vec![req(EntityKind::Model, Operation::Generate, Arguments {
            db: Some("goa".to_string()),
            subject: Some("catalytic activity".to_string()),
            taxon_id: Some("NCBITaxon:9606".to_string()),
            ..Arguments::default()
        })],
    );
    assert!(response.is_success(), "{response:?}");
    assert_eq!(response.signal, Some(Signal::Rebuild));
    assert_eq!(array(&response, "individuals").len(), 2);
    assert_eq!(array(&response, "facts").len(), 1);

    let without = engine_with(EngineConfig::default());
    let response = run(
        &without,
        vec![req(EntityKind::Model, Operation::Generate, Arguments {
            db: Some("goa".to_string()),
            subject: Some("GO:0003824".to_string()),
            ..Arguments::default()
        })],
    );
    assert!(response.commentary.as_deref().unwrap().contains("request.arguments.db"));
}

#[test]
fn wire_calls_echo_correlation_fields() {
    let engine = engine();
    let call: BatchCall = serde_json::from_value(json!({
        "uid": USER,
        "intention": "query",
        "packet-id": "p-42",
        "requests": [{"entity": "model", "operation": "all-model-ids"}]
    }))
    .unwrap();
    let response = engine.process_call(call, false);
    assert!(response.is_success());
    assert_eq!(response.packet_id.as_deref(), Some("p-42"));
    assert_eq!(response.intention.as_deref(), Some("query"));

    let call: BatchCall = serde_json::from_value(json!({
        "uid": USER,
        "packet-id": "p-43",
        "requests": [{"entity": "model", "operation": "rename"}]
    }))
    .unwrap();
    let response = engine.process_call(call, true);
    assert_eq!(response.message_type, MessageType::Error);
    assert_eq!(response.packet_id.as_deref(), Some("p-43"));
    assert!(response.message.starts_with("Could not successfully complete batch request."));
    assert!(response
        .commentary
        .as_deref()
        .unwrap()
        .contains("No valid value for operation type: rename"));

    let wire = serde_json::to_value(&response).unwrap();
    assert_eq!(wire["message_type"], "error");
    assert!(wire.get("signal").is_none());

    let empty = engine.process_batch(None, None, None, Vec::new(), true);
    assert!(empty.commentary.as_deref().unwrap().contains("Empty batch"));
}
