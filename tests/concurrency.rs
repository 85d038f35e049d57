//! Concurrent callers against one shared engine.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use causal_edit::{
    Arguments, BatchCall, BatchRequest, BatchRuntime, EditEngine, EngineConfig, EntityKind,
    ExecutionPath, InMemoryTaxonomy, Operation, RuntimeConfig,
};
use serde_json::Value;

const THREADS: usize = 8;
const PER_THREAD: usize = 10;

fn engine() -> EditEngine {
    let taxonomy = InMemoryTaxonomy::new()
        .with_class("GO:0003674", "molecular_function", &[])
        .with_relation("RO:0002333", "enabled by");
    EditEngine::in_memory(EngineConfig::default(), Arc::new(taxonomy))
}

fn blank(engine: &EditEngine) -> String {
    let response = engine.process_batch(
        Some("setup"),
        None,
        None,
        vec![BatchRequest::new(EntityKind::Model, Operation::GenerateBlank)],
        true,
    );
    response.field("id").and_then(Value::as_str).unwrap().to_string()
}

fn create(model: &str) -> BatchRequest {
    BatchRequest::new(EntityKind::Individual, Operation::Create)
        .with_arguments(Arguments::new().model(model).subject("GO:0003674"))
}

fn individual_count(engine: &EditEngine, model: &str) -> usize {
    let response = engine.process_batch(
        None,
        None,
        None,
        vec![BatchRequest::new(EntityKind::Model, Operation::Get).with_arguments(Arguments::new().model(model))],
        false,
    );
    response.field("individuals").and_then(Value::as_array).map_or(0, Vec::len)
}

#[test]
fn batches_on_one_model_never_lose_updates() {
    let engine = Arc::new(engine());
    let model = blank(&engine);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let model = model.clone();
            thread::spawn(move || {
                let user = format!("user-{t}");
                for _ in 0..PER_THREAD {
                    let response =
                        engine.process_batch(Some(&user), None, None, vec![create(&model), create(&model)], true);
                    assert!(response.is_success(), "{response:?}");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(individual_count(&engine, &model), THREADS * PER_THREAD * 2);
}

#[test]
fn batches_on_different_models_are_independent() {
    let engine = Arc::new(engine());
    let models: Vec<String> = (0..THREADS).map(|_| blank(&engine)).collect();

    let handles: Vec<_> = models
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, model)| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..=i {
                    let response = engine.process_batch(None, None, None, vec![create(&model)], true);
                    assert!(response.is_success(), "{response:?}");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for (i, model) in models.iter().enumerate() {
        assert_eq!(individual_count(&engine, model), i + 1);
    }
}

#[test]
fn runtime_serves_many_submitters() {
    let runtime = Arc::new(
        BatchRuntime::new(
            engine(),
            &RuntimeConfig {
                query_workers: 2,
                edit_workers: 2,
                queue_capacity: 256,
            },
        )
        .unwrap(),
    );
    let model = blank(runtime.engine());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let runtime = Arc::clone(&runtime);
            let model = model.clone();
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    let call = BatchCall {
                        uid: Some("u".to_string()),
                        requests: vec![create(&model)],
                        ..BatchCall::default()
                    };
                    let handle = runtime.submit(call, true).unwrap();
                    assert_eq!(handle.path(), ExecutionPath::Edit);
                    let response = handle.join_timeout(Duration::from_secs(5)).unwrap();
                    assert!(response.is_success(), "{response:?}");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(individual_count(runtime.engine(), &model), 4 * PER_THREAD);
}
