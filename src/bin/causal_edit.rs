//! causal-edit batch processor
//!
//! Reads one JSON batch call per line from stdin and writes one JSON
//! response per line to stdout. Logs go to stderr; set `RUST_LOG` to tune.

use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use causal_edit::expression::{IdentifierLookup, NoLookup, PatternLookup};
use causal_edit::store::ModelPersistence;
use causal_edit::{
    BatchCall, BatchRuntime, EditEngine, EngineConfig, InMemoryPersistence, InMemoryTaxonomy,
    RuntimeConfig, TaxonomyOracle,
};

/// Command line configuration.
struct Config {
    engine: EngineConfig,
    taxonomy: Option<PathBuf>,
    store_dir: Option<PathBuf>,
    accept_ids: Vec<String>,
    privileged: bool,
    workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            taxonomy: None,
            store_dir: None,
            accept_ids: Vec::new(),
            privileged: false,
            workers: 2,
        }
    }
}

fn usage() {
    println!("causal-edit - batch editing engine for causal graph models");
    println!();
    println!("USAGE:");
    println!("    causal-edit [OPTIONS] < batches.jsonl");
    println!();
    println!("OPTIONS:");
    println!("    -t, --taxonomy <FILE>       Taxonomy document (JSON)");
    println!("    -s, --store-dir <DIR>       Persist models in DIR (requires the `persistent` feature)");
    println!("        --prefix <PREFIX>       Prefix of generated model ids [default: gomodel:]");
    println!("        --accept-id <REGEX>     Accept foreign identifiers matching REGEX (repeatable)");
    println!("        --workers <N>           Workers per execution path [default: 2]");
    println!("        --privileged            Grant every caller write access");
    println!("        --no-user-id            Do not annotate with the caller id");
    println!("        --no-creation-date      Do not annotate with the creation date");
    println!("        --no-inferences         Skip inference reconciliation");
    println!("        --no-validate           Skip pre-save validation");
    println!("    -h, --help                  Print help information");
}

fn value(args: &[String], i: usize, flag: &str) -> Result<String, String> {
    args.get(i + 1)
        .cloned()
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_args(args: &[String]) -> Result<Option<Config>, String> {
    let mut config = Config::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--taxonomy" | "-t" => {
                config.taxonomy = Some(PathBuf::from(value(args, i, "--taxonomy")?));
                i += 2;
            }
            "--store-dir" | "-s" => {
                config.store_dir = Some(PathBuf::from(value(args, i, "--store-dir")?));
                i += 2;
            }
            "--prefix" => {
                config.engine = config.engine.with_model_id_prefix(value(args, i, "--prefix")?);
                i += 2;
            }
            "--accept-id" => {
                config.accept_ids.push(value(args, i, "--accept-id")?);
                i += 2;
            }
            "--workers" => {
                let raw = value(args, i, "--workers")?;
                config.workers = raw
                    .parse()
                    .map_err(|_| format!("invalid worker count: {raw}"))?;
                i += 2;
            }
            "--privileged" => {
                config.privileged = true;
                i += 1;
            }
            "--no-user-id" => {
                config.engine = config.engine.with_user_id(false);
                i += 1;
            }
            "--no-creation-date" => {
                config.engine = config.engine.with_creation_date(false);
                i += 1;
            }
            "--no-inferences" => {
                config.engine = config.engine.with_inferences(false);
                i += 1;
            }
            "--no-validate" => {
                config.engine = config.engine.with_validation(false);
                i += 1;
            }
            "--help" | "-h" => return Ok(None),
            arg => return Err(format!("unknown argument: {arg}")),
        }
    }
    Ok(Some(config))
}

fn load_taxonomy(path: Option<&PathBuf>) -> Result<InMemoryTaxonomy, String> {
    let Some(path) = path else {
        return Ok(InMemoryTaxonomy::new());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read taxonomy {}: {e}", path.display()))?;
    InMemoryTaxonomy::from_json(&text)
        .map_err(|e| format!("invalid taxonomy {}: {e}", path.display()))
}

#[cfg(feature = "persistent")]
fn open_persistence(dir: Option<&PathBuf>) -> Result<Arc<dyn ModelPersistence>, String> {
    match dir {
        Some(dir) => causal_edit::store::persistent::FilePersistence::open(dir)
            .map(|p| Arc::new(p) as Arc<dyn ModelPersistence>)
            .map_err(|e| format!("failed to open store {}: {e}", dir.display())),
        None => Ok(Arc::new(InMemoryPersistence::new())),
    }
}

#[cfg(not(feature = "persistent"))]
fn open_persistence(dir: Option<&PathBuf>) -> Result<Arc<dyn ModelPersistence>, String> {
    match dir {
        Some(_) => Err("--store-dir requires the `persistent` feature".to_string()),
        None => Ok(Arc::new(InMemoryPersistence::new())),
    }
}

fn build_runtime(config: &Config) -> Result<BatchRuntime, String> {
    let taxonomy = load_taxonomy(config.taxonomy.as_ref())?;
    let lookup: Arc<dyn IdentifierLookup> = if config.accept_ids.is_empty() {
        Arc::new(NoLookup)
    } else {
        Arc::new(PatternLookup::new(&config.accept_ids).map_err(|e| format!("invalid --accept-id: {e}"))?)
    };
    let persistence = open_persistence(config.store_dir.as_ref())?;
    let engine = EditEngine::new(
        config.engine.clone(),
        Arc::new(taxonomy),
        lookup,
        Arc::new(TaxonomyOracle),
        persistence,
    );
    let runtime_config = RuntimeConfig {
        query_workers: config.workers,
        edit_workers: config.workers,
        ..RuntimeConfig::default()
    };
    BatchRuntime::new(engine, &runtime_config).map_err(|e| e.to_string())
}

fn serve(runtime: &BatchRuntime, privileged: bool) -> io::Result<usize> {
    let stdin = io::stdin();
    let mut out = BufWriter::new(io::stdout().lock());
    let mut served = 0;
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let call: BatchCall = match serde_json::from_str(&line) {
            Ok(call) => call,
            Err(e) => {
                warn!(error = %e, "skipping malformed batch");
                continue;
            }
        };
        match runtime.process(call, privileged) {
            Ok(response) => {
                serde_json::to_writer(&mut out, &response)?;
                out.write_all(b"\n")?;
                out.flush()?;
                served += 1;
            }
            Err(e) => error!(error = %e, "batch was not processed"),
        }
    }
    Ok(served)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = match parse_args(&args) {
        Ok(Some(config)) => config,
        Ok(None) => {
            usage();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match build_runtime(&config) {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    info!(privileged = config.privileged, workers = config.workers, "causal-edit ready");

    match serve(&runtime, config.privileged) {
        Ok(served) => {
            info!(served, "input closed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "i/o failure");
            ExitCode::FAILURE
        }
    }
}
