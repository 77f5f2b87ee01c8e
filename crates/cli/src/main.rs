use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use stepcore_engine::{FileRecordStore, Node, ProviderRegistry, RecordStore, WorkflowContext, load_config, run_step, store};
use stepcore_types::{EngineConfig, WorkflowRecord};
use tracing::info;

/// Run workflow step operations against a durable workflow record.
#[derive(Parser, Debug)]
#[command(name = "stepcore", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one step operation and print its output document and phase
    Run(RunArgs),
    /// List the components held by a record
    Components(RecordArgs),
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct RecordArgs {
    /// Record file (JSON or YAML) with `instance` and `data`
    #[arg(long)]
    record: Option<PathBuf>,

    /// Workflow instance in the configured record store
    #[arg(long)]
    instance: Option<String>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    source: RecordArgs,

    /// Operation name, e.g. load, export, var, wait, break, fail, message
    #[arg(long = "op")]
    operation: String,

    /// Provider the operation belongs to
    #[arg(long, default_value = "builtin")]
    provider: String,

    /// Input document (JSON or YAML); without it the operation gets no input
    #[arg(long)]
    input: Option<PathBuf>,

    /// Write the updated context back after a successful call
    #[arg(long)]
    commit: bool,
}

/// Where a context came from, so it can be written back to the same place.
enum RecordSource {
    File { path: PathBuf, instance: String },
    Store { store: FileRecordStore, instance: String },
}

impl RecordSource {
    fn open(args: &RecordArgs, config: &EngineConfig) -> Result<(Self, WorkflowContext)> {
        if let Some(path) = &args.record {
            let record = read_record_file(path)?;
            let context = WorkflowContext::from_record(&record.data)
                .with_context(|| format!("Failed to materialize record {}", path.display()))?;
            let source = RecordSource::File {
                path: path.clone(),
                instance: record.instance,
            };
            return Ok((source, context));
        }

        let instance = args.instance.clone().context("expected --record or --instance")?;
        let record_store = FileRecordStore::from_config(&config.store);
        let context = store::materialize(&record_store, &instance)
            .with_context(|| format!("Failed to materialize instance '{instance}'"))?;
        Ok((RecordSource::Store { store: record_store, instance }, context))
    }

    fn save(&self, context: &WorkflowContext) -> Result<()> {
        match self {
            RecordSource::File { path, instance } => {
                let record = WorkflowRecord {
                    instance: instance.clone(),
                    data: context.commit()?,
                };
                write_record_file(path, &record)
            }
            RecordSource::Store { store, instance } => {
                let data = context.commit()?;
                store
                    .save(instance, &data)
                    .with_context(|| format!("Failed to save instance '{instance}'"))
            }
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config();

    match cli.command {
        Command::Run(args) => run_operation(&args, &config),
        Command::Components(args) => list_components(&args, &config),
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing::subscriber::set_global_default(log_subscriber(filter));
}

fn log_subscriber(filter: String) -> impl tracing::Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}

fn run_operation(args: &RunArgs, config: &EngineConfig) -> Result<()> {
    let registry = ProviderRegistry::with_builtin(config).context("Failed to configure step providers")?;
    let (source, mut context) = RecordSource::open(&args.source, config)?;
    let mut input = args.input.as_deref().map(read_document).transpose()?;

    let report = run_step(&registry, &mut context, &args.provider, &args.operation, input.as_mut());
    if let Some(document) = &input {
        print!("{document}");
    }
    println!("phase: {}", report.phase);
    if !report.message().is_empty() {
        println!("message: {}", report.message());
    }

    if let Some(error) = report.error {
        return Err(error).with_context(|| format!("{} {} failed", args.provider, args.operation));
    }
    if args.commit {
        source.save(&context)?;
        info!(operation = %args.operation, "committed workflow context");
    }
    Ok(())
}

fn list_components(args: &RecordArgs, config: &EngineConfig) -> Result<()> {
    let (_, context) = RecordSource::open(args, config)?;
    for component in context.components() {
        let kind = component.workload.field("kind").and_then(Node::as_str).unwrap_or("-");
        println!("{}\t{}\t{} auxiliaries", component.name, kind, component.auxiliaries.len());
    }
    Ok(())
}

fn read_document(path: &Path) -> Result<Node> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read input document: {}", path.display()))?;
    let value: Value =
        serde_yaml::from_str(&content).with_context(|| format!("Input document is not valid JSON or YAML: {}", path.display()))?;
    Ok(Node::from_json(&value))
}

fn read_record_file(path: &Path) -> Result<WorkflowRecord> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read record file: {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("Record file is not valid JSON or YAML: {}", path.display()))
}

fn write_record_file(path: &Path, record: &WorkflowRecord) -> Result<()> {
    let is_yaml = matches!(path.extension().and_then(|extension| extension.to_str()), Some("yaml" | "yml"));
    let content = if is_yaml {
        serde_yaml::to_string(record)?
    } else {
        serde_json::to_string_pretty(record)?
    };
    fs::write(path, content).with_context(|| format!("Failed to write record file: {}", path.display()))
}
