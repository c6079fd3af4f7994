use clap::Parser;
use lookup_field::core::config::LookupConfig;
use lookup_field::error::Result;
use lookup_field::logging::{self, LogTarget};
use lookup_field::runtime::LookupRuntime;
use lookup_field::runtime::event::HostEvent;
use lookup_field::source::{HttpSource, MemorySource, RecordSource};
use lookup_field::terminal::Terminal;
use lookup_field::widgets::LookupField;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

const DEMO_RECORDS: &str = include_str!("../demos/records.json");

#[derive(Parser, Debug)]
#[command(name = "lookup-field", version, about = "Interactive record lookup field")]
struct Args {
    /// Field configuration (.yaml, .yml or .json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file of records per entity type for the in-memory source.
    #[arg(long, conflicts_with = "endpoint")]
    records: Option<PathBuf>,

    /// Base URL of an HTTP record service.
    #[arg(long)]
    endpoint: Option<String>,

    /// Simulated latency of the in-memory source.
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    /// Log destination; `-` for stderr.
    #[arg(long)]
    log_file: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "lookup-field exited with error");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let log_target = args
        .log_file
        .as_deref()
        .map(LogTarget::parse)
        .unwrap_or_else(LogTarget::default_file);
    logging::init(&log_target)?;

    let config = match &args.config {
        Some(path) => LookupConfig::from_path(path)?,
        None => LookupConfig::default(),
    };
    let source = build_source(&args)?;

    let field = LookupField::new("lookup", config);
    let mut runtime = LookupRuntime::new(field, source);
    let mut terminal = Terminal::new()?;
    runtime.run(&mut terminal, log_host_event)?;

    match runtime.field().state().selection() {
        Some(record) => println!(
            "selected: {} ({})",
            record.title(runtime.field().state().config().title_field.as_str()),
            record.id
        ),
        None => println!("no record selected"),
    }
    Ok(())
}

fn build_source(args: &Args) -> Result<Arc<dyn RecordSource>> {
    if let Some(endpoint) = &args.endpoint {
        tracing::info!(endpoint = %endpoint, "using HTTP record source");
        return Ok(Arc::new(HttpSource::new(endpoint.clone())));
    }
    let source = match &args.records {
        Some(path) => MemorySource::from_json_path(path)?,
        None => MemorySource::from_json_str(DEMO_RECORDS)?,
    };
    Ok(Arc::new(
        source.with_latency(Duration::from_millis(args.latency_ms)),
    ))
}

fn log_host_event(event: HostEvent) {
    match event {
        HostEvent::LookupUpdate(update) => tracing::info!(
            selected = ?update.selected_record.map(|record| record.id.into_inner()),
            "host received lookup update"
        ),
        HostEvent::Toast(toast) => tracing::info!(
            title = %toast.title,
            message = %toast.message,
            variant = ?toast.variant,
            "host received toast"
        ),
    }
}
