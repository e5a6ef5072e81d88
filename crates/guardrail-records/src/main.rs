//! Inspect and edit guardrail response template documents.
//!
//! A document is a JSON array of templates, or the paged envelope a list
//! endpoint returns.
//!
//! # Examples
//!
//! ```sh
//! # One line per template
//! guardrail-records --file templates.json list
//!
//! # Change a field and write the document back
//! guardrail-records --file templates.json set 3 response "Blocked by policy." --write
//!
//! # Check every template against the typed shape
//! guardrail-records --file templates.json --options options.json validate
//!
//! # JSON Schema of a template
//! guardrail-records schema
//! ```

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use guardrail_records::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Characters of the description shown by `list`.
const PREVIEW_CHARS: usize = 48;

/// Inspect and edit guardrail response template documents.
#[derive(Parser)]
#[command(name = "guardrail-records")]
struct Cli {
    /// Template document (JSON array or paged envelope)
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    /// Record options as JSON (id attribute, defaults, required, schema)
    #[arg(long, global = true)]
    options: Option<PathBuf>,

    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List templates: id, status, description preview
    List,

    /// Print one template as pretty JSON
    Show {
        /// Template id (integer or string)
        id: String,
    },

    /// Set one field of a template
    Set {
        /// Template id (integer or string)
        id: String,
        /// Field name
        key: String,
        /// New value, parsed as JSON with a plain-string fallback
        value: String,
        /// Write the document back to --file
        #[arg(long)]
        write: bool,
    },

    /// Check that every template fits the typed template shape
    Validate,

    /// Print the JSON Schema of a template
    Schema,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_options(path: Option<&Path>) -> Result<RecordOptions, String> {
    match path {
        Some(p) => RecordOptions::load(p)
            .map_err(|e| format!("failed to load options '{}': {e}", p.display())),
        None => Ok(RecordOptions::default()),
    }
}

fn load_store(cli: &Cli) -> Result<(TemplateStore, &Path), String> {
    let path = cli
        .file
        .as_deref()
        .ok_or_else(|| "--file is required for this command".to_string())?;
    let options = load_options(cli.options.as_deref())?;
    let store = TemplateStore::load(path, options)
        .map_err(|e| format!("failed to load '{}': {e}", path.display()))?;
    Ok((store, path))
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

fn list(store: &TemplateStore) -> String {
    let mut out = String::new();
    for record in store {
        let id = record
            .id()
            .map_or_else(|| format!("({})", record.cid()), |id| id.to_string());
        let status = if record.is_enabled() {
            "enabled"
        } else {
            "disabled"
        };
        let description = record
            .description()
            .or_else(|| record.response())
            .unwrap_or_default();
        out.push_str(&format!("{id}\t{status}\t{}\n", preview(description)));
    }
    out
}

fn show(store: &TemplateStore, id: &str) -> Result<String, String> {
    let record = store
        .lookup(id)
        .ok_or_else(|| format!("no template with id '{id}'"))?;
    serde_json::to_string_pretty(record).map_err(|e| e.to_string())
}

fn set(store: &mut TemplateStore, id: &str, key: &str, value: &str) -> Result<bool, String> {
    let record = store
        .lookup_mut(id)
        .ok_or_else(|| format!("no template with id '{id}'"))?;
    let subscription = record.subscribe(LoggingObserver);
    let changed = record.set(key, parse_value(value));
    record.unsubscribe(subscription);
    Ok(changed)
}

fn validate(store: &TemplateStore) -> Result<String, String> {
    let mut failures = Vec::new();
    for record in store {
        if let Err(e) = record.to_template() {
            let label = record.id().map_or_else(|| record.cid().to_string(), |id| id.to_string());
            failures.push(format!("  {label}: {e}"));
        }
    }
    if failures.is_empty() {
        Ok(format!("{} template(s) valid\n", store.len()))
    } else {
        Err(format!(
            "{} of {} template(s) invalid\n{}",
            failures.len(),
            store.len(),
            failures.join("\n")
        ))
    }
}

fn run(cli: &Cli) -> Result<String, String> {
    match &cli.command {
        Command::List => {
            let (store, _) = load_store(cli)?;
            Ok(list(&store))
        }
        Command::Show { id } => {
            let (store, _) = load_store(cli)?;
            show(&store, id).map(|json| format!("{json}\n"))
        }
        Command::Set {
            id,
            key,
            value,
            write,
        } => {
            let (mut store, path) = load_store(cli)?;
            let changed = set(&mut store, id, key, value)?;
            if *write && changed {
                store
                    .save(path)
                    .map_err(|e| format!("failed to write '{}': {e}", path.display()))?;
            }
            let record = show(&store, id)?;
            Ok(if changed {
                format!("{record}\n")
            } else {
                format!("{record}\n(unchanged)\n")
            })
        }
        Command::Validate => {
            let (store, _) = load_store(cli)?;
            validate(&store)
        }
        Command::Schema => {
            let schema = json_schema_for::<ResponseTemplate>();
            serde_json::to_string_pretty(&schema)
                .map(|json| format!("{json}\n"))
                .map_err(|e| e.to_string())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
