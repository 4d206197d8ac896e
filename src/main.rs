//! Water Levels CLI
//!
//! Interactive question loop plus one-shot commands:
//! - Ask a single question
//! - Show the intent a question is interpreted as
//! - List the loaded roads
//! - Print a default config file

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use waterlevels::config::{generate_default_config, Config, InterpreterMode};
use waterlevels::engine::Engine;
use waterlevels::interpret::{self, IntentSource};
use waterlevels::logging;
use waterlevels::query::QueryExecutor;
use waterlevels::storage::{format_timestamp, CsvLoader, MeasurementStore};

#[derive(Parser)]
#[command(name = "waterlevels")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ask questions about per-road water level readings")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (default: standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// CSV file with the readings (overrides the config)
    #[arg(short, long, global = true)]
    pub data: Option<PathBuf>,

    /// Intent source: rules or generative
    #[arg(short, long, global = true)]
    pub interpreter: Option<InterpreterMode>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive question loop (default)
    Repl,

    /// Answer a single question
    Ask {
        /// Question text
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// Print the structured intent for a question as JSON
    Intent {
        /// Question text
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// List the roads and time span of the data file
    Roads,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

const SAMPLE_QUESTIONS: [&str; 7] = [
    "What is the highest water level on road 101?",
    "What was the water level on road 102 at 2024-10-15 08:00:00?",
    "What is the average water level on road 103?",
    "What's the minimum water level on road 104?",
    "What's the latest water level reading for road 105?",
    "Show me all water levels on road 106 from 2024-10-01 00:00:00 to 2024-10-05 23:59:59",
    "What was the maximum water level on road 107 between 2024-10-10 08:00:00 and 2024-10-12 18:00:00?",
];

/// What a line typed at the prompt means
#[derive(Debug, PartialEq, Eq)]
enum ReplInput<'a> {
    Exit,
    Blank,
    Question(&'a str),
}

impl<'a> ReplInput<'a> {
    fn classify(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            Self::Exit
        } else if trimmed.is_empty() {
            Self::Blank
        } else {
            Self::Question(line)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Repl);

    if let Commands::Config { output } = command {
        return write_config(output);
    }

    let config_file = Config::locate(cli.config.as_deref());
    let mut config = Config::resolve(config_file.as_deref())?;
    if let Some(data) = &cli.data {
        config.store.csv_path = data.to_string_lossy().to_string();
    }
    if let Some(mode) = cli.interpreter {
        config.interpreter.mode = mode;
    }

    logging::init(&config.logging);
    log_config_source(config_file.as_deref());

    let (store, _report) = CsvLoader::new()
        .with_timestamp_column(&config.store.timestamp_column)
        .load(Path::new(&config.store.csv_path))
        .with_context(|| format!("failed to load {}", config.store.csv_path))?;

    let store = Arc::new(store);
    let source = interpret::from_config(&config.interpreter)?;
    let engine = Engine::new(Arc::clone(&source), QueryExecutor::new(Arc::clone(&store)));

    match command {
        Commands::Repl => run_repl(&engine).await?,
        Commands::Ask { question } => {
            let exchange = engine.ask(&question.join(" ")).await;
            println!("{}", exchange.text);
        }
        Commands::Intent { question } => {
            print_intent(source.as_ref(), &question.join(" ")).await?;
        }
        Commands::Roads => print!("{}", roads_overview(&store)),
        // written before loading data
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn log_config_source(path: Option<&Path>) {
    match path {
        Some(path) => tracing::info!("Loaded config from {:?}", path),
        None => tracing::info!("Using default config with environment overrides"),
    }
}

fn write_config(output: Option<PathBuf>) -> anyhow::Result<()> {
    let content = generate_default_config();
    match output {
        Some(path) => {
            std::fs::write(&path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Config written to {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

async fn run_repl(engine: &Engine) -> anyhow::Result<()> {
    println!("{}", banner(engine.store()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\nEnter your query: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            // EOF
            println!();
            break;
        };

        match ReplInput::classify(&line) {
            ReplInput::Exit => break,
            ReplInput::Blank => println!("Please enter a valid query."),
            ReplInput::Question(question) => {
                let exchange = engine.ask(question).await;
                println!("\nResult: {}", exchange.text);
            }
        }
    }

    println!("Thank you for using the Water Levels Query System. Goodbye!");
    Ok(())
}

async fn print_intent(source: &dyn IntentSource, question: &str) -> anyhow::Result<()> {
    match source.interpret(question).await {
        Ok(intent) => println!("{}", serde_json::to_string_pretty(&intent.to_payload())?),
        Err(e) => println!("Error: {}", e),
    }
    Ok(())
}

fn banner(store: &MeasurementStore) -> String {
    let mut out = String::from("\n=== Water Levels Query System ===\n\nYou can ask questions like:\n");
    for question in SAMPLE_QUESTIONS {
        out.push_str("- ");
        out.push_str(question);
        out.push('\n');
    }

    let roads = store.entity_ids();
    if let (Some(first), Some(last)) = (roads.first(), roads.last()) {
        out.push_str(&format!("\nAvailable roads range from: {} to {}\n", first, last));
    }
    if let Some(span) = store.span() {
        out.push_str(&format!(
            "Available timestamps range from: {} to {}\n",
            format_timestamp(&span.start),
            format_timestamp(&span.end)
        ));
    }

    out.push_str("\nType 'exit' to stop.");
    out
}

fn roads_overview(store: &MeasurementStore) -> String {
    let mut out = String::new();
    for road in store.entity_ids() {
        out.push_str(road.as_str());
        out.push('\n');
    }

    out.push_str(&format!("{} roads, {} rows", store.entity_ids().len(), store.len()));
    if let Some(span) = store.span() {
        out.push_str(&format!(
            ", {} to {}",
            format_timestamp(&span.start),
            format_timestamp(&span.end)
        ));
    }
    out.push('\n');
    out
}
