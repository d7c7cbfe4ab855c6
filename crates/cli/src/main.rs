use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parking_lot::Mutex;

use voyage_core::capture::{ScriptedCapture, SpeechCapture, SpeechErrorCode, SpeechEvents};
use voyage_core::{Activity, PricingLineItem, DEFAULT_PROXIMITY_RADIUS_KM, DEFAULT_TAX_RATE};
use voyage_engine::PlannerEngine;
use voyage_observability::{init_tracing, AppMetrics};
use voyage_store::{Kv, PlannerState};

#[derive(Debug, Parser)]
#[command(name = "voyage")]
#[command(about = "Voyage Planner CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a trip query and print the personalized search outcome
    Search { query: String },
    /// Compute a quote from a JSON file of line items
    Quote {
        #[arg(long)]
        items: PathBuf,
        #[arg(long, default_value_t = 20.0)]
        margin: f64,
        #[arg(long, default_value_t = DEFAULT_TAX_RATE)]
        tax_rate: f64,
    },
    /// Cluster a JSON file of activities by proximity
    Group {
        #[arg(long)]
        activities: PathBuf,
        #[arg(long, default_value_t = DEFAULT_PROXIMITY_RADIUS_KM)]
        radius: f64,
    },
    /// Interactive planning loop
    Plan,
    /// Replay a transcript script (one utterance per line) through the
    /// voice pipeline
    Voice {
        #[arg(long)]
        script: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("voyage_cli");
    let cli = Cli::parse();

    let engine = build_engine().await?;

    match cli.command {
        Command::Search { query } => {
            let outcome = engine.handle_search(&query).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Quote {
            items,
            margin,
            tax_rate,
        } => {
            let raw = fs::read_to_string(&items)
                .with_context(|| format!("failed reading line items from {}", items.display()))?;
            let items: Vec<PricingLineItem> =
                serde_json::from_str(&raw).context("invalid line-item JSON")?;

            let quote = engine.build_quote(&items, margin, tax_rate)?;
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
        Command::Group { activities, radius } => {
            let raw = fs::read_to_string(&activities).with_context(|| {
                format!("failed reading activities from {}", activities.display())
            })?;
            let activities: Vec<Activity> =
                serde_json::from_str(&raw).context("invalid activity JSON")?;

            let grouped = engine.group_itinerary(&activities, radius);
            println!("{}", serde_json::to_string_pretty(&grouped)?);
        }
        Command::Plan => run_plan(engine).await?,
        Command::Voice { script } => {
            let raw = fs::read_to_string(&script)
                .with_context(|| format!("failed reading script from {}", script.display()))?;
            run_voice(engine, raw).await?;
        }
    }

    Ok(())
}

async fn run_plan(engine: PlannerEngine<Kv>) -> Result<()> {
    println!("Voyage planning mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().read_line(&mut line)?;

        let query = line.trim();
        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        match engine.handle_search(query).await {
            Ok(outcome) => {
                println!("\n{}", serde_json::to_string_pretty(&outcome.parsed)?);
                println!("{}", outcome.tip);
                for restaurant in &outcome.restaurants {
                    println!("- {} ({})", restaurant.name, restaurant.cuisine);
                }
                println!();
            }
            Err(error) => println!("could not handle that query: {error}\n"),
        }
    }

    Ok(())
}

/// Feeds a scripted capture into the engine: interim lines give live parse
/// feedback, the final line lands in search history.
async fn run_voice(engine: PlannerEngine<Kv>, raw_script: String) -> Result<()> {
    let lines = raw_script
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect::<Vec<_>>();

    let capture = ScriptedCapture::new(lines);
    let sink = Arc::new(CollectingSink::default());
    capture.start(sink.clone());

    for code in sink.errors.lock().iter() {
        println!("capture error: {code:?}");
    }

    let events = sink.transcripts.lock().clone();
    for (transcript, is_final) in events {
        let outcome = engine.handle_transcript(&transcript, is_final).await?;
        if is_final {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            println!("... {transcript}");
        }
    }

    Ok(())
}

#[derive(Default)]
struct CollectingSink {
    transcripts: Mutex<Vec<(String, bool)>>,
    errors: Mutex<Vec<SpeechErrorCode>>,
}

impl SpeechEvents for CollectingSink {
    fn on_transcript(&self, transcript: &str, is_final: bool) {
        self.transcripts
            .lock()
            .push((transcript.to_string(), is_final));
    }

    fn on_error(&self, code: SpeechErrorCode) {
        self.errors.lock().push(code);
    }
}

async fn build_engine() -> Result<PlannerEngine<Kv>> {
    let metrics = AppMetrics::shared();

    let kv = if let Ok(database_url) = env::var("VOYAGE_DATABASE_URL") {
        Kv::sqlite(&database_url).await?
    } else {
        Kv::memory()
    };

    let state = PlannerState::load(Arc::new(kv))
        .await
        .context("failed to load planner state")?;

    Ok(PlannerEngine::new(Arc::new(state), metrics))
}
