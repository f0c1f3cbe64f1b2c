// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use ollama_rag::utils::logging::{format_error, format_info, format_success, format_warning};
use ollama_rag::{
    Config, ElasticsearchClient, HealthCheck, HealthReport, OllamaClient, OperationTimer,
    ProgressTracker, RagPipeline, Validator,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "ollama_rag")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Answer questions from an Elasticsearch semantic index with a local Ollama model", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrieve matching documents and stream a grounded answer
    Ask {
        /// Question to answer
        question: String,

        /// Number of documents to retrieve (defaults to retrieval.size)
        #[arg(short, long, value_name = "NUM")]
        limit: Option<usize>,

        /// Override the configured system instructions
        #[arg(long, value_name = "TEXT")]
        system_prompt: Option<String>,

        /// Print the retrieved context block before the answer
        #[arg(long)]
        show_context: bool,
    },

    /// Print the context block a question would be grounded on
    Search {
        /// Search query text
        query: String,

        #[arg(short, long, value_name = "NUM")]
        limit: Option<usize>,
    },

    /// Check that Elasticsearch and Ollama are reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    ollama_rag::utils::logging::init_logger(cli.color, cli.verbose);

    info!("Loading configuration from: {}", cli.config.display());

    let config = Config::discover(&cli.config).context("Failed to load configuration")?;

    match cli.command {
        Commands::Ask {
            question,
            limit,
            system_prompt,
            show_context,
        } => {
            cmd_ask(
                &config,
                &question,
                limit,
                system_prompt.as_deref(),
                show_context,
                cli.color,
            )
            .await?;
        }
        Commands::Search { query, limit } => {
            cmd_search(&config, &query, limit).await?;
        }
        Commands::Health => {
            cmd_health(&config).await?;
        }
    }

    Ok(())
}

async fn cmd_ask(
    config: &Config,
    question: &str,
    limit: Option<usize>,
    system_prompt: Option<&str>,
    show_context: bool,
    color: bool,
) -> Result<()> {
    Validator::validate_question(question)?;

    let pipeline = RagPipeline::from_config(config).context("Failed to create backend clients")?;

    let spinner = ProgressTracker::for_stderr("Searching documents", color);
    let context = pipeline
        .retrieve_context(question, limit)
        .await
        .context("Document retrieval failed")?;
    debug!("Context: {}", Validator::truncate_text(&context, 200));

    if show_context {
        spinner.suspend(|| println!("{}", context));
    }

    let system_prompt = system_prompt.unwrap_or(pipeline.system_prompt());
    spinner.set_message(format!("Waiting for {}", config.ollama.chat_model));

    let timer = OperationTimer::new("generation");
    let mut stdout = io::stdout();
    let mut started = false;

    let stats = pipeline
        .orchestrator()
        .answer_with(question, &context, system_prompt, |chunk| {
            if !started {
                spinner.finish();
                writeln!(stdout)?;
                writeln!(stdout, "🤖 answer:")?;
                started = true;
            }
            stdout.write_all(chunk.content.as_bytes())?;
            stdout.flush()
        })
        .await
        .context("Answer generation failed")?;

    spinner.finish();
    println!();
    timer.finish_with_count(stats.chunks);

    match stats.tokens_per_second() {
        Some(rate) => info!(
            "{} tokens ({} chars) at {:.1} tokens/sec",
            stats.eval_count.unwrap_or_default(),
            stats.chars,
            rate
        ),
        None => info!(
            "{} chars at {:.1} chars/sec",
            stats.chars,
            stats.chars_per_second()
        ),
    }

    if stats.chunks == 0 {
        eprintln!("{}", format_warning("The model returned an empty answer"));
    }

    Ok(())
}

async fn cmd_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    info!("Searching for: {}", query);

    let pipeline = RagPipeline::from_config(config).context("Failed to create backend clients")?;
    let context = pipeline
        .retrieve_context(query, limit)
        .await
        .context("Semantic search failed")?;

    println!("{}", context);
    Ok(())
}

async fn cmd_health(config: &Config) -> Result<()> {
    info!("Checking backends");

    let search = ElasticsearchClient::new(config.elasticsearch.clone())
        .context("Failed to create Elasticsearch client")?;
    let chat =
        OllamaClient::new(config.ollama.clone()).context("Failed to create Ollama client")?;

    let start = Instant::now();
    let search_outcome = search.ping().await.map_err(|e| e.to_string());
    let search_check = HealthCheck::from_probe("elasticsearch", search_outcome, start.elapsed());

    let start = Instant::now();
    let chat_outcome = match chat.health_check().await {
        Ok(models) if chat.is_available(&models) => Ok(()),
        Ok(models) => Err(format!(
            "model {} is not available (found: {})",
            chat.model(),
            if models.is_empty() {
                "none".to_string()
            } else {
                models.join(", ")
            }
        )),
        Err(e) => Err(e.to_string()),
    };
    let chat_check = HealthCheck::from_probe("ollama", chat_outcome, start.elapsed());

    let report = HealthReport::new(
        vec![search_check, chat_check],
        env!("CARGO_PKG_VERSION").to_string(),
    );
    print!("{}", report.format());

    if report.is_healthy() {
        println!("{}", format_success("Backends are reachable"));
        println!(
            "{}",
            format_info(&format!(
                "Index {} / field {}",
                search.index(),
                search.semantic_field()
            ))
        );
        Ok(())
    } else {
        eprintln!("{}", format_error("One or more backends are unavailable"));
        Err(anyhow::anyhow!("Health check failed"))
    }
}
