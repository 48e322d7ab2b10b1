use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::Input;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use persona_common::Config;
use persona_synth::models::chat_model;
use persona_synth::run_log::ExecutionLog;
use persona_synth::sources::{RedditSource, SnapshotSource};
use persona_synth::{AttributeExtractor, ItemSource, PersonaGenerator, PersonaRunner};
use reddit_client::{username_from_profile, RedditClient};

#[derive(Parser)]
#[command(name = "persona-synth", about = "Build a user persona from a Reddit profile")]
struct Cli {
    /// Output root (overrides DATA_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape a profile and generate its persona
    Generate {
        /// Profile URL, u/NAME or bare username (prompted for when omitted)
        profile: Option<String>,

        /// Posts and comments to fetch, each (overrides POST_LIMIT)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,

        /// Model name (overrides PERSONA_MODEL)
        #[arg(long)]
        model: Option<String>,

        /// Regenerate from a saved snapshot instead of calling Reddit
        #[arg(long, value_name = "PATH")]
        from_snapshot: Option<PathBuf>,
    },
    /// Show execution statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    init_tracing(&config)?;

    match cli.command {
        Command::Generate {
            profile,
            limit,
            model,
            from_snapshot,
        } => {
            if let Some(limit) = limit {
                config.post_limit = limit;
            }
            if let Some(model) = model {
                config.model_name = model;
            }
            generate(config, profile, from_snapshot).await
        }
        Command::Stats => {
            let log = ExecutionLog::new(config.execution_log_path());
            println!("{}", log.stats());
            Ok(())
        }
    }
}

/// Stdout plus a plain-text copy in `{data}/logs/app.log`.
fn init_tracing(config: &Config) -> Result<()> {
    let logs_dir = config.logs_dir();
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("creating {}", logs_dir.display()))?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.app_log_path())
        .with_context(|| format!("opening {}", config.app_log_path().display()))?;

    let filter = EnvFilter::from_default_env()
        .add_directive("persona=info".parse()?)
        .add_directive("reddit_client=info".parse()?)
        .add_directive("ai_client=info".parse()?);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(log_file)))
        .init();
    Ok(())
}

async fn generate(config: Config, profile: Option<String>, from_snapshot: Option<PathBuf>) -> Result<()> {
    info!("Reddit persona synthesizer starting...");
    config.log_redacted();

    let profile = match profile {
        Some(profile) => profile,
        None => Input::<String>::new()
            .with_prompt("Enter Reddit user profile URL")
            .interact_text()?,
    };
    let username = username_from_profile(&profile)?;
    info!(username = username.as_str(), "Extracted username");

    let source = item_source(&config, from_snapshot.as_deref())?;
    let extractor = AttributeExtractor::new(chat_model(&config)?).with_timeout(config.model_timeout);
    let runner = PersonaRunner::new(config, source, PersonaGenerator::new(extractor));

    match runner.run(&username).await {
        Ok(summary) => {
            println!("\nPersona generation completed successfully!\n");
            println!("{summary}");
            Ok(())
        }
        Err(e) => {
            eprintln!("\nError: {e:#}");
            eprintln!("\nPlease check:");
            eprintln!("1. Valid Reddit API credentials");
            eprintln!("2. The model server is running with the model installed");
            eprintln!("3. Internet connection");
            Err(e)
        }
    }
}

fn item_source(config: &Config, snapshot: Option<&Path>) -> Result<Arc<dyn ItemSource>> {
    if let Some(path) = snapshot {
        return Ok(Arc::new(SnapshotSource::new(path)));
    }

    config.require_reddit_credentials()?;
    let client = RedditClient::new(
        &config.reddit_client_id,
        &config.reddit_client_secret,
        &config.reddit_user_agent,
    );
    Ok(Arc::new(RedditSource::new(client, config.post_limit)))
}
